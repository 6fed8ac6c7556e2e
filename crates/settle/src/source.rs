//! Sources that lazy sequences read their elements from

use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, PoisonError};

use crate::exhaustion::TrackedSequence;
use crate::sequence::Sequence;

/// A boxed pull cursor over the elements of a source
pub type Cursor<T> = Box<dyn Iterator<Item = T> + Send + 'static>;

/// The input of every sequence operation.
///
/// Anything that is not an ordered collection, text or another sequence is
/// represented by [`Source::Empty`] and simply yields no elements.
pub enum Source<T> {
    /// An ordered collection that can be indexed directly
    Ordered(Arc<[T]>),
    /// A restartable lazy sequence
    Sequence(Sequence<T>),
    /// A single-pass iterator shared by every cursor that reads from it
    Once(OnceSource<T>),
    /// No elements
    Empty,
}

impl<T: Clone + Send + Sync + 'static> Source<T> {
    /// A source backed by an iterator that can only be consumed once.
    ///
    /// Every cursor reading from this source pulls from the same iterator, so
    /// a second pass only sees what the first one left behind.
    pub fn once<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Source::Once(OnceSource {
            iter: Arc::new(Mutex::new(Box::new(iter.into_iter()))),
        })
    }

    /// Check if this source is known to produce no elements
    pub fn is_empty(&self) -> bool {
        match self {
            Source::Ordered(items) => items.is_empty(),
            Source::Empty => true,
            Source::Sequence(_) | Source::Once(_) => false,
        }
    }

    /// Stream the source front to back without materializing it
    pub(crate) fn cursor(&self) -> Cursor<T> {
        match self {
            Source::Ordered(items) => ordered_cursor(Arc::clone(items), 0),
            Source::Sequence(sequence) => sequence.cursor(),
            Source::Once(once) => {
                let once = once.clone();
                Box::new(std::iter::from_fn(move || once.pull()))
            }
            Source::Empty => Box::new(std::iter::empty()),
        }
    }

    /// Collect every element into an ordered collection.
    ///
    /// Ordered sources are shared rather than copied.
    pub(crate) fn materialize(&self) -> Arc<[T]> {
        match self {
            Source::Ordered(items) => Arc::clone(items),
            other => other.cursor().collect(),
        }
    }
}

/// Cursor over `items[start..]` that reads by index
pub(crate) fn ordered_cursor<T: Clone + Send + Sync + 'static>(
    items: Arc<[T]>,
    start: usize,
) -> Cursor<T> {
    let start = start.min(items.len());
    Box::new((start..items.len()).map(move |i| items[i].clone()))
}

/// Cursor over `items` from the last element to the first
pub(crate) fn ordered_cursor_rev<T: Clone + Send + Sync + 'static>(items: Arc<[T]>) -> Cursor<T> {
    Box::new((0..items.len()).rev().map(move |i| items[i].clone()))
}

/// A single-pass iterator that can be shared between cursors
pub struct OnceSource<T> {
    iter: Arc<Mutex<Cursor<T>>>,
}

impl<T> OnceSource<T> {
    fn pull(&self) -> Option<T> {
        self.iter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }
}

impl<T> Clone for OnceSource<T> {
    fn clone(&self) -> Self {
        Self {
            iter: Arc::clone(&self.iter),
        }
    }
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Source::Ordered(items) => Source::Ordered(Arc::clone(items)),
            Source::Sequence(sequence) => Source::Sequence(sequence.clone()),
            Source::Once(once) => Source::Once(once.clone()),
            Source::Empty => Source::Empty,
        }
    }
}

impl<T> Default for Source<T> {
    fn default() -> Self {
        Source::Empty
    }
}

impl<T: Debug> Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Ordered(items) => f.debug_tuple("Ordered").field(items).finish(),
            Source::Sequence(_) => f.write_str("Sequence(..)"),
            Source::Once(_) => f.write_str("Once(..)"),
            Source::Empty => f.write_str("Empty"),
        }
    }
}

impl<T> From<Vec<T>> for Source<T> {
    fn from(items: Vec<T>) -> Self {
        Source::Ordered(items.into())
    }
}

impl<T: Clone> From<&[T]> for Source<T> {
    fn from(items: &[T]) -> Self {
        Source::Ordered(items.into())
    }
}

impl<T, const N: usize> From<[T; N]> for Source<T> {
    fn from(items: [T; N]) -> Self {
        Source::Ordered(Arc::from(Vec::from(items)))
    }
}

impl<T> From<Arc<[T]>> for Source<T> {
    fn from(items: Arc<[T]>) -> Self {
        Source::Ordered(items)
    }
}

impl From<&str> for Source<char> {
    fn from(text: &str) -> Self {
        Source::Ordered(text.chars().collect())
    }
}

impl From<String> for Source<char> {
    fn from(text: String) -> Self {
        Source::from(text.as_str())
    }
}

impl<T> From<Sequence<T>> for Source<T> {
    fn from(sequence: Sequence<T>) -> Self {
        Source::Sequence(sequence)
    }
}

impl<T> From<TrackedSequence<T>> for Source<T> {
    fn from(sequence: TrackedSequence<T>) -> Self {
        Source::Sequence(sequence.into_inner())
    }
}

impl<T, S: Into<Source<T>>> From<Option<S>> for Source<T> {
    fn from(source: Option<S>) -> Self {
        source.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_cursor() {
        let source = Source::from(vec![1, 2, 3]);
        assert_eq!(source.cursor().collect::<Vec<_>>(), vec![1, 2, 3]);
        // Ordered sources can be read any number of times
        assert_eq!(source.cursor().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!source.is_empty());
    }

    #[test]
    fn test_text_is_chars() {
        let source = Source::from("test");
        assert_eq!(source.cursor().collect::<String>(), "test");
    }

    #[test]
    fn test_once_source_is_shared() {
        let source = Source::once(vec!['t', 'e', 's', 't']);
        let mut first = source.cursor();
        assert_eq!(first.next(), Some('t'));

        let second = source.clone().cursor();
        assert_eq!(second.collect::<String>(), "est");
        assert_eq!(first.next(), None);
    }

    #[test]
    fn test_materialize_shares_ordered_items() {
        let items: Arc<[i32]> = Arc::from(vec![1, 2]);
        let source = Source::from(Arc::clone(&items));
        assert!(Arc::ptr_eq(&items, &source.materialize()));
    }

    #[test]
    fn test_absent_source_is_empty() {
        let source: Source<i32> = Source::from(None::<Vec<i32>>);
        assert!(source.is_empty());
        assert_eq!(source.cursor().count(), 0);
        assert_eq!(Source::<i32>::default().materialize().len(), 0);
    }

    #[test]
    fn test_ordered_cursor_bounds() {
        let items: Arc<[i32]> = Arc::from(vec![1, 2, 3]);
        assert_eq!(ordered_cursor(Arc::clone(&items), 2).collect::<Vec<_>>(), vec![3]);
        assert_eq!(ordered_cursor(Arc::clone(&items), 7).count(), 0);
        assert_eq!(ordered_cursor_rev(items).collect::<Vec<_>>(), vec![3, 2, 1]);
    }
}
