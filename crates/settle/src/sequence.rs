//! Restartable lazy sequences and the operations that build them
//!
//! Every operation takes a [`Source`] and returns a [`TrackedSequence`]: a
//! factory that hands out a fresh, independent cursor each time it is
//! iterated. Cursors re-read the source definition, never the
//! position of an earlier cursor.
//!
//! Invalid or absent sources are not an error; they produce no elements.

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::exhaustion::TrackedSequence;
use crate::source::{ordered_cursor, ordered_cursor_rev, Cursor, Source};

/// A restartable factory of cursors
pub struct Sequence<T> {
    make: Arc<dyn Fn() -> Cursor<T> + Send + Sync>,
}

impl<T: 'static> Sequence<T> {
    /// Create a sequence from a function producing a new cursor per call
    pub fn from_fn<F>(make: F) -> Self
    where
        F: Fn() -> Cursor<T> + Send + Sync + 'static,
    {
        Self {
            make: Arc::new(make),
        }
    }

    /// Start a new iteration.
    ///
    /// Cursors are fused: once they signal completion they keep doing so.
    pub fn cursor(&self) -> Cursor<T> {
        Box::new((self.make)().fuse())
    }
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            make: Arc::clone(&self.make),
        }
    }
}

impl<T> Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence").finish_non_exhaustive()
    }
}

impl<T: 'static> IntoIterator for &Sequence<T> {
    type Item = T;
    type IntoIter = Cursor<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}

/// The closed set of public sequence operations.
///
/// Each variant builds a plain [`Sequence`]; [`SequenceOp::apply`] is the one
/// place where the result gets wrapped to report exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOp {
    /// Every element in source order
    Default,
    /// Every element after the first `n`
    Skip(usize),
    /// The whole source repeated `times` times
    Reiterable(usize),
    /// Every element, last to first
    Reverse,
}

impl SequenceOp {
    /// Build the sequence for `source` and wrap it so its cursors track exhaustion
    pub fn apply<T, S>(self, source: S) -> TrackedSequence<T>
    where
        T: Clone + Send + Sync + 'static,
        S: Into<Source<T>>,
    {
        TrackedSequence::new(self.build(source.into()))
    }

    fn build<T: Clone + Send + Sync + 'static>(self, source: Source<T>) -> Sequence<T> {
        match self {
            SequenceOp::Default => Sequence::from_fn(move || source.cursor()),
            SequenceOp::Skip(count) => Sequence::from_fn(move || skip_cursor(&source, count)),
            SequenceOp::Reiterable(times) => {
                Sequence::from_fn(move || repeat_cursor(&source, times))
            }
            SequenceOp::Reverse => Sequence::from_fn(move || reverse_cursor(&source)),
        }
    }
}

/// Every element of `source` in its original order
pub fn default<T, S>(source: S) -> TrackedSequence<T>
where
    T: Clone + Send + Sync + 'static,
    S: Into<Source<T>>,
{
    SequenceOp::Default.apply(source)
}

/// Every element of `source` except the first `count`.
///
/// Ordered collections are skipped by index. Other sources are pulled and
/// discarded `count` times, stopping early if they run out.
pub fn skip<T, S>(source: S, count: usize) -> TrackedSequence<T>
where
    T: Clone + Send + Sync + 'static,
    S: Into<Source<T>>,
{
    SequenceOp::Skip(count).apply(source)
}

/// `times` consecutive full passes over `source`.
///
/// A single pass streams straight from the source. More passes materialize the
/// source once per cursor and replay it. Zero passes yield nothing.
pub fn reiterable<T, S>(source: S, times: usize) -> TrackedSequence<T>
where
    T: Clone + Send + Sync + 'static,
    S: Into<Source<T>>,
{
    SequenceOp::Reiterable(times).apply(source)
}

/// Every element of `source` from last to first.
///
/// Sources that are not ordered collections are fully materialized first.
pub fn reverse<T, S>(source: S) -> TrackedSequence<T>
where
    T: Clone + Send + Sync + 'static,
    S: Into<Source<T>>,
{
    SequenceOp::Reverse.apply(source)
}

fn skip_cursor<T: Clone + Send + Sync + 'static>(source: &Source<T>, count: usize) -> Cursor<T> {
    match source {
        Source::Ordered(items) => ordered_cursor(Arc::clone(items), count),
        // `Iterator::skip` discards lazily on the first pull and stops at the end
        other => Box::new(other.cursor().skip(count)),
    }
}

fn repeat_cursor<T: Clone + Send + Sync + 'static>(source: &Source<T>, times: usize) -> Cursor<T> {
    match times {
        0 => Box::new(std::iter::empty()),
        1 => source.cursor(),
        _ => {
            let source = source.clone();
            deferred(move || {
                let items = source.materialize();
                if items.is_empty() {
                    return Box::new(std::iter::empty());
                }
                Box::new((0..times).flat_map(move |_| ordered_cursor(Arc::clone(&items), 0)))
            })
        }
    }
}

fn reverse_cursor<T: Clone + Send + Sync + 'static>(source: &Source<T>) -> Cursor<T> {
    match source {
        Source::Ordered(items) => ordered_cursor_rev(Arc::clone(items)),
        other => {
            let source = other.clone();
            deferred(move || ordered_cursor_rev(source.materialize()))
        }
    }
}

/// Postpone building a cursor until its first pull
fn deferred<T, F>(build: F) -> Cursor<T>
where
    T: 'static,
    F: FnOnce() -> Cursor<T> + Send + 'static,
{
    let mut build = Some(build);
    let mut cursor: Option<Cursor<T>> = None;
    Box::new(std::iter::from_fn(move || {
        if let Some(build) = build.take() {
            cursor = Some(build());
        }
        cursor.as_mut()?.next()
    }))
}
