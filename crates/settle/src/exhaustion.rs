//! Cursors that report whether they have run out

use std::fmt::{self, Debug};

use crate::sequence::Sequence;
use crate::source::Cursor;

/// A restartable sequence whose cursors expose their exhaustion state
pub struct TrackedSequence<T> {
    inner: Sequence<T>,
}

impl<T> TrackedSequence<T> {
    /// Wrap a sequence so each of its cursors tracks exhaustion
    pub fn new(inner: Sequence<T>) -> Self {
        Self { inner }
    }

    /// The wrapped sequence
    pub fn into_inner(self) -> Sequence<T> {
        self.inner
    }
}

impl<T: 'static> TrackedSequence<T> {
    /// Start a new, independent iteration
    pub fn cursor(&self) -> TrackedCursor<T> {
        TrackedCursor::new(self.inner.cursor())
    }
}

impl<T> Clone for TrackedSequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for TrackedSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedSequence").finish_non_exhaustive()
    }
}

impl<T: 'static> IntoIterator for &TrackedSequence<T> {
    type Item = T;
    type IntoIter = TrackedCursor<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}

/// A cursor that records the completion flag of every pull.
///
/// [`TrackedCursor::exhausted`] lags one pull behind the data: it only turns
/// `Some(true)` after a pull that found nothing, never by looking ahead.
pub struct TrackedCursor<T> {
    inner: Cursor<T>,
    exhausted: Option<bool>,
}

impl<T> TrackedCursor<T> {
    fn new(inner: Cursor<T>) -> Self {
        Self {
            inner,
            exhausted: None,
        }
    }

    /// Pull the next element; `None` signals completion
    pub fn pull(&mut self) -> Option<T> {
        let item = self.inner.next();
        self.exhausted = Some(item.is_none());
        item
    }

    /// `None` before the first pull, then whether the last pull signalled completion
    pub fn exhausted(&self) -> Option<bool> {
        self.exhausted
    }
}

impl<T> Iterator for TrackedCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pull()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> Debug for TrackedCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedCursor")
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
