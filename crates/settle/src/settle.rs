//! Settlement of many tasks at once
//!
//! A task is any future resolving to `Result<T, E>`. The combinators here
//! never let a rejection escape: it is either reified into a
//! [`Settlement::Rejected`] or collected into an [`AggregateError`].

use std::future::Future;

use futures::future::join_all;
use tracing::{debug, trace};

use crate::error::{AggregateError, AggregateResult};
use crate::types::Settlement;

/// Convert a task into one that always completes with a tagged outcome
pub async fn settle<F, T, E>(task: F) -> Settlement<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    Settlement::from(task.await)
}

/// Classify every task, keeping positional correspondence with the input
pub fn to_resolved<I, F, T, E>(tasks: I) -> Vec<impl Future<Output = Settlement<T, E>>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    tasks.into_iter().map(settle).collect()
}

/// Wait for every task to settle and return the outcomes in input order.
///
/// The order of the result does not depend on the order in which the tasks
/// finished. This never fails.
pub async fn all_settled<I, F, T, E>(tasks: I) -> Vec<Settlement<T, E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let settlements = join_all(to_resolved(tasks)).await;
    trace!(count = settlements.len(), "all tasks settled");
    settlements
}

/// Succeed with every value only if every task fulfilled.
///
/// If any task rejected, fails with the reasons of *all* rejected tasks in
/// input order, and the values of the tasks that did fulfill are dropped.
pub async fn after_settled<I, F, T, E>(tasks: I) -> AggregateResult<T, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let partitioned: Partitioned<T, E> = all_settled(tasks).await.into_iter().collect();
    partitioned.into_result()
}

/// Settlements split into fulfilled values and rejection reasons.
///
/// Both buckets keep the relative order of the settlements they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioned<T, E> {
    /// Values of the fulfilled settlements
    pub values: Vec<T>,
    /// Reasons of the rejected settlements
    pub reasons: Vec<E>,
}

impl<T, E> Partitioned<T, E> {
    /// Create empty buckets
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            reasons: Vec::new(),
        }
    }

    /// Put a settlement in its bucket
    pub fn push(&mut self, settlement: Settlement<T, E>) {
        match settlement {
            Settlement::Fulfilled { value } => self.values.push(value),
            Settlement::Rejected { reason } => self.reasons.push(reason),
        }
    }

    /// Number of settlements classified so far
    pub fn len(&self) -> usize {
        self.values.len() + self.reasons.len()
    }

    /// Check if nothing has been classified
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Ok` with every value if nothing rejected, otherwise every reason
    pub fn into_result(self) -> AggregateResult<T, E> {
        if self.reasons.is_empty() {
            return Ok(self.values);
        }

        let total = self.len();
        debug!(
            rejected = self.reasons.len(),
            total, "aggregation failed, dropping fulfilled values"
        );
        Err(AggregateError::new(self.reasons, total))
    }
}

impl<T, E> Default for Partitioned<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> FromIterator<Settlement<T, E>> for Partitioned<T, E> {
    fn from_iter<I: IntoIterator<Item = Settlement<T, E>>>(iter: I) -> Self {
        let mut partitioned = Self::new();
        for settlement in iter {
            partitioned.push(settlement);
        }
        partitioned
    }
}

impl<T, E> Extend<Settlement<T, E>> for Partitioned<T, E> {
    fn extend<I: IntoIterator<Item = Settlement<T, E>>>(&mut self, iter: I) {
        for settlement in iter {
            self.push(settlement);
        }
    }
}
