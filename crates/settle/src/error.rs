//! Error types for settlement aggregation

use thiserror::Error;

/// Failure produced when at least one aggregated task rejected.
///
/// Carries every rejection reason in input order. Callers must not assume a
/// single reason: when several tasks reject, all of their reasons are kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} of {} settled tasks rejected", .reasons.len(), .total)]
pub struct AggregateError<E> {
    reasons: Vec<E>,
    total: usize,
}

/// Result type alias for all-or-nothing aggregation
pub type AggregateResult<T, E> = Result<Vec<T>, AggregateError<E>>;

impl<E> AggregateError<E> {
    /// Create an aggregate error from the ordered rejection reasons of `total` tasks
    pub fn new(reasons: Vec<E>, total: usize) -> Self {
        Self {
            total: total.max(reasons.len()),
            reasons,
        }
    }

    /// The rejection reasons, in the input order of the tasks that rejected
    pub fn reasons(&self) -> &[E] {
        &self.reasons
    }

    /// Consume the error and return the rejection reasons
    pub fn into_reasons(self) -> Vec<E> {
        self.reasons
    }

    /// Number of tasks that rejected
    pub fn rejected(&self) -> usize {
        self.reasons.len()
    }

    /// Number of tasks that took part in the aggregation
    pub fn total(&self) -> usize {
        self.total
    }

    /// Check if every aggregated task rejected
    pub fn is_total_failure(&self) -> bool {
        self.reasons.len() == self.total
    }
}
