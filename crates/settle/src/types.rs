//! Settlement outcomes and configuration shared by the task combinators

use std::fmt::{self, Display};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The two states a settled task can end up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementState {
    /// The task completed with a value
    Fulfilled,
    /// The task failed with a reason
    Rejected,
}

impl SettlementState {
    /// The tag used for this state in every tagged outcome
    pub const fn as_str(&self) -> &'static str {
        match self {
            SettlementState::Fulfilled => "fulfilled",
            SettlementState::Rejected => "rejected",
        }
    }
}

impl Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged outcome of a single task.
///
/// Serializes as `{"state": "fulfilled", "value": ..}` or
/// `{"state": "rejected", "reason": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Settlement<T, E> {
    /// The task completed successfully
    Fulfilled { value: T },
    /// The task failed
    Rejected { reason: E },
}

impl<T, E> Settlement<T, E> {
    /// The state tag of this outcome
    pub fn state(&self) -> SettlementState {
        match self {
            Settlement::Fulfilled { .. } => SettlementState::Fulfilled,
            Settlement::Rejected { .. } => SettlementState::Rejected,
        }
    }

    /// Check if the task fulfilled
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled { .. })
    }

    /// Check if the task rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected { .. })
    }

    /// The fulfilled value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Settlement::Fulfilled { value } => Some(value),
            Settlement::Rejected { .. } => None,
        }
    }

    /// The rejection reason, if any
    pub fn reason(&self) -> Option<&E> {
        match self {
            Settlement::Fulfilled { .. } => None,
            Settlement::Rejected { reason } => Some(reason),
        }
    }

    /// Convert back into the result the task produced
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settlement::Fulfilled { value } => Ok(value),
            Settlement::Rejected { reason } => Err(reason),
        }
    }
}

impl<T, E> From<Result<T, E>> for Settlement<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settlement::Fulfilled { value },
            Err(reason) => Settlement::Rejected { reason },
        }
    }
}

/// A settlement annotated with the input position of the task that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedSettlement<T, E> {
    /// The outcome of the task
    #[serde(flatten)]
    pub settlement: Settlement<T, E>,
    /// Zero-based position of the originating task in the input
    pub index: usize,
}

impl<T, E> IndexedSettlement<T, E> {
    /// Create a new indexed settlement
    pub fn new(index: usize, settlement: Settlement<T, E>) -> Self {
        Self { settlement, index }
    }

    /// The state tag of this outcome
    pub fn state(&self) -> SettlementState {
        self.settlement.state()
    }
}

/// What a timed race settles with when the timer wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy<T, E> {
    /// A timeout counts as success with this value
    Resolve(T),
    /// A timeout counts as failure with this reason
    Reject(E),
}

impl<T, E> TimeoutPolicy<T, E> {
    /// The outcome forced by the timer
    pub fn into_result(self) -> Result<T, E> {
        match self {
            TimeoutPolicy::Resolve(value) => Ok(value),
            TimeoutPolicy::Reject(reason) => Err(reason),
        }
    }

    /// The state the race ends in when the timer wins
    pub fn state(&self) -> SettlementState {
        match self {
            TimeoutPolicy::Resolve(_) => SettlementState::Fulfilled,
            TimeoutPolicy::Reject(_) => SettlementState::Rejected,
        }
    }
}

/// Configuration for a timed race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedConfig<T, E> {
    /// How long the executor gets before the timer settles the race.
    ///
    /// A zero timeout makes the timer eligible on the next scheduling tick.
    pub timeout: Duration,

    /// The outcome forced when the timer fires first
    pub on_timeout: TimeoutPolicy<T, E>,
}

impl<T, E> TimedConfig<T, E> {
    /// A race that resolves with `value` once `timeout` elapses
    pub fn resolve_after(timeout: Duration, value: T) -> Self {
        Self {
            timeout,
            on_timeout: TimeoutPolicy::Resolve(value),
        }
    }

    /// A race that rejects with `reason` once `timeout` elapses
    pub fn reject_after(timeout: Duration, reason: E) -> Self {
        Self {
            timeout,
            on_timeout: TimeoutPolicy::Reject(reason),
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout outcome
    pub fn with_policy(mut self, on_timeout: TimeoutPolicy<T, E>) -> Self {
        self.on_timeout = on_timeout;
        self
    }
}
