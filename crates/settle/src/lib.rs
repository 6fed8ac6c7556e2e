//! Settle - lazy sequences and task settlement combinators
//!
//! Two small toolkits that share one crate:
//!
//! - **Sequences**: restartable lazy sequences built from an ordered
//!   collection, text, or another sequence ([`sequence::default`],
//!   [`sequence::skip`], [`sequence::reiterable`], [`sequence::reverse`]).
//!   Every cursor they hand out reports whether it has run out through
//!   [`TrackedCursor::exhausted`].
//! - **Tasks**: combinators over futures resolving to `Result<T, E>` that
//!   settle many tasks at once ([`all_settled`], [`all_settled_iterable`],
//!   [`after_settled`]), race an executor against a timer
//!   ([`timed_or_resolve`], [`timed_or_reject`]) or delay an outcome
//!   ([`delay_resolve`], [`delay_reject`], [`delay`]).
//!
//! Rejections never escape a combinator unrepresented: they become a
//! [`Settlement::Rejected`] or are collected into an [`AggregateError`].
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use settle::{after_settled, all_settled, delay_reject, delay_resolve, sequence, Settlement};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let tail: String = sequence::skip("settle", 3).cursor().collect();
//!     assert_eq!(tail, "tle");
//!
//!     let settlements = all_settled([
//!         delay_resolve("a", Duration::from_millis(20)),
//!         delay_reject("b", Duration::from_millis(10)),
//!     ])
//!     .await;
//!     assert_eq!(settlements[1], Settlement::Rejected { reason: "b" });
//!
//!     let error = after_settled([
//!         delay_resolve("a", Duration::from_millis(20)),
//!         delay_reject("b", Duration::from_millis(10)),
//!     ])
//!     .await
//!     .unwrap_err();
//!     assert_eq!(error.reasons(), &["b"]);
//! }
//! ```

pub mod delay;
pub mod error;
pub mod exhaustion;
pub mod sequence;
pub mod settle;
pub mod source;
pub mod stream;
pub mod timed;
pub mod types;

pub use delay::{delay, delay_reject, delay_resolve, Delayed};
pub use error::{AggregateError, AggregateResult};
pub use exhaustion::{TrackedCursor, TrackedSequence};
pub use sequence::{Sequence, SequenceOp};
pub use settle::{after_settled, all_settled, settle, to_resolved, Partitioned};
pub use source::Source;
pub use stream::{all_settled_iterable, drain, SettledStream};
pub use timed::{timed, timed_or_reject, timed_or_resolve, Resolver, TimedSettlement};
pub use types::{IndexedSettlement, Settlement, SettlementState, TimedConfig, TimeoutPolicy};

use std::future::Future;
use std::pin::Pin;

/// A boxed task that is Send and can be mixed with tasks of other types
pub type BoxTask<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;
