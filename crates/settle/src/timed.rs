//! Racing an executor against a timer
//!
//! The executor receives a [`Resolver`] and is started immediately; a timer is
//! armed right after it. Whichever side reaches the settlement path first
//! decides the outcome, exactly once. When the executor wins, the timer task is
//! aborted. When the timer wins, later executor calls are ignored. Losing the
//! race does not stop any work the executor started.
//!
//! A timer that is dropped before it fires, for example because its runtime
//! shut down, settles the race with the timeout outcome on the way out.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::types::{TimedConfig, TimeoutPolicy};

/// Which side of a race settled it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Winner {
    Executor,
    Timer,
}

/// Synchronization token shared by one race's resolvers and its timer
struct Race<T, E> {
    state: Mutex<RaceState<T, E>>,
}

struct RaceState<T, E> {
    /// Taken by whichever side settles first; `None` means settled
    sender: Option<oneshot::Sender<Result<T, E>>>,
    /// The pending timer, if armed
    timer: Option<JoinHandle<()>>,
}

impl<T, E> Race<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn new(sender: oneshot::Sender<Result<T, E>>) -> Self {
        Self {
            state: Mutex::new(RaceState {
                sender: Some(sender),
                timer: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RaceState<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_settled(&self) -> bool {
        self.lock().sender.is_none()
    }

    /// Check-and-set the settled flag, then deliver `outcome` if this call won
    fn settle(&self, outcome: Result<T, E>, winner: Winner) -> bool {
        let mut state = self.lock();
        let Some(sender) = state.sender.take() else {
            trace!(?winner, "race already settled, ignoring");
            return false;
        };
        let timer = state.timer.take();
        drop(state);

        if winner == Winner::Executor {
            if let Some(timer) = timer {
                timer.abort();
                trace!("executor settled first, timer cancelled");
            }
        }

        debug!(?winner, fulfilled = outcome.is_ok(), "timed race settled");
        let _ = sender.send(outcome);
        true
    }

    /// Start the timer unless the executor already settled
    fn arm(self: &Arc<Self>, timeout: Duration, on_timeout: TimeoutPolicy<T, E>) {
        let mut state = self.lock();
        if state.sender.is_none() {
            trace!("executor settled before the timer was armed");
            return;
        }

        let mut timer = Timer {
            race: Arc::clone(self),
            on_timeout: Some(on_timeout),
        };
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            timer.fire();
        }));
    }
}

/// The timer side of a race, owned by the spawned timer task
struct Timer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    race: Arc<Race<T, E>>,
    /// Taken when the timer fires
    on_timeout: Option<TimeoutPolicy<T, E>>,
}

impl<T, E> Timer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn fire(&mut self) {
        if let Some(on_timeout) = self.on_timeout.take() {
            self.race.settle(on_timeout.into_result(), Winner::Timer);
        }
    }
}

impl<T, E> Drop for Timer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn drop(&mut self) {
        if self.on_timeout.is_none() || self.race.is_settled() {
            return;
        }
        debug!("timer dropped before firing, settling with the timeout outcome");
        self.fire();
    }
}

/// Handle given to the executor of a timed race.
///
/// Clones share the same race. Only the first settlement across all clones and
/// the timer takes effect; every later call returns `false`.
pub struct Resolver<T, E> {
    race: Arc<Race<T, E>>,
}

impl<T, E> Resolver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Fulfill the race with `value`. Returns whether this call settled it.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject the race with `reason`. Returns whether this call settled it.
    pub fn reject(&self, reason: E) -> bool {
        self.settle(Err(reason))
    }

    /// Settle the race with `outcome`. Returns whether this call settled it.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        self.race.settle(outcome, Winner::Executor)
    }

    /// Check if the race has already been settled by either side
    pub fn is_settled(&self) -> bool {
        self.race.is_settled()
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            race: Arc::clone(&self.race),
        }
    }
}

impl<T, E> std::fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

/// The outcome of a timed race
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[derive(Debug)]
pub struct TimedSettlement<T, E> {
    /// `None` once the receiver has completed
    receiver: Option<oneshot::Receiver<Result<T, E>>>,
}

impl<T, E> Future for TimedSettlement<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Pending;
        };
        let received = ready!(Pin::new(receiver).poll(cx));
        self.receiver = None;
        match received {
            Ok(outcome) => Poll::Ready(outcome),
            // Only reachable if the timer was never armed, so nothing is left
            // to settle the race.
            Err(_) => {
                debug!("timed race abandoned before settling");
                Poll::Pending
            }
        }
    }
}

/// Run `executor` against a timer described by `config`.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime.
pub fn timed<T, E, F>(executor: F, config: TimedConfig<T, E>) -> TimedSettlement<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(Resolver<T, E>),
{
    let (sender, receiver) = oneshot::channel();
    let race = Arc::new(Race::new(sender));

    executor(Resolver {
        race: Arc::clone(&race),
    });
    race.arm(config.timeout, config.on_timeout);

    TimedSettlement {
        receiver: Some(receiver),
    }
}

/// Run `executor`, fulfilling with `value` if it has not settled within `timeout`
pub fn timed_or_resolve<T, E, F>(executor: F, timeout: Duration, value: T) -> TimedSettlement<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(Resolver<T, E>),
{
    timed(executor, TimedConfig::resolve_after(timeout, value))
}

/// Run `executor`, rejecting with `reason` if it has not settled within `timeout`
pub fn timed_or_reject<T, E, F>(executor: F, timeout: Duration, reason: E) -> TimedSettlement<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(Resolver<T, E>),
{
    timed(executor, TimedConfig::reject_after(timeout, reason))
}

#[cfg(test)]
mod tests {
    use tokio::time::{sleep, Instant};

    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    /// Executor that settles with `outcome` after `after`
    fn settles_after<T, E>(outcome: Result<T, E>, after: Duration) -> impl FnOnce(Resolver<T, E>)
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        move |resolver| {
            tokio::spawn(async move {
                sleep(after).await;
                resolver.settle(outcome);
            });
        }
    }

    #[tokio::test]
    async fn test_immediate_rejection_beats_zero_timeout() {
        let result = timed_or_resolve(
            |resolver| {
                resolver.reject("failure");
            },
            Duration::ZERO,
            "fallback",
        )
        .await;
        assert_eq!(result, Err("failure"));
    }

    #[tokio::test]
    async fn test_timeout_resolves_with_fallback() {
        let result = timed_or_resolve(settles_after(Err("failure"), ms(100)), ms(20), "fallback").await;
        assert_eq!(result, Ok("fallback"));
    }

    #[tokio::test]
    async fn test_executor_resolves_before_timeout() {
        let result = timed_or_reject(settles_after(Ok("value"), ms(10)), ms(100), "timeout").await;
        assert_eq!(result, Ok("value"));
    }

    #[tokio::test]
    async fn test_timeout_rejects_with_reason() {
        let result = timed_or_reject(settles_after(Ok("value"), ms(100)), ms(20), "timeout").await;
        assert_eq!(result, Err("timeout"));
    }

    #[tokio::test]
    async fn test_late_executor_call_is_ignored() {
        let (tx, rx) = oneshot::channel();
        let result = timed_or_resolve(
            |resolver: Resolver<&'static str, &'static str>| {
                let _ = tx.send(resolver);
            },
            ms(10),
            "fallback",
        )
        .await;
        assert_eq!(result, Ok("fallback"));

        let resolver = rx.await.unwrap();
        assert!(resolver.is_settled());
        assert!(!resolver.resolve("late"));
        assert!(!resolver.reject("late"));
    }

    #[tokio::test]
    async fn test_only_first_executor_call_counts() {
        let result = timed_or_reject(
            |resolver| {
                assert!(resolver.resolve(1));
                assert!(!resolver.clone().reject("second"));
                assert!(!resolver.resolve(2));
            },
            ms(10),
            "timeout",
        )
        .await;
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn test_executor_win_cancels_timer() {
        let (tx, rx) = oneshot::channel();
        let result = timed_or_resolve(
            |resolver: Resolver<u8, ()>| {
                let _ = tx.send(resolver.clone());
                tokio::spawn(async move {
                    sleep(ms(5)).await;
                    resolver.resolve(1);
                });
            },
            ms(200),
            0,
        )
        .await;
        assert_eq!(result, Ok(1));

        // Once the aborted timer task is dropped, only this handle keeps the race alive
        let resolver = rx.await.unwrap();
        sleep(ms(10)).await;
        assert!(resolver.is_settled());
        assert_eq!(Arc::strong_count(&resolver.race), 1);
    }

    #[test]
    fn test_dropped_runtime_settles_with_timeout_outcome() {
        let first = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let race = {
            let _entered = first.enter();
            timed_or_resolve(
                |resolver: Resolver<u8, ()>| {
                    let _ = tx.send(resolver);
                },
                Duration::from_secs(60),
                0,
            )
        };
        drop(first);

        let resolver = rx.recv().unwrap();
        assert!(resolver.is_settled());
        drop(resolver);

        let second = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let outcome = second.block_on(async {
            let mut race = race;
            let first_poll = tokio::time::timeout(ms(200), &mut race).await;
            // A completed race stays quiet instead of polling a spent channel
            let second_poll = tokio::time::timeout(ms(20), &mut race).await;
            (first_poll, second_poll.is_err())
        });
        assert_eq!(outcome, (Ok(Ok(0)), true));
    }

    #[tokio::test]
    async fn test_timed_with_config() {
        let started = Instant::now();
        let config: TimedConfig<(), &str> = TimedConfig::reject_after(ms(20), "slow");
        let result = timed(|_resolver| {}, config).await;
        assert_eq!(result, Err("slow"));
        assert!(started.elapsed() >= ms(20));
    }
}
