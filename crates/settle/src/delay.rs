//! Timer-based tasks

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use futures::future::join;
use tokio::time::{sleep, Sleep};

/// A task that settles with a fixed outcome once its timer elapses.
///
/// The timer starts when the value is created, not when it is first polled.
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[derive(Debug)]
pub struct Delayed<T, E> {
    timer: Pin<Box<Sleep>>,
    outcome: Option<Result<T, E>>,
}

impl<T, E> Delayed<T, E> {
    /// Settle with `outcome` after at least `duration`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new(outcome: Result<T, E>, duration: Duration) -> Self {
        Self {
            timer: Box::pin(sleep(duration)),
            outcome: Some(outcome),
        }
    }

    /// Check if the timer has elapsed
    pub fn is_elapsed(&self) -> bool {
        self.timer.is_elapsed()
    }
}

// The outcome is never pinned; only the boxed timer is polled in place.
impl<T, E> Unpin for Delayed<T, E> {}

impl<T, E> Future for Delayed<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        ready!(self.timer.as_mut().poll(cx));
        Poll::Ready(
            self.outcome
                .take()
                .expect("`Delayed` polled after completion"),
        )
    }
}

/// A task that fulfills with `value` after at least `duration`
pub fn delay_resolve<T, E>(value: T, duration: Duration) -> Delayed<T, E> {
    Delayed::new(Ok(value), duration)
}

/// A task that rejects with `reason` after at least `duration`
pub fn delay_reject<T, E>(reason: E, duration: Duration) -> Delayed<T, E> {
    Delayed::new(Err(reason), duration)
}

/// Forward the outcome of `task`, but not before `duration` has passed since
/// this call.
///
/// The task keeps running while the timer does, so the result arrives after
/// whichever of the two takes longer.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime.
pub fn delay<F, T, E>(task: F, duration: Duration) -> impl Future<Output = Result<T, E>>
where
    F: Future<Output = Result<T, E>>,
{
    let timer = sleep(duration);
    async move {
        let (outcome, ()) = join(task, timer).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test]
    async fn test_delay_resolve() {
        let started = Instant::now();
        let result: Result<&str, ()> = delay_resolve("value", ms(20)).await;
        assert_eq!(result, Ok("value"));
        assert!(started.elapsed() >= ms(20));
    }

    #[tokio::test]
    async fn test_delay_reject() {
        let started = Instant::now();
        let result: Result<(), &str> = delay_reject("reason", ms(20)).await;
        assert_eq!(result, Err("reason"));
        assert!(started.elapsed() >= ms(20));
    }

    #[tokio::test]
    async fn test_timer_starts_on_creation() {
        let delayed: Delayed<i32, ()> = delay_resolve(1, ms(10));
        assert!(!delayed.is_elapsed());
        tokio::time::sleep(ms(30)).await;

        let started = Instant::now();
        assert_eq!(delayed.await, Ok(1));
        assert!(started.elapsed() < ms(10));
    }

    #[tokio::test]
    async fn test_delay_waits_for_the_timer() {
        let started = Instant::now();
        let result = delay(async { Ok::<_, ()>(7) }, ms(30)).await;
        assert_eq!(result, Ok(7));
        assert!(started.elapsed() >= ms(30));
    }

    #[tokio::test]
    async fn test_delay_forwards_rejection() {
        let result = delay(delay_reject::<(), _>("late", ms(10)), ms(5)).await;
        assert_eq!(result, Err("late"));
    }

    #[tokio::test]
    async fn test_delay_is_not_added_to_task_time() {
        let started = Instant::now();
        let result = delay(delay_resolve::<_, ()>("a", ms(60)), ms(60)).await;
        assert_eq!(result, Ok("a"));
        // Both timers run side by side
        assert!(started.elapsed() < ms(110));
    }
}
