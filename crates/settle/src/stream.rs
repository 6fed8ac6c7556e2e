//! Settlement in completion order

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::types::{IndexedSettlement, Settlement};

/// Start every task right away and stream their outcomes as they settle.
///
/// Each outcome carries the input position of the task it came from. The
/// stream yields exactly one item per task, in the order the tasks actually
/// settled, and ends after the last one. Every call starts a fresh race.
///
/// Tasks are spawned on the current Tokio runtime, so they keep running even
/// if the stream is dropped; only their outcomes go unobserved.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime.
pub fn all_settled_iterable<I, F, T, E>(tasks: I) -> SettledStream<T, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let tasks: Vec<F> = tasks.into_iter().collect();
    let total = tasks.len();

    // One slot per task; the send order is the settlement order.
    let (sender, receiver) = mpsc::channel(total.max(1));
    for (index, task) in tasks.into_iter().enumerate() {
        let sender = sender.clone();
        tokio::spawn(async move {
            let settlement = Settlement::from(task.await);
            trace!(index, state = %settlement.state(), "task settled");
            let _ = sender.send(IndexedSettlement::new(index, settlement)).await;
        });
    }

    SettledStream {
        receiver,
        remaining: total,
    }
}

/// Outcomes of a set of tasks in the order they settled
#[must_use = "streams do nothing unless polled"]
#[derive(Debug)]
pub struct SettledStream<T, E> {
    receiver: mpsc::Receiver<IndexedSettlement<T, E>>,
    remaining: usize,
}

impl<T, E> SettledStream<T, E> {
    /// Number of outcomes not yet yielded
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<T, E> Stream for SettledStream<T, E> {
    type Item = IndexedSettlement<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }

        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(settlement)) => {
                self.remaining -= 1;
                Poll::Ready(Some(settlement))
            }
            Poll::Ready(None) => {
                // Only a panicking task drops its sender without sending
                warn!(
                    remaining = self.remaining,
                    "tasks ended without settling, closing the stream early"
                );
                self.remaining = 0;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Pull every item out of `stream` and collect them in production order
pub async fn drain<S: Stream>(stream: S) -> Vec<S::Item> {
    stream.collect().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::{self, FutureExt};

    use super::*;
    use crate::delay::{delay_reject, delay_resolve};
    use crate::types::SettlementState;
    use crate::BoxTask;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test]
    async fn test_completion_order_with_input_index() {
        let stream = all_settled_iterable([delay_resolve("a", ms(60)), delay_reject("b", ms(20))]);
        assert_eq!(
            drain(stream).await,
            vec![
                IndexedSettlement::new(1, Settlement::Rejected { reason: "b" }),
                IndexedSettlement::new(0, Settlement::Fulfilled { value: "a" }),
            ]
        );
    }

    #[tokio::test]
    async fn test_completion_order_many_tasks() {
        let tasks: Vec<BoxTask<u32, u32>> = vec![
            delay_resolve(0, ms(90)).boxed(),
            delay_reject(1, ms(10)).boxed(),
            delay_resolve(2, ms(50)).boxed(),
            future::ready(Ok(3)).boxed(),
        ];
        let settled = drain(all_settled_iterable(tasks)).await;

        let order: Vec<usize> = settled.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
        let states: Vec<SettlementState> = settled.iter().map(IndexedSettlement::state).collect();
        assert_eq!(
            states,
            vec![
                SettlementState::Fulfilled,
                SettlementState::Rejected,
                SettlementState::Fulfilled,
                SettlementState::Fulfilled,
            ]
        );
    }

    #[tokio::test]
    async fn test_pull_waits_for_next_settlement() {
        let mut stream = all_settled_iterable([
            delay_resolve::<_, ()>(1, ms(20)),
            delay_resolve(2, ms(80)),
        ]);
        assert_eq!(stream.remaining(), 2);
        assert_eq!(stream.size_hint(), (0, Some(2)));

        let first = stream.next().await.unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(stream.remaining(), 1);

        let second = stream.next().await.unwrap();
        assert_eq!(second.settlement, Settlement::Fulfilled { value: 2 });
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_tasks_start_before_first_pull() {
        let stream = all_settled_iterable([delay_resolve::<_, ()>("x", ms(10))]);
        tokio::time::sleep(ms(40)).await;

        let started = tokio::time::Instant::now();
        assert_eq!(drain(stream).await.len(), 1);
        assert!(started.elapsed() < ms(10));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let stream = all_settled_iterable(Vec::<future::Ready<Result<(), ()>>>::new());
        assert!(drain(stream).await.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_task_ends_stream_early() {
        let tasks: Vec<BoxTask<i32, ()>> = vec![
            future::lazy(|_| -> Result<i32, ()> { panic!("task exploded") }).boxed(),
            delay_resolve(1, ms(10)).boxed(),
        ];
        let settled = drain(all_settled_iterable(tasks)).await;
        assert_eq!(settled, vec![IndexedSettlement::new(1, Settlement::Fulfilled { value: 1 })]);
    }

    #[tokio::test]
    async fn test_drain_preserves_order() {
        let items = drain(futures::stream::iter(vec!['t', 'e', 's', 't'])).await;
        assert_eq!(items, vec!['t', 'e', 's', 't']);
    }
}
