//! Bounded fan-out of asynchronous work items.
//!
//! Everything runs on the calling task; "concurrency" is the number of futures
//! polled at once, which for AI work is the number of outstanding requests.

use std::future::Future;

use futures::stream::{
    self,
    StreamExt,
};

use crate::config::ConcurrencyStrategy;

/// Runs `task` for every item with at most `limit` futures in flight.
///
/// Results are returned in completion order for [`ConcurrencyStrategy::WorkerPool`]
/// and in input order for [`ConcurrencyStrategy::FixedBatches`]; callers must not
/// rely on either. A `limit` of zero is treated as one.
pub async fn run_bounded<I, F, Fut, T>(
    items: I,
    limit: usize,
    strategy: ConcurrencyStrategy,
    mut task: F,
) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let limit = limit.max(1);

    match strategy {
        // N workers drain a shared queue: a new item starts as soon as any finishes
        ConcurrencyStrategy::WorkerPool => {
            stream::iter(items).map(task).buffer_unordered(limit).collect().await
        }
        // N items at a time; the next batch waits for the slowest of the current one
        ConcurrencyStrategy::FixedBatches => {
            let mut results = Vec::new();
            let mut items = items.into_iter();
            loop {
                let batch: Vec<Fut> = items.by_ref().take(limit).map(&mut task).collect();
                if batch.is_empty() {
                    break;
                }
                tracing::debug!(batch_size = batch.len(), "Running batch");
                results.extend(futures::future::join_all(batch).await);
            }
            results
        }
    }
}
