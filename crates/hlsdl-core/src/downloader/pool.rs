//! Bounded worker pool draining the work queue through a segment processor.

use super::unit::SegmentProcessor;
use crate::queue::WorkQueue;
use crate::retry::{classify, ErrorKind, RetryDecision, RetryPolicy};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

/// Emitted after each segment is persisted and counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completion counter value after this segment.
    pub completed: usize,
    pub total: usize,
    pub index: usize,
    pub uri: String,
}

impl ProgressEvent {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}

/// Outcome counts for one pool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub completed: usize,
    /// Indices given up on (retry cap reached or logic defect).
    pub abandoned: usize,
    /// Failed attempts across all indices, retried or not.
    pub failed_attempts: usize,
    pub throttle_events: usize,
}

#[derive(Default)]
struct Counters {
    failed_attempts: AtomicUsize,
    throttle_events: AtomicUsize,
}

/// Abandons the index if the worker unwinds while holding it, so siblings
/// blocked in `take` are not left waiting for it forever.
struct InFlightGuard<'a> {
    queue: &'a WorkQueue,
    index: usize,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::error!(index = self.index, "worker unwound while processing segment");
            let _ = self.queue.abandon(self.index);
        }
    }
}

/// Runs `concurrency` worker threads until every index in `queue` is completed
/// or abandoned, then joins them all.
///
/// Failed attempts are requeued (after the policy's backoff) rather than
/// surfaced; only the summary reports them.
pub fn run_pool<P>(
    queue: Arc<WorkQueue>,
    processor: Arc<P>,
    concurrency: usize,
    policy: RetryPolicy,
    progress_tx: Option<mpsc::Sender<ProgressEvent>>,
) -> PoolSummary
where
    P: SegmentProcessor + ?Sized + 'static,
{
    let total = queue.total();
    let attempts: Arc<Vec<AtomicU32>> = Arc::new((0..total).map(|_| AtomicU32::new(0)).collect());
    let counters = Arc::new(Counters::default());

    let num_workers = concurrency.max(1).min(total);
    tracing::debug!(total, workers = num_workers, "starting segment workers");
    let mut handles = Vec::with_capacity(num_workers);
    for worker in 0..num_workers {
        let queue = Arc::clone(&queue);
        let processor = Arc::clone(&processor);
        let attempts = Arc::clone(&attempts);
        let counters = Arc::clone(&counters);
        let tx = progress_tx.clone();
        handles.push(std::thread::spawn(move || {
            while let Some(index) = queue.take() {
                let guard = InFlightGuard {
                    queue: &queue,
                    index,
                    armed: true,
                };
                let res = processor.process(index);
                guard.disarm();

                match res {
                    Ok(outcome) => match queue.complete(index) {
                        Ok(completed) => {
                            if let Some(tx) = &tx {
                                let _ = tx.send(ProgressEvent {
                                    completed,
                                    total,
                                    index,
                                    uri: outcome.uri,
                                });
                            }
                        }
                        Err(e) => tracing::error!(worker, "completion rejected: {}", e),
                    },
                    Err(e) => {
                        let attempt = attempts[index].fetch_add(1, Ordering::Relaxed) + 1;
                        counters.failed_attempts.fetch_add(1, Ordering::Relaxed);
                        let kind = classify(&e);
                        if kind == ErrorKind::Throttled {
                            counters.throttle_events.fetch_add(1, Ordering::Relaxed);
                        }
                        tracing::warn!(worker, index, attempt, "segment failed: {}", e);

                        match policy.decide(attempt, kind) {
                            RetryDecision::RetryAfter(delay) => {
                                if !delay.is_zero() {
                                    std::thread::sleep(delay);
                                }
                                match queue.requeue(index) {
                                    Ok(()) => tracing::debug!(index, "segment requeued"),
                                    Err(qe) => tracing::error!(worker, "requeue rejected: {}", qe),
                                }
                            }
                            RetryDecision::NoRetry => {
                                tracing::error!(index, attempt, "giving up on segment: {}", e);
                                if let Err(qe) = queue.abandon(index) {
                                    tracing::error!(worker, "abandon rejected: {}", qe);
                                }
                            }
                        }
                    }
                }
            }
        }));
    }
    drop(progress_tx);

    for h in handles {
        if let Err(e) = h.join() {
            tracing::error!("segment worker panicked: {:?}", e);
        }
    }

    PoolSummary {
        completed: queue.completed(),
        abandoned: queue.abandoned(),
        failed_attempts: counters.failed_attempts.load(Ordering::Relaxed),
        throttle_events: counters.throttle_events.load(Ordering::Relaxed),
    }
}
