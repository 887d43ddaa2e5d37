//! Background hit counting.
//!
//! [`HitRecorder`] is the producer side used on the redirect path; it never
//! waits. [`run_hit_worker`] drains the queue and applies increments to the
//! store, retrying transient failures with jittered exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::LinkStore;
use crate::error::AppError;

/// Retries after the first failed increment.
const MAX_RETRIES: usize = 3;
const RETRY_BASE_MS: u64 = 10;
const RETRY_MAX_DELAY: Duration = Duration::from_millis(500);

/// Non-blocking handle for queueing hits.
#[derive(Debug, Clone)]
pub struct HitRecorder {
    sender: mpsc::Sender<HitEvent>,
}

impl HitRecorder {
    pub fn new(sender: mpsc::Sender<HitEvent>) -> Self {
        Self { sender }
    }

    /// Creates a recorder and the receiving end for [`run_hit_worker`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<HitEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Queues a hit without waiting.
    ///
    /// If the queue is full the send is handed to a spawned task, so the hit
    /// is still delivered once the worker catches up. Hits are only dropped
    /// when the worker has shut down.
    ///
    /// Deferred sends are not capped. Under sustained overload the parked
    /// tasks grow without bound; counts stay exact at the cost of memory.
    pub fn record(&self, event: HitEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(link_id = event.link_id, "Hit queue full, deferring send");
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if let Err(e) = sender.send(event).await {
                        warn!(link_id = e.0.link_id, "Hit dropped: queue closed");
                    }
                });
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    link_id = event.link_id,
                    slug = %event.slug,
                    "Hit dropped: queue closed"
                );
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

/// What happened to a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Applied,
    /// The record was deleted before the increment landed.
    Missed,
    /// The store stayed unavailable through every retry.
    Dropped,
}

/// Counters reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitWorkerStats {
    pub applied: u64,
    pub missed: u64,
    pub dropped: u64,
}

impl HitWorkerStats {
    fn record(&mut self, outcome: HitOutcome) {
        match outcome {
            HitOutcome::Applied => self.applied += 1,
            HitOutcome::Missed => self.missed += 1,
            HitOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Applies queued hits until every [`HitRecorder`] is dropped.
///
/// At most `concurrency` increments are in flight. Once the channel closes the
/// worker waits for in-flight increments and returns its counters, which is
/// what makes shutdown lossless for hits already queued.
pub async fn run_hit_worker<S>(
    mut rx: mpsc::Receiver<HitEvent>,
    store: Arc<S>,
    concurrency: usize,
) -> HitWorkerStats
where
    S: LinkStore + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let mut in_flight = JoinSet::new();
    let mut stats = HitWorkerStats::default();

    while let Some(event) = rx.recv().await {
        while in_flight.len() >= concurrency {
            if let Some(joined) = in_flight.join_next().await {
                collect(&mut stats, joined);
            }
        }

        let store = Arc::clone(&store);
        in_flight.spawn(async move { apply_hit(store.as_ref(), event).await });
    }

    while let Some(joined) = in_flight.join_next().await {
        collect(&mut stats, joined);
    }

    info!(
        applied = stats.applied,
        missed = stats.missed,
        dropped = stats.dropped,
        "Hit worker stopped"
    );

    stats
}

fn collect(stats: &mut HitWorkerStats, joined: Result<HitOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => stats.record(outcome),
        Err(e) => {
            error!(error = %e, "Hit task failed");
            stats.record(HitOutcome::Dropped);
        }
    }
}

/// Increments the counter for one hit, retrying only while the store is
/// unavailable.
pub async fn apply_hit<S>(store: &S, event: HitEvent) -> HitOutcome
where
    S: LinkStore + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MS)
        .max_delay(RETRY_MAX_DELAY)
        .map(jitter)
        .take(MAX_RETRIES);

    let result = RetryIf::start(
        strategy,
        || store.increment_hit(event.link_id),
        |e: &AppError| e.is_unavailable(),
    )
    .await;

    match result {
        Ok(()) => {
            debug!(link_id = event.link_id, slug = %event.slug, "Hit recorded");
            HitOutcome::Applied
        }
        Err(AppError::NotFound { .. }) => {
            debug!(link_id = event.link_id, slug = %event.slug, "Hit for deleted link ignored");
            HitOutcome::Missed
        }
        Err(e) => {
            warn!(
                link_id = event.link_id,
                slug = %event.slug,
                error = %e,
                "Hit dropped after retries"
            );
            HitOutcome::Dropped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unavailable() -> AppError {
        AppError::unavailable("down", json!({}))
    }

    #[tokio::test]
    async fn test_apply_hit_success() {
        let mut store = MockLinkStore::new();
        store
            .expect_increment_hit()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|_| Ok(()));

        let outcome = apply_hit(&store, HitEvent::new(7, "abc")).await;
        assert_eq!(outcome, HitOutcome::Applied);
    }

    #[tokio::test]
    async fn test_apply_hit_retries_unavailable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut store = MockLinkStore::new();
        store.expect_increment_hit().times(3).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok(())
            }
        });

        let outcome = apply_hit(&store, HitEvent::new(1, "abc")).await;
        assert_eq!(outcome, HitOutcome::Applied);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_apply_hit_gives_up_after_retries() {
        let mut store = MockLinkStore::new();
        store
            .expect_increment_hit()
            .times(MAX_RETRIES + 1)
            .returning(|_| Err(unavailable()));

        let outcome = apply_hit(&store, HitEvent::new(1, "abc")).await;
        assert_eq!(outcome, HitOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_apply_hit_not_found_is_not_retried() {
        let mut store = MockLinkStore::new();
        store
            .expect_increment_hit()
            .times(1)
            .returning(|_| Err(AppError::not_found("gone", json!({}))));

        let outcome = apply_hit(&store, HitEvent::new(1, "abc")).await;
        assert_eq!(outcome, HitOutcome::Missed);
    }

    #[tokio::test]
    async fn test_worker_drains_queue_on_close() {
        let mut store = MockLinkStore::new();
        store.expect_increment_hit().times(25).returning(|_| Ok(()));

        let (recorder, rx) = HitRecorder::channel(100);
        for i in 0..25 {
            recorder.record(HitEvent::new(i, "abc"));
        }
        drop(recorder);

        let stats = run_hit_worker(rx, Arc::new(store), 4).await;
        assert_eq!(stats.applied, 25);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test]
    async fn test_recorder_defers_when_full() {
        let mut store = MockLinkStore::new();
        store.expect_increment_hit().times(10).returning(|_| Ok(()));

        let (recorder, rx) = HitRecorder::channel(2);
        let worker = tokio::spawn(run_hit_worker(rx, Arc::new(store), 2));

        for _ in 0..10 {
            recorder.record(HitEvent::new(1, "abc"));
        }

        // Deferred sends hold their own sender clones until delivered.
        drop(recorder);

        let stats = worker.await.unwrap();
        assert_eq!(stats.applied, 10);
    }

    #[tokio::test]
    async fn test_deferred_sends_park_until_drained() {
        let (recorder, mut rx) = HitRecorder::channel(1);

        for i in 0..100 {
            recorder.record(HitEvent::new(i, "abc"));
        }
        drop(recorder);

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event.link_id);
        }
        received.sort_unstable();

        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_recorder_reports_closed() {
        let (recorder, rx) = HitRecorder::channel(10);
        assert!(!recorder.is_closed());
        drop(rx);
        assert!(recorder.is_closed());
        recorder.record(HitEvent::new(1, "abc"));
    }
}
