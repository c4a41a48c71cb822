//! Periodic history refresh.
//!
//! The [`Poller`] re-collects the full event history on a fixed interval,
//! replays it into a fresh [`LedgerView`], and hands the view to a
//! [`RefreshSink`]. A refresh can also be requested early through the
//! shared [`Notify`] trigger, for example right after a transaction
//! confirms.
//!
//! Refreshes are not mutually exclusive: a slow fetch does not hold up
//! the next tick. Each refresh takes a sequence number when it starts and
//! is only published if no newer refresh has been published already, so
//! a late result never overwrites a fresher one.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use commitboard_types::{CommitHistory, LedgerView};
use tokio::sync::{Mutex, Notify, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::CalendarClock;

/// Error reported by a [`HistorySource`].
#[derive(Debug, thiserror::Error)]
#[error("history source failed: {message}")]
pub struct SourceError {
    /// Description of the failure.
    pub message: String,
}

impl SourceError {
    /// Wrap any displayable error.
    pub fn new(err: impl std::fmt::Display) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Errors that can occur during a single refresh.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Fetching history failed. The previous view stays in place.
    #[error("refresh failed: {source}")]
    Source {
        /// The underlying source error.
        #[from]
        source: SourceError,
    },
}

/// Outcome of a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The view was handed to the sink.
    Published {
        /// Sequence number of the refresh.
        sequence: u64,
    },
    /// A newer refresh had already been published; this one was dropped.
    Superseded {
        /// Sequence number of the refresh.
        sequence: u64,
    },
}

/// Anything that can produce the complete event history.
pub trait HistorySource: Send + Sync {
    /// Fetch every commit and clear event from the start of history.
    fn fetch_history(&self) -> impl Future<Output = Result<CommitHistory, SourceError>> + Send;
}

/// Receiver of freshly replayed views.
pub trait RefreshSink: Send + Sync {
    /// Replace the published view.
    fn publish(&self, view: LedgerView) -> impl Future<Output = ()> + Send;
}

/// Drives periodic refreshes from a source into a sink.
pub struct Poller<S, K> {
    source: Arc<S>,
    sink: Arc<K>,
    clock: CalendarClock,
    interval: Duration,
    leaderboard_limit: usize,
    trigger: Arc<Notify>,
    started: AtomicU64,
    applied: Mutex<u64>,
}

impl<S, K> Poller<S, K>
where
    S: HistorySource + 'static,
    K: RefreshSink + 'static,
{
    /// Create a poller.
    pub fn new(
        source: Arc<S>,
        sink: Arc<K>,
        clock: CalendarClock,
        interval: Duration,
        leaderboard_limit: usize,
    ) -> Self {
        Self {
            source,
            sink,
            clock,
            interval,
            leaderboard_limit,
            trigger: Arc::new(Notify::new()),
            started: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    /// Use an existing trigger instead of a fresh one.
    #[must_use]
    pub fn with_trigger(mut self, trigger: Arc<Notify>) -> Self {
        self.trigger = trigger;
        self
    }

    /// Handle for requesting an immediate refresh.
    pub fn trigger(&self) -> Arc<Notify> {
        Arc::clone(&self.trigger)
    }

    /// Run one refresh: fetch, replay, publish unless superseded.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Source`] if the history could not be fetched.
    /// Nothing is published in that case.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, PollError> {
        let sequence = self.started.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        let history = self.source.fetch_history().await?;
        let view = commitboard_ledger::replay(&history, &self.clock.now(), self.leaderboard_limit);

        let mut applied = self.applied.lock().await;
        if *applied >= sequence {
            debug!(sequence, applied = *applied, "stale refresh dropped");
            return Ok(RefreshOutcome::Superseded { sequence });
        }
        self.sink.publish(view).await;
        *applied = sequence;
        drop(applied);

        debug!(sequence, latest_block = history.latest_block, "view published");
        Ok(RefreshOutcome::Published { sequence })
    }

    /// Run until `shutdown` flips to `true`.
    ///
    /// Refreshes immediately on start, then on every interval tick and
    /// every trigger notification. Each refresh runs in its own task.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            leaderboard_limit = self.leaderboard_limit,
            "Poller started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.trigger.notified() => {
                    debug!("refresh triggered");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            self.spawn_refresh();
        }

        info!("Poller stopped");
    }

    fn spawn_refresh(self: &Arc<Self>) {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = poller.refresh_once().await {
                warn!(error = %e, "history refresh failed, keeping previous view");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use alloy_primitives::{Address, B256};
    use commitboard_types::{ChainPosition, CommitEvent};

    use super::*;

    /// Source that serves one fixed history, optionally after a delay.
    struct StubSource {
        history: CommitHistory,
        delays: StdMutex<Vec<Duration>>,
        fail: bool,
    }

    impl StubSource {
        fn new(history: CommitHistory) -> Self {
            Self {
                history,
                delays: StdMutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    impl HistorySource for StubSource {
        async fn fetch_history(&self) -> Result<CommitHistory, SourceError> {
            let delay = self.delays.lock().ok().and_then(|mut d| d.pop());
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(SourceError::new("rpc unreachable"));
            }
            Ok(self.history.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        views: StdMutex<Vec<LedgerView>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.views.lock().map(|v| v.len()).unwrap_or_default()
        }
    }

    impl RefreshSink for RecordingSink {
        async fn publish(&self, view: LedgerView) {
            if let Ok(mut views) = self.views.lock() {
                views.push(view);
            }
        }
    }

    fn history() -> CommitHistory {
        CommitHistory {
            commits: vec![CommitEvent {
                user: Address::repeat_byte(0xa1),
                message: String::from("hello"),
                timestamp: 1_773_500_000,
                position: ChainPosition::new(10, 0),
                tx_hash: B256::repeat_byte(1),
            }],
            clears: Vec::new(),
            latest_block: 12,
        }
    }

    fn poller(source: StubSource, sink: &Arc<RecordingSink>) -> Arc<Poller<StubSource, RecordingSink>> {
        Arc::new(Poller::new(
            Arc::new(source),
            Arc::clone(sink),
            CalendarClock::utc(),
            Duration::from_secs(15),
            5,
        ))
    }

    #[tokio::test]
    async fn refresh_publishes_replayed_view() {
        let sink = Arc::new(RecordingSink::default());
        let poller = poller(StubSource::new(history()), &sink);

        let outcome = poller.refresh_once().await.ok();
        assert_eq!(outcome, Some(RefreshOutcome::Published { sequence: 1 }));

        let views = sink.views.lock().map(|v| v.clone()).unwrap_or_default();
        assert_eq!(views.len(), 1);
        assert_eq!(views.first().map(|v| v.feed.len()), Some(1));
        assert_eq!(views.first().map(|v| v.latest_block), Some(12));
    }

    #[tokio::test]
    async fn failed_refresh_publishes_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let mut source = StubSource::new(history());
        source.fail = true;
        let poller = poller(source, &sink);

        assert!(matches!(
            poller.refresh_once().await,
            Err(PollError::Source { .. })
        ));
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_does_not_overwrite_newer_one() {
        let sink = Arc::new(RecordingSink::default());
        let source = StubSource::new(history());
        // Delays are popped from the back: first refresh waits 5s, second 1s.
        if let Ok(mut d) = source.delays.lock() {
            d.push(Duration::from_secs(1));
            d.push(Duration::from_secs(5));
        }
        let poller = poller(source, &sink);

        let slow = tokio::spawn({
            let p = Arc::clone(&poller);
            async move { p.refresh_once().await.ok() }
        });
        tokio::task::yield_now().await;
        let fast = tokio::spawn({
            let p = Arc::clone(&poller);
            async move { p.refresh_once().await.ok() }
        });

        let fast = fast.await.ok().flatten();
        let slow = slow.await.ok().flatten();

        assert_eq!(fast, Some(RefreshOutcome::Published { sequence: 2 }));
        assert_eq!(slow, Some(RefreshOutcome::Superseded { sequence: 1 }));
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_refreshes_on_tick_and_trigger_then_stops() {
        let sink = Arc::new(RecordingSink::default());
        let poller = poller(StubSource::new(history()), &sink);
        let trigger = poller.trigger();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(Arc::clone(&poller).run(rx));

        // First tick fires immediately.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.count(), 1);

        trigger.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.count(), 2);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(sink.count(), 3);

        let _ = tx.send(true);
        assert!(handle.await.is_ok());
    }
}
