//! Polling loop
//!
//! ```text
//! tick
//!   ├─ paused?            → skip (baseline kept, nothing emitted)
//!   ├─ fetch projection   → error: count failure, maybe raise stale
//!   ├─ paused meanwhile?  → discard the fetched projection
//!   ├─ diff vs baseline   → empty: nothing emitted
//!   └─ sink.apply         → ok: baseline = fresh snapshot
//!                           err: baseline untouched, retried next tick
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::change::{ChangeSet, Snapshot, Tracked};
use crate::ClientResult;

/// Consecutive failed fetches before the view is flagged stale
pub const DEFAULT_STALE_AFTER: u32 = 3;

/// Where a poller reads its projection from
#[async_trait]
pub trait ProjectionSource: Send + Sync {
    type Projection: Tracked + Send + Sync;

    async fn fetch(&self) -> ClientResult<Self::Projection>;
}

/// Consumer of change-sets (the view)
pub trait ChangeSink<P>: Send {
    /// Render a change-set; an error keeps the previous baseline
    fn apply(&mut self, changes: &ChangeSet, projection: &P) -> anyhow::Result<()>;

    /// Stale indicator raised or cleared
    fn stale_changed(&mut self, _stale: bool) {}
}

/// Shared pause / stale flags of one poller
#[derive(Debug, Clone, Default)]
pub struct PollControl {
    paused: Arc<AtomicBool>,
    stale: Arc<AtomicBool>,
}

impl PollControl {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }
}

/// Result of one polling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Paused,
    /// Fetched while being paused; thrown away
    Discarded,
    Unchanged,
    Applied { changes: usize },
    FetchFailed,
    SinkFailed,
}

/// Interval-driven synchronizer for one view
pub struct Poller<S, K> {
    view: String,
    source: S,
    sink: K,
    interval: Duration,
    stale_after: u32,
    baseline: Option<Snapshot>,
    consecutive_failures: u32,
    control: PollControl,
}

impl<S, K> Poller<S, K>
where
    S: ProjectionSource,
    K: ChangeSink<S::Projection>,
{
    pub fn new(view: impl Into<String>, source: S, sink: K, interval: Duration) -> Self {
        Self {
            view: view.into(),
            source,
            sink,
            interval,
            stale_after: DEFAULT_STALE_AFTER,
            baseline: None,
            consecutive_failures: 0,
            control: PollControl::default(),
        }
    }

    pub fn with_stale_after(mut self, failures: u32) -> Self {
        self.stale_after = failures.max(1);
        self
    }

    pub fn control(&self) -> PollControl {
        self.control.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn baseline(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one cycle
    pub async fn tick(&mut self) -> PollOutcome {
        if self.control.is_paused() {
            return PollOutcome::Paused;
        }

        let fetched = self.source.fetch().await;

        // pause 期间完成的请求直接丢弃
        if self.control.is_paused() {
            tracing::debug!(view = %self.view, "Poll result discarded while paused");
            return PollOutcome::Discarded;
        }

        let projection = match fetched {
            Ok(p) => p,
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                tracing::warn!(
                    view = %self.view,
                    failures = self.consecutive_failures,
                    error = %e,
                    "Poll failed, keeping last snapshot"
                );
                if self.consecutive_failures >= self.stale_after && !self.control.is_stale() {
                    self.set_stale(true);
                }
                return PollOutcome::FetchFailed;
            }
        };

        self.consecutive_failures = 0;
        if self.control.is_stale() {
            self.set_stale(false);
        }

        let changes = match &self.baseline {
            Some(baseline) => baseline.diff(&projection),
            None => Snapshot::default().diff(&projection),
        };
        // 首次拉取即使为空也要渲染一次
        if changes.is_empty() && self.baseline.is_some() {
            return PollOutcome::Unchanged;
        }

        match self.sink.apply(&changes, &projection) {
            Ok(()) => {
                self.baseline = Some(Snapshot::of(&projection));
                PollOutcome::Applied {
                    changes: changes.len(),
                }
            }
            Err(e) => {
                tracing::warn!(view = %self.view, error = %e, "Failed to apply change-set");
                PollOutcome::SinkFailed
            }
        }
    }

    /// Poll every `interval` until cancelled
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(view = %self.view, interval_ms = self.interval.as_millis() as u64, "Poller started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(view = %self.view, "Poller stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    fn set_stale(&mut self, stale: bool) {
        self.control.stale.store(stale, Ordering::SeqCst);
        if stale {
            tracing::warn!(view = %self.view, "View data is stale");
        } else {
            tracing::info!(view = %self.view, "View data is fresh again");
        }
        self.sink.stale_changed(stale);
    }
}
