//! The metrics poller.
//!
//! Each tick fetches one report and writes the formatted values into the
//! board. Ticks fire on a fixed schedule and run in their own tasks, so a
//! slow response never holds back the next tick. Every tick takes a
//! sequence number when it starts; a tick whose result arrives after a
//! newer tick has rendered is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PollerConfig;
use crate::display::{DisplayBoard, DisplayTarget};
use crate::events::{PollEvent, PollEventBroadcaster};
use crate::format;
use crate::source::StatusSource;
use crate::status::ModelStatus;
use crate::Result;

/// What a single tick ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Values were written to `written` slots.
    Rendered { seq: u64, written: usize },
    /// The report had no `model_status`; nothing was written.
    NoStatus { seq: u64 },
    /// Fetching or parsing failed; nothing was written.
    Failed { seq: u64 },
    /// A newer tick rendered first; nothing was written.
    Stale { seq: u64, latest_rendered: u64 },
}

/// Counters describing the poller's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    pub ticks_started: u64,
    pub rendered: u64,
    pub no_status: u64,
    pub failed: u64,
    pub stale: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    ticks_started: AtomicU64,
    rendered: AtomicU64,
    no_status: AtomicU64,
    failed: AtomicU64,
    stale: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> PollerStats {
        PollerStats {
            ticks_started: self.ticks_started.load(Ordering::Relaxed),
            rendered: self.rendered.load(Ordering::Relaxed),
            no_status: self.no_status.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }
}

/// Fetches model status and renders it into a display board.
pub struct MetricsPoller {
    source: Arc<dyn StatusSource>,
    board: Arc<dyn DisplayBoard>,
    config: PollerConfig,
    events: PollEventBroadcaster,
    /// Last sequence number handed out.
    next_seq: AtomicU64,
    /// Sequence number of the newest rendered tick (0 before the first).
    /// Held for the whole write so renders never interleave.
    latest_rendered: Mutex<u64>,
    stats: StatsCounters,
}

impl MetricsPoller {
    /// Create a poller. Fails with [`Error::Configuration`](crate::Error::Configuration)
    /// when `config` does not validate.
    pub fn new(
        source: Arc<dyn StatusSource>,
        board: Arc<dyn DisplayBoard>,
        config: PollerConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            source,
            board,
            config,
            events: PollEventBroadcaster::new(),
            next_seq: AtomicU64::new(0),
            latest_rendered: Mutex::new(0),
            stats: StatsCounters::default(),
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn events(&self) -> &PollEventBroadcaster {
        &self.events
    }

    pub fn stats(&self) -> PollerStats {
        self.stats.snapshot()
    }

    /// Run one fetch and render cycle.
    ///
    /// Failures are logged and reported through the outcome and events,
    /// never returned as errors.
    pub async fn update_live_metrics(&self) -> TickOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.ticks_started.fetch_add(1, Ordering::Relaxed);
        debug!(seq, source = %self.source.describe(), "Updating live metrics");
        self.events.publish(PollEvent::TickStarted {
            seq,
            timestamp: Utc::now(),
        });

        let report = match self.source.fetch().await {
            Ok(report) => report,
            Err(e) => {
                error!(seq, error = %e, "Error fetching live metrics");
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                self.events.publish(PollEvent::Failed {
                    seq,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                return TickOutcome::Failed { seq };
            }
        };
        debug!(seq, ?report, "Live metrics data");

        let Some(status) = report.model_status else {
            warn!(seq, "Performance report has no model_status, skipping update");
            self.stats.no_status.fetch_add(1, Ordering::Relaxed);
            self.events.publish(PollEvent::NoStatus {
                seq,
                timestamp: Utc::now(),
            });
            return TickOutcome::NoStatus { seq };
        };

        let missing = status.missing_fields();
        if !missing.is_empty() {
            warn!(seq, ?missing, "Model status is missing fields, skipping them");
        }
        if let Some(version) = status.model_version.as_deref() {
            debug!(
                seq,
                version,
                health = status.health_status.as_deref().unwrap_or("unknown"),
                "Model metadata"
            );
        }

        let written = {
            let mut latest = self.latest_rendered.lock();
            if *latest > seq {
                let latest_rendered = *latest;
                drop(latest);
                debug!(seq, latest_rendered, "Discarding out-of-order result");
                self.stats.stale.fetch_add(1, Ordering::Relaxed);
                self.events.publish(PollEvent::Stale {
                    seq,
                    latest_rendered,
                    timestamp: Utc::now(),
                });
                return TickOutcome::Stale {
                    seq,
                    latest_rendered,
                };
            }
            *latest = seq;
            self.render(&status)
        };

        info!(seq, fields = written.len(), "Metric cards updated with live data");
        self.stats.rendered.fetch_add(1, Ordering::Relaxed);
        let count = written.len();
        self.events.publish(PollEvent::Rendered {
            seq,
            written,
            timestamp: Utc::now(),
        });
        TickOutcome::Rendered {
            seq,
            written: count,
        }
    }

    /// Refresh immediately. Same effect as one scheduled tick.
    pub async fn refresh_metrics(&self) -> TickOutcome {
        self.update_live_metrics().await
    }

    fn render(&self, status: &ModelStatus) -> Vec<(DisplayTarget, String)> {
        let mut written = Vec::with_capacity(DisplayTarget::ALL.len());
        for (target, text) in format::render(status) {
            if !self.board.has_target(target) {
                debug!(slot = %target, "Display target not present, skipping");
                continue;
            }
            self.board.set_text(target, &text);
            written.push((target, text));
        }
        written
    }

    /// Start polling: one tick right away, then one every `interval`.
    pub fn start(self: Arc<Self>) -> PollerHandle {
        self.start_with_cancellation(CancellationToken::new())
    }

    /// Start polling under a shared cancellation token.
    ///
    /// Cancelling `token` stops the poller just like [`PollerHandle::stop`].
    pub fn start_with_cancellation(self: Arc<Self>, token: CancellationToken) -> PollerHandle {
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            self.run_loop(loop_token).await;
        });

        PollerHandle {
            token,
            task: Some(task),
        }
    }

    async fn run_loop(self: Arc<Self>, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight = JoinSet::new();

        info!(
            source = %self.source.describe(),
            interval_ms = self.config.interval.as_millis() as u64,
            "Live metrics polling started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let poller = Arc::clone(&self);
                    in_flight.spawn(async move {
                        poller.update_live_metrics().await;
                    });
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = result
                        && e.is_panic()
                    {
                        error!(error = %e, "Live metrics tick panicked");
                    }
                }
            }
        }

        in_flight.shutdown().await;
        info!("Live metrics polling stopped");
    }
}

/// Owned handle to a running poller.
///
/// Dropping the handle cancels the schedule without waiting for it.
#[derive(Debug)]
pub struct PollerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Whether the schedule is still active.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the schedule, abort in-flight ticks and wait for the loop to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Live metrics poller task ended abnormally");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
