//! Background sweep over queries registered with a listener.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use descarga_config::constants::MAX_POLL_INTERVAL_MS;
use descarga_model::{QueryId, QueryStatus};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{DescargaError, Result};
use crate::listener::SharedListener;
use crate::query::QueryHandle;

struct TrackedEntry {
    handle: QueryHandle,
    listener: SharedListener,
    last_seen: QueryStatus,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Entries whose progress was requested.
    pub polled: usize,
    /// Listeners told about a transition.
    pub notified: usize,
    /// Entries that left the tracked set.
    pub dropped: usize,
}

/// Periodically re-checks every registered query and reports each status
/// transition to its listener once.
///
/// Entries leave the tracked set when they reach a finished or repeat-needed
/// status, when their progress cannot be fetched, or when their listener
/// panics.
pub struct StatusPoller {
    interval: Duration,
    entries: Mutex<Vec<TrackedEntry>>,
}

impl StatusPoller {
    /// Rejects a zero interval and one longer than a day, neither of which
    /// the background timer can run with.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() || interval > Duration::from_millis(MAX_POLL_INTERVAL_MS) {
            return Err(DescargaError::InvalidPollInterval(interval));
        }
        Ok(Self {
            interval,
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Period between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start tracking `handle`. `observed` is the status the caller has just
    /// seen; only a different status triggers the listener.
    pub async fn register(
        &self,
        handle: QueryHandle,
        listener: SharedListener,
        observed: QueryStatus,
    ) {
        let mut entries = self.entries.lock().await;
        debug!(query = %handle.id(), status = %observed, "tracking query");
        entries.push(TrackedEntry {
            handle,
            listener,
            last_seen: observed,
        });
    }

    /// Number of queries currently tracked.
    pub async fn tracked_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether a query with `id` is still tracked.
    pub async fn is_tracking(&self, id: QueryId) -> bool {
        self.entries
            .lock()
            .await
            .iter()
            .any(|entry| entry.handle.id() == id)
    }

    /// Poll every tracked query once, in registration order.
    pub async fn tick(&self) -> TickSummary {
        let mut entries = self.entries.lock().await;
        let mut summary = TickSummary::default();
        let mut retired = vec![false; entries.len()];

        for (index, entry) in entries.iter_mut().enumerate() {
            summary.polled += 1;

            let progress = match entry.handle.progress().await {
                Ok(progress) => progress,
                Err(err) => {
                    error!(
                        query = %entry.handle.id(),
                        error = %err,
                        "failed to poll query status, dropping it from tracking"
                    );
                    let listener = Arc::clone(&entry.listener);
                    let handle = &entry.handle;
                    if panic::catch_unwind(AssertUnwindSafe(|| {
                        listener.on_tracking_lost(handle, &err)
                    }))
                    .is_err()
                    {
                        warn!(query = %handle.id(), "listener panicked in tracking-lost hook");
                    }
                    retired[index] = true;
                    continue;
                }
            };

            let status = progress.status;
            if status == entry.last_seen {
                continue;
            }

            debug!(query = %entry.handle.id(), from = %entry.last_seen, to = %status, "status changed");
            entry.last_seen = status;
            summary.notified += 1;

            let listener = Arc::clone(&entry.listener);
            let handle = &entry.handle;
            if panic::catch_unwind(AssertUnwindSafe(|| listener.on_status_changed(status, handle)))
                .is_err()
            {
                warn!(query = %handle.id(), %status, "listener panicked, dropping query from tracking");
                retired[index] = true;
                continue;
            }

            if status.is_finished() || status.is_repeat() {
                retired[index] = true;
            }
        }

        let mut flags = retired.into_iter();
        entries.retain(|_| !flags.next().unwrap_or(false));
        summary.dropped = summary.polled - entries.len();

        summary
    }

    /// Run [`StatusPoller::tick`] on the configured interval until `shutdown`
    /// is cancelled. Remaining entries are discarded on exit.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
                "status poller started"
            );

            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let summary = self.tick().await;
                        if summary.polled > 0 {
                            debug!(
                                polled = summary.polled,
                                notified = summary.notified,
                                dropped = summary.dropped,
                                "status sweep complete"
                            );
                        }
                    }
                }
            }

            let mut entries = self.entries.lock().await;
            if !entries.is_empty() {
                info!(discarded = entries.len(), "discarding tracked queries on shutdown");
            }
            entries.clear();
            info!("status poller stopped");
        })
    }
}

impl std::fmt::Debug for StatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
