// ============================
// crates/backend-lib/src/presence/sweeper.rs
// ============================
//! Background eviction of heartbeat sessions that stopped pinging.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::PresenceSettings;
use crate::metrics::{HEARTBEAT_EVICTED, SWEEP_FAILURES};
use crate::presence::PresenceStore;

/// Outcome of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub failures: usize,
}

/// Periodically evicts stale heartbeat sessions
#[derive(Clone)]
pub struct HeartbeatSweeper {
    store: Arc<PresenceStore>,
    timeout: Duration,
    interval: Duration,
}

impl HeartbeatSweeper {
    pub fn new(store: Arc<PresenceStore>, settings: &PresenceSettings) -> Self {
        Self {
            store,
            timeout: settings.heartbeat_timeout(),
            interval: settings.sweep_interval(),
        }
    }

    /// Sweep once, treating `now` as the current time.
    ///
    /// A failure on one session is logged and counted; the rest of the sweep
    /// carries on.
    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();

        for (viewer_id, stream_id) in self.store.stale_heartbeats(now, self.timeout) {
            match self
                .store
                .expire_heartbeat(&viewer_id, &stream_id, now, self.timeout)
            {
                Ok(Some(count)) => {
                    report.evicted += 1;
                    tracing::debug!(viewer_id = %viewer_id, stream_id = %stream_id, count, "heartbeat expired");
                },
                Ok(None) => {},
                Err(err) => {
                    report.evicted += 1;
                    report.failures += 1;
                    tracing::warn!(
                        viewer_id = %viewer_id,
                        stream_id = %stream_id,
                        error = %err,
                        "heartbeat expired but viewer count was not updated"
                    );
                },
            }
        }

        if report.evicted > 0 {
            counter!(HEARTBEAT_EVICTED).increment(report.evicted as u64);
            tracing::info!(evicted = report.evicted, failures = report.failures, "heartbeat sweep");
        }
        if report.failures > 0 {
            counter!(SWEEP_FAILURES).increment(report.failures as u64);
        }
        report
    }

    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    /// Run the sweep loop on the current runtime until the handle is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; nothing can be stale yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}
