//! Age-based purge of archived patients.
//!
//! A patient is purged when `now - deleted_at > retention`. A patient archived
//! exactly `retention` ago is kept until the next pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::session::SessionStore;

use super::{LifecycleResult, PatientLifecycle};

/// Days an archived patient is kept before automatic purge.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Default time between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60 * 60);

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: StdDuration = StdDuration::from_millis(500);

/// The default archive retention window.
pub fn default_retention() -> Duration {
    Duration::days(DEFAULT_RETENTION_DAYS)
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SweepReport {
    /// Evaluation time
    pub swept_at: DateTime<Utc>,
    /// Patients archived before this instant were eligible
    pub cutoff: DateTime<Utc>,
    /// IDs that were permanently removed
    pub purged: Vec<String>,
    /// Candidates that were restored or removed before their turn
    pub skipped: usize,
    /// Candidates whose purge failed
    pub failed: Vec<SweepFailure>,
}

/// A single record that could not be purged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepFailure {
    pub patient_id: String,
    pub error: String,
}

impl PatientLifecycle<'_> {
    /// Purge every archived patient older than `retention` at `now`.
    ///
    /// Each candidate is re-checked at deletion time, and a failure on one record
    /// is recorded in the report without stopping the pass. A retention reaching
    /// past the earliest representable time makes nothing eligible.
    pub fn sweep_expired(&self, now: DateTime<Utc>, retention: Duration) -> LifecycleResult<SweepReport> {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return Ok(SweepReport {
                swept_at: now,
                cutoff: DateTime::<Utc>::MIN_UTC,
                ..Default::default()
            });
        };
        let candidates = self.db.archived_patient_ids_before(cutoff)?;

        let mut report = SweepReport {
            swept_at: now,
            cutoff,
            ..Default::default()
        };

        for id in candidates {
            match self.db.delete_patient_if_archived_before(&id, cutoff) {
                Ok(true) => report.purged.push(id),
                Ok(false) => {
                    tracing::debug!(patient_id = %id, "Sweep candidate no longer eligible");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(patient_id = %id, error = %e, "Failed to purge expired patient");
                    report.failed.push(SweepFailure {
                        patient_id: id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !report.purged.is_empty() || !report.failed.is_empty() {
            tracing::info!(
                purged = report.purged.len(),
                skipped = report.skipped,
                failed = report.failed.len(),
                "Archive sweep completed"
            );
        }

        Ok(report)
    }
}

/// Handle for the background sweeper thread.
///
/// Stops the thread on `shutdown()` or when dropped.
pub struct SweeperHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl SweeperHandle {
    /// Request shutdown. A sweep already in progress completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Block until the sweeper thread exits.
    pub fn join(mut self) {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the periodic archive sweep on a separate thread.
///
/// The first pass runs immediately, then every `interval`. Each pass also drops
/// expired bearer sessions.
pub fn start_sweeper(
    db: Arc<Mutex<Database>>,
    retention: Duration,
    interval: StdDuration,
) -> SweeperHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            interval_secs = interval.as_secs(),
            retention_days = retention.num_days(),
            "Archive sweeper started"
        );
        sweeper_loop(&db, retention, interval, &flag);
        tracing::info!("Archive sweeper shutting down");
    });

    SweeperHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn sweeper_loop(db: &Mutex<Database>, retention: Duration, interval: StdDuration, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        run_tick(db, retention);

        // Sleep in small increments for responsive shutdown
        let deadline = Instant::now() + interval;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SLEEP_GRANULARITY.min(deadline - now));
        }
    }
}

fn run_tick(db: &Mutex<Database>, retention: Duration) {
    let db = match db.lock() {
        Ok(guard) => guard,
        Err(e) => {
            tracing::error!(error = %e, "Database lock poisoned, skipping sweep");
            return;
        }
    };

    let now = Utc::now();
    if let Err(e) = PatientLifecycle::new(&db).sweep_expired(now, retention) {
        tracing::warn!(error = %e, "Archive sweep failed");
    }

    match SessionStore::new(&db).purge_expired(now) {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Expired sessions removed"),
        Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
    }
}
