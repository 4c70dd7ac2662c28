//! Shared engine state.
//!
//! One owned struct holds every piece of state shared across background
//! tasks: the error counter, the warming-phase flags, and the startup
//! completion record. Components receive it as an `Arc` at construction;
//! there is no ambient global state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use metrics::counter;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::error::WarmError;
use crate::telemetry::METRIC_TASK_ERROR_TOTAL;

const SOURCE: &str = "tepore::state";

/// Record of a settled startup warm.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StartupRecord {
    pub completed_at: OffsetDateTime,
    pub elapsed_ms: u64,
}

/// State shared by every workflow of the engine.
pub struct EngineState {
    errors: AtomicU64,
    startup_complete: AtomicBool,
    startup_running: AtomicBool,
    startup_record: Mutex<Option<StartupRecord>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            errors: AtomicU64::new(0),
            startup_complete: AtomicBool::new(false),
            startup_running: AtomicBool::new(false),
            startup_record: Mutex::new(None),
        }
    }

    /// Count one swallowed background failure and log it with task identity.
    ///
    /// This is the single isolation point for both whole-task failures
    /// (via the task runner) and skipped items inside batch loops.
    pub fn record_error(&self, task: &'static str, key: &str, err: &WarmError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        counter!(METRIC_TASK_ERROR_TOTAL, "task" => task).increment(1);
        warn!(
            target: "tepore::engine",
            task,
            key,
            error = %err,
            "warming step failed, skipping"
        );
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn startup_complete(&self) -> bool {
        self.startup_complete.load(Ordering::SeqCst)
    }

    /// Try to enter the Warming phase. Returns false if a startup warm is
    /// already running, in which case the caller must not start another.
    pub(crate) fn begin_startup(&self) -> bool {
        self.startup_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Settle the Warming phase: record completion and flip the ready flag.
    pub(crate) fn finish_startup(&self, record: StartupRecord) {
        *mutex_lock(&self.startup_record, SOURCE, "finish_startup") = Some(record);
        self.startup_complete.store(true, Ordering::SeqCst);
        self.startup_running.store(false, Ordering::SeqCst);
    }

    /// Re-enter the Warming phase ahead of a clear-and-rewarm.
    pub(crate) fn reset_startup(&self) {
        self.startup_complete.store(false, Ordering::SeqCst);
    }

    pub(crate) fn startup_record(&self) -> Option<StartupRecord> {
        *mutex_lock(&self.startup_record, SOURCE, "startup_record")
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of the engine, safe to serve from any thread.
#[derive(Debug, Clone, Serialize)]
pub struct WarmingStatus {
    pub enabled: bool,
    pub startup_complete: bool,
    pub in_flight: usize,
    pub errors: u64,
    pub startup_completed_at: Option<OffsetDateTime>,
    pub startup_elapsed_ms: Option<u64>,
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                hint = "state may be stale after panic in another thread",
                "Recovered from poisoned engine lock"
            );
            poisoned.into_inner()
        }
    }
}
