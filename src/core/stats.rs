//! Scheduler counters and snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::{Job, JobStatus, UnitId};

/// Statistics about scheduler throughput and current load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Configured concurrency cap.
    pub max_concurrent: usize,
    /// Jobs waiting in the queue.
    pub queued: usize,
    /// Units currently in the registry.
    pub running: usize,
    /// Total jobs accepted by `submit`.
    pub submitted: u64,
    /// Total units launched.
    pub dispatched: u64,
    /// Jobs the factory could not turn into a unit.
    pub rejected: u64,
    /// Jobs popped from the queue that were no longer `Queued`.
    pub skipped: u64,
    /// Jobs that ended in `Success`.
    pub succeeded: u64,
    /// Jobs that ended in `Error`, rejections included.
    pub failed: u64,
    /// Jobs that ended in `Interrupted`.
    pub interrupted: u64,
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub submitted: AtomicU64,
    pub dispatched: AtomicU64,
    pub rejected: AtomicU64,
    pub skipped: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub interrupted: AtomicU64,
}

impl SchedulerCounters {
    /// Count a job reaching a terminal status.
    pub fn record_terminal(&self, status: JobStatus) {
        let counter = match status {
            JobStatus::Success => &self.succeeded,
            JobStatus::Error => &self.failed,
            JobStatus::Interrupted => &self.interrupted,
            JobStatus::Queued | JobStatus::Running => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, max_concurrent: usize, queued: usize, running: usize) -> SchedulerStats {
        SchedulerStats {
            max_concurrent,
            queued,
            running,
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
        }
    }
}

/// A registry entry as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningUnit {
    /// Registry key.
    pub unit_id: UnitId,
    /// Job state at snapshot time.
    pub job: Job,
    /// Dispatch timestamp (ms since epoch).
    pub dispatched_at_ms: u128,
    /// Whether an interrupt has been signalled to the unit.
    pub interrupt_requested: bool,
}

/// Consistent view of queue and registry taken under both locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Queued jobs, oldest first.
    pub queued: Vec<Job>,
    /// Registry entries in dispatch order.
    pub running: Vec<RunningUnit>,
    /// Configured concurrency cap.
    pub max_concurrent: usize,
    /// Whether the drain has run.
    pub drained: bool,
}
