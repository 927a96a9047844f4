//! Persistence sinks for job status changes and audit log lines.
//!
//! Provides an in-memory sink for tests and development and a tracing-backed
//! sink used when the host wires no storage.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{Job, JobId, SchedulerError};
use crate::util::clock::now_ms;

/// Severity of an audit log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditLogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    Info,
    /// Something unexpected that did not stop the audit.
    Warning,
    /// The audit failed or was cut short.
    Error,
}

impl fmt::Display for AuditLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One log line attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Job the line belongs to.
    pub job_id: JobId,
    /// Severity.
    pub level: AuditLogLevel,
    /// Message text.
    pub message: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Records job status changes and log lines.
///
/// Failures are reported to the scheduler, which logs them and carries on.
pub trait JobSink: Send + Sync {
    /// Persist the current state of a job.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Persistence` if the record could not be stored.
    fn save(&self, job: &Job) -> Result<(), SchedulerError>;

    /// Attach a log line to a job.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Persistence` if the line could not be stored.
    fn log(&self, job: &Job, level: AuditLogLevel, message: &str) -> Result<(), SchedulerError>;
}

/// Sink that only emits tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingJobSink;

impl JobSink for TracingJobSink {
    fn save(&self, job: &Job) -> Result<(), SchedulerError> {
        tracing::debug!(job_id = %job.id, status = %job.status, "job saved");
        Ok(())
    }

    fn log(&self, job: &Job, level: AuditLogLevel, message: &str) -> Result<(), SchedulerError> {
        match level {
            AuditLogLevel::Debug => tracing::debug!(job_id = %job.id, "{message}"),
            AuditLogLevel::Info => tracing::info!(job_id = %job.id, "{message}"),
            AuditLogLevel::Warning => tracing::warn!(job_id = %job.id, "{message}"),
            AuditLogLevel::Error => tracing::error!(job_id = %job.id, "{message}"),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SinkBuffers {
    saved: VecDeque<Job>,
    logs: VecDeque<AuditLogEntry>,
}

/// In-memory sink for testing and dev. Each buffer keeps at most
/// `max_records` entries, dropping the oldest first.
#[derive(Debug)]
pub struct InMemoryJobSink {
    buffers: Mutex<SinkBuffers>,
    max_records: usize,
}

impl InMemoryJobSink {
    /// Create a new in-memory sink with bounded buffers.
    #[must_use]
    pub fn new(max_records: usize) -> Self {
        Self {
            buffers: Mutex::new(SinkBuffers {
                saved: VecDeque::with_capacity(max_records.min(1024)),
                logs: VecDeque::with_capacity(max_records.min(1024)),
            }),
            max_records,
        }
    }

    /// Every saved job snapshot, oldest first.
    #[must_use]
    pub fn saved(&self) -> Vec<Job> {
        self.buffers.lock().saved.iter().cloned().collect()
    }

    /// Latest saved snapshot of one job.
    #[must_use]
    pub fn last_saved(&self, id: JobId) -> Option<Job> {
        self.buffers
            .lock()
            .saved
            .iter()
            .rev()
            .find(|job| job.id == id)
            .cloned()
    }

    /// Every log line, oldest first.
    #[must_use]
    pub fn logs(&self) -> Vec<AuditLogEntry> {
        self.buffers.lock().logs.iter().cloned().collect()
    }

    /// Log lines for one job.
    #[must_use]
    pub fn logs_for(&self, id: JobId) -> Vec<AuditLogEntry> {
        self.buffers
            .lock()
            .logs
            .iter()
            .filter(|entry| entry.job_id == id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryJobSink {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl JobSink for InMemoryJobSink {
    fn save(&self, job: &Job) -> Result<(), SchedulerError> {
        let mut buffers = self.buffers.lock();
        if buffers.saved.len() >= self.max_records {
            buffers.saved.pop_front();
        }
        buffers.saved.push_back(job.clone());
        Ok(())
    }

    fn log(&self, job: &Job, level: AuditLogLevel, message: &str) -> Result<(), SchedulerError> {
        let mut buffers = self.buffers.lock();
        if buffers.logs.len() >= self.max_records {
            buffers.logs.pop_front();
        }
        buffers.logs.push_back(AuditLogEntry {
            job_id: job.id,
            level,
            message: message.to_owned(),
            created_at_ms: now_ms(),
        });
        Ok(())
    }
}
