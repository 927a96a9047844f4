//! Error types for scheduler operations.

use thiserror::Error;

use super::{JobId, JobStatus};

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler has been drained and accepts no more work.
    #[error("scheduler is shutting down")]
    ShuttingDown,
    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A job status change that would move backwards or out of a terminal state.
    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the job currently has.
        from: JobStatus,
        /// Status that was requested.
        to: JobStatus,
    },
    /// The job is already waiting in the queue.
    #[error("job {0} is already queued")]
    DuplicateJob(JobId),
    /// A persistence collaborator failed to record a job or log entry.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// Runtime or backend failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors an execution unit reports when its audit does not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The unit observed its cancellation token and stopped early.
    #[error("audit interrupted")]
    Interrupted,
    /// The audit ran and failed.
    #[error("audit failed: {0}")]
    Failed(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
