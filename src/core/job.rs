//! Audit job value objects and the shared handle the scheduler hands around.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::SchedulerError;
use crate::util::clock::now_ms;

/// Unique job identifier.
pub type JobId = Uuid;

/// Status of an audit job in the scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting in the queue for a free slot.
    Queued,
    /// Dispatched and executing.
    Running,
    /// Finished successfully.
    Success,
    /// Could not be started or failed while running.
    Error,
    /// Stopped by a cancellation or the shutdown drain.
    Interrupted,
}

impl JobStatus {
    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Interrupted)
    }

    /// Whether `self -> next` is a legal forward transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Queued => matches!(next, Self::Running | Self::Error | Self::Interrupted),
            Self::Running => matches!(next, Self::Success | Self::Error | Self::Interrupted),
            Self::Success | Self::Error | Self::Interrupted => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Interrupted => "INTERRUPTED",
        };
        f.write_str(s)
    }
}

/// Kind of audit requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A fixed list of pages.
    Page,
    /// A crawl starting from a seed URL.
    Site,
    /// A scripted user journey.
    Scenario,
    /// Uploaded documents.
    Upload,
}

/// Descriptor a factory turns into an execution unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Human-readable audit name.
    pub name: String,
    /// Audit kind.
    pub kind: AuditKind,
    /// URLs, scenario ids or upload names the audit covers.
    pub targets: Vec<String>,
    /// Audit parameter overrides.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl AuditRequest {
    /// Request with no parameter overrides.
    pub fn new(name: impl Into<String>, kind: AuditKind, targets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            targets,
            parameters: BTreeMap::new(),
        }
    }

    /// Add or replace a parameter override.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// One audit request and its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// What to audit.
    pub request: AuditRequest,
    /// Current status.
    pub status: JobStatus,
    /// Submission timestamp (ms since epoch).
    pub submitted_at_ms: u128,
    /// Set when the job enters `Running`.
    pub started_at_ms: Option<u128>,
    /// Set when the job reaches a terminal status.
    pub finished_at_ms: Option<u128>,
}

impl Job {
    /// New queued job with a fresh identifier.
    #[must_use]
    pub fn new(request: AuditRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            status: JobStatus::Queued,
            submitted_at_ms: now_ms(),
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    /// Apply a status transition, stamping start/finish times.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidTransition` if the move is not forward.
    pub fn transition(&mut self, next: JobStatus) -> Result<JobStatus, SchedulerError> {
        let prev = self.status;
        if !prev.can_transition_to(next) {
            return Err(SchedulerError::InvalidTransition {
                from: prev,
                to: next,
            });
        }
        let now = now_ms();
        if next == JobStatus::Running {
            self.started_at_ms = Some(now);
        }
        if next.is_terminal() {
            self.finished_at_ms = Some(now);
        }
        self.status = next;
        Ok(prev)
    }
}

/// Shared reference to a job.
///
/// The caller, the scheduler and the execution unit all observe the same job
/// through clones of one handle.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    inner: Arc<Mutex<Job>>,
}

impl JobHandle {
    /// Wrap a job.
    #[must_use]
    pub fn new(job: Job) -> Self {
        Self {
            id: job.id,
            inner: Arc::new(Mutex::new(job)),
        }
    }

    /// Job identifier (lock-free).
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.inner.lock().status
    }

    /// Copy of the job as it is now.
    #[must_use]
    pub fn snapshot(&self) -> Job {
        self.inner.lock().clone()
    }

    /// Copy of the audit request.
    #[must_use]
    pub fn request(&self) -> AuditRequest {
        self.inner.lock().request.clone()
    }

    /// Move the job to `next`; see [`Job::transition`]. Only the scheduler
    /// changes the status of a submitted job.
    pub(crate) fn transition(&self, next: JobStatus) -> Result<JobStatus, SchedulerError> {
        self.inner.lock().transition(next)
    }

    /// Run `f` on the job with its lock held. Transitions on other threads
    /// wait until `f` returns.
    pub(crate) fn with_locked<R>(&self, f: impl FnOnce(&Job) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Whether both handles point at the same job.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Job> for JobHandle {
    fn from(job: Job) -> Self {
        Self::new(job)
    }
}
