//! Core scheduling abstractions: jobs, execution units, the scheduler and
//! its dispatch loop.

pub mod dispatcher;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod persistence;
pub mod scheduler;
pub mod stats;
pub mod unit;

pub use dispatcher::Dispatcher;
pub use error::{AppResult, SchedulerError, UnitError};
pub use job::{AuditKind, AuditRequest, Job, JobHandle, JobId, JobStatus};
pub use lifecycle::{LifecycleListener, Milestone, UnitInfo};
pub use persistence::{AuditLogEntry, AuditLogLevel, InMemoryJobSink, JobSink, TracingJobSink};
pub use scheduler::{
    AuditScheduler, DrainReport, Spawn, TickReport, UnitFuture, ABORTED, CANCELLED_BY_REQUEST,
    INTERRUPTED_BY_SERVER, UNABLE_TO_START,
};
pub use stats::{RunningUnit, SchedulerSnapshot, SchedulerStats};
pub use unit::{ExecutionUnit, UnitContext, UnitFactory, UnitId};
