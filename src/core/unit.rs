//! Execution unit and factory traits.
//!
//! A factory turns a queued [`JobHandle`] into an [`ExecutionUnit`]; the
//! scheduler launches each unit on its own task and hands it a
//! [`UnitContext`] carrying the cancellation token and lifecycle hooks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{JobHandle, LifecycleListener, Milestone, UnitError, UnitInfo};

/// Registry key of a dispatched unit. Increases with dispatch order.
pub type UnitId = u64;

/// A cancellable audit execution bound to exactly one job.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use audit_runner::core::{ExecutionUnit, JobHandle, UnitContext, UnitError, Milestone};
///
/// struct PageAudit {
///     job: JobHandle,
/// }
///
/// #[async_trait]
/// impl ExecutionUnit for PageAudit {
///     fn job(&self) -> &JobHandle {
///         &self.job
///     }
///
///     async fn run(&self, ctx: &UnitContext) -> Result<(), UnitError> {
///         ctx.started();
///         for url in self.job.request().targets {
///             if ctx.is_interrupted() {
///                 return Err(UnitError::Interrupted);
///             }
///             // audit the page...
///             ctx.progress(Milestone::PageAudited { url });
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ExecutionUnit: Send + Sync + 'static {
    /// The job this unit executes.
    fn job(&self) -> &JobHandle;

    /// Run the audit to completion.
    ///
    /// Implementations should poll `ctx` for interruption at their natural
    /// checkpoints; the scheduler never stops a unit forcibly.
    async fn run(&self, ctx: &UnitContext) -> Result<(), UnitError>;
}

/// Builds execution units from queued jobs.
///
/// Called inside the dispatch critical section, so it must not block.
pub trait UnitFactory: Send + Sync {
    /// Build a unit for `job`, or `None` if the job cannot be executed.
    fn create(&self, job: &JobHandle) -> Option<Box<dyn ExecutionUnit>>;
}

impl<F> UnitFactory for F
where
    F: Fn(&JobHandle) -> Option<Box<dyn ExecutionUnit>> + Send + Sync,
{
    fn create(&self, job: &JobHandle) -> Option<Box<dyn ExecutionUnit>> {
        self(job)
    }
}

/// Everything a running unit gets from the scheduler.
#[derive(Clone)]
pub struct UnitContext {
    info: UnitInfo,
    job: JobHandle,
    cancellation: CancellationToken,
    listener: Arc<dyn LifecycleListener>,
}

impl UnitContext {
    pub(crate) fn new(
        info: UnitInfo,
        job: JobHandle,
        cancellation: CancellationToken,
        listener: Arc<dyn LifecycleListener>,
    ) -> Self {
        Self {
            info,
            job,
            cancellation,
            listener,
        }
    }

    /// Unit and job identifiers.
    #[must_use]
    pub const fn info(&self) -> UnitInfo {
        self.info
    }

    /// The job being executed.
    #[must_use]
    pub const fn job(&self) -> &JobHandle {
        &self.job
    }

    /// Report that the audit started.
    pub fn started(&self) {
        self.listener.on_start(&self.info);
    }

    /// Report a progress milestone.
    pub fn progress(&self, milestone: Milestone) {
        self.listener.on_progress(&self.info, &milestone);
    }

    /// Whether an interrupt was requested.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once an interrupt is requested.
    pub async fn interrupted(&self) {
        self.cancellation.cancelled().await;
    }

    /// Child token for sub-tasks the unit spawns itself.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation.child_token()
    }
}
