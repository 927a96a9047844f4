//! Bounded-concurrency audit scheduler.
//!
//! Jobs wait in a FIFO queue until a dispatch tick moves them into the
//! registry of running units, never letting the registry grow past
//! `max_concurrent`. Units free their slot through the lifecycle `on_end`
//! hook. A one-shot drain fails every queued job and interrupts every
//! running one at shutdown.
//!
//! # Locking
//!
//! Queue and registry sit behind separate `parking_lot::Mutex`es. Any code
//! path that needs both takes the queue lock first; nothing acquires the
//! queue lock while holding the registry lock. Collaborator calls that may
//! be slow (sink writes, task spawning) happen after both locks are
//! released. The factory is the one collaborator called under the locks.
//! A job's own lock nests inside both; sink writes hold it alone, so a sink
//! must not call back into the scheduler.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::core::stats::SchedulerCounters;
use crate::core::{
    AuditLogLevel, ExecutionUnit, JobHandle, JobId, JobSink, JobStatus, LifecycleListener,
    Milestone, RunningUnit, SchedulerError, SchedulerSnapshot, SchedulerStats, UnitContext,
    UnitError, UnitFactory, UnitId, UnitInfo,
};
use crate::util::clock::now_ms;

/// Message logged against jobs cut short by the drain.
pub const INTERRUPTED_BY_SERVER: &str = "Audit interrupted by server";
/// Message logged against jobs the factory could not build.
pub const UNABLE_TO_START: &str = "Unable to start audit";
/// Message logged against jobs whose unit stopped without an outcome.
pub const ABORTED: &str = "Audit aborted";
/// Message logged against jobs cancelled individually.
pub const CANCELLED_BY_REQUEST: &str = "Audit cancelled";

/// Future driving one execution unit.
pub type UnitFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Abstraction for launching a unit on an independent execution context.
pub trait Spawn: Send + Sync {
    /// Run `fut` to completion without blocking the caller.
    fn spawn(&self, fut: UnitFuture);
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Jobs moved into the registry, in dispatch order.
    pub dispatched: Vec<JobId>,
    /// Jobs the factory rejected; now `Error`.
    pub rejected: Vec<JobId>,
    /// Jobs popped from the queue that were no longer `Queued`, e.g. a
    /// handle another scheduler already started. Left untouched.
    pub skipped: Vec<JobId>,
}

/// Outcome of the shutdown drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// Queued jobs that will never run; now `Error`.
    pub failed_queued: Vec<JobId>,
    /// Running jobs that were signalled; now `Interrupted`.
    pub interrupted: Vec<JobId>,
}

impl DrainReport {
    /// Whether the drain touched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failed_queued.is_empty() && self.interrupted.is_empty()
    }
}

/// Registry entry: the running unit's job and its interrupt handle.
struct RegistryEntry {
    job: JobHandle,
    cancellation: CancellationToken,
    dispatched_at_ms: u128,
}

/// A unit built under the locks, launched after they are released.
struct Launch {
    unit_id: UnitId,
    unit: Box<dyn ExecutionUnit>,
    job: JobHandle,
    cancellation: CancellationToken,
}

struct SchedulerInner {
    config: SchedulerConfig,
    queue: Mutex<VecDeque<JobHandle>>,
    registry: Mutex<BTreeMap<UnitId, RegistryEntry>>,
    factory: Arc<dyn UnitFactory>,
    sink: Arc<dyn JobSink>,
    spawner: Arc<dyn Spawn>,
    observers: Vec<Arc<dyn LifecycleListener>>,
    counters: SchedulerCounters,
    next_unit_id: AtomicU64,
    /// Set once, under the queue and registry locks, by `drain`.
    drained: AtomicBool,
    wakeup: Notify,
}

/// Audit job scheduler. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AuditScheduler {
    inner: Arc<SchedulerInner>,
}

impl AuditScheduler {
    /// Create a scheduler from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if `config` fails validation.
    pub fn new(
        config: SchedulerConfig,
        factory: Arc<dyn UnitFactory>,
        sink: Arc<dyn JobSink>,
        spawner: Arc<dyn Spawn>,
    ) -> Result<Self, SchedulerError> {
        Self::with_observers(config, factory, sink, spawner, Vec::new())
    }

    /// Create a scheduler that forwards lifecycle events to `observers`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if `config` fails validation.
    pub fn with_observers(
        config: SchedulerConfig,
        factory: Arc<dyn UnitFactory>,
        sink: Arc<dyn JobSink>,
        spawner: Arc<dyn Spawn>,
        observers: Vec<Arc<dyn LifecycleListener>>,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        tracing::info!(
            max_concurrent = config.max_concurrent,
            tick_interval_ms = config.tick_interval_ms,
            dispatch_on_events = config.dispatch_on_events,
            "audit scheduler initialized"
        );
        Ok(Self {
            inner: Arc::new(SchedulerInner {
                config,
                queue: Mutex::new(VecDeque::new()),
                registry: Mutex::new(BTreeMap::new()),
                factory,
                sink,
                spawner,
                observers,
                counters: SchedulerCounters::default(),
                next_unit_id: AtomicU64::new(1),
                drained: AtomicBool::new(false),
                wakeup: Notify::new(),
            }),
        })
    }

    /// Scheduler configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Append a job to the tail of the queue.
    ///
    /// Never waits for capacity; the job runs on some later tick.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::ShuttingDown` once the drain has run
    /// - `SchedulerError::InvalidTransition` if the job is not `Queued`
    /// - `SchedulerError::DuplicateJob` if the job is already queued
    pub fn submit(&self, job: impl Into<JobHandle>) -> Result<JobHandle, SchedulerError> {
        let job = job.into();
        let status = job.status();
        if status != JobStatus::Queued {
            return Err(SchedulerError::InvalidTransition {
                from: status,
                to: JobStatus::Queued,
            });
        }

        let depth = {
            let mut queue = self.inner.queue.lock();
            if self.inner.drained.load(Ordering::Acquire) {
                tracing::warn!(job_id = %job.id(), "audit rejected: scheduler is shutting down");
                return Err(SchedulerError::ShuttingDown);
            }
            if queue.iter().any(|queued| queued.id() == job.id()) {
                return Err(SchedulerError::DuplicateJob(job.id()));
            }
            queue.push_back(job.clone());
            queue.len()
        };

        self.inner.counters.submitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(job_id = %job.id(), queue_depth = depth, "audit queued");
        self.notify_dispatcher();
        Ok(job)
    }

    /// Run one dispatch pass.
    ///
    /// Pops jobs oldest-first while the registry has room. A job the factory
    /// rejects becomes `Error` without using a slot, and the pass moves on to
    /// the next job. Stops when the queue is empty or the registry is full.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let mut launches = Vec::new();
        let mut rejected = Vec::new();

        {
            let mut queue = self.inner.queue.lock();
            let mut registry = self.inner.registry.lock();
            if self.inner.drained.load(Ordering::Acquire) {
                return report;
            }

            while registry.len() < self.inner.config.max_concurrent {
                let Some(job) = queue.pop_front() else {
                    break;
                };

                let status = job.status();
                if status != JobStatus::Queued {
                    self.inner.counters.skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(job_id = %job.id(), %status, "skipping audit that is no longer queued");
                    report.skipped.push(job.id());
                    continue;
                }

                let Some(unit) = self.inner.factory.create(&job) else {
                    if job.transition(JobStatus::Error).is_ok() {
                        self.inner.counters.record_terminal(JobStatus::Error);
                    }
                    self.inner.counters.rejected.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(job_id = %job.id(), "unable to start audit");
                    report.rejected.push(job.id());
                    rejected.push(job);
                    continue;
                };

                if let Err(e) = job.transition(JobStatus::Running) {
                    self.inner.counters.skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(job_id = %job.id(), error = %e, "skipping audit that is no longer queued");
                    report.skipped.push(job.id());
                    continue;
                }

                let unit_id = self.inner.next_unit_id.fetch_add(1, Ordering::Relaxed);
                let cancellation = CancellationToken::new();
                registry.insert(
                    unit_id,
                    RegistryEntry {
                        job: job.clone(),
                        cancellation: cancellation.clone(),
                        dispatched_at_ms: now_ms(),
                    },
                );
                report.dispatched.push(job.id());
                launches.push(Launch {
                    unit_id,
                    unit,
                    job,
                    cancellation,
                });
            }

            if !report.dispatched.is_empty() || !report.rejected.is_empty() || !report.skipped.is_empty() {
                tracing::debug!(
                    dispatched = report.dispatched.len(),
                    rejected = report.rejected.len(),
                    skipped = report.skipped.len(),
                    queued = queue.len(),
                    running = registry.len(),
                    "dispatch tick"
                );
            }
        }

        for job in &rejected {
            self.persist(job, Some((AuditLogLevel::Error, UNABLE_TO_START)));
        }
        for launch in launches {
            self.persist(&launch.job, None);
            self.launch(launch);
        }
        report
    }

    /// Free the registry slot of `unit`. Returns `false` if the unit was not
    /// registered, in which case nothing changes.
    pub fn release(&self, unit: UnitId) -> bool {
        let removed = self.inner.registry.lock().remove(&unit).is_some();
        if removed {
            tracing::debug!(unit_id = unit, "registry slot released");
            self.notify_dispatcher();
        }
        removed
    }

    /// Cooperatively cancel one job.
    ///
    /// A queued job leaves the queue as `Interrupted`. A running job is
    /// marked `Interrupted` and its unit is signalled; its slot stays taken
    /// until the unit ends. Returns `false` for unknown or already
    /// signalled jobs.
    pub fn cancel(&self, job_id: JobId) -> bool {
        let cancelled = {
            let mut queue = self.inner.queue.lock();
            let registry = self.inner.registry.lock();

            if let Some(pos) = queue.iter().position(|job| job.id() == job_id) {
                queue.remove(pos)
            } else if let Some(entry) = registry
                .values()
                .find(|entry| entry.job.id() == job_id && !entry.cancellation.is_cancelled())
            {
                entry.cancellation.cancel();
                Some(entry.job.clone())
            } else {
                None
            }
        };

        let Some(job) = cancelled else {
            return false;
        };
        if job.transition(JobStatus::Interrupted).is_ok() {
            self.inner.counters.record_terminal(JobStatus::Interrupted);
        }
        tracing::info!(job_id = %job_id, "audit cancelled");
        self.persist(&job, Some((AuditLogLevel::Warning, CANCELLED_BY_REQUEST)));
        true
    }

    /// Graceful shutdown: fail every queued job and interrupt every running
    /// unit. Runs once; later calls return an empty report.
    ///
    /// Interruption is advisory. Units keep their registry slot until they
    /// observe the signal and end.
    pub fn drain(&self) -> DrainReport {
        let mut failed_queued = Vec::new();
        let mut interrupted = Vec::new();

        {
            let mut queue = self.inner.queue.lock();
            let registry = self.inner.registry.lock();
            if self.inner.drained.swap(true, Ordering::AcqRel) {
                return DrainReport::default();
            }

            for job in queue.drain(..) {
                if job.transition(JobStatus::Error).is_ok() {
                    self.inner.counters.record_terminal(JobStatus::Error);
                }
                failed_queued.push(job);
            }

            for (unit_id, entry) in registry.iter() {
                tracing::warn!(job_id = %entry.job.id(), unit_id = *unit_id, "interrupting audit");
                match entry.job.transition(JobStatus::Interrupted) {
                    Ok(_) => self.inner.counters.record_terminal(JobStatus::Interrupted),
                    Err(e) => tracing::debug!(job_id = %entry.job.id(), error = %e, "audit already finished"),
                }
                entry.cancellation.cancel();
                interrupted.push(entry.job.clone());
            }
        }

        self.inner.wakeup.notify_waiters();
        tracing::info!(
            failed_queued = failed_queued.len(),
            interrupted = interrupted.len(),
            "audit scheduler drained"
        );

        // The audit log line is Error level for both sets; the per-unit
        // warning above is the tracing event.
        for job in failed_queued.iter().chain(&interrupted) {
            self.persist(job, Some((AuditLogLevel::Error, INTERRUPTED_BY_SERVER)));
        }

        DrainReport {
            failed_queued: failed_queued.iter().map(JobHandle::id).collect(),
            interrupted: interrupted.iter().map(JobHandle::id).collect(),
        }
    }

    /// Whether the drain has run.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.inner.drained.load(Ordering::Acquire)
    }

    /// Consistent view of queue and registry.
    #[must_use]
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let queue = self.inner.queue.lock();
        let registry = self.inner.registry.lock();
        SchedulerSnapshot {
            queued: queue.iter().map(JobHandle::snapshot).collect(),
            running: registry
                .iter()
                .map(|(unit_id, entry)| RunningUnit {
                    unit_id: *unit_id,
                    job: entry.job.snapshot(),
                    dispatched_at_ms: entry.dispatched_at_ms,
                    interrupt_requested: entry.cancellation.is_cancelled(),
                })
                .collect(),
            max_concurrent: self.inner.config.max_concurrent,
            drained: self.is_drained(),
        }
    }

    /// Queued job ids, oldest first.
    #[must_use]
    pub fn queued_ids(&self) -> Vec<JobId> {
        self.inner.queue.lock().iter().map(JobHandle::id).collect()
    }

    /// Running job ids in dispatch order.
    #[must_use]
    pub fn running_ids(&self) -> Vec<JobId> {
        self.inner
            .registry
            .lock()
            .values()
            .map(|entry| entry.job.id())
            .collect()
    }

    /// Registry key of the unit running `job_id`, if any.
    #[must_use]
    pub fn unit_for(&self, job_id: JobId) -> Option<UnitId> {
        self.inner
            .registry
            .lock()
            .iter()
            .find(|(_, entry)| entry.job.id() == job_id)
            .map(|(unit_id, _)| *unit_id)
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let queued = self.inner.queue.lock().len();
        let running = self.inner.registry.lock().len();
        self.inner
            .counters
            .snapshot(self.inner.config.max_concurrent, queued, running)
    }

    /// Resolves when a submission, a completion or the drain asks for a
    /// dispatch pass.
    pub(crate) async fn dispatch_requested(&self) {
        self.inner.wakeup.notified().await;
    }

    fn notify_dispatcher(&self) {
        if self.inner.config.dispatch_on_events {
            self.inner.wakeup.notify_one();
        }
    }

    fn launch(&self, launch: Launch) {
        let Launch {
            unit_id,
            unit,
            job,
            cancellation,
        } = launch;
        let info = UnitInfo {
            unit_id,
            job_id: job.id(),
        };
        let listener: Arc<dyn LifecycleListener> = Arc::new(self.clone());
        let ctx = UnitContext::new(info, job.clone(), cancellation, listener);
        // Built outside the future so an unpolled, dropped future still ends the unit.
        let end = EndGuard {
            scheduler: self.clone(),
            job,
            info,
        };

        self.inner.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::info!(job_id = %info.job_id, unit_id, "audit started");

        self.inner.spawner.spawn(Box::pin(async move {
            let outcome = unit.run(&ctx).await;
            end.scheduler.finish(&end.job, outcome);
        }));
    }

    /// Map a unit outcome onto its job. A job that already reached a
    /// terminal status (cancelled or drained) keeps it.
    fn finish(&self, job: &JobHandle, outcome: Result<(), UnitError>) {
        let (next, log) = match &outcome {
            Ok(()) => (JobStatus::Success, None),
            Err(UnitError::Interrupted) => (
                JobStatus::Interrupted,
                Some((AuditLogLevel::Warning, "Audit interrupted".to_owned())),
            ),
            Err(UnitError::Failed(reason)) => (
                JobStatus::Error,
                Some((AuditLogLevel::Error, format!("Audit failed: {reason}"))),
            ),
        };

        match job.transition(next) {
            Ok(_) => {
                self.inner.counters.record_terminal(next);
                tracing::info!(job_id = %job.id(), status = %next, "audit finished");
                self.persist(job, log.as_ref().map(|(level, msg)| (*level, msg.as_str())));
            }
            Err(e) => {
                tracing::debug!(job_id = %job.id(), error = %e, "audit outcome ignored");
            }
        }
    }

    /// Record a job through the sink. Sink failures are logged only.
    ///
    /// The job lock is held across the write: saves of one job are
    /// serialized with its transitions and the last save carries its final
    /// status.
    fn persist(&self, job: &JobHandle, log: Option<(AuditLogLevel, &str)>) {
        job.with_locked(|current| {
            if let Some((level, message)) = log {
                if let Err(e) = self.inner.sink.log(current, level, message) {
                    tracing::error!(job_id = %current.id, error = %e, "failed to record audit log");
                }
            }
            if let Err(e) = self.inner.sink.save(current) {
                tracing::error!(job_id = %current.id, error = %e, "failed to save audit");
            }
        });
    }
}

impl LifecycleListener for AuditScheduler {
    fn on_start(&self, unit: &UnitInfo) {
        tracing::debug!(job_id = %unit.job_id, unit_id = unit.unit_id, "audit running");
        for observer in &self.inner.observers {
            observer.on_start(unit);
        }
    }

    fn on_progress(&self, unit: &UnitInfo, milestone: &Milestone) {
        tracing::trace!(job_id = %unit.job_id, unit_id = unit.unit_id, ?milestone, "audit progress");
        for observer in &self.inner.observers {
            observer.on_progress(unit, milestone);
        }
    }

    fn on_end(&self, unit: &UnitInfo) {
        if self.release(unit.unit_id) {
            for observer in &self.inner.observers {
                observer.on_end(unit);
            }
        }
    }
}

/// Fires `on_end` when the unit future completes, panics or is dropped.
/// A job still `Running` at that point never reported an outcome and is
/// failed.
struct EndGuard {
    scheduler: AuditScheduler,
    job: JobHandle,
    info: UnitInfo,
}

impl Drop for EndGuard {
    fn drop(&mut self) {
        if self.job.transition(JobStatus::Error).is_ok() {
            self.scheduler.inner.counters.record_terminal(JobStatus::Error);
            tracing::error!(job_id = %self.info.job_id, unit_id = self.info.unit_id, "audit aborted");
            self.scheduler
                .persist(&self.job, Some((AuditLogLevel::Error, ABORTED)));
        }
        self.scheduler.on_end(&self.info);
    }
}
