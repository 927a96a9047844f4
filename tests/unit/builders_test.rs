//! Tests for builder functions

use std::sync::Arc;

use async_trait::async_trait;
use audit_runner::builders::{scheduler_from_env, SchedulerBuilder};
use audit_runner::config::SchedulerConfig;
use audit_runner::core::{
    AuditKind, AuditRequest, ExecutionUnit, InMemoryJobSink, Job, JobHandle, JobStatus,
    SchedulerError, UnitContext, UnitError,
};

struct InstantUnit {
    job: JobHandle,
}

#[async_trait]
impl ExecutionUnit for InstantUnit {
    fn job(&self) -> &JobHandle {
        &self.job
    }

    async fn run(&self, _ctx: &UnitContext) -> Result<(), UnitError> {
        Ok(())
    }
}

fn instant(job: &JobHandle) -> Option<Box<dyn ExecutionUnit>> {
    Some(Box::new(InstantUnit { job: job.clone() }))
}

#[test]
fn test_builder_requires_factory() {
    let result = SchedulerBuilder::new(SchedulerConfig::new(2)).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let result = SchedulerBuilder::new(SchedulerConfig::new(0))
        .factory(Arc::new(instant))
        .build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_builder_without_runtime_needs_spawner() {
    let result = SchedulerBuilder::new(SchedulerConfig::new(1))
        .factory(Arc::new(instant))
        .build();
    assert!(matches!(result, Err(SchedulerError::Backend(_))));
}

#[tokio::test]
async fn test_builder_defaults_on_current_runtime() {
    let sink = Arc::new(InMemoryJobSink::default());
    let builder = SchedulerBuilder::new(SchedulerConfig::new(2))
        .factory(Arc::new(instant))
        .sink(sink.clone());
    assert_eq!(builder.config().max_concurrent, 2);

    let scheduler = builder.build().unwrap();
    let job = scheduler
        .submit(Job::new(AuditRequest::new(
            "docs",
            AuditKind::Scenario,
            vec!["https://docs.test".into()],
        )))
        .unwrap();

    assert_eq!(scheduler.tick().dispatched, vec![job.id()]);
    for _ in 0..64 {
        if job.status() == JobStatus::Success {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(job.status(), JobStatus::Success);
    assert_eq!(sink.last_saved(job.id()).unwrap().status, JobStatus::Success);
}

#[tokio::test]
async fn test_scheduler_from_env_uses_defaults() {
    let scheduler = scheduler_from_env(Arc::new(instant), Arc::new(InMemoryJobSink::default())).unwrap();
    assert!(scheduler.config().max_concurrent >= 1);
    assert!(!scheduler.is_drained());
}
