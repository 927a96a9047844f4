//! Tests for error types

use audit_runner::core::{JobStatus, SchedulerError, UnitError};

#[test]
fn test_shutting_down_error() {
    let err = SchedulerError::ShuttingDown;
    assert_eq!(format!("{}", err), "scheduler is shutting down");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("max_concurrent must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_concurrent must be greater than 0"
    );
}

#[test]
fn test_invalid_transition_error() {
    let err = SchedulerError::InvalidTransition {
        from: JobStatus::Success,
        to: JobStatus::Running,
    };
    assert_eq!(format!("{}", err), "invalid job transition: SUCCESS -> RUNNING");
}

#[test]
fn test_duplicate_job_error() {
    let id = uuid::Uuid::nil();
    let err = SchedulerError::DuplicateJob(id);
    assert_eq!(
        format!("{}", err),
        "job 00000000-0000-0000-0000-000000000000 is already queued"
    );
}

#[test]
fn test_backend_error() {
    let err = SchedulerError::Backend("connection failed".to_string());
    assert_eq!(format!("{}", err), "backend error: connection failed");
}

#[test]
fn test_persistence_error() {
    let err = SchedulerError::Persistence("disk full".to_string());
    assert_eq!(format!("{}", err), "persistence error: disk full");
}

#[test]
fn test_unit_errors() {
    assert_eq!(format!("{}", UnitError::Interrupted), "audit interrupted");
    assert_eq!(
        format!("{}", UnitError::Failed("timeout".to_string())),
        "audit failed: timeout"
    );
}
