//! Tests for job sinks

use audit_runner::core::{
    AuditKind, AuditLogLevel, AuditRequest, InMemoryJobSink, Job, JobSink, JobStatus,
    TracingJobSink,
};

fn job(name: &str) -> Job {
    Job::new(AuditRequest::new(name, AuditKind::Site, vec![format!("https://{name}.test")]))
}

#[test]
fn test_in_memory_sink_records_saves_and_logs() {
    let sink = InMemoryJobSink::default();
    let mut a = job("a");
    let b = job("b");

    sink.save(&a).unwrap();
    a.transition(JobStatus::Running).unwrap();
    sink.save(&a).unwrap();
    sink.save(&b).unwrap();
    sink.log(&a, AuditLogLevel::Warning, "slow page").unwrap();
    sink.log(&b, AuditLogLevel::Error, "unreachable").unwrap();

    assert_eq!(sink.saved().len(), 3);
    assert_eq!(sink.last_saved(a.id).unwrap().status, JobStatus::Running);
    assert_eq!(sink.last_saved(b.id).unwrap().status, JobStatus::Queued);

    let logs = sink.logs_for(a.id);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, AuditLogLevel::Warning);
    assert_eq!(logs[0].message, "slow page");
    assert_eq!(sink.logs().len(), 2);
}

#[test]
fn test_in_memory_sink_is_bounded() {
    let sink = InMemoryJobSink::new(2);
    let jobs: Vec<Job> = (0..3).map(|i| job(&format!("job-{i}"))).collect();
    for j in &jobs {
        sink.save(j).unwrap();
        sink.log(j, AuditLogLevel::Info, "saved").unwrap();
    }

    let saved: Vec<_> = sink.saved().into_iter().map(|j| j.id).collect();
    assert_eq!(saved, vec![jobs[1].id, jobs[2].id]);
    assert_eq!(sink.logs().len(), 2);
    assert!(sink.last_saved(jobs[0].id).is_none());
}

#[test]
fn test_tracing_sink_accepts_everything() {
    let sink = TracingJobSink;
    let j = job("traced");
    assert!(sink.save(&j).is_ok());
    assert!(sink.log(&j, AuditLogLevel::Debug, "hello").is_ok());
}

#[test]
fn test_log_level_display() {
    assert_eq!(AuditLogLevel::Warning.to_string(), "WARNING");
    assert_eq!(AuditLogLevel::Error.to_string(), "ERROR");
}
