//! Tests for tokio spawner utilities

use audit_runner::core::{SchedulerError, Spawn};
use audit_runner::runtime::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(Box::pin(async move {
        tx.send(123).unwrap();
    }));

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_tokio_spawner_try_current() {
    let spawner = TokioSpawner::try_current().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(Box::pin(async move {
        tx.send("ran").unwrap();
    }));
    assert_eq!(rx.await.unwrap(), "ran");
}

#[test]
fn test_tokio_spawner_outside_runtime() {
    let err = TokioSpawner::try_current().unwrap_err();
    assert!(matches!(err, SchedulerError::Backend(_)));
}
