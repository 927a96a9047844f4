//! Tests for utility functions

use audit_runner::util::{init_tracing, now_ms};

#[test]
fn test_now_ms_advances() {
    let first = now_ms();
    assert!(first > 0);
    std::thread::sleep(std::time::Duration::from_millis(2));
    assert!(now_ms() >= first);
}

#[test]
fn test_init_tracing_installs_once() {
    init_tracing();
    assert!(!init_tracing());
}
