//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use audit_runner::config::{
    SchedulerConfig, DEFAULT_TICK_INTERVAL_MS, ENV_DISPATCH_ON_EVENTS, ENV_MAX_CONCURRENT,
    ENV_TICK_INTERVAL_MS,
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig {
        max_concurrent: 4,
        tick_interval_ms: 10_000,
        dispatch_on_events: false,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_max_concurrent() {
    let invalid = SchedulerConfig::new(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_tick_interval() {
    let invalid = SchedulerConfig::new(2).with_tick_interval(Duration::ZERO);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_default_config() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.max_concurrent >= 1);
    assert_eq!(cfg.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    assert_eq!(cfg.tick_interval(), Duration::from_secs(10));
    assert!(!cfg.dispatch_on_events);
}

#[test]
fn test_config_builders() {
    let cfg = SchedulerConfig::new(3)
        .with_tick_interval(Duration::from_millis(250))
        .with_dispatch_on_events(true);
    assert_eq!(cfg.max_concurrent, 3);
    assert_eq!(cfg.tick_interval_ms, 250);
    assert!(cfg.dispatch_on_events);
}

#[test]
fn test_config_from_json() {
    let cfg = SchedulerConfig::from_json_str(r#"{"max_concurrent": 2}"#).unwrap();
    assert_eq!(cfg.max_concurrent, 2);
    assert_eq!(cfg.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);

    let err = SchedulerConfig::from_json_str(r#"{"max_concurrent": 0}"#).unwrap_err();
    assert!(err.contains("max_concurrent"));

    let err = SchedulerConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_config_from_lookup() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        (ENV_MAX_CONCURRENT, "8"),
        (ENV_TICK_INTERVAL_MS, " 500 "),
        (ENV_DISPATCH_ON_EVENTS, "Yes"),
    ]))
    .unwrap();
    assert_eq!(cfg.max_concurrent, 8);
    assert_eq!(cfg.tick_interval_ms, 500);
    assert!(cfg.dispatch_on_events);
}

#[test]
fn test_config_from_lookup_defaults() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, SchedulerConfig::default());
}

#[test]
fn test_config_from_lookup_bad_values() {
    let err = SchedulerConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT, "many")])).unwrap_err();
    assert!(err.starts_with(ENV_MAX_CONCURRENT));

    let err = SchedulerConfig::from_lookup(lookup(&[(ENV_DISPATCH_ON_EVENTS, "maybe")])).unwrap_err();
    assert!(err.contains("maybe"));

    let err = SchedulerConfig::from_lookup(lookup(&[(ENV_TICK_INTERVAL_MS, "0")])).unwrap_err();
    assert!(err.contains("tick_interval_ms"));
}
