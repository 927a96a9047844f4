//! Configuration models for the scheduler.

pub mod scheduler;

pub use scheduler::{
    SchedulerConfig, DEFAULT_TICK_INTERVAL_MS, ENV_DISPATCH_ON_EVENTS, ENV_MAX_CONCURRENT,
    ENV_TICK_INTERVAL_MS,
};
