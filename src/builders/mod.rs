//! Builders to construct the scheduler from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{scheduler_from_env, SchedulerBuilder};
