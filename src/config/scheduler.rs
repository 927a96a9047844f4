//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default dispatch tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10_000;

/// Environment variable holding `max_concurrent`.
pub const ENV_MAX_CONCURRENT: &str = "AUDIT_RUNNER_MAX_CONCURRENT";
/// Environment variable holding `tick_interval_ms`.
pub const ENV_TICK_INTERVAL_MS: &str = "AUDIT_RUNNER_TICK_INTERVAL_MS";
/// Environment variable holding `dispatch_on_events`.
pub const ENV_DISPATCH_ON_EVENTS: &str = "AUDIT_RUNNER_DISPATCH_ON_EVENTS";

fn default_max_concurrent() -> usize {
    num_cpus::get().max(1)
}

const fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of audits running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Delay between dispatch ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Also dispatch right after a submission or a completion instead of
    /// waiting for the next tick.
    #[serde(default)]
    pub dispatch_on_events: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            dispatch_on_events: false,
        }
    }
}

impl SchedulerConfig {
    /// Configuration with the given capacity and default timings.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Self::default()
        }
    }

    /// Set the tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable event-driven dispatch.
    #[must_use]
    pub const fn with_dispatch_on_events(mut self, enabled: bool) -> Self {
        self.dispatch_on_events = enabled;
        self
    }

    /// Tick interval as a duration.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed values or validation failure.
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(format!("failed to load .env: {e}"));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed values or validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
            cfg.max_concurrent = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_MAX_CONCURRENT}: {e}"))?;
        }
        if let Some(raw) = lookup(ENV_TICK_INTERVAL_MS) {
            cfg.tick_interval_ms = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_TICK_INTERVAL_MS}: {e}"))?;
        }
        if let Some(raw) = lookup(ENV_DISPATCH_ON_EVENTS) {
            cfg.dispatch_on_events = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => return Err(format!("{ENV_DISPATCH_ON_EVENTS}: invalid boolean `{other}`")),
            };
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
