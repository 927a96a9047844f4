//! Builder wiring a scheduler from configuration and collaborators.

use std::sync::Arc;

use anyhow::Context;

use crate::config::SchedulerConfig;
use crate::core::{
    AppResult, AuditScheduler, JobSink, LifecycleListener, SchedulerError, Spawn, TracingJobSink,
    UnitFactory,
};
use crate::runtime::TokioSpawner;

/// Fluent builder for [`AuditScheduler`].
///
/// Only the factory is required. The sink defaults to [`TracingJobSink`] and
/// the spawner to the current tokio runtime.
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    factory: Option<Arc<dyn UnitFactory>>,
    sink: Option<Arc<dyn JobSink>>,
    spawner: Option<Arc<dyn Spawn>>,
    observers: Vec<Arc<dyn LifecycleListener>>,
}

impl SchedulerBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            factory: None,
            sink: None,
            spawner: None,
            observers: Vec::new(),
        }
    }

    /// Configuration the scheduler will use.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Set the unit factory.
    #[must_use]
    pub fn factory(mut self, factory: Arc<dyn UnitFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the persistence sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn JobSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the spawner.
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawn>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Add a lifecycle observer.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn LifecycleListener>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the scheduler.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if no factory was set or the
    ///   configuration is invalid
    /// - `SchedulerError::Backend` if no spawner was set and there is no
    ///   current tokio runtime
    pub fn build(self) -> Result<AuditScheduler, SchedulerError> {
        let factory = self
            .factory
            .ok_or_else(|| SchedulerError::InvalidConfig("a unit factory is required".into()))?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingJobSink));
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => Arc::new(TokioSpawner::try_current()?),
        };
        AuditScheduler::with_observers(self.config, factory, sink, spawner, self.observers)
    }
}

/// Build a scheduler from environment configuration, the given factory and
/// sink, on the current tokio runtime.
///
/// # Errors
///
/// Fails if the environment holds invalid settings or no runtime is active.
pub fn scheduler_from_env(
    factory: Arc<dyn UnitFactory>,
    sink: Arc<dyn JobSink>,
) -> AppResult<AuditScheduler> {
    let config = SchedulerConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading scheduler configuration")?;
    let scheduler = SchedulerBuilder::new(config)
        .factory(factory)
        .sink(sink)
        .build()
        .context("building audit scheduler")?;
    Ok(scheduler)
}
