//! Runtime adapters for launching execution units.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
