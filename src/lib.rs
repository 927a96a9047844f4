//! # Audit Runner
//!
//! A bounded-concurrency scheduler for long-running audit jobs.
//!
//! Audit requests are queued as they arrive and dispatched to execution under
//! a strict cap on simultaneously running audits. Each running audit is an
//! [`core::ExecutionUnit`] built by a host-supplied factory and launched on its
//! own task; it can be cancelled cooperatively, and a one-shot drain fails
//! everything still queued and interrupts everything running at shutdown.
//!
//! ## Guarantees
//!
//! - **Bounded concurrency**: the registry of running units never exceeds
//!   `max_concurrent`
//! - **FIFO fairness**: jobs are dispatched oldest-first; no job skips ahead
//!   of an older one
//! - **No lost jobs**: a job leaving the queue either starts running or ends
//!   in `Error` during the same dispatch pass
//! - **Bounded latency**: new submissions and freed capacity are picked up by
//!   the next tick (or immediately with event-driven dispatch)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use audit_runner::builders::SchedulerBuilder;
//! use audit_runner::config::SchedulerConfig;
//! use audit_runner::core::{AuditKind, AuditRequest, Dispatcher, InMemoryJobSink, Job};
//! use tokio_util::sync::CancellationToken;
//!
//! let scheduler = SchedulerBuilder::new(SchedulerConfig::new(4))
//!     .factory(Arc::new(my_factory))
//!     .sink(Arc::new(InMemoryJobSink::default()))
//!     .build()?;
//!
//! let shutdown = CancellationToken::new();
//! let dispatcher = Dispatcher::new(scheduler.clone()).spawn(shutdown.clone());
//!
//! let job = scheduler.submit(Job::new(AuditRequest::new(
//!     "home page",
//!     AuditKind::Page,
//!     vec!["https://example.org".into()],
//! )))?;
//!
//! // later, at shutdown
//! shutdown.cancel();
//! let report = dispatcher.await?;
//! ```
//!
//! For complete scenarios, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and capacity accounting.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct the scheduler from configuration.
pub mod builders;
/// Runtime adapters for launching execution units.
pub mod runtime;
/// Shared utilities.
pub mod util;
