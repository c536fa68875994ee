// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Execution side of hydrowatch: one sampling cycle, and the tasks that
//! repeat it.
//!
//! - [`SampleCoordinator::run_cycle`] fetches every sensor concurrently,
//!   applies the [`GatingPolicy`], commits to the store and publishes a
//!   snapshot.
//! - [`SamplerTask`] runs cycles on a fixed period without overlap.
//! - [`UsageMonitor`] periodically reports approximate network traffic.
//!
//! Both tasks are [`PeriodicTask`]s: cancelled through a token and given a
//! bounded grace period to finish the iteration in flight.

pub mod coordinator;
pub mod cycle;
pub mod gate;
pub mod periodic;
pub mod sampler;
pub mod usage_monitor;

pub use self::coordinator::{CoordinatorOptions, SampleCoordinator};
pub use self::cycle::{CycleOutcome, CycleResult};
pub use self::gate::{GateDecision, GateFailure, GatingPolicy, Threshold};
pub use self::periodic::PeriodicTask;
pub use self::sampler::{HealthReport, SamplerHealth, SamplerTask};
pub use self::usage_monitor::{UsageMonitor, UsageSource};
pub use tokio_util::sync::CancellationToken;
