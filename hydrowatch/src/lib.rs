// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # hydrowatch
//!
//! Polls a set of water-quality sensors (TDS, EC, temperature, humidity) from a
//! remote telemetry endpoint, keeps a bounded history per sensor, and serves
//! descriptive statistics once enough history has accumulated.
//!
//! ## Overview
//!
//! - A background sampler runs one cycle every period: all sensors are fetched
//!   concurrently, failures are isolated per sensor, and the survivors are
//!   committed to the ring buffers atomically.
//! - Readers never touch the buffers; they get immutable [`Snapshot`]s, either
//!   on demand or as a live stream.
//! - An HTTP surface exposes the latest snapshot, a server-sent event stream,
//!   a reset control and a health probe.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hydrowatch::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse_from(["hydrowatch", "--auth-token", "dG9rZW4="]);
//!     let config = MonitorConfig::try_from(args)?;
//!     let monitor = Monitor::new(config)?;
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:10000").await?;
//!     monitor.serve(listener, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod server;

pub use hydrowatch_core::{
    ReadinessPolicy, RingBuffer, SampleStore, SensorId, Snapshot, SnapshotEvent, SnapshotHub,
    Stats,
};
pub use hydrowatch_error::{ConfigError, FetchError, HydroError, Result};
pub use hydrowatch_exec::{
    CoordinatorOptions, CycleResult, GatingPolicy, SampleCoordinator, SamplerTask,
};
pub use hydrowatch_fetch::{Endpoint, HttpFetcher, RetryPolicy, SampleFetcher};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::Monitor;
    pub use crate::config::{Args, MonitorConfig};
    pub use crate::server::{router, AppState};
    pub use clap::Parser;
    pub use hydrowatch_core::{ReadinessPolicy, SensorId, Snapshot, SnapshotEvent, SnapshotHub};
    pub use hydrowatch_error::{ConfigError, HydroError};
    pub use hydrowatch_exec::{CoordinatorOptions, SampleCoordinator, SamplerTask};
    pub use hydrowatch_fetch::SampleFetcher;
}
