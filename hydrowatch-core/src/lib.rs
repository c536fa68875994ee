// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Sampling state for hydrowatch.
//!
//! The crate owns everything that sits between a finished fetch and a viewer:
//!
//! - [`RingBuffer`]: bounded, insertion-ordered history with oldest-eviction.
//! - [`Stats`]: descriptive statistics over a history slice.
//! - [`SampleStore`]: the per-sensor buffers behind the single consistency boundary.
//! - [`SnapshotHub`]: the published, immutable [`Snapshot`] plus live subscriptions.
//!
//! Writers go through [`SampleStore`]; readers only ever see [`Snapshot`]s.

#[doc(hidden)]
#[cfg(feature = "tracing")]
pub use tracing as __tracing;

#[macro_use]
mod logging;

pub mod broadcaster;
pub mod lock;
pub mod readiness;
pub mod ring_buffer;
pub mod sample_store;
pub mod sensor;
pub mod snapshot;
pub mod snapshot_hub;
pub mod stats;

pub use self::broadcaster::{BroadcastStream, Broadcaster};
pub use self::readiness::ReadinessPolicy;
pub use self::ring_buffer::RingBuffer;
pub use self::sample_store::{BufferState, SampleStore};
pub use self::sensor::{Reading, SensorId};
pub use self::snapshot::{SensorSnapshot, Snapshot};
pub use self::snapshot_hub::{SnapshotEvent, SnapshotHub, SnapshotStream};
pub use self::stats::Stats;
pub use hydrowatch_error::{HydroError, Result};
