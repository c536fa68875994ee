// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The per-sensor buffers behind a single consistency boundary.
//!
//! Every mutation (a cycle commit, a skipped cycle, a reset) takes the one
//! buffer lock, applies all of its changes, bumps the version and returns a
//! [`BufferState`] copied while the lock was still held. Nothing awaits while
//! the lock is held, and the copy is what readers eventually see, so no reader
//! can observe half of a cycle.

use crate::lock::{lock_within, DEFAULT_LOCK_TIMEOUT};
use crate::ring_buffer::RingBuffer;
use crate::sensor::SensorId;
use chrono::{DateTime, Utc};
use hydrowatch_error::{HydroError, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

struct Buffers {
    per_sensor: BTreeMap<SensorId, RingBuffer<f64>>,
    timestamps: RingBuffer<DateTime<Utc>>,
    cycle_count: u64,
    version: u64,
}

impl Buffers {
    fn freeze(&self, capacity: usize) -> BufferState {
        BufferState {
            version: self.version,
            cycle_count: self.cycle_count,
            capacity,
            timestamps: self.timestamps.snapshot(),
            readings: self
                .per_sensor
                .iter()
                .map(|(id, buffer)| (*id, buffer.snapshot()))
                .collect(),
        }
    }
}

/// Copy of the buffers taken under the lock.
///
/// `version` increases by one for every mutation, so of two states the one
/// with the higher version is always the more recent.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferState {
    pub version: u64,
    pub cycle_count: u64,
    pub capacity: usize,
    pub timestamps: Vec<DateTime<Utc>>,
    pub readings: BTreeMap<SensorId, Vec<f64>>,
}

impl BufferState {
    /// `true` when every buffer holds `capacity` values.
    #[must_use]
    pub fn all_full(&self) -> bool {
        self.readings.values().all(|r| r.len() == self.capacity)
    }

    /// Number of values currently held for `sensor`.
    #[must_use]
    pub fn count(&self, sensor: SensorId) -> usize {
        self.readings.get(&sensor).map_or(0, Vec::len)
    }
}

/// Owner of all per-sensor history.
pub struct SampleStore {
    inner: Mutex<Buffers>,
    capacity: NonZeroUsize,
    lock_timeout: Duration,
}

impl SampleStore {
    /// Creates empty buffers of `capacity` for each of `sensors`.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::InvalidState`] if `sensors` is empty.
    pub fn new(sensors: &[SensorId], capacity: NonZeroUsize) -> Result<Self> {
        if sensors.is_empty() {
            return Err(HydroError::invalid_state("sample store needs at least one sensor"));
        }

        let per_sensor = sensors
            .iter()
            .map(|id| (*id, RingBuffer::new(capacity)))
            .collect();

        Ok(Self {
            inner: Mutex::new(Buffers {
                per_sensor,
                timestamps: RingBuffer::new(capacity),
                cycle_count: 0,
                version: 0,
            }),
            capacity,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Overrides how long operations wait for the buffer lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Sensors this store holds buffers for, in snapshot order.
    #[must_use]
    pub fn sensors(&self) -> Vec<SensorId> {
        self.inner.lock().per_sensor.keys().copied().collect()
    }

    /// Appends one cycle's values and counts the cycle.
    ///
    /// The shared timestamp is appended once if at least one value was stored.
    /// Values for sensors without a buffer are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Consistency`] if the lock cannot be acquired in time.
    pub fn commit(&self, values: &BTreeMap<SensorId, f64>, at: DateTime<Utc>) -> Result<BufferState> {
        let mut buffers = lock_within(&self.inner, self.lock_timeout, "cycle commit")?;

        let mut appended = 0usize;
        for (id, value) in values {
            if let Some(buffer) = buffers.per_sensor.get_mut(id) {
                buffer.append(*value);
                appended += 1;
            }
        }
        if appended > 0 {
            buffers.timestamps.append(at);
        }

        buffers.cycle_count += 1;
        buffers.version += 1;
        Ok(buffers.freeze(self.capacity.get()))
    }

    /// Counts a cycle whose values were discarded.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Consistency`] if the lock cannot be acquired in time.
    pub fn record_skip(&self) -> Result<BufferState> {
        self.commit(&BTreeMap::new(), Utc::now())
    }

    /// Empties every buffer and zeroes the cycle counter.
    ///
    /// Idempotent in content; the version still advances so the empty state
    /// supersedes any snapshot built before it.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Consistency`] if the lock cannot be acquired in time.
    pub fn reset(&self) -> Result<BufferState> {
        let mut buffers = lock_within(&self.inner, self.lock_timeout, "reset")?;

        for buffer in buffers.per_sensor.values_mut() {
            buffer.reset();
        }
        buffers.timestamps.reset();
        buffers.cycle_count = 0;
        buffers.version += 1;
        Ok(buffers.freeze(self.capacity.get()))
    }

    /// Copies the current state without mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Consistency`] if the lock cannot be acquired in time.
    pub fn state(&self) -> Result<BufferState> {
        let buffers = lock_within(&self.inner, self.lock_timeout, "state read")?;
        Ok(buffers.freeze(self.capacity.get()))
    }
}
