// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::readiness::ReadinessPolicy;
use crate::sample_store::BufferState;
use crate::sensor::SensorId;
use crate::stats::Stats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sensor's history as seen by readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub sensor: SensorId,
    pub readings: Vec<f64>,
    pub latest: Option<f64>,
    pub stats: Option<Stats>,
}

/// Immutable point-in-time view of every buffer plus derived statistics.
///
/// Built from a single [`BufferState`], so all sensors reflect the same cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u64,
    pub cycle_count: u64,
    pub capacity: usize,
    pub all_ready: bool,
    pub timestamps: Vec<DateTime<Utc>>,
    pub per_sensor: BTreeMap<SensorId, SensorSnapshot>,
    pub data_count: BTreeMap<SensorId, usize>,
}

impl Snapshot {
    /// Builds a snapshot, computing stats where `policy` allows.
    ///
    /// Runs outside the buffer lock; `state` is already a private copy.
    #[must_use]
    pub fn from_state(state: BufferState, policy: ReadinessPolicy) -> Self {
        let all_ready = state.all_full();
        let capacity = state.capacity;

        let data_count = state
            .readings
            .iter()
            .map(|(id, readings)| (*id, readings.len()))
            .collect();

        let per_sensor = state
            .readings
            .into_iter()
            .map(|(sensor, readings)| {
                let full = readings.len() == capacity;
                let stats = if policy.stats_visible(full, all_ready) {
                    Stats::compute(&readings)
                } else {
                    None
                };
                let snapshot = SensorSnapshot {
                    sensor,
                    latest: readings.last().copied(),
                    readings,
                    stats,
                };
                (sensor, snapshot)
            })
            .collect();

        Self {
            version: state.version,
            cycle_count: state.cycle_count,
            capacity,
            all_ready,
            timestamps: state.timestamps,
            per_sensor,
            data_count,
        }
    }

    /// Empty snapshot for `sensors`, used before the first cycle.
    #[must_use]
    pub fn empty(sensors: &[SensorId], capacity: usize) -> Self {
        let state = BufferState {
            version: 0,
            cycle_count: 0,
            capacity,
            timestamps: Vec::new(),
            readings: sensors.iter().map(|id| (*id, Vec::new())).collect(),
        };
        Self::from_state(state, ReadinessPolicy::AllFull)
    }

    #[must_use]
    pub fn sensor(&self, id: SensorId) -> Option<&SensorSnapshot> {
        self.per_sensor.get(&id)
    }

    #[must_use]
    pub fn stats(&self, id: SensorId) -> Option<&Stats> {
        self.sensor(id).and_then(|s| s.stats.as_ref())
    }

    #[must_use]
    pub fn count(&self, id: SensorId) -> usize {
        self.data_count.get(&id).copied().unwrap_or(0)
    }

    /// `true` when no sensor holds any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_count.values().all(|n| *n == 0)
    }
}
