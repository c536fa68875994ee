// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use hydrowatch_core::{SampleStore, SensorId};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

/// Typical healthy readings: TDS 412 ppm, EC 6.9, 24.5 °C, 61 %.
pub const HEALTHY: [(SensorId, f64); 4] = [
    (SensorId::Tds, 412.0),
    (SensorId::Ec, 6.9),
    (SensorId::Temperature, 24.5),
    (SensorId::Humidity, 61.0),
];

#[must_use]
pub fn healthy_cycle() -> BTreeMap<SensorId, f64> {
    HEALTHY.into_iter().collect()
}

/// Every sensor reads `value`.
#[must_use]
pub fn uniform_cycle(value: f64) -> BTreeMap<SensorId, f64> {
    SensorId::ALL.iter().map(|id| (*id, value)).collect()
}

/// Store over all sensors.
///
/// # Panics
///
/// If `capacity` is zero.
#[must_use]
pub fn store(capacity: usize) -> SampleStore {
    let capacity = NonZeroUsize::new(capacity).expect("capacity must be non-zero");
    SampleStore::new(&SensorId::ALL, capacity).expect("all sensors is non-empty")
}
