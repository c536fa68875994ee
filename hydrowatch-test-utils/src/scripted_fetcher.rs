// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use hydrowatch_core::SensorId;
use hydrowatch_error::FetchError;
use hydrowatch_fetch::SampleFetcher;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Step {
    Value(f64),
    Error(FetchError),
    /// Panic inside `fetch` with this message.
    Panic(&'static str),
}

/// Fetcher that replays queued [`Step`]s per sensor.
///
/// Queued steps are consumed first; afterwards the sensor's `always` step is
/// repeated. A sensor with neither fails with a transport error.
#[derive(Default)]
pub struct ScriptedFetcher {
    queued: Mutex<HashMap<SensorId, VecDeque<Step>>>,
    fallback: HashMap<SensorId, Step>,
    calls: Mutex<HashMap<SensorId, usize>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `step` as the next answer for `sensor`.
    #[must_use]
    pub fn then(self, sensor: SensorId, step: Step) -> Self {
        self.queued.lock().entry(sensor).or_default().push_back(step);
        self
    }

    /// Answer with `step` once the queue for `sensor` is empty.
    #[must_use]
    pub fn always(mut self, sensor: SensorId, step: Step) -> Self {
        self.fallback.insert(sensor, step);
        self
    }

    /// Answer every sensor with `value` once its queue is empty.
    #[must_use]
    pub fn always_all(mut self, value: f64) -> Self {
        for sensor in SensorId::ALL {
            self.fallback.insert(sensor, Step::Value(value));
        }
        self
    }

    /// Sleep this long before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `sensor` was fetched.
    #[must_use]
    pub fn calls(&self, sensor: SensorId) -> usize {
        self.calls.lock().get(&sensor).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Most fetches ever running at the same time.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, sensor: SensorId) -> Step {
        *self.calls.lock().entry(sensor).or_default() += 1;
        self.queued
            .lock()
            .get_mut(&sensor)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.fallback.get(&sensor).cloned())
            .unwrap_or_else(|| Step::Error(FetchError::transport(format!("no script for {sensor}"))))
    }
}

#[async_trait]
impl SampleFetcher for ScriptedFetcher {
    async fn fetch(&self, sensor: SensorId) -> Result<f64, FetchError> {
        let step = self.next_step(sensor);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match step {
            Step::Value(value) => Ok(value),
            Step::Error(err) => Err(err),
            Step::Panic(message) => panic!("{message}"),
        }
    }
}

/// Fetcher that always returns the same value per sensor.
pub struct ConstantFetcher {
    values: BTreeMap<SensorId, f64>,
}

impl ConstantFetcher {
    #[must_use]
    pub fn new(values: BTreeMap<SensorId, f64>) -> Self {
        Self { values }
    }

    /// Every sensor reads `value`.
    #[must_use]
    pub fn all(value: f64) -> Self {
        Self::new(SensorId::ALL.iter().map(|id| (*id, value)).collect())
    }
}

#[async_trait]
impl SampleFetcher for ConstantFetcher {
    async fn fetch(&self, sensor: SensorId) -> Result<f64, FetchError> {
        self.values
            .get(&sensor)
            .copied()
            .ok_or_else(|| FetchError::transport(format!("no value for {sensor}")))
    }
}
