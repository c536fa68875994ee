// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One sampling cycle, end to end.
//!
//! Fetches run as separate tasks in a [`JoinSet`], bounded by a semaphore.
//! Each task catches its own panic, so a misbehaving sensor is reported as
//! [`HydroError::TaskPanic`] and the others still land. Dropping the cycle
//! future drops the set, which aborts any fetch still running.

use crate::cycle::{CycleOutcome, CycleResult};
use crate::gate::{GateDecision, GateFailure, GatingPolicy};
use chrono::Utc;
use futures::FutureExt;
use hydrowatch_core::{
    info, warn, HydroError, ReadinessPolicy, Result, SampleStore, SensorId, Snapshot, SnapshotHub,
};
use hydrowatch_error::ResultExt;
use hydrowatch_fetch::SampleFetcher;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default cap on concurrent fetches.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub max_concurrency: usize,
    pub gating: GatingPolicy,
    pub readiness: ReadinessPolicy,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            gating: GatingPolicy::disabled(),
            readiness: ReadinessPolicy::default(),
        }
    }
}

/// Owns the write path: fetch, gate, commit, publish.
pub struct SampleCoordinator {
    fetcher: Arc<dyn SampleFetcher>,
    store: Arc<SampleStore>,
    hub: Arc<SnapshotHub>,
    sensors: Vec<SensorId>,
    limiter: Arc<Semaphore>,
    options: CoordinatorOptions,
    was_ready: AtomicBool,
}

impl SampleCoordinator {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn SampleFetcher>,
        store: Arc<SampleStore>,
        hub: Arc<SnapshotHub>,
        options: CoordinatorOptions,
    ) -> Self {
        let sensors = store.sensors();
        let permits = options.max_concurrency.max(1);
        Self {
            fetcher,
            store,
            hub,
            sensors,
            limiter: Arc::new(Semaphore::new(permits)),
            options,
            was_ready: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn hub(&self) -> &Arc<SnapshotHub> {
        &self.hub
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    #[must_use]
    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Runs one complete cycle. Never fails; problems are in the result.
    pub async fn run_cycle(&self) -> CycleResult {
        let started_at = Utc::now();
        let (values, failures) = self.fetch_all().await;

        for (sensor, err) in &failures {
            warn!("{} fetch failed: {}", sensor, err);
        }

        let outcome = match self.options.gating.evaluate(&values) {
            GateDecision::Pass => self.commit(&values, started_at),
            GateDecision::Skip(gate_failures) => {
                let reasons: Vec<String> = gate_failures.iter().map(ToString::to_string).collect();
                info!("Cycle skipped by gate: {}", reasons.join(", "));
                self.skip(gate_failures)
            }
        };

        CycleResult {
            started_at,
            values,
            failures,
            outcome,
        }
    }

    fn commit(&self, values: &BTreeMap<SensorId, f64>, at: chrono::DateTime<Utc>) -> CycleOutcome {
        let committed = self
            .store
            .commit(values, at)
            .with_context(|| format!("cycle started {at}"));
        let state = match committed {
            Ok(state) => state,
            Err(err) => {
                warn!("Cycle not committed: {}", err);
                return CycleOutcome::Aborted(err);
            }
        };

        // Stats are computed here, outside the buffer lock.
        let snapshot = Snapshot::from_state(state, self.options.readiness);
        let version = snapshot.version;
        let all_ready = snapshot.all_ready;

        if all_ready && !self.was_ready.swap(true, Ordering::SeqCst) {
            info!(
                "All {} buffers full after {} cycles; statistics available",
                self.sensors.len(),
                snapshot.cycle_count
            );
        }

        let published = self.hub.publish_cycle(snapshot);
        CycleOutcome::Committed {
            version,
            all_ready,
            published,
        }
    }

    fn skip(&self, failures: Vec<GateFailure>) -> CycleOutcome {
        let state = match self.store.record_skip().context("gated-out cycle") {
            Ok(state) => state,
            Err(err) => {
                warn!("Could not record skipped cycle: {}", err);
                return CycleOutcome::Aborted(err);
            }
        };

        // Buffers are unchanged, but readers still see the cycle counted.
        let snapshot = Snapshot::from_state(state, self.options.readiness);
        let version = snapshot.version;
        let published = self.hub.publish_skip(snapshot);
        CycleOutcome::Skipped {
            version,
            failures,
            published,
        }
    }

    /// Clears all history and publishes the empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Consistency`] if the buffer lock is not acquired in time.
    pub fn reset(&self) -> Result<Arc<Snapshot>> {
        let state = self.store.reset()?;
        let snapshot = Snapshot::from_state(state, self.options.readiness);
        self.was_ready.store(false, Ordering::SeqCst);
        self.hub.publish_reset(snapshot);
        info!("Sample history reset");
        Ok(self.hub.current())
    }

    async fn fetch_all(&self) -> (BTreeMap<SensorId, f64>, BTreeMap<SensorId, HydroError>) {
        let mut tasks = JoinSet::new();
        for &sensor in &self.sensors {
            let fetcher = Arc::clone(&self.fetcher);
            let limiter = Arc::clone(&self.limiter);
            tasks.spawn(async move {
                let outcome = match limiter.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(fetcher.fetch(sensor))
                        .catch_unwind()
                        .await
                        .map_err(|payload| HydroError::task_panic(panic_message(payload.as_ref())))
                        .and_then(|fetched| fetched.map_err(HydroError::from)),
                    Err(_) => Err(HydroError::cancelled("fetch limiter closed")),
                };
                (sensor, outcome)
            });
        }

        let mut values = BTreeMap::new();
        let mut failures = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((sensor, Ok(value))) => {
                    values.insert(sensor, value);
                }
                Ok((sensor, Err(err))) => {
                    failures.insert(sensor, err);
                }
                Err(join_err) => warn!("Fetch task did not complete: {}", join_err),
            }
        }

        // A task that never reported back was aborted.
        for &sensor in &self.sensors {
            if !values.contains_key(&sensor) && !failures.contains_key(&sensor) {
                failures.insert(sensor, HydroError::cancelled(format!("{sensor} fetch")));
            }
        }
        (values, failures)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
