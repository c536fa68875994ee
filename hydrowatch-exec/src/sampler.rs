// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::coordinator::SampleCoordinator;
use crate::cycle::CycleResult;
use crate::periodic::PeriodicTask;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default sampling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Liveness summary served by the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub running: bool,
    pub cycles_run: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<&'static str>,
    pub last_failures: usize,
}

/// Shared record of what the sampler has been doing.
#[derive(Debug, Default)]
pub struct SamplerHealth {
    state: Mutex<HealthReport>,
}

impl SamplerHealth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &CycleResult) {
        let mut state = self.state.lock();
        state.cycles_run += 1;
        state.last_cycle_at = Some(result.started_at);
        state.last_outcome = Some(result.label());
        state.last_failures = result.failures.len();
    }

    pub fn set_running(&self, running: bool) {
        self.state.lock().running = running;
    }

    #[must_use]
    pub fn report(&self) -> HealthReport {
        self.state.lock().clone()
    }
}

/// Clears the running flag when dropped.
struct RunningGuard(Arc<SamplerHealth>);

impl RunningGuard {
    fn health(&self) -> &Arc<SamplerHealth> {
        &self.0
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

/// Runs [`SampleCoordinator::run_cycle`] every period until stopped.
pub struct SamplerTask {
    task: PeriodicTask,
    health: Arc<SamplerHealth>,
}

impl SamplerTask {
    /// Starts sampling immediately, then every `period`.
    #[must_use]
    pub fn start(coordinator: Arc<SampleCoordinator>, period: Duration) -> Self {
        Self::start_with_token(coordinator, period, CancellationToken::new())
    }

    #[must_use]
    pub fn start_with_token(
        coordinator: Arc<SampleCoordinator>,
        period: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let health = Arc::new(SamplerHealth::new());
        health.set_running(true);

        // Owned by the job closure, so it drops however the task ends:
        // cancellation, panic or abort.
        let liveness = RunningGuard(Arc::clone(&health));
        let task = PeriodicTask::spawn_with_token("sampler", period, cancel, move || {
            let coordinator = Arc::clone(&coordinator);
            let recorder = Arc::clone(liveness.health());
            async move {
                let result = coordinator.run_cycle().await;
                recorder.record(&result);
            }
        });

        Self { task, health }
    }

    #[must_use]
    pub fn health(&self) -> Arc<SamplerHealth> {
        Arc::clone(&self.health)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Stops sampling, letting the cycle in flight finish within `grace`.
    ///
    /// A cycle still running after `grace` is dropped, which aborts its fetches.
    pub async fn stop(self, grace: Duration) -> bool {
        let clean = self.task.stop(grace).await;
        self.health.set_running(false);
        clean
    }
}
