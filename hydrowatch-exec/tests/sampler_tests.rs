// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use hydrowatch_core::{SensorId, SnapshotHub};
use hydrowatch_exec::{
    CancellationToken, CoordinatorOptions, SampleCoordinator, SamplerTask, UsageMonitor,
    UsageSource,
};
use hydrowatch_fetch::{SampleFetcher, UsageReport};
use hydrowatch_test_utils::fixtures::store;
use hydrowatch_test_utils::{ConstantFetcher, ScriptedFetcher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{pause, sleep};

fn coordinator(fetcher: Arc<dyn SampleFetcher>) -> Arc<SampleCoordinator> {
    let hub = Arc::new(SnapshotHub::new(&SensorId::ALL, 10));
    Arc::new(SampleCoordinator::new(
        fetcher,
        Arc::new(store(10)),
        hub,
        CoordinatorOptions::default(),
    ))
}

#[tokio::test]
async fn test_samples_immediately_then_every_period() {
    pause();
    let coordinator = coordinator(Arc::new(ConstantFetcher::all(1.0)));
    let sampler = SamplerTask::start(coordinator.clone(), Duration::from_secs(3));
    let health = sampler.health();

    sleep(Duration::from_millis(100)).await;
    assert_eq!(health.report().cycles_run, 1);

    sleep(Duration::from_secs(6)).await;
    assert_eq!(health.report().cycles_run, 3);
    assert_eq!(coordinator.hub().current().cycle_count, 3);

    assert!(sampler.stop(Duration::from_secs(1)).await);
    assert!(!health.report().running);
}

#[tokio::test]
async fn test_slow_cycles_never_overlap() {
    pause();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .always_all(1.0)
            .with_delay(Duration::from_secs(5)),
    );
    let sampler = SamplerTask::start(coordinator(fetcher.clone()), Duration::from_secs(3));
    let health = sampler.health();

    sleep(Duration::from_secs(20)).await;

    // Four sensors per cycle, one cycle at a time.
    assert_eq!(fetcher.peak_concurrency(), 4);
    let started = fetcher.calls(SensorId::Tds) as u64;
    let finished = health.report().cycles_run;
    assert!(started - finished <= 1, "started {started}, finished {finished}");
    // At most one cycle per 5 s of fetching.
    assert!(started <= 5);

    sampler.stop(Duration::from_secs(10)).await;
}

#[tokio::test]
async fn test_stop_waits_for_cycle_in_flight() {
    pause();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .always_all(1.0)
            .with_delay(Duration::from_secs(1)),
    );
    let coordinator = coordinator(fetcher);
    let sampler = SamplerTask::start(coordinator.clone(), Duration::from_secs(3));
    let health = sampler.health();

    sleep(Duration::from_millis(500)).await;
    assert_eq!(health.report().cycles_run, 0);

    assert!(sampler.stop(Duration::from_secs(5)).await);
    assert_eq!(health.report().cycles_run, 1);
    assert_eq!(coordinator.hub().current().cycle_count, 1);
}

#[tokio::test]
async fn test_stop_aborts_cycle_exceeding_grace() {
    pause();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .always_all(1.0)
            .with_delay(Duration::from_secs(60)),
    );
    let coordinator = coordinator(fetcher);
    let sampler = SamplerTask::start(coordinator.clone(), Duration::from_secs(3));
    let health = sampler.health();

    sleep(Duration::from_millis(500)).await;
    assert!(!sampler.stop(Duration::from_secs(1)).await);

    assert!(!health.report().running);
    assert_eq!(health.report().cycles_run, 0);
    assert_eq!(coordinator.hub().current().cycle_count, 0);
}

#[tokio::test]
async fn test_parent_token_stops_sampler() {
    pause();
    let shutdown = CancellationToken::new();
    let sampler = SamplerTask::start_with_token(
        coordinator(Arc::new(ConstantFetcher::all(1.0))),
        Duration::from_secs(3),
        shutdown.child_token(),
    );
    let health = sampler.health();
    sleep(Duration::from_millis(100)).await;
    assert!(sampler.is_running());
    assert!(health.report().running);

    shutdown.cancel();
    sleep(Duration::from_millis(100)).await;

    assert!(!sampler.is_running());
    // Reported as stopped without anyone calling `stop`.
    assert!(!health.report().running);
}

#[tokio::test]
async fn test_health_clears_running_when_task_dies() {
    pause();
    let coordinator = coordinator(Arc::new(ConstantFetcher::all(1.0)));
    let sampler = SamplerTask::start(coordinator, Duration::from_secs(3));
    let health = sampler.health();
    sleep(Duration::from_millis(100)).await;
    assert!(health.report().running);

    // Dropping the handle cancels the task without a graceful stop.
    drop(sampler);
    sleep(Duration::from_millis(100)).await;

    assert!(!health.report().running);
}

struct CountingUsage {
    rounds: AtomicU32,
}

#[async_trait::async_trait]
impl UsageSource for CountingUsage {
    async fn measure_usage(&self) -> UsageReport {
        self.rounds.fetch_add(1, Ordering::SeqCst);
        let mut report = UsageReport::default();
        report.record(120, 4);
        report
    }
}

#[tokio::test]
async fn test_usage_monitor_records_latest_report() {
    pause();
    let source = Arc::new(CountingUsage {
        rounds: AtomicU32::new(0),
    });
    let monitor = UsageMonitor::start(source.clone(), Duration::from_secs(5), CancellationToken::new());

    sleep(Duration::from_millis(5_100)).await;

    assert_eq!(source.rounds.load(Ordering::SeqCst), 2);
    assert_eq!(monitor.latest().map(|r| r.total_bytes()), Some(124));
    assert!(monitor.stop(Duration::from_secs(1)).await);
}
