// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::periodic::PeriodicTask;
use async_trait::async_trait;
use hydrowatch_core::info;
use hydrowatch_fetch::{HttpFetcher, UsageReport};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Something that can measure one round of endpoint traffic.
#[async_trait]
pub trait UsageSource: Send + Sync {
    async fn measure_usage(&self) -> UsageReport;
}

#[async_trait]
impl UsageSource for HttpFetcher {
    async fn measure_usage(&self) -> UsageReport {
        HttpFetcher::measure_usage(self).await
    }
}

/// Periodically measures and logs approximate network usage.
pub struct UsageMonitor {
    task: PeriodicTask,
    latest: Arc<Mutex<Option<UsageReport>>>,
}

impl UsageMonitor {
    #[must_use]
    pub fn start(source: Arc<dyn UsageSource>, period: Duration, cancel: CancellationToken) -> Self {
        let latest = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&latest);

        let task = PeriodicTask::spawn_with_token("usage monitor", period, cancel, move || {
            let source = Arc::clone(&source);
            let slot = Arc::clone(&slot);
            async move {
                let report = source.measure_usage().await;
                info!(
                    "Network usage: {:.6} MB ({} B sent, {} B received, {} failed)",
                    report.total_megabytes(),
                    report.bytes_sent,
                    report.bytes_received,
                    report.failed.len()
                );
                *slot.lock() = Some(report);
            }
        });

        Self { task, latest }
    }

    /// The most recent measurement, if any round has completed.
    #[must_use]
    pub fn latest(&self) -> Option<UsageReport> {
        self.latest.lock().clone()
    }

    pub async fn stop(self, grace: Duration) -> bool {
        self.task.stop(grace).await
    }
}
