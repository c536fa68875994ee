// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::MonitorConfig;
use crate::server::{router, AppState};
use hydrowatch_core::{info, warn, SampleStore, SensorId, SnapshotHub};
use hydrowatch_error::{HydroError, Result};
use hydrowatch_exec::{CancellationToken, SampleCoordinator, SamplerTask, UsageMonitor, UsageSource};
use hydrowatch_fetch::HttpFetcher;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The assembled application: fetcher, store, hub and coordinator.
pub struct Monitor {
    config: MonitorConfig,
    fetcher: Arc<HttpFetcher>,
    coordinator: Arc<SampleCoordinator>,
}

impl Monitor {
    /// # Errors
    ///
    /// Returns [`HydroError::Config`] if the HTTP client cannot be built.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.endpoint.clone(), config.fetch.clone())?);
        let store = Arc::new(SampleStore::new(&SensorId::ALL, config.capacity)?);
        let hub = Arc::new(SnapshotHub::new(&SensorId::ALL, config.capacity.get()));
        let coordinator = Arc::new(SampleCoordinator::new(
            fetcher.clone(),
            store,
            hub,
            config.coordinator.clone(),
        ));

        Ok(Self {
            config,
            fetcher,
            coordinator,
        })
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<SampleCoordinator> {
        &self.coordinator
    }

    /// Checks whether the device is online.
    ///
    /// Only fails when the device is required and is offline or unreachable.
    ///
    /// # Errors
    ///
    /// - [`HydroError::InvalidState`] if the device reports it is disconnected.
    /// - [`HydroError::Fetch`] if the probe itself fails.
    pub async fn probe_device(&self) -> Result<bool> {
        match self.fetcher.hardware_connected().await {
            Ok(true) => {
                info!("Device is connected");
                Ok(true)
            }
            Ok(false) if self.config.require_device => {
                Err(HydroError::invalid_state("device reports it is disconnected"))
            }
            Ok(false) => {
                warn!("Device reports it is disconnected; sampling anyway");
                Ok(false)
            }
            Err(err) if self.config.require_device => Err(err.into()),
            Err(err) => {
                warn!("Device probe failed: {}", err);
                Ok(false)
            }
        }
    }

    /// Runs the sampler (and usage monitor, if configured) and serves HTTP on
    /// `listener` until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns the I/O error that stopped the server.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let sampler = SamplerTask::start_with_token(
            self.coordinator.clone(),
            self.config.poll_interval,
            cancel.child_token(),
        );
        let usage = self.config.usage_interval.map(|period| {
            let source: Arc<dyn UsageSource> = self.fetcher.clone();
            UsageMonitor::start(source, period, cancel.child_token())
        });

        let app = router(AppState::new(self.coordinator.clone(), sampler.health()));
        let hub = self.coordinator.hub().clone();
        info!(
            "Serving on {} (poll every {:?}, capacity {})",
            listener.local_addr()?,
            self.config.poll_interval,
            self.config.capacity
        );

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Shutdown requested");
                // Ends open event streams so the server can drain.
                hub.close();
            })
            .await;

        cancel.cancel();
        sampler.stop(self.config.shutdown_grace).await;
        if let Some(usage) = usage {
            usage.stop(self.config.shutdown_grace).await;
        }
        served
    }
}
