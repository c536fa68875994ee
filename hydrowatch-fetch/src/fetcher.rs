// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use hydrowatch_core::SensorId;
use hydrowatch_error::FetchError;
use std::sync::Arc;

/// Source of one value per sensor per cycle.
///
/// Implementations own their retry and timeout behaviour; the coordinator only
/// sees the final outcome. Errors are per-sensor and never abort a cycle.
#[async_trait]
pub trait SampleFetcher: Send + Sync {
    /// Fetch the current value of `sensor`.
    async fn fetch(&self, sensor: SensorId) -> Result<f64, FetchError>;
}

#[async_trait]
impl<F> SampleFetcher for Arc<F>
where
    F: SampleFetcher + ?Sized,
{
    async fn fetch(&self, sensor: SensorId) -> Result<f64, FetchError> {
        (**self).fetch(sensor).await
    }
}
