// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The production [`SampleFetcher`]: HTTP GET against the telemetry endpoint.

use crate::endpoint::Endpoint;
use crate::fetcher::SampleFetcher;
use crate::parse::{parse_reading, ValueRange};
use crate::retry::{retry, RetryPolicy};
use crate::usage::UsageReport;
use async_trait::async_trait;
use hydrowatch_core::{debug, warn, SensorId};
use hydrowatch_error::{ConfigError, FetchError};
use reqwest::{Client, Url};
use std::time::Duration;

/// Tunables for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    /// Deadline for one request, connection included.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Reject parsed values outside this range.
    pub value_range: Option<ValueRange>,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            value_range: None,
        }
    }
}

/// Fetches sensor values over HTTP.
pub struct HttpFetcher {
    client: Client,
    endpoint: Endpoint,
    options: HttpFetcherOptions,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the HTTP client cannot be built.
    pub fn new(endpoint: Endpoint, options: HttpFetcherOptions) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| ConfigError::invalid_value("http-client", e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            options,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// One GET; the raw body of a 2xx response.
    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        let timeout = self.options.request_timeout;
        let request = async {
            let response = self.client.get(url).send().await.map_err(|e| classify(&e, timeout))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::http_status(status.as_u16()));
            }
            response.text().await.map_err(|e| classify(&e, timeout))
        };

        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| FetchError::timeout(timeout))?
    }

    async fn fetch_once(&self, sensor: SensorId) -> Result<f64, FetchError> {
        let url = self
            .endpoint
            .sample_url(sensor)
            .ok_or_else(|| FetchError::transport(format!("no pin mapped for {sensor}")))?;

        let body = self.get_text(url).await?;
        let value = parse_reading(&body)?;
        match &self.options.value_range {
            Some(range) => range.check(value),
            None => Ok(value),
        }
    }

    /// Asks the endpoint whether the device is online.
    ///
    /// # Errors
    ///
    /// Transport, timeout and status failures as for [`fetch`](SampleFetcher::fetch);
    /// [`FetchError::Parse`] if the body is neither `true` nor `false`.
    pub async fn hardware_connected(&self) -> Result<bool, FetchError> {
        let body = self.get_text(self.endpoint.hardware_url()).await?;
        match body.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(FetchError::parse(other)),
        }
    }

    /// Requests every sensor once, without retries, and totals the traffic.
    ///
    /// Sensors whose request fails are listed in the report and excluded from
    /// the byte counts.
    pub async fn measure_usage(&self) -> UsageReport {
        let mut report = UsageReport::default();
        for sensor in SensorId::ALL {
            let Some(url) = self.endpoint.sample_url(sensor) else {
                report.record_failure(sensor);
                continue;
            };
            let sent = url.as_str().len();
            match self.get_text(url).await {
                Ok(body) => report.record(sent, body.len()),
                Err(err) => {
                    warn!("Usage probe for {} failed: {}", sensor, err);
                    report.record_failure(sensor);
                }
            }
        }
        report
    }
}

#[async_trait]
impl SampleFetcher for HttpFetcher {
    async fn fetch(&self, sensor: SensorId) -> Result<f64, FetchError> {
        retry(&self.options.retry, |attempt| async move {
            let result = self.fetch_once(sensor).await;
            if let Err(err) = &result {
                debug!("{} attempt {} failed: {}", sensor, attempt, err);
            }
            result
        })
        .await
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::timeout(timeout)
    } else if let Some(status) = err.status() {
        FetchError::http_status(status.as_u16())
    } else {
        FetchError::transport(err.to_string())
    }
}
