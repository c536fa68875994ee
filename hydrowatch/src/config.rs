// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Startup configuration.
//!
//! [`Args`] is what the command line and environment supply; [`MonitorConfig`]
//! is the validated form. Every rejection is a [`ConfigError`], which the
//! binary turns into exit status 2.

use clap::Parser;
use hydrowatch_core::{ReadinessPolicy, SensorId};
use hydrowatch_error::ConfigError;
use hydrowatch_exec::{CoordinatorOptions, GatingPolicy};
use hydrowatch_fetch::endpoint::DEFAULT_BASE_URL;
use hydrowatch_fetch::{decode_token, Endpoint, HttpFetcherOptions, RetryPolicy, ValueRange};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "hydrowatch", about = "Water-quality sensor sampler", version)]
pub struct Args {
    /// Telemetry auth token, base64-encoded (raw tokens are accepted with a warning)
    #[arg(long, env = "BLYNK_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Telemetry API base URL
    #[arg(long, env = "HYDRO_ENDPOINT", default_value = DEFAULT_BASE_URL)]
    pub endpoint: String,

    /// Sensor to pin mapping
    #[arg(long, env = "HYDRO_PINS", default_value = "TDS=V0,EC=V7,Temperature=V2,Humidity=V3")]
    pub pins: String,

    /// Values kept per sensor
    #[arg(long, env = "HYDRO_CAPACITY", default_value_t = 200)]
    pub capacity: usize,

    /// Sampling period in milliseconds
    #[arg(long, env = "HYDRO_POLL_INTERVAL_MS", default_value_t = 3000)]
    pub poll_interval_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "HYDRO_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,

    /// Attempts per sensor fetch, first included
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Fetches allowed in flight at once
    #[arg(long, default_value_t = 10)]
    pub max_concurrency: usize,

    /// Commit a cycle only when these thresholds hold, e.g. `TDS>18,EC>6.28`
    #[arg(long, env = "HYDRO_GATE")]
    pub gate: Option<String>,

    /// When statistics become available: `all-full` or `per-sensor`
    #[arg(long, default_value = "all-full")]
    pub readiness: String,

    /// Reject values outside `MIN..MAX`
    #[arg(long)]
    pub value_range: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Log approximate network usage at this period (milliseconds)
    #[arg(long)]
    pub usage_interval_ms: Option<u64>,

    /// Refuse to start when the device reports it is offline
    #[arg(long)]
    pub require_device: bool,

    /// How long shutdown waits for the cycle in flight (milliseconds)
    #[arg(long, default_value_t = 5000)]
    pub shutdown_grace_ms: u64,

    /// Single-line log output
    #[arg(long, env = "HYDRO_LOG_COMPACT")]
    pub log_compact: bool,

    /// Disable ANSI colours in log output
    #[arg(long)]
    pub no_ansi: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub endpoint: Endpoint,
    pub capacity: NonZeroUsize,
    pub poll_interval: Duration,
    pub fetch: HttpFetcherOptions,
    pub coordinator: CoordinatorOptions,
    pub port: u16,
    pub usage_interval: Option<Duration>,
    pub require_device: bool,
    pub shutdown_grace: Duration,
}

impl TryFrom<Args> for MonitorConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let raw_token = args
            .auth_token
            .as_deref()
            .ok_or_else(|| ConfigError::missing("BLYNK_AUTH_TOKEN"))?;
        let token = decode_token(raw_token)?;
        let endpoint = Endpoint::new(&args.endpoint, token, parse_pins(&args.pins)?)?;

        let capacity = NonZeroUsize::new(args.capacity)
            .ok_or_else(|| ConfigError::invalid_value("capacity", "must be greater than zero"))?;
        let poll_interval = positive_millis("poll-interval-ms", args.poll_interval_ms)?;
        let request_timeout = positive_millis("request-timeout-ms", args.request_timeout_ms)?;
        if args.max_attempts == 0 {
            return Err(ConfigError::invalid_value("max-attempts", "must be at least 1"));
        }
        if args.max_concurrency == 0 {
            return Err(ConfigError::invalid_value("max-concurrency", "must be at least 1"));
        }

        let gating = match args.gate.as_deref() {
            Some(raw) => raw.parse::<GatingPolicy>()?,
            None => GatingPolicy::disabled(),
        };
        let readiness = args.readiness.parse::<ReadinessPolicy>()?;
        let value_range = args
            .value_range
            .as_deref()
            .map(str::parse::<ValueRange>)
            .transpose()?;
        let usage_interval = args
            .usage_interval_ms
            .map(|ms| positive_millis("usage-interval-ms", ms))
            .transpose()?;

        Ok(Self {
            endpoint,
            capacity,
            poll_interval,
            fetch: HttpFetcherOptions {
                request_timeout,
                retry: RetryPolicy::default().with_attempts(args.max_attempts),
                value_range,
            },
            coordinator: CoordinatorOptions {
                max_concurrency: args.max_concurrency,
                gating,
                readiness,
            },
            port: args.port,
            usage_interval,
            require_device: args.require_device,
            shutdown_grace: Duration::from_millis(args.shutdown_grace_ms),
        })
    }
}

/// Parses `SENSOR=PIN,...`. Later entries override earlier ones.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for a malformed entry or unknown sensor.
pub fn parse_pins(raw: &str) -> Result<BTreeMap<SensorId, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (sensor, pin) = entry.split_once('=').ok_or_else(|| {
                ConfigError::invalid_value("pins", format!("expected SENSOR=PIN, got `{entry}`"))
            })?;
            let pin = pin.trim();
            if pin.is_empty() {
                return Err(ConfigError::invalid_value("pins", format!("empty pin in `{entry}`")));
            }
            Ok((sensor.parse::<SensorId>()?, pin.to_owned()))
        })
        .collect()
}

fn positive_millis(name: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::invalid_value(name, "must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}
