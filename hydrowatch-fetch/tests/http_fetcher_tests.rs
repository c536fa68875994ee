// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::Result;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use hydrowatch_core::SensorId;
use hydrowatch_fetch::{
    decode_token, Endpoint, FetchError, HttpFetcher, HttpFetcherOptions, RetryPolicy,
    SampleFetcher, ValueRange,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Scripted responses per query string, plus the queries seen.
#[derive(Clone, Default)]
struct Script {
    responses: Arc<Mutex<HashMap<String, VecDeque<(StatusCode, String)>>>>,
    seen: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl Script {
    async fn push(&self, query: &str, status: StatusCode, body: &str) {
        self.responses
            .lock()
            .await
            .entry(query.to_owned())
            .or_default()
            .push_back((status, body.to_owned()));
    }

    async fn hits(&self, query: &str) -> usize {
        self.seen.lock().await.iter().filter(|q| *q == query).count()
    }
}

async fn respond(State(script): State<Script>, RawQuery(query): RawQuery) -> (StatusCode, String) {
    let query = query.unwrap_or_default();
    script.seen.lock().await.push(query.clone());
    if let Some(delay) = script.delay {
        tokio::time::sleep(delay).await;
    }
    script
        .responses
        .lock()
        .await
        .get_mut(&query)
        .and_then(VecDeque::pop_front)
        .unwrap_or((StatusCode::NOT_FOUND, String::new()))
}

async fn serve(script: Script) -> Result<String> {
    let app = Router::new()
        .route("/api/get", get(respond))
        .route("/api/isHardwareConnected", get(respond))
        .with_state(script);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api"))
}

fn fetcher(base: &str, options: HttpFetcherOptions) -> Result<HttpFetcher> {
    let endpoint = Endpoint::with_default_pins(base, decode_token("dG9rZW4=")?)?;
    Ok(HttpFetcher::new(endpoint, options)?)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::default()
        .with_base_delay(Duration::from_millis(10))
        .with_jitter(false)
}

fn options() -> HttpFetcherOptions {
    HttpFetcherOptions {
        request_timeout: Duration::from_secs(2),
        retry: fast_retry(),
        value_range: None,
    }
}

#[tokio::test]
async fn test_fetch_parses_trimmed_body_for_sensor_pin() -> Result<()> {
    let script = Script::default();
    script.push("token=token&V0", StatusCode::OK, " 412.5\n").await;
    script.push("token=token&V2", StatusCode::OK, "24.1").await;
    let fetcher = fetcher(&serve(script.clone()).await?, options())?;

    assert_eq!(fetcher.fetch(SensorId::Tds).await?, 412.5);
    assert_eq!(fetcher.fetch(SensorId::Temperature).await?, 24.1);
    Ok(())
}

#[tokio::test]
async fn test_status_failures_are_retried() -> Result<()> {
    let script = Script::default();
    script.push("token=token&V7", StatusCode::SERVICE_UNAVAILABLE, "").await;
    script.push("token=token&V7", StatusCode::INTERNAL_SERVER_ERROR, "").await;
    script.push("token=token&V7", StatusCode::OK, "6.9").await;
    let fetcher = fetcher(&serve(script.clone()).await?, options())?;

    assert_eq!(fetcher.fetch(SensorId::Ec).await?, 6.9);
    assert_eq!(script.hits("token=token&V7").await, 3);
    Ok(())
}

#[tokio::test]
async fn test_exhausted_attempts_report_last_status() -> Result<()> {
    let script = Script::default();
    for _ in 0..3 {
        script.push("token=token&V3", StatusCode::BAD_GATEWAY, "").await;
    }
    let fetcher = fetcher(&serve(script.clone()).await?, options())?;

    let err = fetcher.fetch(SensorId::Humidity).await.unwrap_err();

    assert_eq!(err, FetchError::http_status(502));
    assert_eq!(script.hits("token=token&V3").await, 3);
    Ok(())
}

#[tokio::test]
async fn test_non_numeric_body_is_not_retried() -> Result<()> {
    let script = Script::default();
    script.push("token=token&V0", StatusCode::OK, "Invalid token.").await;
    let fetcher = fetcher(&serve(script.clone()).await?, options())?;

    let err = fetcher.fetch(SensorId::Tds).await.unwrap_err();

    assert!(matches!(err, FetchError::Parse { ref body } if body == "Invalid token."));
    assert_eq!(script.hits("token=token&V0").await, 1);
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_value_is_rejected() -> Result<()> {
    let script = Script::default();
    script.push("token=token&V0", StatusCode::OK, "1500").await;
    let options = HttpFetcherOptions {
        value_range: Some(ValueRange::new(0.0, 1000.0)?),
        ..options()
    };
    let fetcher = fetcher(&serve(script.clone()).await?, options)?;

    let err = fetcher.fetch(SensorId::Tds).await.unwrap_err();

    assert_eq!(err, FetchError::invalid_range(1500.0, 0.0, 1000.0));
    assert_eq!(script.hits("token=token&V0").await, 1);
    Ok(())
}

#[tokio::test]
async fn test_slow_endpoint_times_out() -> Result<()> {
    let script = Script {
        delay: Some(Duration::from_millis(500)),
        ..Script::default()
    };
    script.push("token=token&V2", StatusCode::OK, "20").await;
    let options = HttpFetcherOptions {
        request_timeout: Duration::from_millis(50),
        retry: RetryPolicy::no_retry(),
        value_range: None,
    };
    let fetcher = fetcher(&serve(script).await?, options)?;

    let err = fetcher.fetch(SensorId::Temperature).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }));
    assert!(err.is_transient());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() -> Result<()> {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let options = HttpFetcherOptions {
        retry: RetryPolicy::no_retry(),
        ..options()
    };
    let fetcher = fetcher(&format!("http://{addr}/api"), options)?;

    let err = fetcher.fetch(SensorId::Ec).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
    Ok(())
}

#[tokio::test]
async fn test_hardware_probe() -> Result<()> {
    let script = Script::default();
    script.push("token=token", StatusCode::OK, "true").await;
    script.push("token=token", StatusCode::OK, "false\n").await;
    script.push("token=token", StatusCode::OK, "maybe").await;
    let fetcher = fetcher(&serve(script).await?, options())?;

    assert!(fetcher.hardware_connected().await?);
    assert!(!fetcher.hardware_connected().await?);
    assert!(matches!(
        fetcher.hardware_connected().await,
        Err(FetchError::Parse { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_usage_counts_url_and_body_bytes() -> Result<()> {
    let script = Script::default();
    script.push("token=token&V0", StatusCode::OK, "100").await;
    script.push("token=token&V7", StatusCode::OK, "6.5").await;
    script.push("token=token&V2", StatusCode::OK, "21").await;
    script.push("token=token&V3", StatusCode::SERVICE_UNAVAILABLE, "").await;
    let base = serve(script).await?;
    let fetcher = fetcher(&base, options())?;

    let report = fetcher.measure_usage().await;

    let url_len = format!("{base}/get?token=token&V0").len() as u64;
    assert_eq!(report.bytes_sent, url_len * 3);
    assert_eq!(report.bytes_received, 3 + 3 + 2);
    assert_eq!(report.failed, vec![SensorId::Humidity]);
    Ok(())
}
