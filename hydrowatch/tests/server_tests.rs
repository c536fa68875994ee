// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::Result;
use hydrowatch::prelude::*;
use hydrowatch_exec::SamplerHealth;
use hydrowatch_test_utils::fixtures::store;
use hydrowatch_test_utils::ConstantFetcher;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const CAPACITY: usize = 2;

struct TestServer {
    base: String,
    coordinator: Arc<SampleCoordinator>,
    health: Arc<SamplerHealth>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Result<Self> {
        let hub = Arc::new(SnapshotHub::new(&SensorId::ALL, CAPACITY));
        let coordinator = Arc::new(SampleCoordinator::new(
            Arc::new(ConstantFetcher::all(4.0)),
            Arc::new(store(CAPACITY)),
            hub,
            CoordinatorOptions::default(),
        ));
        let health = Arc::new(SamplerHealth::new());

        let app = router(AppState::new(coordinator.clone(), health.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base: format!("http://{addr}"),
            coordinator,
            health,
            client: reqwest::Client::new(),
        })
    }

    async fn get_json(&self, path: &str) -> Result<(u16, Value)> {
        let response = self.client.get(format!("{}{path}", self.base)).send().await?;
        let status = response.status().as_u16();
        Ok((status, serde_json::from_str(&response.text().await?)?))
    }
}

#[tokio::test]
async fn test_snapshot_reflects_cycles() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.get_json("/api/snapshot").await?;
    assert_eq!(status, 200);
    assert_eq!(body["allReady"], false);
    assert_eq!(body["dataCount"]["TDS"], 0);

    server.coordinator.run_cycle().await;
    server.coordinator.run_cycle().await;

    let (_, body) = server.get_json("/api/snapshot").await?;
    assert_eq!(body["allReady"], true);
    assert_eq!(body["cycleCount"], 2);
    assert_eq!(body["perSensor"]["EC"]["readings"], serde_json::json!([4.0, 4.0]));
    assert_eq!(body["perSensor"]["EC"]["stats"]["mean"], 4.0);
    Ok(())
}

#[tokio::test]
async fn test_reset_clears_history() -> Result<()> {
    let server = TestServer::start().await?;
    server.coordinator.run_cycle().await;

    for _ in 0..2 {
        let response = server
            .client
            .post(format!("{}/api/reset", server.base))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = serde_json::from_str(&response.text().await?)?;
        assert_eq!(body["cycleCount"], 0);
        assert_eq!(body["dataCount"]["Humidity"], 0);
    }

    let (_, body) = server.get_json("/api/snapshot").await?;
    assert_eq!(body["dataCount"]["TDS"], 0);
    Ok(())
}

#[tokio::test]
async fn test_health_reports_sampler_state() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.get_json("/health").await?;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "stopped");

    server.health.set_running(true);
    let result = server.coordinator.run_cycle().await;
    server.health.record(&result);

    let (status, body) = server.get_json("/health").await?;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sampler"]["cyclesRun"], 1);
    assert_eq!(body["sampler"]["lastOutcome"], "committed");
    assert_eq!(body["cycleCount"], 1);
    Ok(())
}

async fn read_until(
    response: &mut reqwest::Response,
    received: &mut String,
    needle: &str,
) -> Result<()> {
    while !received.contains(needle) {
        let chunk = tokio::time::timeout(Duration::from_secs(2), response.chunk()).await??;
        let Some(chunk) = chunk else {
            anyhow::bail!("stream ended before `{needle}`: {received}");
        };
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    Ok(())
}

#[tokio::test]
async fn test_event_stream_starts_with_current_snapshot() -> Result<()> {
    let server = TestServer::start().await?;
    let mut response = server
        .client
        .get(format!("{}/api/events", server.base))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);

    let mut received = String::new();
    read_until(&mut response, &mut received, "event: current").await?;

    server.coordinator.run_cycle().await;
    read_until(&mut response, &mut received, "event: cycle").await?;

    assert!(received.contains("\"kind\":\"cycle\""), "{received}");
    Ok(())
}

#[tokio::test]
async fn test_event_stream_unavailable_after_close() -> Result<()> {
    let server = TestServer::start().await?;
    server.coordinator.hub().close();

    let (status, body) = server.get_json("/api/events").await?;

    assert_eq!(status, 503);
    assert_eq!(body["error"], "broadcaster is closed");
    Ok(())
}
