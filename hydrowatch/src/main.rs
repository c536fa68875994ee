// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::Context;
use clap::Parser;
use hydrowatch::app::Monitor;
use hydrowatch::config::{Args, MonitorConfig};
use hydrowatch::HydroError;
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::{error, info};

const CONFIG_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_compact, !args.no_ansi);

    let config = match MonitorConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {err}");
            return ExitCode::from(CONFIG_EXIT);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            match err.downcast_ref::<HydroError>() {
                Some(hydro) if hydro.is_fatal() => ExitCode::from(CONFIG_EXIT),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn init_tracing(compact: bool, ansi: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(ansi);

    if compact {
        builder.compact().init();
    } else {
        builder.init();
    }
}

async fn run(config: MonitorConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let monitor = Monitor::new(config)?;
    monitor.probe_device().await.context("device check failed")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    monitor
        .serve(listener, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {err}");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Stopped");
    Ok(())
}
