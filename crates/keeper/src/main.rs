// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use keeper_core::bus::EventBus;
use keeper_core::mux::tmux::TmuxAdapter;
use keeper_core::mux::MultiplexerAdapter;
use keeper_core::respawn::{HttpIdleOracle, IdleOracle};
use keeper_core::{Supervisor, SupervisorConfig};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use keeperd::config::Config;
use keeperd::logging::init_tracing;
use keeperd::transport::{build_health_router, build_router, AppState};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }
    init_tracing(&config);

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn build_mux(backend: &str) -> anyhow::Result<Arc<dyn MultiplexerAdapter>> {
    match backend {
        "tmux" => Ok(Arc::new(TmuxAdapter::new())),
        other => anyhow::bail!("multiplexer backend not yet implemented: {other}"),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let mux = build_mux(&config.mux)?;
    let oracle: Option<Arc<dyn IdleOracle>> = config
        .oracle_url
        .as_ref()
        .map(|url| Arc::new(HttpIdleOracle::new(url.clone(), config.oracle_api_key.clone(), Duration::from_millis(config.oracle_timeout_ms))) as Arc<dyn IdleOracle>);

    let bus = EventBus::new();
    let supervisor = Supervisor::new(
        SupervisorConfig { state_dir: config.state_dir.clone(), max_sessions: config.max_sessions, mux, oracle },
        bus.clone(),
    )
    .await?;

    // Startup reconciliation must finish before the listening socket opens
    // so no client can observe a half-recovered session set.
    supervisor.reconcile_on_startup().await?;

    let state = Arc::new(AppState {
        supervisor: Arc::clone(&supervisor),
        bus: Arc::clone(&bus),
        auth_token: config.auth_token.clone(),
        shutdown: shutdown.clone(),
    });

    {
        let bus = Arc::clone(&bus);
        let sd = shutdown.clone();
        tokio::spawn(async move { bus.run(sd).await });
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP listening on {}", listener.local_addr()?);
    {
        let router = build_router(Arc::clone(&state));
        let sd = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(sd.cancelled_owned()).await {
                error!("HTTP server error: {e}");
            }
        });
    }

    if let Some(health_port) = config.health_port {
        let addr = format!("{}:{}", config.host, health_port);
        let listener = TcpListener::bind(&addr).await?;
        info!("health probe listening on {addr}");
        let router = build_health_router(Arc::clone(&state));
        let sd = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(sd.cancelled_owned()).await {
                error!("health server error: {e}");
            }
        });
    }

    spawn_signal_handler(shutdown.clone());

    shutdown.cancelled().await;
    // Give the graceful-shutdown servers a moment to drain in-flight
    // requests before the runtime drops their tasks.
    tokio::time::sleep(Duration::from_millis(200)).await;
    supervisor.shutdown().await;
    Ok(())
}

/// First SIGTERM/SIGINT starts a graceful shutdown; a second forces exit.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async { if let Some(s) = sigterm.as_mut() { s.recv().await } else { std::future::pending().await } } => {
                info!("received SIGTERM");
            }
            _ = async { if let Some(s) = sigint.as_mut() { s.recv().await } else { std::future::pending().await } } => {
                info!("received SIGINT");
            }
        }
        shutdown.cancel();

        tokio::select! {
            _ = async { if let Some(s) = sigterm.as_mut() { s.recv().await } else { std::future::pending().await } } => {
                info!("received SIGTERM again, forcing exit");
            }
            _ = async { if let Some(s) = sigint.as_mut() { s.recv().await } else { std::future::pending().await } } => {
                info!("received SIGINT again, forcing exit");
            }
        }
        std::process::exit(130);
    });
}
