#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use gst_component::CancellationToken;
use gst_daemon::{DaemonConfig, DaemonContext};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = DaemonConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gst_daemon=info")))
        .init();

    let ctx = Arc::new(DaemonContext::load(&config).context("failed to load daemon context")?);

    let addr = config.socket_addr().context("invalid bind address")?;
    let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "gst-daemon listening");

    let shutdown = CancellationToken::new();
    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
            ctrl_c_shutdown.cancel();
        }
    });

    gst_daemon::run(listener, ctx, shutdown).await;
    Ok(())
}
