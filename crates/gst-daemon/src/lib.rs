//! Mock 5250 session server (C14): loads a screen catalog and a
//! navigation config once at startup, then accepts TN5250 connections
//! and drives each one through [`session::handle_session`].

#![deny(unsafe_code)]

pub mod loan_store;
mod reader;
mod session;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gst_catalog::ScreenCatalog;
use gst_error::{ErrorCode, GstError};
use gst_transition::NavigationConfig;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub use loan_store::LoanStore;
pub use session::handle_session;

/// Daemon startup configuration: bind address plus the paths to the
/// screen catalog, navigation config, and (optional) loan data store.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "gst-daemon", version, about = "Mock 5250 session server")]
pub struct DaemonConfig {
    /// Address to bind the TN5250 listener to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,
    /// Port to bind the TN5250 listener to.
    #[arg(long, default_value_t = 5250)]
    pub port: u16,
    /// Path to a screen catalog file or directory.
    #[arg(long)]
    pub catalog_path: PathBuf,
    /// Path to the navigation config JSON file.
    #[arg(long)]
    pub navigation_config: PathBuf,
    /// Path to an optional loan data store JSON file.
    #[arg(long)]
    pub loan_store: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, GstError> {
        format!("{}:{}", self.bind, self.port).parse().map_err(|e| {
            GstError::new(ErrorCode::ConfigError, format!("invalid bind address: {}:{}", self.bind, self.port)).with_source(e)
        })
    }
}

/// Everything a session needs to run, loaded once and shared (via `Arc`)
/// across every connection.
pub struct DaemonContext {
    pub catalog: ScreenCatalog,
    pub nav_config: Arc<NavigationConfig>,
    pub loan_store: Arc<LoanStore>,
}

impl DaemonContext {
    pub fn load(config: &DaemonConfig) -> Result<Self, GstError> {
        let catalog = if config.catalog_path.is_dir() {
            ScreenCatalog::load_dir(&config.catalog_path)?
        } else {
            ScreenCatalog::load_file(&config.catalog_path)?
        };

        let nav_text = std::fs::read_to_string(&config.navigation_config).map_err(|e| {
            GstError::new(
                ErrorCode::ConfigError,
                format!("failed to read navigation config: {}", config.navigation_config.display()),
            )
            .with_source(e)
        })?;
        let nav_config = NavigationConfig::from_json(&nav_text)?;

        let loan_store = match &config.loan_store {
            Some(path) => LoanStore::load(path)?,
            None => LoanStore::empty(),
        };

        Ok(Self {
            catalog,
            nav_config: Arc::new(nav_config),
            loan_store: Arc::new(loan_store),
        })
    }
}

/// Accept loop: one spawned task per connection, racing a shutdown
/// signal the same way a raw TCP server elsewhere in this workspace's
/// sibling repos drives its own accept loop — `tokio::select!` between
/// `listener.accept()` and the cancellation, never awaiting a connection
/// inline.
pub async fn run(listener: TcpListener, ctx: Arc<DaemonContext>, shutdown: gst_component::CancellationToken) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            session::handle_session(socket, peer, ctx).await;
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
                }
            }
            () = shutdown.cancelled() => {
                tracing::info!("shutdown signal received, accept loop exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_addr_parses_bind_and_port() {
        let config = DaemonConfig {
            bind: "127.0.0.1".into(),
            port: 5251,
            catalog_path: "catalog.json".into(),
            navigation_config: "nav.json".into(),
            loan_store: None,
        };
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:5251".parse().unwrap());
    }

    #[test]
    fn invalid_bind_address_is_a_config_error() {
        let config = DaemonConfig {
            bind: "not-an-address".into(),
            port: 5251,
            catalog_path: "catalog.json".into(),
            navigation_config: "nav.json".into(),
            loan_store: None,
        };
        assert_eq!(config.socket_addr().unwrap_err().code, ErrorCode::ConfigError);
    }
}
