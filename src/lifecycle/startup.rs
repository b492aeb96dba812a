//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: an unusable root or a failed bind is fatal
//! - A metrics exporter that cannot start is logged, not fatal
//! - Listener binds last (traffic only when ready)

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ServerConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::renderer::InspectRenderer;

/// Fatal errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot serve root {root}: {source}")]
    Root { root: String, source: io::Error },

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Run the server until SIGINT/SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    let _signals = signals::spawn_signal_handler(shutdown.clone());
    run_until(config, shutdown).await
}

/// Run the server until `shutdown` is triggered.
pub async fn run_until(config: ServerConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.socket_address();
    let root = config.root.display().to_string();

    let renderer = Arc::new(InspectRenderer::new(config.renderer.max_file_bytes));
    let server = HttpServer::new(config, renderer)
        .map_err(|source| StartupError::Root { root, source })?;

    tracing::info!(
        root = %server.config().root.display(),
        cache_ttl_secs = server.config().cache.ttl_secs,
        request_timeout_secs = server.config().timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();

        let mut config = ServerConfig::default();
        config.root = dir.path().to_path_buf();
        config.listener.bind_address = taken.local_addr().unwrap().to_string();

        let err = run_until(config, Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let mut config = ServerConfig::default();
        config.root = "/no/such/profile/root".into();
        config.listener.bind_address = "127.0.0.1:0".to_string();

        let err = run_until(config, Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Root { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_stops_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.root = dir.path().to_path_buf();
        config.listener.bind_address = "127.0.0.1:0".to_string();

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(run_until(config, shutdown.clone()));

        // Wait until the server has subscribed before triggering.
        for _ in 0..100 {
            if shutdown.receiver_count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
