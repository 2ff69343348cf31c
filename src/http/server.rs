//! HTTP server for the CRM admin API.

use crate::error::{ApiError, DbResult};
use crate::http::{AppState, CorsPolicy, build_router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// HTTP server bound to one address.
pub struct HttpServer {
    state: Arc<AppState>,
    cors: CorsPolicy,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
}

impl HttpServer {
    /// Create a new HTTP server.
    ///
    /// # Arguments
    ///
    /// * `state` - Shared state handed to every handler
    /// * `cors` - Which paths receive CORS headers
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    pub fn new(state: Arc<AppState>, cors: CorsPolicy, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            cors,
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        let app = build_router(self.state.clone(), self.cors.clone());

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            ApiError::internal(format!(
                "Failed to bind HTTP listener to {}: {}",
                bind_addr, e
            ))
        })?;

        info!(
            addr = %bind_addr,
            cors_prefix = %self.cors.path_prefix(),
            "HTTP server listening"
        );

        // Requests are short-lived, so in-flight ones are simply allowed to finish
        match axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_signal())
            .await
        {
            Ok(()) => info!("HTTP server stopped"),
            Err(e) => {
                error!(error = %e, "HTTP server error");
                return Err(ApiError::internal(format!("HTTP server error: {}", e)));
            }
        }

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
