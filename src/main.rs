//! CRM Admin API - Main entry point.

use crm_admin_api::config::Config;
use crm_admin_api::http::{AppState, CorsPolicy, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    init_tracing(&config);

    info!("Starting CRM Admin API v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.db_port_number() {
        warn!(error = %e, "Falling back to the default database port");
    }

    // No connection is opened here; every request opens its own
    let state = Arc::new(AppState::from_config(&config));
    state.provider.log_target();

    let server = HttpServer::new(
        state,
        CorsPolicy::new(&config.cors_path_prefix),
        &config.http_host,
        config.http_port,
    );

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
