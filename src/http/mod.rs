//! HTTP layer.
//!
//! - `cors`: path-prefix CORS edge filter
//! - `handlers`: one function per route
//! - `server`: listener, graceful shutdown

pub mod cors;
pub mod handlers;
pub mod server;

pub use cors::{CorsPolicy, FilterState, cors_middleware};
pub use server::HttpServer;

use crate::config::Config;
use crate::db::ConnectionProvider;
use crate::diagnostics::EnvSnapshot;
use axum::Router;
use axum::middleware;
use axum::routing::{delete, get};
use std::sync::Arc;

/// Immutable state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: ConnectionProvider,
    pub env: EnvSnapshot,
}

impl AppState {
    pub fn new(provider: ConnectionProvider, env: EnvSnapshot) -> Self {
        Self { provider, env }
    }

    pub fn from_config(config: &Config) -> Self {
        let provider = ConnectionProvider::new(
            config.database_settings(),
            config.connect_timeout_duration(),
            config.query_timeout_duration(),
        );
        Self::new(provider, config.env_snapshot())
    }

    /// Value scrubbed from every error message leaving a handler.
    pub fn secret(&self) -> &str {
        &self.provider.settings().password
    }
}

/// Build the application router with the CORS filter around every route.
pub fn build_router(state: Arc<AppState>, cors: CorsPolicy) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/check-env", get(handlers::check_env))
        .route("/api/employees", get(handlers::list_employees))
        .route(
            "/api/employees/delete-all",
            delete(handlers::delete_all_employees),
        )
        .route("/api/employees/{id}", get(handlers::get_employee))
        .route("/api/project-tasks", get(handlers::list_project_tasks))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            Arc::new(cors),
            cors_middleware,
        ))
}
