//! CRM Admin API Library
//!
//! HTTP endpoints for the CRM admin tool: health and environment
//! diagnostics, employee and project-task reads, and the bulk employee
//! reset, all backed by a single MySQL database.

pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod models;

pub use config::Config;
pub use error::ApiError;
pub use http::{AppState, build_router};
