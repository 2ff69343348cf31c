//! Data models for the CRM admin API.
//!
//! This module re-exports all model types used throughout the application.

pub mod health;
pub mod query;
pub mod responses;

// Re-export commonly used types
pub use health::{HealthResponse, HealthStatus};
pub use query::{JsonRow, MutationSummary, QueryParam, QueryResult};
pub use responses::{
    DeleteAllResponse, EmployeeListResponse, EmployeeResponse, EnvCheckResponse,
    TaskListResponse,
};
