//! Response bodies for each endpoint.
//!
//! Every route serializes one of these types (or `ErrorBody` on failure), so
//! success shapes stay fixed and testable.

use crate::db::bulk::{BulkDeleteOutcome, PartialFailureWarning};
use crate::diagnostics::DiagnosticReport;
use crate::models::JsonRow;
use serde::Serialize;

/// `GET /api/check-env`
#[derive(Debug, Clone, Serialize)]
pub struct EnvCheckResponse {
    pub env_vars: DiagnosticReport,
}

/// `DELETE /api/employees/delete-all`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: u64,
    /// Present when rows were deleted but the counter reset failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<PartialFailureWarning>,
}

impl DeleteAllResponse {
    pub fn from_outcome(outcome: BulkDeleteOutcome, subject: &str) -> Self {
        let message = match &outcome.warning {
            None => format!(
                "All {} deleted successfully ({} rows), ID counter reset",
                subject, outcome.deleted_count
            ),
            Some(_) => format!(
                "All {} deleted successfully ({} rows), ID counter was not reset",
                subject, outcome.deleted_count
            ),
        };
        Self {
            success: true,
            message,
            deleted_count: outcome.deleted_count,
            warning: outcome.warning,
        }
    }
}

/// `GET /api/employees`
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeListResponse {
    pub employees: Vec<JsonRow>,
}

/// `GET /api/employees/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeResponse {
    pub employee: JsonRow,
}

/// `GET /api/project-tasks`
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<JsonRow>,
}
