//! Route handlers.
//!
//! Each handler opens its own connection through the provider, which closes
//! it before the handler returns. Errors are redacted and logged here, at the
//! handler boundary, and rendered as `{"error": ...}`.

use crate::db::{Statement, TableName, delete_all_and_reset};
use crate::diagnostics::{report_environment, report_health};
use crate::error::{ApiError, DbResult, redact_text};
use crate::http::AppState;
use crate::models::{
    DeleteAllResponse, EmployeeListResponse, EmployeeResponse, EnvCheckResponse, HealthResponse,
    JsonRow, QueryParam, TaskListResponse,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const EMPLOYEES_TABLE: &str = "employees";

/// Redact and log an error on its way out.
fn fail(state: &AppState, route: &'static str, err: ApiError) -> ApiError {
    let err = err.redact(state.secret());
    error!(route, status = err.status_code().as_u16(), error = %err, "Request failed");
    err
}

async fn fetch_all(state: &AppState, statement: Statement) -> DbResult<Vec<JsonRow>> {
    let executor = state.provider.executor();
    state
        .provider
        .with_connection(move |conn| {
            Box::pin(async move { executor.fetch_rows(conn, &statement).await })
        })
        .await
}

/// `GET /api/health`
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let status = report_health(&state.provider, state.secret()).await;
    let code = if status.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (code, Json(HealthResponse::from(&status)))
}

/// `GET /api/check-env`
pub async fn check_env(State(state): State<Arc<AppState>>) -> Json<EnvCheckResponse> {
    Json(EnvCheckResponse {
        env_vars: report_environment(&state.env),
    })
}

/// `DELETE /api/employees/delete-all`
///
/// No authentication or confirmation gate guards this route.
pub async fn delete_all_employees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeleteAllResponse>, ApiError> {
    const ROUTE: &str = "delete-all-employees";

    let table = TableName::new(EMPLOYEES_TABLE).map_err(|e| fail(&state, ROUTE, e))?;
    info!(table = %table, "Deleting all rows");

    let executor = state.provider.executor();
    let outcome = state
        .provider
        .with_connection(move |conn| {
            Box::pin(async move { delete_all_and_reset(&executor, conn, &table).await })
        })
        .await
        .map_err(|e| fail(&state, ROUTE, e))?;

    let mut response = DeleteAllResponse::from_outcome(outcome, EMPLOYEES_TABLE);
    if let Some(warning) = response.warning.as_mut() {
        warning.message = redact_text(&warning.message, state.secret());
        warn!(
            deleted_count = response.deleted_count,
            warning = %warning.message,
            "Delete-all finished with a partial failure"
        );
    }
    Ok(Json(response))
}

/// `GET /api/employees`
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EmployeeListResponse>, ApiError> {
    const ROUTE: &str = "list-employees";

    let statement = Statement::new("SELECT * FROM employees ORDER BY id", Vec::new())
        .map_err(|e| fail(&state, ROUTE, e))?;
    let employees = fetch_all(&state, statement)
        .await
        .map_err(|e| fail(&state, ROUTE, e))?;
    Ok(Json(EmployeeListResponse { employees }))
}

/// `GET /api/employees/{id}`
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    const ROUTE: &str = "get-employee";

    let id: i64 = id.parse().map_err(|_| {
        fail(
            &state,
            ROUTE,
            ApiError::invalid_input(format!("Employee id must be an integer, got '{}'", id)),
        )
    })?;

    let statement = Statement::new(
        "SELECT * FROM employees WHERE id = ?",
        vec![QueryParam::Int(id)],
    )
    .map_err(|e| fail(&state, ROUTE, e))?;

    let rows = fetch_all(&state, statement)
        .await
        .map_err(|e| fail(&state, ROUTE, e))?;
    let employee = rows.into_iter().next().ok_or_else(|| {
        fail(
            &state,
            ROUTE,
            ApiError::not_found(format!("Employee {} not found", id)),
        )
    })?;
    Ok(Json(EmployeeResponse { employee }))
}

/// `GET /api/project-tasks`
pub async fn list_project_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TaskListResponse>, ApiError> {
    const ROUTE: &str = "list-project-tasks";

    let statement = Statement::new("SELECT * FROM project_tasks ORDER BY id", Vec::new())
        .map_err(|e| fail(&state, ROUTE, e))?;
    let tasks = fetch_all(&state, statement)
        .await
        .map_err(|e| fail(&state, ROUTE, e))?;
    Ok(Json(TaskListResponse { tasks }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
