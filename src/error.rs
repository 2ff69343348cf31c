//! Error types for the CRM admin API.
//!
//! All failures that can reach a handler boundary are expressed as [`ApiError`].
//! Each variant maps to a fixed HTTP status and renders as a JSON body with a
//! human-readable `error` field. Driver errors are classified in
//! `From<sqlx::Error>`; credentials are scrubbed with [`ApiError::redact`]
//! before an error is rendered.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Placeholder substituted for secrets found in error messages.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Query failed: {message}")]
    Query {
        /// SQL state (e.g. "42S02" for an unknown table) when the driver reports one.
        code: Option<String>,
        message: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code,
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// SQL state reported by the driver, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status this error is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Connection { .. }
            | Self::Query { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Replace every occurrence of `secret` in the error's text fields.
    ///
    /// Empty secrets are ignored, an empty password would otherwise match
    /// between every character.
    pub fn redact(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        let scrub = |s: String| redact_text(&s, secret);
        match self {
            Self::Connection {
                message,
                suggestion,
            } => Self::Connection {
                message: scrub(message),
                suggestion: scrub(suggestion),
            },
            Self::Query { code, message } => Self::Query {
                code,
                message: scrub(message),
            },
            Self::Timeout {
                operation,
                elapsed_secs,
            } => Self::Timeout {
                operation: scrub(operation),
                elapsed_secs,
            },
            Self::InvalidInput { message } => Self::InvalidInput {
                message: scrub(message),
            },
            Self::NotFound { message } => Self::NotFound {
                message: scrub(message),
            },
            Self::Internal { message } => Self::Internal {
                message: scrub(message),
            },
        }
    }
}

/// Convert sqlx errors to ApiError.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => ApiError::connection(
                msg.to_string(),
                "Check the DB_HOST, DB_PORT, DB_USER and DB_NAME settings",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                ApiError::query(code, db_err.message())
            }
            sqlx::Error::RowNotFound => ApiError::not_found("No rows returned"),
            sqlx::Error::PoolTimedOut => ApiError::timeout("connection acquire", 30),
            sqlx::Error::PoolClosed => {
                ApiError::connection("Connection is closed", "Open a new connection")
            }
            sqlx::Error::Io(io_err) => ApiError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => ApiError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => ApiError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                ApiError::query(None, format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => ApiError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                ApiError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => ApiError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => ApiError::internal("Database worker crashed"),
            _ => ApiError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Replace every occurrence of `secret` in `text` with [`REDACTED`].
pub fn redact_text(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, REDACTED)
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, ApiError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
