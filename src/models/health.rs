//! Health status models.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Database liveness as seen by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Ok { timestamp: DateTime<Utc> },
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl HealthStatus {
    pub fn ok_now() -> Self {
        Self::Ok {
            timestamp: Utc::now(),
        }
    }

    pub fn error_now(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Ok { timestamp } | Self::Error { timestamp, .. } => *timestamp,
        }
    }
}

/// Wire shape of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// ISO-8601, UTC, millisecond precision.
    pub timestamp: String,
}

impl From<&HealthStatus> for HealthResponse {
    fn from(status: &HealthStatus) -> Self {
        let timestamp = status
            .timestamp()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        match status {
            HealthStatus::Ok { .. } => Self {
                status: "ok",
                database: "connected",
                message: None,
                timestamp,
            },
            HealthStatus::Error { message, .. } => Self {
                status: "error",
                database: "disconnected",
                message: Some(message.clone()),
                timestamp,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ok_response_shape() {
        let status = HealthStatus::Ok {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(HealthResponse::from(&status)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "ok",
                "database": "connected",
                "timestamp": "2026-10-15T08:30:00.000Z",
            })
        );
    }

    #[test]
    fn test_error_response_shape() {
        let status = HealthStatus::error_now("Connection failed: refused");
        assert!(!status.is_ok());
        let response = HealthResponse::from(&status);
        assert_eq!(response.status, "error");
        assert_ne!(response.database, "connected");
        assert_eq!(response.message.as_deref(), Some("Connection failed: refused"));
        assert!(response.timestamp.ends_with('Z'));
    }
}
