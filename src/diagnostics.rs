//! Environment and health diagnostics.
//!
//! The environment report shows which settings the process was started
//! with. Values are classified before they are rendered:
//! - secrets show at most [`SECRET_PREFIX_CHARS`] characters followed by `...`
//! - presence-only keys show `SET` or `NOT_SET`, never the value
//! - everything else is shown verbatim
//!
//! Unset keys render as `NOT_SET` regardless of class.

use crate::db::ConnectionProvider;
use crate::models::HealthStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

pub const NOT_SET: &str = "NOT_SET";
pub const SET: &str = "SET";
pub const SECRET_PREFIX_CHARS: usize = 5;
const ELLIPSIS: &str = "...";

/// How a configuration key may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Plain,
    Secret,
    PresenceOnly,
}

/// Raw configuration values captured at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub db_host: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
    pub db_port: Option<String>,
    pub node_env: Option<String>,
    pub jwt_secret: Option<String>,
}

impl EnvSnapshot {
    /// Key, exposure class and value for every reported setting.
    fn entries(&self) -> [(&'static str, Exposure, Option<&str>); 7] {
        [
            ("DB_HOST", Exposure::Plain, self.db_host.as_deref()),
            ("DB_USER", Exposure::Plain, self.db_user.as_deref()),
            ("DB_PASSWORD", Exposure::Secret, self.db_password.as_deref()),
            ("DB_NAME", Exposure::Plain, self.db_name.as_deref()),
            ("DB_PORT", Exposure::Plain, self.db_port.as_deref()),
            ("NODE_ENV", Exposure::Plain, self.node_env.as_deref()),
            ("JWT_SECRET", Exposure::PresenceOnly, self.jwt_secret.as_deref()),
        ]
    }
}

/// Configuration key to rendered value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticReport(BTreeMap<String, String>);

impl DiagnosticReport {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Render one value according to its exposure class. Empty counts as unset.
pub fn render_value(exposure: Exposure, value: Option<&str>) -> String {
    match (exposure, value) {
        (_, None) | (_, Some("")) => NOT_SET.to_string(),
        (Exposure::Plain, Some(v)) => v.to_string(),
        (Exposure::PresenceOnly, Some(_)) => SET.to_string(),
        (Exposure::Secret, Some(v)) => {
            let prefix: String = v.chars().take(SECRET_PREFIX_CHARS).collect();
            format!("{}{}", prefix, ELLIPSIS)
        }
    }
}

/// Build the redacted environment report.
pub fn report_environment(snapshot: &EnvSnapshot) -> DiagnosticReport {
    DiagnosticReport(
        snapshot
            .entries()
            .into_iter()
            .map(|(key, exposure, value)| (key.to_string(), render_value(exposure, value)))
            .collect(),
    )
}

/// Probe the database and describe the result.
///
/// `secret` is scrubbed from any error message before it is returned.
pub async fn report_health(provider: &ConnectionProvider, secret: &str) -> HealthStatus {
    match provider.check_liveness().await {
        Ok(true) => HealthStatus::ok_now(),
        Ok(false) => HealthStatus::error_now("Database probe failed"),
        Err(e) => {
            let e = e.redact(secret);
            warn!(error = %e, "Health check could not reach the database");
            HealthStatus::error_now(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_password_is_not_set() {
        let report = report_environment(&EnvSnapshot::default());
        assert_eq!(report.get("DB_PASSWORD"), Some(NOT_SET));
    }

    #[test]
    fn test_password_truncated_to_five_chars() {
        let snapshot = EnvSnapshot {
            db_password: Some("supersecret123".to_string()),
            ..EnvSnapshot::default()
        };
        let report = report_environment(&snapshot);
        assert_eq!(report.get("DB_PASSWORD"), Some("super..."));
    }

    #[test]
    fn test_short_password_keeps_ellipsis() {
        assert_eq!(render_value(Exposure::Secret, Some("abc")), "abc...");
    }

    #[test]
    fn test_empty_values_are_not_set() {
        assert_eq!(render_value(Exposure::Secret, Some("")), NOT_SET);
        assert_eq!(render_value(Exposure::PresenceOnly, Some("")), NOT_SET);
        assert_eq!(render_value(Exposure::Plain, Some("")), NOT_SET);

        let snapshot = EnvSnapshot {
            db_password: Some(String::new()),
            jwt_secret: Some(String::new()),
            ..EnvSnapshot::default()
        };
        let report = report_environment(&snapshot);
        assert_eq!(report.get("DB_PASSWORD"), Some(NOT_SET));
        assert_eq!(report.get("JWT_SECRET"), Some(NOT_SET));
    }

    #[test]
    fn test_secret_truncation_is_char_safe() {
        assert_eq!(render_value(Exposure::Secret, Some("pässwörd")), "pässw...");
    }

    #[test]
    fn test_jwt_secret_presence_only() {
        let snapshot = EnvSnapshot {
            jwt_secret: Some("a-very-long-signing-key".to_string()),
            ..EnvSnapshot::default()
        };
        let report = report_environment(&snapshot);
        assert_eq!(report.get("JWT_SECRET"), Some(SET));
        assert!(report.iter().all(|(_, v)| !v.contains("signing")));

        let report = report_environment(&EnvSnapshot::default());
        assert_eq!(report.get("JWT_SECRET"), Some(NOT_SET));
    }

    #[test]
    fn test_plain_values_verbatim() {
        let snapshot = EnvSnapshot {
            db_host: Some("db.internal".to_string()),
            db_port: Some("3307".to_string()),
            node_env: Some("production".to_string()),
            ..EnvSnapshot::default()
        };
        let report = report_environment(&snapshot);
        assert_eq!(report.get("DB_HOST"), Some("db.internal"));
        assert_eq!(report.get("DB_PORT"), Some("3307"));
        assert_eq!(report.get("NODE_ENV"), Some("production"));
        assert_eq!(report.get("DB_USER"), Some(NOT_SET));
        assert_eq!(report.get("DB_NAME"), Some(NOT_SET));
    }

    #[test]
    fn test_report_lists_every_key() {
        let report = report_environment(&EnvSnapshot::default());
        assert_eq!(report.len(), 7);
        assert!(!report.is_empty());
        assert!(report.iter().all(|(_, v)| v == NOT_SET));
    }

    #[test]
    fn test_report_never_leaks_more_than_prefix() {
        for secret in ["x", "12345", "123456", "correct horse battery staple", "ÅÅÅÅÅÅÅÅ"] {
            let snapshot = EnvSnapshot {
                db_password: Some(secret.to_string()),
                ..EnvSnapshot::default()
            };
            let rendered = report_environment(&snapshot)
                .get("DB_PASSWORD")
                .unwrap()
                .to_string();
            let shown = rendered.trim_end_matches(ELLIPSIS);
            assert!(shown.chars().count() <= SECRET_PREFIX_CHARS, "{rendered}");
        }
    }

    #[test]
    fn test_report_serializes_as_flat_object() {
        let snapshot = EnvSnapshot {
            db_password: Some("supersecret123".to_string()),
            ..EnvSnapshot::default()
        };
        let json = serde_json::to_value(report_environment(&snapshot)).unwrap();
        assert_eq!(json["DB_PASSWORD"], "super...");
        assert_eq!(json["JWT_SECRET"], "NOT_SET");
    }
}
