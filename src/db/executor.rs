//! Query execution engine.
//!
//! The executor runs validated [`Statement`]s against a [`SqlSession`] with a
//! bounded timeout:
//! - read statements produce `QueryResult::Rows`
//! - write statements produce `QueryResult::Mutation`
//!
//! `SqlSession` is the seam between statement handling and the MySQL driver.
//! `ConnectionHandle` implements it for a live connection.

use crate::db::statement::{Statement, StatementKind};
use crate::error::{ApiError, DbResult};
use crate::config::DEFAULT_QUERY_TIMEOUT_SECS;
use crate::models::{JsonRow, MutationSummary, QueryResult};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// A database session able to run statements.
pub trait SqlSession: Send {
    /// Run a read statement and decode every row.
    fn fetch_rows(
        &mut self,
        statement: &Statement,
    ) -> impl Future<Output = DbResult<Vec<JsonRow>>> + Send;

    /// Run a write statement and report what it changed.
    fn execute_write(
        &mut self,
        statement: &Statement,
    ) -> impl Future<Output = DbResult<MutationSummary>> + Send;
}

/// Query executor that applies timeouts and dispatches by statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryExecutor {
    default_timeout: Duration,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Create a query executor with a custom timeout.
    pub fn with_timeout(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute any statement, returning rows or mutation metadata by kind.
    ///
    /// This is the general entry point. Callers that know the statement kind
    /// up front use [`fetch_rows`](Self::fetch_rows) or
    /// [`execute_write`](Self::execute_write) instead.
    pub async fn execute<S: SqlSession>(
        &self,
        session: &mut S,
        statement: &Statement,
    ) -> DbResult<QueryResult> {
        match statement.kind() {
            StatementKind::Read => {
                let rows = self.run_read(session, statement).await?;
                Ok(QueryResult::Rows { rows })
            }
            StatementKind::Write => {
                let summary = self.run_write(session, statement).await?;
                Ok(QueryResult::Mutation(summary))
            }
        }
    }

    /// Execute a read statement and return its rows.
    pub async fn fetch_rows<S: SqlSession>(
        &self,
        session: &mut S,
        statement: &Statement,
    ) -> DbResult<Vec<JsonRow>> {
        if statement.kind() != StatementKind::Read {
            return Err(ApiError::invalid_input(
                "fetch_rows requires a read statement (SELECT, SHOW, ...)",
            ));
        }
        self.run_read(session, statement).await
    }

    /// Execute a write statement (INSERT, UPDATE, DELETE, DDL).
    pub async fn execute_write<S: SqlSession>(
        &self,
        session: &mut S,
        statement: &Statement,
    ) -> DbResult<MutationSummary> {
        if statement.kind() != StatementKind::Write {
            return Err(ApiError::invalid_input(
                "execute_write requires a write statement",
            ));
        }
        self.run_write(session, statement).await
    }

    async fn run_read<S: SqlSession>(
        &self,
        session: &mut S,
        statement: &Statement,
    ) -> DbResult<Vec<JsonRow>> {
        let start = Instant::now();
        debug!(
            sql = %statement.sql(),
            params = statement.params().len(),
            timeout_secs = self.default_timeout.as_secs(),
            "Executing query"
        );

        let rows = match timeout(self.default_timeout, session.fetch_rows(statement)).await {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error("query execution", self.default_timeout)),
        };

        debug!(
            rows = rows.len(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(rows)
    }

    async fn run_write<S: SqlSession>(
        &self,
        session: &mut S,
        statement: &Statement,
    ) -> DbResult<MutationSummary> {
        let start = Instant::now();
        debug!(
            sql = %statement.sql(),
            params = statement.params().len(),
            timeout_secs = self.default_timeout.as_secs(),
            "Executing write operation"
        );

        let summary = match timeout(self.default_timeout, session.execute_write(statement)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error("write operation", self.default_timeout)),
        };

        debug!(
            affected_rows = summary.affected_rows,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Write completed"
        );
        Ok(summary)
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn timeout_error(operation: &str, timeout: Duration) -> ApiError {
    ApiError::timeout(operation, timeout.as_secs())
}
