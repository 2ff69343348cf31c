//! Connection provider.
//!
//! One request opens exactly one MySQL connection and closes it before the
//! response is written. There is no pool: a [`ConnectionHandle`] is owned by
//! the handler invocation that opened it and is never shared or reused.
//!
//! Use [`ConnectionProvider::with_connection`] to get scoped acquisition: the
//! handle is closed on success and on error. A handle dropped without
//! `close()` (for example on panic) still tears down its socket and logs a
//! warning.

use crate::config::DatabaseSettings;
use crate::db::executor::{QueryExecutor, SqlSession};
use crate::db::statement::Statement;
use crate::db::types::RowToJson;
use crate::error::{ApiError, DbResult};
use crate::models::{JsonRow, MutationSummary, QueryParam};
use futures_util::future::BoxFuture;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, MySql};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`ConnectionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// One live database session.
pub struct ConnectionHandle {
    conn: Option<MySqlConnection>,
    host: String,
    user: String,
    database: String,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("state", &self.state())
            .finish()
    }
}

impl ConnectionHandle {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Close the session. Closing an already closed handle is a no-op.
    pub async fn close(&mut self) -> DbResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().await?;
        debug!(host = %self.host, database = %self.database, "Connection closed");
        Ok(())
    }

    fn conn_mut(&mut self) -> DbResult<&mut MySqlConnection> {
        self.conn.as_mut().ok_or_else(|| {
            ApiError::connection(
                "Connection is closed",
                "Open a new connection for each request",
            )
        })
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if self.conn.is_some() {
            // Dropping MySqlConnection shuts the socket without COM_QUIT
            warn!(
                host = %self.host,
                database = %self.database,
                "Connection dropped without close() - consider using with_connection"
            );
        }
    }
}

/// A session that has to be released explicitly.
pub trait Closeable: Send {
    /// Release the session. Must be idempotent.
    fn close(&mut self) -> impl Future<Output = DbResult<()>> + Send;
}

impl Closeable for ConnectionHandle {
    async fn close(&mut self) -> DbResult<()> {
        ConnectionHandle::close(self).await
    }
}

/// Run `f` against `session`, then close the session whatever `f` returned.
///
/// A failed close is logged and never replaces the result of `f`.
pub async fn run_then_close<S, T, F>(session: &mut S, f: F) -> DbResult<T>
where
    S: Closeable,
    T: Send,
    F: for<'c> FnOnce(&'c mut S) -> BoxFuture<'c, DbResult<T>> + Send,
{
    let result = f(&mut *session).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close connection cleanly");
    }
    result
}

impl SqlSession for ConnectionHandle {
    async fn fetch_rows(&mut self, statement: &Statement) -> DbResult<Vec<JsonRow>> {
        let conn = self.conn_mut()?;
        // When params is empty, use the text protocol to avoid prepared statement issues
        let rows = if statement.params().is_empty() {
            use sqlx::Executor;
            conn.fetch_all(statement.sql()).await?
        } else {
            let mut query = sqlx::query(statement.sql());
            for param in statement.params() {
                query = bind_param(query, param);
            }
            query.fetch_all(&mut *conn).await?
        };
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    async fn execute_write(&mut self, statement: &Statement) -> DbResult<MutationSummary> {
        let conn = self.conn_mut()?;
        // ALTER TABLE and friends are not always preparable, so raw text without params
        let result = if statement.params().is_empty() {
            use sqlx::Executor;
            conn.execute(statement.sql()).await?
        } else {
            let mut query = sqlx::query(statement.sql());
            for param in statement.params() {
                query = bind_param(query, param);
            }
            query.execute(&mut *conn).await?
        };
        let insert_id = Some(result.last_insert_id()).filter(|id| *id != 0);
        Ok(MutationSummary::new(result.rows_affected(), insert_id))
    }
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Opens per-request connections from explicit settings.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    settings: Arc<DatabaseSettings>,
    connect_timeout: Duration,
    executor: QueryExecutor,
}

impl ConnectionProvider {
    pub fn new(settings: DatabaseSettings, connect_timeout: Duration, query_timeout: Duration) -> Self {
        Self {
            settings: Arc::new(settings),
            connect_timeout,
            executor: QueryExecutor::with_timeout(query_timeout),
        }
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    /// Executor configured with this provider's query timeout.
    pub fn executor(&self) -> QueryExecutor {
        self.executor
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let s = &self.settings;
        let mut options = MySqlConnectOptions::new()
            .host(&s.host)
            .port(s.port)
            .username(&s.user)
            .database(&s.database)
            .charset("utf8mb4");
        if !s.password.is_empty() {
            options = options.password(&s.password);
        }
        options
    }

    /// Open a new connection.
    ///
    /// Fails with `ApiError::Connection` when the handshake fails and with
    /// `ApiError::Timeout` when it does not finish within the connect timeout.
    /// No handle exists on failure, so there is nothing to release.
    pub async fn open(&self) -> DbResult<ConnectionHandle> {
        let s = &self.settings;
        debug!(
            host = %s.host,
            port = s.port,
            user = %s.user,
            database = %s.database,
            "Opening database connection"
        );

        let options = self.connect_options();
        let conn = match timeout(self.connect_timeout, MySqlConnection::connect_with(&options)).await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(ApiError::connection(
                    format!("Failed to connect: {}", e),
                    connection_suggestion(&e),
                ));
            }
            Err(_) => {
                return Err(ApiError::timeout(
                    "connection open",
                    self.connect_timeout.as_secs(),
                ));
            }
        };

        Ok(ConnectionHandle {
            conn: Some(conn),
            host: s.host.clone(),
            user: s.user.clone(),
            database: s.database.clone(),
        })
    }

    /// Liveness probe: a trivial round trip. Errors are logged, never returned.
    pub async fn probe<S: SqlSession>(&self, session: &mut S) -> bool {
        let statement = match Statement::new("SELECT 1", Vec::new()) {
            Ok(statement) => statement,
            Err(e) => {
                warn!(error = %e, "Failed to build probe statement");
                return false;
            }
        };
        match self.executor.fetch_rows(session, &statement).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database probe failed");
                false
            }
        }
    }

    /// Open a connection, probe it, close it.
    pub async fn check_liveness(&self) -> DbResult<bool> {
        let mut handle = self.open().await?;
        let alive = self.probe(&mut handle).await;
        if let Err(e) = handle.close().await {
            warn!(error = %e, "Failed to close probe connection cleanly");
        }
        Ok(alive)
    }

    /// Run `f` against a fresh connection that is closed afterwards.
    ///
    /// ```ignore
    /// let executor = provider.executor();
    /// let rows = provider
    ///     .with_connection(move |conn| {
    ///         Box::pin(async move { executor.fetch_rows(conn, &statement).await })
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_connection<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut ConnectionHandle) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        let mut handle = self.open().await?;
        run_then_close(&mut handle, f).await
    }

    /// Log the target once at startup.
    pub fn log_target(&self) {
        let s = &self.settings;
        info!(
            host = %s.host,
            port = s.port,
            user = %s.user,
            database = %s.database,
            connect_timeout_secs = self.connect_timeout.as_secs(),
            query_timeout_secs = self.executor.timeout().as_secs(),
            "Database target configured"
        );
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MySQL server is running and reachable at DB_HOST:DB_PORT"
            .to_string();
    }

    if error_str.contains("access denied") || error_str.contains("password") {
        return "Verify DB_USER and DB_PASSWORD".to_string();
    }

    if error_str.contains("unknown database") {
        return "Check that the database named by DB_NAME exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    "Verify DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_NAME".to_string()
}
