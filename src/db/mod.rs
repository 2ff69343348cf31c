//! Database access layer.
//!
//! This module provides:
//! - Per-request connections with scoped release
//! - Statement validation
//! - Query execution with timeouts
//! - MySQL row decoding
//! - The delete-all + counter-reset bulk mutation

pub mod bulk;
pub mod connection;
pub mod executor;
pub mod statement;
pub mod types;

pub use bulk::{BulkDeleteOutcome, PartialFailureWarning, ResetStage, delete_all_and_reset};
pub use connection::{
    Closeable, ConnectionHandle, ConnectionProvider, ConnectionState, run_then_close,
};
pub use executor::{QueryExecutor, SqlSession};
pub use statement::{Statement, StatementKind, TableName};
