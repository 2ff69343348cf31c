//! Bulk mutation: delete every row of a table and reset its identity counter.
//!
//! The operation is two statements with no transaction around them:
//!
//! 1. `DELETE FROM <table>`
//! 2. `ALTER TABLE <table> AUTO_INCREMENT = 1`
//!
//! A failed delete fails the whole operation. A failed reset does not: the
//! rows are already gone, so the outcome reports the achieved count together
//! with a [`PartialFailureWarning`]. Nothing is rolled back.
//!
//! There is no isolation against concurrent writers. A row inserted between
//! the two statements survives and, since MySQL never lowers AUTO_INCREMENT
//! below `MAX(id) + 1`, the reset then only goes as low as the survivor allows.

use crate::db::executor::{QueryExecutor, SqlSession};
use crate::db::statement::{Statement, TableName};
use crate::error::DbResult;
use serde::Serialize;
use tracing::{info, warn};

const DELETE_ALL: &str = "DELETE FROM {table}";
const RESET_COUNTER: &str = "ALTER TABLE {table} AUTO_INCREMENT = 1";

/// Step of the bulk mutation that failed after rows were deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStage {
    CounterReset,
}

/// Non-fatal failure attached to an otherwise successful bulk delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailureWarning {
    pub stage: ResetStage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteOutcome {
    pub deleted_count: u64,
    pub warning: Option<PartialFailureWarning>,
}

impl BulkDeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.warning.is_none()
    }
}

/// Delete all rows from `table`, then reset its AUTO_INCREMENT to 1.
///
/// Irreversible. Callers own any confirmation step.
pub async fn delete_all_and_reset<S: SqlSession>(
    executor: &QueryExecutor,
    session: &mut S,
    table: &TableName,
) -> DbResult<BulkDeleteOutcome> {
    let delete = Statement::for_table(DELETE_ALL, table, Vec::new())?;
    let reset = Statement::for_table(RESET_COUNTER, table, Vec::new())?;

    let deleted = executor.execute_write(session, &delete).await?;
    info!(
        table = %table,
        deleted_count = deleted.affected_rows,
        "Deleted all rows"
    );

    let warning = match executor.execute_write(session, &reset).await {
        Ok(_) => {
            info!(table = %table, "AUTO_INCREMENT reset to 1");
            None
        }
        Err(e) => {
            warn!(
                table = %table,
                deleted_count = deleted.affected_rows,
                error = %e,
                "Rows deleted but AUTO_INCREMENT reset failed"
            );
            Some(PartialFailureWarning {
                stage: ResetStage::CounterReset,
                message: e.to_string(),
            })
        }
    };

    Ok(BulkDeleteOutcome {
        deleted_count: deleted.affected_rows,
        warning,
    })
}
