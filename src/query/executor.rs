//! Running compiled queries against a version's store.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, InterruptHandle, OpenFlags};
use thiserror::Error;

use crate::model::DataSetVersion;
use crate::sql::{CompiledSql, Dialect, SqlValue};

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// One result row, cells in SELECT order.
pub type Row = Vec<SqlValue>;

/// Errors raised while running a query.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The version's store file does not exist.
    #[error("store not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The statement was interrupted before it finished.
    #[error("query interrupted")]
    Interrupted,

    /// The blocking task panicked or was cancelled.
    #[error("executor task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A count query returned something other than one integer.
    #[error("count query returned no integer")]
    InvalidCount,

    /// An export row came back without an integer row id.
    #[error("row has no integer id")]
    InvalidRowId,
}

impl ExecutorError {
    /// Whether a caller may reasonably retry.
    pub fn is_retriable(&self) -> bool {
        match self {
            ExecutorError::Interrupted | ExecutorError::Task(_) => true,
            ExecutorError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Executes compiled SQL for one data-set version.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The dialect queries must be compiled for.
    fn dialect(&self) -> Dialect;

    async fn fetch(&self, version: &DataSetVersion, sql: CompiledSql) -> ExecutorResult<Vec<Row>>;

    /// Run a single-cell count query.
    async fn count(&self, version: &DataSetVersion, sql: CompiledSql) -> ExecutorResult<u64> {
        let rows = self.fetch(version, sql).await?;
        rows.first()
            .and_then(|row| row.first())
            .and_then(SqlValue::as_int)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or(ExecutorError::InvalidCount)
    }
}

/// Reads each version's `data.db` through a read-only SQLite connection.
///
/// Statements run on the blocking pool. Dropping the returned future
/// interrupts a statement that is still running.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteExecutor;

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, version: &DataSetVersion, sql: CompiledSql) -> ExecutorResult<Vec<Row>> {
        let path = version.files.store.clone();
        let slot: Arc<Mutex<Option<InterruptHandle>>> = Arc::default();
        let guard = InterruptOnDrop {
            slot: Arc::clone(&slot),
            armed: true,
        };

        tracing::trace!(sql = %sql.sql, params = sql.params.len(), "executing");
        let task = tokio::task::spawn_blocking(move || {
            if !path.is_file() {
                return Err(ExecutorError::StoreNotFound(path));
            }
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            if let Ok(mut handle) = slot.lock() {
                *handle = Some(conn.get_interrupt_handle());
            }
            run_query(&conn, &sql)
        });

        let result = task.await?;
        guard.disarm();
        result
    }
}

fn run_query(conn: &Connection, sql: &CompiledSql) -> ExecutorResult<Vec<Row>> {
    let mut stmt = conn.prepare(&sql.sql)?;
    let width = stmt.column_count();
    let mut rows = stmt.query(rusqlite::params_from_iter(sql.params.iter()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(interrupted)? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(SqlValue::from(row.get_ref(i)?));
        }
        out.push(cells);
    }
    Ok(out)
}

fn interrupted(e: rusqlite::Error) -> ExecutorError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::OperationInterrupted => {
            ExecutorError::Interrupted
        }
        _ => ExecutorError::Sqlite(e),
    }
}

/// Interrupts the connection in `slot` unless disarmed first.
struct InterruptOnDrop {
    slot: Arc<Mutex<Option<InterruptHandle>>>,
    armed: bool,
}

impl InterruptOnDrop {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(slot) = self.slot.lock() {
            if let Some(handle) = slot.as_ref() {
                tracing::debug!("interrupting abandoned query");
                handle.interrupt();
            }
        }
    }
}
