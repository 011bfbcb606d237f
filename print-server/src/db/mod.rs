//! redb-based storage
//!
//! One embedded database holds the printer registry, the replicated
//! orders and menu items, and the print job history. Values are JSON;
//! keys are typed, so lookups never go through string-built queries.
//!
//! Operations are grouped by table family:
//! - [`printer`] - printer registry rows
//! - [`order`] - order snapshots and menu items
//! - [`print_job`] - print jobs and their indexes

pub mod order;
pub mod print_job;
pub mod printer;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Printers: key = printer id, value = JSON
pub(crate) const PRINTERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("printers");

/// Menu items: key = menu item id, value = JSON
pub(crate) const MENU_ITEMS_TABLE: TableDefinition<i64, &[u8]> =
    TableDefinition::new("menu_items");

/// Orders: key = order id, value = JSON order snapshot (order + items)
pub(crate) const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Print jobs: key = job id, value = JSON
pub(crate) const PRINT_JOBS_TABLE: TableDefinition<u64, &[u8]> =
    TableDefinition::new("print_jobs");

/// Index: (order_id, job_id) -> ()
pub(crate) const PRINT_JOBS_BY_ORDER_TABLE: TableDefinition<(i64, u64), ()> =
    TableDefinition::new("print_jobs_by_order");

/// Index: failed jobs still under the retry ceiling
pub(crate) const RETRYABLE_JOBS_TABLE: TableDefinition<u64, ()> =
    TableDefinition::new("retryable_jobs");

/// Id sequences: key = sequence name, value = last issued id
pub(crate) const SEQUENCES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequences");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Print job not found: {0}")]
    JobNotFound(u64),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Print service storage
///
/// Cheap to clone; all clones share one database handle.
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open in-memory database (tests and ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRINTERS_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(PRINT_JOBS_TABLE)?;
            let _ = write_txn.open_table(PRINT_JOBS_BY_ORDER_TABLE)?;
            let _ = write_txn.open_table(RETRYABLE_JOBS_TABLE)?;
            let _ = write_txn.open_table(SEQUENCES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }
}

/// Issue the next id of a sequence inside a write transaction
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(SEQUENCES_TABLE)?;
    let next = table.get(sequence)?.map(|guard| guard.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_monotonic() {
        let storage = Storage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(next_id(&txn, "a").unwrap(), 1);
        assert_eq!(next_id(&txn, "a").unwrap(), 2);
        assert_eq!(next_id(&txn, "b").unwrap(), 1);
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(next_id(&txn, "a").unwrap(), 3);
        txn.commit().unwrap();
    }

    #[test]
    fn test_open_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("print.redb");

        {
            let storage = Storage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            next_id(&txn, "print_jobs").unwrap();
            txn.commit().unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(next_id(&txn, "print_jobs").unwrap(), 2);
        txn.commit().unwrap();
    }
}
