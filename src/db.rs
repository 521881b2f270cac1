//! Database module for the fitness tracker
//!
//! SQLite-backed `PersistenceBackend`. Records are stored as opaque JSON
//! payloads keyed by user id; the record schema lives in `crate::record`.

mod schema;

use schema::{SCHEMA, SELECT_RECORD, UPSERT_RECORD};

use crate::runtime::{BackendError, PersistenceBackend};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for BackendError {
    fn from(e: DbError) -> Self {
        BackendError::Unavailable(e.to_string())
    }
}

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// How long a statement waits on another connection's lock before failing
    pub fn set_busy_timeout(&self, timeout: Duration) -> DbResult<()> {
        self.lock()?.busy_timeout(timeout)?;
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Record Operations ====================

    /// Load the raw payload for a user
    pub fn load_record(&self, user_id: &str) -> DbResult<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let data = conn
            .query_row(SELECT_RECORD, params![user_id], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(data)
    }

    /// Insert or replace the payload for a user
    pub fn save_record(&self, user_id: &str, data: &[u8]) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(UPSERT_RECORD, params![user_id, data, Utc::now().to_rfc3339()])?;
        Ok(())
    }

    /// Number of stored records
    pub fn record_count(&self) -> DbResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM fitness_records", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Fold the write-ahead log back into the main database file
    pub fn checkpoint(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

/// Run a connection call on the blocking pool so a slow or locked database
/// never stalls the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, BackendError>
where
    T: Send + 'static,
    F: FnOnce() -> DbResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackendError::Unavailable(format!("Database task failed: {e}")))?
        .map_err(BackendError::from)
}

#[async_trait]
impl PersistenceBackend for Database {
    async fn read(&self, user_id: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        run_blocking(move || db.load_record(&user_id)).await
    }

    async fn write(&self, user_id: &str, bytes: &[u8]) -> Result<(), BackendError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let bytes = bytes.to_vec();
        run_blocking(move || db.save_record(&user_id, &bytes)).await
    }

    async fn flush(&self) -> Result<(), BackendError> {
        let db = self.clone();
        run_blocking(move || db.checkpoint()).await
    }
}
