use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StorageContext, StoreError};

/// How long a statement waits on a locked database before giving up with
/// `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the on-disk store. It only remembers where the file lives; every
/// operation opens its own connection and drops it before returning, so no
/// SQLite state is shared between calls.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection for a single operation. Callers keep it in a
    /// local binding; the drop at the end of their scope closes it on every
    /// exit path, including `?` returns.
    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path).storage("failed to open SQLite database")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .storage("failed to configure busy timeout")?;
        debug!(path = %self.path.display(), "opened connection");
        Ok(conn)
    }

    /// Ensure the data directory and the `books` table exist. Safe to call on
    /// every startup.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::DataDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                unit_price REAL NOT NULL,
                registered_date TEXT,
                stock_count INTEGER,
                sale_date TEXT,
                quantity_sold INTEGER,
                amount_received REAL,
                sale_location TEXT
            )",
            [],
        )
        .storage("failed to create books table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_books_title ON books (title)",
            [],
        )
        .storage("failed to create title index")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_books_sale_date ON books (sale_date)",
            [],
        )
        .storage("failed to create sale date index")?;

        info!(path = %self.path.display(), "schema ready");
        Ok(())
    }
}
