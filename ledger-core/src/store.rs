//! Embedded SQLite store for the ledger.
//!
//! Owns the database file, applies pragmas and creates the schema on open.
//! All components receive an explicit `Arc<Store>` handle; there is no
//! process-wide ambient connection. The engine performs no transactions
//! spanning multiple rows, each status transition is a single statement.

use crate::error::Result;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        category TEXT,
        provider_code TEXT,
        stock INTEGER DEFAULT 0,
        cost REAL DEFAULT 0.0,
        price REAL DEFAULT 0.0,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS providers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT UNIQUE NOT NULL,
        date TEXT,
        provider_code TEXT,
        total REAL DEFAULT 0.0,
        status TEXT DEFAULT 'DRAFT',
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS sync_queue (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity TEXT NOT NULL,
        reference TEXT NOT NULL,
        payload TEXT NOT NULL,
        operation TEXT NOT NULL,
        status TEXT DEFAULT 'PENDING',
        attempts INTEGER DEFAULT 0,
        last_attempt TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS document_queue (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_name TEXT NOT NULL,
        local_path TEXT NOT NULL,
        status TEXT DEFAULT 'PENDING',
        uploaded_at TEXT,
        metadata TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_products_code ON products (code);
    CREATE INDEX IF NOT EXISTS idx_providers_code ON providers (code);
    CREATE INDEX IF NOT EXISTS idx_orders_code ON orders (code);
    CREATE INDEX IF NOT EXISTS idx_sync_queue_status ON sync_queue (status);
    CREATE INDEX IF NOT EXISTS idx_document_queue_status ON document_queue (status);
";

/// SQLite-backed local store shared by every engine component.
pub struct Store {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the ledger database at `path` and initialize the
    /// schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("opened ledger store at {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Reclaim unused space in the database file.
    pub fn vacuum(&self) -> Result<()> {
        self.conn().execute_batch("VACUUM;")?;
        Ok(())
    }
}
