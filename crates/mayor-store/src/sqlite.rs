use async_trait::async_trait;
use mayor_core::{KeyValueStore, MayorError, MayorResult};
use rusqlite::{params, Connection};
use std::sync::Mutex;

/// SQLite-backed key-value store: one flat `kv` table of opaque bytes.
///
/// The store never interprets values; record and index parsing happen in
/// the repository.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: &str) -> MayorResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| MayorError::Store(format!("failed to open database: {}", e)))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                updated_at TEXT DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| MayorError::Store(format!("failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> MayorResult<Self> {
        Self::open(":memory:")
    }

    fn lock(&self) -> MayorResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MayorError::Store(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> MayorResult<Option<Vec<u8>>> {
        let conn = self.lock()?;

        let result: Result<Vec<u8>, _> =
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            });

        match result {
            Ok(data) => Ok(Some(data)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(MayorError::Store(format!("query failed: {}", e))),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> MayorResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )
        .map_err(|e| MayorError::Store(format!("insert failed: {}", e)))?;

        Ok(())
    }

    async fn is_available(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }
}
