//! Database connection manager
//!
//! Owns the SQLite connection pool and applies the schema on startup.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use repforge_domain::{RepForgeError, Result};
use tracing::info;

/// Schema for the local durable cache: a single well-known slot holding
/// the JSON-serialized in-progress session.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS session_cache (
    slot INTEGER PRIMARY KEY CHECK (slot = 0),
    user_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    last_modified_at TEXT NOT NULL
);
";

/// SQLite connection pool with schema management
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
}

impl DbManager {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn new(path: &Path, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| RepForgeError::Database(format!("Failed to build pool: {e}")))?;

        let db = Self { pool };
        db.apply_schema()?;
        info!(path = %path.display(), "local database ready");
        Ok(db)
    }

    /// Get a pooled connection.
    pub fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| RepForgeError::Database(format!("Failed to get connection: {e}")))
    }

    fn apply_schema(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| RepForgeError::Database(format!("Failed to apply schema: {e}")))
    }
}
