//! SQLite-backed local session cache
//!
//! Implements the core `SessionCache` port over the single-slot
//! `session_cache` table. The session travels as a JSON payload so the
//! cached shape always matches what the remote store sees.

use std::sync::Arc;

use async_trait::async_trait;
use repforge_core::session::SessionCache;
use repforge_domain::{RepForgeError, Result, WorkoutSession};
use rusqlite::{params, OptionalExtension};
use tokio::task;

use super::manager::DbManager;

/// SQLite implementation of the local session cache
pub struct SqliteSessionCache {
    db: Arc<DbManager>,
}

impl SqliteSessionCache {
    /// Create a cache over the given database.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionCache for SqliteSessionCache {
    async fn load(&self) -> Result<Option<WorkoutSession>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<WorkoutSession>> {
            let conn = db.get_connection()?;

            let payload: Option<String> = conn
                .query_row("SELECT payload FROM session_cache WHERE slot = 0", [], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(|e| RepForgeError::Database(format!("Failed to read cache: {e}")))?;

            match payload {
                Some(payload) => {
                    let session = serde_json::from_str(&payload).map_err(|e| {
                        RepForgeError::Database(format!("Corrupt cached session: {e}"))
                    })?;
                    Ok(Some(session))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, session: &WorkoutSession) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user_id = session.user_id.clone();
        let last_modified_at = session.last_modified_at.to_rfc3339();
        let payload = serde_json::to_string(session)
            .map_err(|e| RepForgeError::Internal(format!("Failed to serialize session: {e}")))?;

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO session_cache (slot, user_id, payload, last_modified_at)
                 VALUES (0, ?1, ?2, ?3)",
                params![user_id, payload, last_modified_at],
            )
            .map_err(|e| RepForgeError::Database(format!("Failed to write cache: {e}")))?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn clear(&self) -> Result<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM session_cache", [])
                .map_err(|e| RepForgeError::Database(format!("Failed to clear cache: {e}")))?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_join_error(err: task::JoinError) -> RepForgeError {
    RepForgeError::Internal(format!("Blocking task failed: {err}"))
}
