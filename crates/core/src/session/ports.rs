//! Port interfaces for session persistence

use async_trait::async_trait;
use repforge_domain::{Result, WorkoutSession};

/// Local durable cache holding at most one session
///
/// Device-scoped and survives reloads; a fixed well-known slot, so a save
/// replaces whatever was cached before.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Load the cached session, if any.
    async fn load(&self) -> Result<Option<WorkoutSession>>;

    /// Replace the cached session.
    async fn save(&self, session: &WorkoutSession) -> Result<()>;

    /// Drop the cached session.
    async fn clear(&self) -> Result<()>;
}

/// Remote durable store keyed by user
///
/// Holds exactly one active session row per user; an upsert replaces any
/// existing row for that user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the user's active session, if any.
    async fn fetch_active(&self, user_id: &str) -> Result<Option<WorkoutSession>>;

    /// Insert or replace the user's active session. Returns the
    /// store-assigned session id.
    async fn upsert_active(&self, session: &WorkoutSession) -> Result<String>;

    /// Delete the user's active session. Deleting a missing row is not an
    /// error.
    async fn delete_active(&self, user_id: &str) -> Result<()>;
}
