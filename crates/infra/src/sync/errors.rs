//! Sync-specific error types

use repforge_domain::RepForgeError;
use thiserror::Error;

/// Remote session store errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<SyncError> for RepForgeError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Config(msg) => RepForgeError::Config(msg),
            SyncError::Client(msg) => RepForgeError::Internal(msg),
            SyncError::Auth(msg) | SyncError::Server(msg) | SyncError::Network(msg) => {
                RepForgeError::Network(msg)
            }
        }
    }
}
