//! Remote session store synchronization

pub mod errors;
pub mod http_store;

pub use errors::SyncError;
pub use http_store::{HttpSessionStore, HttpSessionStoreConfig};
