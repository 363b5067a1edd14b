//! Workout session continuity
//!
//! Two-tier cache-aside persistence: the local cache is the fast,
//! always-available tier backing the current page, the remote store is
//! the durable cross-device tier, and a pending-flush flag plus the infra
//! flush scheduler keeps them converging.

pub mod ports;
pub mod service;

pub use ports::{SessionCache, SessionStore};
pub use service::SessionService;
