//! Periodic schedulers

pub mod error;
pub mod flush_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use flush_scheduler::{FlushScheduler, FlushSchedulerConfig};
