//! Flush scheduler for periodic remote session sync
//!
//! Drives `SessionService::flush_if_pending` on a fixed interval so a
//! buffered session change reaches the remote store within one tick. A
//! failed flush stays pending and is retried on the next tick; the
//! scheduler itself never gives up.

use std::sync::Arc;
use std::time::Duration;

use repforge_core::session::SessionService;
use repforge_domain::constants::REMOTE_FLUSH_INTERVAL_SECS;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the flush scheduler
#[derive(Debug, Clone)]
pub struct FlushSchedulerConfig {
    /// Interval between pending-flush checks
    pub interval: Duration,
}

impl Default for FlushSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(REMOTE_FLUSH_INTERVAL_SECS) }
    }
}

/// Periodic remote-flush scheduler
pub struct FlushScheduler {
    service: Arc<SessionService>,
    config: FlushSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl FlushScheduler {
    /// Create a new scheduler over the given session service.
    pub fn new(service: Arc<SessionService>, config: FlushSchedulerConfig) -> Self {
        Self {
            service,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler is already running.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting flush scheduler");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::flush_loop(service, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        info!("Flush scheduler started");

        Ok(())
    }

    /// Stop the scheduler gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler is not running.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping flush scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(SchedulerError::TaskJoinFailed(err.to_string())),
                Err(_) => {
                    return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() })
                }
            }
        }

        info!("Flush scheduler stopped");
        Ok(())
    }

    /// Check if the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn flush_loop(
        service: Arc<SessionService>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Flush loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    if service.flush_if_pending().await {
                        debug!("Periodic flush pushed session to remote store");
                    }
                }
            }
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for FlushScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            warn!("FlushScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
