//! Background timer coordinator
//!
//! Page-side handle over the background timer worker, implementing the
//! core `BackgroundTimers` port. Degrades to a no-op surface when the
//! background context is unavailable: every call returns `false`/`None`
//! and callers fall back to their local countdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use repforge_core::timer::BackgroundTimers;
use repforge_domain::constants::{
    KEEP_ALIVE_INTERVAL_SECS, KEEP_ALIVE_TIMEOUT_MS, STATUS_QUERY_MIN_INTERVAL_SECS,
};
use repforge_domain::{BackgroundTimerStatus, TimerCompletion};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::worker::{BackgroundTimerWorker, TimerCommand};

struct CachedStatus {
    fetched_at: Instant,
    status: Option<BackgroundTimerStatus>,
}

/// Page-side coordinator for background countdown tracking
pub struct BackgroundTimerCoordinator {
    commands: Option<mpsc::Sender<TimerCommand>>,
    events: broadcast::Sender<TimerCompletion>,
    available: AtomicBool,
    /// Rate limit for status round-trips, keyed per timer
    status_cache: Mutex<HashMap<String, CachedStatus>>,
    keep_alive: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl BackgroundTimerCoordinator {
    /// Coordinator wired to a running worker.
    pub fn new(worker: &BackgroundTimerWorker) -> Self {
        Self::from_channels(worker.command_sender(), worker.completion_sender())
    }

    /// Coordinator over raw channels; used by tests and custom wiring.
    pub fn from_channels(
        commands: mpsc::Sender<TimerCommand>,
        events: broadcast::Sender<TimerCompletion>,
    ) -> Self {
        Self {
            commands: Some(commands),
            events,
            available: AtomicBool::new(true),
            status_cache: Mutex::new(HashMap::new()),
            keep_alive: Mutex::new(None),
        }
    }

    /// Coordinator honoring the user's background-delivery preference.
    ///
    /// Degrades to the unavailable surface when background tracking is
    /// disabled in settings or no worker was spawned.
    pub fn for_settings(
        settings: &repforge_domain::AlertSettings,
        worker: Option<&BackgroundTimerWorker>,
    ) -> Self {
        match worker {
            Some(worker) if settings.background_enabled => Self::new(worker),
            _ => Self::unavailable(),
        }
    }

    /// Coordinator for platforms without a background context.
    ///
    /// Every port call degrades to a no-op; the completion channel never
    /// emits.
    pub fn unavailable() -> Self {
        let (events, _) = broadcast::channel(1);
        Self {
            commands: None,
            events,
            available: AtomicBool::new(false),
            status_cache: Mutex::new(HashMap::new()),
            keep_alive: Mutex::new(None),
        }
    }

    /// Whether the background context is currently reachable.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst) && self.commands.is_some()
    }

    /// Start the periodic keep-alive loop.
    ///
    /// Platforms that aggressively suspend background work keep the
    /// worker scheduled through these pings; a missed pong flips the
    /// coordinator into degraded mode.
    pub fn start_keep_alive(self: &Arc<Self>) {
        let mut guard = self.keep_alive.lock();
        if guard.is_some() || !self.is_available() {
            return;
        }

        let coordinator = Arc::clone(self);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS));
            interval.tick().await; // Skip first immediate tick

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if !coordinator.ping().await {
                            warn!("background context missed keep-alive, degrading to local fallback");
                            coordinator.available.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                }
            }
        });

        *guard = Some((cancel, handle));
    }

    /// Stop the keep-alive loop, if running.
    pub fn stop_keep_alive(&self) {
        if let Some((cancel, _)) = self.keep_alive.lock().take() {
            cancel.cancel();
        }
    }

    async fn ping(&self) -> bool {
        let Some(commands) = &self.commands else {
            return false;
        };

        let (reply, rx) = oneshot::channel();
        if commands.send(TimerCommand::KeepAlive { reply }).await.is_err() {
            return false;
        }
        tokio::time::timeout(Duration::from_millis(KEEP_ALIVE_TIMEOUT_MS), rx)
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }

    async fn query_status(&self, timer_id: &str) -> Option<BackgroundTimerStatus> {
        let commands = self.commands.as_ref()?;

        let (reply, rx) = oneshot::channel();
        let sent = commands
            .send(TimerCommand::Status { timer_id: timer_id.to_string(), reply })
            .await;
        if sent.is_err() {
            warn!("background context unreachable, degrading to local fallback");
            self.available.store(false, Ordering::SeqCst);
            return None;
        }

        match tokio::time::timeout(Duration::from_millis(KEEP_ALIVE_TIMEOUT_MS), rx).await {
            Ok(Ok(status)) => status,
            _ => {
                debug!(timer_id = %timer_id, "status query timed out");
                None
            }
        }
    }
}

#[async_trait]
impl BackgroundTimers for BackgroundTimerCoordinator {
    async fn start_timer(&self, timer_id: &str, duration_seconds: u32, label: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        let Some(commands) = &self.commands else {
            return false;
        };

        let command = TimerCommand::Start {
            timer_id: timer_id.to_string(),
            duration_seconds,
            label: label.to_string(),
        };
        match commands.send(command).await {
            Ok(()) => true,
            Err(_) => {
                warn!("background context rejected handoff, degrading to local fallback");
                self.available.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    async fn cancel_timer(&self, timer_id: &str) {
        let Some(commands) = &self.commands else {
            return;
        };
        // Best-effort; a dead worker has no countdown to cancel anyway
        let _ = commands.send(TimerCommand::Cancel { timer_id: timer_id.to_string() }).await;
    }

    async fn timer_status(&self, timer_id: &str) -> Option<BackgroundTimerStatus> {
        if !self.is_available() {
            return None;
        }

        let min_interval = Duration::from_secs(STATUS_QUERY_MIN_INTERVAL_SECS);
        {
            let cache = self.status_cache.lock();
            if let Some(cached) = cache.get(timer_id) {
                if cached.fetched_at.elapsed() < min_interval {
                    return cached.status.clone();
                }
            }
        }

        let status = self.query_status(timer_id).await;
        self.status_cache.lock().insert(
            timer_id.to_string(),
            CachedStatus { fetched_at: Instant::now(), status: status.clone() },
        );
        status
    }

    async fn notification_sent(&self, timer_id: &str) -> bool {
        self.timer_status(timer_id)
            .await
            .map(|status| status.notification_sent)
            .unwrap_or(false)
    }

    fn subscribe_completions(&self) -> broadcast::Receiver<TimerCompletion> {
        self.events.subscribe()
    }
}

impl Drop for BackgroundTimerCoordinator {
    fn drop(&mut self) {
        if let Some((cancel, _)) = self.keep_alive.lock().take() {
            cancel.cancel();
        }
    }
}
