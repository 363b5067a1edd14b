//! Shared test doubles for core integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use repforge_core::alerts::{AlertService, SystemNotifier, TonePlayer, VibrationDevice};
use repforge_core::time::SystemClock;
use repforge_core::timer::{AlertDedupGuard, BackgroundTimers, RestTimerDeps};
use repforge_domain::{AlertSettings, BackgroundTimerStatus, Result, TimerCompletion};
use tokio::sync::broadcast;

/// Background context double; declines or accepts handoffs and lets tests
/// push completion events.
pub struct ScriptedBackground {
    pub armed: bool,
    pub completions: broadcast::Sender<TimerCompletion>,
    pub cancelled: Mutex<Vec<String>>,
}

impl ScriptedBackground {
    pub fn unavailable() -> Self {
        let (completions, _) = broadcast::channel(16);
        Self { armed: false, completions, cancelled: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl BackgroundTimers for ScriptedBackground {
    async fn start_timer(&self, _timer_id: &str, _duration_seconds: u32, _label: &str) -> bool {
        self.armed
    }

    async fn cancel_timer(&self, timer_id: &str) {
        self.cancelled.lock().push(timer_id.to_string());
    }

    async fn timer_status(&self, _timer_id: &str) -> Option<BackgroundTimerStatus> {
        None
    }

    async fn notification_sent(&self, _timer_id: &str) -> bool {
        false
    }

    fn subscribe_completions(&self) -> broadcast::Receiver<TimerCompletion> {
        self.completions.subscribe()
    }
}

#[derive(Default)]
pub struct CountingPlayer {
    pub plays: AtomicUsize,
}

impl TonePlayer for CountingPlayer {
    fn play(&self, _samples: &[f32], _sample_rate: u32) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct NoVibration;

impl VibrationDevice for NoVibration {
    fn is_supported(&self) -> bool {
        false
    }

    fn vibrate(&self, _pattern: &[u64]) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub notifications: AtomicUsize,
}

#[async_trait]
impl SystemNotifier for CountingNotifier {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Wire a full set of controller deps around the given background double.
pub fn timer_deps(
    background: Arc<ScriptedBackground>,
) -> (RestTimerDeps, Arc<CountingPlayer>, Arc<CountingNotifier>) {
    let player = Arc::new(CountingPlayer::default());
    let notifier = Arc::new(CountingNotifier::default());
    let alerts = Arc::new(AlertService::new(
        AlertSettings::default(),
        player.clone(),
        Arc::new(NoVibration),
    ));
    let deps = RestTimerDeps {
        background,
        alerts,
        notifier: notifier.clone(),
        dedup: Arc::new(AlertDedupGuard::new()),
        clock: Arc::new(SystemClock),
    };
    (deps, player, notifier)
}
