//! Rest timer controller
//!
//! Owns one countdown's lifecycle: arms the background handoff, runs the
//! local fallback clock, and guarantees exactly one alert per timer
//! instance regardless of which path detects completion first.
//!
//! State machine: `Armed` → `CompletionPending` → `Completed`, with
//! `Skipped` reachable from the first two by explicit user action. The
//! background signal is given a short grace window before the local
//! fallback is trusted, so the background path is the de-facto winner
//! when both are imminent.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use repforge_domain::constants::{BACKGROUND_GRACE_MS, COMPLETE_DISPLAY_SECS, FALLBACK_TICK_MS};
use repforge_domain::{NotificationSource, RestTimer, TimerPhase, TimerSnapshot};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alerts::{AlertService, SystemNotifier};
use crate::time::Clock;
use crate::timer::dedup::AlertDedupGuard;
use crate::timer::ports::BackgroundTimers;

/// Per-timer configuration
#[derive(Debug, Clone)]
pub struct RestTimerConfig {
    /// Configured countdown length
    pub duration_seconds: u32,
    /// Label shown in notifications, usually the exercise name
    pub label: String,
    /// Local fallback clock tick interval
    pub tick_interval: Duration,
    /// Grace window granted to the background signal once the fallback
    /// reaches zero
    pub background_grace: Duration,
    /// How long the completed state stays visible before teardown
    pub complete_display: Duration,
}

impl RestTimerConfig {
    /// Config with the standard intervals for a given duration and label.
    pub fn new(duration_seconds: u32, label: impl Into<String>) -> Self {
        Self {
            duration_seconds,
            label: label.into(),
            tick_interval: Duration::from_millis(FALLBACK_TICK_MS),
            background_grace: Duration::from_millis(BACKGROUND_GRACE_MS),
            complete_display: Duration::from_secs(COMPLETE_DISPLAY_SECS),
        }
    }
}

/// Collaborators shared by all rest-timer controllers
#[derive(Clone)]
pub struct RestTimerDeps {
    pub background: Arc<dyn BackgroundTimers>,
    pub alerts: Arc<AlertService>,
    pub notifier: Arc<dyn SystemNotifier>,
    pub dedup: Arc<AlertDedupGuard>,
    pub clock: Arc<dyn Clock>,
}

/// One rest period's countdown controller
pub struct RestTimerController {
    timer_id: String,
    record: Arc<Mutex<RestTimer>>,
    snapshot_rx: watch::Receiver<TimerSnapshot>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RestTimerController {
    /// Arm a timer and spawn its run loop.
    pub fn start(config: RestTimerConfig, deps: RestTimerDeps) -> Self {
        let record = RestTimer::new(config.duration_seconds, deps.clock.now_utc());
        let timer_id = record.timer_id.clone();
        let record = Arc::new(Mutex::new(record));

        let (snapshot_tx, snapshot_rx) = watch::channel(TimerSnapshot {
            phase: TimerPhase::Armed,
            remaining_seconds: config.duration_seconds,
            dispatched_by: NotificationSource::None,
        });
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_timer(
            config,
            deps,
            timer_id.clone(),
            Arc::clone(&record),
            snapshot_tx,
            cancel.clone(),
        ));

        Self { timer_id, record, snapshot_rx, cancel, task: Mutex::new(Some(handle)) }
    }

    /// Opaque identifier of this timer instance.
    pub fn timer_id(&self) -> &str {
        &self.timer_id
    }

    /// Watch the timer's phase and remaining time.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Current snapshot of the timer.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// The audit record behind this timer.
    pub fn record(&self) -> RestTimer {
        self.record.lock().clone()
    }

    /// Skip the rest period: cancel the background timer, stop the
    /// fallback clock, dispatch no alert.
    pub fn skip(&self) {
        self.cancel.cancel();
    }

    /// Wait for the controller to signal teardown.
    pub async fn wait_teardown(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(timer_id = %self.timer_id, error = %err, "timer task failed");
            }
        }
    }
}

impl Drop for RestTimerController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Remaining whole seconds for a timer of `duration_seconds` after
/// `elapsed` time, clamped to zero.
///
/// Derived from the monotonic elapsed time rather than a decrementing
/// counter, so the value self-corrects after the task was throttled.
pub fn remaining_secs(duration_seconds: u32, elapsed: Duration) -> u32 {
    let elapsed_whole = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
    duration_seconds.saturating_sub(elapsed_whole)
}

/// Render remaining seconds as zero-padded `mm:ss`.
pub fn format_remaining(remaining_seconds: u32) -> String {
    format!("{:02}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

async fn run_timer(
    config: RestTimerConfig,
    deps: RestTimerDeps,
    timer_id: String,
    record: Arc<Mutex<RestTimer>>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    cancel: CancellationToken,
) {
    let mut events = deps.background.subscribe_completions();

    // Best-effort, once per timer; absence degrades to sound and
    // vibration only.
    if deps.alerts.settings().use_system_notification && !deps.notifier.request_permission().await
    {
        debug!(timer_id = %timer_id, "notification permission unavailable");
    }

    let background_armed = deps
        .background
        .start_timer(&timer_id, config.duration_seconds, &config.label)
        .await;
    if background_armed {
        debug!(timer_id = %timer_id, "countdown handed off to background context");
    } else {
        debug!(timer_id = %timer_id, "background context unavailable, local fallback only");
    }

    let origin = tokio::time::Instant::now();
    let mut tick = tokio::time::interval(config.tick_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut grace_deadline: Option<tokio::time::Instant> = None;
    let mut events_open = true;
    let mut last_published = u32::MAX;

    // The first of {cancellation, background completion, fallback zero}
    // decides the outcome.
    let outcome = loop {
        tokio::select! {
            _ = cancel.cancelled() => break None,
            event = recv_completion(&mut events), if events_open => {
                match event {
                    Some(completion) if completion.timer_id == timer_id => {
                        break Some((NotificationSource::BackgroundContext, completion.notification_sent));
                    }
                    Some(_) => {}
                    None => events_open = false,
                }
            }
            _ = tick.tick() => {
                let remaining = remaining_secs(config.duration_seconds, origin.elapsed());
                if remaining != last_published {
                    last_published = remaining;
                    // Reaching zero enters CompletionPending right away,
                    // even while the grace window holds the alert back.
                    let phase = if remaining == 0 {
                        TimerPhase::CompletionPending
                    } else {
                        TimerPhase::Armed
                    };
                    publish(&snapshot_tx, &record, phase, remaining);
                }

                if remaining > 0 {
                    continue;
                }

                if background_armed && events_open {
                    let deadline = *grace_deadline.get_or_insert_with(|| {
                        tokio::time::Instant::now() + config.background_grace
                    });
                    if tokio::time::Instant::now() < deadline {
                        continue;
                    }
                    // Grace expired: reconcile against the background
                    // context before the fallback acts.
                    let already_sent = deps.background.notification_sent(&timer_id).await;
                    break Some((NotificationSource::LocalFallback, already_sent));
                }

                break Some((NotificationSource::LocalFallback, false));
            }
        }
    };

    match outcome {
        None => {
            deps.background.cancel_timer(&timer_id).await;
            publish(&snapshot_tx, &record, TimerPhase::Skipped, last_remaining(&snapshot_tx));
            info!(timer_id = %timer_id, "rest timer skipped");
        }
        Some((source, background_notified)) => {
            publish(&snapshot_tx, &record, TimerPhase::CompletionPending, 0);
            dispatch_alert(&config, &deps, &timer_id, &record, source, background_notified).await;
            publish(&snapshot_tx, &record, TimerPhase::Completed, 0);

            // Hold the completed state briefly, then signal teardown.
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(config.complete_display) => {}
            }
        }
    }
}

/// Receive the next completion event, mapping a closed channel to `None`
/// and skipping over lagged gaps.
async fn recv_completion(
    events: &mut broadcast::Receiver<repforge_domain::TimerCompletion>,
) -> Option<repforge_domain::TimerCompletion> {
    loop {
        match events.recv().await {
            Ok(completion) => return Some(completion),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "completion listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

async fn dispatch_alert(
    config: &RestTimerConfig,
    deps: &RestTimerDeps,
    timer_id: &str,
    record: &Arc<Mutex<RestTimer>>,
    source: NotificationSource,
    background_notified: bool,
) {
    if deps.dedup.can_fire(timer_id) {
        deps.dedup.mark_fired(timer_id);

        deps.alerts.play_tone(None);
        deps.alerts.trigger_vibration(None);

        // Local OS notification only if the background context did not
        // already show one.
        if !background_notified && deps.alerts.settings().use_system_notification {
            let body = if config.label.is_empty() {
                "Rest period finished".to_string()
            } else {
                format!("Time for your next set: {}", config.label)
            };
            if let Err(err) = deps.notifier.notify("Rest complete", &body).await {
                warn!(timer_id = %timer_id, error = %err, "local notification failed");
            }
        }

        let mut record = record.lock();
        if record.dispatched_by == NotificationSource::None {
            record.dispatched_by = source;
        }
        record.completed = true;
        info!(timer_id = %timer_id, ?source, "rest timer alert dispatched");
    } else {
        let mut record = record.lock();
        record.completed = true;
        debug!(timer_id = %timer_id, ?source, "duplicate completion suppressed");
    }
}

fn publish(
    snapshot_tx: &watch::Sender<TimerSnapshot>,
    record: &Arc<Mutex<RestTimer>>,
    phase: TimerPhase,
    remaining_seconds: u32,
) {
    let dispatched_by = record.lock().dispatched_by;
    let _ = snapshot_tx.send(TimerSnapshot { phase, remaining_seconds, dispatched_by });
}

fn last_remaining(snapshot_tx: &watch::Sender<TimerSnapshot>) -> u32 {
    snapshot_tx.borrow().remaining_seconds
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use repforge_domain::{AlertSettings, BackgroundTimerStatus, RepForgeError, Result, TimerCompletion};

    use super::*;
    use crate::alerts::{TonePlayer, VibrationDevice};
    use crate::time::SystemClock;

    struct MockBackground {
        armed: bool,
        notification_already_sent: bool,
        completions: broadcast::Sender<TimerCompletion>,
        cancelled: Mutex<Vec<String>>,
        status_queries: AtomicUsize,
    }

    impl MockBackground {
        fn new(armed: bool) -> Self {
            let (completions, _) = broadcast::channel(16);
            Self {
                armed,
                notification_already_sent: false,
                completions,
                cancelled: Mutex::new(Vec::new()),
                status_queries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BackgroundTimers for MockBackground {
        async fn start_timer(&self, _timer_id: &str, _duration_seconds: u32, _label: &str) -> bool {
            self.armed
        }

        async fn cancel_timer(&self, timer_id: &str) {
            self.cancelled.lock().push(timer_id.to_string());
        }

        async fn timer_status(&self, timer_id: &str) -> Option<BackgroundTimerStatus> {
            self.status_queries.fetch_add(1, Ordering::SeqCst);
            Some(BackgroundTimerStatus {
                timer_id: timer_id.to_string(),
                remaining_seconds: 0,
                completed: true,
                notification_sent: self.notification_already_sent,
            })
        }

        async fn notification_sent(&self, _timer_id: &str) -> bool {
            self.status_queries.fetch_add(1, Ordering::SeqCst);
            self.notification_already_sent
        }

        fn subscribe_completions(&self) -> broadcast::Receiver<TimerCompletion> {
            self.completions.subscribe()
        }
    }

    #[derive(Default)]
    struct CountingPlayer {
        plays: AtomicUsize,
    }

    impl TonePlayer for CountingPlayer {
        fn play(&self, _samples: &[f32], _sample_rate: u32) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoVibration;

    impl VibrationDevice for NoVibration {
        fn is_supported(&self) -> bool {
            false
        }

        fn vibrate(&self, _pattern: &[u64]) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        notifications: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl SystemNotifier for CountingNotifier {
        async fn request_permission(&self) -> bool {
            true
        }

        async fn notify(&self, _title: &str, _body: &str) -> Result<()> {
            self.notifications.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepForgeError::Platform("notification daemon gone".into()));
            }
            Ok(())
        }
    }

    struct Fixture {
        background: Arc<MockBackground>,
        player: Arc<CountingPlayer>,
        notifier: Arc<CountingNotifier>,
        deps: RestTimerDeps,
    }

    fn fixture(background: MockBackground) -> Fixture {
        let background = Arc::new(background);
        let player = Arc::new(CountingPlayer::default());
        let notifier = Arc::new(CountingNotifier::default());
        let alerts = Arc::new(AlertService::new(
            AlertSettings::default(),
            player.clone(),
            Arc::new(NoVibration),
        ));
        let deps = RestTimerDeps {
            background: background.clone(),
            alerts,
            notifier: notifier.clone(),
            dedup: Arc::new(AlertDedupGuard::new()),
            clock: Arc::new(SystemClock),
        };
        Fixture { background, player, notifier, deps }
    }

    #[test]
    fn remaining_is_clamped_and_floored() {
        assert_eq!(remaining_secs(90, Duration::ZERO), 90);
        assert_eq!(remaining_secs(90, Duration::from_millis(900)), 90);
        assert_eq!(remaining_secs(90, Duration::from_millis(1_000)), 89);
        assert_eq!(remaining_secs(90, Duration::from_secs(89)), 1);
        assert_eq!(remaining_secs(90, Duration::from_secs(90)), 0);
        assert_eq!(remaining_secs(90, Duration::from_secs(10_000)), 0);
    }

    #[test]
    fn remaining_is_query_independent() {
        // The value depends only on elapsed time, however often and
        // however irregularly it is sampled.
        let elapsed_points = [0_u64, 137, 999, 1_000, 1_001, 45_000, 89_999, 90_000, 120_000];
        for ms in elapsed_points {
            let expected = 90_u32.saturating_sub((ms / 1_000) as u32);
            assert_eq!(remaining_secs(90, Duration::from_millis(ms)), expected);
        }
    }

    #[test]
    fn formats_zero_padded() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(5), "00:05");
        assert_eq!(format_remaining(90), "01:30");
        assert_eq!(format_remaining(615), "10:15");
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_completes_without_background() {
        let f = fixture(MockBackground::new(false));
        let controller = RestTimerController::start(RestTimerConfig::new(2, "Bench Press"), f.deps);

        controller.wait_teardown().await;

        let record = controller.record();
        assert!(record.completed);
        assert_eq!(record.dispatched_by, NotificationSource::LocalFallback);
        assert_eq!(f.player.plays.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 1);
        assert_eq!(controller.snapshot().phase, TimerPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn background_completion_wins_and_suppresses_local_notification() {
        let f = fixture(MockBackground::new(true));
        let completions = f.background.completions.clone();

        let controller = RestTimerController::start(RestTimerConfig::new(30, "Squat"), f.deps);
        let timer_id = controller.timer_id().to_string();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = completions.send(TimerCompletion {
                timer_id,
                completed: true,
                notification_sent: true,
            });
        });

        controller.wait_teardown().await;

        let record = controller.record();
        assert!(record.completed);
        assert_eq!(record.dispatched_by, NotificationSource::BackgroundContext);
        // Tone still plays once; the OS notification is the background's.
        assert_eq!(f.player.plays.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_expiry_falls_back_and_checks_background() {
        let mut background = MockBackground::new(true);
        background.notification_already_sent = true;
        let f = fixture(background);

        let controller = RestTimerController::start(RestTimerConfig::new(1, "Deadlift"), f.deps);
        controller.wait_teardown().await;

        let record = controller.record();
        assert!(record.completed);
        assert_eq!(record.dispatched_by, NotificationSource::LocalFallback);
        // The background context was consulted before the fallback acted
        assert!(f.background.status_queries.load(Ordering::SeqCst) >= 1);
        // It had already notified, so only sound fired locally
        assert_eq!(f.player.plays.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_cancels_background_and_dispatches_nothing() {
        let f = fixture(MockBackground::new(true));
        let controller = RestTimerController::start(RestTimerConfig::new(60, "Row"), f.deps);
        let timer_id = controller.timer_id().to_string();

        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.skip();
        controller.wait_teardown().await;

        assert_eq!(controller.snapshot().phase, TimerPhase::Skipped);
        assert!(!controller.record().completed);
        assert_eq!(f.player.plays.load(Ordering::SeqCst), 0);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 0);
        assert_eq!(f.background.cancelled.lock().as_slice(), &[timer_id]);
    }

    #[tokio::test(start_paused = true)]
    async fn notification_failure_does_not_block_completion() {
        let f = fixture(MockBackground::new(false));
        f.notifier.fail.store(true, Ordering::SeqCst);

        let controller = RestTimerController::start(RestTimerConfig::new(1, ""), f.deps);
        controller.wait_teardown().await;

        assert!(controller.record().completed);
        assert_eq!(controller.snapshot().phase, TimerPhase::Completed);
        assert_eq!(f.player.plays.load(Ordering::SeqCst), 1);
    }
}
