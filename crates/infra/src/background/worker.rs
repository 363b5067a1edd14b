//! Background timer worker
//!
//! Tracks rest countdowns in a dedicated task that keeps running while
//! the page-side logic is throttled or torn down. Commands arrive over an
//! mpsc channel; completions go out over a broadcast channel. When a
//! countdown expires the worker shows the OS notification itself (when
//! enabled) so the alert reaches the user even with no foreground page,
//! and reports `notification_sent` so the page does not duplicate it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use repforge_core::alerts::SystemNotifier;
use repforge_domain::constants::COMPLETED_TIMER_RETENTION_SECS;
use repforge_domain::{AlertSettings, BackgroundTimerStatus, TimerCompletion};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Commands accepted by the background context
#[derive(Debug)]
pub enum TimerCommand {
    /// Begin tracking a countdown
    Start { timer_id: String, duration_seconds: u32, label: String },
    /// Stop tracking a countdown; unknown ids are ignored
    Cancel { timer_id: String },
    /// Point-in-time status query
    Status { timer_id: String, reply: oneshot::Sender<Option<BackgroundTimerStatus>> },
    /// Liveness ping
    KeepAlive { reply: oneshot::Sender<()> },
}

struct TrackedTimer {
    deadline: tokio::time::Instant,
    label: String,
    completed: bool,
    completed_at: Option<tokio::time::Instant>,
    notification_sent: bool,
}

/// Handle to the spawned background timer task
pub struct BackgroundTimerWorker {
    commands: mpsc::Sender<TimerCommand>,
    events: broadcast::Sender<TimerCompletion>,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl BackgroundTimerWorker {
    /// Spawn the worker task.
    pub fn spawn(settings: AlertSettings, notifier: Arc<dyn SystemNotifier>) -> Self {
        let (commands, command_rx) = mpsc::channel(64);
        let (events, _) = broadcast::channel(64);
        let cancellation = CancellationToken::new();

        let handle = tokio::spawn(run_loop(
            command_rx,
            events.clone(),
            settings,
            notifier,
            cancellation.clone(),
        ));

        info!("background timer worker started");
        Self { commands, events, cancellation, task_handle: Some(handle) }
    }

    /// Sender half of the command channel.
    pub fn command_sender(&self) -> mpsc::Sender<TimerCommand> {
        self.commands.clone()
    }

    /// Completion event channel.
    pub fn completion_sender(&self) -> broadcast::Sender<TimerCompletion> {
        self.events.clone()
    }

    /// Subscribe to completion events.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerCompletion> {
        self.events.subscribe()
    }

    /// Stop the worker and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.cancellation.cancel();
        if let Some(handle) = self.task_handle.take() {
            let join_timeout = Duration::from_secs(5);
            if tokio::time::timeout(join_timeout, handle).await.is_err() {
                warn!("background timer worker did not stop within timeout");
            }
        }
        info!("background timer worker stopped");
    }
}

impl Drop for BackgroundTimerWorker {
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            self.cancellation.cancel();
        }
    }
}

async fn run_loop(
    mut commands: mpsc::Receiver<TimerCommand>,
    events: broadcast::Sender<TimerCompletion>,
    settings: AlertSettings,
    notifier: Arc<dyn SystemNotifier>,
    cancel: CancellationToken,
) {
    let mut timers: HashMap<String, TrackedTimer> = HashMap::new();
    let retention = Duration::from_secs(COMPLETED_TIMER_RETENTION_SECS);

    loop {
        let next_deadline =
            timers.values().filter(|t| !t.completed).map(|t| t.deadline).min();
        // Placeholder far-future wake when no countdown is armed; the
        // branch is disabled in that case.
        let wake = next_deadline
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3_600));

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("background timer worker cancelled");
                break;
            }
            command = commands.recv() => {
                match command {
                    Some(command) => handle_command(&mut timers, command),
                    None => {
                        debug!("command channel closed, stopping worker");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(wake), if next_deadline.is_some() => {
                fire_due_timers(&mut timers, &events, &settings, notifier.as_ref()).await;
            }
        }

        // Drop completed entries once status queries can no longer care
        timers.retain(|_, t| match t.completed_at {
            Some(at) => at.elapsed() < retention,
            None => true,
        });
    }
}

fn handle_command(timers: &mut HashMap<String, TrackedTimer>, command: TimerCommand) {
    match command {
        TimerCommand::Start { timer_id, duration_seconds, label } => {
            debug!(timer_id = %timer_id, duration_seconds, "tracking countdown");
            timers.insert(
                timer_id,
                TrackedTimer {
                    deadline: tokio::time::Instant::now()
                        + Duration::from_secs(u64::from(duration_seconds)),
                    label,
                    completed: false,
                    completed_at: None,
                    notification_sent: false,
                },
            );
        }
        TimerCommand::Cancel { timer_id } => {
            if timers.remove(&timer_id).is_some() {
                debug!(timer_id = %timer_id, "countdown cancelled");
            }
        }
        TimerCommand::Status { timer_id, reply } => {
            let status = timers.get(&timer_id).map(|t| BackgroundTimerStatus {
                timer_id: timer_id.clone(),
                remaining_seconds: remaining_of(t),
                completed: t.completed,
                notification_sent: t.notification_sent,
            });
            let _ = reply.send(status);
        }
        TimerCommand::KeepAlive { reply } => {
            let _ = reply.send(());
        }
    }
}

fn remaining_of(timer: &TrackedTimer) -> u32 {
    if timer.completed {
        return 0;
    }
    let remaining = timer.deadline.saturating_duration_since(tokio::time::Instant::now());
    u32::try_from(remaining.as_secs()).unwrap_or(u32::MAX)
}

async fn fire_due_timers(
    timers: &mut HashMap<String, TrackedTimer>,
    events: &broadcast::Sender<TimerCompletion>,
    settings: &AlertSettings,
    notifier: &dyn SystemNotifier,
) {
    let now = tokio::time::Instant::now();

    for (timer_id, timer) in timers.iter_mut() {
        if timer.completed || timer.deadline > now {
            continue;
        }

        timer.completed = true;
        timer.completed_at = Some(now);

        if settings.use_system_notification {
            let body = if timer.label.is_empty() {
                "Rest period finished".to_string()
            } else {
                format!("Time for your next set: {}", timer.label)
            };
            match notifier.notify("Rest complete", &body).await {
                Ok(()) => timer.notification_sent = true,
                Err(err) => {
                    warn!(timer_id = %timer_id, error = %err, "background notification failed");
                }
            }
        }

        info!(timer_id = %timer_id, notification_sent = timer.notification_sent, "countdown complete");
        let _ = events.send(TimerCompletion {
            timer_id: timer_id.clone(),
            completed: true,
            notification_sent: timer.notification_sent,
        });
    }
}
