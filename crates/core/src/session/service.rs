//! Session persistence service
//!
//! Owns the "workout in progress" record. Local writes happen on every
//! mutation; remote writes are buffered behind a pending-flush flag and
//! pushed by the periodic scheduler, `save_now`, or pause/resume
//! transitions. Remote failures are logged and retried on the next tick;
//! they never surface to the caller.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use repforge_domain::constants::LOCAL_CACHE_STALE_HOURS;
use repforge_domain::{ExerciseProgress, WorkoutSession};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ports::{SessionCache, SessionStore};
use crate::time::Clock;

struct SessionState {
    session: Option<WorkoutSession>,
    pending_flush: bool,
    /// Wall-clock origin of the current active stretch; `None` while paused
    active_origin: Option<DateTime<Utc>>,
}

/// Workout session continuity manager
///
/// One instance per user; callers must not run two concurrently for the
/// same user, or local and remote state may diverge.
pub struct SessionService {
    cache: Arc<dyn SessionCache>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
}

impl SessionService {
    /// Create a service with no session loaded.
    pub fn new(
        cache: Arc<dyn SessionCache>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            store,
            clock,
            state: Mutex::new(SessionState {
                session: None,
                pending_flush: false,
                active_origin: None,
            }),
        }
    }

    /// Start a new session, replacing any current one.
    ///
    /// The session is cached locally right away and upserted remotely
    /// (replace-on-conflict keyed by user). A failed upsert leaves the
    /// flush pending for the next tick.
    pub async fn start_session(
        &self,
        plan_assignment_id: &str,
        plan_name: &str,
        exercises: Vec<ExerciseProgress>,
        user_id: &str,
    ) -> WorkoutSession {
        let now = self.clock.now_utc();
        let session = WorkoutSession {
            session_id: None,
            user_id: user_id.to_string(),
            plan_assignment_id: plan_assignment_id.to_string(),
            plan_name: plan_name.to_string(),
            exercises,
            started_at: now,
            accumulated_active_seconds: 0,
            paused: false,
            last_modified_at: now,
        };

        let mut state = self.state.lock().await;
        state.session = Some(session);
        state.active_origin = Some(now);
        state.pending_flush = true;
        info!(user_id = %user_id, plan = %plan_name, "workout session started");

        self.write_local(&state).await;
        self.push_remote(&mut state).await;

        state.session.clone().unwrap_or_else(|| unreachable_session(user_id))
    }

    /// The in-memory session, if one is active.
    pub async fn current_session(&self) -> Option<WorkoutSession> {
        self.state.lock().await.session.clone()
    }

    /// Whether a remote flush is waiting for the next tick.
    pub async fn has_pending_flush(&self) -> bool {
        self.state.lock().await.pending_flush
    }

    /// Merge new exercise/set state into the session.
    ///
    /// Writes the local cache immediately and marks a pending remote
    /// flush; does not block on the network. A set already marked done
    /// stays done.
    pub async fn update_exercises(&self, exercises: Vec<ExerciseProgress>) {
        let mut state = self.state.lock().await;
        let now = self.clock.now_utc();

        let Some(session) = state.session.as_mut() else {
            warn!("update_exercises called with no active session");
            return;
        };

        session.exercises = merge_exercises(&session.exercises, exercises);
        session.last_modified_at = now;
        state.pending_flush = true;

        self.write_local(&state).await;
    }

    /// Periodic flush entry point: push to the remote store when a flush
    /// is pending and the session is not paused.
    ///
    /// Returns whether a flush was performed successfully.
    pub async fn flush_if_pending(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.pending_flush {
            return false;
        }
        let Some(session) = &state.session else {
            return false;
        };
        if session.paused {
            debug!("session paused, deferring remote flush");
            return false;
        }

        self.push_remote(&mut state).await
    }

    /// Force an immediate remote flush regardless of the schedule.
    pub async fn save_now(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.session.is_none() {
            return false;
        }
        self.push_remote(&mut state).await
    }

    /// Pause or resume the active-time clock.
    ///
    /// Pausing folds the elapsed wall-clock stretch into
    /// `accumulated_active_seconds`; resuming resets the origin. Both
    /// trigger an immediate remote flush.
    pub async fn toggle_paused(&self, paused: bool) {
        let mut state = self.state.lock().await;
        let now = self.clock.now_utc();

        {
            let st = &mut *state;
            let Some(session) = st.session.as_mut() else {
                warn!("toggle_paused called with no active session");
                return;
            };

            if paused {
                if let Some(origin) = st.active_origin.take() {
                    session.accumulated_active_seconds += (now - origin).num_seconds().max(0);
                }
            } else if st.active_origin.is_none() {
                st.active_origin = Some(now);
            }
            session.paused = paused;
            session.last_modified_at = now;
        }

        state.pending_flush = true;
        self.write_local(&state).await;
        self.push_remote(&mut state).await;
    }

    /// Seconds spent active so far, including the current stretch.
    pub async fn active_seconds(&self) -> i64 {
        let state = self.state.lock().await;
        let Some(session) = &state.session else {
            return 0;
        };

        let running = state
            .active_origin
            .map(|origin| (self.clock.now_utc() - origin).num_seconds().max(0))
            .unwrap_or(0);
        session.accumulated_active_seconds + running
    }

    /// Finish or abandon the workout: delete the remote record and clear
    /// the local cache. Idempotent when no session exists.
    pub async fn finalize_session(&self) {
        let mut state = self.state.lock().await;
        let Some(session) = state.session.take() else {
            return;
        };
        state.pending_flush = false;
        state.active_origin = None;

        if let Err(err) = self.store.delete_active(&session.user_id).await {
            warn!(error = %err, "remote session delete failed");
        }
        if let Err(err) = self.cache.clear().await {
            warn!(error = %err, "local cache clear failed");
        }
        info!(user_id = %session.user_id, "workout session finalized");
    }

    /// Restore a session on load.
    ///
    /// Prefers the remote copy; falls back to the local cache when the
    /// cached session belongs to this user and was touched within the
    /// staleness window. Stale or foreign copies are discarded.
    pub async fn restore(&self, user_id: &str) -> Option<WorkoutSession> {
        match self.store.fetch_active(user_id).await {
            Ok(Some(session)) => {
                debug!(user_id = %user_id, "restored session from remote store");
                return Some(self.adopt(session, false).await);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "remote session fetch failed, trying local cache");
            }
        }

        let cached = match self.cache.load().await {
            Ok(cached) => cached?,
            Err(err) => {
                warn!(error = %err, "local cache read failed");
                return None;
            }
        };

        let age = self.clock.now_utc() - cached.last_modified_at;
        let fresh = age <= ChronoDuration::hours(LOCAL_CACHE_STALE_HOURS);
        if cached.user_id != user_id || !fresh {
            info!(
                user_id = %user_id,
                cached_user = %cached.user_id,
                age_hours = age.num_hours(),
                "discarding stale or foreign cached session"
            );
            if let Err(err) = self.cache.clear().await {
                warn!(error = %err, "local cache clear failed");
            }
            return None;
        }

        debug!(user_id = %user_id, "restored session from local cache");
        // The remote store never saw this state; flush it on the next tick.
        Some(self.adopt(cached, true).await)
    }

    /// Best-effort local-only write, for unload paths that cannot await
    /// network I/O.
    pub async fn persist_local(&self) {
        let state = self.state.lock().await;
        if state.session.is_some() {
            self.write_local(&state).await;
        }
    }

    async fn adopt(&self, session: WorkoutSession, pending_flush: bool) -> WorkoutSession {
        let mut state = self.state.lock().await;
        state.active_origin = if session.paused { None } else { Some(self.clock.now_utc()) };
        state.session = Some(session.clone());
        state.pending_flush = pending_flush;
        self.write_local(&state).await;
        session
    }

    /// Local cache write; failures are logged, the in-memory copy stays
    /// authoritative for this page.
    async fn write_local(&self, state: &SessionState) {
        if let Some(session) = &state.session {
            if let Err(err) = self.cache.save(session).await {
                warn!(error = %err, "local cache write failed");
            }
        }
    }

    /// Remote upsert; on failure the flush stays pending for the next
    /// scheduled tick.
    async fn push_remote(&self, state: &mut SessionState) -> bool {
        let Some(session) = state.session.as_mut() else {
            return false;
        };

        match self.store.upsert_active(session).await {
            Ok(session_id) => {
                let first_write = session.session_id.is_none();
                session.session_id = Some(session_id);
                state.pending_flush = false;
                if first_write {
                    self.write_local(state).await;
                }
                debug!("session flushed to remote store");
                true
            }
            Err(err) => {
                state.pending_flush = true;
                warn!(error = %err, "remote flush failed, will retry");
                false
            }
        }
    }
}

/// Apply incoming exercise state while enforcing that a completed set
/// never reverts to not-done.
fn merge_exercises(
    current: &[ExerciseProgress],
    mut incoming: Vec<ExerciseProgress>,
) -> Vec<ExerciseProgress> {
    for exercise in &mut incoming {
        let Some(existing) = current.iter().find(|e| e.exercise_id == exercise.exercise_id) else {
            continue;
        };
        for set in &mut exercise.sets_performed {
            let was_done = existing
                .sets_performed
                .iter()
                .any(|s| s.set_number == set.set_number && s.done);
            if was_done {
                set.done = true;
            }
        }
    }
    incoming
}

/// Fallback for the impossible state-cleared-during-start case; keeps the
/// public surface panic-free.
fn unreachable_session(user_id: &str) -> WorkoutSession {
    WorkoutSession {
        session_id: None,
        user_id: user_id.to_string(),
        plan_assignment_id: String::new(),
        plan_name: String::new(),
        exercises: Vec::new(),
        started_at: Utc::now(),
        accumulated_active_seconds: 0,
        paused: false,
        last_modified_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use repforge_domain::{RepForgeError, Result, SetRecord};

    use super::*;
    use crate::time::MockClock;

    #[derive(Default)]
    struct MockCache {
        slot: Mutex<Option<WorkoutSession>>,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl SessionCache for MockCache {
        async fn load(&self) -> Result<Option<WorkoutSession>> {
            Ok(self.slot.lock().await.clone())
        }

        async fn save(&self, session: &WorkoutSession) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RepForgeError::Database("disk full".into()));
            }
            *self.slot.lock().await = Some(session.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            *self.slot.lock().await = None;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockStore {
        rows: Mutex<HashMap<String, WorkoutSession>>,
        next_id: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl SessionStore for MockStore {
        async fn fetch_active(&self, user_id: &str) -> Result<Option<WorkoutSession>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepForgeError::Network("offline".into()));
            }
            Ok(self.rows.lock().await.get(user_id).cloned())
        }

        async fn upsert_active(&self, session: &WorkoutSession) -> Result<String> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepForgeError::Network("offline".into()));
            }
            let id = match &session.session_id {
                Some(id) => id.clone(),
                None => format!("sess-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            };
            let mut stored = session.clone();
            stored.session_id = Some(id.clone());
            self.rows.lock().await.insert(session.user_id.clone(), stored);
            Ok(id)
        }

        async fn delete_active(&self, user_id: &str) -> Result<()> {
            self.rows.lock().await.remove(user_id);
            Ok(())
        }
    }

    struct Fixture {
        cache: Arc<MockCache>,
        store: Arc<MockStore>,
        clock: MockClock,
        service: SessionService,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(MockCache::default());
        let store = Arc::new(MockStore::default());
        let clock = MockClock::new();
        let service =
            SessionService::new(cache.clone(), store.clone(), Arc::new(clock.clone()));
        Fixture { cache, store, clock, service }
    }

    fn bench_press() -> ExerciseProgress {
        ExerciseProgress::with_empty_sets("ex-bench", "Bench Press", "chest", 3, "8-10", 90)
    }

    #[tokio::test]
    async fn round_trip_reaches_remote_store() {
        let f = fixture();
        f.service.start_session("assign-1", "Push Day", vec![bench_press()], "user-1").await;

        let mut updated = vec![bench_press()];
        updated[0].sets_performed[0] =
            SetRecord { set_number: 1, weight: Some(80.0), reps: 8, done: true };
        f.service.update_exercises(updated.clone()).await;

        assert!(f.service.save_now().await);

        let rows = f.store.rows.lock().await;
        let stored = rows.get("user-1").unwrap();
        assert_eq!(stored.exercises, updated);
        assert!(stored.session_id.is_some());
    }

    #[tokio::test]
    async fn second_start_replaces_first_remote_row() {
        let f = fixture();
        f.service.start_session("assign-1", "Push Day", vec![bench_press()], "user-1").await;
        f.service.start_session("assign-2", "Pull Day", Vec::new(), "user-1").await;

        let rows = f.store.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get("user-1").unwrap().plan_assignment_id, "assign-2");
    }

    #[tokio::test]
    async fn pause_excludes_time_from_active_accounting() {
        let f = fixture();
        f.service.start_session("assign-1", "Legs", vec![bench_press()], "user-1").await;

        f.clock.advance(Duration::from_secs(10));
        f.service.toggle_paused(true).await;

        f.clock.advance(Duration::from_secs(5));
        f.service.toggle_paused(false).await;

        f.clock.advance(Duration::from_secs(10));
        assert_eq!(f.service.active_seconds().await, 20);

        // Folding on the next pause persists the same total
        f.service.toggle_paused(true).await;
        let session = f.service.current_session().await.unwrap();
        assert_eq!(session.accumulated_active_seconds, 20);
    }

    #[tokio::test]
    async fn done_sets_never_revert() {
        let f = fixture();
        let mut first = vec![bench_press()];
        first[0].sets_performed[0].done = true;
        f.service.start_session("assign-1", "Push Day", first, "user-1").await;

        // Incoming update claims the set is not done
        f.service.update_exercises(vec![bench_press()]).await;

        let session = f.service.current_session().await.unwrap();
        assert!(session.exercises[0].sets_performed[0].done);
    }

    #[tokio::test]
    async fn paused_session_defers_periodic_flush() {
        let f = fixture();
        f.service.start_session("assign-1", "Push Day", vec![bench_press()], "user-1").await;
        f.service.toggle_paused(true).await;

        f.service.update_exercises(vec![bench_press()]).await;
        assert!(f.service.has_pending_flush().await);
        assert!(!f.service.flush_if_pending().await);
        assert!(f.service.has_pending_flush().await);

        f.service.toggle_paused(false).await;
        assert!(!f.service.has_pending_flush().await);
    }

    #[tokio::test]
    async fn failed_flush_stays_pending_and_retries() {
        let f = fixture();
        f.store.fail.store(true, Ordering::SeqCst);
        f.service.start_session("assign-1", "Push Day", vec![bench_press()], "user-1").await;
        assert!(f.service.has_pending_flush().await);

        // Still failing: the flush stays pending
        assert!(!f.service.flush_if_pending().await);
        assert!(f.service.has_pending_flush().await);

        // Back online: the next tick succeeds
        f.store.fail.store(false, Ordering::SeqCst);
        assert!(f.service.flush_if_pending().await);
        assert!(!f.service.has_pending_flush().await);
        assert_eq!(f.store.rows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn restore_prefers_remote_session() {
        let f = fixture();
        let remote = WorkoutSession {
            session_id: Some("sess-remote".into()),
            user_id: "user-1".into(),
            plan_assignment_id: "assign-1".into(),
            plan_name: "Push Day".into(),
            exercises: Vec::new(),
            started_at: f.clock.now_utc(),
            accumulated_active_seconds: 120,
            paused: false,
            last_modified_at: f.clock.now_utc(),
        };
        f.store.rows.lock().await.insert("user-1".into(), remote.clone());

        let restored = f.service.restore("user-1").await.unwrap();
        assert_eq!(restored.session_id.as_deref(), Some("sess-remote"));
        // Adopted into the local cache as well
        assert!(f.cache.slot.lock().await.is_some());
    }

    #[tokio::test]
    async fn stale_cache_is_discarded_on_restore() {
        let f = fixture();
        let mut cached = WorkoutSession {
            session_id: None,
            user_id: "user-1".into(),
            plan_assignment_id: "assign-1".into(),
            plan_name: "Push Day".into(),
            exercises: Vec::new(),
            started_at: f.clock.now_utc(),
            accumulated_active_seconds: 0,
            paused: false,
            last_modified_at: f.clock.now_utc() - ChronoDuration::hours(25),
        };
        *f.cache.slot.lock().await = Some(cached.clone());
        assert!(f.service.restore("user-1").await.is_none());
        assert!(f.cache.slot.lock().await.is_none());

        // A copy 23 hours old is still trusted
        cached.last_modified_at = f.clock.now_utc() - ChronoDuration::hours(23);
        *f.cache.slot.lock().await = Some(cached);
        let restored = f.service.restore("user-1").await.unwrap();
        assert_eq!(restored.user_id, "user-1");
        assert!(f.service.has_pending_flush().await);
    }

    #[tokio::test]
    async fn foreign_cache_is_discarded_on_restore() {
        let f = fixture();
        let cached = WorkoutSession {
            session_id: None,
            user_id: "someone-else".into(),
            plan_assignment_id: "assign-1".into(),
            plan_name: "Push Day".into(),
            exercises: Vec::new(),
            started_at: f.clock.now_utc(),
            accumulated_active_seconds: 0,
            paused: false,
            last_modified_at: f.clock.now_utc(),
        };
        *f.cache.slot.lock().await = Some(cached);

        assert!(f.service.restore("user-1").await.is_none());
        assert!(f.cache.slot.lock().await.is_none());
    }

    #[tokio::test]
    async fn finalize_clears_both_tiers_and_is_idempotent() {
        let f = fixture();
        f.service.start_session("assign-1", "Push Day", vec![bench_press()], "user-1").await;

        f.service.finalize_session().await;
        assert!(f.store.rows.lock().await.is_empty());
        assert!(f.cache.slot.lock().await.is_none());
        assert!(f.service.current_session().await.is_none());

        // No session: a second finalize is a no-op
        f.service.finalize_session().await;
    }

    #[tokio::test]
    async fn local_cache_failure_keeps_memory_authoritative() {
        let f = fixture();
        f.cache.fail_writes.store(true, Ordering::SeqCst);

        f.service.start_session("assign-1", "Push Day", vec![bench_press()], "user-1").await;
        f.service.update_exercises(vec![bench_press()]).await;

        // The in-memory session survives cache write failures
        assert!(f.service.current_session().await.is_some());
    }
}
