//! Alert deduplication guard
//!
//! Both the background context and the local fallback clock can detect
//! "timer complete" inside a narrow race window. This guard makes the
//! first caller win: it records a firing timestamp per timer id and
//! answers `can_fire` with false for the cooldown window. Eviction is
//! lazy; expired entries are swept on access, no external timers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use repforge_domain::constants::{ALERT_COOLDOWN_MS, DEDUP_EVICTION_MARGIN_MS};

/// In-memory first-caller-wins registry of fired alerts
///
/// Process-lifetime scoped; all rest-timer controllers share one guard,
/// each touching only entries keyed by its own timer id.
pub struct AlertDedupGuard {
    fired: Mutex<HashMap<String, Instant>>,
    cooldown: Duration,
}

impl AlertDedupGuard {
    /// Create a guard with the standard cooldown window.
    pub fn new() -> Self {
        Self::with_cooldown(Duration::from_millis(ALERT_COOLDOWN_MS))
    }

    /// Create a guard with a custom cooldown window.
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self { fired: Mutex::new(HashMap::new()), cooldown }
    }

    /// Whether an alert for this timer id may fire now.
    ///
    /// True unless a firing was recorded within the cooldown window.
    pub fn can_fire(&self, timer_id: &str) -> bool {
        let mut fired = self.fired.lock();
        Self::sweep(&mut fired, self.cooldown);

        match fired.get(timer_id) {
            Some(at) => at.elapsed() >= self.cooldown,
            None => true,
        }
    }

    /// Record that an alert fired for this timer id.
    pub fn mark_fired(&self, timer_id: &str) {
        let mut fired = self.fired.lock();
        Self::sweep(&mut fired, self.cooldown);
        fired.insert(timer_id.to_string(), Instant::now());
    }

    /// Number of live entries, for diagnostics.
    pub fn len(&self) -> usize {
        let mut fired = self.fired.lock();
        Self::sweep(&mut fired, self.cooldown);
        fired.len()
    }

    /// Whether the registry is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries past the cooldown plus a small margin.
    fn sweep(fired: &mut HashMap<String, Instant>, cooldown: Duration) {
        let ttl = cooldown + Duration::from_millis(DEDUP_EVICTION_MARGIN_MS);
        fired.retain(|_, at| at.elapsed() < ttl);
    }
}

impl Default for AlertDedupGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_caller_wins_within_cooldown() {
        let guard = AlertDedupGuard::new();

        assert!(guard.can_fire("timer-1"));
        guard.mark_fired("timer-1");

        // Repeated completion paths inside the window are silent no-ops
        for _ in 0..5 {
            assert!(!guard.can_fire("timer-1"));
        }
    }

    #[test]
    fn timers_do_not_interfere() {
        let guard = AlertDedupGuard::new();

        guard.mark_fired("timer-1");
        assert!(!guard.can_fire("timer-1"));
        assert!(guard.can_fire("timer-2"));
    }

    #[test]
    fn cooldown_expiry_allows_refire() {
        let guard = AlertDedupGuard::with_cooldown(Duration::from_millis(30));

        guard.mark_fired("timer-1");
        assert!(!guard.can_fire("timer-1"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(guard.can_fire("timer-1"));
    }

    #[test]
    fn expired_entries_are_evicted_lazily() {
        let guard = AlertDedupGuard::with_cooldown(Duration::from_millis(20));

        guard.mark_fired("timer-1");
        guard.mark_fired("timer-2");
        assert_eq!(guard.len(), 2);

        std::thread::sleep(Duration::from_millis(60));
        assert!(guard.is_empty());
    }
}
