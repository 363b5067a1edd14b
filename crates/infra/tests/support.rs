//! Shared fixtures for infra integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use repforge_core::alerts::{SystemNotifier, TonePlayer};
use repforge_domain::Result;
use repforge_infra::database::DbManager;

/// Temporary database wrapper that keeps the underlying file alive for
/// the duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: tempfile::TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with default configuration.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifier double counting deliveries.
#[derive(Default)]
pub struct StubNotifier {
    pub notifications: AtomicUsize,
}

#[async_trait]
impl SystemNotifier for StubNotifier {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Tone player double counting plays.
#[derive(Default)]
pub struct StubPlayer {
    pub plays: AtomicUsize,
}

impl TonePlayer for StubPlayer {
    fn play(&self, _samples: &[f32], _sample_rate: u32) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Initialize tracing output once for the test binary.
pub fn init_tracing() {
    static INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt().with_env_filter("info").with_test_writer().try_init();
    });
}
