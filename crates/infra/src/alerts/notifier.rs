//! Desktop notification adapter

use async_trait::async_trait;
use notify_rust::Notification;
use repforge_core::alerts::SystemNotifier;
use repforge_domain::{RepForgeError, Result};
use tokio::task;

/// OS notifications through the desktop notification daemon
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    /// Create a notifier with the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self { app_name: app_name.into() }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("repforge")
    }
}

#[async_trait]
impl SystemNotifier for DesktopNotifier {
    async fn request_permission(&self) -> bool {
        // Desktop notification daemons need no runtime permission grant
        true
    }

    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        let app_name = self.app_name.clone();
        let title = title.to_string();
        let body = body.to_string();

        task::spawn_blocking(move || {
            Notification::new()
                .appname(&app_name)
                .summary(&title)
                .body(&body)
                .icon("alarm-clock")
                .show()
                .map(|_| ())
                .map_err(|e| RepForgeError::Platform(format!("Notification failed: {e}")))
        })
        .await
        .map_err(|e| RepForgeError::Internal(format!("Blocking task failed: {e}")))?
    }
}
