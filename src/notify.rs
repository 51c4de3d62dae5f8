//! User-facing notifications, delivered fire-and-forget.
//!
//! The core never depends on delivery: a notifier that drops messages only
//! loses the toast, never the state transition that produced it.

use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, duration: Duration);
}

/// Production notifier: surfaces notifications as structured log events for
/// whatever UI transport tails them.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, description: &str, duration: Duration) {
        info!(
            title = title,
            description = description,
            duration_ms = duration.as_millis() as u64,
            "notification"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub duration: Duration,
}

/// Test notifier that records every notification it is handed.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Titles only, in delivery order.
    pub fn titles(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.title)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, description: &str, duration: Duration) {
        if let Ok(mut guard) = self.notifications.lock() {
            guard.push(Notification {
                title: title.to_string(),
                description: description.to_string(),
                duration,
            });
        }
    }
}
