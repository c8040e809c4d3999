use crate::ports::{Notification, NotificationLevel, Notifier};

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification { title, message, .. } = &notification;
        match notification.level {
            NotificationLevel::Info => tracing::info!(%title, %message, "Notification"),
            NotificationLevel::Warning => tracing::warn!(%title, %message, "Notification"),
            NotificationLevel::Error => tracing::error!(%title, %message, "Notification"),
        }
    }
}
