use parking_lot::Mutex;
use std::sync::Arc;

use crate::ports::{Notification, Notifier};

/// Collects notifications for assertions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NotificationLevel;

    #[test]
    fn records_in_order() {
        let notifier = InMemoryNotifier::new();
        notifier.notify(Notification::error("Undo failed", "a"));
        notifier.notify(Notification::info("Saved", "b"));

        let received = notifier.notifications();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].level, NotificationLevel::Error);
        assert!(received[0].transient);
        assert_eq!(received[1].message, "b");
    }
}
