//! Desktop stand-ins for the notification surface and permission prompt.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use hydromate_core::reminder::{Notification, NotificationChannel, NotificationSink};
use hydromate_core::PermissionGate;
use tracing::{debug, info, warn};

/// Prints alerting notifications to stdout. Ongoing notices only go to the log.
pub struct ConsoleNotifier {
    granted: AtomicBool,
    channels: Mutex<HashSet<String>>,
}

impl ConsoleNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            channels: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::Relaxed);
    }
}

impl NotificationSink for ConsoleNotifier {
    fn ensure_channel(&self, channel: &NotificationChannel) {
        let created = self
            .channels
            .lock()
            .map(|mut channels| channels.insert(channel.id.clone()))
            .unwrap_or(false);
        if created {
            debug!(channel = %channel.id, importance = ?channel.importance, "notification channel created");
        }
    }

    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::Relaxed)
    }

    fn notify(&self, notification: &Notification) {
        info!(id = notification.id, channel = %notification.channel_id, "notification shown");
        if !notification.ongoing {
            println!("{}: {}", notification.title, notification.body);
        }
    }
}

/// Permission recorded in `notifications.permission_granted`.
pub struct ConfigPermission {
    granted: bool,
}

impl ConfigPermission {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }

    pub fn set_granted(&mut self, granted: bool) {
        self.granted = granted;
    }
}

impl PermissionGate for ConfigPermission {
    fn is_granted(&self) -> bool {
        self.granted
    }

    fn request(&mut self) {
        warn!("notifications not permitted");
        eprintln!(
            "reminders need permission: run `hydromate-cli config set notifications.permission_granted true`"
        );
    }
}
