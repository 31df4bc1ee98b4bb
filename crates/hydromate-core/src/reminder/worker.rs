//! Reminder task handler.
//!
//! Periodic schedulers tend to run a freshly registered task once right away.
//! A firing less than [`GRACE_PERIOD`] after the enqueue stamp is treated as
//! that spurious run and exits without a notification.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::task::{PeriodicWork, TaskInput, WorkOutcome};

pub const WORK_NAME: &str = "waterReminderWork";
pub const CHANNEL_ID: &str = "water_reminder_channel";
pub const NOTIFICATION_ID: i32 = 1;
pub const MOTION_CHANNEL_ID: &str = "sensor_service_channel";
pub const MOTION_NOTIFICATION_ID: i32 = 2;
pub const GRACE_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: Importance,
}

impl NotificationChannel {
    pub fn reminders() -> Self {
        Self {
            id: CHANNEL_ID.to_string(),
            name: "Hydration reminders".to_string(),
            description: "Reminders to drink water.".to_string(),
            importance: Importance::High,
        }
    }

    /// Quiet channel for the ongoing "listening for shakes" notice.
    pub fn motion_service() -> Self {
        Self {
            id: MOTION_CHANNEL_ID.to_string(),
            name: "Shake detection".to_string(),
            description: "Shown while shakes are being detected.".to_string(),
            importance: Importance::Low,
        }
    }
}

/// Where tapping the notification leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapAction {
    OpenMainScreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i32,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub tap_action: TapAction,
    pub auto_cancel: bool,
    /// Stays up until withdrawn instead of alerting once.
    pub ongoing: bool,
}

impl Notification {
    pub fn reminder() -> Self {
        Self {
            id: NOTIFICATION_ID,
            channel_id: CHANNEL_ID.to_string(),
            title: "Time for water!".to_string(),
            body: "Don't forget to drink a glass of water to stay hydrated.".to_string(),
            tap_action: TapAction::OpenMainScreen,
            auto_cancel: true,
            ongoing: false,
        }
    }

    pub fn motion_service() -> Self {
        Self {
            id: MOTION_NOTIFICATION_ID,
            channel_id: MOTION_CHANNEL_ID.to_string(),
            title: "Hydromate".to_string(),
            body: "Listening for shakes. Shake to log a glass of water.".to_string(),
            tap_action: TapAction::OpenMainScreen,
            auto_cancel: false,
            ongoing: true,
        }
    }
}

/// Platform notification surface.
pub trait NotificationSink: Send + Sync {
    /// Create the channel if it does not exist yet. Must be idempotent.
    fn ensure_channel(&self, channel: &NotificationChannel);
    fn permission_granted(&self) -> bool;
    fn notify(&self, notification: &Notification);
}

pub struct ReminderWorker {
    sink: Arc<dyn NotificationSink>,
}

impl ReminderWorker {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    fn within_grace(input: &TaskInput, now_ms: u64) -> bool {
        input.enqueue_time_ms > 0
            && now_ms.saturating_sub(input.enqueue_time_ms) < GRACE_PERIOD.as_millis() as u64
    }
}

impl PeriodicWork for ReminderWorker {
    fn run(&self, input: &TaskInput, now_ms: u64) -> WorkOutcome {
        if Self::within_grace(input, now_ms) {
            debug!(
                enqueued_ms = input.enqueue_time_ms,
                now_ms, "reminder fired inside grace period, suppressed"
            );
            return WorkOutcome::Suppressed;
        }

        self.sink.ensure_channel(&NotificationChannel::reminders());
        if !self.sink.permission_granted() {
            warn!("notification permission missing, reminder skipped");
            return WorkOutcome::PermissionMissing;
        }
        self.sink.notify(&Notification::reminder());
        info!("hydration reminder sent");
        WorkOutcome::Notified
    }
}

/// In-memory sink that records what it was asked to do.
#[derive(Debug)]
pub struct MemorySink {
    granted: Mutex<bool>,
    channels: Mutex<HashSet<String>>,
    sent: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: Mutex::new(granted),
            channels: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        if let Ok(mut g) = self.granted.lock() {
            *g = granted;
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl NotificationSink for MemorySink {
    fn ensure_channel(&self, channel: &NotificationChannel) {
        if let Ok(mut channels) = self.channels.lock() {
            channels.insert(channel.id.clone());
        }
    }

    fn permission_granted(&self) -> bool {
        self.granted.lock().map(|g| *g).unwrap_or(false)
    }

    fn notify(&self, notification: &Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(granted: bool) -> (ReminderWorker, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new(granted));
        (ReminderWorker::new(sink.clone()), sink)
    }

    #[test]
    fn firing_inside_grace_is_suppressed() {
        let (w, sink) = worker(true);
        let input = TaskInput { enqueue_time_ms: 1_000_000 };
        assert_eq!(w.run(&input, 1_000_000), WorkOutcome::Suppressed);
        assert_eq!(w.run(&input, 1_059_999), WorkOutcome::Suppressed);
        assert!(sink.sent().is_empty());
        assert_eq!(sink.channel_count(), 0);
    }

    #[test]
    fn firing_at_grace_boundary_notifies() {
        let (w, sink) = worker(true);
        let input = TaskInput { enqueue_time_ms: 1_000_000 };
        assert_eq!(w.run(&input, 1_060_000), WorkOutcome::Notified);
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, CHANNEL_ID);
        assert_eq!(sent[0].tap_action, TapAction::OpenMainScreen);
    }

    #[test]
    fn unknown_enqueue_time_is_never_suppressed() {
        let (w, _) = worker(true);
        assert_eq!(w.run(&TaskInput::default(), 5), WorkOutcome::Notified);
    }

    #[test]
    fn clock_behind_enqueue_counts_as_inside_grace() {
        let (w, _) = worker(true);
        let input = TaskInput { enqueue_time_ms: 2_000_000 };
        assert_eq!(w.run(&input, 1_000_000), WorkOutcome::Suppressed);
    }

    #[test]
    fn missing_permission_skips_but_creates_channel_once() {
        let (w, sink) = worker(false);
        let input = TaskInput { enqueue_time_ms: 1 };
        assert_eq!(w.run(&input, 10_000_000), WorkOutcome::PermissionMissing);
        assert_eq!(w.run(&input, 20_000_000), WorkOutcome::PermissionMissing);
        assert!(sink.sent().is_empty());
        assert_eq!(sink.channel_count(), 1);

        sink.set_granted(true);
        assert_eq!(w.run(&input, 30_000_000), WorkOutcome::Notified);
        assert_eq!(sink.sent().len(), 1);
    }

    #[test]
    fn motion_notice_uses_its_own_quiet_channel() {
        let channel = NotificationChannel::motion_service();
        assert_eq!(channel.importance, Importance::Low);
        assert_ne!(channel.id, NotificationChannel::reminders().id);

        let notice = Notification::motion_service();
        assert_eq!(notice.channel_id, channel.id);
        assert_eq!(notice.id, MOTION_NOTIFICATION_ID);
        assert!(notice.ongoing);
        assert!(!Notification::reminder().ongoing);

        let sink = MemorySink::new(true);
        sink.ensure_channel(&NotificationChannel::reminders());
        sink.ensure_channel(&channel);
        sink.ensure_channel(&channel);
        assert_eq!(sink.channel_count(), 2);
    }
}
