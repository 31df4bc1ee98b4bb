//! Periodic hydration reminders.
//!
//! - [`ReminderCoordinator`] turns settings into schedule/cancel calls
//! - [`TaskRegistry`] runs uniquely named periodic tasks on tokio
//! - [`ReminderWorker`] is the task body, with grace-period suppression

mod coordinator;
mod registry;
mod task;
mod worker;

pub use coordinator::{
    PermissionGate, ReminderCoordinator, ReminderSettings, ScheduleState, Transition,
    MAX_FREQUENCY_HOURS, MIN_FREQUENCY_HOURS,
};
pub use registry::{Clock, TaskRegistry, MIN_PERIODIC_INTERVAL};
pub use task::{
    EnqueueOutcome, ExistingTaskPolicy, PeriodicTaskRequest, PeriodicWork, TaskInput,
    TaskScheduler, WorkOutcome,
};
pub use worker::{
    Importance, MemorySink, Notification, NotificationChannel, NotificationSink, ReminderWorker,
    TapAction, CHANNEL_ID, GRACE_PERIOD, MOTION_CHANNEL_ID, MOTION_NOTIFICATION_ID, NOTIFICATION_ID,
    WORK_NAME,
};

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
