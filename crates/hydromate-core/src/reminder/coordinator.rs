//! Reminder schedule coordinator.
//!
//! A small state machine over the notifications toggle, the notification
//! permission and the reminder frequency. It only ever talks to the task
//! registry through the unique [`WORK_NAME`], always with the replace policy,
//! so a reschedule can never leave two reminder tasks behind.
//!
//! ```text
//! Unscheduled --enabled & granted--> Scheduled(h)
//! Scheduled(h) --frequency h'--> Scheduled(h')
//! Scheduled(h) --disabled--> Unscheduled
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::task::{ExistingTaskPolicy, PeriodicTaskRequest, PeriodicWork, TaskInput, TaskScheduler};
use super::worker::WORK_NAME;

pub const MIN_FREQUENCY_HOURS: u32 = 1;
pub const MAX_FREQUENCY_HOURS: u32 = 8;

/// The inputs the coordinator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub frequency_hours: u32,
}

impl ReminderSettings {
    fn clamped_frequency(&self) -> u32 {
        self.frequency_hours
            .clamp(MIN_FREQUENCY_HOURS, MAX_FREQUENCY_HOURS)
    }
}

/// Notification permission as granted by the platform.
pub trait PermissionGate {
    fn is_granted(&self) -> bool;
    /// Ask the user. The answer comes back through
    /// [`ReminderCoordinator::on_permission_result`].
    fn request(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScheduleState {
    Unscheduled,
    Scheduled { frequency_hours: u32 },
}

/// Result of feeding settings into the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    Scheduled {
        frequency_hours: u32,
        enqueue_time_ms: u64,
    },
    Rescheduled {
        from_hours: u32,
        to_hours: u32,
        enqueue_time_ms: u64,
    },
    Cancelled,
    PermissionRequested,
    Unchanged,
}

pub struct ReminderCoordinator<S, P> {
    scheduler: S,
    permission: P,
    work: Arc<dyn PeriodicWork>,
    state: ScheduleState,
    awaiting_permission: bool,
    last_enqueue_ms: Option<u64>,
}

impl<S: TaskScheduler, P: PermissionGate> ReminderCoordinator<S, P> {
    pub fn new(scheduler: S, permission: P, work: Arc<dyn PeriodicWork>) -> Self {
        Self {
            scheduler,
            permission,
            work,
            state: ScheduleState::Unscheduled,
            awaiting_permission: false,
            last_enqueue_ms: None,
        }
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn last_enqueue_ms(&self) -> Option<u64> {
        self.last_enqueue_ms
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn permission_mut(&mut self) -> &mut P {
        &mut self.permission
    }

    /// React to the current settings.
    ///
    /// Settings identical to the active schedule are a no-op, so callers may
    /// re-apply on every poll without restarting the interval.
    pub fn apply(&mut self, settings: &ReminderSettings, now_ms: u64) -> Transition {
        if !settings.enabled {
            self.awaiting_permission = false;
            return self.cancel();
        }

        if !self.permission.is_granted() {
            if self.awaiting_permission {
                return Transition::Unchanged;
            }
            info!("notification permission missing, requesting");
            self.awaiting_permission = true;
            self.permission.request();
            return Transition::PermissionRequested;
        }
        self.awaiting_permission = false;
        self.schedule_for(settings, now_ms)
    }

    /// Answer to an earlier [`PermissionGate::request`].
    ///
    /// A grant schedules right away. The gate is not consulted again, so a
    /// status check that still reports the old answer does not block it.
    pub fn on_permission_result(
        &mut self,
        granted: bool,
        settings: &ReminderSettings,
        now_ms: u64,
    ) -> Transition {
        self.awaiting_permission = false;
        if !granted {
            info!("notification permission denied");
            return Transition::Unchanged;
        }
        if !settings.enabled {
            return self.cancel();
        }
        self.schedule_for(settings, now_ms)
    }

    fn schedule_for(&mut self, settings: &ReminderSettings, now_ms: u64) -> Transition {
        let frequency_hours = settings.clamped_frequency();
        match self.state {
            ScheduleState::Scheduled { frequency_hours: current }
                if current == frequency_hours && self.scheduler.is_scheduled(WORK_NAME) =>
            {
                debug!(frequency_hours, "reminder already scheduled");
                Transition::Unchanged
            }
            ScheduleState::Scheduled { frequency_hours: from_hours } => {
                self.schedule(frequency_hours, now_ms);
                Transition::Rescheduled {
                    from_hours,
                    to_hours: frequency_hours,
                    enqueue_time_ms: now_ms,
                }
            }
            ScheduleState::Unscheduled => {
                self.schedule(frequency_hours, now_ms);
                Transition::Scheduled {
                    frequency_hours,
                    enqueue_time_ms: now_ms,
                }
            }
        }
    }

    fn schedule(&mut self, frequency_hours: u32, now_ms: u64) {
        let request = PeriodicTaskRequest {
            name: WORK_NAME.to_string(),
            interval: Duration::from_secs(u64::from(frequency_hours) * 3600),
            input: TaskInput {
                enqueue_time_ms: now_ms,
            },
            work: self.work.clone(),
        };
        self.scheduler
            .enqueue_unique_periodic(request, ExistingTaskPolicy::Replace);
        self.state = ScheduleState::Scheduled { frequency_hours };
        self.last_enqueue_ms = Some(now_ms);
        info!(frequency_hours, "reminder scheduled");
    }

    fn cancel(&mut self) -> Transition {
        let removed = self.scheduler.cancel_unique(WORK_NAME);
        let was_scheduled = matches!(self.state, ScheduleState::Scheduled { .. });
        self.state = ScheduleState::Unscheduled;
        if was_scheduled || removed {
            info!("reminder cancelled");
            Transition::Cancelled
        } else {
            Transition::Unchanged
        }
    }
}
