use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::intake::DailyProgress;
use crate::reminder::{Transition, WorkOutcome};
use crate::storage::IntakeRecord;

/// Every state change in the system produces an Event.
/// The CLI prints them as JSON lines; `watch` also logs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ShakeDetected {
        at: DateTime<Utc>,
    },
    IntakeAdded {
        date: NaiveDate,
        amount_ml: i64,
        total_ml: i64,
        at: DateTime<Utc>,
    },
    IntakeRemoved {
        date: NaiveDate,
        amount_ml: i64,
        total_ml: i64,
        at: DateTime<Utc>,
    },
    IntakeUndone {
        date: NaiveDate,
        amount_ml: i64,
        total_ml: i64,
        at: DateTime<Utc>,
    },
    DayReset {
        date: NaiveDate,
        entries: usize,
        at: DateTime<Utc>,
    },
    ReminderScheduled {
        frequency_hours: u32,
        enqueue_time_ms: u64,
        at: DateTime<Utc>,
    },
    ReminderCancelled {
        at: DateTime<Utc>,
    },
    ReminderFired {
        at: DateTime<Utc>,
    },
    /// Firing inside the grace period after enqueue.
    ReminderSuppressed {
        at: DateTime<Utc>,
    },
    PermissionRequested {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Event for a ledger write, given the day's total after it.
    pub fn for_record(record: &IntakeRecord, progress: &DailyProgress) -> Self {
        let at = Utc::now();
        if record.is_addition {
            Event::IntakeAdded {
                date: record.date,
                amount_ml: record.amount_ml,
                total_ml: progress.total_ml,
                at,
            }
        } else {
            Event::IntakeRemoved {
                date: record.date,
                amount_ml: record.amount_ml,
                total_ml: progress.total_ml,
                at,
            }
        }
    }

    pub fn undone(record: &IntakeRecord, progress: &DailyProgress) -> Self {
        Event::IntakeUndone {
            date: record.date,
            amount_ml: record.amount_ml,
            total_ml: progress.total_ml,
            at: Utc::now(),
        }
    }

    /// `None` for transitions that changed nothing.
    pub fn from_transition(transition: Transition) -> Option<Self> {
        let at = Utc::now();
        match transition {
            Transition::Scheduled {
                frequency_hours,
                enqueue_time_ms,
            }
            | Transition::Rescheduled {
                to_hours: frequency_hours,
                enqueue_time_ms,
                ..
            } => Some(Event::ReminderScheduled {
                frequency_hours,
                enqueue_time_ms,
                at,
            }),
            Transition::Cancelled => Some(Event::ReminderCancelled { at }),
            Transition::PermissionRequested => Some(Event::PermissionRequested { at }),
            Transition::Unchanged => None,
        }
    }

    /// `None` when the run was skipped for lack of permission.
    pub fn from_outcome(outcome: WorkOutcome) -> Option<Self> {
        let at = Utc::now();
        match outcome {
            WorkOutcome::Notified => Some(Event::ReminderFired { at }),
            WorkOutcome::Suppressed => Some(Event::ReminderSuppressed { at }),
            WorkOutcome::PermissionMissing => None,
        }
    }
}
