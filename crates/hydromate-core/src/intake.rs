//! Daily intake tracking on top of the ledger.
//!
//! The ledger is append-only per entry: removing water appends a negative
//! row instead of editing earlier ones. Undo and reset are the only deletes.

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ValidationError};
use crate::reminder::now_ms;
use crate::storage::{Database, IntakeRecord};

/// Source of "today" for the tracker.
pub type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Progress towards the daily goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub total_ml: i64,
    pub goal_ml: u32,
    /// `total / goal`, clamped to `0.0..=1.0`.
    pub fraction: f64,
}

impl DailyProgress {
    pub fn new(date: NaiveDate, total_ml: i64, goal_ml: u32) -> Self {
        let fraction = if goal_ml == 0 {
            0.0
        } else {
            (total_ml as f64 / f64::from(goal_ml)).clamp(0.0, 1.0)
        };
        Self {
            date,
            total_ml,
            goal_ml,
            fraction,
        }
    }

    pub fn remaining_ml(&self) -> i64 {
        (i64::from(self.goal_ml) - self.total_ml).max(0)
    }

    pub fn goal_reached(&self) -> bool {
        self.total_ml >= i64::from(self.goal_ml)
    }
}

/// Daily totals for one Monday..Sunday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: [(NaiveDate, i64); 7],
}

impl WeekSummary {
    /// Monday of the week containing `date`.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
    }

    pub fn total_ml(&self) -> i64 {
        self.days.iter().map(|(_, t)| t).sum()
    }

    pub fn days_meeting(&self, goal_ml: u32) -> usize {
        self.days
            .iter()
            .filter(|(_, t)| *t >= i64::from(goal_ml))
            .count()
    }
}

pub struct HydrationTracker {
    db: Database,
    goal_ml: u32,
    today: Today,
}

impl HydrationTracker {
    /// Tracker keyed on the local calendar date.
    pub fn new(db: Database, goal_ml: u32) -> Self {
        Self::with_today(db, goal_ml, Arc::new(|| Local::now().date_naive()))
    }

    pub fn with_today(db: Database, goal_ml: u32, today: Today) -> Self {
        Self { db, goal_ml, today }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn goal_ml(&self) -> u32 {
        self.goal_ml
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    /// Append an addition for today.
    ///
    /// # Errors
    /// Fails validation when `amount_ml` is zero.
    pub fn add_water(&self, amount_ml: u32) -> Result<IntakeRecord> {
        if amount_ml == 0 {
            return Err(ValidationError::InvalidValue {
                field: "amount_ml".into(),
                message: "must be greater than 0".into(),
            }
            .into());
        }
        let record = self.append(i64::from(amount_ml), true)?;
        info!(amount_ml, date = %record.date, "water added");
        Ok(record)
    }

    /// Append a removal for today, capped at the current total.
    ///
    /// Returns `None` when today's total is already zero.
    pub fn remove_water(&self, amount_ml: u32) -> Result<Option<IntakeRecord>> {
        let date = self.today();
        let total = self.db.total_for_day(date)?;
        let removed = i64::from(amount_ml).min(total);
        if removed <= 0 {
            debug!(total, "nothing to remove");
            return Ok(None);
        }
        let record = self.append(-removed, false)?;
        info!(removed_ml = removed, %date, "water removed");
        Ok(Some(record))
    }

    /// Delete today's most recent entry.
    pub fn undo_last(&self) -> Result<Option<IntakeRecord>> {
        let undone = self.db.delete_last_for_date(self.today())?;
        if let Some(record) = &undone {
            info!(id = record.id, amount_ml = record.amount_ml, "entry undone");
        }
        Ok(undone)
    }

    /// Delete every entry of today. Returns the number of entries removed.
    pub fn reset_today(&self) -> Result<usize> {
        let date = self.today();
        let n = self.db.delete_all_for_date(date)?;
        info!(entries = n, %date, "day reset");
        Ok(n)
    }

    pub fn progress(&self) -> Result<DailyProgress> {
        let date = self.today();
        let total = self.db.total_for_day(date)?;
        Ok(DailyProgress::new(date, total, self.goal_ml))
    }

    pub fn week(&self, date: Option<NaiveDate>) -> Result<WeekSummary> {
        self.db.week_summary(date.unwrap_or_else(|| self.today()))
    }

    fn append(&self, amount_ml: i64, is_addition: bool) -> Result<IntakeRecord> {
        let date = self.today();
        let timestamp_ms = now_ms();
        let id = self
            .db
            .record_intake(date, amount_ml, timestamp_ms, is_addition)?;
        Ok(IntakeRecord {
            id,
            date,
            amount_ml,
            timestamp_ms,
            is_addition,
        })
    }
}
