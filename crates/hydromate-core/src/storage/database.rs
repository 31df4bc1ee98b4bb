//! SQLite-based intake ledger.
//!
//! Provides persistent storage for:
//! - Water intake entries (additions and removals), one row each
//! - Daily totals and the Monday-first week summary
//! - Key-value store for application state such as the reminder enqueue time

use std::path::Path;

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::migrations;
use crate::error::{DatabaseError, Result};
use crate::intake::WeekSummary;

/// kv key holding the enqueue time of the live reminder task.
pub const LAST_ENQUEUE_KEY: &str = "reminder.last_enqueue_ms";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One ledger row. Removals carry a negative `amount_ml` and
/// `is_addition == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub amount_ml: i64,
    pub timestamp_ms: u64,
    pub is_addition: bool,
}

impl IntakeRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let date: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            id: row.get(0)?,
            date,
            amount_ml: row.get(2)?,
            timestamp_ms: row.get::<_, i64>(3)?.max(0) as u64,
            is_addition: row.get(4)?,
        })
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// SQLite database for the intake ledger.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/hydromate/hydromate.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("hydromate.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Append one entry and return its row id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_intake(
        &self,
        date: NaiveDate,
        amount_ml: i64,
        timestamp_ms: u64,
        is_addition: bool,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO water_intake (date, amount_ml, timestamp_ms, is_addition)
             VALUES (?1, ?2, ?3, ?4)",
            params![date_key(date), amount_ml, timestamp_ms as i64, is_addition],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Net total for `date`; 0 when there are no rows.
    pub fn total_for_day(&self, date: NaiveDate) -> Result<i64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(amount_ml), 0) FROM water_intake WHERE date = ?1",
            params![date_key(date)],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// All entries, newest day first and newest entry first within a day.
    pub fn history(&self) -> Result<Vec<IntakeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, amount_ml, timestamp_ms, is_addition
             FROM water_intake ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], IntakeRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Entries for one day in insertion order.
    pub fn history_for_day(&self, date: NaiveDate) -> Result<Vec<IntakeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, amount_ml, timestamp_ms, is_addition
             FROM water_intake WHERE date = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![date_key(date)], IntakeRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Remove the most recent entry of `date`, returning it.
    pub fn delete_last_for_date(&self, date: NaiveDate) -> Result<Option<IntakeRecord>> {
        let last = self
            .conn
            .query_row(
                "SELECT id, date, amount_ml, timestamp_ms, is_addition
                 FROM water_intake WHERE date = ?1 ORDER BY id DESC LIMIT 1",
                params![date_key(date)],
                IntakeRecord::from_row,
            )
            .optional()?;

        if let Some(record) = &last {
            self.conn
                .execute("DELETE FROM water_intake WHERE id = ?1", params![record.id])?;
        }
        Ok(last)
    }

    /// Remove every entry of `date`. Returns the number of rows deleted.
    pub fn delete_all_for_date(&self, date: NaiveDate) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM water_intake WHERE date = ?1",
            params![date_key(date)],
        )?;
        Ok(n)
    }

    /// Totals for the Monday..Sunday week containing `date`.
    pub fn week_summary(&self, date: NaiveDate) -> Result<WeekSummary> {
        let start = WeekSummary::week_start(date);
        let end = start + Duration::days(6);

        let mut stmt = self.conn.prepare(
            "SELECT date, SUM(amount_ml) FROM water_intake
             WHERE date >= ?1 AND date <= ?2
             GROUP BY date",
        )?;
        let totals = stmt
            .query_map(params![date_key(start), date_key(end)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let days = std::array::from_fn(|i| {
            let day = start + Duration::days(i as i64);
            let key = date_key(day);
            let total = totals
                .iter()
                .find(|(d, _)| *d == key)
                .map_or(0, |(_, t)| *t);
            (day, total)
        });

        Ok(WeekSummary { start, end, days })
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Enqueue time of the live reminder task, if one was ever recorded.
    pub fn last_enqueue_ms(&self) -> Result<Option<u64>> {
        Ok(self
            .kv_get(LAST_ENQUEUE_KEY)?
            .and_then(|v| v.parse::<u64>().ok()))
    }

    pub fn set_last_enqueue_ms(&self, enqueue_time_ms: u64) -> Result<()> {
        self.kv_set(LAST_ENQUEUE_KEY, &enqueue_time_ms.to_string())
    }
}
