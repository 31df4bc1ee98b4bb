//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Shake gesture toggle and detector tuning
//! - Reminder toggle, frequency and the notification permission stand-in
//! - Daily goal
//! - Amount added per tap or shake
//!
//! Configuration is stored at `~/.config/hydromate/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::reminder::{ReminderSettings, MAX_FREQUENCY_HOURS, MIN_FREQUENCY_HOURS};
use crate::shake::{ShakeSettings, MIN_SAMPLE_INTERVAL_MS, SHAKE_COOLDOWN_MS, SHAKE_THRESHOLD};

pub const MIN_DAILY_GOAL_ML: u32 = 1500;
pub const MAX_DAILY_GOAL_ML: u32 = 5000;
pub const MIN_AMOUNT_ML: u32 = 50;
pub const MAX_AMOUNT_ML: u32 = 500;

/// Shake gesture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShakeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_min_sample_interval_ms")]
    pub min_sample_interval_ms: u64,
}

/// Reminder notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_frequency_hours")]
    pub frequency_hours: u32,
    /// Whether the user allowed notifications. Desktop builds have no OS
    /// prompt, so the grant is recorded here.
    #[serde(default = "default_true")]
    pub permission_granted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalConfig {
    #[serde(default = "default_daily_ml")]
    pub daily_ml: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_amount_ml")]
    pub default_amount_ml: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/hydromate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shake: ShakeConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub goal: GoalConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_threshold() -> f64 {
    SHAKE_THRESHOLD
}
fn default_cooldown_ms() -> u64 {
    SHAKE_COOLDOWN_MS
}
fn default_min_sample_interval_ms() -> u64 {
    MIN_SAMPLE_INTERVAL_MS
}
fn default_frequency_hours() -> u32 {
    2
}
fn default_daily_ml() -> u32 {
    3000
}
fn default_amount_ml() -> u32 {
    250
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_threshold(),
            cooldown_ms: default_cooldown_ms(),
            min_sample_interval_ms: default_min_sample_interval_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_hours: default_frequency_hours(),
            permission_granted: true,
        }
    }
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            daily_ml: default_daily_ml(),
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_amount_ml: default_amount_ml(),
        }
    }
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Number(n) if n.is_f64() => value
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Update one value in memory. The result must pass [`validate`](Self::validate).
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and persist. Returns error if key is unknown or
    /// the value is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range(
            "notifications.frequency_hours",
            i64::from(self.notifications.frequency_hours),
            i64::from(MIN_FREQUENCY_HOURS),
            i64::from(MAX_FREQUENCY_HOURS),
        )?;
        check_range(
            "goal.daily_ml",
            i64::from(self.goal.daily_ml),
            i64::from(MIN_DAILY_GOAL_ML),
            i64::from(MAX_DAILY_GOAL_ML),
        )?;
        check_range(
            "intake.default_amount_ml",
            i64::from(self.intake.default_amount_ml),
            i64::from(MIN_AMOUNT_ML),
            i64::from(MAX_AMOUNT_ML),
        )?;
        if !(self.shake.threshold.is_finite() && self.shake.threshold > 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "shake.threshold".into(),
                message: "must be a positive number".into(),
            });
        }
        Ok(())
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            enabled: self.notifications.enabled,
            frequency_hours: self.notifications.frequency_hours,
        }
    }

    pub fn shake_settings(&self) -> ShakeSettings {
        ShakeSettings {
            threshold: self.shake.threshold,
            min_sample_interval_ms: self.shake.min_sample_interval_ms,
            cooldown_ms: self.shake.cooldown_ms,
        }
    }
}
