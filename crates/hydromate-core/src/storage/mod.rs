mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, GoalConfig, IntakeConfig, NotificationsConfig, ShakeConfig};
pub use database::{Database, IntakeRecord, LAST_ENQUEUE_KEY};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/hydromate[-dev]/` based on HYDROMATE_ENV.
///
/// Set HYDROMATE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HYDROMATE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("hydromate-dev")
    } else {
        base_dir.join("hydromate")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
