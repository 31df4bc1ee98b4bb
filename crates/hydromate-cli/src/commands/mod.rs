pub mod config;
pub mod intake;
pub mod reminder;
pub mod shake;
pub mod watch;

use hydromate_core::storage::Database;
use hydromate_core::{Config, Event, HydrationTracker};

/// Tracker over the default database, using the configured goal.
pub fn open_tracker(config: &Config) -> Result<HydrationTracker, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(HydrationTracker::new(db, config.goal.daily_ml))
}

/// One JSON line per event on stdout.
pub fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
