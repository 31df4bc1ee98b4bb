//! # Hydromate Core Library
//!
//! Core logic for the Hydromate hydration tracker. Every operation is
//! available through the standalone `hydromate-cli` binary, which is a thin
//! layer over this library.
//!
//! ## Architecture
//!
//! - **Shake**: accelerometer samples are filtered into discrete shake
//!   events and broadcast to subscribers
//! - **Reminder**: a coordinator keeps exactly one periodic reminder task
//!   scheduled, matching the notification settings
//! - **Intake**: SQLite ledger of water entries with daily and weekly views
//! - **Storage**: SQLite database and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ShakeDetector`]: Motion sample filter
//! - [`MotionListener`]: Sensor lifecycle and shake publishing
//! - [`ReminderCoordinator`]: Settings-driven reminder scheduling
//! - [`HydrationTracker`]: Add, remove, undo and progress over the ledger
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod intake;
pub mod reminder;
pub mod shake;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use intake::{DailyProgress, HydrationTracker, WeekSummary};
pub use reminder::{
    NotificationSink, PermissionGate, ReminderCoordinator, ReminderSettings, ReminderWorker,
    TaskRegistry, Transition,
};
pub use shake::{MotionListener, MotionSample, ShakeBus, ShakeDetector, ShakeEvent, ShakeSettings};
pub use storage::{Config, Database, IntakeRecord};
