use std::sync::Arc;

use clap::Subcommand;
use hydromate_core::reminder::{
    now_ms, PeriodicWork, ReminderWorker, TaskInput, GRACE_PERIOD, WORK_NAME,
};
use hydromate_core::storage::Database;
use hydromate_core::{Config, Event};
use serde::Serialize;

use super::print_event;
use crate::platform::ConsoleNotifier;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Print reminder settings and the last enqueue time as JSON
    Status,
    /// Run the reminder task once against the recorded enqueue time
    Fire {
        /// Override the current wall-clock time (ms since epoch)
        #[arg(long)]
        now_ms: Option<u64>,
    },
}

#[derive(Serialize)]
struct ReminderStatus {
    work_name: &'static str,
    enabled: bool,
    frequency_hours: u32,
    permission_granted: bool,
    last_enqueue_ms: Option<u64>,
    in_grace_period: bool,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let last_enqueue_ms = db.last_enqueue_ms()?;

    match action {
        ReminderAction::Status => {
            let now = now_ms();
            let in_grace_period = last_enqueue_ms.is_some_and(|at| {
                at > 0 && now.saturating_sub(at) < GRACE_PERIOD.as_millis() as u64
            });
            let status = ReminderStatus {
                work_name: WORK_NAME,
                enabled: config.notifications.enabled,
                frequency_hours: config.notifications.frequency_hours,
                permission_granted: config.notifications.permission_granted,
                last_enqueue_ms,
                in_grace_period,
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        ReminderAction::Fire { now_ms: at } => {
            let sink = Arc::new(ConsoleNotifier::new(config.notifications.permission_granted));
            let worker = ReminderWorker::new(sink);
            let input = TaskInput {
                enqueue_time_ms: last_enqueue_ms.unwrap_or(0),
            };
            let outcome = worker.run(&input, at.unwrap_or_else(now_ms));
            match Event::from_outcome(outcome) {
                Some(event) => print_event(&event)?,
                None => eprintln!("notification permission missing, nothing shown"),
            }
        }
    }
    Ok(())
}
