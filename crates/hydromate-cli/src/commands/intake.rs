use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use hydromate_core::{Config, Event};

use super::{open_tracker, print_event};

#[derive(Subcommand)]
pub enum IntakeAction {
    /// Add water (defaults to intake.default_amount_ml)
    Add {
        /// Amount in ml
        amount: Option<u32>,
    },
    /// Remove water, never below zero for the day
    Remove {
        /// Amount in ml
        amount: Option<u32>,
    },
    /// Delete today's most recent entry
    Undo,
    /// Delete all of today's entries
    Reset,
    /// Print today's progress as JSON
    Today,
    /// Print ledger entries as JSON, newest first
    History {
        /// Only today's entries, oldest first
        #[arg(long)]
        today: bool,
    },
    /// Print the Monday..Sunday totals as JSON
    Week {
        /// Any day of the week (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: IntakeAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let tracker = open_tracker(&config)?;
    let default_amount = config.intake.default_amount_ml;

    match action {
        IntakeAction::Add { amount } => {
            let record = tracker.add_water(amount.unwrap_or(default_amount))?;
            let progress = tracker.progress()?;
            print_event(&Event::for_record(&record, &progress))?;
        }
        IntakeAction::Remove { amount } => match tracker.remove_water(amount.unwrap_or(default_amount))? {
            Some(record) => {
                let progress = tracker.progress()?;
                print_event(&Event::for_record(&record, &progress))?;
            }
            None => eprintln!("nothing to remove today"),
        },
        IntakeAction::Undo => match tracker.undo_last()? {
            Some(record) => {
                let progress = tracker.progress()?;
                print_event(&Event::undone(&record, &progress))?;
            }
            None => eprintln!("no entries today"),
        },
        IntakeAction::Reset => {
            let entries = tracker.reset_today()?;
            print_event(&Event::DayReset {
                date: tracker.today(),
                entries,
                at: Utc::now(),
            })?;
        }
        IntakeAction::Today => {
            let progress = tracker.progress()?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        IntakeAction::History { today } => {
            let records = if today {
                tracker.db().history_for_day(tracker.today())?
            } else {
                tracker.db().history()?
            };
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        IntakeAction::Week { date } => {
            let week = tracker.week(date)?;
            println!("{}", serde_json::to_string_pretty(&week)?);
        }
    }
    Ok(())
}
