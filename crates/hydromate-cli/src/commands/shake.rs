use std::io::Read;

use chrono::Utc;
use clap::Subcommand;
use hydromate_core::shake::{ListenerStats, ReplaySource};
use hydromate_core::{Config, Event, MotionListener, ShakeBus};
use serde::Serialize;

use super::{open_tracker, print_event};

#[derive(Subcommand)]
pub enum ShakeAction {
    /// Run recorded `timestamp_ms,x,y,z` samples through the listener and
    /// add the default amount for every shake
    Replay {
        /// Sample file, or "-" for stdin
        file: String,
    },
}

#[derive(Serialize)]
struct ReplaySummary {
    samples: u64,
    shakes: u64,
    added: u64,
    added_ml: u64,
}

fn read_input(file: &str) -> Result<String, Box<dyn std::error::Error>> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

pub async fn run(action: ShakeAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ShakeAction::Replay { file } => {
            let config = Config::load()?;
            let tracker = open_tracker(&config)?;
            let amount = config.intake.default_amount_ml;
            let source = ReplaySource::from_lines(read_input(&file)?.lines())?;

            let bus = ShakeBus::new();
            let mut shakes = bus.subscribe();
            let mut listener = MotionListener::new(Box::new(source), bus, config.shake_settings());
            listener.apply_lifecycle(config.shake.enabled, true);

            // Samples arrive at their recorded spacing. The producer ends once
            // the replay is exhausted and dropping the listener closes the bus.
            let producer = async move { listener.drained().await };
            let consumer = async {
                let mut added = 0u64;
                while shakes.next().await.is_some() {
                    print_event(&Event::ShakeDetected { at: Utc::now() })?;
                    let record = tracker.add_water(amount)?;
                    print_event(&Event::for_record(&record, &tracker.progress()?))?;
                    added += 1;
                }
                Ok::<_, Box<dyn std::error::Error>>(added)
            };
            let (stats, added): (ListenerStats, _) = tokio::join!(producer, consumer);
            let added = added?;

            let summary = ReplaySummary {
                samples: stats.samples,
                shakes: stats.shakes,
                added,
                added_ml: added * u64::from(amount),
            };
            println!("{}", serde_json::to_string(&summary)?);
        }
    }
    Ok(())
}
