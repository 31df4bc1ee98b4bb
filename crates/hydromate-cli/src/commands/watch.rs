//! Long-running mode: hosts the reminder coordinator and the motion listener.
//!
//! The config file is re-read every poll, so `config set` from another shell
//! takes effect on the next tick.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use hydromate_core::reminder::{now_ms, Notification, NotificationChannel, NotificationSink};
use hydromate_core::shake::{ListenerState, MotionSource, ReplaySource, UnavailableSource};
use hydromate_core::{
    Config, Event, MotionListener, ReminderCoordinator, ReminderWorker, ShakeBus, TaskRegistry,
    Transition,
};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{open_tracker, print_event};
use crate::platform::{ConfigPermission, ConsoleNotifier};

#[derive(Args)]
pub struct WatchArgs {
    /// Recorded `timestamp_ms,x,y,z` samples to use as the motion sensor
    #[arg(long)]
    samples: Option<PathBuf>,
    /// Seconds between config polls
    #[arg(long, default_value_t = 5)]
    poll_secs: u64,
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,
}

fn motion_source(samples: Option<&PathBuf>) -> Result<Box<dyn MotionSource>, Box<dyn std::error::Error>> {
    match samples {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(Box::new(ReplaySource::from_lines(content.lines())?))
        }
        None => Ok(Box::new(UnavailableSource)),
    }
}

pub async fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let tracker = open_tracker(&config)?;

    let sink = Arc::new(ConsoleNotifier::new(config.notifications.permission_granted));
    let worker = Arc::new(ReminderWorker::new(sink.clone()));
    let mut coordinator = ReminderCoordinator::new(
        TaskRegistry::new(),
        ConfigPermission::new(config.notifications.permission_granted),
        worker,
    );

    let bus = ShakeBus::new();
    let mut shakes = bus.subscribe();
    let mut listener = MotionListener::new(
        motion_source(args.samples.as_ref())?,
        bus,
        config.shake_settings(),
    );

    // Last applied toggle. A replayed stream that ends stays stopped until
    // the toggle changes.
    let mut shake_enabled: Option<bool> = None;

    let mut poll = tokio::time::interval(Duration::from_secs(args.poll_secs.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs.unwrap_or(u64::MAX / 4)));
    tokio::pin!(deadline);

    info!(poll_secs = args.poll_secs, "watching");
    loop {
        tokio::select! {
            _ = poll.tick() => {
                match Config::load() {
                    Ok(latest) => config = latest,
                    Err(e) => warn!(error = %e, "config reload failed, keeping previous"),
                }
                let granted = config.notifications.permission_granted;
                sink.set_granted(granted);
                coordinator.permission_mut().set_granted(granted);

                let transition = coordinator.apply(&config.reminder_settings(), now_ms());
                if let Transition::Scheduled { enqueue_time_ms, .. }
                | Transition::Rescheduled { enqueue_time_ms, .. } = transition
                {
                    tracker.db().set_last_enqueue_ms(enqueue_time_ms)?;
                }
                if let Some(event) = Event::from_transition(transition) {
                    print_event(&event)?;
                }

                if shake_enabled != Some(config.shake.enabled) {
                    shake_enabled = Some(config.shake.enabled);
                    if listener.apply_lifecycle(config.shake.enabled, true) == ListenerState::Running {
                        sink.ensure_channel(&NotificationChannel::motion_service());
                        sink.notify(&Notification::motion_service());
                    }
                }
            }
            Some(_) = shakes.next() => {
                print_event(&Event::ShakeDetected { at: Utc::now() })?;
                let record = tracker.add_water(config.intake.default_amount_ml)?;
                print_event(&Event::for_record(&record, &tracker.progress()?))?;
            }
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    listener.stop();
    let stats = listener.stats();
    info!(samples = stats.samples, shakes = stats.shakes, "watch stopped");
    Ok(())
}
