//! Intake ledger on an on-disk database.

use std::sync::Arc;

use chrono::NaiveDate;
use hydromate_core::storage::Database;
use hydromate_core::{Config, HydrationTracker};
use tempfile::TempDir;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn tracker(dir: &TempDir, date: &str) -> HydrationTracker {
    let db = Database::open_at(&dir.path().join("hydromate.db")).unwrap();
    let today = day(date);
    HydrationTracker::with_today(db, 3000, Arc::new(move || today))
}

#[test]
fn entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let t = tracker(&dir, "2024-05-06");
        t.add_water(250).unwrap();
        t.add_water(250).unwrap();
        t.remove_water(100).unwrap();
        t.db().set_last_enqueue_ms(42).unwrap();
    }

    let t = tracker(&dir, "2024-05-06");
    assert_eq!(t.progress().unwrap().total_ml, 400);
    assert_eq!(t.db().history_for_day(day("2024-05-06")).unwrap().len(), 3);
    assert_eq!(t.db().last_enqueue_ms().unwrap(), Some(42));
}

#[test]
fn days_are_independent() {
    let dir = TempDir::new().unwrap();
    tracker(&dir, "2024-05-06").add_water(500).unwrap();

    let tuesday = tracker(&dir, "2024-05-07");
    assert_eq!(tuesday.progress().unwrap().total_ml, 0);
    assert!(tuesday.remove_water(100).unwrap().is_none());
    assert_eq!(tuesday.reset_today().unwrap(), 0);

    tuesday.add_water(1500).unwrap();
    let week = tuesday.week(None).unwrap();
    assert_eq!(week.start, day("2024-05-06"));
    assert_eq!(week.days[0].1, 500);
    assert_eq!(week.days[1].1, 1500);
    assert_eq!(week.total_ml(), 2000);
}

#[test]
fn goal_comes_from_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut cfg = Config::load_from(&path).unwrap();
    cfg.set_value("goal.daily_ml", "2000").unwrap();
    cfg.save_to(&path).unwrap();

    let cfg = Config::load_from(&path).unwrap();
    let db = Database::open_at(&dir.path().join("hydromate.db")).unwrap();
    let today = day("2024-05-06");
    let t = HydrationTracker::with_today(db, cfg.goal.daily_ml, Arc::new(move || today));
    t.add_water(cfg.intake.default_amount_ml).unwrap();
    t.add_water(cfg.intake.default_amount_ml).unwrap();

    let p = t.progress().unwrap();
    assert_eq!(p.goal_ml, 2000);
    assert_eq!(p.fraction, 0.25);
}
