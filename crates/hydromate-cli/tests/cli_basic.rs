//! Basic CLI E2E tests.
//!
//! Each test points HOME at its own temp dir, so config and ledger start fresh.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    run_cli_with_stdin(home, args, "")
}

fn run_cli_with_stdin(home: &TempDir, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hydromate-cli"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("HYDROMATE_ENV")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("JSON line"))
        .collect()
}

#[test]
fn test_intake_add_and_today() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["intake", "add"]);
    assert_eq!(code, 0);
    let events = json_lines(&stdout);
    assert_eq!(events[0]["type"], "IntakeAdded");
    assert_eq!(events[0]["amount_ml"], 250);

    let (_, _, code) = run_cli(&home, &["intake", "add", "500"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&home, &["intake", "today"]);
    assert_eq!(code, 0);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["total_ml"], 750);
    assert_eq!(progress["goal_ml"], 3000);
    assert_eq!(progress["fraction"], 0.25);
}

#[test]
fn test_intake_remove_undo_reset() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["intake", "add", "300"]);

    let (stdout, _, code) = run_cli(&home, &["intake", "remove", "1000"]);
    assert_eq!(code, 0);
    assert_eq!(json_lines(&stdout)[0]["amount_ml"], -300);

    let (stdout, stderr, code) = run_cli(&home, &["intake", "remove"]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("nothing to remove"));

    let (stdout, _, _) = run_cli(&home, &["intake", "undo"]);
    assert_eq!(json_lines(&stdout)[0]["type"], "IntakeUndone");

    let (stdout, _, _) = run_cli(&home, &["intake", "reset"]);
    let reset = &json_lines(&stdout)[0];
    assert_eq!(reset["type"], "DayReset");
    assert_eq!(reset["entries"], 1);
}

#[test]
fn test_intake_add_zero_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["intake", "add", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_intake_week_json() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["intake", "week", "--date", "2024-03-14"]);
    assert_eq!(code, 0);
    let week: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(week["start"], "2024-03-11");
    assert_eq!(week["end"], "2024-03-17");
    assert_eq!(week["days"].as_array().unwrap().len(), 7);
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "notifications.frequency_hours"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2");

    let (_, _, code) = run_cli(&home, &["config", "set", "notifications.frequency_hours", "4"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "notifications.frequency_hours"]);
    assert_eq!(stdout.trim(), "4");

    let (_, stderr, code) = run_cli(&home, &["config", "set", "notifications.frequency_hours", "12"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 1 and 8"));

    let (_, _, code) = run_cli(&home, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_and_reset() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "goal.daily_ml", "2500"]);
    let (_, _, code) = run_cli(&home, &["config", "reset"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&home, &["config", "list"]);
    assert_eq!(code, 0);
    let cfg: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(cfg["goal"]["daily_ml"], 3000);
    assert_eq!(cfg["shake"]["enabled"], true);
}

#[test]
fn test_shake_replay_adds_intake() {
    let home = TempDir::new().unwrap();
    let samples = "# t,x,y,z\n0,0,0,0\n150,0,0,50\n300,0,0,100\n";
    let (stdout, _, code) = run_cli_with_stdin(&home, &["shake", "replay", "-"], samples);
    assert_eq!(code, 0);

    let lines = json_lines(&stdout);
    let summary = lines.last().unwrap();
    assert_eq!(summary["samples"], 3);
    assert_eq!(summary["shakes"], 1);
    assert_eq!(summary["added_ml"], 250);

    let (stdout, _, _) = run_cli(&home, &["intake", "today"]);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["total_ml"], 250);
}

const TWO_SHAKES: &str = "0,0,0,0\n150,0,0,50\n300,0,0,100\n2050,0,0,0\n2200,0,0,50\n";

#[test]
fn test_shake_replay_adds_one_glass_per_shake() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli_with_stdin(&home, &["shake", "replay", "-"], TWO_SHAKES);
    assert_eq!(code, 0);

    let lines = json_lines(&stdout);
    let added_events = lines.iter().filter(|l| l["type"] == "IntakeAdded").count();
    assert_eq!(added_events, 2);

    let summary = lines.last().unwrap();
    assert_eq!(summary["samples"], 5);
    assert_eq!(summary["shakes"], 2);
    assert_eq!(summary["added"], summary["shakes"]);
    assert_eq!(summary["added_ml"], 500);

    let (stdout, _, _) = run_cli(&home, &["intake", "today"]);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["total_ml"], 500);
}

#[test]
fn test_shake_replay_disabled_adds_nothing() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "shake.enabled", "false"]);
    let (stdout, _, code) =
        run_cli_with_stdin(&home, &["shake", "replay", "-"], "0,0,0,0\n150,0,0,50\n");
    assert_eq!(code, 0);
    let summary = &json_lines(&stdout)[0];
    assert_eq!(summary["shakes"], 0);
    assert_eq!(summary["added"], 0);
}

#[test]
fn test_shake_replay_rejects_bad_line() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli_with_stdin(&home, &["shake", "replay", "-"], "0,0,0\n");
    assert_eq!(code, 1);
    assert!(stderr.contains("line 1"));
}

#[test]
fn test_reminder_status_and_fire() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["reminder", "status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["work_name"], "waterReminderWork");
    assert_eq!(status["last_enqueue_ms"], serde_json::Value::Null);

    // never enqueued: the handler always notifies
    let (stdout, _, code) = run_cli(&home, &["reminder", "fire"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Time for water!"));
    assert!(stdout.contains("ReminderFired"));
}

#[test]
fn test_reminder_fire_without_permission() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "notifications.permission_granted", "false"]);
    let (stdout, stderr, code) = run_cli(&home, &["reminder", "fire"]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("permission missing"));
}

#[test]
fn test_watch_schedules_and_records_enqueue() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["watch", "--poll-secs", "1", "--duration-secs", "1"]);
    assert_eq!(code, 0);
    let events = json_lines(&stdout);
    assert_eq!(events[0]["type"], "ReminderScheduled");
    assert_eq!(events[0]["frequency_hours"], 2);

    let (stdout, _, _) = run_cli(&home, &["reminder", "status"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["last_enqueue_ms"], events[0]["enqueue_time_ms"]);
    assert_eq!(status["in_grace_period"], true);
}

#[test]
fn test_watch_with_samples_adds_intake_per_shake() {
    let home = TempDir::new().unwrap();
    let samples = home.path().join("samples.csv");
    std::fs::write(&samples, TWO_SHAKES).unwrap();

    let (stdout, _, code) = run_cli(
        &home,
        &[
            "watch",
            "--samples",
            samples.to_str().unwrap(),
            "--poll-secs",
            "1",
            "--duration-secs",
            "4",
        ],
    );
    assert_eq!(code, 0);

    let events = json_lines(&stdout);
    let added: Vec<_> = events.iter().filter(|e| e["type"] == "IntakeAdded").collect();
    assert_eq!(added.len(), 2);
    assert!(added.iter().all(|e| e["amount_ml"] == 250));
    assert_eq!(events.iter().filter(|e| e["type"] == "ShakeDetected").count(), 2);

    let (stdout, _, _) = run_cli(&home, &["intake", "today"]);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["total_ml"], 500);
}
