//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points HOME at its own temporary directory so the data files never
//! collide.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "fartalarm-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("FARTALARM_ENV", "dev")
        .env("FARTALARM_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Like `run_cli`, with `input` written to the command's stdin.
fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "fartalarm-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("FARTALARM_ENV", "dev")
        .env("FARTALARM_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI command");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("CLI output");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn home() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp home")
}

#[test]
fn test_alarm_add_and_list() {
    let home = home();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["alarm", "add", "--name", "Wake", "--time", "07:30", "--repeat", "weekdays"],
    );
    assert_eq!(code, 0, "alarm add failed");
    assert!(stdout.contains("Alarm created: alarm_"));

    let (code, stdout, _) = run_cli(home.path(), &["alarm", "list", "--json"]);
    assert_eq!(code, 0, "alarm list failed");
    let alarms: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let alarms = alarms.as_array().unwrap();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0]["name"], "Wake");
    assert_eq!(alarms[0]["time"], "07:30");
    assert_eq!(alarms[0]["repeat"], "weekdays");
    assert_eq!(alarms[0]["enabled"], true);
}

#[test]
fn test_alarm_add_rejects_bad_time() {
    let home = home();
    let (code, _, stderr) = run_cli(home.path(), &["alarm", "add", "--time", "7:30"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_alarm_toggle_and_remove() {
    let home = home();
    let (_, stdout, _) = run_cli(home.path(), &["alarm", "add"]);
    let id = stdout.trim().trim_start_matches("Alarm created: ").to_string();

    let (code, stdout, _) = run_cli(home.path(), &["alarm", "toggle", &id]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "disabled");

    let (code, _, _) = run_cli(home.path(), &["alarm", "remove", &id]);
    assert_eq!(code, 0);
    let (code, _, _) = run_cli(home.path(), &["alarm", "remove", &id]);
    assert_ne!(code, 0, "removing twice should fail");
}

#[test]
fn test_fart_counts() {
    let home = home();
    let (code, stdout, _) = run_cli(home.path(), &["fart"]);
    assert_eq!(code, 0, "fart failed");
    assert!(stdout.contains("Farts: 1"));
    assert!(stdout.contains("Free farts left: 49"));

    let (code, stdout, _) = run_cli(home.path(), &["stats", "show", "--json"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["stats"]["totalFarts"], 1);
    assert_eq!(value["stats"]["currentStreak"], 1);
    assert_eq!(value["trial"]["remaining"], 49);
}

#[test]
fn test_random_settings() {
    let home = home();
    let (code, _, _) = run_cli(home.path(), &["random", "set", "--min", "5", "--max", "2"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(home.path(), &["random", "show"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["minInterval"], 5);
    assert_eq!(value["maxInterval"], 5);

    let (code, _, _) = run_cli(home.path(), &["random", "set", "--active-start", "25:00"]);
    assert_ne!(code, 0);
}

#[test]
fn test_premium_status() {
    let home = home();
    let (code, _, _) = run_cli(home.path(), &["premium", "unlock"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(home.path(), &["premium", "status"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["isPremium"], true);
    assert!(value["remaining"].is_null());
}

#[test]
fn test_config_get_set() {
    let home = home();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "engine.tick_interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "engine.tick_interval_secs", "2"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "engine.tick_interval_secs"]);
    assert_eq!(stdout.trim(), "2");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "engine.nope", "1"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_list() {
    let home = home();
    let (code, stdout, _) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("log_level = info"));
}

#[test]
fn test_completions() {
    let home = home();
    let (code, stdout, _) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("fartalarm"));
}

#[test]
fn test_alarm_test_stops_from_stdin() {
    let home = home();
    let (_, stdout, _) = run_cli(home.path(), &["alarm", "add", "--name", "Wake"]);
    let id = stdout.trim().trim_start_matches("Alarm created: ").to_string();

    let (code, stdout, _) = run_cli_with_input(home.path(), &["alarm", "test", &id], "s\n");
    assert_eq!(code, 0, "alarm test failed");
    assert!(stdout.contains("Wake (Test)"));
    assert!(stdout.contains("s = stop"));
    assert!(stdout.contains(&format!("alarm {id} stopped (User)")));
}

#[test]
fn test_alarm_test_snooze_from_stdin_just_stops() {
    let home = home();
    let (_, stdout, _) = run_cli(home.path(), &["alarm", "add"]);
    let id = stdout.trim().trim_start_matches("Alarm created: ").to_string();

    let (code, stdout, _) = run_cli_with_input(home.path(), &["alarm", "test", &id], "z5\n");
    assert_eq!(code, 0);
    assert!(stdout.contains(&format!("alarm {id} stopped (User)")));
    assert!(!stdout.contains("snoozed until"));
}

#[test]
fn test_config_set_echoes_and_get_rejects_unknown() {
    let home = home();
    let (code, stdout, _) = run_cli(home.path(), &["config", "set", "engine.snooze_presets", "[5, 20]"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "engine.snooze_presets = [5,20]");

    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "engine.snooze"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown config key: engine.snooze"));
}
