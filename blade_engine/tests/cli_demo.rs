use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::tempdir;

fn run_engine(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_blade_engine"))
        .args(args)
        .output()
        .context("executing blade_engine")?;
    assert!(
        output.status.success(),
        "blade_engine exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(output)
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().context("temp path is not valid UTF-8")
}

#[test]
fn demo_dialog_writes_event_log() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let log_path = temp_dir.path().join("events.json");

    let output = run_engine(&[
        "--demo",
        "--dialog",
        "bar",
        "--select-option",
        "0:0",
        "--frames",
        "400",
        "--event-log-json",
        path_str(&log_path)?,
    ])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("drink = served"), "stdout: {stdout}");
    assert!(stdout.contains("coins = 1"), "stdout: {stdout}");
    assert!(stdout.contains("No verbs running"), "stdout: {stdout}");

    let log: Value = serde_json::from_str(&fs::read_to_string(&log_path)?)?;
    let events: Vec<&str> = log
        .as_array()
        .context("event log is an array")?
        .iter()
        .filter_map(|record| record.get("event").and_then(Value::as_str))
        .collect();
    assert!(events.contains(&"dialog.bar.select 0"));
    assert!(events.contains(&"actor.ada.animation talk.left"));
    assert!(events.contains(&"actor.barkeep.animation talk"));
    assert!(events.contains(&"verb.end order@barkeep"));
    Ok(())
}

#[test]
fn saved_intro_resumes_in_new_process() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let save_path = temp_dir.path().join("intro.blds");
    let json_path = temp_dir.path().join("intro.json");

    let output = run_engine(&[
        "--demo",
        "--trigger",
        "0:intro",
        "--frames",
        "100",
        "--save",
        path_str(&save_path)?,
        "--save-json",
        path_str(&json_path)?,
    ])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Verbs still running: intro@<world>"), "stdout: {stdout}");
    assert!(save_path.is_file());
    let bytes = fs::read(&save_path)?;
    assert_eq!(&bytes[..4], b"BLDS");

    for save in [&save_path, &json_path] {
        let output = run_engine(&[
            "--demo",
            "--load",
            path_str(save)?,
            "--frames",
            "400",
        ])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("with 1 running verbs"), "stdout: {stdout}");
        assert!(stdout.contains("intro = done"), "stdout: {stdout}");
        assert!(stdout.contains("coins = 8"), "stdout: {stdout}");
    }
    Ok(())
}

#[test]
fn refused_trigger_is_reported_not_fatal() -> Result<()> {
    let output = run_engine(&["--demo", "--trigger", "0:lookat@ghost", "--frames", "5"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("actor 'ghost' not found"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn list_actions_prints_registry() -> Result<()> {
    let output = run_engine(&["--list-actions"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    for tag in ["say_dialog", "add_value_to_property", "tween", "run_verb"] {
        assert!(stdout.contains(tag), "missing {tag}: {stdout}");
    }
    assert!(stdout.contains("default linear"));
    Ok(())
}
