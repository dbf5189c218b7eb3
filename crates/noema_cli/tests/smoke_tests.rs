//! CLI smoke tests that run the real binary end to end.

use std::path::{Path, PathBuf};
use std::process::Command;

fn noema() -> Command {
    Command::new(env!("CARGO_BIN_EXE_noema"))
}

/// Record a run into `runs_dir` and return its run directory.
fn record_run(runs_dir: &Path, ticks: &str, seed: &str) -> PathBuf {
    let output = noema()
        .args(["run", "--ticks", ticks, "--seed", seed, "--runs-dir"])
        .arg(runs_dir)
        .output()
        .expect("failed to run");
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    std::fs::read_dir(runs_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.is_dir())
        .expect("no run directory created")
}

#[test]
fn test_help_flag() {
    let output = noema().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "expected usage info in --help output");
}

#[test]
fn test_version_flag() {
    let output = noema().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("noema"), "expected binary name in --version output");
}

#[test]
fn test_run_prints_summary_and_records_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output = noema()
        .args(["run", "--ticks", "5", "--seed", "11", "--runs-dir"])
        .arg(dir.path())
        .output()
        .expect("failed to run");
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("finished: 5 ticks,"), "summary line missing: {stdout}");

    let run_dir = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.is_dir())
        .expect("no run directory");
    for file in ["meta.json", "events.jsonl", "events.sqlite", "state.json"] {
        assert!(run_dir.join(file).exists(), "missing {file}");
    }
}

#[test]
fn test_replay_streams_tick_events() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = record_run(dir.path(), "4", "7");

    let output = noema()
        .args(["replay", "--kind", "tick", "--run"])
        .arg(&run_dir)
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    for line in lines {
        let event: serde_json::Value = serde_json::from_str(line).expect("not JSON");
        assert_eq!(event["type"], "tick");
    }
}

#[test]
fn test_replay_defaults_to_newest_run() {
    let dir = tempfile::tempdir().unwrap();
    record_run(dir.path(), "3", "5");

    let output = noema()
        .args(["replay", "--kind", "note", "--runs-dir"])
        .arg(dir.path())
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.lines().any(|l| l.contains("\"startup\"")),
        "expected a startup note: {stdout}"
    );
}

#[test]
fn test_replay_kind_emit_keeps_only_spoken_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = record_run(dir.path(), "6", "42");

    let output = noema()
        .args(["replay", "--kind", "emit", "--run"])
        .arg(&run_dir)
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(!lines.is_empty(), "the first tick always speaks");
    for line in lines {
        let event: serde_json::Value = serde_json::from_str(line).expect("not JSON");
        assert!(!event["channel"].is_null(), "emit filter leaked a silent tick");
    }
}

#[test]
fn test_replay_rejects_unknown_kind() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = record_run(dir.path(), "2", "1");
    let output = noema()
        .args(["replay", "--kind", "bogus", "--run"])
        .arg(&run_dir)
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
}

#[test]
fn test_eval_prints_overview_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = record_run(dir.path(), "6", "9");

    let output = noema().args(["eval", "--run"]).arg(&run_dir).output().expect("failed to run");
    assert!(
        output.status.success(),
        "eval failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ticks 6 |"), "overview missing: {stdout}");
    assert!(run_dir.join("report.md").exists());
}

#[test]
fn test_caregiver_answer_clears_pending_query() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = record_run(dir.path(), "5", "42");

    let output = noema().args(["caregiver", "ls", "--run"]).arg(&run_dir).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().expect("no pending queries listed");
    let token = first
        .split("token=")
        .nth(1)
        .and_then(|rest| rest.split(" hint=").next())
        .expect("unexpected ls line format")
        .trim()
        .to_string();

    let output = noema()
        .args(["caregiver", "answer", "--run"])
        .arg(&run_dir)
        .arg(format!("{token}=taught by hand"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "answer failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = noema().args(["caregiver", "ls", "--run"]).arg(&run_dir).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        !stdout.contains(&format!("token={token} ")),
        "answered token still pending: {stdout}"
    );
}

#[test]
fn test_caregiver_answer_rejects_bad_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let run_dir = record_run(dir.path(), "2", "3");
    let output = noema()
        .args(["caregiver", "answer", "--run"])
        .arg(&run_dir)
        .arg("no-equals-sign")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = noema()
        .args([
            "run",
            "--ticks",
            "1",
            "--config",
            "/definitely/not/here.toml",
            "--runs-dir",
        ])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
}
