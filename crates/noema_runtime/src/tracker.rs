//! Compact state snapshots for humans watching a run.
//!
//! `state.json` always holds the latest tick's distilled view;
//! `state.jsonl` appends one line per tick. Snapshots carry a
//! wall-clock timestamp, which is why they live outside the canonical
//! event log.

use std::fs;
use std::path::{Path, PathBuf};

use noema_core::{EventLog, Result};
use serde_json::{json, Value};

pub struct Tracker {
    state_path: PathBuf,
    history: EventLog,
}

impl Tracker {
    pub fn new(run_dir: &Path) -> Result<Self> {
        Ok(Self {
            state_path: run_dir.join("state.json"),
            history: EventLog::open_named(run_dir, "state.jsonl")?,
        })
    }

    /// Distill one tick event into the snapshot files, returning the
    /// snapshot that was written.
    pub fn record(&mut self, event: &Value) -> Result<Value> {
        let snap = snapshot(event);
        let mut text = serde_json::to_string_pretty(&snap)?;
        text.push('\n');
        fs::write(&self.state_path, text)?;
        self.history.append(&snap)?;
        Ok(snap)
    }
}

fn pluck(event: &Value, outer: &str, inner: &str) -> Value {
    event.get(outer).and_then(|v| v.get(inner)).cloned().unwrap_or(Value::Null)
}

fn snapshot(event: &Value) -> Value {
    let recall_top = event
        .get("recall")
        .and_then(Value::as_array)
        .and_then(|hits| hits.first())
        .map(|hit| {
            json!({
                "tick": hit.get("tick").cloned().unwrap_or(Value::Null),
                "score": hit.get("score").cloned().unwrap_or(Value::Null),
            })
        })
        .unwrap_or(Value::Null);

    json!({
        "tick": event.get("tick").cloned().unwrap_or(Value::Null),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "drive": pluck(event, "motivation", "dominant"),
        "behavior": pluck(event, "planner", "behavior"),
        "action": event.get("action_final").cloned().unwrap_or(Value::Null),
        "novelty": pluck(event, "curiosity", "novelty"),
        "boredom": pluck(event, "staleness", "boredom"),
        "coverage": pluck(event, "state", "coverage"),
        "recall_top": recall_top,
        "attention": pluck(event, "curiosity", "attention"),
        "reflex": pluck(event, "reflex", "triggers"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::read_jsonl;

    fn tick_event(tick: u64, novelty: f64) -> Value {
        json!({
            "type": "tick",
            "tick": tick,
            "action_final": "up",
            "curiosity": {"novelty": novelty, "attention": ["Ro"]},
            "staleness": {"boredom": 0.2},
            "motivation": {"dominant": "curiosity"},
            "planner": {"behavior": "explore"},
            "reflex": {"triggers": []},
            "recall": [{"tick": 1, "score": 0.7, "tokens": ["Ro"]}],
            "state": {"coverage": 0.125},
        })
    }

    #[test]
    fn test_latest_snapshot_and_history_agree() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::new(dir.path()).unwrap();
        tracker.record(&tick_event(0, 1.0)).unwrap();
        tracker.record(&tick_event(1, 0.4)).unwrap();

        let latest: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("state.json")).unwrap())
                .unwrap();
        assert_eq!(latest["tick"], 1);
        assert_eq!(latest["novelty"], 0.4);
        assert_eq!(latest["drive"], "curiosity");
        assert_eq!(latest["recall_top"]["score"], 0.7);
        assert!(latest["timestamp"].as_str().is_some());

        let history = read_jsonl(&dir.path().join("state.jsonl")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["tick"], 0);
    }

    #[test]
    fn test_missing_recall_reads_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::new(dir.path()).unwrap();
        let mut event = tick_event(3, 0.9);
        event["recall"] = json!([]);
        let snap = tracker.record(&event).unwrap();
        assert!(snap["recall_top"].is_null());
        assert_eq!(snap["attention"][0], "Ro");
    }
}
