//! Self-notes: the organism's own journal.
//!
//! Stages report salient moments (drive shifts, reflex vetoes,
//! emissions) through a [`NoteSink`]. Notes interleave with tick events
//! in the shared `events.jsonl`, discriminated by `"type": "note"`, and
//! are mirrored into the SQLite store with a wall-clock timestamp. The
//! log line itself carries no timestamp so that identical runs produce
//! identical logs. Note writing must never abort a run; the sink
//! swallows IO errors with a warning.

use crate::events::EventLog;
use crate::store::{EventStore, KIND_NOTE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// One journal line as it appears in `events.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub event_type: String,
    pub kind: String,
    pub payload: Value,
    pub tick: u64,
}

impl Note {
    pub fn new(tick: u64, kind: &str, payload: Value) -> Self {
        Self { event_type: "note".to_string(), kind: kind.to_string(), payload, tick }
    }
}

/// Where stages put their observations about themselves.
pub trait NoteSink {
    fn note(&mut self, tick: u64, kind: &str, payload: Value);
}

/// Sink that drops everything. For tests and headless stage use.
#[derive(Debug, Default)]
pub struct NullNotes;

impl NoteSink for NullNotes {
    fn note(&mut self, _tick: u64, _kind: &str, _payload: Value) {}
}

/// The journal of a live run, sharing the event log with the tick loop.
pub struct SelfNotes {
    run_id: String,
    log: Rc<RefCell<EventLog>>,
    store: Rc<EventStore>,
}

impl SelfNotes {
    pub fn new(run_id: &str, log: Rc<RefCell<EventLog>>, store: Rc<EventStore>) -> Self {
        Self { run_id: run_id.to_string(), log, store }
    }
}

impl NoteSink for SelfNotes {
    fn note(&mut self, tick: u64, kind: &str, payload: Value) {
        let note = Note::new(tick, kind, payload);
        tracing::debug!(tick, kind, "self-note");
        if let Err(e) = self.log.borrow_mut().append(&note) {
            tracing::warn!("failed to append note: {}", e);
            return;
        }
        match serde_json::to_string(&note) {
            Ok(json) => {
                let ts = chrono::Utc::now().to_rfc3339();
                if let Err(e) = self.store.insert(&ts, &self.run_id, tick, KIND_NOTE, &json) {
                    tracing::warn!("failed to store note: {}", e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize note: {}", e),
        }
    }
}

/// Sink that collects notes in memory, for asserting on note flow.
#[derive(Debug, Default)]
pub struct RecordingNotes {
    pub notes: Vec<(u64, String, Value)>,
}

impl RecordingNotes {
    pub fn kinds(&self) -> Vec<&str> {
        self.notes.iter().map(|(_, k, _)| k.as_str()).collect()
    }
}

impl NoteSink for RecordingNotes {
    fn note(&mut self, tick: u64, kind: &str, payload: Value) {
        self.notes.push((tick, kind.to_string(), payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::read_jsonl;
    use serde_json::json;

    #[test]
    fn test_self_notes_interleave_with_events() {
        let dir = tempfile::tempdir().unwrap();
        let store = Rc::new(EventStore::open(dir.path()).unwrap());
        let log = Rc::new(RefCell::new(EventLog::open(dir.path()).unwrap()));
        let mut notes = SelfNotes::new("r1", Rc::clone(&log), Rc::clone(&store));

        notes.note(3, "reflex", json!({"streak": 1}));
        log.borrow_mut().append(&json!({"type": "tick", "tick": 3})).unwrap();
        notes.note(5, "heartbeat", json!({"tick": 5}));

        let lines = read_jsonl(&dir.path().join("events.jsonl")).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "note");
        assert_eq!(lines[0]["kind"], "reflex");
        assert_eq!(lines[0]["payload"]["streak"], 1);
        assert!(lines[0].get("ts").is_none(), "log lines carry no timestamp");
        assert_eq!(lines[1]["type"], "tick");
        assert_eq!(store.count(KIND_NOTE).unwrap(), 2);
    }

    #[test]
    fn test_recording_notes_collects_in_order() {
        let mut sink = RecordingNotes::default();
        sink.note(1, "curiosity", Value::Null);
        sink.note(2, "motivation", json!({"dominant": "stability"}));
        assert_eq!(sink.kinds(), vec!["curiosity", "motivation"]);
        assert_eq!(sink.notes[1].0, 2);
    }
}
