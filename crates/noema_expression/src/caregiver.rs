//! Caregiver interface: file-based question and answer protocol.
//!
//! Teaching happens through the run directory rather than a socket:
//! emitted tokens the organism has no gloss for become query lines, a
//! human appends answer lines, and taught tags are merged, persisted
//! and pushed back into the channel on the next poll. Every read is
//! tolerant; a malformed line is skipped and a missing file reads as
//! an empty one.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use noema_core::{NoteSink, Result};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::channel::gloss_for;

pub const QUERIES_FILE: &str = "caregiver_queries.jsonl";
pub const ANSWERS_FILE: &str = "caregiver_answers.jsonl";
pub const TAGS_FILE: &str = "caregiver_tags.json";

/// Tokens worth asking about; the rest are self-explanatory.
const QUERYABLE: [&str; 4] = ["?", "N!", "N↑", "Over!"];

pub struct Caregiver {
    run_dir: PathBuf,
    run_id: String,
    tags: BTreeMap<String, String>,
    queried: BTreeSet<String>,
}

impl Caregiver {
    pub fn new(run_dir: &Path, run_id: &str) -> Self {
        let tags = fs::read_to_string(run_dir.join(TAGS_FILE))
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self {
            run_dir: run_dir.to_path_buf(),
            run_id: run_id.to_string(),
            tags,
            queried: BTreeSet::new(),
        }
    }

    /// Everything taught so far.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Ask about at most one emitted token: the first queryable one
    /// that has neither a taught tag nor an earlier query this run.
    /// Failures are logged and swallowed; asking is a side channel.
    pub fn maybe_query(&mut self, tick: u64, emitted: &[String]) {
        let Some(token) = emitted.iter().find(|t| {
            QUERYABLE.contains(&t.as_str())
                && !self.tags.contains_key(t.as_str())
                && !self.queried.contains(t.as_str())
        }) else {
            return;
        };
        self.queried.insert(token.clone());
        let line = json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "run_id": self.run_id,
            "tick": tick,
            "token": token,
            "gloss_hint": gloss_for(token),
        });
        debug!(tick, token = %token, "caregiver query");
        if let Err(err) = append_line(&self.run_dir.join(QUERIES_FILE), &line) {
            warn!(%err, "could not write caregiver query");
        }
    }

    /// Ingest any answers present, merge changed pairs, persist the
    /// merged map and report what was newly learned.
    pub fn poll_answers(&mut self, tick: u64, notes: &mut dyn NoteSink) -> BTreeMap<String, String> {
        let path = self.run_dir.join(ANSWERS_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(_) => return BTreeMap::new(),
        };
        let mut new_tags = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let obj: Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(err) => {
                    warn!(%err, "skipping malformed caregiver answer");
                    continue;
                }
            };
            let (Some(token), Some(gloss)) = (
                obj.get("token").and_then(Value::as_str),
                obj.get("gloss").and_then(Value::as_str),
            ) else {
                continue;
            };
            if self.tags.get(token).map(String::as_str) != Some(gloss) {
                self.tags.insert(token.to_string(), gloss.to_string());
                new_tags.insert(token.to_string(), gloss.to_string());
            }
        }
        if !new_tags.is_empty() {
            self.persist_tags();
            notes.note(tick, "caregiver_tag", json!({"tick": tick, "tags": new_tags}));
        }
        new_tags
    }

    fn persist_tags(&self) {
        let path = self.run_dir.join(TAGS_FILE);
        match serde_json::to_string_pretty(&self.tags) {
            Ok(mut text) => {
                text.push('\n');
                if let Err(err) = fs::write(&path, text) {
                    warn!(%err, path = %path.display(), "could not persist caregiver tags");
                }
            }
            Err(err) => warn!(%err, "could not serialize caregiver tags"),
        }
    }
}

/// Queries whose token has no answer line yet.
pub fn pending_queries(run_dir: &Path) -> Vec<Value> {
    let queries = read_jsonl_tolerant(&run_dir.join(QUERIES_FILE));
    let answers = read_jsonl_tolerant(&run_dir.join(ANSWERS_FILE));
    let answered: BTreeSet<String> = answers
        .iter()
        .filter_map(|a| a.get("token").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    queries
        .into_iter()
        .filter(|q| {
            q.get("token")
                .and_then(Value::as_str)
                .map(|t| !answered.contains(t))
                .unwrap_or(false)
        })
        .collect()
}

/// Append one caregiver answer line.
pub fn append_answer(run_dir: &Path, token: &str, gloss: &str) -> Result<()> {
    let line = json!({
        "ts": chrono::Utc::now().to_rfc3339(),
        "token": token,
        "gloss": gloss,
    });
    append_line(&run_dir.join(ANSWERS_FILE), &line)
}

fn append_line(path: &Path, value: &Value) -> Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{value}")?;
    Ok(())
}

fn read_jsonl_tolerant(path: &Path) -> Vec<Value> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };
    text.lines()
        .filter_map(|l| serde_json::from_str(l.trim()).ok())
        .collect()
}
