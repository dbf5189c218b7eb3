//! Append-only run artifacts: `meta.json` and `events.jsonl`.
//!
//! The JSONL log is the canonical record of a run; the SQLite store in
//! [`crate::store`] mirrors it for querying. Both live inside the run
//! directory.

use crate::config::NoemaConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Run header written once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub seed: u32,
    pub env: String,
    pub started_at: String,
    pub config: NoemaConfig,
}

pub fn write_meta(dir: &Path, meta: &RunMeta) -> Result<()> {
    let path = dir.join("meta.json");
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, meta)?;
    file.write_all(b"\n")?;
    Ok(())
}

pub fn read_meta(dir: &Path) -> Result<RunMeta> {
    let content = std::fs::read_to_string(dir.join("meta.json"))?;
    Ok(serde_json::from_str(&content)?)
}

/// Append-only JSONL writer, one JSON object per line.
pub struct EventLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl EventLog {
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_named(dir, "events.jsonl")
    }

    pub fn open_named(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event and flush, so the log is inspectable mid-run.
    pub fn append<T: Serialize>(&mut self, event: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read a whole JSONL file into values. Fails on the first malformed
/// line; use this for files the loop itself wrote.
pub fn read_jsonl(path: &Path) -> Result<Vec<serde_json::Value>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = EventLog::open(dir.path()).unwrap();
        log.append(&json!({"tick": 0, "novelty": 1.0})).unwrap();
        log.append(&json!({"tick": 1, "novelty": 0.5})).unwrap();

        let events = read_jsonl(&dir.path().join("events.jsonl")).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["tick"], 1);
    }

    #[test]
    fn test_meta_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let meta = RunMeta {
            run_id: "20250101-000000-0000002a".to_string(),
            seed: 42,
            env: "grid-v0".to_string(),
            started_at: "2025-01-01T00:00:00Z".to_string(),
            config: NoemaConfig::default(),
        };
        write_meta(dir.path(), &meta).unwrap();
        let back = read_meta(dir.path()).unwrap();
        assert_eq!(back.run_id, meta.run_id);
        assert_eq!(back.seed, 42);
        assert_eq!(back.config.embedder.dim, 64);
    }
}
