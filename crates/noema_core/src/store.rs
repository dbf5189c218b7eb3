//! SQLite mirror of the run record, for replay and ad-hoc queries.
//!
//! Schema is created on open; every row carries the raw event JSON in
//! `data` so the store never needs schema changes when event payloads
//! grow.

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    ts     TEXT NOT NULL,
    run_id TEXT NOT NULL,
    tick   INTEGER NOT NULL,
    type   TEXT NOT NULL,
    data   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_run_tick ON events(run_id, tick);
CREATE INDEX IF NOT EXISTS idx_events_type ON events(type);
";

/// Row kinds written by the loop.
pub const KIND_TICK: &str = "tick";
pub const KIND_NOTE: &str = "note";

#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub id: i64,
    pub ts: String,
    pub run_id: String,
    pub tick: u64,
    pub kind: String,
    pub data: String,
}

pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    pub fn open(dir: &Path) -> Result<Self> {
        let conn = Connection::open(dir.join("events.sqlite"))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn insert(&self, ts: &str, run_id: &str, tick: u64, kind: &str, data: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (ts, run_id, tick, type, data) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![ts, run_id, tick as i64, kind, data],
        )?;
        Ok(())
    }

    /// Events in insertion order, optionally filtered by kind and tick
    /// range (inclusive).
    pub fn query(
        &self,
        kind: Option<&str>,
        from_tick: Option<u64>,
        to_tick: Option<u64>,
    ) -> Result<Vec<StoredEvent>> {
        let mut sql = String::from("SELECT id, ts, run_id, tick, type, data FROM events WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(kind) = kind {
            sql.push_str(&format!(" AND type = ?{}", params.len() + 1));
            params.push(Box::new(kind.to_string()));
        }
        if let Some(from) = from_tick {
            sql.push_str(&format!(" AND tick >= ?{}", params.len() + 1));
            params.push(Box::new(from as i64));
        }
        if let Some(to) = to_tick {
            sql.push_str(&format!(" AND tick <= ?{}", params.len() + 1));
            params.push(Box::new(to as i64));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(StoredEvent {
                id: row.get(0)?,
                ts: row.get(1)?,
                run_id: row.get(2)?,
                tick: row.get::<_, i64>(3)? as u64,
                kind: row.get(4)?,
                data: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self, kind: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE type = ?1",
            rusqlite::params![kind],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}
