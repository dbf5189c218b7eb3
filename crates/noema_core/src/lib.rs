//! Shared substrate of the noema workspace: configuration, run state,
//! the deterministic random source, run artifacts (event log, SQLite
//! store, self-notes) and the environment contract.

pub mod config;
pub mod env;
pub mod error;
pub mod events;
pub mod notes;
pub mod state;
pub mod store;

pub use config::NoemaConfig;
pub use env::{
    is_blank, Action, Environment, Observation, StepInfo, AGENT_MARKER, COLORS, EMPTY_CELL,
    OOB_CELL, SHAPES,
};
pub use error::{NoemaError, Result};
pub use events::{read_jsonl, read_meta, write_meta, EventLog, RunMeta};
pub use notes::{Note, NoteSink, NullNotes, RecordingNotes, SelfNotes};
pub use state::{clamp01, lcg_next, round3, sanitize, Lcg, RunState};
pub use store::{EventStore, StoredEvent, KIND_NOTE, KIND_TICK};
