//! The loop that turns stages into an organism.
//!
//! [`organism`] wires perception, memory, appraisal, planning and
//! expression into one deterministic tick and owns the run's files;
//! [`tracker`], [`metrics`] and [`report`] are the read side, turning
//! the event log back into snapshots and summaries.

pub mod metrics;
pub mod organism;
pub mod report;
pub mod tracker;

pub use metrics::{compute_metrics, load_events, RunMetrics};
pub use organism::{run_loop, Organism, RunSummary, TickOutput};
pub use report::{eval_run, render_report};
pub use tracker::Tracker;
