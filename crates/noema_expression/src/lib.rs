//! Outward-facing surfaces of the organism.
//!
//! The symbol channel compresses a tick's internal weather into a
//! short token emission, and the caregiver module runs the file-based
//! protocol through which a human glosses those tokens back.

pub mod caregiver;
pub mod channel;

pub use caregiver::{append_answer, pending_queries, Caregiver};
pub use channel::{gloss_for, Emission, SymbolChannel, VOCAB};
