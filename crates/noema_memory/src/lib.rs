//! Memory: what the organism keeps of its past.

pub mod assoc;
pub mod episodic;

pub use assoc::AssocGraph;
pub use episodic::{Episode, EpisodicMemory, RecallHit};
