//! Fast appraisal stages of the organism.
//!
//! Four per-tick stages live here: curiosity scoring, staleness and
//! boredom tracking, the multi-drive homeostat, and the slow learning
//! manager that retunes the others. They are pure state machines over
//! scalars; the runtime wires them together in a fixed order.

pub mod curiosity;
pub mod learning;
pub mod motivation;
pub mod staleness;

pub use curiosity::{CuriosityEngine, CuriosityReport};
pub use learning::{GainMods, LearningManager, ModSnapshot, PlannerBias};
pub use motivation::{DriveDescriptor, DriveStimuli, MotivationManager, MotivationReport, DRIVES};
pub use staleness::{StalenessMonitor, StalenessReport};
