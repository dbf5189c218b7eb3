//! Action selection: the behavior planner and the reflex gate.
//!
//! Sits between the limbic appraisals and the world. Motivation names
//! a dominant drive, the planner turns it into a behavior and a
//! concrete action, and the reflex gate gets the final word before the
//! action reaches the environment.

pub mod planner;
pub mod reflex;

pub use planner::{Behavior, Plan, Planner};
pub use reflex::{ReflexGate, ReflexReport};
