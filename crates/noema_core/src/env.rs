//! Environment contract between the organism and its world.
//!
//! The organism only ever sees a local window of cell tokens; worlds
//! implement [`Environment`] and stay deterministic for a given seed.
//! Coordinates are (x, y) with x growing rightward and y growing
//! downward; `view[row][col]` therefore indexes as `view[y][x]` in
//! window-local terms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker rendered at the agent's own cell (static world only).
pub const AGENT_MARKER: &str = "@";
/// Empty cell inside the world.
pub const EMPTY_CELL: &str = ".";
/// Cell outside the world boundary.
pub const OOB_CELL: &str = " ";

/// Color glyphs of plain object tokens, in registry order.
pub const COLORS: [char; 4] = ['R', 'G', 'B', 'Y'];
/// Shape glyphs of plain object tokens, in registry order.
pub const SHAPES: [char; 3] = ['o', '^', 's'];

/// Cells that carry no object token.
pub fn is_blank(cell: &str) -> bool {
    matches!(cell, "" | EMPTY_CELL | OOB_CELL | AGENT_MARKER)
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Ping,
    Noop,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Ping,
        Action::Noop,
    ];

    pub fn as_name(&self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Ping => "ping",
            Action::Noop => "noop",
        }
    }

    pub fn from_name(name: &str) -> Option<Action> {
        match name {
            "up" => Some(Action::Up),
            "down" => Some(Action::Down),
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "ping" => Some(Action::Ping),
            "noop" => Some(Action::Noop),
            _ => None,
        }
    }

    /// The movement this action undoes, if it is a movement at all.
    pub fn opposite(&self) -> Option<Action> {
        match self {
            Action::Up => Some(Action::Down),
            Action::Down => Some(Action::Up),
            Action::Left => Some(Action::Right),
            Action::Right => Some(Action::Left),
            Action::Ping | Action::Noop => None,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Action::Up | Action::Down | Action::Left | Action::Right)
    }

    /// Displacement as (dx, dy); y grows downward.
    pub fn delta(&self) -> (i64, i64) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Ping | Action::Noop => (0, 0),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_name())
    }
}

// ============================================================================
// Observations
// ============================================================================

/// What the organism perceives in one tick: the local window around its
/// position, rendered as cell tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// `view[row][col]`, row 0 at the top of the window.
    pub view: Vec<Vec<String>>,
    /// Agent position as (x, y) in world coordinates.
    pub agent: (i64, i64),
    /// World side length (worlds are square).
    pub size: i64,
}

impl Observation {
    /// Sorted distinct object tokens in view; blank cells and the agent
    /// marker are excluded.
    pub fn unique_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .view
            .iter()
            .flatten()
            .filter(|c| !is_blank(c))
            .cloned()
            .collect();
        tokens.sort();
        tokens.dedup();
        tokens
    }

    /// Token histogram over the window, sorted by token.
    pub fn token_counts(&self) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for cell in self.view.iter().flatten() {
            if !is_blank(cell) {
                *counts.entry(cell.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Order-insensitive scene signature used for repeat detection.
    pub fn signature(&self) -> Vec<(String, u32)> {
        self.token_counts().into_iter().collect()
    }
}

/// Side information reported by the world after applying an action.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepInfo {
    pub moved: bool,
    pub pinged: bool,
}

/// A deterministic world the organism can inhabit.
pub trait Environment {
    /// Reset to the initial configuration for `seed` and return the
    /// first observation.
    fn reset(&mut self, seed: u32) -> Observation;

    /// Apply an action and return the next observation.
    fn step(&mut self, action: Action) -> (Observation, StepInfo);

    /// Stable identifier recorded in run metadata, e.g. "grid-v0".
    fn descriptor(&self) -> &str;
}
