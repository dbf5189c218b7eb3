//! Staleness and boredom tracking.
//!
//! Boredom rises when the novelty EMA sags, when the organism keeps
//! answering with noop, and when the window looks exactly the same
//! tick after tick. The monitor also keeps the visited heatmap that
//! the planner's explore behavior walks against.
//!
//! Call order per tick: `pre` before planning, `post` after the
//! environment applied the final action.

use noema_core::config::StalenessConfig;
use noema_core::{clamp01, Action};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Staleness readout produced by `pre`, consumed downstream as the
/// boredom signal of the tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StalenessReport {
    pub ema: f64,
    pub noop_streak: u32,
    pub repeat_streak: u32,
    pub boredom: f64,
}

pub struct StalenessMonitor {
    alpha: f64,
    max_noop: u32,
    max_repeat: u32,
    size: i64,
    novelty_ema: f64,
    noop_streak: u32,
    repeat_streak: u32,
    last_view: Option<Vec<(String, u32)>>,
    visited: BTreeMap<(i64, i64), u64>,
}

impl StalenessMonitor {
    pub fn new(cfg: &StalenessConfig, size: i64) -> Self {
        Self {
            alpha: cfg.ema_alpha,
            max_noop: cfg.max_noop,
            max_repeat: cfg.max_repeat,
            size,
            // A newborn organism finds everything novel.
            novelty_ema: 1.0,
            noop_streak: 0,
            repeat_streak: 0,
            last_view: None,
            visited: BTreeMap::new(),
        }
    }

    /// Pre-action step: fold novelty into the EMA, track the repeat
    /// streak over the scene signature, and compute boredom.
    pub fn pre(&mut self, novelty: f64, signature: Vec<(String, u32)>, pos: (i64, i64)) -> StalenessReport {
        self.novelty_ema = (1.0 - self.alpha) * self.novelty_ema + self.alpha * clamp01(novelty);

        match &self.last_view {
            Some(last) if *last == signature => self.repeat_streak += 1,
            _ => self.repeat_streak = 0,
        }
        self.last_view = Some(signature);

        // Current position participates in least-visited comparisons
        // even before it is ever stepped onto.
        self.visited.entry(pos).or_insert(0);

        let mut b = 0.5 * (1.0 - self.novelty_ema).max(0.0);
        b += 0.25 * (self.noop_streak as f64 / self.max_noop.max(1) as f64).min(1.0);
        b += 0.25 * (self.repeat_streak as f64 / self.max_repeat.max(1) as f64).min(1.0);

        StalenessReport {
            ema: self.novelty_ema,
            noop_streak: self.noop_streak,
            repeat_streak: self.repeat_streak,
            boredom: clamp01(b),
        }
    }

    /// Post-action step: streak bookkeeping against the action that was
    /// actually executed, and the visited heatmap.
    pub fn post(&mut self, action_final: Action, pos_next: (i64, i64)) {
        if action_final == Action::Noop {
            self.noop_streak += 1;
        } else {
            self.noop_streak = 0;
        }
        *self.visited.entry(pos_next).or_insert(0) += 1;
    }

    /// In-bounds neighbor directions whose visited count is minimal,
    /// name-ascending on ties (down, left, right, up).
    pub fn least_visited_dirs(&self, pos: (i64, i64)) -> Vec<Action> {
        let (x, y) = pos;
        let mut neighbors: Vec<(Action, (i64, i64))> = Vec::new();
        if y > 0 {
            neighbors.push((Action::Up, (x, y - 1)));
        }
        if y < self.size - 1 {
            neighbors.push((Action::Down, (x, y + 1)));
        }
        if x > 0 {
            neighbors.push((Action::Left, (x - 1, y)));
        }
        if x < self.size - 1 {
            neighbors.push((Action::Right, (x + 1, y)));
        }
        if neighbors.is_empty() {
            return Vec::new();
        }
        let mut counted: Vec<(u64, &'static str, Action)> = neighbors
            .into_iter()
            .map(|(dir, p)| (self.visited.get(&p).copied().unwrap_or(0), dir.as_name(), dir))
            .collect();
        counted.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(b.1)));
        let min = counted[0].0;
        counted.into_iter().filter(|(c, _, _)| *c == min).map(|(_, _, d)| d).collect()
    }

    pub fn visit_count(&self, pos: (i64, i64)) -> u64 {
        self.visited.get(&pos).copied().unwrap_or(0)
    }
}
