//! Reflex gate: last-chance overrides between planner and world.
//!
//! Overload is the one reflex: too many distinct tokens in view forces
//! a no-op so perception can settle. A streak counter relaxes the rule
//! when it keeps firing, so the organism acts again instead of
//! freezing in a busy corner; high boredom relaxes it immediately.

use noema_core::config::ReflexConfig;
use noema_core::{round3, Action, NoteSink};
use serde_json::json;
use tracing::debug;

/// Outcome of one reflex pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflexReport {
    pub action: Action,
    pub triggers: Vec<String>,
}

pub struct ReflexGate {
    overload_threshold: usize,
    max_noop_on_overload: u32,
    relax_boredom: f64,
    overload_streak: u32,
    last_tick: Option<u64>,
}

impl ReflexGate {
    pub fn new(cfg: &ReflexConfig) -> Self {
        Self {
            overload_threshold: cfg.overload_threshold,
            max_noop_on_overload: cfg.max_noop_on_overload,
            relax_boredom: cfg.relax_boredom,
            overload_streak: 0,
            last_tick: None,
        }
    }

    /// Inspect the proposed action and either pass it through or veto
    /// it. `unique_count` is the number of distinct tokens in view.
    pub fn advise(
        &mut self,
        tick: u64,
        proposed: Action,
        unique_count: usize,
        boredom: f64,
        notes: &mut dyn NoteSink,
    ) -> ReflexReport {
        // Streaks only mean something across consecutive ticks.
        if self.last_tick.map(|t| t + 1) != Some(tick) {
            self.overload_streak = 0;
        }
        self.last_tick = Some(tick);

        let mut triggers: Vec<String> = Vec::new();
        let mut action = proposed;

        if unique_count >= self.overload_threshold {
            triggers.push("overload".to_string());
            if self.overload_streak >= self.max_noop_on_overload || boredom >= self.relax_boredom {
                triggers.push("relaxed".to_string());
                self.overload_streak = self.overload_streak.saturating_sub(1);
            } else {
                action = Action::Noop;
                self.overload_streak += 1;
            }
        } else {
            self.overload_streak = 0;
        }

        if !triggers.is_empty() {
            debug!(tick, ?triggers, original = proposed.as_name(), "reflex fired");
            notes.note(
                tick,
                "reflex",
                json!({
                    "tick": tick,
                    "triggers": triggers,
                    "original": proposed.as_name(),
                    "override": action.as_name(),
                    "unique": unique_count,
                    "streak": self.overload_streak,
                    "boredom": round3(boredom),
                }),
            );
        }

        ReflexReport { action, triggers }
    }
}
