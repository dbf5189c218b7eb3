//! Slow adaptive controller.
//!
//! A scalar reward is computed from the novelty surprise over a
//! running baseline, coverage gains and movement, minus a stall
//! penalty. The reward nudges two kinds of slow parameters: gain
//! modifiers that scale drive intake, and pressures that bias the
//! planner between exploring and settling. Everything decays gently
//! toward zero so a quiet organism drifts back to neutral.
//!
//! Outputs computed at tick T are consumed at tick T+1; the runtime
//! captures a [`ModSnapshot`] before calling `update`.

use noema_core::config::LearningConfig;
use noema_core::{round3, NoteSink};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Multiplicative drive-gain modifiers, each within [-0.5, 0.5].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GainMods {
    pub curiosity: f64,
    pub stability: f64,
}

/// Planner pressures, each within [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerBias {
    pub explore: f64,
    pub settle: f64,
}

/// The learning outputs as of the end of some tick. Taken before
/// `update` runs, this is what carries the one-tick delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModSnapshot {
    pub gain_mods: GainMods,
    pub bias: PlannerBias,
}

pub struct LearningManager {
    beta: f64,
    lr: f64,
    decay: f64,
    // A newborn expects full novelty, so early reward comes from
    // coverage and movement rather than surprise.
    ema_novelty: f64,
    prev_coverage: f64,
    mods: GainMods,
    bias: PlannerBias,
    last_reward: f64,
}

impl LearningManager {
    pub fn new(cfg: &LearningConfig) -> Self {
        Self {
            beta: cfg.ema_beta,
            lr: cfg.lr,
            decay: cfg.mod_decay,
            ema_novelty: 1.0,
            prev_coverage: 0.0,
            mods: GainMods::default(),
            bias: PlannerBias::default(),
            last_reward: 0.0,
        }
    }

    pub fn snapshot(&self) -> ModSnapshot {
        ModSnapshot { gain_mods: self.mods, bias: self.bias }
    }

    pub fn gain_mods(&self) -> GainMods {
        self.mods
    }

    pub fn planner_bias(&self) -> PlannerBias {
        self.bias
    }

    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    pub fn novelty_ema(&self) -> f64 {
        self.ema_novelty
    }

    /// Fold one tick of experience into the slow parameters and return
    /// the scalar reward.
    pub fn update(
        &mut self,
        tick: u64,
        novelty: f64,
        coverage: f64,
        moved: bool,
        noop_streak: u32,
        boredom: f64,
        notes: &mut dyn NoteSink,
    ) -> f64 {
        let novelty_delta = novelty - self.ema_novelty;
        let coverage_delta = coverage - self.prev_coverage;
        let stalled = noop_streak >= 4;

        let r = 0.6 * novelty_delta.max(0.0)
            + 0.3 * coverage_delta.max(0.0)
            + 0.2 * if moved { 1.0 } else { 0.0 }
            - 0.5 * if stalled { boredom } else { 0.0 };

        // === decay toward baseline ===
        self.mods.curiosity *= 1.0 - self.decay;
        self.mods.stability *= 1.0 - self.decay;
        self.bias.explore *= 1.0 - self.decay;
        self.bias.settle *= 1.0 - self.decay;

        // === reward-driven nudges ===
        self.mods.curiosity += self.lr * r;
        self.mods.stability -= 0.5 * self.lr * r;
        if r > 0.0 {
            self.bias.explore += self.lr * r;
        } else {
            // a stalled organism gets a push outward, a calm one a
            // nudge toward settling
            if stalled {
                self.bias.explore += 0.05;
            }
            if noop_streak == 0 {
                self.bias.settle += 0.02;
            }
        }

        self.mods.curiosity = self.mods.curiosity.clamp(-0.5, 0.5);
        self.mods.stability = self.mods.stability.clamp(-0.5, 0.5);
        self.bias.explore = self.bias.explore.clamp(0.0, 1.0);
        self.bias.settle = self.bias.settle.clamp(0.0, 1.0);

        self.ema_novelty = (1.0 - self.beta) * self.ema_novelty + self.beta * novelty;
        self.prev_coverage = coverage;
        self.last_reward = r;

        if r.abs() >= 0.25 || tick % 20 == 0 {
            notes.note(
                tick,
                "learning",
                json!({
                    "tick": tick,
                    "reward": round3(self.last_reward),
                    "mods": {
                        "curiosity": round3(self.mods.curiosity),
                        "stability": round3(self.mods.stability),
                    },
                    "bias": {
                        "explore": round3(self.bias.explore),
                        "settle": round3(self.bias.settle),
                    },
                    "novelty_ema": round3(self.ema_novelty),
                    "coverage": round3(self.prev_coverage),
                }),
            );
        }

        r
    }
}
