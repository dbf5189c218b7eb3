//! Multi-drive homeostat.
//!
//! Six drives compete as leaky integrators: each tick a bounded
//! stimulus is folded in, the old level leaks toward the drive's
//! setpoint, and the highest level becomes the dominant drive the
//! planner acts on. Gain modifiers from the learning manager scale
//! stimulus intake multiplicatively, never below zero.
//!
//! The drive registry is a fixed, explicitly ordered table so that
//! dominant tie-breaking and iteration order are identical on every
//! run and platform.

use crate::learning::GainMods;
use noema_core::{clamp01, round3, NoteSink};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One drive's homeostatic parameters.
#[derive(Debug, Clone, Copy)]
pub struct DriveDescriptor {
    pub name: &'static str,
    /// Leak rate per tick; also how strongly the setpoint pulls.
    pub decay: f64,
    /// Stimulus intake scale.
    pub gain: f64,
    /// Resting level the drive relaxes toward.
    pub setpoint: f64,
}

/// Registry order doubles as dominant-drive priority on exact ties.
pub const DRIVES: [DriveDescriptor; 6] = [
    DriveDescriptor { name: "curiosity", decay: 0.08, gain: 0.9, setpoint: 0.0 },
    DriveDescriptor { name: "stability", decay: 0.06, gain: 0.8, setpoint: 0.0 },
    DriveDescriptor { name: "pattern_completion", decay: 0.07, gain: 0.7, setpoint: 0.0 },
    DriveDescriptor { name: "truth_seeking", decay: 0.09, gain: 0.9, setpoint: 0.0 },
    DriveDescriptor { name: "caregiver_alignment", decay: 0.03, gain: 0.2, setpoint: 0.2 },
    DriveDescriptor { name: "overload_regulation", decay: 0.20, gain: 1.0, setpoint: 0.0 },
];

/// Appraisal inputs for one homeostat step. `overloaded` reflects the
/// previous tick's reflex outcome; the homeostat never sees its own
/// tick's gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveStimuli {
    pub novelty: f64,
    pub change: f64,
    pub rarity: f64,
    pub top_sim: f64,
    pub boredom: f64,
    pub overloaded: bool,
}

/// Drive levels after one step, in registry order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationReport {
    pub dominant: String,
    pub values: Vec<(String, f64)>,
}

impl MotivationReport {
    pub fn value(&self, name: &str) -> f64 {
        self.values.iter().find(|(n, _)| n == name).map_or(0.0, |(_, v)| *v)
    }
}

pub struct MotivationManager {
    values: [f64; DRIVES.len()],
    last_dominant: Option<&'static str>,
}

impl Default for MotivationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MotivationManager {
    pub fn new() -> Self {
        let mut values = [0.0; DRIVES.len()];
        for (v, d) in values.iter_mut().zip(DRIVES.iter()) {
            *v = if d.setpoint > 0.0 { d.setpoint } else { 0.0 };
        }
        Self { values, last_dominant: None }
    }

    /// One homeostat step. `mods` carries the previous tick's gain
    /// modifiers for curiosity and stability; all other drives run
    /// unmodified.
    pub fn update(
        &mut self,
        tick: u64,
        stimuli: &DriveStimuli,
        mods: &GainMods,
        notes: &mut dyn NoteSink,
    ) -> MotivationReport {
        let nov = clamp01(stimuli.novelty);
        let chg = clamp01(stimuli.change);
        let rar = clamp01(stimuli.rarity);
        let max_sim = clamp01(stimuli.top_sim);
        let b = clamp01(stimuli.boredom);
        let mid_sim = if (0.3..=0.8).contains(&max_sim) { 1.0 } else { 0.0 };
        let overloaded = if stimuli.overloaded { 1.0 } else { 0.0 };

        // === per-drive stimulus, each capped at 1 ===
        let stims = [
            (0.5 * nov + 0.2 * rar + 0.3 * chg + 0.3 * b).min(1.0),
            ((0.7 * max_sim + 0.3 * (1.0 - chg) - 0.4 * b).max(0.0) + 0.2 * overloaded).min(1.0),
            (0.8 * mid_sim + 0.2 * (1.0 - nov)).min(1.0),
            (0.5 * nov + 0.5 * chg).min(1.0),
            (0.1 * nov).min(1.0),
            overloaded,
        ];
        let gain_mods = [mods.curiosity, mods.stability, 0.0, 0.0, 0.0, 0.0];

        // === leaky integration toward setpoints ===
        for i in 0..DRIVES.len() {
            let d = &DRIVES[i];
            let leaked = (1.0 - d.decay) * self.values[i];
            let eff = stims[i].max(0.0) * (1.0 + gain_mods[i]).max(0.0);
            self.values[i] = clamp01(leaked + d.gain * eff + d.setpoint * d.decay);
        }

        // === dominant: highest level, registry order breaks ties ===
        let mut best = 0;
        for i in 1..DRIVES.len() {
            if self.values[i] > self.values[best] {
                best = i;
            }
        }
        let dominant = DRIVES[best].name;

        if self.last_dominant != Some(dominant) {
            tracing::debug!(tick, dominant, "dominant drive shifted");
            let drives: serde_json::Map<String, serde_json::Value> = DRIVES
                .iter()
                .zip(self.values.iter())
                .map(|(d, v)| (d.name.to_string(), json!(round3(*v))))
                .collect();
            notes.note(
                tick,
                "motivation",
                json!({
                    "tick": tick,
                    "dominant": dominant,
                    "boredom": round3(b),
                    "drives": drives,
                }),
            );
            self.last_dominant = Some(dominant);
        }

        MotivationReport {
            dominant: dominant.to_string(),
            values: DRIVES
                .iter()
                .zip(self.values.iter())
                .map(|(d, v)| (d.name.to_string(), *v))
                .collect(),
        }
    }
}
