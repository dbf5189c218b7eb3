//! Symbolic channel: compressed self-reports with rate limiting.
//!
//! A tiny fixed vocabulary stands in for speech. Each tick the channel
//! checks a handful of threshold rules against the appraisal signals
//! and, if anything fired and the cooldown allows, emits the tokens
//! together with their glosses. Caregiver-taught glosses ride along
//! when a taught token is emitted.

use std::collections::BTreeMap;

use noema_core::config::ChannelConfig;
use noema_core::{round3, NoteSink};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Vocabulary in canonical order, token paired with its gloss.
pub const VOCAB: [(&str, &str); 7] = [
    ("N!", "sharp novelty (surprise)"),
    ("N↑", "novelty rising"),
    ("Stab↓", "stability declining / restless"),
    ("?", "possible contradiction / mismatch"),
    ("Over!", "sensory overload"),
    ("Loop?", "repetition / loop risk"),
    ("Pat→", "pattern completion drive active"),
];

/// Built-in gloss for a vocabulary token.
pub fn gloss_for(token: &str) -> Option<&'static str> {
    VOCAB.iter().find(|(t, _)| *t == token).map(|(_, g)| *g)
}

/// One successful emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emission {
    pub tokens: Vec<String>,
    pub glosses: Vec<String>,
    pub caregiver_gloss: Vec<(String, String)>,
}

pub struct SymbolChannel {
    cfg: ChannelConfig,
    ext_tags: BTreeMap<String, String>,
    cooldown: u32,
    prev_novelty: f64,
    prev_boredom: f64,
    prev_fingerprint: Vec<String>,
}

impl SymbolChannel {
    pub fn new(cfg: &ChannelConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            ext_tags: BTreeMap::new(),
            cooldown: 0,
            prev_novelty: 0.0,
            prev_boredom: 0.0,
            prev_fingerprint: Vec::new(),
        }
    }

    /// Replace the caregiver-taught token → gloss map.
    pub fn set_tags(&mut self, tags: BTreeMap<String, String>) {
        self.ext_tags = tags;
    }

    pub fn encode(tokens: &[String]) -> String {
        tokens.join(" ")
    }

    /// Parse an encoded emission, dropping anything outside the vocabulary.
    pub fn decode(s: &str) -> Vec<String> {
        s.split_whitespace()
            .filter(|t| VOCAB.iter().any(|(v, _)| v == t))
            .map(str::to_string)
            .collect()
    }

    /// Evaluate the rules and possibly emit. Rules append in a fixed
    /// order; the trackers and the cooldown update every tick whether
    /// or not anything was said.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        tick: u64,
        novelty: f64,
        boredom: f64,
        top_sim: f64,
        unique: &[String],
        noop_streak: u32,
        reflex_triggers: &[String],
        dominant: &str,
        notes: &mut dyn NoteSink,
    ) -> Option<Emission> {
        let mut tokens: Vec<&str> = Vec::new();

        if reflex_triggers
            .iter()
            .any(|t| t.to_lowercase().starts_with("over"))
        {
            tokens.push("Over!");
        }

        if novelty >= self.cfg.novelty_hi {
            tokens.push("N!");
        } else if novelty - self.prev_novelty >= self.cfg.novelty_up && novelty >= 0.4 {
            tokens.push("N↑");
        }

        // threshold crossing or still-rising boredom, not a flat plateau
        if boredom >= self.cfg.boredom_hi
            && (boredom > self.prev_boredom || self.prev_boredom < self.cfg.boredom_hi)
        {
            tokens.push("Stab↓");
        }

        // memory says familiar, novelty says otherwise, and the scene
        // actually reads different from last tick
        if top_sim >= self.cfg.recall_hi && novelty >= 0.5 && unique != self.prev_fingerprint {
            tokens.push("?");
        }

        if noop_streak >= self.cfg.loop_noop {
            tokens.push("Loop?");
        }

        if dominant == "pattern_completion" {
            tokens.push("Pat→");
        }

        let emission = if !tokens.is_empty() && self.cooldown == 0 {
            self.cooldown = self.cfg.cooldown_ticks;
            let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            let glosses: Vec<String> = tokens
                .iter()
                .filter_map(|t| gloss_for(t))
                .map(str::to_string)
                .collect();
            let caregiver_gloss: Vec<(String, String)> = tokens
                .iter()
                .filter_map(|t| self.ext_tags.get(t).map(|g| (t.clone(), g.clone())))
                .collect();
            debug!(tick, ?tokens, "symbol emission");
            notes.note(
                tick,
                "symbol",
                json!({
                    "tick": tick,
                    "emit": tokens,
                    "gloss": glosses,
                    "caregiver_gloss": caregiver_gloss,
                    "novelty": round3(novelty),
                    "boredom": round3(boredom),
                    "top_sim": round3(top_sim),
                }),
            );
            Some(Emission { tokens, glosses, caregiver_gloss })
        } else {
            None
        };

        self.prev_novelty = novelty;
        self.prev_boredom = boredom;
        self.prev_fingerprint = unique.to_vec();
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }

        emission
    }
}
