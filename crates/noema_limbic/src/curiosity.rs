//! Curiosity appraisal: how surprising, changed and rare the scene is.
//!
//! Novelty is the inverse of the best recall similarity, change is the
//! Jaccard distance to the previous tick's token set, and rarity is a
//! normalized inverse document frequency over the episodic buffer. The
//! attention list picks out what deserves a closer look: unseen tokens
//! first, then the rarest of the familiar ones.

use noema_core::{clamp01, round3, NoteSink};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

use noema_core::config::CuriosityConfig;

/// Signals produced once per tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuriosityReport {
    pub novelty: f64,
    pub change: f64,
    pub rarity: f64,
    pub attention: Vec<String>,
}

pub struct CuriosityEngine {
    note_novelty: f64,
    note_change: f64,
    top_k: usize,
    prev_unique: Vec<String>,
}

impl CuriosityEngine {
    pub fn new(cfg: &CuriosityConfig) -> Self {
        Self {
            note_novelty: cfg.note_novelty,
            note_change: cfg.note_change,
            top_k: cfg.attention_k,
            prev_unique: Vec::new(),
        }
    }

    /// Assess the current scene. `unique` is the sorted distinct token
    /// list, `top_match` the best recall hit as (tick, score), `df` the
    /// per-token document frequencies over the `n_episodes` buffered
    /// episodes. An empty memory reads as maximally novel.
    pub fn assess(
        &mut self,
        tick: u64,
        unique: &[String],
        top_match: Option<(u64, f64)>,
        df: &BTreeMap<String, u64>,
        n_episodes: usize,
        notes: &mut dyn NoteSink,
    ) -> CuriosityReport {
        let max_sim = clamp01(top_match.map_or(0.0, |(_, score)| score));
        let novelty = 1.0 - max_sim;

        // === change: Jaccard distance against the previous unique set ===
        let a: BTreeSet<&str> = self.prev_unique.iter().map(String::as_str).collect();
        let b: BTreeSet<&str> = unique.iter().map(String::as_str).collect();
        let change = if a.is_empty() && b.is_empty() {
            0.0
        } else {
            let inter = a.intersection(&b).count() as f64;
            let union = a.union(&b).count() as f64;
            1.0 - inter / union
        };

        // === rarity: mean normalized IDF over tokens in view ===
        let rarity = if unique.is_empty() {
            0.0
        } else {
            let sum: f64 = unique.iter().map(|t| idf_norm(df, n_episodes, t)).sum();
            sum / unique.len() as f64
        };

        // === attention: new tokens first, then the rarest familiar ones ===
        let new_tokens: Vec<&String> =
            unique.iter().filter(|t| !self.prev_unique.contains(t)).collect();
        let mut rare_sorted: Vec<&String> = unique.iter().collect();
        rare_sorted.sort_by_key(|t| df.get(t.as_str()).copied().unwrap_or(0));
        let mut attention: Vec<String> = Vec::new();
        for t in new_tokens.into_iter().chain(rare_sorted) {
            if !attention.iter().any(|seen| seen == t) {
                attention.push(t.clone());
            }
            if attention.len() >= self.top_k {
                break;
            }
        }

        if novelty >= self.note_novelty || change >= self.note_change {
            tracing::debug!(tick, novelty, change, "curiosity spike");
            notes.note(
                tick,
                "curiosity",
                json!({
                    "tick": tick,
                    "novelty": round3(novelty),
                    "change": round3(change),
                    "rarity": round3(rarity),
                    "attention": attention,
                    "top_match": top_match,
                }),
            );
        }

        self.prev_unique = unique.to_vec();
        CuriosityReport { novelty, change, rarity, attention }
    }
}

/// Normalized IDF in [0, 1]; with no history every token is fully rare.
fn idf_norm(df: &BTreeMap<String, u64>, n: usize, token: &str) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let d = df.get(token).copied().unwrap_or(0) as f64;
    let n = n as f64;
    ((n + 1.0) / (d + 1.0)).ln() / (n + 1.0).ln()
}
