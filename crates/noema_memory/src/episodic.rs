//! Episodic memory: a bounded ring of embedded moments.
//!
//! Recall is plain cosine over unit vectors with a floor; nothing is
//! indexed because the buffer is small by construction. Eviction is
//! strictly oldest-first, so the organism's past has a horizon.

use noema_core::clamp01;
use noema_core::config::MemoryConfig;
use noema_perception::l2_normalize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub tick: u64,
    pub vector: Vec<f64>,
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

/// One recall result. `score` is the clamped cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallHit {
    pub tick: u64,
    pub score: f64,
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EpisodicMemory {
    dim: usize,
    max_items: usize,
    top_k: usize,
    min_score: f64,
    vocab_hint: usize,
    items: VecDeque<Episode>,
    seen_tokens: BTreeSet<String>,
}

impl EpisodicMemory {
    pub fn new(cfg: &MemoryConfig, dim: usize) -> Self {
        Self {
            dim,
            max_items: cfg.max_items,
            top_k: cfg.top_k,
            min_score: cfg.min_score,
            vocab_hint: cfg.vocab_hint.max(1),
            items: VecDeque::with_capacity(cfg.max_items.min(1024)),
            seen_tokens: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store one moment. The vector is padded or truncated to the
    /// memory dimension, scrubbed of non-finite components and
    /// re-normalized so later cosines stay honest.
    pub fn add(&mut self, tick: u64, mut vector: Vec<f64>, tokens: Vec<String>) {
        vector.resize(self.dim, 0.0);
        for x in vector.iter_mut() {
            if !x.is_finite() {
                *x = 0.0;
            }
        }
        l2_normalize(&mut vector);
        for token in &tokens {
            self.seen_tokens.insert(token.clone());
        }
        if self.items.len() == self.max_items {
            self.items.pop_front();
        }
        self.items.push_back(Episode { tick, vector, tokens, tags: Vec::new() });
    }

    /// Recall the closest stored moments: cosine clamped to [0, 1],
    /// floored at `min_score`, best first. Ties keep storage order.
    pub fn query(&self, vector: &[f64]) -> Vec<RecallHit> {
        let mut hits: Vec<RecallHit> = self
            .items
            .iter()
            .filter_map(|ep| {
                let score = clamp01(dot(&ep.vector, vector));
                (score >= self.min_score).then(|| RecallHit {
                    tick: ep.tick,
                    score,
                    tokens: ep.tokens.clone(),
                    tags: ep.tags.clone(),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(self.top_k);
        hits
    }

    /// Attach a tag to the episode stored at `tick`, if it is still
    /// buffered. Re-tagging with the same tag is a no-op.
    pub fn tag(&mut self, tick: u64, tag: &str) {
        if let Some(ep) = self.items.iter_mut().find(|ep| ep.tick == tick) {
            if !ep.tags.iter().any(|t| t == tag) {
                ep.tags.push(tag.to_string());
            }
        }
    }

    /// Fraction of the estimated vocabulary the organism has ever seen.
    pub fn coverage(&self) -> f64 {
        clamp01(self.seen_tokens.len() as f64 / self.vocab_hint as f64)
    }

    pub fn distinct_tokens(&self) -> usize {
        self.seen_tokens.len()
    }

    /// For each token, the number of buffered episodes it appears in.
    /// Evicted episodes drop out, so frequencies track the horizon.
    pub fn doc_freqs(&self) -> std::collections::BTreeMap<String, u64> {
        let mut freqs = std::collections::BTreeMap::new();
        for ep in &self.items {
            let mut seen: Vec<&str> = ep.tokens.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for token in seen {
                *freqs.entry(token.to_string()).or_insert(0) += 1;
            }
        }
        freqs
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> EpisodicMemory {
        EpisodicMemory::new(&MemoryConfig::default(), 4)
    }

    fn unit(v: Vec<f64>) -> Vec<f64> {
        let mut v = v;
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn test_query_empty_memory_returns_nothing() {
        let m = memory();
        assert!(m.query(&unit(vec![1.0, 0.0, 0.0, 0.0])).is_empty());
    }

    #[test]
    fn test_query_orders_by_score_and_respects_floor() {
        let mut m = memory();
        m.add(0, vec![1.0, 0.0, 0.0, 0.0], vec!["Ro".into()]);
        m.add(1, vec![0.0, 1.0, 0.0, 0.0], vec!["G^".into()]);
        m.add(2, vec![1.0, 1.0, 0.0, 0.0], vec!["Ro".into(), "G^".into()]);

        let q = unit(vec![1.0, 0.0, 0.0, 0.0]);
        let hits = m.query(&q);
        // tick 1 is orthogonal and falls under the floor
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].tick, 0);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
        assert_eq!(hits[1].tick, 2);
        assert!(hits[1].score >= 0.35);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut m = memory();
        m.add(0, vec![1.0, 0.0, 0.0, 0.0], vec![]);
        m.add(1, vec![1.0, 0.0, 0.0, 0.0], vec![]);
        m.add(2, vec![1.0, 0.0, 0.0, 0.0], vec![]);
        let hits = m.query(&unit(vec![1.0, 0.0, 0.0, 0.0]));
        let ticks: Vec<u64> = hits.iter().map(|h| h.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut cfg = MemoryConfig::default();
        cfg.max_items = 2;
        let mut m = EpisodicMemory::new(&cfg, 4);
        m.add(0, vec![1.0, 0.0, 0.0, 0.0], vec![]);
        m.add(1, vec![1.0, 0.0, 0.0, 0.0], vec![]);
        m.add(2, vec![1.0, 0.0, 0.0, 0.0], vec![]);
        assert_eq!(m.len(), 2);
        let ticks: Vec<u64> = m.query(&unit(vec![1.0, 0.0, 0.0, 0.0]))
            .iter()
            .map(|h| h.tick)
            .collect();
        assert_eq!(ticks, vec![1, 2]);
    }

    #[test]
    fn test_add_pads_and_renormalizes() {
        let mut m = memory();
        // shorter than dim, not unit length
        m.add(0, vec![3.0, 4.0], vec![]);
        let hits = m.query(&unit(vec![3.0, 4.0, 0.0, 0.0]));
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tag_is_idempotent_and_survives_recall() {
        let mut m = memory();
        m.add(7, vec![1.0, 0.0, 0.0, 0.0], vec!["Ro".into()]);
        m.tag(7, "attention");
        m.tag(7, "attention");
        m.tag(99, "missing"); // silently ignored
        let hits = m.query(&unit(vec![1.0, 0.0, 0.0, 0.0]));
        assert_eq!(hits[0].tags, vec!["attention".to_string()]);
    }

    #[test]
    fn test_non_finite_components_are_scrubbed() {
        let mut m = memory();
        m.add(0, vec![f64::NAN, 1.0, f64::INFINITY, 0.0], vec![]);
        let hits = m.query(&unit(vec![0.0, 1.0, 0.0, 0.0]));
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9, "NaN slots read as zero");
    }

    #[test]
    fn test_doc_freqs_count_episodes_not_occurrences() {
        let mut m = memory();
        m.add(0, vec![1.0, 0.0, 0.0, 0.0], vec!["Ro".into(), "Ro".into(), "G^".into()]);
        m.add(1, vec![1.0, 0.0, 0.0, 0.0], vec!["Ro".into()]);
        let df = m.doc_freqs();
        assert_eq!(df.get("Ro"), Some(&2), "duplicates inside one episode count once");
        assert_eq!(df.get("G^"), Some(&1));
        assert_eq!(df.get("Bs"), None);
    }

    #[test]
    fn test_coverage_counts_distinct_tokens() {
        let mut cfg = MemoryConfig::default();
        cfg.vocab_hint = 4;
        let mut m = EpisodicMemory::new(&cfg, 4);
        assert_eq!(m.coverage(), 0.0);
        m.add(0, vec![1.0, 0.0, 0.0, 0.0], vec!["Ro".into(), "G^".into()]);
        m.add(1, vec![1.0, 0.0, 0.0, 0.0], vec!["Ro".into()]);
        assert!((m.coverage() - 0.5).abs() < 1e-12);
    }
}
