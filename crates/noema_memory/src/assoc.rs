//! Undirected token co-occurrence graph.
//!
//! Every tick the distinct tokens in view strengthen their pairwise
//! edges by one. The graph is a cheap stand-in for semantic structure:
//! which objects tend to appear together. Keys are kept sorted so the
//! JSON serialization is byte-stable.

use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Pair keys are stored with the lexicographically smaller token first,
/// so `(a, b)` and `(b, a)` are the same edge.
#[derive(Debug, Clone, Default)]
pub struct AssocGraph {
    edges: BTreeMap<(String, String), u64>,
}

impl AssocGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Register one co-occurrence event: every unordered pair of
    /// distinct tokens gains one count, regardless of multiplicity.
    pub fn add_event(&mut self, tokens: &[String]) {
        let mut uniq: Vec<&String> = tokens.iter().collect();
        uniq.sort();
        uniq.dedup();
        for i in 0..uniq.len() {
            for j in (i + 1)..uniq.len() {
                let key = (uniq[i].clone(), uniq[j].clone());
                *self.edges.entry(key).or_insert(0) += 1;
            }
        }
    }

    pub fn strength(&self, a: &str, b: &str) -> u64 {
        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        self.edges.get(&key).copied().unwrap_or(0)
    }

    /// Strongest co-occurring partners of `token`: count descending,
    /// name ascending on ties.
    pub fn neighbors(&self, token: &str, k: usize) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = self
            .edges
            .iter()
            .filter_map(|((a, b), &n)| {
                if a == token {
                    Some((b.clone(), n))
                } else if b == token {
                    Some((a.clone(), n))
                } else {
                    None
                }
            })
            .collect();
        out.sort_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(&y.0)));
        out.truncate(k);
        out
    }

    /// Strongest edges overall, same tie rule as [`neighbors`].
    ///
    /// [`neighbors`]: AssocGraph::neighbors
    pub fn top_assoc(&self, k: usize) -> Vec<(String, String, u64)> {
        let mut out: Vec<(String, String, u64)> = self
            .edges
            .iter()
            .map(|((a, b), &n)| (a.clone(), b.clone(), n))
            .collect();
        out.sort_by(|x, y| y.2.cmp(&x.2).then_with(|| (&x.0, &x.1).cmp(&(&y.0, &y.1))));
        out.truncate(k);
        out
    }

    /// JSON object keyed `"a|b"`. Tokens never contain `|`, so the key
    /// is unambiguous.
    pub fn to_json(&self) -> Value {
        let map: BTreeMap<String, u64> = self
            .edges
            .iter()
            .map(|((a, b), &n)| (format!("{a}|{b}"), n))
            .collect();
        json!(map)
    }

    pub fn from_json(value: &Value) -> Self {
        let mut graph = Self::new();
        if let Some(map) = value.as_object() {
            for (key, count) in map {
                if let (Some((a, b)), Some(n)) = (key.split_once('|'), count.as_u64()) {
                    graph.edges.insert((a.to_string(), b.to_string()), n);
                }
            }
        }
        graph
    }
}
