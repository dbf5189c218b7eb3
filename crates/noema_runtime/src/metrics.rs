//! Run metrics computed from the canonical event log.
//!
//! Everything here reads the tick events back the way any external
//! tool would, so the metrics double as a check that the log contract
//! holds. Loading is tolerant: a corrupt line costs one tick of data,
//! not the whole evaluation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub ticks: usize,
    pub novelty_mean: f64,
    pub novelty_p95: f64,
    pub boredom_mean: f64,
    pub actions: BTreeMap<String, usize>,
    pub drives: BTreeMap<String, usize>,
    pub behaviors: BTreeMap<String, usize>,
    /// Ticks on which the channel spoke.
    pub emissions: usize,
    pub token_counts: BTreeMap<String, usize>,
    /// Share of emissions that repeat the immediately preceding one.
    pub continuity: f64,
    /// Simpson diversity of the action histogram.
    pub action_diversity: f64,
    pub recall_any: usize,
    pub recall_helpful: usize,
    /// recall_helpful / recall_any.
    pub memory_reuse: f64,
    pub final_coverage: f64,
}

/// Read `events.jsonl` from a run directory, skipping anything that
/// does not parse. A missing file reads as an empty run.
pub fn load_events(run_dir: &Path) -> Vec<Value> {
    let Ok(text) = fs::read_to_string(run_dir.join("events.jsonl")) else {
        return Vec::new();
    };
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            serde_json::from_str(line).ok()
        })
        .collect()
}

fn num(event: &Value, outer: &str, inner: &str) -> f64 {
    event
        .get(outer)
        .and_then(|v| v.get(inner))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn name(event: &Value, outer: &str, inner: &str) -> String {
    event
        .get(outer)
        .and_then(|v| v.get(inner))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Best recall score of a tick, 0.0 when nothing was recalled.
fn top_sim(event: &Value) -> f64 {
    event
        .get("recall")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|h| h.get("score").and_then(Value::as_f64))
                .fold(0.0, f64::max)
        })
        .unwrap_or(0.0)
}

fn channel_tokens(event: &Value) -> Vec<String> {
    event
        .get("channel")
        .and_then(|c| c.get("tokens"))
        .and_then(Value::as_array)
        .map(|toks| {
            toks.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Nearest-rank p95 over the sorted sample.
fn p95(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((0.95 * (sorted.len() as f64 - 1.0)).round() as usize).min(sorted.len() - 1);
    sorted[idx]
}

fn simpson(counts: &BTreeMap<String, usize>) -> f64 {
    let n: usize = counts.values().sum();
    if n <= 1 {
        return 0.0;
    }
    let squares: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n as f64;
            p * p
        })
        .sum();
    1.0 - squares
}

/// Boil a run's events down to the headline numbers.
pub fn compute_metrics(events: &[Value]) -> RunMetrics {
    let ticks: Vec<&Value> = events
        .iter()
        .filter(|e| e.get("type").and_then(Value::as_str) == Some("tick"))
        .collect();

    let novelty: Vec<f64> = ticks.iter().map(|e| num(e, "curiosity", "novelty")).collect();
    let boredom: Vec<f64> = ticks.iter().map(|e| num(e, "staleness", "boredom")).collect();

    let mut actions: BTreeMap<String, usize> = BTreeMap::new();
    let mut drives: BTreeMap<String, usize> = BTreeMap::new();
    let mut behaviors: BTreeMap<String, usize> = BTreeMap::new();
    for e in &ticks {
        if let Some(a) = e.get("action_final").and_then(Value::as_str) {
            *actions.entry(a.to_string()).or_insert(0) += 1;
        }
        let drive = name(e, "motivation", "dominant");
        if !drive.is_empty() {
            *drives.entry(drive).or_insert(0) += 1;
        }
        let behavior = name(e, "planner", "behavior");
        if !behavior.is_empty() {
            *behaviors.entry(behavior).or_insert(0) += 1;
        }
    }

    let mut token_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut spoken: Vec<String> = Vec::new();
    for e in &ticks {
        let toks = channel_tokens(e);
        if toks.is_empty() {
            continue;
        }
        for t in &toks {
            *token_counts.entry(t.clone()).or_insert(0) += 1;
        }
        spoken.push(toks.join(" "));
    }
    let emissions = spoken.len();
    let repeats = spoken.windows(2).filter(|w| w[0] == w[1]).count();
    let continuity = if emissions > 0 { repeats as f64 / emissions as f64 } else { 0.0 };

    let tops: Vec<f64> = ticks.iter().map(|e| top_sim(e)).collect();
    let recall_any = tops.iter().filter(|&&s| s > 0.0).count();
    let recall_helpful = tops.iter().filter(|&&s| s >= 0.5).count();
    let memory_reuse = if recall_any > 0 { recall_helpful as f64 / recall_any as f64 } else { 0.0 };

    let final_coverage = ticks.last().map(|e| num(e, "state", "coverage")).unwrap_or(0.0);

    RunMetrics {
        ticks: ticks.len(),
        novelty_mean: mean(&novelty),
        novelty_p95: p95(&novelty),
        boredom_mean: mean(&boredom),
        action_diversity: simpson(&actions),
        actions,
        drives,
        behaviors,
        emissions,
        token_counts,
        continuity,
        recall_any,
        recall_helpful,
        memory_reuse,
        final_coverage,
    }
}
