//! Markdown rendering of run metrics.

use std::fs;
use std::path::Path;

use noema_core::Result;
use noema_expression::gloss_for;

use crate::metrics::{compute_metrics, load_events, RunMetrics};

fn fmt_pct(x: f64) -> String {
    format!("{:.2}%", 100.0 * x)
}

fn histogram(out: &mut Vec<String>, title: &str, label: &str, counts: &std::collections::BTreeMap<String, usize>) {
    out.push(String::new());
    out.push(format!("## {title}"));
    out.push(String::new());
    out.push(format!("| {label} | Ticks |"));
    out.push("|---|---|".to_string());
    if counts.is_empty() {
        out.push("| - | - |".to_string());
        return;
    }
    let mut rows: Vec<(&String, &usize)> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (name, n) in rows {
        out.push(format!("| {name} | {n} |"));
    }
}

/// Render the whole report as markdown.
pub fn render_report(m: &RunMetrics) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push("# Run report".to_string());
    out.push(String::new());
    out.push("## Overview".to_string());
    out.push(String::new());
    out.push("| Metric | Value |".to_string());
    out.push("|---|---|".to_string());
    out.push(format!("| Ticks | {} |", m.ticks));
    out.push(format!("| Novelty mean | {:.3} |", m.novelty_mean));
    out.push(format!("| Novelty p95 | {:.3} |", m.novelty_p95));
    out.push(format!("| Boredom mean | {:.3} |", m.boredom_mean));
    out.push(format!("| Action diversity (Simpson) | {:.3} |", m.action_diversity));
    out.push(format!(
        "| Memory reuse | {} ({} / {}) |",
        fmt_pct(m.memory_reuse),
        m.recall_helpful,
        m.recall_any
    ));
    out.push(format!("| Emissions | {} |", m.emissions));
    out.push(format!("| Emission continuity | {} |", fmt_pct(m.continuity)));
    out.push(format!("| Final coverage | {:.3} |", m.final_coverage));

    histogram(&mut out, "Drives", "Drive", &m.drives);
    histogram(&mut out, "Actions", "Action", &m.actions);
    histogram(&mut out, "Behaviors", "Behavior", &m.behaviors);

    out.push(String::new());
    out.push("## Channel".to_string());
    out.push(String::new());
    if m.token_counts.is_empty() {
        out.push("The channel stayed silent this run.".to_string());
    } else {
        out.push("| Token | Count | Gloss |".to_string());
        out.push("|---|---|---|".to_string());
        let mut rows: Vec<(&String, &usize)> = m.token_counts.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (token, n) in rows {
            out.push(format!("| {token} | {n} | {} |", gloss_for(token).unwrap_or("-")));
        }
    }

    out.push(String::new());
    out.push("## Notes".to_string());
    out.push(String::new());
    if let Some((drive, n)) = m.drives.iter().max_by_key(|(name, n)| (**n, std::cmp::Reverse(name.as_str()))) {
        out.push(format!("- `{drive}` led the homeostat on {n} of {} ticks.", m.ticks));
    }
    if m.emissions == 0 {
        out.push("- The organism never spoke.".to_string());
    } else {
        out.push(format!(
            "- {} emissions over {} ticks, continuity {}.",
            m.emissions,
            m.ticks,
            fmt_pct(m.continuity)
        ));
    }
    if m.recall_any == 0 {
        out.push("- No recall cleared the memory threshold.".to_string());
    } else {
        out.push(format!(
            "- {} of recalled moments were strong matches.",
            fmt_pct(m.memory_reuse)
        ));
    }

    out.join("\n") + "\n"
}

/// Compute metrics for a run, write `report.md` next to its events,
/// and hand the metrics back for display.
pub fn eval_run(run_dir: &Path) -> Result<RunMetrics> {
    let events = load_events(run_dir);
    let m = compute_metrics(&events);
    fs::write(run_dir.join("report.md"), render_report(&m))?;
    Ok(m)
}
