//! The `noema` binary: run the organism, replay stored events,
//! evaluate finished runs, and relay caregiver answers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use noema_core::{EventStore, NoemaConfig, KIND_NOTE, KIND_TICK};
use noema_expression::{append_answer, pending_queries};
use noema_runtime::{eval_run, run_loop};

#[derive(Parser, Debug)]
#[command(name = "noema", version, about = "A small tick-driven organism that explores a grid world")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the loop for a number of ticks and record every artifact.
    Run {
        /// Cognitive ticks to run (overrides the config file)
        #[arg(long)]
        ticks: Option<u64>,
        /// Deterministic seed (omitted: config seed, then entropy)
        #[arg(long)]
        seed: Option<u32>,
        /// TOML config file (default: noema.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory that collects run directories
        #[arg(long)]
        runs_dir: Option<PathBuf>,
        /// World to drop the organism into (grid-v0 or grid-v1)
        #[arg(long)]
        env: Option<String>,
        /// Also write logs to a daily-rolling file under the runs directory
        #[arg(long)]
        log_file: bool,
    },
    /// Stream stored events from a run's SQLite mirror as JSON lines.
    Replay {
        /// Run directory (default: newest under --runs-dir)
        #[arg(long)]
        run: Option<PathBuf>,
        /// Directory containing runs
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
        /// tick, note, or emit (only ticks on which the organism spoke)
        #[arg(long)]
        kind: Option<String>,
        /// First tick to include
        #[arg(long)]
        from: Option<u64>,
        /// Last tick to include
        #[arg(long)]
        to: Option<u64>,
    },
    /// Compute run metrics, write report.md and print the overview.
    Eval {
        /// Run directory
        #[arg(long)]
        run: PathBuf,
    },
    /// Inspect and answer the organism's symbol queries.
    Caregiver {
        #[command(subcommand)]
        command: CaregiverCmd,
    },
}

#[derive(Subcommand, Debug)]
enum CaregiverCmd {
    /// List queries that have no answer yet.
    Ls {
        /// Run directory
        #[arg(long)]
        run: PathBuf,
    },
    /// Append TOKEN=GLOSS answers; the organism adopts them on its next poll.
    Answer {
        /// Run directory
        #[arg(long)]
        run: PathBuf,
        /// Mappings like 'N!=sudden scene change' (repeatable)
        #[arg(required = true, value_name = "TOKEN=GLOSS")]
        tags: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { ticks, seed, config, runs_dir, env, log_file } => {
            cmd_run(ticks, seed, config, runs_dir, env, log_file)
        }
        Commands::Replay { run, runs_dir, kind, from, to } => {
            init_logging(None);
            cmd_replay(run.as_deref(), &runs_dir, kind.as_deref(), from, to)
        }
        Commands::Eval { run } => {
            init_logging(None);
            cmd_eval(&run)
        }
        Commands::Caregiver { command } => {
            init_logging(None);
            match command {
                CaregiverCmd::Ls { run } => cmd_caregiver_ls(&run),
                CaregiverCmd::Answer { run, tags } => cmd_caregiver_answer(&run, &tags),
            }
        }
    }
}

/// Logs go to stderr (or a rolling file); stdout carries user output
/// and replayed event lines.
fn init_logging(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("NOEMA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "noema.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .compact()
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .compact()
                .init();
            None
        }
    }
}

fn cmd_run(
    ticks: Option<u64>,
    seed: Option<u32>,
    config: Option<PathBuf>,
    runs_dir: Option<PathBuf>,
    env: Option<String>,
    log_file: bool,
) -> Result<()> {
    let mut cfg = match &config {
        Some(path) => NoemaConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NoemaConfig::load_or_default("noema.toml")?,
    };
    if let Some(t) = ticks {
        cfg.run.ticks = t;
    }
    if let Some(s) = seed {
        cfg.run.seed = Some(s);
    }
    if let Some(dir) = runs_dir {
        cfg.run.runs_dir = dir.display().to_string();
    }
    if let Some(name) = env {
        cfg.run.env = name;
    }
    cfg.validate()?;

    let runs_dir = PathBuf::from(&cfg.run.runs_dir);
    let _guard = init_logging(log_file.then_some(runs_dir.as_path()));
    if log_file {
        info!(dir = %runs_dir.display(), "rolling log files under the runs directory");
    }

    let seed = cfg.run.seed.unwrap_or_else(rand::random::<u32>);
    let summary = run_loop(&cfg, &runs_dir, cfg.run.ticks, seed)?;
    println!(
        "run {} finished: {} ticks, {} emissions, coverage {:.3} -> {}",
        summary.run_id,
        summary.ticks,
        summary.emissions,
        summary.coverage,
        summary.run_dir.display()
    );
    Ok(())
}

fn cmd_replay(
    run: Option<&Path>,
    runs_dir: &Path,
    kind: Option<&str>,
    from: Option<u64>,
    to: Option<u64>,
) -> Result<()> {
    let run_dir = match run {
        Some(dir) => dir.to_path_buf(),
        None => newest_run(runs_dir)?,
    };
    if !run_dir.join("events.sqlite").exists() {
        bail!("no events.sqlite in {}", run_dir.display());
    }

    let (stored_kind, emitted_only) = match kind {
        Some("emit") => (Some(KIND_TICK), true),
        Some(k) if k == KIND_TICK || k == KIND_NOTE => (Some(k), false),
        Some(other) => bail!("unknown kind {other:?} (expected tick, note or emit)"),
        None => (None, false),
    };

    let store = EventStore::open(&run_dir)?;
    for event in store.query(stored_kind, from, to)? {
        if emitted_only {
            let data: serde_json::Value = serde_json::from_str(&event.data)
                .with_context(|| format!("bad event row {} in store", event.id))?;
            if data["channel"].is_null() {
                continue;
            }
        }
        println!("{}", event.data);
    }
    Ok(())
}

/// The run directory with the newest mtime under `runs_dir`.
fn newest_run(runs_dir: &Path) -> Result<PathBuf> {
    let mut best: Option<(std::time::SystemTime, PathBuf)> = None;
    let entries = std::fs::read_dir(runs_dir)
        .with_context(|| format!("reading {}", runs_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if best.as_ref().map_or(true, |(t, _)| modified > *t) {
            best = Some((modified, entry.path()));
        }
    }
    best.map(|(_, p)| p)
        .ok_or_else(|| anyhow::anyhow!("no runs found in {}", runs_dir.display()))
}

fn cmd_eval(run: &Path) -> Result<()> {
    let m = eval_run(run).with_context(|| format!("evaluating {}", run.display()))?;
    println!("run: {}", run.display());
    println!(
        "ticks {} | novelty mean {:.3} p95 {:.3} | boredom mean {:.3}",
        m.ticks, m.novelty_mean, m.novelty_p95, m.boredom_mean
    );
    println!(
        "emissions {} | action diversity {:.3} | memory reuse {:.1}% | final coverage {:.3}",
        m.emissions,
        m.action_diversity,
        m.memory_reuse * 100.0,
        m.final_coverage
    );
    println!("report: {}", run.join("report.md").display());
    Ok(())
}

fn cmd_caregiver_ls(run: &Path) -> Result<()> {
    let pending = pending_queries(run);
    if pending.is_empty() {
        println!("No pending queries.");
        return Ok(());
    }
    for q in &pending {
        let token = q["token"].as_str().unwrap_or("?");
        let hint = q["gloss_hint"].as_str().unwrap_or("-");
        println!("tick={} token={} hint={}", q["tick"], token, hint);
    }
    Ok(())
}

fn cmd_caregiver_answer(run: &Path, tags: &[String]) -> Result<()> {
    for raw in tags {
        let Some((token, gloss)) = raw.split_once('=') else {
            bail!("expected TOKEN=GLOSS, got {raw:?}");
        };
        let token = token.trim();
        let gloss = gloss.trim();
        if token.is_empty() || gloss.is_empty() {
            bail!("expected TOKEN=GLOSS, got {raw:?}");
        }
        append_answer(run, token, gloss)?;
        println!("answered {token} = {gloss}");
    }
    Ok(())
}
