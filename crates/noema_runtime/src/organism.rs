//! The organism: all stages wired into one deterministic tick.
//!
//! A tick runs a fixed pipeline: observe, embed, recall, appraise
//! (curiosity, staleness), drive competition, learning, planning, the
//! reflex gate, the symbol channel, then the world step and memory
//! write-back. The learning manager's outputs are snapshotted before
//! its update runs, so motivation and planning always act on the
//! previous tick's gains. One call to [`Organism::tick`] is one moment
//! of subjective time; [`run_loop`] strings ticks together and owns
//! every file the run produces.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use noema_core::{
    round3, write_meta, Action, Environment, EventLog, EventStore, NoemaConfig, NoteSink,
    Observation, Result, RunMeta, RunState, SelfNotes, StepInfo, KIND_TICK,
};
use noema_expression::{Caregiver, Emission, SymbolChannel};
use noema_limbic::{
    CuriosityEngine, DriveStimuli, LearningManager, ModSnapshot, MotivationManager,
    StalenessMonitor,
};
use noema_memory::{AssocGraph, EpisodicMemory};
use noema_perception::{Embedder, SceneFeatures};
use noema_reasoning::{Planner, ReflexGate};
use serde_json::{json, Value};
use tracing::info;

use crate::tracker::Tracker;

/// Everything one tick produced: the canonical event line, the
/// emission (if the channel spoke) and the slow-loop outputs the tick
/// actually ran under.
pub struct TickOutput {
    pub event: Value,
    pub emission: Option<Emission>,
    pub applied: ModSnapshot,
}

pub struct Organism {
    env: Box<dyn Environment>,
    embedder: Embedder,
    memory: EpisodicMemory,
    assoc: AssocGraph,
    curiosity: CuriosityEngine,
    staleness: StalenessMonitor,
    motivation: MotivationManager,
    learning: LearningManager,
    planner: Planner,
    reflex: ReflexGate,
    channel: SymbolChannel,
    state: RunState,
    obs: Observation,
    prev_triggers: Vec<String>,
    prev_info: StepInfo,
}

impl Organism {
    /// Build the organism in the environment the config names.
    pub fn new(cfg: &NoemaConfig, seed: u32) -> Result<Self> {
        let env = noema_world::build(&cfg.run.env, cfg)?;
        Ok(Self::with_env(cfg, env, seed))
    }

    /// Build around an already-constructed environment.
    pub fn with_env(cfg: &NoemaConfig, mut env: Box<dyn Environment>, seed: u32) -> Self {
        let obs = env.reset(seed);
        let embedder = Embedder::new(&cfg.embedder);
        let memory = EpisodicMemory::new(&cfg.memory, embedder.dim());
        Self {
            env,
            embedder,
            memory,
            assoc: AssocGraph::new(),
            curiosity: CuriosityEngine::new(&cfg.curiosity),
            staleness: StalenessMonitor::new(&cfg.staleness, cfg.world.size),
            motivation: MotivationManager::new(),
            learning: LearningManager::new(&cfg.learning),
            planner: Planner::new(),
            reflex: ReflexGate::new(&cfg.reflex),
            channel: SymbolChannel::new(&cfg.channel),
            state: RunState::new(seed),
            obs,
            prev_triggers: Vec::new(),
            prev_info: StepInfo::default(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.state.run_id
    }

    /// Index of the next tick to run.
    pub fn tick_index(&self) -> u64 {
        self.state.tick
    }

    pub fn descriptor(&self) -> &str {
        self.env.descriptor()
    }

    /// Learning outputs the next tick will run under.
    pub fn pending_mods(&self) -> ModSnapshot {
        self.learning.snapshot()
    }

    pub fn coverage(&self) -> f64 {
        self.memory.coverage()
    }

    pub fn assoc(&self) -> &AssocGraph {
        &self.assoc
    }

    /// Push the caregiver's merged token → gloss map into the channel.
    pub fn adopt_tags(&mut self, tags: BTreeMap<String, String>) {
        self.channel.set_tags(tags);
    }

    /// Run one full pipeline pass and return its record.
    pub fn tick(&mut self, notes: &mut dyn NoteSink) -> TickOutput {
        let tick = self.state.tick;
        let pos = self.obs.agent;

        // perceive and embed the local window
        let unique = self.obs.unique_tokens();
        let counts = self.obs.token_counts();
        let features = SceneFeatures::extract(&self.obs);
        let vector = self.embedder.embed(&counts, &features);

        // recall before write-back, so the present can't match itself
        let hits = self.memory.query(&vector);
        self.assoc.add_event(&unique);
        let top = hits.first().map(|h| (h.tick, h.score));
        let top_sim = top.map_or(0.0, |(_, s)| s);

        // fast appraisal
        let df = self.memory.doc_freqs();
        let cur = self.curiosity.assess(tick, &unique, top, &df, self.memory.len(), notes);
        let stale = self.staleness.pre(cur.novelty, self.obs.signature(), pos);

        // slow-loop outputs land one tick late: snapshot first, update after
        let applied = self.learning.snapshot();
        let stimuli = DriveStimuli {
            novelty: cur.novelty,
            change: cur.change,
            rarity: cur.rarity,
            top_sim,
            boredom: stale.boredom,
            overloaded: self.prev_triggers.iter().any(|t| t == "overload"),
        };
        let motiv = self.motivation.update(tick, &stimuli, &applied.gain_mods, notes);
        let reward = self.learning.update(
            tick,
            cur.novelty,
            self.memory.coverage(),
            self.prev_info.moved,
            stale.noop_streak,
            stale.boredom,
            notes,
        );

        // plan, then let the reflex gate have the last word
        let least = self.staleness.least_visited_dirs(pos);
        let plan = self.planner.choose(
            tick,
            self.state.rng_seed,
            &motiv.dominant,
            stale.boredom,
            applied.bias,
            &least,
            pos,
        );
        let gate = self.reflex.advise(tick, plan.action, unique.len(), stale.boredom, notes);

        let emission = self.channel.step(
            tick,
            cur.novelty,
            stale.boredom,
            top_sim,
            &unique,
            stale.noop_streak,
            &gate.triggers,
            &motiv.dominant,
            notes,
        );

        // act on the world
        let (next_obs, info) = self.env.step(gate.action);

        // memory write-back: the moment as it was seen, attention tagged
        self.memory.add(tick, vector, unique.clone());
        for t in &cur.attention {
            self.memory.tag(tick, t);
        }
        self.staleness.post(gate.action, next_obs.agent);
        let coverage = self.memory.coverage();

        let mut drive_values = serde_json::Map::new();
        for (name, v) in &motiv.values {
            drive_values.insert(name.clone(), json!(round3(*v)));
        }
        let recall: Vec<Value> = hits
            .iter()
            .map(|h| json!({"tick": h.tick, "score": round3(h.score), "tokens": h.tokens}))
            .collect();
        let channel_value = match &emission {
            Some(e) => serde_json::to_value(e).unwrap_or(Value::Null),
            None => Value::Null,
        };
        let mods = self.learning.gain_mods();
        let bias = self.learning.planner_bias();

        self.prev_triggers = gate.triggers.clone();

        let event = json!({
            "type": "tick",
            "tick": tick,
            "pos": [pos.0, pos.1],
            "action_proposed": plan.action.as_name(),
            "action_final": gate.action.as_name(),
            "curiosity": {
                "novelty": round3(cur.novelty),
                "change": round3(cur.change),
                "rarity": round3(cur.rarity),
                "attention": cur.attention,
            },
            "staleness": {
                "boredom": round3(stale.boredom),
                "ema": round3(stale.ema),
                "repeat_streak": stale.repeat_streak,
                "noop_streak": stale.noop_streak,
            },
            "motivation": {
                "dominant": motiv.dominant,
                "values": Value::Object(drive_values),
            },
            "learning": {
                "reward": round3(reward),
                "gain_mods": {
                    "curiosity": round3(mods.curiosity),
                    "stability": round3(mods.stability),
                },
                "planner_bias": {
                    "explore": round3(bias.explore),
                    "settle": round3(bias.settle),
                },
            },
            "planner": {
                "behavior": plan.behavior.as_name(),
                "action": plan.action.as_name(),
            },
            "reflex": {"triggers": gate.triggers},
            "recall": recall,
            "channel": channel_value,
            "state": {"coverage": round3(coverage), "unique": unique},
            "info": {"moved": info.moved, "pinged": info.pinged},
        });

        self.prev_info = info;
        self.obs = next_obs;
        self.state.tick += 1;
        self.state.advance_seed();

        TickOutput { event, emission, applied }
    }
}

/// What a finished run amounts to.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub ticks: u64,
    pub emissions: usize,
    pub coverage: f64,
}

/// Run the organism for `ticks` steps, writing every artifact into a
/// fresh directory under `runs_dir`.
///
/// Files produced: `meta.json`, `events.jsonl`, `events.sqlite`,
/// `state.json`, `state.jsonl`, `assoc.json`, plus the caregiver files
/// once queries or answers exist.
pub fn run_loop(cfg: &NoemaConfig, runs_dir: &Path, ticks: u64, seed: u32) -> Result<RunSummary> {
    let mut organism = Organism::new(cfg, seed)?;
    let run_id = organism.run_id().to_string();
    fs::create_dir_all(runs_dir)?;
    let run_dir = runs_dir.join(&run_id);
    fs::create_dir(&run_dir)?;

    write_meta(
        &run_dir,
        &RunMeta {
            run_id: run_id.clone(),
            seed,
            env: organism.descriptor().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            config: cfg.clone(),
        },
    )?;

    let log = Rc::new(RefCell::new(EventLog::open(&run_dir)?));
    let store = Rc::new(EventStore::open(&run_dir)?);
    let mut notes = SelfNotes::new(&run_id, Rc::clone(&log), Rc::clone(&store));
    let mut tracker = Tracker::new(&run_dir)?;
    let mut caregiver = Caregiver::new(&run_dir, &run_id);
    if !caregiver.tags().is_empty() {
        organism.adopt_tags(caregiver.tags().clone());
    }

    info!(run_id = %run_id, ticks, seed, env = organism.descriptor(), "run started");
    notes.note(0, "startup", json!({"message": "system alive"}));

    let mut emissions = 0usize;
    for _ in 0..ticks {
        let tick = organism.tick_index();
        let hb = cfg.run.heartbeat_every;
        if hb > 0 && tick > 0 && tick % hb == 0 {
            notes.note(tick, "heartbeat", json!({"tick": tick}));
        }

        let out = organism.tick(&mut notes);
        log.borrow_mut().append(&out.event)?;
        store.insert(
            &chrono::Utc::now().to_rfc3339(),
            &run_id,
            tick,
            KIND_TICK,
            &out.event.to_string(),
        )?;
        tracker.record(&out.event)?;

        if let Some(emission) = &out.emission {
            emissions += 1;
            caregiver.maybe_query(tick, &emission.tokens);
        }
        let learned = caregiver.poll_answers(tick, &mut notes);
        if !learned.is_empty() {
            organism.adopt_tags(caregiver.tags().clone());
        }
    }

    notes.note(organism.tick_index(), "shutdown", json!({"ticks": ticks}));

    let mut assoc_text = serde_json::to_string_pretty(&organism.assoc().to_json())?;
    assoc_text.push('\n');
    fs::write(run_dir.join("assoc.json"), assoc_text)?;

    let coverage = organism.coverage();
    info!(run_id = %run_id, emissions, coverage, "run finished");
    Ok(RunSummary { run_id, run_dir, ticks, emissions, coverage })
}
