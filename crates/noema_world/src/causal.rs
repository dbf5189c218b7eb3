//! Causal grid world (`grid-v1`).
//!
//! Persistent objects with state on top of the static field: a door
//! that blocks movement while closed, a green and a red pad that open
//! it when stepped on in that order, a switch that opens it when
//! pinged, and a chameleon whose color advances under a ping. One
//! distractor occasionally shifts its color so scenes never go fully
//! stale. Cells render as `""` when empty and the agent has no marker
//! here; perception treats both the same as `grid-v0` blanks.

use noema_core::config::{CausalConfig, WorldConfig};
use noema_core::{Action, Environment, Lcg, Observation, StepInfo, COLORS, SHAPES};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Pad,
    Switch,
    Chameleon,
    Static,
}

#[derive(Debug, Clone)]
struct Obj {
    kind: Kind,
    x: i64,
    y: i64,
    color: char,
    shape: char,
}

impl Obj {
    fn token(&self) -> String {
        match self.kind {
            Kind::Pad => format!("Pad{}", self.color),
            Kind::Switch => "SW".to_string(),
            Kind::Chameleon | Kind::Static => format!("{}{}", self.color, self.shape),
        }
    }
}

#[derive(Debug, Clone)]
struct Door {
    x: i64,
    y: i64,
    open: bool,
    timer: u64,
}

fn advance_color(color: char) -> char {
    let i = COLORS.iter().position(|&c| c == color).unwrap_or(0);
    COLORS[(i + 1) % COLORS.len()]
}

pub struct CausalWorld {
    size: i64,
    n_objects: usize,
    view_radius: i64,
    pad_window: u64,
    door_open_ticks: u64,
    switch_open_ticks: u64,
    drift_prob: f64,
    rng: Lcg,
    tick: u64,
    agent: (i64, i64),
    door: Door,
    objects: Vec<Obj>,
    pad_seq: Vec<(u64, char)>,
}

impl CausalWorld {
    pub fn new(world: &WorldConfig, causal: &CausalConfig) -> Self {
        Self {
            size: world.size,
            n_objects: causal.n_objects,
            view_radius: world.view_radius,
            pad_window: causal.pad_window,
            door_open_ticks: causal.door_open_ticks,
            switch_open_ticks: causal.switch_open_ticks,
            drift_prob: causal.drift_prob,
            rng: Lcg::new(0),
            tick: 0,
            agent: (0, 0),
            door: Door { x: 0, y: 0, open: false, timer: 0 },
            objects: Vec::new(),
            pad_seq: Vec::new(),
        }
    }

    /// Drop an object on a free cell, avoiding the agent and the door.
    fn place(&mut self, kind: Kind, color: char, shape: char) {
        loop {
            let x = self.rng.below(self.size as u32) as i64;
            let y = self.rng.below(self.size as u32) as i64;
            if (x, y) == self.agent || (x, y) == (self.door.x, self.door.y) {
                continue;
            }
            if self.objects.iter().any(|o| (o.x, o.y) == (x, y)) {
                continue;
            }
            self.objects.push(Obj { kind, x, y, color, shape });
            return;
        }
    }

    fn blocked(&self, x: i64, y: i64) -> bool {
        (x, y) == (self.door.x, self.door.y) && !self.door.open
    }

    fn open_door(&mut self, ticks: u64) {
        self.door.open = true;
        self.door.timer = self.door.timer.max(ticks);
    }

    fn pad_at(&self, x: i64, y: i64) -> Option<char> {
        self.objects
            .iter()
            .find(|o| o.kind == Kind::Pad && (o.x, o.y) == (x, y))
            .map(|o| o.color)
    }

    fn nearby_objects(&self, radius: i64) -> Vec<usize> {
        let (ax, ay) = self.agent;
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| (o.x - ax).abs() + (o.y - ay).abs() <= radius)
            .map(|(i, _)| i)
            .collect()
    }

    /// True when the pad visits inside the window, with consecutive
    /// repeats collapsed, end in green then red.
    fn sequence_is_gr(&self) -> bool {
        let mut compressed: Vec<char> = Vec::new();
        for &(_, c) in &self.pad_seq {
            if compressed.last() != Some(&c) {
                compressed.push(c);
            }
        }
        compressed.len() >= 2 && compressed[compressed.len() - 2..] == ['G', 'R']
    }

    fn drift_distractor(&mut self) {
        if !self.rng.chance(self.drift_prob) {
            return;
        }
        let statics: Vec<usize> = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.kind == Kind::Static)
            .map(|(i, _)| i)
            .collect();
        if statics.is_empty() {
            return;
        }
        let pick = statics[self.rng.below(statics.len() as u32) as usize];
        self.objects[pick].color = advance_color(self.objects[pick].color);
    }

    fn token_at(&self, x: i64, y: i64) -> String {
        if x < 0 || y < 0 || x >= self.size || y >= self.size {
            return String::new();
        }
        if (x, y) == (self.door.x, self.door.y) {
            return if self.door.open { "DoorO" } else { "DoorC" }.to_string();
        }
        match self.objects.iter().find(|o| (o.x, o.y) == (x, y)) {
            Some(o) => o.token(),
            None => String::new(),
        }
    }

    fn observe(&self) -> Observation {
        let (ax, ay) = self.agent;
        let r = self.view_radius;
        let mut view = Vec::with_capacity((2 * r + 1) as usize);
        for dy in -r..=r {
            let mut row = Vec::with_capacity((2 * r + 1) as usize);
            for dx in -r..=r {
                row.push(self.token_at(ax + dx, ay + dy));
            }
            view.push(row);
        }
        Observation { view, agent: self.agent, size: self.size }
    }
}

impl Environment for CausalWorld {
    fn reset(&mut self, seed: u32) -> Observation {
        self.rng = Lcg::new(seed);
        self.tick = 0;
        let c = self.size / 2;
        self.agent = (c, c);
        self.objects.clear();
        self.pad_seq.clear();
        // The door sits mid-top and is the only fixed placement.
        self.door = Door {
            x: c,
            y: (self.size / 3 - 1).max(1),
            open: false,
            timer: 0,
        };

        self.place(Kind::Pad, 'G', 'o');
        self.place(Kind::Pad, 'R', 'o');
        self.place(Kind::Switch, 'Y', 's');
        let color = COLORS[self.rng.below(COLORS.len() as u32) as usize];
        let shape = SHAPES[self.rng.below(SHAPES.len() as u32) as usize];
        self.place(Kind::Chameleon, color, shape);

        // Distractors fill the budget; the door counts toward it.
        let remaining = self.n_objects.saturating_sub(self.objects.len() + 1);
        for _ in 0..remaining {
            let color = COLORS[self.rng.below(COLORS.len() as u32) as usize];
            let shape = SHAPES[self.rng.below(SHAPES.len() as u32) as usize];
            self.place(Kind::Static, color, shape);
        }
        debug!(seed, objects = self.objects.len() + 1, "grid-v1 reset");
        self.observe()
    }

    fn step(&mut self, action: Action) -> (Observation, StepInfo) {
        let (ax, ay) = self.agent;
        let (mut nx, mut ny) = (ax, ay);
        match action {
            Action::Up => ny = (ay - 1).max(0),
            Action::Down => ny = (ay + 1).min(self.size - 1),
            Action::Left => nx = (ax - 1).max(0),
            Action::Right => nx = (ax + 1).min(self.size - 1),
            Action::Ping | Action::Noop => {}
        }
        if !self.blocked(nx, ny) {
            self.agent = (nx, ny);
        }
        let moved = self.agent != (ax, ay);

        // Standing on a pad counts toward the green-then-red sequence.
        if let Some(color) = self.pad_at(self.agent.0, self.agent.1) {
            self.pad_seq.push((self.tick, color));
            let cutoff = self.tick;
            let window = self.pad_window;
            self.pad_seq.retain(|(t, _)| t + window >= cutoff);
            if self.sequence_is_gr() {
                self.open_door(self.door_open_ticks);
                debug!(tick = self.tick, "pad sequence opened the door");
            }
        }

        if action == Action::Ping {
            for i in self.nearby_objects(1) {
                match self.objects[i].kind {
                    Kind::Switch => {
                        self.open_door(self.switch_open_ticks);
                        debug!(tick = self.tick, "switch opened the door");
                    }
                    Kind::Chameleon => {
                        self.objects[i].color = advance_color(self.objects[i].color);
                    }
                    _ => {}
                }
            }
        }

        if self.door.timer > 0 {
            self.door.timer -= 1;
            if self.door.timer == 0 {
                self.door.open = false;
            }
        }

        self.drift_distractor();

        self.tick += 1;
        (self.observe(), StepInfo { moved, pinged: action == Action::Ping })
    }

    fn descriptor(&self) -> &str {
        "grid-v1"
    }
}
