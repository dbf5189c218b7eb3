//! Static grid world (`grid-v0`).
//!
//! A square field of colored shapes with no dynamics: objects are
//! sampled once at reset and never change. The agent moves through
//! them, and the viewport marks its own cell with `@`. Rewards do not
//! exist here; the world only provides structure to perceive.

use noema_core::config::WorldConfig;
use noema_core::{
    Action, Environment, Lcg, Observation, StepInfo, AGENT_MARKER, COLORS, EMPTY_CELL, OOB_CELL,
    SHAPES,
};
use tracing::debug;

pub struct GridWorld {
    size: i64,
    n_objects: usize,
    view_radius: i64,
    rng: Lcg,
    grid: Vec<Vec<String>>,
    agent: (i64, i64),
}

impl GridWorld {
    pub fn new(cfg: &WorldConfig) -> Self {
        let cells = (cfg.size * cfg.size - 1).max(0) as usize;
        Self {
            size: cfg.size,
            n_objects: cfg.n_objects.min(cells),
            view_radius: cfg.view_radius,
            rng: Lcg::new(0),
            grid: Vec::new(),
            agent: (0, 0),
        }
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        0 <= x && x < self.size && 0 <= y && y < self.size
    }

    fn cell(&self, x: i64, y: i64) -> &str {
        &self.grid[y as usize][x as usize]
    }

    /// Resample the field: empty everywhere, agent at the center, then
    /// `n_objects` tokens on distinct free cells.
    fn place_objects(&mut self) {
        let size = self.size as usize;
        self.grid = vec![vec![EMPTY_CELL.to_string(); size]; size];
        let c = self.size / 2;
        self.agent = (c, c);

        for _ in 0..self.n_objects {
            let (x, y) = loop {
                let x = self.rng.below(self.size as u32) as i64;
                let y = self.rng.below(self.size as u32) as i64;
                if (x, y) != self.agent && self.cell(x, y) == EMPTY_CELL {
                    break (x, y);
                }
            };
            let color = COLORS[self.rng.below(COLORS.len() as u32) as usize];
            let shape = SHAPES[self.rng.below(SHAPES.len() as u32) as usize];
            self.grid[y as usize][x as usize] = format!("{color}{shape}");
        }
    }

    fn view_tokens(&self) -> Vec<Vec<String>> {
        let (ax, ay) = self.agent;
        let r = self.view_radius;
        let mut rows = Vec::with_capacity((2 * r + 1) as usize);
        for dy in -r..=r {
            let mut row = Vec::with_capacity((2 * r + 1) as usize);
            for dx in -r..=r {
                let (x, y) = (ax + dx, ay + dy);
                if (x, y) == self.agent {
                    row.push(AGENT_MARKER.to_string());
                } else if self.in_bounds(x, y) {
                    row.push(self.cell(x, y).to_string());
                } else {
                    row.push(OOB_CELL.to_string());
                }
            }
            rows.push(row);
        }
        rows
    }

    fn observe(&self) -> Observation {
        Observation {
            view: self.view_tokens(),
            agent: self.agent,
            size: self.size,
        }
    }

    /// Full-grid ASCII render for debugging.
    pub fn render_ascii(&self) -> String {
        let mut rows = Vec::with_capacity(self.size as usize);
        for y in 0..self.size {
            let mut row = Vec::with_capacity(self.size as usize);
            for x in 0..self.size {
                if (x, y) == self.agent {
                    row.push(AGENT_MARKER.to_string());
                } else {
                    row.push(self.cell(x, y).to_string());
                }
            }
            rows.push(row.join(" "));
        }
        rows.join("\n")
    }
}

impl Environment for GridWorld {
    fn reset(&mut self, seed: u32) -> Observation {
        self.rng = Lcg::new(seed);
        self.place_objects();
        debug!(seed, objects = self.n_objects, "grid-v0 reset");
        self.observe()
    }

    fn step(&mut self, action: Action) -> (Observation, StepInfo) {
        let (ax, ay) = self.agent;
        let mut moved = false;
        let mut pinged = false;
        match action {
            Action::Up => {
                let ny = (ay - 1).max(0);
                moved = ny != ay;
                self.agent = (ax, ny);
            }
            Action::Down => {
                let ny = (ay + 1).min(self.size - 1);
                moved = ny != ay;
                self.agent = (ax, ny);
            }
            Action::Left => {
                let nx = (ax - 1).max(0);
                moved = nx != ax;
                self.agent = (nx, ay);
            }
            Action::Right => {
                let nx = (ax + 1).min(self.size - 1);
                moved = nx != ax;
                self.agent = (nx, ay);
            }
            Action::Ping => pinged = true,
            Action::Noop => {}
        }
        (self.observe(), StepInfo { moved, pinged })
    }

    fn descriptor(&self) -> &str {
        "grid-v0"
    }
}
