//! Hand-crafted scene features over the local window.
//!
//! Fifteen bounded scalars summarize what the organism sees: how full
//! the view is, how varied, where the mass sits relative to the agent,
//! and which colors and shapes dominate. They feed the leading slots
//! of the embedding in a fixed order, so their indices are part of the
//! deterministic contract.

use noema_core::{is_blank, Observation, COLORS, SHAPES};
use serde::{Deserialize, Serialize};

/// An occupied cell for density purposes: any two-glyph object token.
/// Longer tokens (doors, pads) still reach the histogram features via
/// the count summary but carry no spatial mass.
fn is_short_token(cell: &str) -> bool {
    !is_blank(cell) && cell.chars().count() == 2
}

/// Fixed-order feature bundle. `to_vec` defines the embedding order:
/// density, diversity, entropy, center_prox, the four direction
/// fractions, four color proportions, three shape proportions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFeatures {
    pub density: f64,
    pub diversity: f64,
    pub entropy: f64,
    pub center_prox: f64,
    pub dir_up: f64,
    pub dir_down: f64,
    pub dir_left: f64,
    pub dir_right: f64,
    pub col_r: f64,
    pub col_g: f64,
    pub col_b: f64,
    pub col_y: f64,
    pub shp_circle: f64,
    pub shp_triangle: f64,
    pub shp_square: f64,
}

impl SceneFeatures {
    pub const COUNT: usize = 15;

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.density,
            self.diversity,
            self.entropy,
            self.center_prox,
            self.dir_up,
            self.dir_down,
            self.dir_left,
            self.dir_right,
            self.col_r,
            self.col_g,
            self.col_b,
            self.col_y,
            self.shp_circle,
            self.shp_triangle,
            self.shp_square,
        ]
    }

    /// Extract features from one observation. The agent's own cell is
    /// excluded from every spatial count; density and diversity are
    /// normalized by window capacity, the direction fractions by the
    /// cell count of their half of the window.
    pub fn extract(obs: &Observation) -> Self {
        let view = &obs.view;
        let rows = view.len();
        let cols = view.first().map_or(0, |r| r.len());
        let n_cells = (rows * cols).saturating_sub(1).max(1) as f64;

        let unique = obs.unique_tokens();
        let counts = obs.token_counts();

        // === occupancy and histogram mass ===
        let occupied = view.iter().flatten().filter(|c| is_short_token(c)).count();

        let mut color_hist = [0.0f64; COLORS.len()];
        let mut shape_hist = [0.0f64; SHAPES.len()];
        let mut total_tokens = 0.0f64;
        for (token, &count) in &counts {
            let glyphs: Vec<char> = token.chars().collect();
            if glyphs.len() != 2 {
                continue;
            }
            total_tokens += count as f64;
            if let Some(ci) = COLORS.iter().position(|&c| c == glyphs[0]) {
                color_hist[ci] += count as f64;
            }
            if let Some(si) = SHAPES.iter().position(|&s| s == glyphs[1]) {
                shape_hist[si] += count as f64;
            }
        }

        // === histogram entropy, normalized so a two-symbol even split
        // already reads as 1.0 ===
        let total: f64 = unique
            .iter()
            .map(|t| counts.get(t).copied().unwrap_or(0) as f64)
            .sum();
        let total = if total > 0.0 { total } else { 1.0 };
        let mut h = 0.0;
        for t in &unique {
            let p = counts.get(t).copied().unwrap_or(0) as f64 / total;
            if p > 0.0 {
                h -= p * p.log2();
            }
        }
        let entropy = (h / (unique.len().max(2) as f64).log2()).clamp(0.0, 1.0);

        // === directional occupancy, one fraction per window half ===
        let cx = cols / 2;
        let cy = rows / 2;
        let mut up = (0usize, 0usize);
        let mut down = (0usize, 0usize);
        let mut left = (0usize, 0usize);
        let mut right = (0usize, 0usize);
        for (y, row) in view.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if x == cx && y == cy {
                    continue;
                }
                let hit = is_short_token(cell) as usize;
                if y < cy {
                    up.0 += hit;
                    up.1 += 1;
                } else if y > cy {
                    down.0 += hit;
                    down.1 += 1;
                }
                if x < cx {
                    left.0 += hit;
                    left.1 += 1;
                } else if x > cx {
                    right.0 += hit;
                    right.1 += 1;
                }
            }
        }
        let frac = |(hits, cells): (usize, usize)| hits as f64 / cells.max(1) as f64;

        // === proximity of the agent to the world center ===
        let (ax, ay) = obs.agent;
        let size = obs.size.max(1);
        let min_to_edge = ax.min(ay).min(size - 1 - ax).min(size - 1 - ay).max(0) as f64;
        let max_min = ((size - 1) as f64 / 2.0).max(1e-6);
        let center_prox = (min_to_edge / max_min).clamp(0.0, 1.0);

        let prop = |mass: f64| if total_tokens > 0.0 { mass / total_tokens } else { 0.0 };

        SceneFeatures {
            density: (occupied as f64 / n_cells).clamp(0.0, 1.0),
            diversity: (unique.len() as f64 / n_cells).clamp(0.0, 1.0),
            entropy,
            center_prox,
            dir_up: frac(up),
            dir_down: frac(down),
            dir_left: frac(left),
            dir_right: frac(right),
            col_r: prop(color_hist[0]),
            col_g: prop(color_hist[1]),
            col_b: prop(color_hist[2]),
            col_y: prop(color_hist[3]),
            shp_circle: prop(shape_hist[0]),
            shp_triangle: prop(shape_hist[1]),
            shp_square: prop(shape_hist[2]),
        }
    }
}
