//! Run-scoped state and the deterministic random source.
//!
//! Everything stochastic in a run flows from one 32-bit linear
//! congruential generator. The run state carries the current seed and
//! advances it once per tick; components that need their own stream
//! (world generation, distractor drift) wrap a seed in [`Lcg`]. Equal
//! seed and config therefore reproduce a run exactly.

use serde::{Deserialize, Serialize};

/// One LCG step: `seed * 1664525 + 1013904223 (mod 2^32)`.
#[inline]
pub fn lcg_next(seed: u32) -> u32 {
    seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
}

/// Guard against NaN and Infinity leaking into state values.
/// Non-finite input is replaced with the provided fallback.
#[inline]
pub fn sanitize(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("non-finite value in state, resetting to {}", fallback);
        fallback
    }
}

/// Clamp to the unit interval, treating non-finite input as 0.
#[inline]
pub fn clamp01(v: f64) -> f64 {
    sanitize(v, 0.0).clamp(0.0, 1.0)
}

/// Round to three decimals for note payloads and reports.
#[inline]
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// A deterministic pseudo-random stream for components that consume
/// more than one draw per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = lcg_next(self.state);
        self.state
    }

    /// Uniform draw in `0..n` (`n = 0` is treated as 1).
    pub fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n.max(1)
    }

    /// Bernoulli draw with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        (self.next_u32() as f64 / 4_294_967_296.0) < p
    }
}

/// Identity and clock of a single run.
///
/// `tick` counts completed pipeline passes; `rng_seed` is the value the
/// planner reads this tick and is advanced once at the end of each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub tick: u64,
    pub rng_seed: u32,
}

impl RunState {
    /// Start a fresh run. The wall-clock timestamp only ever appears in
    /// the id string; the pipeline itself never reads the clock.
    pub fn new(seed: u32) -> Self {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        Self {
            run_id: format!("{stamp}-{seed:08x}"),
            tick: 0,
            rng_seed: seed,
        }
    }

    pub fn advance_seed(&mut self) {
        self.rng_seed = lcg_next(self.rng_seed);
    }
}
