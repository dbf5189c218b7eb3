//! Grid environments.
//!
//! Two worlds share the [`Environment`] contract: a static token field
//! (`grid-v0`) and a causal variant with persistent objects and a door
//! puzzle (`grid-v1`). Both are fully deterministic for a given seed;
//! randomness comes from the workspace LCG, never from the OS.

pub mod causal;
pub mod grid;

pub use causal::CausalWorld;
pub use grid::GridWorld;

use noema_core::{Environment, NoemaConfig, NoemaError, Result};

/// Instantiate an environment by its descriptor name.
pub fn build(name: &str, cfg: &NoemaConfig) -> Result<Box<dyn Environment>> {
    match name {
        "grid-v0" => Ok(Box::new(GridWorld::new(&cfg.world))),
        "grid-v1" => Ok(Box::new(CausalWorld::new(&cfg.world, &cfg.causal))),
        other => Err(NoemaError::Config(format!(
            "unknown environment '{other}' (expected grid-v0 or grid-v1)"
        ))),
    }
}
