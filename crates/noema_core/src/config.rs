use crate::error::{NoemaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoemaConfig {
    pub run: RunConfig,
    pub embedder: EmbedderConfig,
    pub memory: MemoryConfig,
    pub curiosity: CuriosityConfig,
    pub staleness: StalenessConfig,
    pub learning: LearningConfig,
    pub reflex: ReflexConfig,
    pub channel: ChannelConfig,
    pub world: WorldConfig,
    pub causal: CausalConfig,
}

impl NoemaConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: NoemaConfig = toml::from_str(&content)
            .map_err(|e| NoemaError::Config(format!("failed to parse TOML config: {e}")))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from path if it exists, otherwise fall back to defaults
    /// with env overrides. A file that exists but fails to parse is
    /// still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        tracing::debug!("no config at {}, using defaults", path.as_ref().display());
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Apply environment variable overrides on top of file-based config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NOEMA_RUNS_DIR") {
            self.run.runs_dir = v;
        }
        if let Ok(v) = std::env::var("NOEMA_TICKS") {
            if let Ok(n) = v.parse() {
                self.run.ticks = n;
            }
        }
        if let Ok(v) = std::env::var("NOEMA_SEED") {
            if let Ok(n) = v.parse() {
                self.run.seed = Some(n);
            }
        }
        if let Ok(v) = std::env::var("NOEMA_ENV") {
            self.run.env = v;
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.embedder.dim < 16 {
            return Err(NoemaError::Config(format!(
                "embedder.dim must be at least 16 (got {})",
                self.embedder.dim
            )));
        }
        if self.world.size < 3 || self.world.size % 2 == 0 {
            return Err(NoemaError::Config(format!(
                "world.size must be odd and at least 3 (got {})",
                self.world.size
            )));
        }
        if self.world.view_radius < 1 {
            return Err(NoemaError::Config("world.view_radius must be at least 1".into()));
        }
        let cells = (self.world.size * self.world.size - 1) as usize;
        if self.world.n_objects >= cells || self.causal.n_objects >= cells {
            return Err(NoemaError::Config(format!(
                "object count must leave free cells (grid has {cells} non-center cells)"
            )));
        }
        if self.memory.top_k == 0 || self.memory.max_items == 0 {
            return Err(NoemaError::Config(
                "memory.top_k and memory.max_items must be positive".into(),
            ));
        }
        for (name, v) in [
            ("memory.min_score", self.memory.min_score),
            ("staleness.ema_alpha", self.staleness.ema_alpha),
            ("learning.ema_beta", self.learning.ema_beta),
            ("learning.lr", self.learning.lr),
            ("learning.mod_decay", self.learning.mod_decay),
            ("reflex.relax_boredom", self.reflex.relax_boredom),
            ("channel.novelty_hi", self.channel.novelty_hi),
            ("channel.boredom_hi", self.channel.boredom_hi),
            ("channel.recall_hi", self.channel.recall_hi),
            ("causal.drift_prob", self.causal.drift_prob),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(NoemaError::Config(format!("{name} must be within [0, 1] (got {v})")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Ticks to run when the CLI flag is omitted.
    pub ticks: u64,
    /// Seed for the run; `None` means draw one from entropy at startup.
    pub seed: Option<u32>,
    pub runs_dir: String,
    /// Environment id: "grid-v0" (static) or "grid-v1" (causal).
    pub env: String,
    /// Heartbeat self-note interval in ticks.
    pub heartbeat_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 50,
            seed: Some(42),
            runs_dir: "runs".to_string(),
            env: "grid-v0".to_string(),
            heartbeat_every: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Embedding dimension. The leading slots also carry scene features,
    /// so this must stay >= 16.
    pub dim: usize,
    /// Weight applied to each scene feature before it is added in.
    pub feature_alpha: f64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self { dim: 64, feature_alpha: 0.8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Episodic ring buffer capacity.
    pub max_items: usize,
    pub top_k: usize,
    /// Recall hits below this cosine score are dropped.
    pub min_score: f64,
    /// Vocabulary size estimate used as the coverage denominator.
    pub vocab_hint: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_items: 512, top_k: 3, min_score: 0.35, vocab_hint: 24 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CuriosityConfig {
    /// How many tokens the attention list keeps.
    pub attention_k: usize,
    /// Self-note thresholds.
    pub note_novelty: f64,
    pub note_change: f64,
}

impl Default for CuriosityConfig {
    fn default() -> Self {
        Self { attention_k: 3, note_novelty: 0.6, note_change: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    /// Smoothing factor of the novelty EMA.
    pub ema_alpha: f64,
    /// Streak lengths at which the boredom contributions saturate.
    pub max_noop: u32,
    pub max_repeat: u32,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self { ema_alpha: 0.2, max_noop: 5, max_repeat: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Smoothing factor of the novelty baseline.
    pub ema_beta: f64,
    pub lr: f64,
    /// Per-tick decay applied to all adaptive values.
    pub mod_decay: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self { ema_beta: 0.2, lr: 0.05, mod_decay: 0.02 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexConfig {
    /// Unique-token count at which the scene reads as overload.
    pub overload_threshold: usize,
    /// Forced noops tolerated before the gate relaxes.
    pub max_noop_on_overload: u32,
    /// Boredom level that relaxes the gate immediately.
    pub relax_boredom: f64,
}

impl Default for ReflexConfig {
    fn default() -> Self {
        Self { overload_threshold: 3, max_noop_on_overload: 2, relax_boredom: 0.8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub novelty_hi: f64,
    /// Minimum novelty rise (vs previous tick) for the rising-novelty token.
    pub novelty_up: f64,
    pub boredom_hi: f64,
    /// Recall score above which a familiar scene can read as a mismatch.
    pub recall_hi: f64,
    /// Noop streak at which the loop-risk token fires.
    pub loop_noop: u32,
    /// Silence window after an emission.
    pub cooldown_ticks: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            novelty_hi: 0.80,
            novelty_up: 0.20,
            boredom_hi: 0.65,
            recall_hi: 0.65,
            loop_noop: 5,
            cooldown_ticks: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid side length; must be odd so the agent can start at the center.
    pub size: i64,
    pub n_objects: usize,
    pub view_radius: i64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { size: 9, n_objects: 12, view_radius: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalConfig {
    /// Total object budget including door, pads, switch and chameleon.
    pub n_objects: usize,
    /// Ticks allowed between the green and red pad to open the door.
    pub pad_window: u64,
    pub door_open_ticks: u64,
    pub switch_open_ticks: u64,
    /// Per-tick probability that one distractor shifts its color.
    pub drift_prob: f64,
}

impl Default for CausalConfig {
    fn default() -> Self {
        Self {
            n_objects: 14,
            pad_window: 8,
            door_open_ticks: 12,
            switch_open_ticks: 8,
            drift_prob: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let cfg = NoemaConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.embedder.dim, 64);
        assert_eq!(cfg.memory.max_items, 512);
        assert_eq!(cfg.run.env, "grid-v0");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[run]
ticks = 200
seed = 7

[world]
size = 11
"#;
        let cfg: NoemaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.run.ticks, 200);
        assert_eq!(cfg.run.seed, Some(7));
        assert_eq!(cfg.world.size, 11);
        // Defaults for unspecified fields
        assert_eq!(cfg.memory.top_k, 3);
        assert_eq!(cfg.channel.cooldown_ticks, 3);
    }

    #[test]
    fn test_even_grid_size_rejected() {
        let mut cfg = NoemaConfig::default();
        cfg.world.size = 8;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_tiny_embedding_dim_rejected() {
        let mut cfg = NoemaConfig::default();
        cfg.embedder.dim = 8;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_out_of_range_rate_rejected() {
        let mut cfg = NoemaConfig::default();
        cfg.staleness.ema_alpha = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let cfg = NoemaConfig::load_or_default("/definitely/not/here.toml").unwrap();
        assert_eq!(cfg.memory.max_items, 512);
    }

    #[test]
    fn test_load_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noema.toml");
        std::fs::write(&path, "run = \"not a table\"").unwrap();
        assert!(NoemaConfig::load_or_default(&path).is_err());
    }
}
