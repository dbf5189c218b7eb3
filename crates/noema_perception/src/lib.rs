//! Perception: from a rendered window to a deterministic unit vector.

pub mod embedder;
pub mod features;

pub use embedder::{fnv1a_64, l2_normalize, Embedder};
pub use features::SceneFeatures;
