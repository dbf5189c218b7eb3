//! Deterministic scene embedder.
//!
//! Token counts are folded into a fixed-dimension vector through a
//! version-pinned FNV-1a hash, scene features are blended into the
//! leading slots, and the result is L2-normalized. The same scene
//! always embeds to the same unit vector, on every platform and every
//! run; nothing here is learned or randomized.

use crate::features::SceneFeatures;
use noema_core::config::EmbedderConfig;
use std::collections::BTreeMap;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the token's UTF-8 bytes. The constants are part of the
/// persistence contract; changing them invalidates every stored vector.
#[inline]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Normalize in place; the all-zero vector stays all-zero.
pub fn l2_normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Embedder {
    dim: usize,
    feature_alpha: f64,
}

impl Embedder {
    pub fn new(cfg: &EmbedderConfig) -> Self {
        Self { dim: cfg.dim, feature_alpha: cfg.feature_alpha }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Hash bucket of a token in `0..dim`.
    pub fn bucket(&self, token: &str) -> usize {
        (fnv1a_64(token.as_bytes()) % self.dim as u64) as usize
    }

    /// Embed one observed scene: the token histogram by hash bucket,
    /// plus the feature bundle scaled into the leading slots, then
    /// normalized to unit length.
    pub fn embed(&self, counts: &BTreeMap<String, u32>, features: &SceneFeatures) -> Vec<f64> {
        let mut v = vec![0.0; self.dim];
        for (token, &count) in counts {
            v[self.bucket(token)] += count as f64;
        }
        for (i, f) in features.to_vec().into_iter().enumerate().take(self.dim) {
            v[i] += self.feature_alpha * f;
        }
        l2_normalize(&mut v);
        v
    }
}
