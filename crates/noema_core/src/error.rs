//! Shared error type for the workspace.
//!
//! Library crates return `NoemaError` (or a thin alias) so callers can
//! match on failure classes; the CLI wraps everything in `anyhow` at the
//! outermost seam.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoemaError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid value: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NoemaError>;
