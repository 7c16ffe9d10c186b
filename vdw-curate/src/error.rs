//! Run-level errors
//!
//! Only failures that stop the whole run surface here. Per-source and
//! per-asset failures are logged and counted by the orchestrator instead.

use crate::services::embedder::EmbeddingError;
use crate::services::manifest_builder::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurateError {
    #[error(transparent)]
    Common(#[from] vdw_common::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Embedder setup failed: {0}")]
    Embedder(#[from] EmbeddingError),
}

pub type Result<T> = std::result::Result<T, CurateError>;
