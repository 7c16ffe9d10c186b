//! Durable run checkpoint
//!
//! One JSON document at a fixed path, always replaced whole via an atomic
//! rename. Its presence means an earlier run did not finish.

use crate::models::{ResumePoint, RunCheckpoint};
use std::path::{Path, PathBuf};
use thiserror::Error;
use vdw_common::fs::{remove_if_exists, write_atomic};

/// Checkpoint persistence errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] vdw_common::Error),

    #[error("Failed to read checkpoint {path}: {error}")]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Corrupt checkpoint {path}: {error}")]
    Corrupt {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },

    #[error("Failed to encode checkpoint: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Reads and writes `checkpoint.json`
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the stored checkpoint
    pub fn save(&self, checkpoint: &RunCheckpoint) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(checkpoint).map_err(CheckpointError::Encode)?;
        write_atomic(&self.path, &bytes)?;

        tracing::info!(
            run_id = %checkpoint.run_id,
            last_source_index = checkpoint.last_source_index,
            records = checkpoint.records.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Stored checkpoint, or `None` when there is none
    pub fn load_checkpoint(&self) -> Result<Option<RunCheckpoint>, CheckpointError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(CheckpointError::Read {
                    path: self.path.clone(),
                    error,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| CheckpointError::Corrupt {
                path: self.path.clone(),
                error,
            })
    }

    /// Resume state; [`ResumePoint::empty`] when there is no checkpoint
    pub fn load(&self) -> Result<ResumePoint, CheckpointError> {
        Ok(self
            .load_checkpoint()?
            .map(ResumePoint::from)
            .unwrap_or_else(ResumePoint::empty))
    }

    /// Remove the checkpoint after a completed run
    pub fn delete(&self) -> Result<bool, CheckpointError> {
        let removed = remove_if_exists(&self.path)?;
        if removed {
            tracing::info!(path = %self.path.display(), "Checkpoint deleted");
        }
        Ok(removed)
    }
}
