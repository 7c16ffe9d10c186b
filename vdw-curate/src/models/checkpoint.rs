//! Run checkpoint: durable snapshot of partial progress

use super::{AssetRecord, PerceptualFingerprint};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk checkpoint document
///
/// Written after every attempted source. Records only ever grow within one
/// `run_id` lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCheckpoint {
    /// Lineage identifier, carried across resumes
    pub run_id: Uuid,
    /// Records accumulated so far
    pub records: Vec<AssetRecord>,
    /// Index of the last source that was fully attempted
    pub last_source_index: usize,
    /// ISO-8601 write time
    pub timestamp: String,
    /// Seen fingerprint set; absent in checkpoints that predate it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprints: Option<Vec<PerceptualFingerprint>>,
}

/// State reconstructed from a checkpoint at startup
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResumePoint {
    pub records: Vec<AssetRecord>,
    /// First source index still to process
    pub resume_from_index: usize,
    /// Fingerprints to seed the deduplicator with, if they were persisted
    pub fingerprints: Option<Vec<PerceptualFingerprint>>,
    /// Lineage to continue; `None` for a fresh run
    pub run_id: Option<Uuid>,
}

impl ResumePoint {
    /// Nothing to resume from
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.run_id.is_none()
    }
}

impl From<RunCheckpoint> for ResumePoint {
    fn from(checkpoint: RunCheckpoint) -> Self {
        Self {
            records: checkpoint.records,
            resume_from_index: checkpoint.last_source_index.saturating_add(1),
            fingerprints: checkpoint.fingerprints,
            run_id: Some(checkpoint.run_id),
        }
    }
}
