//! Terminal manifest document

use super::AssetRecord;
use serde::{Deserialize, Serialize};

/// Aggregate document consumed by the downstream application
///
/// Derived purely from the record list; `total_count == records.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Format version
    pub version: u32,
    /// ISO-8601 generation time
    pub last_updated: String,
    /// Embedding model identifier
    pub model_version: String,
    /// Length of every `embedding` vector
    pub embedding_dim: usize,
    /// Number of records
    pub total_count: usize,
    /// Curated assets in acceptance order
    pub records: Vec<AssetRecord>,
}
