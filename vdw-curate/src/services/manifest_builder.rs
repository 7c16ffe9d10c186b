//! Manifest assembly and serialization
//!
//! The manifest is a pure function of the record list plus the embedder's
//! identity. It is written twice: pretty JSON and a gzip of exactly those
//! bytes.

use crate::models::{AssetRecord, Manifest};
use crate::services::embedder::ImageEmbedder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use vdw_common::fs::write_atomic;
use vdw_common::time::{now, to_iso8601};

/// Manifest format version
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to encode manifest: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to compress manifest: {0}")]
    Compress(#[source] std::io::Error),

    #[error("Failed to write manifest: {0}")]
    Write(#[from] vdw_common::Error),
}

/// Both encodings of one manifest
#[derive(Debug, Clone)]
pub struct SerializedManifest {
    pub plain: Vec<u8>,
    pub compressed: Vec<u8>,
}

/// Summary of written manifest files
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestReport {
    pub total_count: usize,
    /// Records per category, most common first
    pub categories: Vec<(String, usize)>,
    pub plain_bytes: usize,
    pub compressed_bytes: usize,
}

impl ManifestReport {
    pub fn compression_ratio(&self) -> f64 {
        if self.compressed_bytes == 0 {
            return 0.0;
        }
        self.plain_bytes as f64 / self.compressed_bytes as f64
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} records, manifest {:.2} MB, compressed {:.2} MB ({:.1}x)",
            self.total_count,
            megabytes(self.plain_bytes),
            megabytes(self.compressed_bytes),
            self.compression_ratio()
        )
    }
}

fn megabytes(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Builds manifests for one embedding model
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    model_version: String,
    embedding_dim: usize,
}

impl ManifestBuilder {
    pub fn new(model_version: impl Into<String>, embedding_dim: usize) -> Self {
        Self {
            model_version: model_version.into(),
            embedding_dim,
        }
    }

    pub fn for_embedder(embedder: &dyn ImageEmbedder) -> Self {
        Self::new(embedder.model_version(), embedder.dimension())
    }

    pub fn build(&self, records: Vec<AssetRecord>) -> Manifest {
        Manifest {
            version: MANIFEST_VERSION,
            last_updated: to_iso8601(&now()),
            model_version: self.model_version.clone(),
            embedding_dim: self.embedding_dim,
            total_count: records.len(),
            records,
        }
    }

    pub fn serialize(manifest: &Manifest) -> Result<SerializedManifest, ManifestError> {
        let plain = serde_json::to_vec_pretty(manifest)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).map_err(ManifestError::Compress)?;
        let compressed = encoder.finish().map_err(ManifestError::Compress)?;

        Ok(SerializedManifest { plain, compressed })
    }

    /// Serialize `manifest` and write both files atomically
    pub fn write(
        manifest: &Manifest,
        plain_path: &Path,
        compressed_path: &Path,
    ) -> Result<ManifestReport, ManifestError> {
        let serialized = Self::serialize(manifest)?;
        write_atomic(plain_path, &serialized.plain)?;
        write_atomic(compressed_path, &serialized.compressed)?;

        let report = ManifestReport {
            total_count: manifest.total_count,
            categories: category_counts(&manifest.records),
            plain_bytes: serialized.plain.len(),
            compressed_bytes: serialized.compressed.len(),
        };

        tracing::info!(
            path = %plain_path.display(),
            bytes = report.plain_bytes,
            compressed_bytes = report.compressed_bytes,
            "Manifest written"
        );
        Ok(report)
    }
}

/// Count records per category, most common first, ties by name
pub fn category_counts(records: &[AssetRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.category.as_str()).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(category, count)| (category.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}
