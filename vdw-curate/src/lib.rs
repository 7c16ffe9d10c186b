//! Vanderwaals wallpaper curation
//!
//! Pulls images from a fixed list of remote repositories, drops
//! near-duplicates, derives per-image metadata and an embedding, and writes
//! a versioned manifest. Runs are checkpointed per source and resumable.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{CliOverrides, CurateConfig};
pub use error::{CurateError, Result};
pub use services::{PipelineOrchestrator, RunSummary};

use services::{
    DctFingerprinter, GitFetcher, ImageEmbedder, MetadataExtractor, PixelAnalyzer,
    ThumbnailEmbedder,
};

/// Pick the embedder for this run
///
/// With the `onnx-embeddings` feature and a model directory, loads
/// MobileNetV3-Small; otherwise falls back to thumbnail embeddings.
pub fn select_embedder(config: &CurateConfig) -> Result<Box<dyn ImageEmbedder>> {
    #[cfg(feature = "onnx-embeddings")]
    if let Some(model_dir) = &config.model_dir {
        let embedder = services::OnnxImageEmbedder::load(model_dir)?;
        return Ok(Box::new(embedder));
    }

    #[cfg(not(feature = "onnx-embeddings"))]
    if let Some(model_dir) = &config.model_dir {
        tracing::warn!(
            model_dir = %model_dir.display(),
            "Built without onnx-embeddings; ignoring model directory"
        );
    }

    tracing::info!("Using thumbnail embeddings");
    Ok(Box::new(ThumbnailEmbedder::new()))
}

/// Production pipeline: git fetcher, DCT fingerprints, pixel analysis
pub fn build_pipeline(config: CurateConfig) -> Result<PipelineOrchestrator<GitFetcher>> {
    let embedder = select_embedder(&config)?;
    let fetcher = GitFetcher::new((&config.retry).into());
    let fingerprinter = Box::new(DctFingerprinter::new(config.dedup.hash_size));
    let extractor = MetadataExtractor::new(embedder, Box::new(PixelAnalyzer::new()));

    Ok(PipelineOrchestrator::new(config, fetcher, fingerprinter, extractor))
}
