//! Pipeline components
//!
//! Each component is constructed once per run and invoked synchronously
//! from the orchestrator, in source order then asset order.

pub mod asset_scanner;
pub mod category;
pub mod checkpoint_store;
pub mod embedder;
pub mod fingerprinter;
pub mod git_fetcher;
pub mod manifest_builder;
pub mod metadata_extractor;
pub mod perceptual_deduplicator;
pub mod pipeline_orchestrator;
pub mod source_acquirer;
pub mod visual_analyzer;

pub use asset_scanner::{AssetScanner, ScanError, ScanOutcome, ScanSummary};
pub use category::{detect_category, DEFAULT_CATEGORY};
pub use checkpoint_store::{CheckpointError, CheckpointStore};
pub use embedder::{normalize, EmbeddingError, ImageEmbedder, ThumbnailEmbedder, EMBEDDING_DIM};
#[cfg(feature = "onnx-embeddings")]
pub use embedder::OnnxImageEmbedder;
pub use fingerprinter::{DctFingerprinter, FingerprintError, Fingerprinter};
pub use git_fetcher::{FetchError, FetchTimeouts, GitFetcher, SourceFetcher};
pub use manifest_builder::{
    category_counts, ManifestBuilder, ManifestError, ManifestReport, SerializedManifest,
    MANIFEST_VERSION,
};
pub use metadata_extractor::{MetadataExtractor, SkipReason};
pub use perceptual_deduplicator::{DedupOutcome, PerceptualDeduplicator};
pub use pipeline_orchestrator::{
    PipelineOrchestrator, RunPhase, RunState, RunStatistics, RunSummary, SourceStats,
};
pub use source_acquirer::{AcquireError, AcquireSettings, AcquiredSource, SourceAcquirer};
pub use visual_analyzer::{AnalysisError, PixelAnalyzer, VisualAnalyzer};
