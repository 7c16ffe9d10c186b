//! Asset record extraction
//!
//! Builds the [`AssetRecord`] for one accepted candidate from its decoded
//! image. Palette, brightness and contrast fall back to neutral defaults
//! when they cannot be computed; a missing embedding skips the asset.

use crate::models::{
    generate_cdn_url, generate_id, AssetRecord, CandidateAsset, SourceDescriptor, RECORD_ORIGIN,
};
use crate::services::category::detect_category;
use crate::services::embedder::{EmbeddingError, ImageEmbedder};
use crate::services::fingerprinter::FingerprintError;
use crate::services::visual_analyzer::VisualAnalyzer;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

const DEFAULT_COLOR: &str = "#000000";
const DEFAULT_BRIGHTNESS: u8 = 50;
const DEFAULT_CONTRAST: u8 = 50;
const UNKNOWN_RESOLUTION: &str = "unknown";

/// Why a candidate did not become a record
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("Unreadable image: {0}")]
    Unreadable(String),

    #[error("Fingerprint failed: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Duplicate (distance {distance})")]
    Duplicate { distance: u32 },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl SkipReason {
    /// Short label used for per-category failure counts
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Unreadable(_) => "unreadable",
            SkipReason::Fingerprint(_) => "fingerprint",
            SkipReason::Duplicate { .. } => "duplicate",
            SkipReason::Embedding(_) => "embedding",
        }
    }
}

/// Turns accepted candidates into records
pub struct MetadataExtractor {
    embedder: Box<dyn ImageEmbedder>,
    analyzer: Box<dyn VisualAnalyzer>,
    palette_size: usize,
}

impl MetadataExtractor {
    pub fn new(embedder: Box<dyn ImageEmbedder>, analyzer: Box<dyn VisualAnalyzer>) -> Self {
        Self {
            embedder,
            analyzer,
            palette_size: 5,
        }
    }

    pub fn embedder(&self) -> &dyn ImageEmbedder {
        self.embedder.as_ref()
    }

    /// Extract the record for `asset`
    pub fn extract(
        &self,
        asset: &CandidateAsset,
        source: &SourceDescriptor,
        image: &DynamicImage,
    ) -> Result<AssetRecord, SkipReason> {
        let embedding = self.embedder.embed(image)?;
        if embedding.len() != self.embedder.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.embedder.dimension(),
                actual: embedding.len(),
            }
            .into());
        }

        let colors = match self.analyzer.palette(image) {
            Ok(colors) if !colors.is_empty() => colors,
            Ok(_) => self.default_palette(),
            Err(e) => {
                tracing::warn!(path = %asset.relative_path, error = %e, "Palette failed, using default");
                self.default_palette()
            }
        };

        let brightness = self.analyzer.brightness(image).unwrap_or_else(|e| {
            tracing::warn!(path = %asset.relative_path, error = %e, "Brightness failed, using default");
            DEFAULT_BRIGHTNESS
        });

        let contrast = self.analyzer.contrast(image).unwrap_or_else(|e| {
            tracing::warn!(path = %asset.relative_path, error = %e, "Contrast failed, using default");
            DEFAULT_CONTRAST
        });

        let resolution = match image.dimensions() {
            (0, _) | (_, 0) => UNKNOWN_RESOLUTION.to_string(),
            (w, h) => format!("{}x{}", w, h),
        };

        let url = generate_cdn_url(&source.name, &asset.relative_path, &source.branch);

        Ok(AssetRecord {
            id: generate_id(&source.name, &asset.relative_path),
            thumbnail: url.clone(),
            url,
            source: RECORD_ORIGIN.to_string(),
            repo: source.name.clone(),
            category: detect_category(&asset.relative_path, &source.name).to_string(),
            colors,
            brightness,
            contrast,
            embedding,
            resolution,
            attribution: source.name.clone(),
        })
    }

    fn default_palette(&self) -> Vec<String> {
        vec![DEFAULT_COLOR.to_string(); self.palette_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedder::ThumbnailEmbedder;
    use crate::services::visual_analyzer::{AnalysisError, PixelAnalyzer};
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    struct BrokenAnalyzer;

    impl VisualAnalyzer for BrokenAnalyzer {
        fn palette(&self, _: &DynamicImage) -> Result<Vec<String>, AnalysisError> {
            Err(AnalysisError::Failed("palette".into()))
        }
        fn brightness(&self, _: &DynamicImage) -> Result<u8, AnalysisError> {
            Err(AnalysisError::Failed("brightness".into()))
        }
        fn contrast(&self, _: &DynamicImage) -> Result<u8, AnalysisError> {
            Err(AnalysisError::Failed("contrast".into()))
        }
    }

    struct FailingEmbedder;

    impl ImageEmbedder for FailingEmbedder {
        fn model_version(&self) -> &str {
            "failing"
        }
        fn dimension(&self) -> usize {
            4
        }
        fn embed(&self, _: &DynamicImage) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Inference("boom".into()))
        }
    }

    fn asset(relative_path: &str) -> CandidateAsset {
        CandidateAsset {
            path: PathBuf::from("/scratch").join(relative_path),
            relative_path: relative_path.to_string(),
            source_index: 0,
            width: 40,
            height: 30,
            file_size: 1024,
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, 90])
        }))
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor::new(
            "https://github.com/ExampleOrg/minimal-wallpapers",
            "main",
            "ExampleOrg/minimal-wallpapers",
        )
    }

    #[test]
    fn test_full_record() {
        let extractor =
            MetadataExtractor::new(Box::new(ThumbnailEmbedder::new()), Box::new(PixelAnalyzer::new()));
        let record = extractor.extract(&asset("img_001.png"), &source(), &image()).unwrap();

        assert_eq!(record.id, generate_id("ExampleOrg/minimal-wallpapers", "img_001.png"));
        assert_eq!(
            record.url,
            "https://cdn.jsdelivr.net/gh/ExampleOrg/minimal-wallpapers@main/img_001.png"
        );
        assert_eq!(record.thumbnail, record.url);
        assert_eq!(record.source, "github");
        assert_eq!(record.category, "minimal");
        assert_eq!(record.colors.len(), 5);
        assert_eq!(record.resolution, "40x30");
        assert_eq!(record.attribution, "ExampleOrg/minimal-wallpapers");
        assert_eq!(record.embedding.len(), 576);
    }

    #[test]
    fn test_analysis_failures_use_defaults() {
        let extractor =
            MetadataExtractor::new(Box::new(ThumbnailEmbedder::new()), Box::new(BrokenAnalyzer));
        let record = extractor.extract(&asset("nature/lake.png"), &source(), &image()).unwrap();

        assert_eq!(record.colors, vec!["#000000"; 5]);
        assert_eq!(record.brightness, 50);
        assert_eq!(record.contrast, 50);
        assert_eq!(record.category, "nature");
    }

    #[test]
    fn test_embedding_failure_skips() {
        let extractor =
            MetadataExtractor::new(Box::new(FailingEmbedder), Box::new(PixelAnalyzer::new()));
        let err = extractor.extract(&asset("a.png"), &source(), &image()).unwrap_err();
        assert_eq!(err.label(), "embedding");
    }
}
