//! Image embeddings for similarity search
//!
//! Two implementations behind one trait:
//! - `OnnxImageEmbedder` (feature `onnx-embeddings`): MobileNetV3-Small with
//!   global average pooling, 576 dimensions
//! - `ThumbnailEmbedder`: 16x12 RGB thumbnail as a 576-float vector, used
//!   when no model is configured
//!
//! Every vector leaving an embedder goes through [`normalize`], which
//! rejects malformed output instead of storing it.

use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

/// Output width of both built-in embedders
pub const EMBEDDING_DIM: usize = 576;

/// Embedding errors
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Model not found: {0}")]
    ModelNotFound(std::path::PathBuf),

    #[error("Model init failed: {0}")]
    ModelInit(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding contains a non-finite value")]
    NonFinite,

    #[error("Embedding has zero norm")]
    ZeroNorm,
}

/// Maps a decoded image to a fixed-width vector
pub trait ImageEmbedder: Send + Sync {
    /// Identifier written to the manifest's `modelVersion`
    fn model_version(&self) -> &str;

    /// Vector width written to the manifest's `embeddingDim`
    fn dimension(&self) -> usize;

    /// Unit-length embedding of `image`
    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbeddingError>;
}

/// L2-normalize, validating length and finiteness
pub fn normalize(mut vector: Vec<f32>, expected_dim: usize) -> Result<Vec<f32>, EmbeddingError> {
    if vector.len() != expected_dim {
        return Err(EmbeddingError::DimensionMismatch {
            expected: expected_dim,
            actual: vector.len(),
        });
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFinite);
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if !norm.is_finite() || norm <= f32::EPSILON {
        return Err(EmbeddingError::ZeroNorm);
    }
    for v in &mut vector {
        *v /= norm;
    }
    Ok(vector)
}

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use super::{normalize, EmbeddingError, ImageEmbedder, EMBEDDING_DIM};
    use image::imageops::FilterType;
    use image::DynamicImage;
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    const INPUT_SIZE: u32 = 224;

    /// MobileNetV3-Small feature extractor on ONNX Runtime
    ///
    /// The model directory must contain `model.onnx` taking NHWC float RGB in
    /// 0..=255 (`[1, 224, 224, 3]`) and producing the 576-dim pooled output.
    /// `Session::run` needs `&mut self`, hence the Mutex.
    pub struct OnnxImageEmbedder {
        session: Mutex<Session>,
    }

    impl OnnxImageEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, EmbeddingError> {
            let model_path = model_dir.join("model.onnx");
            if !model_path.exists() {
                return Err(EmbeddingError::ModelNotFound(model_path));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(format!("ONNX load failed: {e}")))?;

            tracing::info!("ONNX image embedder loaded from {}", model_dir.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl ImageEmbedder for OnnxImageEmbedder {
        fn model_version(&self) -> &str {
            "mobilenet_v3_small"
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }

        fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbeddingError> {
            use ort::value::TensorRef;

            let rgb = image
                .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
                .to_rgb8();
            let input: Vec<f32> = rgb.as_raw().iter().map(|&v| v as f32).collect();

            let array = ndarray::Array4::from_shape_vec(
                (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
                input,
            )
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&array)
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| EmbeddingError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| EmbeddingError::Inference(format!("ONNX inference failed: {e}")))?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| EmbeddingError::Inference(format!("Output extraction: {e}")))?;

            normalize(data.to_vec(), EMBEDDING_DIM)
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::OnnxImageEmbedder;

const THUMBNAIL_WIDTH: u32 = 16;
const THUMBNAIL_HEIGHT: u32 = 12;

/// Embedding made of a tiny RGB thumbnail, channels centered on zero
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailEmbedder;

impl ThumbnailEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageEmbedder for ThumbnailEmbedder {
    fn model_version(&self) -> &str {
        "rgb_thumbnail_16x12"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbeddingError> {
        let small = image
            .resize_exact(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle)
            .to_rgb8();
        let vector: Vec<f32> = small
            .as_raw()
            .iter()
            .map(|&v| v as f32 / 255.0 - 0.5)
            .collect();
        normalize(vector, EMBEDDING_DIM)
    }
}
