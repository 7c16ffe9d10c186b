//! Perceptual fingerprinting of decoded images
//!
//! DCT-based mean hash via `img_hash`; visually identical images land a few
//! bits apart regardless of encoding or scale.

use crate::models::PerceptualFingerprint;
use image::{DynamicImage, GenericImageView};
use img_hash::{HashAlg, Hasher, HasherConfig};
use thiserror::Error;

/// Fingerprinting errors
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("Image has no pixels ({0}x{1})")]
    EmptyImage(u32, u32),

    #[error("Fingerprint failed: {0}")]
    Failed(String),
}

/// Computes a comparable fingerprint from pixel content
///
/// Not `Send`: the DCT hasher holds a transform plan that is not thread-safe.
pub trait Fingerprinter {
    fn fingerprint(&self, image: &DynamicImage) -> Result<PerceptualFingerprint, FingerprintError>;
}

/// Perceptual hash: DCT preprocessing, mean threshold
pub struct DctFingerprinter {
    hasher: Hasher,
}

impl DctFingerprinter {
    /// `hash_size` is the grid side; the fingerprint has `hash_size²` bits
    pub fn new(hash_size: u32) -> Self {
        let hash_size = hash_size.max(2);
        let hasher = HasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }
}

impl Default for DctFingerprinter {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Fingerprinter for DctFingerprinter {
    fn fingerprint(&self, image: &DynamicImage) -> Result<PerceptualFingerprint, FingerprintError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FingerprintError::EmptyImage(width, height));
        }

        let hash = self.hasher.hash_image(image);
        Ok(PerceptualFingerprint::from_bytes(hash.as_bytes().to_vec()))
    }
}
