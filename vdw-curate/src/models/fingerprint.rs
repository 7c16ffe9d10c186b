//! Perceptual fingerprints
//!
//! Fixed-width hashes of pixel content. Only ever compared by Hamming
//! distance, never used as identity.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintParseError {
    #[error("Fingerprint hex has odd length {0}")]
    OddLength(usize),

    #[error("Invalid hex digit in fingerprint: {0}")]
    InvalidDigit(String),

    #[error("Empty fingerprint")]
    Empty,
}

/// Perceptual hash bytes; bit width is `8 * bytes.len()`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PerceptualFingerprint {
    bytes: Box<[u8]>,
}

impl PerceptualFingerprint {
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// 64-bit fingerprint, big-endian bit order
    pub fn from_u64(value: u64) -> Self {
        Self::from_bytes(value.to_be_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bit_width(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Hamming distance, or `None` when the widths differ
    pub fn distance(&self, other: &Self) -> Option<u32> {
        if self.bytes.len() != other.bytes.len() {
            return None;
        }
        Some(
            self.bytes
                .iter()
                .zip(other.bytes.iter())
                .map(|(a, b)| (a ^ b).count_ones())
                .sum(),
        )
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(hex: &str) -> Result<Self, FingerprintParseError> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(FingerprintParseError::Empty);
        }
        if hex.len() % 2 != 0 {
            return Err(FingerprintParseError::OddLength(hex.len()));
        }
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| FingerprintParseError::InvalidDigit(hex.to_string()))
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(Self::from_bytes(bytes))
    }
}

impl fmt::Debug for PerceptualFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PerceptualFingerprint({})", self.to_hex())
    }
}

impl fmt::Display for PerceptualFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PerceptualFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PerceptualFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_symmetric() {
        let samples = [0u64, 1, 0xFF, 0xDEAD_BEEF, u64::MAX, 0x8000_0000_0000_0001];
        for a in samples {
            for b in samples {
                let fa = PerceptualFingerprint::from_u64(a);
                let fb = PerceptualFingerprint::from_u64(b);
                assert_eq!(fa.distance(&fb), fb.distance(&fa));
                assert_eq!(fa.distance(&fb), Some((a ^ b).count_ones()));
            }
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let fp = PerceptualFingerprint::from_u64(0x0123_4567_89AB_CDEF);
        assert_eq!(fp.distance(&fp), Some(0));
    }

    #[test]
    fn test_mismatched_widths_have_no_distance() {
        let narrow = PerceptualFingerprint::from_bytes(vec![0u8; 4]);
        let wide = PerceptualFingerprint::from_u64(0);
        assert_eq!(narrow.distance(&wide), None);
    }

    #[test]
    fn test_hex_round_trip() {
        let fp = PerceptualFingerprint::from_u64(0x00AB_CDEF_0123_4567);
        assert_eq!(fp.to_hex(), "00abcdef01234567");
        assert_eq!(PerceptualFingerprint::from_hex("00abcdef01234567").unwrap(), fp);
        assert_eq!(fp.bit_width(), 64);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert_eq!(PerceptualFingerprint::from_hex(""), Err(FingerprintParseError::Empty));
        assert_eq!(PerceptualFingerprint::from_hex("abc"), Err(FingerprintParseError::OddLength(3)));
        assert!(matches!(
            PerceptualFingerprint::from_hex("zz"),
            Err(FingerprintParseError::InvalidDigit(_))
        ));
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let fp = PerceptualFingerprint::from_u64(1);
        assert_eq!(serde_json::to_string(&fp).unwrap(), "\"0000000000000001\"");
    }
}
