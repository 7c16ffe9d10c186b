//! Near-duplicate suppression by fingerprint distance
//!
//! Holds the fingerprint of every asset that became a record so far in the
//! run. A candidate within `threshold` bits of any of them is a duplicate.
//!
//! The lookup is a linear scan over the seen set.

use crate::models::PerceptualFingerprint;

/// Default maximum Hamming distance for "same image"
pub const DEFAULT_THRESHOLD: u32 = 5;

/// Deduplication decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No earlier fingerprint within threshold
    Unique,
    /// Matches an earlier fingerprint
    Duplicate {
        /// Distance to the closest match
        distance: u32,
    },
}

/// Run-wide seen-fingerprint set
#[derive(Debug, Clone)]
pub struct PerceptualDeduplicator {
    seen: Vec<PerceptualFingerprint>,
    threshold: u32,
}

impl PerceptualDeduplicator {
    pub fn new(threshold: u32) -> Self {
        Self {
            seen: Vec::new(),
            threshold,
        }
    }

    /// Start from fingerprints recorded earlier in the same run lineage
    pub fn with_seed(threshold: u32, seed: Vec<PerceptualFingerprint>) -> Self {
        Self {
            seen: seed,
            threshold,
        }
    }

    /// Distance to the closest recorded fingerprint within threshold
    fn closest_match(&self, fingerprint: &PerceptualFingerprint) -> Option<u32> {
        self.seen
            .iter()
            .filter_map(|seen| seen.distance(fingerprint))
            .filter(|d| *d <= self.threshold)
            .min()
    }

    /// Duplicate check; the seen set is left unchanged
    pub fn check(&self, fingerprint: &PerceptualFingerprint) -> DedupOutcome {
        match self.closest_match(fingerprint) {
            Some(distance) => DedupOutcome::Duplicate { distance },
            None => DedupOutcome::Unique,
        }
    }

    /// Add a fingerprint unconditionally
    pub fn record(&mut self, fingerprint: PerceptualFingerprint) {
        self.seen.push(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn fingerprints(&self) -> &[PerceptualFingerprint] {
        &self.seen
    }
}

impl Default for PerceptualDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
