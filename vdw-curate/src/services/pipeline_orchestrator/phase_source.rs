//! Per-source pass: acquire → scan → for each candidate
//! [decode → fingerprint → dedup check → extract → record fingerprint]
//!
//! Every failure in here is contained to the source or the candidate it
//! happened on.

use super::{PipelineOrchestrator, RunState};
use super::statistics::SourceStats;
use crate::models::{AssetRecord, CandidateAsset, SourceDescriptor};
use crate::services::git_fetcher::SourceFetcher;
use crate::services::metadata_extractor::SkipReason;
use crate::services::perceptual_deduplicator::{DedupOutcome, PerceptualDeduplicator};
use image::DynamicImage;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

impl<F: SourceFetcher> PipelineOrchestrator<F> {
    /// Process source `index`, appending accepted records to `state`
    pub(super) async fn process_source(&self, index: usize, state: &mut RunState) -> SourceStats {
        let source = &self.config.sources[index];
        let mut stats = SourceStats::new(index, source.name.clone());

        tracing::info!(
            run_id = %state.run_id,
            source_index = index,
            source = %source.name,
            "Processing source {}/{}",
            index + 1,
            self.config.sources.len()
        );

        let acquired = match self.acquirer.acquire(source, self.config.narrow).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::error!(source = %source.name, attempts = e.attempts(), error = %e, "Source abandoned");
                stats.acquire_attempts = e.attempts();
                stats.abandoned = Some(e.to_string());
                return stats;
            }
        };
        stats.acquire_attempts = acquired.attempts();

        match self.scanner.scan(acquired.root(), index) {
            Ok(mut outcome) => {
                tracing::info!(source = %source.name, "Scan: {}", outcome.summary.display_string());
                if let Some(limit) = self.config.per_source_limit {
                    outcome.candidates.truncate(limit);
                }
                stats.scan = Some(outcome.summary);
                stats.candidates = outcome.candidates.len();

                for candidate in &outcome.candidates {
                    match self.process_candidate(candidate, source, &mut state.dedup) {
                        Ok(record) => {
                            tracing::debug!(id = %record.id, path = %candidate.relative_path, "Accepted");
                            stats.accepted += 1;
                            state.records.push(record);
                        }
                        Err(reason) => {
                            log_skip(candidate, &reason);
                            stats.record_skip(&reason);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(source = %source.name, error = %e, "Scan failed, source abandoned");
                stats.abandoned = Some(e.to_string());
            }
        }

        if let Err(e) = acquired.release() {
            tracing::warn!(source = %source.name, error = %e, "Failed to remove scratch tree");
        }

        stats
    }

    fn process_candidate(
        &self,
        candidate: &CandidateAsset,
        source: &SourceDescriptor,
        dedup: &mut PerceptualDeduplicator,
    ) -> Result<AssetRecord, SkipReason> {
        let image = decode_image(&candidate.path)?;

        let fingerprint = self.fingerprinter.fingerprint(&image)?;
        if let DedupOutcome::Duplicate { distance } = dedup.check(&fingerprint) {
            return Err(SkipReason::Duplicate { distance });
        }

        // Only fingerprints backed by a record join the seen set
        let record = self.extractor.extract(candidate, source, &image)?;
        dedup.record(fingerprint);
        Ok(record)
    }
}

/// Decode an image, turning decoder panics into a skip
fn decode_image(path: &Path) -> Result<DynamicImage, SkipReason> {
    match catch_unwind(AssertUnwindSafe(|| image::open(path))) {
        Ok(Ok(image)) => Ok(image),
        Ok(Err(e)) => Err(SkipReason::Unreadable(e.to_string())),
        Err(_) => Err(SkipReason::Unreadable("decoder panicked".to_string())),
    }
}

fn log_skip(candidate: &CandidateAsset, reason: &SkipReason) {
    match reason {
        SkipReason::Duplicate { distance } => {
            tracing::debug!(path = %candidate.relative_path, distance, "Skipped duplicate");
        }
        SkipReason::Unreadable(_) => {
            tracing::debug!(path = %candidate.relative_path, reason = %reason, "Skipped unreadable");
        }
        SkipReason::Fingerprint(_) | SkipReason::Embedding(_) => {
            tracing::warn!(path = %candidate.relative_path, reason = %reason, "Skipped asset");
        }
    }
}
