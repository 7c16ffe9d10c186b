//! Curation pipeline orchestrator
//!
//! # State Progression
//! IDLE → (LOADING_CHECKPOINT | FRESH) → PROCESSING_SOURCE(i)… → BUILDING_MANIFEST → COMPLETED
//!
//! Sources are processed strictly in configured order and candidates strictly
//! in scan order. A checkpoint is written after every attempted source, so a
//! killed run can resume from the next one. Nothing below the run level
//! aborts the run: failed sources and assets are logged, counted and skipped.

use crate::config::CurateConfig;
use crate::error::Result;
use crate::models::{AssetRecord, ResumePoint, RunCheckpoint};
use crate::services::asset_scanner::AssetScanner;
use crate::services::checkpoint_store::CheckpointStore;
use crate::services::fingerprinter::Fingerprinter;
use crate::services::git_fetcher::SourceFetcher;
use crate::services::manifest_builder::{ManifestBuilder, ManifestReport};
use crate::services::metadata_extractor::MetadataExtractor;
use crate::services::perceptual_deduplicator::PerceptualDeduplicator;
use crate::services::source_acquirer::{AcquireSettings, SourceAcquirer};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;
use vdw_common::time::{now, to_iso8601};

mod phase_source;
pub mod statistics;

pub use statistics::{RunStatistics, SourceStats};

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    LoadingCheckpoint,
    Fresh,
    ProcessingSource(usize),
    BuildingManifest,
    Completed,
}

/// Mutable state of one run, owned by the orchestrator
#[derive(Debug)]
pub struct RunState {
    pub run_id: Uuid,
    pub phase: RunPhase,
    /// Accepted records in acceptance order
    pub records: Vec<AssetRecord>,
    /// Run-wide seen-fingerprint set
    pub dedup: PerceptualDeduplicator,
    /// First source index this invocation processes
    pub start_index: usize,
    pub started_at: DateTime<Utc>,
}

impl RunState {
    fn fresh(threshold: u32) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase: RunPhase::Idle,
            records: Vec::new(),
            dedup: PerceptualDeduplicator::new(threshold),
            start_index: 0,
            started_at: now(),
        }
    }

    pub fn transition_to(&mut self, phase: RunPhase) {
        tracing::debug!(run_id = %self.run_id, from = ?self.phase, to = ?phase, "Run phase transition");
        self.phase = phase;
    }

    fn to_checkpoint(&self, last_source_index: usize) -> RunCheckpoint {
        RunCheckpoint {
            run_id: self.run_id,
            records: self.records.clone(),
            last_source_index,
            timestamp: to_iso8601(&now()),
            fingerprints: Some(self.dedup.fingerprints().to_vec()),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub statistics: RunStatistics,
    pub manifest: ManifestReport,
    pub manifest_path: PathBuf,
}

/// Drives acquisition, scanning, dedup, extraction and checkpointing
pub struct PipelineOrchestrator<F> {
    config: CurateConfig,
    acquirer: SourceAcquirer<F>,
    scanner: AssetScanner,
    fingerprinter: Box<dyn Fingerprinter>,
    extractor: MetadataExtractor,
    checkpoints: CheckpointStore,
    manifest_builder: ManifestBuilder,
}

impl<F: SourceFetcher> PipelineOrchestrator<F> {
    pub fn new(
        config: CurateConfig,
        fetcher: F,
        fingerprinter: Box<dyn Fingerprinter>,
        extractor: MetadataExtractor,
    ) -> Self {
        let scratch_root = config
            .scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("vdw-curate"));
        let acquirer =
            SourceAcquirer::new(fetcher, scratch_root, AcquireSettings::from(&config.retry));
        let scanner = AssetScanner::new(&config.limits);
        let checkpoints = CheckpointStore::new(config.checkpoint_path());
        let manifest_builder = ManifestBuilder::for_embedder(extractor.embedder());

        Self {
            config,
            acquirer,
            scanner,
            fingerprinter,
            extractor,
            checkpoints,
            manifest_builder,
        }
    }

    /// Execute the complete run
    ///
    /// Fails only when the output directory or the manifest cannot be
    /// written.
    pub async fn run(&self) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(vdw_common::Error::from)?;

        let mut state = self.initial_state();
        let mut statistics = RunStatistics {
            resumed_records: state.records.len(),
            resumed_from: state.start_index,
            sources: Vec::new(),
        };

        tracing::info!(
            run_id = %state.run_id,
            sources = self.config.sources.len(),
            start_index = state.start_index,
            test_mode = self.config.test_mode,
            "Starting curation run"
        );

        for index in state.start_index..self.config.sources.len() {
            state.transition_to(RunPhase::ProcessingSource(index));
            let stats = self.process_source(index, &mut state).await;
            tracing::info!(
                run_id = %state.run_id,
                skipped = stats.skipped_total(),
                seen_fingerprints = state.dedup.len(),
                "{}",
                stats.display_string()
            );
            statistics.add_source(stats);

            if let Err(e) = self.checkpoints.save(&state.to_checkpoint(index)) {
                tracing::error!(run_id = %state.run_id, source_index = index, error = %e, "Failed to save checkpoint");
            }
        }

        state.transition_to(RunPhase::BuildingManifest);
        let manifest_path = self.config.manifest_path();
        let manifest = self.manifest_builder.build(std::mem::take(&mut state.records));
        let report = ManifestBuilder::write(
            &manifest,
            &manifest_path,
            &self.config.compressed_manifest_path(),
        )?;

        if let Err(e) = self.checkpoints.delete() {
            tracing::error!(run_id = %state.run_id, error = %e, "Failed to delete checkpoint");
        }

        state.transition_to(RunPhase::Completed);
        let summary = RunSummary {
            run_id: state.run_id,
            statistics,
            manifest: report,
            manifest_path,
        };
        log_final_report(&summary, state.started_at);
        Ok(summary)
    }

    /// Fresh state, or state restored from the checkpoint when resuming
    fn initial_state(&self) -> RunState {
        let threshold = self.config.dedup.threshold;
        let mut state = RunState::fresh(threshold);

        if !self.config.resume {
            if self.checkpoints.exists() {
                tracing::warn!(
                    path = %self.checkpoints.path().display(),
                    "Ignoring existing checkpoint (run without --resume); it will be overwritten"
                );
            }
            state.transition_to(RunPhase::Fresh);
            return state;
        }

        state.transition_to(RunPhase::LoadingCheckpoint);
        let resume = match self.checkpoints.load() {
            Ok(resume) => resume,
            Err(e) => {
                tracing::error!(error = %e, "Cannot load checkpoint, starting fresh");
                ResumePoint::empty()
            }
        };

        let Some(run_id) = resume.run_id else {
            tracing::info!("No checkpoint found, starting fresh");
            state.transition_to(RunPhase::Fresh);
            return state;
        };

        let fingerprints = match resume.fingerprints {
            Some(fingerprints) => fingerprints,
            None => {
                tracing::warn!(
                    run_id = %run_id,
                    "Checkpoint has no fingerprints; deduplication covers only this segment"
                );
                Vec::new()
            }
        };

        tracing::info!(
            run_id = %run_id,
            records = resume.records.len(),
            fingerprints = fingerprints.len(),
            resume_from_index = resume.resume_from_index,
            "Resuming from checkpoint"
        );

        state.run_id = run_id;
        state.records = resume.records;
        state.dedup = PerceptualDeduplicator::with_seed(threshold, fingerprints);
        state.start_index = resume.resume_from_index;
        state
    }
}

fn log_final_report(summary: &RunSummary, started_at: DateTime<Utc>) {
    let elapsed = (now() - started_at).num_seconds();
    tracing::info!(
        run_id = %summary.run_id,
        elapsed_seconds = elapsed,
        "Curation complete: {}",
        summary.statistics.display_string()
    );
    tracing::info!(run_id = %summary.run_id, "Manifest: {}", summary.manifest.display_string());

    for (label, count) in summary.statistics.skipped_by_reason() {
        tracing::info!(run_id = %summary.run_id, reason = label, count, "Skipped assets");
    }
    for name in summary.statistics.abandoned_sources() {
        tracing::warn!(run_id = %summary.run_id, source = name, "Source abandoned");
    }
    for (category, count) in &summary.manifest.categories {
        tracing::info!(run_id = %summary.run_id, category = %category, count, "Category breakdown");
    }
}
