//! Candidate image discovery
//!
//! Walks an acquired tree and keeps image files that pass the extension,
//! file size and resolution filters. Dimensions come from a header read;
//! pixel data is never decoded here.

use crate::config::LimitsConfig;
use crate::models::CandidateAsset;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Accepted extensions, compared case-insensitively
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Directories never descended into
const IGNORED_DIRS: &[&str] = &[".git"];

/// Scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Regular files visited
    pub files_seen: usize,
    pub wrong_extension: usize,
    pub oversized: usize,
    pub undersized: usize,
    /// Header read or metadata read failed
    pub unreadable: usize,
    pub accepted: usize,
}

impl ScanSummary {
    pub fn display_string(&self) -> String {
        format!(
            "{} accepted of {} files ({} wrong type, {} oversized, {} undersized, {} unreadable)",
            self.accepted,
            self.files_seen,
            self.wrong_extension,
            self.oversized,
            self.undersized,
            self.unreadable
        )
    }
}

/// Candidates in deterministic order plus filter counters
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub candidates: Vec<CandidateAsset>,
    pub summary: ScanSummary,
}

/// Image file scanner
pub struct AssetScanner {
    max_file_size: u64,
    min_width: u32,
    min_height: u32,
}

impl AssetScanner {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_file_size: limits.max_file_size,
            min_width: limits.min_width,
            min_height: limits.min_height,
        }
    }

    /// Scan `root` for candidates belonging to source `source_index`
    ///
    /// Candidates are ordered lexicographically by relative path.
    pub fn scan(&self, root: &Path, source_index: usize) -> Result<ScanOutcome, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut outcome = ScanOutcome::default();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_ignored_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Error accessing entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            outcome.summary.files_seen += 1;
            if let Some(candidate) = self.check_file(root, &entry, source_index, &mut outcome.summary)
            {
                outcome.candidates.push(candidate);
            }
        }

        outcome
            .candidates
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        outcome.summary.accepted = outcome.candidates.len();

        tracing::debug!(
            root = %root.display(),
            accepted = outcome.summary.accepted,
            seen = outcome.summary.files_seen,
            "Scan complete"
        );

        Ok(outcome)
    }

    fn check_file(
        &self,
        root: &Path,
        entry: &DirEntry,
        source_index: usize,
        summary: &mut ScanSummary,
    ) -> Option<CandidateAsset> {
        let path = entry.path();

        if !has_image_extension(path) {
            summary.wrong_extension += 1;
            return None;
        }

        let file_size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read metadata");
                summary.unreadable += 1;
                return None;
            }
        };
        if file_size > self.max_file_size {
            summary.oversized += 1;
            return None;
        }

        let (width, height) = match image::image_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read image header");
                summary.unreadable += 1;
                return None;
            }
        };
        if width < self.min_width || height < self.min_height {
            summary.undersized += 1;
            return None;
        }

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Some(CandidateAsset {
            path: path.to_path_buf(),
            relative_path,
            source_index,
            width,
            height,
            file_size,
        })
    }
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && IGNORED_DIRS
            .iter()
            .any(|d| entry.file_name().to_string_lossy() == *d)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
