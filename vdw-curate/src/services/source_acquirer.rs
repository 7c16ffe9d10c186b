//! Source acquisition with bounded retry
//!
//! Each source gets its own scratch directory. A failed attempt removes
//! whatever it left behind before the next one starts, and an abandoned
//! source leaves nothing in the scratch area.

use crate::config::RetryConfig;
use crate::models::SourceDescriptor;
use crate::services::git_fetcher::{FetchError, SourceFetcher};
use crate::utils::{retry_transient, RetryError, RetryPolicy};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;

const TREE_DIR: &str = "tree";

/// Acquisition failure for one source
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("{source_name}: gave up after {attempts} attempts: {last}")]
    Exhausted {
        source_name: String,
        attempts: u32,
        last: FetchError,
    },

    #[error("{source_name}: attempt {attempt}: {error}")]
    Permanent {
        source_name: String,
        attempt: u32,
        error: FetchError,
    },

    #[error("{source_name}: cannot prepare scratch directory: {error}")]
    Scratch {
        source_name: String,
        #[source]
        error: io::Error,
    },
}

impl AcquireError {
    /// Number of fetch attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            AcquireError::Exhausted { attempts, .. } => *attempts,
            AcquireError::Permanent { attempt, .. } => *attempt,
            AcquireError::Scratch { .. } => 0,
        }
    }
}

/// Retry budget for acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireSettings {
    pub max_attempts: u32,
    /// Delay between narrow attempts
    pub narrow_delay: Duration,
    /// Delay between full attempts
    pub full_delay: Duration,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            narrow_delay: Duration::from_secs(5),
            full_delay: Duration::from_secs(10),
        }
    }
}

impl From<&RetryConfig> for AcquireSettings {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            narrow_delay: config.narrow_delay(),
            full_delay: config.full_delay(),
        }
    }
}

/// Scoped handle on an acquired tree
///
/// The scratch directory is deleted when the handle is dropped. Use
/// [`AcquiredSource::release`] to observe cleanup errors.
#[derive(Debug)]
pub struct AcquiredSource {
    scratch: TempDir,
    root: PathBuf,
    attempts: u32,
}

impl AcquiredSource {
    /// Root of the fetched tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Attempt on which the fetch succeeded (1-based)
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delete the tree now
    pub fn release(self) -> io::Result<()> {
        self.scratch.close()
    }
}

/// Fetches sources into a scratch area using a [`SourceFetcher`]
pub struct SourceAcquirer<F> {
    fetcher: F,
    scratch_root: PathBuf,
    settings: AcquireSettings,
}

impl<F: SourceFetcher> SourceAcquirer<F> {
    pub fn new(fetcher: F, scratch_root: impl Into<PathBuf>, settings: AcquireSettings) -> Self {
        Self {
            fetcher,
            scratch_root: scratch_root.into(),
            settings,
        }
    }

    /// Fetch one source, retrying transient failures
    pub async fn acquire(
        &self,
        source: &SourceDescriptor,
        narrow: bool,
    ) -> Result<AcquiredSource, AcquireError> {
        let narrow_path = source.narrow_target(narrow);
        let delay = if narrow_path.is_some() {
            self.settings.narrow_delay
        } else {
            self.settings.full_delay
        };
        let policy = RetryPolicy::new(self.settings.max_attempts, delay);

        let scratch = self.create_scratch(source)?;
        let dest = scratch.path().join(TREE_DIR);

        tracing::info!(
            source = %source.name,
            narrow_path = ?narrow_path,
            max_attempts = policy.max_attempts,
            "Acquiring source"
        );

        let fetcher = &self.fetcher;
        let result = retry_transient(&source.name, &policy, |attempt| {
            let dest = dest.clone();
            async move {
                clear_partial_tree(&dest);
                match fetcher.fetch(source, narrow_path, &dest).await {
                    Ok(()) => Ok(attempt),
                    Err(e) => {
                        clear_partial_tree(&dest);
                        Err(e)
                    }
                }
            }
        })
        .await;

        match result {
            Ok(attempts) => {
                tracing::info!(source = %source.name, attempts, "Source acquired");
                Ok(AcquiredSource {
                    scratch,
                    root: dest,
                    attempts,
                })
            }
            // `scratch` drops here, removing the (already emptied) directory
            Err(RetryError::Exhausted { attempts, last, .. }) => Err(AcquireError::Exhausted {
                source_name: source.name.clone(),
                attempts,
                last,
            }),
            Err(RetryError::Permanent { attempt, error, .. }) => Err(AcquireError::Permanent {
                source_name: source.name.clone(),
                attempt,
                error,
            }),
        }
    }

    fn create_scratch(&self, source: &SourceDescriptor) -> Result<TempDir, AcquireError> {
        let scratch_error = |error| AcquireError::Scratch {
            source_name: source.name.clone(),
            error,
        };
        std::fs::create_dir_all(&self.scratch_root).map_err(scratch_error)?;
        tempfile::Builder::new()
            .prefix(&format!("{}-", source.scratch_name()))
            .tempdir_in(&self.scratch_root)
            .map_err(scratch_error)
    }
}

fn clear_partial_tree(dest: &Path) {
    if !dest.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dest) {
        tracing::warn!(path = %dest.display(), error = %e, "Failed to remove partial tree");
    }
}
