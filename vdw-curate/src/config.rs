//! Configuration for the curation run
//!
//! Two layers, as in the other Vanderwaals tools:
//! 1. **TOML file** (optional): output folder, logging, limits, retry
//!    budget and the source list
//! 2. **Command line / environment**: run mode flags and folder overrides
//!
//! Folder priority is CLI → environment → TOML → built-in default.
//! Missing TOML keys fall back to the defaults defined here.

use crate::models::{default_sources, SourceDescriptor};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vdw_common::config::{find_config_file, load_toml, resolve_folder, DEFAULT_OUTPUT_DIR};
use vdw_common::Result;

/// Environment variable overriding the output folder
pub const OUTPUT_DIR_ENV: &str = "VDW_OUTPUT_DIR";
/// Environment variable pointing at the TOML config
pub const CONFIG_ENV: &str = "VDW_CONFIG";
/// Environment variable overriding the ONNX model folder
pub const MODEL_DIR_ENV: &str = "VDW_MODEL_DIR";
/// Environment variable overriding the scratch folder
pub const SCRATCH_DIR_ENV: &str = "VDW_SCRATCH_DIR";

const CHECKPOINT_FILE: &str = "checkpoint.json";
const MANIFEST_FILE: &str = "manifest.json";
const COMPRESSED_MANIFEST_FILE: &str = "manifest.json.gz";
const LOG_FILE: &str = "curation.log";

/// TOML file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub output_dir: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub limits: LimitsConfig,
    pub dedup: DedupConfig,
    pub retry: RetryConfig,
    /// Replaces the built-in source list when non-empty
    pub sources: Vec<SourceDescriptor>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
    /// Log file (appended); defaults to `<output_dir>/curation.log`
    pub file: Option<PathBuf>,
    /// Disable the log file entirely
    pub disable_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            disable_file: false,
        }
    }
}

/// Candidate filtering limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Candidates per source in test mode
    pub test_limit: usize,
    /// Largest accepted file in bytes
    pub max_file_size: u64,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            test_limit: 10,
            max_file_size: 20 * 1024 * 1024,
            min_width: 800,
            min_height: 600,
        }
    }
}

/// Perceptual deduplication settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Maximum Hamming distance still considered the same image
    pub threshold: u32,
    /// Hash grid side; fingerprint width is `hash_size * hash_size` bits
    pub hash_size: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            hash_size: 8,
        }
    }
}

/// Source acquisition retry budget and timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub narrow_delay_ms: u64,
    pub full_delay_ms: u64,
    pub narrow_step_timeout_secs: u64,
    pub sparse_config_timeout_secs: u64,
    pub full_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            narrow_delay_ms: 5_000,
            full_delay_ms: 10_000,
            narrow_step_timeout_secs: 30,
            sparse_config_timeout_secs: 10,
            full_timeout_secs: 300,
        }
    }
}

impl RetryConfig {
    pub fn narrow_delay(&self) -> Duration {
        vdw_common::time::millis_to_duration(self.narrow_delay_ms)
    }

    pub fn full_delay(&self) -> Duration {
        vdw_common::time::millis_to_duration(self.full_delay_ms)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub test: bool,
    pub resume: bool,
    pub config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
}

/// Fully resolved run configuration
#[derive(Debug, Clone)]
pub struct CurateConfig {
    pub output_dir: PathBuf,
    /// Parent of per-source scratch trees; `None` means the system temp dir
    pub scratch_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub test_mode: bool,
    pub resume: bool,
    /// Narrow (sparse) fetch of each source's subpath
    pub narrow: bool,
    /// Cap on candidates processed per source
    pub per_source_limit: Option<usize>,
    pub limits: LimitsConfig,
    pub dedup: DedupConfig,
    pub retry: RetryConfig,
    pub sources: Vec<SourceDescriptor>,
}

impl CurateConfig {
    /// Locate and read the TOML file (if any), then apply CLI overrides
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let toml = match find_config_file(cli.config.as_deref(), CONFIG_ENV, "curate")? {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading config file");
                load_toml::<TomlConfig>(&path)?
            }
            None => TomlConfig::default(),
        };
        Ok(Self::resolve(cli, toml))
    }

    /// Merge CLI overrides with TOML values
    pub fn resolve(cli: &CliOverrides, toml: TomlConfig) -> Self {
        let output_dir = resolve_folder(
            cli.output_dir.as_deref(),
            OUTPUT_DIR_ENV,
            toml.output_dir.as_deref(),
            Path::new(DEFAULT_OUTPUT_DIR),
        );

        let model_dir = cli
            .model_dir
            .clone()
            .or_else(|| env_path(MODEL_DIR_ENV))
            .or(toml.model_dir);

        let scratch_dir = env_path(SCRATCH_DIR_ENV).or(toml.scratch_dir);

        let log_file = if toml.logging.disable_file {
            None
        } else {
            Some(
                toml.logging
                    .file
                    .clone()
                    .unwrap_or_else(|| output_dir.join(LOG_FILE)),
            )
        };

        let sources = if toml.sources.is_empty() {
            default_sources()
        } else {
            toml.sources
        };

        Self {
            output_dir,
            scratch_dir,
            model_dir,
            log_level: toml.logging.level,
            log_file,
            test_mode: cli.test,
            resume: cli.resume,
            narrow: cli.test,
            per_source_limit: cli.test.then_some(toml.limits.test_limit),
            limits: toml.limits,
            dedup: toml.dedup,
            retry: toml.retry,
            sources,
        }
    }

    /// Defaults rooted at `output_dir`, without consulting env or files
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            log_file: None,
            scratch_dir: None,
            model_dir: None,
            ..Self::resolve(
                &CliOverrides {
                    output_dir: Some(output_dir),
                    ..CliOverrides::default()
                },
                TomlConfig::default(),
            )
        }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(CHECKPOINT_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }

    pub fn compressed_manifest_path(&self) -> PathBuf {
        self.output_dir.join(COMPRESSED_MANIFEST_FILE)
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}
