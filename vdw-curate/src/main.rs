//! vdw-curate - wallpaper curation pipeline
//!
//! Fetches the configured source repositories one at a time, filters and
//! deduplicates their images, and writes `manifest.json` plus a gzip copy.
//! Interrupted runs continue with `--resume`.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vdw_curate::{CliOverrides, CurateConfig};

/// Command-line arguments for vdw-curate
#[derive(Parser, Debug)]
#[command(name = "vdw-curate")]
#[command(about = "Curate wallpapers from GitHub repositories into a manifest")]
#[command(version)]
struct Args {
    /// Test mode: 10 images per source, sparse fetch of a small folder
    #[arg(long)]
    test: bool,

    /// Resume from the last checkpoint
    #[arg(long)]
    resume: bool,

    /// Output folder for manifest, checkpoint and log
    #[arg(long, env = "VDW_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "VDW_CONFIG")]
    config: Option<PathBuf>,

    /// Folder containing model.onnx
    #[arg(long, env = "VDW_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            test: args.test,
            resume: args.resume,
            config: args.config,
            output_dir: args.output_dir,
            model_dir: args.model_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = CurateConfig::load(&args.into()).context("Failed to load configuration")?;

    init_tracing(&config.log_level, config.log_file.as_deref())?;

    info!("Starting vdw-curate {}", env!("CARGO_PKG_VERSION"));
    info!("Output folder: {}", config.output_dir.display());
    if config.test_mode {
        info!("Test mode: limited candidates per source, narrow fetch");
    }

    let pipeline = vdw_curate::build_pipeline(config).context("Failed to build pipeline")?;
    let summary = pipeline.run().await.context("Curation run failed")?;

    info!(
        "Done: {} records in {}",
        summary.manifest.total_count,
        summary.manifest_path.display()
    );
    Ok(())
}

/// stdout layer plus an optional plain-text file layer
fn init_tracing(default_level: &str, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log folder {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}
