//! Test Helper Utilities
//!
//! Shared utilities for testing vdw-curate

#![allow(dead_code)]

pub mod fakes;
pub mod image_generator;
pub mod log_capture;

pub use fakes::{FakeEmbedder, FakeFetcher, FakeFingerprinter, SourceScript};
pub use image_generator::{write_corrupt_image, write_png, RED, GREEN, BLUE, WHITE};
pub use log_capture::{capture_logs, LogCapture};

use std::path::Path;
use vdw_curate::config::CurateConfig;
use vdw_curate::models::SourceDescriptor;

/// Config rooted in `root` with zero retry delays
pub fn test_config(root: &Path, sources: Vec<SourceDescriptor>) -> CurateConfig {
    let mut config = CurateConfig::with_output_dir(root.join("out"));
    config.scratch_dir = Some(root.join("scratch"));
    config.retry.narrow_delay_ms = 0;
    config.retry.full_delay_ms = 0;
    config.sources = sources;
    config
}

pub fn source(name: &str) -> SourceDescriptor {
    SourceDescriptor::new(format!("https://github.com/{}", name), "main", name)
}
