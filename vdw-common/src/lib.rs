//! # Vanderwaals Common Library
//!
//! Shared code for the Vanderwaals curation tools:
//! - Common error and result types
//! - Configuration file and output folder resolution
//! - Atomic file writes
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod fs;
pub mod time;

pub use error::{Error, Result};
