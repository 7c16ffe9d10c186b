//! Candidate assets and curated asset records

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// CDN serving files straight out of GitHub repositories
const CDN_BASE: &str = "https://cdn.jsdelivr.net/gh";

/// Constant `source` field of every record
pub const RECORD_ORIGIN: &str = "github";

/// Image discovered by the scanner that passed the size and resolution filters
///
/// Lives only for the duration of one source pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAsset {
    /// Absolute path inside the acquired tree
    pub path: PathBuf,
    /// Path relative to the tree root, `/`-separated
    pub relative_path: String,
    /// Index of the source in the configured list
    pub source_index: usize,
    /// Pixel width from the header read
    pub width: u32,
    /// Pixel height from the header read
    pub height: u32,
    /// File size in bytes
    pub file_size: u64,
}

impl CandidateAsset {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Durable unit of output: one accepted, non-duplicate, processed image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Stable identifier derived from (source name, relative path)
    pub id: String,
    /// Canonical access URL
    pub url: String,
    /// Thumbnail URL (same as `url`; the CDN resizes on request)
    pub thumbnail: String,
    /// Hosting origin, always `"github"`
    pub source: String,
    /// Source display name (`owner/repo`)
    pub repo: String,
    /// Detected category
    pub category: String,
    /// Dominant colors as `#rrggbb`, most prominent first
    pub colors: Vec<String>,
    /// Perceived brightness 0-100
    pub brightness: u8,
    /// Contrast 0-100
    pub contrast: u8,
    /// Unit-normalized embedding vector
    pub embedding: Vec<f32>,
    /// `WIDTHxHEIGHT`
    pub resolution: String,
    /// Attribution string shown downstream
    pub attribution: String,
}

/// Normalize a relative path to `/` separators without a leading slash
pub fn normalize_relative_path(relative_path: &str) -> String {
    relative_path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Generate a deterministic asset identifier
///
/// Format: `{owner}_{hash12}` where `owner` is the owner part of the source
/// name stripped of `-`/`_` and cut to 8 characters, and `hash12` is the
/// first 12 hex digits of SHA-256 over `"{source}/{relative_path}"`.
pub fn generate_id(source_name: &str, relative_path: &str) -> String {
    let path = normalize_relative_path(relative_path);
    let digest = Sha256::digest(format!("{}/{}", source_name, path).as_bytes());
    let hash_hex = format!("{:x}", digest);

    let owner: String = source_name
        .split('/')
        .next()
        .unwrap_or(source_name)
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .take(8)
        .collect();

    format!("{}_{}", owner, &hash_hex[..12])
}

/// Generate the jsDelivr URL for a file in a source repository
pub fn generate_cdn_url(source_name: &str, relative_path: &str, branch: &str) -> String {
    format!(
        "{}/{}@{}/{}",
        CDN_BASE,
        source_name,
        branch,
        normalize_relative_path(relative_path)
    )
}
