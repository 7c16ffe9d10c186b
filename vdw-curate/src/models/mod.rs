//! Data model for the curation pipeline
//!
//! Data flows strictly downstream: `SourceDescriptor` → `CandidateAsset`
//! → `AssetRecord` → `Manifest`. `RunCheckpoint` snapshots the record
//! list between sources.

pub mod asset;
pub mod checkpoint;
pub mod fingerprint;
pub mod manifest;
pub mod source;

pub use asset::{generate_cdn_url, generate_id, AssetRecord, CandidateAsset, RECORD_ORIGIN};
pub use checkpoint::{ResumePoint, RunCheckpoint};
pub use fingerprint::{FingerprintParseError, PerceptualFingerprint};
pub use manifest::Manifest;
pub use source::{default_sources, SourceDescriptor};
