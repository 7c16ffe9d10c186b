//! Scripted stand-ins for the network fetcher and the pixel-based services

use super::image_generator::write_png;
use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use vdw_curate::models::{PerceptualFingerprint, SourceDescriptor};
use vdw_curate::services::{
    EmbeddingError, FetchError, FingerprintError, Fingerprinter, ImageEmbedder, SourceFetcher,
};

/// What one source does when fetched
#[derive(Debug, Clone, Default)]
pub struct SourceScript {
    /// Errors returned by the first attempts, in order
    pub failures: VecDeque<FetchError>,
    /// Leave a half-written tree behind on each failure
    pub partial_on_failure: bool,
    /// Files materialized on success: relative path and solid color
    pub files: Vec<(String, [u8; 3])>,
}

impl SourceScript {
    pub fn with_files(files: &[(&str, [u8; 3])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, color)| (path.to_string(), *color))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing(failures: Vec<FetchError>) -> Self {
        Self {
            failures: failures.into(),
            ..Self::default()
        }
    }

    pub fn partial(mut self) -> Self {
        self.partial_on_failure = true;
        self
    }
}

/// In-memory [`SourceFetcher`]
///
/// Clones share state so a test can keep a handle after moving the fetcher
/// into the pipeline.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    scripts: Arc<Mutex<HashMap<String, SourceScript>>>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
    narrow_requests: Arc<Mutex<Vec<Option<String>>>>,
    checkpoint_watch: Option<PathBuf>,
    observed_checkpoints: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, source_name: &str, script: SourceScript) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(source_name.to_string(), script);
        self
    }

    /// Snapshot `path` at the start of every fetch
    pub fn watch_checkpoint(mut self, path: PathBuf) -> Self {
        self.checkpoint_watch = Some(path);
        self
    }

    pub fn attempts(&self, source_name: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(source_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn narrow_requests(&self) -> Vec<Option<String>> {
        self.narrow_requests.lock().unwrap().clone()
    }

    pub fn observed_checkpoints(&self) -> Vec<Option<String>> {
        self.observed_checkpoints.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(
        &self,
        source: &SourceDescriptor,
        narrow_path: Option<&str>,
        dest: &Path,
    ) -> Result<(), FetchError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(source.name.clone())
            .or_insert(0) += 1;
        self.narrow_requests
            .lock()
            .unwrap()
            .push(narrow_path.map(str::to_string));
        if let Some(watched) = &self.checkpoint_watch {
            self.observed_checkpoints
                .lock()
                .unwrap()
                .push(std::fs::read_to_string(watched).ok());
        }

        let (failure, partial, files) = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.entry(source.name.clone()).or_default();
            (
                script.failures.pop_front(),
                script.partial_on_failure,
                script.files.clone(),
            )
        };

        if let Some(error) = failure {
            if partial {
                std::fs::create_dir_all(dest.join("half")).unwrap();
                std::fs::write(dest.join("half").join("pack.tmp"), b"partial").unwrap();
            }
            return Err(error);
        }

        std::fs::create_dir_all(dest).unwrap();
        for (relative_path, color) in files {
            write_png(&dest.join(relative_path), 800, 600, color);
        }
        Ok(())
    }
}

fn top_left(image: &DynamicImage) -> [u8; 3] {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return [0, 0, 0];
    }
    image.to_rgb8().get_pixel(0, 0).0
}

/// Fingerprints looked up by the image's (solid) color
#[derive(Default)]
pub struct FakeFingerprinter {
    by_color: HashMap<[u8; 3], u64>,
}

impl FakeFingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, color: [u8; 3], fingerprint: u64) -> Self {
        self.by_color.insert(color, fingerprint);
        self
    }
}

impl Fingerprinter for FakeFingerprinter {
    fn fingerprint(&self, image: &DynamicImage) -> Result<PerceptualFingerprint, FingerprintError> {
        self.by_color
            .get(&top_left(image))
            .map(|fp| PerceptualFingerprint::from_u64(*fp))
            .ok_or_else(|| FingerprintError::Failed("no scripted fingerprint".into()))
    }
}

/// Unit-vector embedder that fails for chosen colors
#[derive(Default)]
pub struct FakeEmbedder {
    failing: HashSet<[u8; 3]>,
}

impl FakeEmbedder {
    pub const DIM: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, color: [u8; 3]) -> Self {
        self.failing.insert(color);
        self
    }
}

impl ImageEmbedder for FakeEmbedder {
    fn model_version(&self) -> &str {
        "fake_embedder"
    }

    fn dimension(&self) -> usize {
        Self::DIM
    }

    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbeddingError> {
        let color = top_left(image);
        if self.failing.contains(&color) {
            return Err(EmbeddingError::Inference("scripted failure".into()));
        }
        let mut vector = vec![1.0f32; Self::DIM];
        vector[0] += color[0] as f32;
        vdw_curate::services::normalize(vector, Self::DIM)
    }
}
