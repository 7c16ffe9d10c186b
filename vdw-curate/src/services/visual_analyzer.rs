//! Pixel statistics: dominant palette, brightness, contrast
//!
//! All functions work on a downscaled copy of the decoded image. Images that
//! already fit the working size are used as is.

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

const PALETTE_SIZE: usize = 5;
const PALETTE_ITERATIONS: usize = 10;
const PALETTE_THUMBNAIL: u32 = 200;
const STATS_THUMBNAIL: u32 = 100;

/// Analysis errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Analysis failed: {0}")]
    Failed(String),
}

/// Color and tone statistics of an image
pub trait VisualAnalyzer: Send + Sync {
    /// Dominant colors as `#rrggbb`, most prominent first
    fn palette(&self, image: &DynamicImage) -> Result<Vec<String>, AnalysisError>;

    /// Perceived brightness 0-100
    fn brightness(&self, image: &DynamicImage) -> Result<u8, AnalysisError>;

    /// Contrast 0-100
    fn contrast(&self, image: &DynamicImage) -> Result<u8, AnalysisError>;
}

/// [`VisualAnalyzer`] computing everything from raw pixels
#[derive(Debug, Clone, Copy)]
pub struct PixelAnalyzer {
    palette_size: usize,
}

impl PixelAnalyzer {
    pub fn new() -> Self {
        Self {
            palette_size: PALETTE_SIZE,
        }
    }
}

impl Default for PixelAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualAnalyzer for PixelAnalyzer {
    fn palette(&self, image: &DynamicImage) -> Result<Vec<String>, AnalysisError> {
        let small = fit_within(image, PALETTE_THUMBNAIL).to_rgb8();
        let pixels: Vec<[f32; 3]> = small
            .pixels()
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect();
        if pixels.is_empty() {
            return Err(AnalysisError::EmptyImage);
        }

        Ok(dominant_colors(&pixels, self.palette_size, PALETTE_ITERATIONS)
            .iter()
            .map(|c| to_hex(*c))
            .collect())
    }

    fn brightness(&self, image: &DynamicImage) -> Result<u8, AnalysisError> {
        let small = fit_within(image, STATS_THUMBNAIL).to_rgb8();
        let count = small.width() as u64 * small.height() as u64;
        if count == 0 {
            return Err(AnalysisError::EmptyImage);
        }

        let total: u64 = small.pixels().map(|p| luma_milli(p.0)).sum();
        let pct = total * 100 / (count * 1000 * 255);
        Ok(pct.min(100) as u8)
    }

    fn contrast(&self, image: &DynamicImage) -> Result<u8, AnalysisError> {
        let small = fit_within(image, STATS_THUMBNAIL).to_rgb8();
        let values: Vec<f64> = small.pixels().map(|p| bt601_luma(p.0) as f64).collect();
        if values.is_empty() {
            return Err(AnalysisError::EmptyImage);
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Ok(percent_of(variance.sqrt(), 127.5))
    }
}

/// ITU-R BT.601 luma in thousandths, exact
fn luma_milli([r, g, b]: [u8; 3]) -> u64 {
    299 * r as u64 + 587 * g as u64 + 114 * b as u64
}

/// 8-bit BT.601 luma, rounded like an `L` conversion
fn bt601_luma(rgb: [u8; 3]) -> u8 {
    ((luma_milli(rgb) + 500) / 1000).min(255) as u8
}

/// Downscale to fit a `max`×`max` box, preserving aspect ratio
fn fit_within(image: &DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max && height <= max {
        image.clone()
    } else {
        image.thumbnail(max, max)
    }
}

/// `floor(value / scale * 100)` clamped to 0..=100
fn percent_of(value: f64, scale: f64) -> u8 {
    let pct = (value / scale * 100.0).floor();
    if pct.is_finite() {
        pct.clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

fn to_hex(color: [f32; 3]) -> String {
    let channel = |v: f32| v.clamp(0.0, 255.0) as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(color[0]),
        channel(color[1]),
        channel(color[2])
    )
}

fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Deterministic k-means over RGB pixels
///
/// Seeds are evenly spaced quantiles of the pixels ordered by channel sum.
/// Centers are returned ordered by cluster size, largest first. An empty
/// cluster keeps its previous center.
fn dominant_colors(pixels: &[[f32; 3]], k: usize, iterations: usize) -> Vec<[f32; 3]> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut order: Vec<&[f32; 3]> = pixels.iter().collect();
    order.sort_by(|a, b| {
        let sa = a[0] + a[1] + a[2];
        let sb = b[0] + b[1] + b[2];
        sa.total_cmp(&sb)
    });
    let n = order.len();
    let mut centers: Vec<[f32; 3]> = (0..k)
        .map(|i| *order[((2 * i + 1) * n / (2 * k)).min(n - 1)])
        .collect();

    let mut assignment = vec![0usize; n];
    for _ in 0..iterations {
        for (slot, pixel) in assignment.iter_mut().zip(pixels) {
            *slot = nearest(&centers, pixel);
        }

        let mut sums = vec![[0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (cluster, pixel) in assignment.iter().zip(pixels) {
            counts[*cluster] += 1;
            for c in 0..3 {
                sums[*cluster][c] += pixel[c] as f64;
            }
        }

        let mut moved = false;
        for (i, center) in centers.iter_mut().enumerate() {
            if counts[i] == 0 {
                continue;
            }
            let updated = [
                (sums[i][0] / counts[i] as f64) as f32,
                (sums[i][1] / counts[i] as f64) as f32,
                (sums[i][2] / counts[i] as f64) as f32,
            ];
            if updated != *center {
                moved = true;
                *center = updated;
            }
        }
        if !moved {
            break;
        }
    }

    let mut counts = vec![0usize; k];
    for pixel in pixels {
        counts[nearest(&centers, pixel)] += 1;
    }

    let mut ranked: Vec<usize> = (0..k).collect();
    ranked.sort_by(|a, b| counts[*b].cmp(&counts[*a]));
    ranked.into_iter().map(|i| centers[i]).collect()
}

fn nearest(centers: &[[f32; 3]], pixel: &[f32; 3]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (i, center) in centers.iter().enumerate() {
        let d = squared_distance(center, pixel);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}
