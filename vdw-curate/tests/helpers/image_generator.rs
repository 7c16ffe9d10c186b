//! Fixture image generation

use image::{Rgb, RgbImage};
use std::path::Path;

pub const RED: [u8; 3] = [220, 30, 30];
pub const GREEN: [u8; 3] = [30, 200, 60];
pub const BLUE: [u8; 3] = [20, 40, 210];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Write a solid-color PNG, creating parent folders
pub fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .unwrap();
}

/// Write bytes that carry an image extension but no valid header
pub fn write_corrupt_image(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"definitely not an image").unwrap();
}
