//! # Image Rasterizer
//!
//! Turns an arbitrary image into a [`MonochromeCanvas`] of exact target
//! dimensions:
//!
//! 1. convert to 8-bit luminance
//! 2. scale to fit, preserving aspect ratio (Lanczos3)
//! 3. paste centered on a white canvas of the target size
//! 4. threshold: black where `luma < threshold`
//!
//! The output is always exactly `target_width × target_height`, so byte
//! counts downstream never depend on the source image.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, imageops, imageops::FilterType};
use tracing::debug;

use super::canvas::MonochromeCanvas;
use crate::error::{KabalaError, Result};

/// Default luminance threshold (0–255).
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Rasterize an already decoded image.
pub fn rasterize(
    image: &DynamicImage,
    target_width: usize,
    target_height: usize,
    threshold: u8,
) -> Result<MonochromeCanvas> {
    if target_width == 0 || target_height == 0 {
        return Err(KabalaError::InvalidCommand(format!(
            "Target canvas must be non-empty, got {}x{}",
            target_width, target_height
        )));
    }

    let (src_w, src_h) = (image.width(), image.height());
    if src_w == 0 || src_h == 0 {
        return Err(KabalaError::ImageLoad(format!(
            "Source image has zero size ({}x{})",
            src_w, src_h
        )));
    }

    let (new_w, new_h) = fit_dimensions(src_w, src_h, target_width as u32, target_height as u32);
    let gray = image.to_luma8();
    let resized = imageops::resize(&gray, new_w, new_h, FilterType::Lanczos3);

    let mut padded = GrayImage::from_pixel(target_width as u32, target_height as u32, Luma([255]));
    let offset_x = (target_width as u32 - new_w) / 2;
    let offset_y = (target_height as u32 - new_h) / 2;
    imageops::replace(&mut padded, &resized, offset_x as i64, offset_y as i64);

    debug!(
        src_w,
        src_h, new_w, new_h, offset_x, offset_y, threshold, "rasterized image"
    );

    Ok(MonochromeCanvas::from_fn(
        target_width,
        target_height,
        |x, y| padded.get_pixel(x as u32, y as u32)[0] < threshold,
    ))
}

/// Decode image bytes (any format the `image` crate recognises) and rasterize.
pub fn rasterize_bytes(
    bytes: &[u8],
    target_width: usize,
    target_height: usize,
    threshold: u8,
) -> Result<MonochromeCanvas> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| KabalaError::ImageLoad(format!("Failed to decode image: {}", e)))?;
    rasterize(&image, target_width, target_height, threshold)
}

/// Open an image file and rasterize.
pub fn rasterize_path<P: AsRef<Path>>(
    path: P,
    target_width: usize,
    target_height: usize,
    threshold: u8,
) -> Result<MonochromeCanvas> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| KabalaError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    rasterize(&image, target_width, target_height, threshold)
}

/// Aspect-preserving fit: `scale = min(tw/sw, th/sh)`, each side rounded and
/// kept within `1..=target`.
fn fit_dimensions(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    let scale = f64::min(
        target_w as f64 / src_w as f64,
        target_h as f64 / src_h as f64,
    );
    let new_w = ((src_w as f64 * scale).round() as u32).clamp(1, target_w);
    let new_h = ((src_h as f64 * scale).round() as u32).clamp(1, target_h);
    (new_w, new_h)
}
