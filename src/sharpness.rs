//! # Per-Photo Image Quality
//!
//! Scores a single survey photo for the two defects that ruin
//! photogrammetric processing: blur and blown-out highlights.
//!
//! ## Laplacian Variance (Sharpness)
//! - Detects blur by measuring high-frequency content (edges)
//! - Motion blur from fast flight or long shutter flattens the response
//! - Variance below the blur threshold marks the photo as blurry
//!
//! ## Clipped Highlights (Exposure)
//! - Counts pixels saturated in all three channels
//! - Reflective roofs, water and snow push this up on sunny days
//! - A clipped share above the exposure threshold marks the photo as overexposed
//!
//! ## Performance Considerations
//!
//! - Photos are downscaled to at most 512 px on the long side first, so the
//!   work per photo no longer depends on the camera resolution
//! - The batch driver in `quality` runs photos one at a time to bound memory

use std::borrow::Cow;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};
use crate::photo::QualityResult;

/// Long side of the working copy used for scoring.
pub const MAX_ANALYSIS_DIMENSION: u32 = 512;

/// Decision thresholds for the quality verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityThresholds {
    /// Laplacian variance below this is blurry.
    pub blur_threshold: f64,
    /// Clipped-pixel percentage above this is overexposed.
    pub overexposure_percent: f64,
    /// A channel strictly above this value counts as clipped.
    pub clip_level: u8,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            blur_threshold: 50.0,
            overexposure_percent: 15.0,
            clip_level: 250,
        }
    }
}

/// Decodes `bytes` and scores the image.
///
/// A decode failure yields [`QualityResult::undecodable`] so one broken file
/// never raises a false defect or aborts a batch.
pub fn analyze_encoded(
    file_name: &str,
    bytes: &[u8],
    thresholds: &QualityThresholds,
) -> QualityResult {
    match decode(file_name, bytes) {
        Ok(img) => analyze_image(&img, thresholds),
        Err(e) => {
            warn!("Skipping quality check: {}", e);
            QualityResult::undecodable()
        }
    }
}

pub fn decode(file_name: &str, bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| QcError::Decode {
        file_name: file_name.to_string(),
        source,
    })
}

/// Scores an already decoded image.
pub fn analyze_image(img: &DynamicImage, thresholds: &QualityThresholds) -> QualityResult {
    let working = downscale(img);
    let rgb = working.to_rgb8();

    let exposure_score = overexposure_percent(&rgb, thresholds.clip_level);
    let gray = grayscale(&rgb);
    let blur_score = laplacian_variance(&gray, rgb.width() as usize, rgb.height() as usize);

    QualityResult {
        is_blurry: blur_score < thresholds.blur_threshold,
        blur_score,
        is_overexposed: exposure_score > thresholds.overexposure_percent,
        exposure_score,
        analyzed: true,
    }
}

/// Shrinks the image so its long side is at most [`MAX_ANALYSIS_DIMENSION`].
/// Smaller images are used as-is.
fn downscale(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    let (width, height) = (img.width(), img.height());
    if width.max(height) <= MAX_ANALYSIS_DIMENSION {
        return Cow::Borrowed(img);
    }
    // `resize` keeps the aspect ratio and fits within the bounds.
    Cow::Owned(img.resize(
        MAX_ANALYSIS_DIMENSION,
        MAX_ANALYSIS_DIMENSION,
        FilterType::Triangle,
    ))
}

/// Luma with the ITU-R BT.601 weights, kept in floating point.
fn grayscale(rgb: &RgbImage) -> Vec<f64> {
    rgb.pixels()
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .collect()
}

/// Share of pixels, in percent, with every channel above `clip_level`.
fn overexposure_percent(rgb: &RgbImage, clip_level: u8) -> f64 {
    let total = rgb.width() as usize * rgb.height() as usize;
    if total == 0 {
        return 0.0;
    }

    let clipped = rgb
        .pixels()
        .filter(|p| p[0] > clip_level && p[1] > clip_level && p[2] > clip_level)
        .count();

    100.0 * clipped as f64 / total as f64
}

/// Computes the variance of the Laplacian of a grayscale image.
/// The Laplacian operator highlights regions of rapid intensity change,
/// which correspond to edges. A sharp image has more high-frequency content
/// and thus a higher Laplacian variance.
fn laplacian_variance(gray: &[f64], width: usize, height: usize) -> f64 {
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut laplacian_values = Vec::with_capacity((width - 2) * (height - 2));

    // Apply Laplacian kernel (using 3x3 kernel)
    // [ 0  1  0 ]
    // [ 1 -4  1 ]
    // [ 0  1  0 ]
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let center = gray[idx];
            let top = gray[idx - width];
            let bottom = gray[idx + width];
            let left = gray[idx - 1];
            let right = gray[idx + 1];

            // Summed as neighbour differences so a flat region is exactly zero.
            laplacian_values
                .push((top - center) + (bottom - center) + (left - center) + (right - center));
        }
    }

    let n = laplacian_values.len() as f64;
    let mean = laplacian_values.iter().sum::<f64>() / n;

    laplacian_values
        .iter()
        .map(|&x| (x - mean).powi(2))
        .sum::<f64>()
        / n
}
