//! Sequential image-quality pass over a photo collection.
//!
//! Photos are decoded and scored one at a time to bound peak memory. Progress
//! is reported every few photos and the pass can be cancelled between photos.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};
use crate::photo::{PhotoRecord, QualityResult};
use crate::sharpness::{analyze_encoded, QualityThresholds};

/// Progress is reported after this many photos.
pub const PROGRESS_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProgress {
    pub current_photo: usize,
    pub total_photos: usize,
    pub percentage: f32,
}

/// Raw pixel access for a photo, provided by the ingestion layer.
pub trait PixelSource {
    /// Encoded image bytes (JPEG, PNG, ...) for `photo`.
    fn load(&self, photo: &PhotoRecord) -> Result<Vec<u8>>;
}

/// Reads `<root>/<file_name>` from disk.
#[derive(Debug, Clone)]
pub struct DirectoryPixelSource {
    root: PathBuf,
}

impl DirectoryPixelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PixelSource for DirectoryPixelSource {
    fn load(&self, photo: &PhotoRecord) -> Result<Vec<u8>> {
        let path = self.root.join(&photo.file_name);
        fs::read(&path).map_err(|source| QcError::Read { path, source })
    }
}

/// Cooperative cancellation flag shared with the running pass.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Results keyed by photo id, in processing order.
    pub results: Vec<(String, QualityResult)>,
    /// True when the pass stopped before the last photo.
    pub cancelled: bool,
}

/// Scores every photo in order, one at a time.
///
/// A photo whose pixels cannot be loaded or decoded gets the safe default
/// result; it never stops the pass. `on_progress` fires after every
/// [`PROGRESS_BATCH_SIZE`] photos and once more at the end.
pub fn run_quality_pass<S, F>(
    photos: &[PhotoRecord],
    source: &S,
    thresholds: &QualityThresholds,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> QualityReport
where
    S: PixelSource + ?Sized,
    F: FnMut(QualityProgress),
{
    let total_photos = photos.len();
    let mut report = QualityReport::default();

    for (idx, photo) in photos.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(
                "Quality pass cancelled after {} of {} photos",
                idx, total_photos
            );
            report.cancelled = true;
            break;
        }

        let result = match source.load(photo) {
            Ok(bytes) => analyze_encoded(&photo.file_name, &bytes, thresholds),
            Err(e) => {
                warn!("{}", e);
                QualityResult::undecodable()
            }
        };
        report.results.push((photo.id.clone(), result));

        let current_photo = idx + 1;
        if current_photo % PROGRESS_BATCH_SIZE == 0 && current_photo < total_photos {
            on_progress(progress(current_photo, total_photos));
        }
    }

    on_progress(progress(report.results.len(), total_photos));
    report
}

fn progress(current_photo: usize, total_photos: usize) -> QualityProgress {
    let percentage = if total_photos == 0 {
        100.0
    } else {
        (current_photo as f32 / total_photos as f32) * 100.0
    };
    QualityProgress {
        current_photo,
        total_photos,
        percentage,
    }
}

/// Attaches results to the matching photos by id. Returns how many were updated.
pub fn apply_quality_results(photos: &mut [PhotoRecord], results: &[(String, QualityResult)]) -> usize {
    let by_id: HashMap<&str, &QualityResult> =
        results.iter().map(|(id, r)| (id.as_str(), r)).collect();

    let mut updated = 0;
    for photo in photos.iter_mut() {
        if let Some(result) = by_id.get(photo.id.as_str()) {
            photo.quality = Some(**result);
            updated += 1;
        }
    }
    updated
}
