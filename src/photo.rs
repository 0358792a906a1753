use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// GNSS fix tier parsed from an RTK log, highest confidence first.
///
/// `None` is a parsed tier ("no solution"). A photo the log never covered
/// carries `Option::None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RtkStatus {
    Fixed,
    Float,
    Single,
    None,
}

/// Sharpness and exposure verdict for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityResult {
    pub is_blurry: bool,
    /// Variance of the Laplacian response.
    pub blur_score: f64,
    pub is_overexposed: bool,
    /// Percentage of clipped pixels.
    pub exposure_score: f64,
    pub analyzed: bool,
}

impl QualityResult {
    /// Result used when pixels cannot be decoded. It never flags a defect.
    pub fn undecodable() -> Self {
        Self {
            is_blurry: false,
            blur_score: 1000.0,
            is_overexposed: false,
            exposure_score: 0.0,
            analyzed: true,
        }
    }
}

/// One captured survey image, as delivered by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: String,
    pub file_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Absolute altitude in meters.
    pub altitude: f64,
    /// Height above the take-off point, when the camera records it.
    #[serde(default)]
    pub relative_altitude: Option<f64>,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    #[serde(default)]
    pub gps_accuracy: Option<f64>,
    #[serde(default)]
    pub rtk_status: Option<RtkStatus>,
    #[serde(default)]
    pub quality: Option<QualityResult>,
}

impl PhotoRecord {
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            latitude,
            longitude,
            altitude,
            relative_altitude: None,
            timestamp_ms,
            gps_accuracy: None,
            rtk_status: None,
            quality: None,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Returns a copy of `photos` ordered by capture time.
///
/// The sort is stable so photos sharing a timestamp keep their input order.
pub fn sorted_by_time(photos: &[PhotoRecord]) -> Vec<PhotoRecord> {
    let mut sorted = photos.to_vec();
    sorted.sort_by_key(|p| p.timestamp_ms);
    sorted
}
