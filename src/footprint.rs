use serde::{Deserialize, Serialize};

use crate::drone::DroneProfile;

/// Assumed sensor pixel width. Photos do not carry their real pixel
/// dimensions here, so GSD is an approximation against this reference.
pub const REFERENCE_PIXEL_WIDTH: f64 = 5472.0;

/// Ground coverage of a single nadir image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footprint {
    /// Across-track extent in meters.
    pub width_m: f64,
    /// Along-track extent in meters.
    pub height_m: f64,
    /// Ground sample distance, cm per pixel, rounded to two decimals.
    pub gsd_cm: f64,
}

impl Footprint {
    /// Pinhole footprint of `drone` flown `height_m` above ground.
    pub fn new(drone: &DroneProfile, height_m: f64) -> Self {
        let scale = height_m / drone.focal_length_mm;
        let gsd = (drone.sensor_width_mm / REFERENCE_PIXEL_WIDTH) * scale * 100.0;

        Self {
            width_m: drone.sensor_width_mm * scale,
            height_m: drone.sensor_height_mm * scale,
            gsd_cm: (gsd * 100.0).round() / 100.0,
        }
    }
}
