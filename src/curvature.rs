//! Flight-line straightness from heading changes between consecutive legs.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo::{angle_difference, bearing, distance};
use crate::photo::PhotoRecord;

/// Legs shorter than this are hover noise and carry no usable heading.
pub const MIN_SEGMENT_M: f64 = 5.0;
/// Deviations at or above this are treated as deliberate turns.
pub const DEFAULT_TURN_THRESHOLD_DEG: f64 = 20.0;
/// Stricter turn threshold used when turns are explicitly excluded.
pub const EXCLUDE_TURNS_THRESHOLD_DEG: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curvature {
    /// Mean heading deviation in degrees.
    pub avg: f64,
    /// Largest heading deviation in degrees.
    pub max: f64,
    /// Photo at the vertex of the largest deviation; `None` when every
    /// qualifying leg is perfectly straight.
    pub max_photo_name: Option<String>,
}

pub fn turn_threshold(exclude_turns: bool) -> f64 {
    if exclude_turns {
        EXCLUDE_TURNS_THRESHOLD_DEG
    } else {
        DEFAULT_TURN_THRESHOLD_DEG
    }
}

/// Deviations at or above `threshold` are deliberate turns, not drift.
fn is_drift(deviation: f64, threshold: f64) -> bool {
    deviation < threshold
}

/// Heading deviation statistics along a time-ordered photo sequence.
///
/// Returns the zero value when fewer than three photos are given or when no
/// triple has two legs longer than [`MIN_SEGMENT_M`] below the turn threshold.
pub fn analyze_curvature(photos: &[PhotoRecord], exclude_turns: bool) -> Curvature {
    if photos.len() < 3 {
        return Curvature::default();
    }

    let threshold = turn_threshold(exclude_turns);
    let mut total = 0.0;
    let mut count = 0usize;
    let mut max = 0.0;
    let mut max_photo_name: Option<&str> = None;

    for triple in photos.windows(3) {
        let (p1, p2, p3) = (
            triple[0].position(),
            triple[1].position(),
            triple[2].position(),
        );
        if distance(p1, p2) <= MIN_SEGMENT_M || distance(p2, p3) <= MIN_SEGMENT_M {
            continue;
        }

        let deviation = angle_difference(bearing(p1, p2), bearing(p2, p3));
        if !is_drift(deviation, threshold) {
            continue;
        }

        total += deviation;
        count += 1;
        if deviation > max {
            max = deviation;
            max_photo_name = Some(triple[1].file_name.as_str());
        }
    }

    debug!(
        "curvature: {} qualifying triples (threshold {}°)",
        count, threshold
    );

    if count == 0 {
        return Curvature::default();
    }

    Curvature {
        avg: total / count as f64,
        max,
        max_photo_name: max_photo_name.map(str::to_string),
    }
}
