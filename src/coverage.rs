//! Covered ground area and mean ground speed.

use crate::geo::{distance, project_to_plane};
use crate::photo::PhotoRecord;

/// Consecutive shots further apart in time than this are a pause, not flight.
pub const MAX_SPEED_GAP_MS: i64 = 60_000;

/// Area in square meters of the camera-position bounding box, grown by the margins.
///
/// `margin_x`/`margin_y` are added to the box width and height, typically the
/// footprint size so the result covers whole images rather than just centers.
/// Needs at least three photos, otherwise 0.
pub fn bounding_area(photos: &[PhotoRecord], margin_x: f64, margin_y: f64) -> f64 {
    if photos.len() < 3 {
        return 0.0;
    }

    let origin = photos[0].position();
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);

    for photo in photos {
        let p = project_to_plane(origin, photo.position());
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    (max_x - min_x + margin_x) * (max_y - min_y + margin_y)
}

/// Mean ground speed in m/s, taking consecutive shots in capture order.
///
/// Input order does not matter; photos sharing a timestamp keep their input
/// order. Only pairs with `0 < Δt < 60 s` count, which drops clock jumps and
/// pauses. Returns 0 when no pair qualifies.
pub fn average_speed(photos: &[PhotoRecord]) -> f64 {
    let mut order: Vec<&PhotoRecord> = photos.iter().collect();
    order.sort_by_key(|p| p.timestamp_ms);

    let mut total_distance = 0.0;
    let mut total_ms: i64 = 0;

    for pair in order.windows(2) {
        let dt = pair[1].timestamp_ms - pair[0].timestamp_ms;
        if dt <= 0 || dt >= MAX_SPEED_GAP_MS {
            continue;
        }
        total_distance += distance(pair[0].position(), pair[1].position());
        total_ms += dt;
    }

    if total_ms == 0 {
        0.0
    } else {
        total_distance / (total_ms as f64 / 1000.0)
    }
}
