//! Forward and side overlap estimation from camera positions.
//!
//! Both estimators take photos already ordered by capture time.
//!
//! The side search compares every photo with every other one, so it is
//! O(n²) in photo count. That is fine for hundreds to low thousands of
//! images; bucketing candidates by position would remove the quadratic term
//! but must keep the exact acceptance rules below.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::drone::DroneProfile;
use crate::footprint::Footprint;
use crate::geo::{angle_difference, bearing, distance};
use crate::photo::PhotoRecord;

/// Photos closer than this in capture order are treated as the same strip.
pub const MIN_SEQUENCE_GAP: usize = 20;
/// Side candidates must lie within this many footprint widths.
pub const SIDE_RANGE_FACTOR: f64 = 3.0;
/// Consecutive photos further apart than this many footprint heights mark a strip break.
pub const STRIP_BREAK_FACTOR: f64 = 2.0;
const PERPENDICULAR_MIN_DEG: f64 = 45.0;
const PERPENDICULAR_MAX_DEG: f64 = 135.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlap {
    /// Along-track overlap in percent.
    pub forward: f64,
    /// Across-track overlap in percent.
    pub side: f64,
}

/// Estimates both overlaps for `drone` flown at `height_m`.
pub fn estimate_overlap(photos: &[PhotoRecord], drone: &DroneProfile, height_m: f64) -> Overlap {
    let footprint = Footprint::new(drone, height_m);
    estimate_with_footprint(photos, &footprint)
}

pub fn estimate_with_footprint(photos: &[PhotoRecord], footprint: &Footprint) -> Overlap {
    if photos.len() < 2 || !usable(footprint) {
        return Overlap::default();
    }

    Overlap {
        forward: forward_overlap(photos, footprint.height_m),
        side: side_overlap(photos, footprint.width_m),
    }
}

fn usable(footprint: &Footprint) -> bool {
    footprint.width_m.is_finite()
        && footprint.height_m.is_finite()
        && footprint.width_m > 0.0
        && footprint.height_m > 0.0
}

/// Mean overlap between consecutive shots.
///
/// Pairs at least two footprint heights apart are skipped entirely rather
/// than counted as zero overlap: they are jumps between strips.
pub fn forward_overlap(photos: &[PhotoRecord], ground_height: f64) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;

    for pair in photos.windows(2) {
        let d = distance(pair[0].position(), pair[1].position());
        if d >= STRIP_BREAK_FACTOR * ground_height {
            continue;
        }
        total += ((1.0 - d / ground_height) * 100.0).max(0.0);
        count += 1;
    }

    debug!(
        "forward overlap: {} of {} pairs contribute",
        count,
        photos.len().saturating_sub(1)
    );

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Mean overlap with the nearest photo on an adjacent strip.
///
/// Photos that find no neighbour roughly perpendicular to their heading do
/// not contribute to the average.
pub fn side_overlap(photos: &[PhotoRecord], ground_width: f64) -> f64 {
    if photos.len() < 2 {
        return 0.0;
    }

    // Collect first so the sum below runs in a fixed order.
    let per_photo: Vec<Option<f64>> = (0..photos.len())
        .into_par_iter()
        .map(|i| {
            nearest_side_neighbor(photos, i, ground_width)
                .map(|d| ((1.0 - d / ground_width) * 100.0).clamp(0.0, 100.0))
        })
        .collect();

    let found: Vec<f64> = per_photo.into_iter().flatten().collect();
    debug!(
        "side overlap: {} of {} photos found an adjacent strip",
        found.len(),
        photos.len()
    );

    if found.is_empty() {
        0.0
    } else {
        found.iter().sum::<f64>() / found.len() as f64
    }
}

/// Heading at photo `i`: towards its successor, or from its predecessor for the last photo.
fn local_heading(photos: &[PhotoRecord], i: usize) -> f64 {
    if i + 1 < photos.len() {
        bearing(photos[i].position(), photos[i + 1].position())
    } else {
        bearing(photos[i - 1].position(), photos[i].position())
    }
}

/// True when a candidate `diff` degrees off the heading lies on an adjacent
/// strip. Both bounds are exclusive.
fn is_abeam(diff: f64) -> bool {
    diff > PERPENDICULAR_MIN_DEG && diff < PERPENDICULAR_MAX_DEG
}

fn nearest_side_neighbor(photos: &[PhotoRecord], i: usize, ground_width: f64) -> Option<f64> {
    let origin = photos[i].position();
    let heading = local_heading(photos, i);
    let max_range = SIDE_RANGE_FACTOR * ground_width;

    let mut min_dist: Option<f64> = None;
    for (j, other) in photos.iter().enumerate() {
        if i.abs_diff(j) < MIN_SEQUENCE_GAP {
            continue;
        }

        let d = distance(origin, other.position());
        if d > max_range {
            continue;
        }

        let diff = angle_difference(bearing(origin, other.position()), heading);
        if !is_abeam(diff) {
            continue;
        }

        if min_dist.map_or(true, |m| d < m) {
            min_dist = Some(d);
        }
    }

    min_dist
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const LAT0: f64 = 47.0;
    const LNG0: f64 = 8.0;

    /// Meters per degree of latitude on the haversine sphere.
    fn m_per_deg_lat() -> f64 {
        distance(
            crate::geo::GeoPoint::new(LAT0, LNG0),
            crate::geo::GeoPoint::new(LAT0 + 1.0, LNG0),
        )
    }

    fn m_per_deg_lng() -> f64 {
        distance(
            crate::geo::GeoPoint::new(LAT0, LNG0),
            crate::geo::GeoPoint::new(LAT0, LNG0 + 0.001),
        ) / 0.001
    }

    /// Survey grid of `strips` north-south lines, `per_strip` shots each,
    /// `spacing` meters along track and `strip_gap` meters between strips.
    /// With `serpentine` every other strip is flown southbound.
    pub(crate) fn survey_grid(
        strips: usize,
        per_strip: usize,
        spacing: f64,
        strip_gap: f64,
        serpentine: bool,
    ) -> Vec<PhotoRecord> {
        let dlat = spacing / m_per_deg_lat();
        let dlng = strip_gap / m_per_deg_lng();
        let mut photos = Vec::new();
        let mut t = 1_700_000_000_000i64;
        for s in 0..strips {
            for k in 0..per_strip {
                let along = if !serpentine || s % 2 == 0 { k } else { per_strip - 1 - k };
                let n = photos.len();
                photos.push(PhotoRecord::new(
                    format!("p{}", n),
                    format!("IMG_{:04}.JPG", n),
                    LAT0 + along as f64 * dlat,
                    LNG0 + s as f64 * dlng,
                    500.0,
                    t,
                ));
                t += 2000;
            }
        }
        photos
    }

    fn footprint(width: f64, height: f64) -> Footprint {
        Footprint {
            width_m: width,
            height_m: height,
            gsd_cm: 1.0,
        }
    }

    #[test]
    fn test_fewer_than_two_photos_is_zero() {
        let photos = survey_grid(1, 1, 20.0, 50.0, true);
        assert_eq!(
            estimate_with_footprint(&photos, &footprint(150.0, 100.0)),
            Overlap::default()
        );
    }

    #[test]
    fn test_forward_overlap_regular_spacing() {
        let photos = survey_grid(1, 10, 20.0, 50.0, true);
        let fwd = forward_overlap(&photos, 100.0);
        assert!((fwd - 80.0).abs() < 0.01, "got {}", fwd);
    }

    #[test]
    fn test_forward_overlap_skips_strip_breaks() {
        let mut photos = survey_grid(1, 4, 20.0, 50.0, true);
        // A jump of ~1 km between shot 1 and 2 must not drag the average down.
        for p in photos.iter_mut().skip(2) {
            p.latitude += 0.01;
        }
        let fwd = forward_overlap(&photos, 100.0);
        assert!((fwd - 80.0).abs() < 0.01, "got {}", fwd);
    }

    #[test]
    fn test_forward_overlap_clamps_between_one_and_two_heights() {
        // 150 m apart with a 100 m footprint: included but clamped to zero.
        let photos = survey_grid(1, 2, 150.0, 50.0, true);
        assert_eq!(forward_overlap(&photos, 100.0), 0.0);
    }

    #[test]
    fn test_side_overlap_between_adjacent_strips() {
        // Strips flown in the same direction, 30 shots each, so the abreast
        // photo on the next strip is always 30 positions away in sequence.
        let photos = survey_grid(3, 30, 20.0, 60.0, false);
        let side = side_overlap(&photos, 150.0);
        assert!((side - 60.0).abs() < 0.5, "got {}", side);
    }

    #[test]
    fn test_side_overlap_serpentine_stays_plausible() {
        // Near the turns the abreast photo is too close in sequence, so some
        // photos settle for a diagonal or a farther strip.
        let photos = survey_grid(3, 30, 20.0, 60.0, true);
        let side = side_overlap(&photos, 150.0);
        assert!(side > 20.0 && side <= 60.5, "got {}", side);
    }

    #[test]
    fn test_side_overlap_single_strip_has_no_neighbours() {
        let photos = survey_grid(1, 60, 20.0, 60.0, true);
        assert_eq!(side_overlap(&photos, 150.0), 0.0);
    }

    #[test]
    fn test_overlaps_stay_within_bounds() {
        for (spacing, gap) in [(5.0, 10.0), (20.0, 60.0), (90.0, 140.0), (180.0, 400.0)] {
            let photos = survey_grid(3, 25, spacing, gap, true);
            let o = estimate_with_footprint(&photos, &footprint(150.0, 100.0));
            assert!((0.0..=100.0).contains(&o.forward), "forward {}", o.forward);
            assert!((0.0..=100.0).contains(&o.side), "side {}", o.side);
        }
    }

    #[test]
    fn test_estimate_from_drone_profile() {
        // Phantom 4 RTK at 100 m: 150 m x 100 m footprint.
        let drone = DroneProfile::new("P4RTK", 13.2, 8.8, 8.8);
        let photos = survey_grid(2, 30, 25.0, 90.0, false);
        let o = estimate_overlap(&photos, &drone, 100.0);
        assert!((o.forward - 75.0).abs() < 0.01, "forward {}", o.forward);
        assert!((o.side - 40.0).abs() < 0.5, "side {}", o.side);
    }

    #[test]
    fn test_degenerate_footprint_is_zero() {
        let photos = survey_grid(2, 25, 20.0, 60.0, true);
        assert_eq!(
            estimate_with_footprint(&photos, &footprint(0.0, 0.0)),
            Overlap::default()
        );
    }

    /// A 25-shot northbound strip plus one photo `east_m` due east of the first shot.
    fn strip_with_abeam(east_m: f64) -> Vec<PhotoRecord> {
        let mut photos = survey_grid(1, 25, 20.0, 60.0, false);
        photos.push(PhotoRecord::new(
            "abeam",
            "IMG_ABEAM.JPG",
            LAT0,
            LNG0 + east_m / m_per_deg_lng(),
            500.0,
            1_800_000_000_000,
        ));
        photos
    }

    #[test]
    fn test_side_candidate_inside_range_is_accepted() {
        // 3 x 100 m footprint width = 300 m search radius.
        let photos = strip_with_abeam(299.5);
        let d = nearest_side_neighbor(&photos, 0, 100.0).unwrap();
        assert!((d - 299.5).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_side_candidate_beyond_range_is_ignored() {
        let photos = strip_with_abeam(300.5);
        assert_eq!(nearest_side_neighbor(&photos, 0, 100.0), None);
    }

    #[test]
    fn test_side_candidate_too_close_in_sequence_is_ignored() {
        let mut photos = strip_with_abeam(100.0);
        // Move the abeam shot right after the first one in capture order.
        let abeam = photos.pop().unwrap();
        photos.insert(5, abeam);
        assert_eq!(nearest_side_neighbor(&photos, 0, 100.0), None);
    }

    #[test]
    fn test_perpendicular_window_is_open() {
        assert!(!is_abeam(PERPENDICULAR_MIN_DEG));
        assert!(!is_abeam(PERPENDICULAR_MAX_DEG));
        assert!(is_abeam(45.001));
        assert!(is_abeam(90.0));
        assert!(is_abeam(134.999));
        assert!(!is_abeam(0.0));
        assert!(!is_abeam(180.0));
    }

    #[test]
    fn test_diagonal_candidate_at_window_edge_is_ignored() {
        // Bearing just under 45° from the heading, inside range.
        let mut photos = survey_grid(1, 25, 20.0, 60.0, false);
        let leg = 100.0 / 2f64.sqrt();
        photos.push(PhotoRecord::new(
            "diag",
            "IMG_DIAG.JPG",
            LAT0 + (leg * 1.01) / m_per_deg_lat(),
            LNG0 + leg / m_per_deg_lng(),
            500.0,
            1_800_000_000_000,
        ));
        assert_eq!(nearest_side_neighbor(&photos, 0, 100.0), None);
    }
}
