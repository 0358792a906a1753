//! Flight-level QC metrics computed from a photo collection.
//!
//! [`compute_flight_metrics`] is a pure function of its inputs: it sorts a
//! private copy of the photos by capture time and never touches the caller's
//! records, so running it twice on the same inputs yields identical results.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::coverage::{average_speed, bounding_area, MAX_SPEED_GAP_MS};
use crate::curvature::analyze_curvature;
use crate::drone::DroneProfile;
use crate::footprint::Footprint;
use crate::overlap::estimate_with_footprint;
use crate::photo::{sorted_by_time, PhotoRecord, RtkStatus};
use crate::stats::{mean, Stats};

/// Reported as `rtk_fixed_ratio` when no photo carries an RTK status.
pub const NO_RTK_DATA: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsOptions {
    /// Use the stricter turn threshold for curvature.
    pub exclude_turns: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtkCounts {
    pub fixed: usize,
    pub float: usize,
    pub single: usize,
    pub none: usize,
    /// Photos the RTK log did not cover.
    pub unannotated: usize,
}

impl RtkCounts {
    pub fn annotated(&self) -> usize {
        self.fixed + self.float + self.single + self.none
    }
}

/// Immutable snapshot of everything the QC report needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightMetrics {
    pub photo_count: usize,

    pub altitude: Stats,
    /// Present when at least one photo carries a relative altitude.
    pub relative_altitude: Option<Stats>,

    pub forward_overlap: f64,
    pub side_overlap: f64,

    pub design_height_m: f64,
    pub gsd_cm: f64,
    pub footprint_width_m: f64,
    pub footprint_height_m: f64,

    pub coverage_area_m2: f64,
    pub coverage_area_ha: f64,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_s: f64,
    pub avg_shot_interval_s: f64,
    pub average_speed_mps: f64,

    pub curvature_avg: f64,
    pub curvature_max: f64,
    pub curvature_max_photo_name: Option<String>,

    /// Percent of annotated photos with a Fixed solution, or [`NO_RTK_DATA`].
    pub rtk_fixed_ratio: f64,
    pub rtk_counts: RtkCounts,
    pub gps_accuracy_mean: Option<f64>,

    pub analyzed_count: usize,
    pub blurry_count: usize,
    pub overexposed_count: usize,

    /// Ground elevation under each shot (absolute minus relative altitude).
    pub terrain_elevation: Option<Stats>,
    pub terrain_elevation_range_m: Option<f64>,
}

impl Default for FlightMetrics {
    /// Metrics of an empty flight.
    fn default() -> Self {
        Self {
            photo_count: 0,
            altitude: Stats::default(),
            relative_altitude: None,
            forward_overlap: 0.0,
            side_overlap: 0.0,
            design_height_m: 0.0,
            gsd_cm: 0.0,
            footprint_width_m: 0.0,
            footprint_height_m: 0.0,
            coverage_area_m2: 0.0,
            coverage_area_ha: 0.0,
            start_time: None,
            end_time: None,
            duration_s: 0.0,
            avg_shot_interval_s: 0.0,
            average_speed_mps: 0.0,
            curvature_avg: 0.0,
            curvature_max: 0.0,
            curvature_max_photo_name: None,
            rtk_fixed_ratio: NO_RTK_DATA,
            rtk_counts: RtkCounts::default(),
            gps_accuracy_mean: None,
            analyzed_count: 0,
            blurry_count: 0,
            overexposed_count: 0,
            terrain_elevation: None,
            terrain_elevation_range_m: None,
        }
    }
}

/// Derives [`FlightMetrics`] for `photos` taken by `drone` at `design_height_m` above ground.
///
/// Photos with non-finite coordinates are left out. Each metric falls back to
/// its documented default when there are too few photos for it.
pub fn compute_flight_metrics(
    photos: &[PhotoRecord],
    drone: &DroneProfile,
    design_height_m: f64,
    options: &MetricsOptions,
) -> FlightMetrics {
    let mut sorted = sorted_by_time(photos);
    let before = sorted.len();
    sorted.retain(|p| p.position().is_finite());
    if sorted.len() < before {
        warn!(
            "Ignoring {} photos with invalid coordinates",
            before - sorted.len()
        );
    }

    let footprint = Footprint::new(drone, design_height_m);
    let overlap = estimate_with_footprint(&sorted, &footprint);
    let curvature = analyze_curvature(&sorted, options.exclude_turns);
    let coverage_area_m2 = bounding_area(&sorted, footprint.width_m, footprint.height_m);

    let altitudes: Vec<f64> = sorted.iter().map(|p| p.altitude).collect();
    let relative: Vec<f64> = sorted.iter().filter_map(|p| p.relative_altitude).collect();
    let terrain: Vec<f64> = sorted
        .iter()
        .filter_map(|p| p.relative_altitude.map(|rel| p.altitude - rel))
        .collect();
    let terrain_elevation = non_empty_stats(&terrain);

    let accuracies: Vec<f64> = sorted.iter().filter_map(|p| p.gps_accuracy).collect();

    let (start_ms, end_ms) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (Some(first.timestamp_ms), Some(last.timestamp_ms)),
        _ => (None, None),
    };
    let duration_s = match (start_ms, end_ms) {
        (Some(start), Some(end)) => (end - start) as f64 / 1000.0,
        _ => 0.0,
    };

    let rtk_counts = count_rtk(&sorted);
    let quality: Vec<_> = sorted.iter().filter_map(|p| p.quality).collect();

    let metrics = FlightMetrics {
        photo_count: sorted.len(),
        altitude: Stats::from_values(&altitudes),
        relative_altitude: non_empty_stats(&relative),
        forward_overlap: overlap.forward,
        side_overlap: overlap.side,
        design_height_m,
        gsd_cm: footprint.gsd_cm,
        footprint_width_m: footprint.width_m,
        footprint_height_m: footprint.height_m,
        coverage_area_m2,
        coverage_area_ha: coverage_area_m2 / 10_000.0,
        start_time: start_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
        end_time: end_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
        duration_s,
        avg_shot_interval_s: average_shot_interval(&sorted),
        average_speed_mps: average_speed(&sorted),
        curvature_avg: curvature.avg,
        curvature_max: curvature.max,
        curvature_max_photo_name: curvature.max_photo_name,
        rtk_fixed_ratio: fixed_ratio(&rtk_counts),
        rtk_counts,
        gps_accuracy_mean: (!accuracies.is_empty()).then(|| mean(&accuracies)),
        analyzed_count: quality.iter().filter(|q| q.analyzed).count(),
        blurry_count: quality.iter().filter(|q| q.analyzed && q.is_blurry).count(),
        overexposed_count: quality
            .iter()
            .filter(|q| q.analyzed && q.is_overexposed)
            .count(),
        terrain_elevation_range_m: terrain_elevation.map(|s| s.range()),
        terrain_elevation,
    };

    debug!(
        "Computed metrics for {} photos: forward {:.1}%, side {:.1}%, area {:.2} ha",
        metrics.photo_count,
        metrics.forward_overlap,
        metrics.side_overlap,
        metrics.coverage_area_ha
    );
    metrics
}

fn non_empty_stats(values: &[f64]) -> Option<Stats> {
    (!values.is_empty()).then(|| Stats::from_values(values))
}

fn count_rtk(photos: &[PhotoRecord]) -> RtkCounts {
    let mut counts = RtkCounts::default();
    for photo in photos {
        match photo.rtk_status {
            Some(RtkStatus::Fixed) => counts.fixed += 1,
            Some(RtkStatus::Float) => counts.float += 1,
            Some(RtkStatus::Single) => counts.single += 1,
            Some(RtkStatus::None) => counts.none += 1,
            None => counts.unannotated += 1,
        }
    }
    counts
}

fn fixed_ratio(counts: &RtkCounts) -> f64 {
    match counts.annotated() {
        0 => NO_RTK_DATA,
        n => counts.fixed as f64 / n as f64 * 100.0,
    }
}

/// Mean time between consecutive shots, ignoring pauses and duplicate timestamps.
fn average_shot_interval(photos: &[PhotoRecord]) -> f64 {
    let intervals: Vec<f64> = photos
        .windows(2)
        .map(|pair| pair[1].timestamp_ms - pair[0].timestamp_ms)
        .filter(|&dt| dt > 0 && dt < MAX_SPEED_GAP_MS)
        .map(|dt| dt as f64 / 1000.0)
        .collect();
    mean(&intervals)
}
