//! Accept/reject classification of a flight from its metrics.

use serde::{Deserialize, Serialize};

use crate::metrics::{FlightMetrics, NO_RTK_DATA};

/// Limits a flight must meet to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceptanceThresholds {
    pub min_forward_overlap: f64,
    pub min_side_overlap: f64,
    /// Standard deviation of absolute altitude, meters.
    pub max_altitude_std_dev_m: f64,
    pub max_curvature_deg: f64,
    /// Percent of annotated photos with a Fixed solution.
    pub min_rtk_fixed_ratio: f64,
    /// Percent of analyzed photos.
    pub max_blurry_percent: f64,
    /// Percent of analyzed photos.
    pub max_overexposed_percent: f64,
    /// A value missing its limit by at most this fraction is a warning, not a failure.
    pub warn_margin: f64,
}

impl Default for AcceptanceThresholds {
    fn default() -> Self {
        Self {
            min_forward_overlap: 75.0,
            min_side_overlap: 60.0,
            max_altitude_std_dev_m: 5.0,
            max_curvature_deg: 8.0,
            min_rtk_fixed_ratio: 95.0,
            max_blurry_percent: 5.0,
            max_overexposed_percent: 5.0,
            warn_margin: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    Pass,
    Warn,
    Fail,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckKind {
    ForwardOverlap,
    SideOverlap,
    AltitudeStability,
    FlightLineCurvature,
    RtkFixedRatio,
    BlurryPhotos,
    OverexposedPhotos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcCheck {
    pub kind: CheckKind,
    pub outcome: CheckOutcome,
    pub value: Option<f64>,
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightAssessment {
    pub checks: Vec<QcCheck>,
    /// True when no check failed.
    pub accepted: bool,
}

impl FlightAssessment {
    pub fn check(&self, kind: CheckKind) -> Option<&QcCheck> {
        self.checks.iter().find(|c| c.kind == kind)
    }
}

/// Grades `metrics` against `limits`.
///
/// Checks whose inputs are missing (too few photos, no RTK log, no quality
/// pass) are reported as [`CheckOutcome::NoData`] and do not reject the flight.
pub fn assess(metrics: &FlightMetrics, limits: &AcceptanceThresholds) -> FlightAssessment {
    let has_pairs = metrics.photo_count >= 2;
    let has_triples = metrics.photo_count >= 3;

    let blurry_pct = percent_of(metrics.blurry_count, metrics.analyzed_count);
    let overexposed_pct = percent_of(metrics.overexposed_count, metrics.analyzed_count);
    let rtk = (metrics.rtk_fixed_ratio != NO_RTK_DATA).then_some(metrics.rtk_fixed_ratio);

    let checks = vec![
        at_least(
            CheckKind::ForwardOverlap,
            has_pairs.then_some(metrics.forward_overlap),
            limits.min_forward_overlap,
            limits.warn_margin,
        ),
        at_least(
            CheckKind::SideOverlap,
            (has_pairs && metrics.side_overlap > 0.0).then_some(metrics.side_overlap),
            limits.min_side_overlap,
            limits.warn_margin,
        ),
        at_most(
            CheckKind::AltitudeStability,
            has_pairs.then_some(metrics.altitude.std_dev),
            limits.max_altitude_std_dev_m,
            limits.warn_margin,
        ),
        at_most(
            CheckKind::FlightLineCurvature,
            has_triples.then_some(metrics.curvature_max),
            limits.max_curvature_deg,
            limits.warn_margin,
        ),
        at_least(
            CheckKind::RtkFixedRatio,
            rtk,
            limits.min_rtk_fixed_ratio,
            limits.warn_margin,
        ),
        at_most(
            CheckKind::BlurryPhotos,
            blurry_pct,
            limits.max_blurry_percent,
            limits.warn_margin,
        ),
        at_most(
            CheckKind::OverexposedPhotos,
            overexposed_pct,
            limits.max_overexposed_percent,
            limits.warn_margin,
        ),
    ];

    let accepted = checks.iter().all(|c| c.outcome != CheckOutcome::Fail);
    FlightAssessment { checks, accepted }
}

fn percent_of(count: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| count as f64 / total as f64 * 100.0)
}

fn at_least(kind: CheckKind, value: Option<f64>, limit: f64, margin: f64) -> QcCheck {
    let outcome = match value {
        None => CheckOutcome::NoData,
        Some(v) if v >= limit => CheckOutcome::Pass,
        Some(v) if v >= limit * (1.0 - margin) => CheckOutcome::Warn,
        Some(_) => CheckOutcome::Fail,
    };
    QcCheck {
        kind,
        outcome,
        value,
        limit,
    }
}

fn at_most(kind: CheckKind, value: Option<f64>, limit: f64, margin: f64) -> QcCheck {
    let outcome = match value {
        None => CheckOutcome::NoData,
        Some(v) if v <= limit => CheckOutcome::Pass,
        Some(v) if v <= limit * (1.0 + margin) => CheckOutcome::Warn,
        Some(_) => CheckOutcome::Fail,
    };
    QcCheck {
        kind,
        outcome,
        value,
        limit,
    }
}
