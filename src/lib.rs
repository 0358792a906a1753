pub mod assessment;
pub mod coverage;
pub mod curvature;
pub mod drone;
pub mod error;
pub mod footprint;
pub mod geo;
pub mod metrics;
pub mod overlap;
pub mod photo;
pub mod quality;
pub mod settings;
pub mod sharpness;
pub mod stats;
pub mod telemetry;

pub use assessment::{assess, AcceptanceThresholds, CheckKind, CheckOutcome, FlightAssessment};
pub use drone::DroneProfile;
pub use error::{QcError, Result};
pub use metrics::{compute_flight_metrics, FlightMetrics, MetricsOptions};
pub use photo::{PhotoRecord, QualityResult, RtkStatus};
pub use quality::{run_quality_pass, CancellationToken, PixelSource, QualityProgress};
pub use settings::QcSettings;
pub use telemetry::{apply_rtk_statuses, RtkLogParser};
