use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the ambient layers of the engine (settings, pixel access).
///
/// Metric computations never fail: they return documented defaults instead.
#[derive(Debug, Error)]
pub enum QcError {
    #[error("Failed to get config directory")]
    NoConfigDir,

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    SettingsFormat(#[from] serde_json::Error),

    #[error("Failed to decode image '{file_name}': {source}")]
    Decode {
        file_name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Unknown drone profile '{0}'")]
    UnknownDrone(String),
}

pub type Result<T> = std::result::Result<T, QcError>;
