use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::assessment::AcceptanceThresholds;
use crate::drone::{default_presets, find_preset, DroneProfile};
use crate::error::{QcError, Result};
use crate::sharpness::QualityThresholds;

/// Analysis configuration: drone presets, defaults and thresholds.
///
/// Loaded once and handed to the engine read-only; the engine never writes
/// back into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QcSettings {
    pub drone_presets: Vec<DroneProfile>,
    pub default_drone: String,
    /// Design flight height above ground, meters.
    pub default_flight_height_m: f64,
    pub exclude_turns: bool,
    pub quality: QualityThresholds,
    pub acceptance: AcceptanceThresholds,
}

impl Default for QcSettings {
    fn default() -> Self {
        Self {
            drone_presets: default_presets(),
            default_drone: "DJI Phantom 4 RTK".to_string(),
            default_flight_height_m: 100.0,
            exclude_turns: false,
            quality: QualityThresholds::default(),
            acceptance: AcceptanceThresholds::default(),
        }
    }
}

impl QcSettings {
    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(QcError::NoConfigDir)?;
        let app_dir = config_dir.join("survey-qc");
        fs::create_dir_all(&app_dir).map_err(|source| QcError::Write {
            path: app_dir.clone(),
            source,
        })?;
        Ok(app_dir.join("settings.json"))
    }

    /// Load settings from the user config directory, writing defaults on first run.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;

        if !path.exists() {
            info!("No settings at {}, writing defaults", path.display());
            let settings = Self::default();
            settings.save_to(&path)?;
            return Ok(settings);
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| QcError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| QcError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn drone(&self, name: &str) -> Result<&DroneProfile> {
        find_preset(&self.drone_presets, name).ok_or_else(|| QcError::UnknownDrone(name.to_string()))
    }

    pub fn default_drone(&self) -> Result<&DroneProfile> {
        self.drone(&self.default_drone)
    }
}
