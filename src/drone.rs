use serde::{Deserialize, Serialize};

/// Camera geometry of a survey drone. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneProfile {
    pub name: String,
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    pub focal_length_mm: f64,
}

impl DroneProfile {
    pub fn new(
        name: impl Into<String>,
        sensor_width_mm: f64,
        sensor_height_mm: f64,
        focal_length_mm: f64,
    ) -> Self {
        Self {
            name: name.into(),
            sensor_width_mm,
            sensor_height_mm,
            focal_length_mm,
        }
    }
}

/// Built-in presets, used when the settings file does not override them.
pub fn default_presets() -> Vec<DroneProfile> {
    vec![
        DroneProfile::new("DJI Phantom 4 RTK", 13.2, 8.8, 8.8),
        DroneProfile::new("DJI Mavic 3 Enterprise", 17.3, 13.0, 12.29),
        DroneProfile::new("DJI M300 + Zenmuse P1", 35.9, 24.0, 35.0),
    ]
}

/// Case-insensitive lookup by preset name.
pub fn find_preset<'a>(presets: &'a [DroneProfile], name: &str) -> Option<&'a DroneProfile> {
    presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset_ignores_case() {
        let presets = default_presets();
        let found = find_preset(&presets, "dji phantom 4 rtk").unwrap();
        assert_eq!(found.focal_length_mm, 8.8);
        assert!(find_preset(&presets, "Unknown").is_none());
    }
}
