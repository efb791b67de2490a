//! Planner settings loader.
//!
//! Parses an INI-style settings file into a strongly-typed
//! [`PlannerSettings`] struct. Missing keys fall back to their defaults;
//! malformed values are errors.

use configparser::ini::Ini;
use std::path::Path;
use thiserror::Error;

/// Errors from reading or interpreting a settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Read(String),

    #[error("invalid value for key '{key}' in section [{section}]: {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

/// The planner-facing knobs of a print profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub travel_speed_mm_s: i64,
    pub retraction_minimum_distance_um: i64,
    pub always_retract: bool,
    pub minimum_layer_time_s: f64,
    pub minimum_printing_speed_mm_s: i64,
    pub fan_speed_percent: i64,
    /// Fan override while bridging; negative leaves the fan alone.
    pub bridge_fan_speed_percent: i64,
    pub merge_overlapping_lines: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            travel_speed_mm_s: 150,
            retraction_minimum_distance_um: 1_500,
            always_retract: false,
            minimum_layer_time_s: 5.0,
            minimum_printing_speed_mm_s: 10,
            fan_speed_percent: 100,
            bridge_fan_speed_percent: -1,
            merge_overlapping_lines: false,
        }
    }
}

impl PlannerSettings {
    /// Loads and parses the settings file at the given path.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let mut ini = Ini::new();
        ini.load(path).map_err(SettingsError::Read)?;
        Self::from_ini(&ini)
    }

    /// Parses settings from an in-memory string.
    pub fn load_str(content: &str) -> Result<Self, SettingsError> {
        let mut ini = Ini::new();
        ini.read(content.to_string()).map_err(SettingsError::Read)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        Ok(Self {
            travel_speed_mm_s: get_int(ini, "travel", "speed", defaults.travel_speed_mm_s)?,
            retraction_minimum_distance_um: get_int(
                ini,
                "retraction",
                "minimum_distance_um",
                defaults.retraction_minimum_distance_um,
            )?,
            always_retract: get_bool(ini, "retraction", "always", defaults.always_retract)?,
            minimum_layer_time_s: get_float(
                ini,
                "cooling",
                "minimum_layer_time",
                defaults.minimum_layer_time_s,
            )?,
            minimum_printing_speed_mm_s: get_int(
                ini,
                "cooling",
                "minimum_printing_speed",
                defaults.minimum_printing_speed_mm_s,
            )?,
            fan_speed_percent: get_int(ini, "cooling", "fan_speed_percent", defaults.fan_speed_percent)?,
            bridge_fan_speed_percent: get_int(
                ini,
                "cooling",
                "bridge_fan_speed_percent",
                defaults.bridge_fan_speed_percent,
            )?,
            merge_overlapping_lines: get_bool(
                ini,
                "walls",
                "merge_overlapping_lines",
                defaults.merge_overlapping_lines,
            )?,
        })
    }
}

fn get_int(ini: &Ini, section: &str, key: &str, default: i64) -> Result<i64, SettingsError> {
    ini.getint(section, key)
        .map_err(|message| SettingsError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message,
        })
        .map(|value| value.unwrap_or(default))
}

fn get_float(ini: &Ini, section: &str, key: &str, default: f64) -> Result<f64, SettingsError> {
    ini.getfloat(section, key)
        .map_err(|message| SettingsError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message,
        })
        .map(|value| value.unwrap_or(default))
}

fn get_bool(ini: &Ini, section: &str, key: &str, default: bool) -> Result<bool, SettingsError> {
    ini.getbool(section, key)
        .map_err(|message| SettingsError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message,
        })
        .map(|value| value.unwrap_or(default))
}
