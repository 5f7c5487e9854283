//! Configuration for kerfnest
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats.
//!
//! Configuration is organized into logical sections:
//! - Import settings (chaining and curve flattening)
//! - Kerf settings (cut width and lead lengths)
//! - Nesting settings (search steps and tolerances)
//! - Material settings (sheet origin and size)

use crate::error::{ConfigError, SettingsError, SettingsResult};
use kerfnest_camtools::geometry::Point2D;
use kerfnest_camtools::import::ImportParameters;
use kerfnest_camtools::nesting::NestingParameters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Drawing import settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Endpoint distance within which segments join, mm
    pub chain_tolerance: f64,
    /// Samples per arc before simplification
    pub arc_segments: usize,
    /// Simplification tolerance for flattened curves, mm
    pub spline_tolerance: f64,
    /// Subdivision limit for spline sampling
    pub spline_max_depth: u32,
    /// Scale applied on top of the drawing's units
    pub import_scale: f64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        let params = ImportParameters::default();
        Self {
            chain_tolerance: params.chain_tolerance,
            arc_segments: params.arc_segments,
            spline_tolerance: params.spline_tolerance,
            spline_max_depth: params.spline_max_depth,
            import_scale: params.import_scale,
        }
    }
}

/// Cutting kerf settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KerfSettings {
    /// Full cut width, mm
    pub kerf_width: f64,
    pub lead_in_length: f64,
    pub lead_out_length: f64,
}

impl Default for KerfSettings {
    fn default() -> Self {
        Self {
            kerf_width: 1.5,
            lead_in_length: 0.0,
            lead_out_length: 0.0,
        }
    }
}

/// Nesting search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestingSettings {
    pub rotation_increment_deg: f64,
    pub translation_step_x: f64,
    pub translation_step_y: f64,
    pub closed_tolerance: f64,
    pub simplify_tolerance: f64,
    pub steps_per_tick: usize,
    pub offset_arc_segments: usize,
}

impl Default for NestingSettings {
    fn default() -> Self {
        let params = NestingParameters::default();
        Self {
            rotation_increment_deg: params.rotation_increment_deg,
            translation_step_x: params.translation_step.x,
            translation_step_y: params.translation_step.y,
            closed_tolerance: params.closed_tolerance,
            simplify_tolerance: params.simplify_tolerance,
            steps_per_tick: params.steps_per_tick,
            offset_arc_segments: params.offset_arc_segments,
        }
    }
}

/// Sheet material settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width: 1000.0,
            height: 1000.0,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub import: ImportSettings,
    pub kerf: KerfSettings,
    pub nesting: NestingSettings,
    pub material: MaterialSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("none").to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-user config file location, `<config dir>/kerfnest/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("kerfnest").join("config.toml"))
            .ok_or_else(|| ConfigError::NoConfigDirectory.into())
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the file at `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        fn positive(key: &str, value: f64) -> SettingsResult<()> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::InvalidSetting {
                    key: key.to_string(),
                    reason: format!("must be > 0, got {}", value),
                })
            }
        }
        fn non_negative(key: &str, value: f64) -> SettingsResult<()> {
            if value >= 0.0 {
                Ok(())
            } else {
                Err(SettingsError::InvalidSetting {
                    key: key.to_string(),
                    reason: format!("must not be negative, got {}", value),
                })
            }
        }

        // Validate import settings
        positive("import.chain_tolerance", self.import.chain_tolerance)?;
        non_negative("import.spline_tolerance", self.import.spline_tolerance)?;
        positive("import.import_scale", self.import.import_scale)?;
        if self.import.arc_segments == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "import.arc_segments".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        // Validate kerf settings
        non_negative("kerf.kerf_width", self.kerf.kerf_width)?;
        non_negative("kerf.lead_in_length", self.kerf.lead_in_length)?;
        non_negative("kerf.lead_out_length", self.kerf.lead_out_length)?;

        // Validate nesting settings
        let increment = self.nesting.rotation_increment_deg;
        if !(increment > 0.0 && increment <= 360.0) {
            return Err(ConfigError::ValueOutOfRange {
                key: "nesting.rotation_increment_deg".to_string(),
                value: increment.to_string(),
            }
            .into());
        }
        positive("nesting.translation_step_x", self.nesting.translation_step_x)?;
        positive("nesting.translation_step_y", self.nesting.translation_step_y)?;
        non_negative("nesting.closed_tolerance", self.nesting.closed_tolerance)?;
        non_negative("nesting.simplify_tolerance", self.nesting.simplify_tolerance)?;
        if self.nesting.steps_per_tick == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "nesting.steps_per_tick".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        // Validate material
        positive("material.width", self.material.width)?;
        positive("material.height", self.material.height)?;

        Ok(())
    }

    pub fn import_parameters(&self) -> ImportParameters {
        ImportParameters {
            chain_tolerance: self.import.chain_tolerance,
            arc_segments: self.import.arc_segments,
            spline_tolerance: self.import.spline_tolerance,
            spline_max_depth: self.import.spline_max_depth,
            import_scale: self.import.import_scale,
        }
    }

    pub fn nesting_parameters(&self) -> NestingParameters {
        let origin = Point2D::new(self.material.origin_x, self.material.origin_y);
        NestingParameters {
            material_min: origin,
            material_max: origin.translated(self.material.width, self.material.height),
            rotation_increment_deg: self.nesting.rotation_increment_deg,
            translation_step: Point2D::new(
                self.nesting.translation_step_x,
                self.nesting.translation_step_y,
            ),
            kerf_width: self.kerf.kerf_width,
            closed_tolerance: self.nesting.closed_tolerance,
            simplify_tolerance: self.nesting.simplify_tolerance,
            steps_per_tick: self.nesting.steps_per_tick,
            offset_arc_segments: self.nesting.offset_arc_segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_nesting_parameters_follow_material() {
        let mut config = Config::default();
        config.material.origin_x = 10.0;
        config.material.width = 500.0;
        let params = config.nesting_parameters();
        assert_eq!(params.material_min.x, 10.0);
        assert_eq!(params.material_max.x, 510.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_rotation_increment() {
        let mut config = Config::default();
        config.nesting.rotation_increment_deg = 400.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_rejects_negative_kerf() {
        let mut config = Config::default();
        config.kerf.kerf_width = -1.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[kerf]\nkerf_width = 0.2\n").unwrap();
        assert_eq!(config.kerf.kerf_width, 0.2);
        assert_eq!(config.material, MaterialSettings::default());
    }
}
