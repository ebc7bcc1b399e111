//! Configuration file handling for BrickForge
//!
//! Supports JSON and TOML files. Every section and field has a default, so a
//! config file only needs the values it changes.
//!
//! Configuration is organized into logical sections:
//! - Import (primitive resolution, gap policy)
//! - Library (LDraw parts library location)
//! - Steps (virtual step size)
//! - Export (weld, surface offset, scale, naming)
//! - Instructions (manual formats, camera, lighting)
//! - Logging (level, JSON output)

use crate::error::{SettingsError, SettingsResult};
use brickforge_core::ImportOptions;
use brickforge_export::ExportOptions;
use brickforge_manual::ManualOptions;
use brickforge_steps::StepOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// LDraw library location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root of the parts library; unset means model-relative lookups only
    pub path: Option<PathBuf>,
}

/// Build manual settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionSettings {
    /// Generate the manual on every run
    pub enabled: bool,
    #[serde(flatten)]
    pub manual: ManualOptions,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportOptions,
    pub library: LibrarySettings,
    pub steps: StepOptions,
    pub export: ExportOptions,
    pub instructions: InstructionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => Ok(Format::Json),
        "toml" => Ok(Format::Toml),
        _ => Err(SettingsError::UnsupportedFormat(extension)),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform location of the user config file
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("brickforge").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` when given, else the user config file when it exists,
    /// else the defaults
    ///
    /// Returns the file the config came from, if any.
    pub fn load_or_default(explicit: Option<&Path>) -> SettingsResult<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from_file(path)?, Some(path.to_path_buf())));
        }
        match Self::default_path() {
            Ok(path) if path.is_file() => {
                let config = Self::load_from_file(&path)?;
                Ok((config, Some(path)))
            }
            _ => Ok((Self::default(), None)),
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let gaps = &self.import.gaps;
        if !gaps.width_mm.is_finite() || gaps.width_mm < 0.0 {
            return Err(SettingsError::invalid("import.gaps.width_mm", "must be >= 0"));
        }

        if self.steps.batch_size == 0 {
            return Err(SettingsError::invalid("steps.batch_size", "must be > 0"));
        }

        let export = &self.export;
        if !export.weld_threshold.is_finite() || export.weld_threshold < 0.0 {
            return Err(SettingsError::invalid("export.weld_threshold", "must be >= 0"));
        }
        if !export.surface_offset.is_finite() {
            return Err(SettingsError::invalid("export.surface_offset", "must be finite"));
        }
        if !export.export_scale.is_finite() || export.export_scale <= 0.0 {
            return Err(SettingsError::invalid("export.export_scale", "must be > 0"));
        }
        let naming = &export.naming;
        if naming.extension.is_empty() || naming.extension.contains(['.', '/', '\\']) {
            return Err(SettingsError::invalid(
                "export.naming.extension",
                "must be a bare extension such as \"obj\"",
            ));
        }
        if naming.uncolored_bucket.trim().is_empty() {
            return Err(SettingsError::invalid(
                "export.naming.uncolored_bucket",
                "must not be empty",
            ));
        }
        if naming.fallback_name.trim().is_empty() {
            return Err(SettingsError::invalid(
                "export.naming.fallback_name",
                "must not be empty",
            ));
        }

        let manual = &self.instructions.manual;
        if manual.formats.is_empty() {
            return Err(SettingsError::invalid(
                "instructions.formats",
                "at least one format is required",
            ));
        }
        if manual.camera.width == 0 || manual.camera.height == 0 {
            return Err(SettingsError::invalid(
                "instructions.camera",
                "image dimensions must be > 0",
            ));
        }
        if !(0.0..0.5).contains(&manual.camera.margin) {
            return Err(SettingsError::invalid(
                "instructions.camera.margin",
                "must be in [0, 0.5)",
            ));
        }
        if !(0.0..=1.0).contains(&manual.lighting.ambient) {
            return Err(SettingsError::invalid(
                "instructions.lighting.ambient",
                "must be in [0, 1]",
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(SettingsError::invalid(
                "logging.level",
                format!("'{}' is not one of {}", self.logging.level, LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickforge_core::Resolution;
    use brickforge_manual::ManualFormat;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        config.validate().unwrap();
        assert_eq!(config.import.resolution, Resolution::High);
        assert_eq!(config.steps.batch_size, 5);
        assert_eq!(config.export.export_scale, 1000.0);
        assert!(!config.instructions.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
[import]
resolution = "low"

[steps]
batch_size = 3

[instructions]
enabled = true
formats = ["pdf"]

[instructions.camera]
width = 400
"#,
        )
        .unwrap();
        assert_eq!(config.import.resolution, Resolution::Low);
        assert!(config.import.gaps.enabled);
        assert_eq!(config.steps.batch_size, 3);
        assert!(config.instructions.enabled);
        assert_eq!(config.instructions.manual.formats, vec![ManualFormat::Pdf]);
        assert_eq!(config.instructions.manual.camera.width, 400);
        assert_eq!(config.instructions.manual.camera.height, 600);
        assert_eq!(config.export.naming.variant_suffix, "_s");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::new();
        config.steps.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { ref key, .. }) if key == "steps.batch_size"
        ));

        let mut config = Config::new();
        config.export.export_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.export.naming.extension = ".obj".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = Config::new();
        config.logging.level = "DEBUG".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "steps: {}").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(SettingsError::UnsupportedFormat(ref ext)) if ext == "yaml"
        ));
    }
}
