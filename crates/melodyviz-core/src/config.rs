//! Visualizer configuration.
//!
//! Loaded from a TOML file; every field is optional and falls back to its
//! default. Command-line overrides are applied by the host on top.

use crate::color::ColorMode;
use crate::frame::VisualizationMode;
use crate::logging::LogConfig;
use crate::particles::DEFAULT_BASE_COUNT;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Accepted range for the base particle count
pub const PARTICLE_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=500;

/// Largest accepted explosion intensity
pub const MAX_EXPLOSION_INTENSITY: f32 = 5.0;

/// Accepted analyser window lengths (powers of two only)
pub const FFT_SIZE_RANGE: std::ops::RangeInclusive<usize> = 32..=32768;

/// Analyser node settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Window length in samples (power of two, 32..=32768)
    pub fft_size: usize,
    /// Weight of the previous frame in the magnitude average (0.0-1.0)
    pub smoothing_time_constant: f32,
    /// Level mapped to byte 0
    pub min_decibels: f32,
    /// Level mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Check ranges
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !FFT_SIZE_RANGE.contains(&self.fft_size) {
            return Err(CoreError::InvalidConfig(format!(
                "fft_size must be a power of two in 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(CoreError::InvalidConfig(format!(
                "smoothing_time_constant must be in 0.0..=1.0, got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(CoreError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Top-level visualizer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Which visual layers are active
    pub visualization_mode: VisualizationMode,
    /// Burst palette
    pub color_mode: ColorMode,
    /// Particles per burst at full velocity and intensity 1.0
    pub particle_count: u32,
    /// Multiplier applied to every burst size
    pub explosion_intensity: f32,
    /// Analyser node settings
    pub analyser: AnalyserConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            visualization_mode: VisualizationMode::default(),
            color_mode: ColorMode::default(),
            particle_count: DEFAULT_BASE_COUNT,
            explosion_intensity: 1.0,
            analyser: AnalyserConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl VisualizerConfig {
    /// Read and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Check every field's range
    pub fn validate(&self) -> Result<()> {
        validate_particle_count(self.particle_count)?;
        validate_intensity(self.explosion_intensity)?;
        self.analyser.validate()
    }
}

/// Check a base particle count
pub fn validate_particle_count(count: u32) -> Result<()> {
    if PARTICLE_COUNT_RANGE.contains(&count) {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "particle_count must be in {}..={}, got {}",
            PARTICLE_COUNT_RANGE.start(),
            PARTICLE_COUNT_RANGE.end(),
            count
        )))
    }
}

/// Check an explosion intensity
pub fn validate_intensity(intensity: f32) -> Result<()> {
    if intensity > 0.0 && intensity <= MAX_EXPLOSION_INTENSITY {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "explosion_intensity must be in (0, {}], got {}",
            MAX_EXPLOSION_INTENSITY, intensity
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = VisualizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_count, 50);
        assert_eq!(config.visualization_mode, VisualizationMode::Fireworks);
        assert_eq!(config.color_mode, ColorMode::Rainbow);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = VisualizerConfig::from_toml(
            r#"
            visualization_mode = "combined"
            color_mode = "neon"

            [analyser]
            fft_size = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.visualization_mode, VisualizationMode::Combined);
        assert_eq!(config.color_mode, ColorMode::Neon);
        assert_eq!(config.analyser.fft_size, 1024);
        assert_eq!(config.analyser.smoothing_time_constant, 0.8);
        assert_eq!(config.explosion_intensity, 1.0);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = VisualizerConfig::from_toml(r#"visualization_mode = "laser""#).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse(_)));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(VisualizerConfig::from_toml("particle_count = 0").is_err());
        assert!(VisualizerConfig::from_toml("explosion_intensity = 0.0").is_err());
        assert!(VisualizerConfig::from_toml("explosion_intensity = 9.5").is_err());

        let bad_fft = AnalyserConfig {
            fft_size: 1000,
            ..AnalyserConfig::default()
        };
        assert!(bad_fft.validate().is_err());

        let bad_range = AnalyserConfig {
            min_decibels: -20.0,
            max_decibels: -30.0,
            ..AnalyserConfig::default()
        };
        assert!(bad_range.validate().is_err());
    }
}
