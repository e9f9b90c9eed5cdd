//! Command-line argument parsing.

use anyhow::{Context, Result};
use clap::Parser;
use melodyviz_core::{ColorMode, VisualizationMode, VisualizerConfig};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "MelodyVisualizer")]
#[command(about = "Particle and spectrum visuals driven by MIDI notes or an audio file", long_about = None)]
pub struct Args {
    /// TOML config file; command-line flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Visualization mode: fireworks, spectrum, keyboard, combined
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Color mode: rainbow, fire, ocean, neon
    #[arg(long, value_name = "PALETTE")]
    pub color_mode: Option<String>,

    /// Particles per burst at full velocity (1-500)
    #[arg(long, value_name = "COUNT")]
    pub particles: Option<u32>,

    /// Burst size multiplier (0-5]
    #[arg(long, value_name = "FACTOR")]
    pub intensity: Option<f32>,

    /// MIDI input to open: index or part of the device name
    #[arg(long, value_name = "DEVICE")]
    pub midi_device: Option<String>,

    /// List MIDI inputs and exit
    #[arg(long)]
    pub list_midi: bool,

    /// WAV file to play into the spectrum analyser
    #[arg(long, value_name = "FILE")]
    pub audio_file: Option<PathBuf>,

    /// Play a built-in arpeggio instead of waiting for a keyboard
    #[arg(long)]
    pub demo: bool,

    /// Stop after this many frames (runs until the audio ends or forever otherwise)
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Target frame rate
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Write PNG snapshots into this directory
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Snapshot every N frames
    #[arg(long, value_name = "N", default_value = "30")]
    pub snapshot_every: u64,

    /// Canvas width in pixels
    #[arg(long, value_name = "PX", default_value = "960")]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, value_name = "PX", default_value = "540")]
    pub height: u32,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Load the config file (or defaults) and apply the command-line overrides
    pub fn resolve_config(&self) -> Result<VisualizerConfig> {
        let mut config = match &self.config {
            Some(path) => VisualizerConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => VisualizerConfig::default(),
        };
        self.apply_overrides(&mut config)?;
        config.validate().context("Invalid settings")?;
        Ok(config)
    }

    /// Overwrite config values with the flags that were given
    pub fn apply_overrides(&self, config: &mut VisualizerConfig) -> Result<()> {
        if let Some(mode) = &self.mode {
            config.visualization_mode = mode.parse::<VisualizationMode>()?;
        }
        if let Some(colors) = &self.color_mode {
            config.color_mode = colors.parse::<ColorMode>()?;
        }
        if let Some(count) = self.particles {
            config.particle_count = count;
        }
        if let Some(intensity) = self.intensity {
            config.explosion_intensity = intensity;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        Ok(())
    }

    /// Milliseconds between frames
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.fps.max(1))
    }
}
