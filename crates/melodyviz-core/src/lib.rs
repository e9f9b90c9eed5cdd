//! MelodyVisualizer Core - Note, Particle and Spectrum Engine
//!
//! This crate contains the per-event and per-frame logic of MelodyVisualizer:
//! - MIDI note decoding and the set of currently held keys
//! - Note-driven color palettes
//! - The particle burst engine and its render buffers
//! - Spectrum sampling from an analyser node
//! - The frame driver that sequences all of the above once per refresh
//!
//! Drawing, device access and file decoding live in the host crates; they
//! talk to this crate through plain buffers and the adapter traits in [`frame`].

#![warn(missing_docs)]

pub use glam::Vec3;
use thiserror::Error;

pub mod analyser;
pub mod color;
pub mod config;
pub mod frame;
pub mod logging;
pub mod note;
pub mod particles;
pub mod session;
pub mod spectrum;
pub mod status;

// --- Re-exports grouped by category ---

// Notes
pub use note::{
    is_black_key, note_name, note_to_frequency, ActiveNote, ActiveNoteSet, NoteEvent, NoteKind,
    NoteTranslator, KEYBOARD_RANGE,
};

// Particles & Color
pub use color::{color_for_note, color_for_note_named, hsv_to_rgb, ColorMode, Rgb};
pub use particles::{
    Particle, ParticleEngine, ParticleVertex, RenderBuffers, KEEP_PARTICLES, MAX_PARTICLES,
    TRAIL_LENGTH,
};

// Spectrum
pub use analyser::FftAnalyser;
pub use spectrum::{AnalysisNode, SpectrumFrame, SpectrumSampler};

// Frame & Session
pub use frame::{
    FpsCounter, FrameDriver, FrameReport, KeyHighlighter, ParticleRenderer, SpectrumRenderer,
    VisualizationMode,
};
pub use session::VisualizerSession;
pub use status::InputStatus;

// Configuration & Logging
pub use config::{AnalyserConfig, VisualizerConfig};
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration value is out of range or unknown
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading or writing a config file failed
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`VisualizerConfig`]
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be serialized
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
