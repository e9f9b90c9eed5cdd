//! Error types for MIDI device access
use thiserror::Error;

/// Control errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// The platform MIDI backend could not be opened
    #[error("MIDI init error: {0}")]
    #[cfg(feature = "midi")]
    MidiInitError(#[from] midir::InitError),

    /// Opening an input port failed
    #[error("MIDI connection error: {0}")]
    #[cfg(feature = "midi")]
    MidiConnectionError(#[from] midir::ConnectError<midir::MidiInput>),

    /// A port disappeared while it was being queried
    #[error("MIDI port info error: {0}")]
    #[cfg(feature = "midi")]
    PortInfoError(#[from] midir::PortInfoError),

    /// No device matched the requested name or index
    #[error("MIDI device not found: {0}")]
    DeviceNotFound(String),

    /// MIDI support was compiled out
    #[error("MIDI support is not available in this build")]
    Unsupported,
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
