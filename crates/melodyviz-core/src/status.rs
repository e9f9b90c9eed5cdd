//! Input status strings shown to the user.
//!
//! Missing capabilities and device or file failures are reported here instead
//! of failing the session.

use std::fmt;

/// Status of a MIDI or audio input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputStatus {
    /// Nothing connected or loaded yet
    #[default]
    Idle,
    /// The platform capability is missing
    Unavailable(String),
    /// Access works but no device is present
    NoDevices,
    /// Receiving from a device
    Connected(String),
    /// A previously connected device went away
    Disconnected,
    /// An audio file is ready to play
    Loaded(String),
    /// Audio is playing
    Playing,
    /// Audio stopped or reached its end
    Stopped,
    /// A device or file operation failed
    Failed(String),
}

impl InputStatus {
    /// Whether the input is currently delivering data
    pub fn is_active(&self) -> bool {
        matches!(self, InputStatus::Connected(_) | InputStatus::Playing)
    }
}

impl fmt::Display for InputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputStatus::Idle => write!(f, "Not connected"),
            InputStatus::Unavailable(reason) => write!(f, "Unavailable: {}", reason),
            InputStatus::NoDevices => write!(f, "No MIDI devices detected"),
            InputStatus::Connected(name) => write!(f, "Connected: {}", name),
            InputStatus::Disconnected => write!(f, "Disconnected"),
            InputStatus::Loaded(name) => write!(f, "Loaded: {}", name),
            InputStatus::Playing => write!(f, "Playing"),
            InputStatus::Stopped => write!(f, "Stopped"),
            InputStatus::Failed(reason) => write!(f, "Error: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(
            InputStatus::Connected("Digital Piano".into()).to_string(),
            "Connected: Digital Piano"
        );
        assert_eq!(InputStatus::NoDevices.to_string(), "No MIDI devices detected");
        assert!(InputStatus::Playing.is_active());
        assert!(!InputStatus::Failed("decode".into()).is_active());
    }
}
