//! MelodyVisualizer Control - MIDI device plumbing
//!
//! - Device enumeration and selection by name or index
//! - One active input connection whose raw messages are queued for the
//!   frame thread
//! - Hot-plug monitoring with explicit subscriptions
//!
//! ## Feature Flags
//!
//! - `midi`: Enable MIDI device access (requires `midir`). Without it
//!   [`MidirDeviceSource`] reports [`ControlError::Unsupported`] and the
//!   host runs with no MIDI input.

/// Error types
pub mod error;
/// MIDI input and device monitoring
pub mod midi;

pub use error::{ControlError, Result};
pub use midi::{
    select_device, DeviceChange, DeviceMonitor, DeviceSelector, DeviceSource, MidiDevice,
    MidirDeviceSource, RawMidiMessage, SubscriptionId,
};

#[cfg(feature = "midi")]
pub use midi::MidiInputManager;
