//! MIDI input system

#[cfg(feature = "midi")]
mod input;
mod monitor;

#[cfg(feature = "midi")]
pub use input::*;
pub use monitor::*;

use crate::error::{ControlError, Result};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// An input port as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MidiDevice {
    /// Position in the backend's port list at enumeration time
    pub index: usize,
    /// Port name
    pub name: String,
}

impl fmt::Display for MidiDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.name)
    }
}

/// A raw message as received from the device, queued for the frame thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMidiMessage {
    /// Message bytes, unparsed
    pub bytes: Vec<u8>,
    /// Arrival time in milliseconds since the connection's clock started
    pub timestamp_ms: u64,
}

/// How to pick an input device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceSelector {
    /// The first port
    #[default]
    First,
    /// Port at this index
    Index(usize),
    /// First port whose name contains this text (case-insensitive)
    Name(String),
}

impl FromStr for DeviceSelector {
    type Err = Infallible;

    /// Digits select by index, anything else by name
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(DeviceSelector::First);
        }
        Ok(match s.parse::<usize>() {
            Ok(index) => DeviceSelector::Index(index),
            Err(_) => DeviceSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::First => write!(f, "first device"),
            DeviceSelector::Index(index) => write!(f, "device #{}", index),
            DeviceSelector::Name(name) => write!(f, "device '{}'", name),
        }
    }
}

/// Pick a device from an enumerated list
pub fn select_device<'a>(
    devices: &'a [MidiDevice],
    selector: &DeviceSelector,
) -> Option<&'a MidiDevice> {
    match selector {
        DeviceSelector::First => devices.first(),
        DeviceSelector::Index(index) => devices.iter().find(|d| d.index == *index),
        DeviceSelector::Name(name) => {
            let wanted = name.to_lowercase();
            devices
                .iter()
                .find(|d| d.name.to_lowercase().contains(&wanted))
        }
    }
}

/// Something that can enumerate input ports
pub trait DeviceSource {
    /// Current input ports
    fn devices(&mut self) -> Result<Vec<MidiDevice>>;
}

/// Enumerates ports through the platform MIDI backend
#[derive(Debug, Default)]
pub struct MidirDeviceSource;

impl DeviceSource for MidirDeviceSource {
    #[cfg(feature = "midi")]
    fn devices(&mut self) -> Result<Vec<MidiDevice>> {
        MidiInputManager::list_devices()
    }

    #[cfg(not(feature = "midi"))]
    fn devices(&mut self) -> Result<Vec<MidiDevice>> {
        Err(ControlError::Unsupported)
    }
}

#[cfg_attr(not(feature = "midi"), allow(dead_code))]
pub(crate) fn not_found(selector: &DeviceSelector) -> ControlError {
    ControlError::DeviceNotFound(selector.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<MidiDevice> {
        vec![
            MidiDevice {
                index: 0,
                name: "Midi Through Port-0".to_string(),
            },
            MidiDevice {
                index: 1,
                name: "Digital Piano MIDI 1".to_string(),
            },
        ]
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("1".parse::<DeviceSelector>().unwrap(), DeviceSelector::Index(1));
        assert_eq!(
            "piano".parse::<DeviceSelector>().unwrap(),
            DeviceSelector::Name("piano".to_string())
        );
        assert_eq!("".parse::<DeviceSelector>().unwrap(), DeviceSelector::First);
    }

    #[test]
    fn test_select_by_name_is_case_insensitive() {
        let devices = devices();
        let found = select_device(&devices, &DeviceSelector::Name("PIANO".into())).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn test_select_by_index_and_first() {
        let devices = devices();
        assert_eq!(
            select_device(&devices, &DeviceSelector::Index(0)).unwrap().name,
            "Midi Through Port-0"
        );
        assert!(select_device(&devices, &DeviceSelector::Index(5)).is_none());
        assert_eq!(select_device(&devices, &DeviceSelector::First).unwrap().index, 0);
        assert!(select_device(&[], &DeviceSelector::First).is_none());
    }

    #[test]
    fn test_not_found_names_the_selector() {
        let err = not_found(&DeviceSelector::Name("organ".into()));
        assert_eq!(err.to_string(), "MIDI device not found: device 'organ'");
    }

    #[test]
    #[cfg(not(feature = "midi"))]
    fn test_listing_without_backend_is_unsupported() {
        let err = MidirDeviceSource.devices().unwrap_err();
        assert!(matches!(err, ControlError::Unsupported));
        assert_eq!(err.to_string(), "MIDI support is not available in this build");
    }
}
