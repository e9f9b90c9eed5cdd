//! MIDI input connection.
//!
//! The backend delivers messages on its own thread. The callback only copies
//! the bytes into a bounded queue; the frame thread drains it once per frame
//! and does all decoding there.

use super::{not_found, select_device, DeviceSelector, MidiDevice, RawMidiMessage};
use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, TrySendError};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::time::Instant;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "MelodyVisualizer";
const PORT_NAME: &str = "melodyviz-input";

/// Messages buffered between two frames before new ones are dropped
pub const QUEUE_CAPACITY: usize = 1024;

/// Owns at most one open input port
pub struct MidiInputManager {
    connection: Option<MidiInputConnection<()>>,
    receiver: Option<Receiver<RawMidiMessage>>,
    device: Option<MidiDevice>,
    clock: Instant,
}

impl MidiInputManager {
    /// Create a manager with no open port. `clock` is the origin of message timestamps.
    pub fn new(clock: Instant) -> Self {
        Self {
            connection: None,
            receiver: None,
            device: None,
            clock,
        }
    }

    /// Enumerate input ports
    pub fn list_devices() -> Result<Vec<MidiDevice>> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let mut devices = Vec::new();
        for (index, port) in midi_in.ports().iter().enumerate() {
            devices.push(MidiDevice {
                index,
                name: midi_in.port_name(port)?,
            });
        }
        Ok(devices)
    }

    /// Open the selected port, closing any previous one
    pub fn connect(&mut self, selector: &DeviceSelector) -> Result<MidiDevice> {
        self.disconnect();

        let mut midi_in = MidiInput::new(CLIENT_NAME)?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        let mut devices = Vec::with_capacity(ports.len());
        for (index, port) in ports.iter().enumerate() {
            devices.push(MidiDevice {
                index,
                name: midi_in.port_name(port)?,
            });
        }
        let device = select_device(&devices, selector)
            .cloned()
            .ok_or_else(|| not_found(selector))?;
        let port = ports
            .get(device.index)
            .cloned()
            .ok_or_else(|| not_found(selector))?;

        let (sender, receiver) = bounded(QUEUE_CAPACITY);
        let clock = self.clock;
        let connection = midi_in.connect(
            &port,
            PORT_NAME,
            move |_stamp, message, _| {
                let raw = RawMidiMessage {
                    bytes: message.to_vec(),
                    timestamp_ms: clock.elapsed().as_millis() as u64,
                };
                if let Err(TrySendError::Full(_)) = sender.try_send(raw) {
                    warn!("MIDI queue full, dropping message");
                }
            },
            (),
        )?;

        info!("Connected to MIDI input {}", device);
        self.connection = Some(connection);
        self.receiver = Some(receiver);
        self.device = Some(device.clone());
        Ok(device)
    }

    /// Close the open port. Messages not yet drained are discarded.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            if let Some(device) = self.device.take() {
                info!("Disconnected from MIDI input {}", device);
            }
        }
        self.receiver = None;
        self.device = None;
    }

    /// Whether a port is open
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The open port
    pub fn device(&self) -> Option<&MidiDevice> {
        self.device.as_ref()
    }

    /// Next queued message, if any (non-blocking)
    pub fn try_recv(&self) -> Option<RawMidiMessage> {
        self.receiver.as_ref()?.try_recv().ok()
    }

    /// All queued messages in arrival order (non-blocking)
    pub fn drain(&self) -> Vec<RawMidiMessage> {
        let messages: Vec<_> = match &self.receiver {
            Some(receiver) => receiver.try_iter().collect(),
            None => Vec::new(),
        };
        if !messages.is_empty() {
            debug!("Drained {} MIDI messages", messages.len());
        }
        messages
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconnected_manager_is_empty() {
        let manager = MidiInputManager::new(Instant::now());
        assert!(!manager.is_connected());
        assert!(manager.device().is_none());
        assert!(manager.try_recv().is_none());
        assert!(manager.drain().is_empty());
    }

    #[test]
    fn test_disconnect_without_connection_is_harmless() {
        let mut manager = MidiInputManager::new(Instant::now());
        manager.disconnect();
        manager.disconnect();
        assert!(!manager.is_connected());
    }
}
