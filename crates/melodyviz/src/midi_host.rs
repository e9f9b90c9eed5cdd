//! MIDI device handling on the frame thread.
//!
//! Drains the input queue into the session once per frame and follows
//! hot-plug changes: a vanished device marks the input disconnected, a
//! matching device appearing again is reconnected.

use melodyviz_control::{
    midi::DEFAULT_POLL_INTERVAL_MS, DeviceChange, DeviceMonitor, DeviceSelector,
    MidiInputManager, MidirDeviceSource, SubscriptionId,
};
use melodyviz_core::{InputStatus, KeyHighlighter, VisualizerSession};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;
use tracing::warn;

/// Owns the input connection and the hot-plug monitor
pub struct MidiHost {
    input: MidiInputManager,
    monitor: DeviceMonitor<MidirDeviceSource>,
    subscription: Option<SubscriptionId>,
    pending: Rc<RefCell<VecDeque<DeviceChange>>>,
    selector: DeviceSelector,
}

impl MidiHost {
    /// Open the selected device and start watching for changes. Failures are
    /// reported through the session's MIDI status; the host keeps running.
    pub fn start(
        selector: DeviceSelector,
        clock: Instant,
        session: &mut VisualizerSession,
    ) -> Self {
        let mut monitor = DeviceMonitor::new(MidirDeviceSource, DEFAULT_POLL_INTERVAL_MS);
        let pending = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&pending);
        let subscription = monitor.subscribe(move |change: &DeviceChange| {
            sink.borrow_mut().push_back(change.clone());
        });

        let mut host = Self {
            input: MidiInputManager::new(clock),
            monitor,
            subscription: Some(subscription),
            pending,
            selector,
        };
        host.connect(session);
        host
    }

    fn connect(&mut self, session: &mut VisualizerSession) {
        match MidiInputManager::list_devices() {
            Err(e) => session.set_midi_status(InputStatus::Unavailable(e.to_string())),
            Ok(devices) if devices.is_empty() => session.set_midi_status(InputStatus::NoDevices),
            Ok(_) => match self.input.connect(&self.selector) {
                Ok(device) => session.set_midi_status(InputStatus::Connected(device.name)),
                Err(e) => session.set_midi_status(InputStatus::Failed(e.to_string())),
            },
        }
    }

    /// Feed queued messages to the session and react to device changes
    pub fn poll(
        &mut self,
        now_ms: u64,
        session: &mut VisualizerSession,
        keys: &mut dyn KeyHighlighter,
    ) {
        for message in self.input.drain() {
            session.handle_midi_message(&message.bytes, message.timestamp_ms, keys);
        }

        if let Err(e) = self.monitor.poll(now_ms) {
            warn!("MIDI device scan failed: {}", e);
            return;
        }

        let changes: Vec<DeviceChange> = self.pending.borrow_mut().drain(..).collect();
        for change in changes {
            match change {
                DeviceChange::Removed(device)
                    if self.input.device().map(|d| &d.name) == Some(&device.name) =>
                {
                    self.input.disconnect();
                    session.set_midi_status(InputStatus::Disconnected);
                }
                DeviceChange::Added(_) if !self.input.is_connected() => self.connect(session),
                _ => {}
            }
        }
    }

    /// Close the device and cancel the hot-plug subscription
    pub fn shutdown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.monitor.cancel(id);
        }
        self.input.disconnect();
    }
}
