//! Device hot-plug monitoring.
//!
//! The backend offers no change notifications, so the monitor re-enumerates
//! ports when polled (at most once per interval) and reports what appeared or
//! vanished. Subscribers are plain callbacks run synchronously inside
//! [`DeviceMonitor::poll`]; the returned [`SubscriptionId`] cancels them.

use super::{DeviceSource, MidiDevice};
use crate::error::Result;
use tracing::{debug, info};

/// Default minimum time between two enumerations
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// A change in the set of input ports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChange {
    /// A port appeared
    Added(MidiDevice),
    /// A port went away
    Removed(MidiDevice),
}

/// Handle returned by [`DeviceMonitor::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&DeviceChange)>;

/// Polls a [`DeviceSource`] and fans changes out to subscribers
pub struct DeviceMonitor<S: DeviceSource> {
    source: S,
    known: Vec<MidiDevice>,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
    interval_ms: u64,
    last_poll_ms: Option<u64>,
}

impl<S: DeviceSource> DeviceMonitor<S> {
    /// Create a monitor. The first poll establishes the baseline and reports
    /// every present port as added.
    pub fn new(source: S, interval_ms: u64) -> Self {
        Self {
            source,
            known: Vec::new(),
            subscribers: Vec::new(),
            next_id: 0,
            interval_ms,
            last_poll_ms: None,
        }
    }

    /// Register a callback for device changes
    pub fn subscribe(&mut self, callback: impl FnMut(&DeviceChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        debug!("Device subscription {:?} added", id);
        id
    }

    /// Remove a callback. Returns false if it was already cancelled.
    pub fn cancel(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Re-enumerate if the interval has passed, notify subscribers and
    /// return the changes. Returns nothing between intervals.
    pub fn poll(&mut self, now_ms: u64) -> Result<Vec<DeviceChange>> {
        if let Some(last) = self.last_poll_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return Ok(Vec::new());
            }
        }
        self.last_poll_ms = Some(now_ms);

        let current = self.source.devices()?;
        let changes = diff(&self.known, &current);
        self.known = current;

        for change in &changes {
            match change {
                DeviceChange::Added(device) => info!("MIDI device connected: {}", device.name),
                DeviceChange::Removed(device) => info!("MIDI device removed: {}", device.name),
            }
            for (_, callback) in &mut self.subscribers {
                callback(change);
            }
        }
        Ok(changes)
    }

    /// Ports seen at the last enumeration
    pub fn devices(&self) -> &[MidiDevice] {
        &self.known
    }
}

/// Ports are matched by name; indices shift when other ports come and go
fn diff(old: &[MidiDevice], new: &[MidiDevice]) -> Vec<DeviceChange> {
    let removed = old
        .iter()
        .filter(|d| !new.iter().any(|n| n.name == d.name))
        .cloned()
        .map(DeviceChange::Removed);
    let added = new
        .iter()
        .filter(|d| !old.iter().any(|o| o.name == d.name))
        .cloned()
        .map(DeviceChange::Added);
    removed.chain(added).collect()
}
