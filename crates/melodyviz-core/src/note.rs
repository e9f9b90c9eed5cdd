//! MIDI note decoding and the set of currently held keys.
//!
//! Raw channel-voice messages arrive as `[status, note, velocity]`. Only the
//! note commands matter here; everything else is ignored without error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::trace;

/// Highest valid MIDI note or velocity value
pub const MIDI_DATA_MAX: u8 = 127;

/// Keys shown by the key-display adapter (C3..C5)
pub const KEYBOARD_RANGE: RangeInclusive<u8> = 48..=72;

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Kind of note event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    /// Key pressed
    NoteOn,
    /// Key released
    NoteOff,
}

/// A decoded note message. Produced per incoming message and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Note number (0-127)
    pub note: u8,
    /// Velocity (0-127); carried through unchanged for NoteOff
    pub velocity: u8,
    /// Press or release
    pub kind: NoteKind,
    /// Arrival time in milliseconds
    pub timestamp: u64,
}

impl NoteEvent {
    /// Equal-tempered frequency of this event's note
    pub fn frequency(&self) -> f64 {
        note_to_frequency(self.note)
    }

    /// True for key presses
    pub fn is_note_on(&self) -> bool {
        self.kind == NoteKind::NoteOn
    }
}

/// Decode one channel message. Pure; does not touch any note state.
///
/// Data bytes above 127 are clamped to 127.
pub fn decode(status: u8, note: u8, velocity: u8, timestamp: u64) -> Option<NoteEvent> {
    let note = note.min(MIDI_DATA_MAX);
    let velocity = velocity.min(MIDI_DATA_MAX);

    let kind = match status & 0xF0 {
        NOTE_ON if velocity > 0 => NoteKind::NoteOn,
        NOTE_ON | NOTE_OFF => NoteKind::NoteOff,
        _ => return None,
    };

    Some(NoteEvent {
        note,
        velocity,
        kind,
        timestamp,
    })
}

/// MIDI note number to frequency in Hz (A4 = note 69 = 440 Hz)
pub fn note_to_frequency(note: u8) -> f64 {
    440.0 * 2f64.powf((f64::from(note) - 69.0) / 12.0)
}

/// Scientific pitch name, e.g. `C4` for note 60
pub fn note_name(note: u8) -> String {
    let octave = i32::from(note / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(note % 12)], octave)
}

/// Whether the note sits on a black piano key (C#, D#, F#, G#, A#)
pub fn is_black_key(note: u8) -> bool {
    matches!(note % 12, 1 | 3 | 6 | 8 | 10)
}

/// State of one held key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveNote {
    /// Velocity of the press
    pub velocity: u8,
    /// When the press arrived (ms)
    pub timestamp: u64,
}

/// Currently held keys, keyed by note number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveNoteSet {
    notes: BTreeMap<u8, ActiveNote>,
}

impl ActiveNoteSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a held key
    pub fn insert(&mut self, note: u8, velocity: u8, timestamp: u64) {
        self.notes.insert(
            note,
            ActiveNote {
                velocity,
                timestamp,
            },
        );
    }

    /// Release a key; returns its previous state if it was held
    pub fn remove(&mut self, note: u8) -> Option<ActiveNote> {
        self.notes.remove(&note)
    }

    /// Look up a held key
    pub fn get(&self, note: u8) -> Option<&ActiveNote> {
        self.notes.get(&note)
    }

    /// Whether a key is held
    pub fn contains(&self, note: u8) -> bool {
        self.notes.contains_key(&note)
    }

    /// Number of held keys
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// True when no key is held
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Held keys in ascending note order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &ActiveNote)> {
        self.notes.iter().map(|(note, state)| (*note, state))
    }

    /// Release everything
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Apply a decoded event: NoteOn inserts, NoteOff removes
    pub fn apply(&mut self, event: &NoteEvent) {
        match event.kind {
            NoteKind::NoteOn => self.insert(event.note, event.velocity, event.timestamp),
            NoteKind::NoteOff => {
                self.remove(event.note);
            }
        }
    }
}

/// Translates raw messages into [`NoteEvent`]s and keeps the held-key set current.
#[derive(Debug, Default)]
pub struct NoteTranslator {
    active: ActiveNoteSet,
}

impl NoteTranslator {
    /// Create a translator with no held keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a message and update the held-key set
    pub fn translate(
        &mut self,
        status: u8,
        note: u8,
        velocity: u8,
        timestamp: u64,
    ) -> Option<NoteEvent> {
        let event = decode(status, note, velocity, timestamp)?;
        self.active.apply(&event);
        trace!(
            "Note {:?} {} vel={} (held: {})",
            event.kind,
            note_name(event.note),
            event.velocity,
            self.active.len()
        );
        Some(event)
    }

    /// Decode a raw byte message. Messages shorter than three bytes are dropped.
    pub fn translate_bytes(&mut self, bytes: &[u8], timestamp: u64) -> Option<NoteEvent> {
        match bytes {
            [status, note, velocity, ..] => self.translate(*status, *note, *velocity, timestamp),
            _ => None,
        }
    }

    /// Currently held keys
    pub fn active_notes(&self) -> &ActiveNoteSet {
        &self.active
    }

    /// Forget all held keys
    pub fn reset(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_and_off_update_active_set() {
        let mut translator = NoteTranslator::new();

        let on = translator.translate_bytes(&[0x90, 60, 100], 1_000).unwrap();
        assert_eq!(on.kind, NoteKind::NoteOn);
        assert_eq!(
            translator.active_notes().get(60),
            Some(&ActiveNote {
                velocity: 100,
                timestamp: 1_000
            })
        );

        let off = translator.translate_bytes(&[0x80, 60, 64], 1_010).unwrap();
        assert_eq!(off.kind, NoteKind::NoteOff);
        assert!(translator.active_notes().is_empty());
    }

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        let a = decode(0x90, 60, 0, 5).unwrap();
        let b = decode(0x80, 60, 64, 5).unwrap();
        assert_eq!(a.kind, NoteKind::NoteOff);
        assert_eq!(b.kind, NoteKind::NoteOff);
        assert_eq!(a.note, b.note);
    }

    #[test]
    fn test_channel_bits_are_ignored() {
        let event = decode(0x9F, 61, 90, 0).unwrap();
        assert_eq!(event.kind, NoteKind::NoteOn);
        let event = decode(0x83, 61, 0, 0).unwrap();
        assert_eq!(event.kind, NoteKind::NoteOff);
    }

    #[test]
    fn test_other_commands_are_ignored() {
        let mut translator = NoteTranslator::new();
        assert!(translator.translate_bytes(&[0xB0, 7, 64], 0).is_none());
        assert!(translator.translate_bytes(&[0xE0, 0, 64], 0).is_none());
        assert!(translator.translate_bytes(&[0xF8, 0, 0], 0).is_none());
        assert!(translator.active_notes().is_empty());
    }

    #[test]
    fn test_short_messages_are_dropped() {
        let mut translator = NoteTranslator::new();
        assert!(translator.translate_bytes(&[], 0).is_none());
        assert!(translator.translate_bytes(&[0x90], 0).is_none());
        assert!(translator.translate_bytes(&[0x90, 60], 0).is_none());
        assert!(translator.active_notes().is_empty());
    }

    #[test]
    fn test_out_of_range_data_bytes_are_clamped() {
        let event = decode(0x90, 200, 255, 0).unwrap();
        assert_eq!(event.note, 127);
        assert_eq!(event.velocity, 127);
    }

    #[test]
    fn test_note_on_overwrites_held_key() {
        let mut translator = NoteTranslator::new();
        translator.translate(0x90, 64, 40, 1);
        translator.translate(0x90, 64, 110, 2);
        let held = translator.active_notes().get(64).unwrap();
        assert_eq!(held.velocity, 110);
        assert_eq!(held.timestamp, 2);
        assert_eq!(translator.active_notes().len(), 1);
    }

    #[test]
    fn test_release_of_unheld_key_is_harmless() {
        let mut translator = NoteTranslator::new();
        let event = translator.translate(0x80, 10, 0, 0);
        assert!(event.is_some());
        assert!(translator.active_notes().is_empty());
    }

    #[test]
    fn test_note_to_frequency_reference_points() {
        assert_eq!(note_to_frequency(69), 440.0);
        assert!((note_to_frequency(81) - 880.0).abs() < 1e-9);
        assert!((note_to_frequency(60) - 261.625_565).abs() < 1e-5);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(127), "G9");
    }

    #[test]
    fn test_black_keys() {
        let black: Vec<u8> = (60..72).filter(|n| is_black_key(*n)).collect();
        assert_eq!(black, vec![61, 63, 66, 68, 70]);
    }
}
