//! Built-in arpeggio for running without a keyboard.
//!
//! Emits raw note-on/note-off messages on a fixed step so they travel the
//! same path as device input.

/// C major arpeggio up and back down
const PATTERN: [u8; 8] = [60, 64, 67, 72, 76, 72, 67, 64];

/// Velocities cycled across steps
const VELOCITIES: [u8; 4] = [110, 70, 90, 127];

/// Default time between notes
pub const DEFAULT_STEP_MS: u64 = 250;

/// Scripted note source
#[derive(Debug, Clone)]
pub struct DemoScript {
    step_ms: u64,
    next_ms: u64,
    step: usize,
    held: Option<u8>,
}

impl DemoScript {
    /// First note plays at `start_ms`
    pub fn new(start_ms: u64, step_ms: u64) -> Self {
        Self {
            step_ms: step_ms.max(1),
            next_ms: start_ms,
            step: 0,
            held: None,
        }
    }

    /// Messages due by `now_ms`, in order
    pub fn poll(&mut self, now_ms: u64) -> Vec<[u8; 3]> {
        let mut messages = Vec::new();
        while now_ms >= self.next_ms {
            if let Some(note) = self.held.take() {
                messages.push([0x80, note, 64]);
            }
            let note = PATTERN[self.step % PATTERN.len()];
            let velocity = VELOCITIES[self.step % VELOCITIES.len()];
            messages.push([0x90, note, velocity]);
            self.held = Some(note);
            self.step += 1;
            self.next_ms += self.step_ms;
        }
        messages
    }

    /// Release the held note, if any
    pub fn finish(&mut self) -> Option<[u8; 3]> {
        self.held.take().map(|note| [0x80, note, 64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_note_at_start() {
        let mut demo = DemoScript::new(100, 250);
        assert!(demo.poll(99).is_empty());
        assert_eq!(demo.poll(100), vec![[0x90, 60, 110]]);
        assert!(demo.poll(200).is_empty());
    }

    #[test]
    fn test_each_step_releases_previous_note() {
        let mut demo = DemoScript::new(0, 250);
        demo.poll(0);
        assert_eq!(demo.poll(250), vec![[0x80, 60, 64], [0x90, 64, 70]]);
    }

    #[test]
    fn test_catches_up_after_a_stall() {
        let mut demo = DemoScript::new(0, 100);
        let messages = demo.poll(250);
        // Three steps due: on, off+on, off+on
        assert_eq!(messages.len(), 5);
        assert_eq!(demo.finish(), Some([0x80, 67, 64]));
        assert_eq!(demo.finish(), None);
    }
}
