//! Visualizer session.
//!
//! Owns everything one visual session mutates: the configuration, the note
//! translator with its held-key set, the particle engine, the spectrum sampler
//! and the status strings. Created at startup, passed explicitly to the frame
//! driver and the input handlers, and torn down at session end.

use crate::color::ColorMode;
use crate::config::{validate_intensity, validate_particle_count, VisualizerConfig};
use crate::frame::{KeyHighlighter, VisualizationMode};
use crate::note::{ActiveNoteSet, NoteEvent, NoteKind, NoteTranslator, MIDI_DATA_MAX};
use crate::particles::{ParticleEngine, RenderBuffers};
use crate::spectrum::{AnalysisNode, SpectrumFrame, SpectrumSampler};
use crate::status::InputStatus;
use crate::Result;
use tracing::{debug, info};

/// Velocity used for notes triggered by clicking a key
pub const CLICK_VELOCITY: u8 = 100;

/// All mutable state of one visual session
pub struct VisualizerSession {
    config: VisualizerConfig,
    translator: NoteTranslator,
    engine: ParticleEngine,
    sampler: SpectrumSampler,
    midi_status: InputStatus,
    audio_status: InputStatus,
    spectrum_peak: u8,
}

impl VisualizerSession {
    /// Start a session from a config
    pub fn new(config: VisualizerConfig) -> Result<Self> {
        let engine = ParticleEngine::new(config.particle_count, config.color_mode);
        Self::with_engine(config, engine)
    }

    /// Start a session whose particle bursts are reproducible
    pub fn with_seed(config: VisualizerConfig, seed: u64) -> Result<Self> {
        let engine = ParticleEngine::with_seed(config.particle_count, config.color_mode, seed);
        Self::with_engine(config, engine)
    }

    fn with_engine(config: VisualizerConfig, engine: ParticleEngine) -> Result<Self> {
        config.validate()?;
        info!(
            "Session started: mode={}, colors={}, particles={}, intensity={}",
            config.visualization_mode,
            config.color_mode,
            config.particle_count,
            config.explosion_intensity
        );
        Ok(Self {
            config,
            translator: NoteTranslator::new(),
            engine,
            sampler: SpectrumSampler::new(),
            midi_status: InputStatus::Idle,
            audio_status: InputStatus::Idle,
            spectrum_peak: 0,
        })
    }

    /// Decode a raw MIDI message and apply its visual effects.
    ///
    /// A note-on spawns a burst when particles are shown and lights its key
    /// when keys are highlighted; a note-off always clears the key.
    pub fn handle_midi_message(
        &mut self,
        bytes: &[u8],
        timestamp_ms: u64,
        keys: &mut dyn KeyHighlighter,
    ) -> Option<NoteEvent> {
        let event = self.translator.translate_bytes(bytes, timestamp_ms)?;
        match event.kind {
            NoteKind::NoteOn => {
                let mode = self.config.visualization_mode;
                if mode.shows_particles() {
                    self.spawn(event.note, event.velocity);
                }
                if mode.highlights_keys() {
                    keys.set_key_highlight(event.note, true);
                }
            }
            NoteKind::NoteOff => keys.set_key_highlight(event.note, false),
        }
        Some(event)
    }

    /// Fire a burst as if a key had been clicked. Clicks are momentary, so
    /// the held-key set and the key highlights are left alone.
    pub fn trigger_note(&mut self, note: u8, velocity: u8, timestamp_ms: u64) -> NoteEvent {
        let note = note.min(MIDI_DATA_MAX);
        let velocity = velocity.min(MIDI_DATA_MAX);
        if self.config.visualization_mode.shows_particles() {
            self.spawn(note, velocity);
        }
        NoteEvent {
            note,
            velocity,
            kind: NoteKind::NoteOn,
            timestamp: timestamp_ms,
        }
    }

    /// [`trigger_note`](Self::trigger_note) with the click velocity
    pub fn click_note(&mut self, note: u8, timestamp_ms: u64) -> NoteEvent {
        self.trigger_note(note, CLICK_VELOCITY, timestamp_ms)
    }

    fn spawn(&mut self, note: u8, velocity: u8) -> usize {
        let spawned = self
            .engine
            .spawn_burst(note, velocity, self.config.explosion_intensity);
        debug!(
            "Burst note={} vel={} spawned={} live={}",
            note,
            velocity,
            spawned,
            self.engine.len()
        );
        spawned
    }

    /// Advance the particles one frame and write their vertices into `buffers`
    pub fn advance_particles(&mut self, buffers: &mut RenderBuffers) {
        self.engine.advance();
        self.engine.render_into(buffers);
    }

    /// Sample the attached analyser and remember the peak
    pub fn sample_spectrum(&mut self) -> Option<SpectrumFrame> {
        let frame = self.sampler.sample()?;
        self.spectrum_peak = frame.peak();
        Some(frame)
    }

    /// Switch the active visual layers
    pub fn set_visualization_mode(&mut self, mode: VisualizationMode) {
        info!("Visualization mode: {}", mode);
        self.config.visualization_mode = mode;
    }

    /// Switch the palette for future bursts
    pub fn set_color_mode(&mut self, mode: ColorMode) {
        info!("Color mode: {}", mode);
        self.config.color_mode = mode;
        self.engine.set_color_mode(mode);
    }

    /// Change the base burst size
    pub fn set_particle_count(&mut self, count: u32) -> Result<()> {
        validate_particle_count(count)?;
        self.config.particle_count = count;
        self.engine.set_base_count(count);
        Ok(())
    }

    /// Change the burst size multiplier
    pub fn set_explosion_intensity(&mut self, intensity: f32) -> Result<()> {
        validate_intensity(intensity)?;
        self.config.explosion_intensity = intensity;
        Ok(())
    }

    /// Start reading spectra from `node`
    pub fn attach_analyser(&mut self, node: Box<dyn AnalysisNode>) {
        debug!(
            "Analyser attached ({} bins, {} samples)",
            node.frequency_bin_count(),
            node.fft_size()
        );
        self.sampler.attach(node);
    }

    /// Stop reading spectra
    pub fn detach_analyser(&mut self) {
        if self.sampler.detach().is_some() {
            debug!("Analyser detached");
        }
        self.spectrum_peak = 0;
    }

    /// Update the MIDI status string
    pub fn set_midi_status(&mut self, status: InputStatus) {
        if status != self.midi_status {
            info!("MIDI status: {}", status);
            self.midi_status = status;
        }
    }

    /// Update the audio status string
    pub fn set_audio_status(&mut self, status: InputStatus) {
        if status != self.audio_status {
            info!("Audio status: {}", status);
            self.audio_status = status;
        }
    }

    /// End the session: abandon in-flight particles, drop the analyser and
    /// release every held key.
    pub fn teardown(&mut self) {
        let abandoned = self.engine.len();
        self.engine.clear();
        self.detach_analyser();
        self.translator.reset();
        info!("Session torn down ({} particles abandoned)", abandoned);
    }

    /// Current configuration
    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// Active visual layers
    pub fn visualization_mode(&self) -> VisualizationMode {
        self.config.visualization_mode
    }

    /// Current palette
    pub fn color_mode(&self) -> ColorMode {
        self.config.color_mode
    }

    /// Held keys
    pub fn active_notes(&self) -> &ActiveNoteSet {
        self.translator.active_notes()
    }

    /// The particle engine
    pub fn engine(&self) -> &ParticleEngine {
        &self.engine
    }

    /// Whether an analyser is attached
    pub fn has_analyser(&self) -> bool {
        self.sampler.is_available()
    }

    /// Loudest bin of the last spectrum sample
    pub fn spectrum_peak(&self) -> u8 {
        self.spectrum_peak
    }

    /// MIDI status
    pub fn midi_status(&self) -> &InputStatus {
        &self.midi_status
    }

    /// Audio status
    pub fn audio_status(&self) -> &InputStatus {
        &self.audio_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Keys {
        lit: BTreeMap<u8, bool>,
    }

    impl KeyHighlighter for Keys {
        fn set_key_highlight(&mut self, note: u8, active: bool) {
            self.lit.insert(note, active);
        }
    }

    fn session(mode: VisualizationMode) -> VisualizerSession {
        let config = VisualizerConfig {
            visualization_mode: mode,
            ..VisualizerConfig::default()
        };
        VisualizerSession::with_seed(config, 11).unwrap()
    }

    #[test]
    fn test_fireworks_note_on_spawns_without_highlight() {
        let mut s = session(VisualizationMode::Fireworks);
        let mut keys = Keys::default();
        s.handle_midi_message(&[0x90, 60, 127], 0, &mut keys).unwrap();
        assert_eq!(s.engine().len(), 50);
        assert!(keys.lit.is_empty());
        assert!(s.active_notes().contains(60));
    }

    #[test]
    fn test_keyboard_mode_highlights_only() {
        let mut s = session(VisualizationMode::Keyboard);
        let mut keys = Keys::default();
        s.handle_midi_message(&[0x90, 64, 90], 0, &mut keys);
        assert!(s.engine().is_empty());
        assert_eq!(keys.lit.get(&64), Some(&true));

        s.handle_midi_message(&[0x80, 64, 0], 5, &mut keys);
        assert_eq!(keys.lit.get(&64), Some(&false));
        assert!(s.active_notes().is_empty());
    }

    #[test]
    fn test_note_off_clears_highlight_in_every_mode() {
        let mut s = session(VisualizationMode::Spectrum);
        let mut keys = Keys::default();
        s.handle_midi_message(&[0x90, 62, 0], 0, &mut keys);
        assert_eq!(keys.lit.get(&62), Some(&false));
    }

    #[test]
    fn test_click_spawns_with_click_velocity() {
        let mut s = session(VisualizationMode::Combined);
        let event = s.click_note(60, 3);
        assert_eq!(event.velocity, CLICK_VELOCITY);
        // floor(50 * 100 / 127) = 39
        assert_eq!(s.engine().len(), 39);
        assert!(s.active_notes().is_empty());
    }

    #[test]
    fn test_setters_validate() {
        let mut s = session(VisualizationMode::Fireworks);
        assert!(s.set_particle_count(0).is_err());
        assert!(s.set_particle_count(100).is_ok());
        assert_eq!(s.engine().base_count(), 100);
        assert!(s.set_explosion_intensity(-1.0).is_err());
        assert!(s.set_explosion_intensity(2.0).is_ok());

        s.trigger_note(60, 127, 0);
        assert_eq!(s.engine().len(), 200);

        s.set_color_mode(ColorMode::Ocean);
        assert_eq!(s.engine().color_mode(), ColorMode::Ocean);
    }

    #[test]
    fn test_teardown_drops_everything() {
        let mut s = session(VisualizationMode::Combined);
        let mut keys = Keys::default();
        s.handle_midi_message(&[0x90, 60, 100], 0, &mut keys);
        s.teardown();
        assert!(s.engine().is_empty());
        assert!(s.active_notes().is_empty());
        assert!(!s.has_analyser());
    }

    #[test]
    fn test_status_updates() {
        let mut s = session(VisualizationMode::Fireworks);
        assert_eq!(s.midi_status(), &InputStatus::Idle);
        s.set_midi_status(InputStatus::NoDevices);
        assert_eq!(s.midi_status().to_string(), "No MIDI devices detected");
        s.set_audio_status(InputStatus::Loaded("song.wav".into()));
        assert_eq!(s.audio_status(), &InputStatus::Loaded("song.wav".into()));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = VisualizerConfig {
            particle_count: 0,
            ..VisualizerConfig::default()
        };
        assert!(VisualizerSession::new(config).is_err());
    }
}
