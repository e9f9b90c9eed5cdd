//! Frame driver and render adapter seams.
//!
//! The host calls [`FrameDriver::tick`] once per display refresh. Each tick
//! updates the fps counter, advances and hands off the particle buffers when
//! the mode shows particles, and samples the spectrum when the mode shows it.
//! Drawing is done by the adapters; the core only hands them plain buffers.

use crate::particles::RenderBuffers;
use crate::session::VisualizerSession;
use crate::spectrum::SpectrumFrame;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interval after which the fps counter publishes and resets
pub const FPS_WINDOW_MS: u64 = 1000;

/// Which visual layers are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    /// Particle bursts only
    #[default]
    Fireworks,
    /// Spectrum bars and waveform only
    Spectrum,
    /// Key highlights only
    Keyboard,
    /// Everything
    Combined,
}

impl VisualizationMode {
    /// All modes in display order
    pub const ALL: [VisualizationMode; 4] = [
        VisualizationMode::Fireworks,
        VisualizationMode::Spectrum,
        VisualizationMode::Keyboard,
        VisualizationMode::Combined,
    ];

    /// Lowercase name used in config files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            VisualizationMode::Fireworks => "fireworks",
            VisualizationMode::Spectrum => "spectrum",
            VisualizationMode::Keyboard => "keyboard",
            VisualizationMode::Combined => "combined",
        }
    }

    /// Note-ons spawn bursts and the particle layer is advanced and drawn
    pub fn shows_particles(&self) -> bool {
        match self {
            VisualizationMode::Fireworks | VisualizationMode::Combined => true,
            VisualizationMode::Spectrum | VisualizationMode::Keyboard => false,
        }
    }

    /// The spectrum is sampled and drawn
    pub fn shows_spectrum(&self) -> bool {
        match self {
            VisualizationMode::Spectrum | VisualizationMode::Combined => true,
            VisualizationMode::Fireworks | VisualizationMode::Keyboard => false,
        }
    }

    /// Note-ons light up their key
    pub fn highlights_keys(&self) -> bool {
        match self {
            VisualizationMode::Keyboard | VisualizationMode::Combined => true,
            VisualizationMode::Fireworks | VisualizationMode::Spectrum => false,
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VisualizationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::InvalidConfig(format!("unknown visualization mode '{}'", s)))
    }
}

/// Receives the per-frame particle vertex buffers
pub trait ParticleRenderer {
    /// Draw one frame of particles
    fn draw_particles(&mut self, buffers: &RenderBuffers);
}

/// Receives the per-frame spectrum snapshot
pub trait SpectrumRenderer {
    /// Draw one frame of bars and waveform
    fn draw_spectrum(&mut self, frame: &SpectrumFrame);
}

/// Receives per-note highlight signals
pub trait KeyHighlighter {
    /// Turn a key highlight on or off
    fn set_key_highlight(&mut self, note: u8, active: bool);
}

/// Frames-per-second counter over a wall-clock window
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frame_count: u32,
    window_start_ms: u64,
    fps: u32,
}

impl FpsCounter {
    /// Create a counter whose first window starts at `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            frame_count: 0,
            window_start_ms: now_ms,
            fps: 0,
        }
    }

    /// Count one frame. Returns the new value when the window rolled over.
    pub fn tick(&mut self, now_ms: u64) -> Option<u32> {
        let mut published = None;
        if now_ms.saturating_sub(self.window_start_ms) > FPS_WINDOW_MS {
            self.fps = self.frame_count;
            self.frame_count = 0;
            self.window_start_ms = now_ms;
            published = Some(self.fps);
        }
        self.frame_count += 1;
        published
    }

    /// Last published value
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Last published frames per second
    pub fps: u32,
    /// Live particles after this frame's advance
    pub particle_count: usize,
    /// Vertices handed to the particle renderer (0 when the layer is off)
    pub vertex_count: usize,
    /// Loudest bin of the most recent spectrum sample
    pub spectrum_peak: u8,
    /// Keys currently held
    pub active_notes: usize,
}

/// Sequences one frame of work
#[derive(Debug, Default)]
pub struct FrameDriver {
    fps: FpsCounter,
    buffers: RenderBuffers,
    frames: u64,
}

impl FrameDriver {
    /// Create a driver whose fps window starts at `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            fps: FpsCounter::new(now_ms),
            buffers: RenderBuffers::new(),
            frames: 0,
        }
    }

    /// Run one frame
    pub fn tick(
        &mut self,
        now_ms: u64,
        session: &mut VisualizerSession,
        particle_renderer: &mut dyn ParticleRenderer,
        spectrum_renderer: &mut dyn SpectrumRenderer,
    ) -> FrameReport {
        self.fps.tick(now_ms);
        self.frames += 1;

        let mode = session.visualization_mode();
        let (particles, spectrum) = match mode {
            VisualizationMode::Fireworks => (true, false),
            VisualizationMode::Spectrum => (false, true),
            VisualizationMode::Keyboard => (false, false),
            VisualizationMode::Combined => (true, true),
        };

        let mut vertex_count = 0;
        if particles {
            session.advance_particles(&mut self.buffers);
            particle_renderer.draw_particles(&self.buffers);
            vertex_count = self.buffers.len();
        }

        if spectrum {
            if let Some(frame) = session.sample_spectrum() {
                spectrum_renderer.draw_spectrum(&frame);
            }
        }

        FrameReport {
            fps: self.fps.fps(),
            particle_count: session.engine().len(),
            vertex_count,
            spectrum_peak: session.spectrum_peak(),
            active_notes: session.active_notes().len(),
        }
    }

    /// Frames run so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Buffers from the most recent particle frame
    pub fn last_buffers(&self) -> &RenderBuffers {
        &self.buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "Combined".parse::<VisualizationMode>().unwrap(),
            VisualizationMode::Combined
        );
        assert_eq!(
            " spectrum ".parse::<VisualizationMode>().unwrap(),
            VisualizationMode::Spectrum
        );
        assert!("laser".parse::<VisualizationMode>().is_err());
    }

    #[test]
    fn test_mode_layers() {
        use VisualizationMode::*;
        assert!(Fireworks.shows_particles() && !Fireworks.shows_spectrum());
        assert!(!Spectrum.shows_particles() && Spectrum.shows_spectrum());
        assert!(Keyboard.highlights_keys() && !Keyboard.shows_particles());
        assert!(
            Combined.shows_particles() && Combined.shows_spectrum() && Combined.highlights_keys()
        );
        assert!(!Fireworks.highlights_keys());
    }

    #[test]
    fn test_fps_publishes_after_window() {
        let mut fps = FpsCounter::new(0);
        for t in (0..=1000).step_by(16) {
            assert_eq!(fps.tick(t), None);
        }
        assert_eq!(fps.fps(), 0);

        // 1001 ms after the window start; the frames counted so far are published
        assert_eq!(fps.tick(1001), Some(63));
        assert_eq!(fps.fps(), 63);
        assert_eq!(fps.tick(1017), None);
    }

    #[test]
    fn test_fps_tolerates_clock_going_backwards() {
        let mut fps = FpsCounter::new(5000);
        assert_eq!(fps.tick(10), None);
        assert_eq!(fps.fps(), 0);
    }
}
