//! Particle burst engine.
//!
//! Each note-on spawns a burst of short-lived luminous particles at a position
//! derived from the note number. Every frame the engine integrates motion,
//! decays life, culls dead particles and emits flat vertex buffers for a
//! point renderer.
//!
//! The simulation is step-based: one [`ParticleEngine::advance`] call is one
//! display frame, independent of wall time.

use crate::color::{color_for_note, ColorMode, Rgb};
use crate::note::MIDI_DATA_MAX;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::debug;

/// Hard cap on live particles
pub const MAX_PARTICLES: usize = 5000;

/// Number of most recent particles kept when the cap is exceeded
pub const KEEP_PARTICLES: usize = 3000;

/// Past positions remembered per particle
pub const TRAIL_LENGTH: usize = 5;

/// Default burst size at full velocity and intensity 1.0
pub const DEFAULT_BASE_COUNT: u32 = 50;

const DRAG: f32 = 0.998;
const GRAVITY: f32 = 0.001;
const BRIGHTNESS_BOOST: f32 = 1.5;
const SPREAD: f32 = 0.8;
const MIN_DECAY: f32 = 0.003;
const DECAY_RANGE: f32 = 0.005;
const BASE_SIZE: f32 = 1.2;
const SIZE_RANGE: f32 = 2.5;
const DEPTH_JITTER: f32 = 10.0;

/// A single simulated particle, owned exclusively by [`ParticleEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Current position
    pub position: Vec3,
    /// Displacement per frame
    pub velocity: Vec3,
    /// Remaining life in (0, 1]; the particle is removed once it reaches 0
    pub life: f32,
    /// Life lost per frame
    pub decay: f32,
    /// Base color of the burst
    pub color: Rgb,
    /// Point size at full life
    pub size: f32,
    trail: VecDeque<Vec3>,
}

impl Particle {
    /// Past positions, oldest first
    pub fn trail(&self) -> impl ExactSizeIterator<Item = &Vec3> {
        self.trail.iter()
    }

    /// Number of remembered past positions
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    fn step(&mut self) {
        self.trail.push_back(self.position);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }

        self.position += self.velocity;
        self.velocity *= DRAG;
        self.velocity.y -= GRAVITY;
        self.life -= self.decay;
    }
}

/// One renderable point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleVertex {
    /// World position
    pub position: Vec3,
    /// Vertex color
    pub color: Rgb,
    /// Point size
    pub size: f32,
}

/// Flat per-frame vertex arrays: xyz triples, rgb triples and one size per vertex.
///
/// Emission order is particle order, each particle followed by its trail
/// from oldest to newest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderBuffers {
    /// Positions, three floats per vertex
    pub positions: Vec<f32>,
    /// Colors, three floats per vertex
    pub colors: Vec<f32>,
    /// Sizes, one float per vertex
    pub sizes: Vec<f32>,
}

impl RenderBuffers {
    /// Create empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Drop all vertices, keeping allocations
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
    }

    /// Append a vertex
    pub fn push(&mut self, position: Vec3, color: Rgb, size: f32) {
        self.positions
            .extend_from_slice(&[position.x, position.y, position.z]);
        self.colors.extend_from_slice(&color.to_array());
        self.sizes.push(size);
    }

    /// Vertex at `index`
    pub fn vertex(&self, index: usize) -> Option<ParticleVertex> {
        let size = *self.sizes.get(index)?;
        let p = self.positions.get(index * 3..index * 3 + 3)?;
        let c = self.colors.get(index * 3..index * 3 + 3)?;
        Some(ParticleVertex {
            position: Vec3::new(p[0], p[1], p[2]),
            color: Rgb::new(c[0], c[1], c[2]),
            size,
        })
    }

    /// All vertices in emission order
    pub fn iter(&self) -> impl Iterator<Item = ParticleVertex> + '_ {
        (0..self.len()).filter_map(move |i| self.vertex(i))
    }
}

/// Spawn position for a note: pitch class spreads along x, octave along y
pub fn burst_origin(note: u8) -> (f32, f32) {
    let x = (f32::from(note % 12) - 6.0) * 5.0;
    let y = (f32::from(note / 12) - 5.0) * 3.0;
    (x, y)
}

/// Number of particles a burst spawns
pub fn burst_size(base_count: u32, velocity: u8, intensity: f32) -> usize {
    let scale = f64::from(velocity.min(MIDI_DATA_MAX)) / 127.0;
    let count = f64::from(base_count) * scale * f64::from(intensity);
    if !count.is_finite() {
        return 0;
    }
    count.max(0.0).floor() as usize
}

/// Owns every live particle and turns note events into bursts
pub struct ParticleEngine {
    particles: Vec<Particle>,
    base_count: u32,
    color_mode: ColorMode,
    rng: StdRng,
}

impl ParticleEngine {
    /// Create an engine seeded from the operating system
    pub fn new(base_count: u32, color_mode: ColorMode) -> Self {
        Self::with_rng(base_count, color_mode, StdRng::from_os_rng())
    }

    /// Create an engine with a fixed seed (reproducible bursts)
    pub fn with_seed(base_count: u32, color_mode: ColorMode, seed: u64) -> Self {
        Self::with_rng(base_count, color_mode, StdRng::seed_from_u64(seed))
    }

    fn with_rng(base_count: u32, color_mode: ColorMode, rng: StdRng) -> Self {
        Self {
            particles: Vec::with_capacity(KEEP_PARTICLES),
            base_count,
            color_mode,
            rng,
        }
    }

    /// Spawn a burst for a note. Returns the number of particles created.
    ///
    /// Notes and velocities above 127 are clamped to 127.
    pub fn spawn_burst(&mut self, note: u8, velocity: u8, intensity: f32) -> usize {
        let note = note.min(MIDI_DATA_MAX);
        let velocity = velocity.min(MIDI_DATA_MAX);
        let count = burst_size(self.base_count, velocity, intensity);
        if count == 0 {
            return 0;
        }

        let strength = f32::from(velocity) / 127.0;
        let (x, y) = burst_origin(note);
        let z = (self.rng.random::<f32>() - 0.5) * DEPTH_JITTER;
        let origin = Vec3::new(x, y, z);
        let color = color_for_note(note, self.color_mode);
        let size = BASE_SIZE + strength * SIZE_RANGE;

        // A burst past the cap would be trimmed to its own newest particles
        let built = if count > MAX_PARTICLES {
            self.particles.clear();
            KEEP_PARTICLES
        } else {
            count
        };

        self.particles.reserve(built);
        for _ in 0..built {
            let velocity = Vec3::new(
                (self.rng.random::<f32>() - 0.5) * SPREAD * strength,
                (self.rng.random::<f32>() - 0.5) * SPREAD * strength,
                (self.rng.random::<f32>() - 0.5) * SPREAD * strength,
            );
            self.particles.push(Particle {
                position: origin,
                velocity,
                life: 1.0,
                decay: MIN_DECAY + self.rng.random::<f32>() * DECAY_RANGE,
                color,
                size,
                trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            });
        }

        if self.particles.len() > MAX_PARTICLES {
            let excess = self.particles.len() - KEEP_PARTICLES;
            self.particles.drain(..excess);
            debug!(
                "Particle cap reached, dropped {} oldest (keeping {})",
                excess, KEEP_PARTICLES
            );
        }

        count
    }

    /// Advance every particle by one frame and remove the dead ones
    pub fn advance(&mut self) {
        for particle in &mut self.particles {
            particle.step();
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Build this frame's vertex buffers
    pub fn render_buffers(&self) -> RenderBuffers {
        let mut buffers = RenderBuffers::new();
        self.render_into(&mut buffers);
        buffers
    }

    /// Fill `buffers` with this frame's vertices, replacing previous contents
    pub fn render_into(&self, buffers: &mut RenderBuffers) {
        buffers.clear();
        for particle in &self.particles {
            buffers.push(
                particle.position,
                particle.color.scaled_clamped(particle.life * BRIGHTNESS_BOOST),
                particle.size * particle.life,
            );

            // Trails keep the unscaled color so they never fade to black
            let trail_len = particle.trail.len() as f32;
            for (i, point) in particle.trail.iter().enumerate() {
                let progress = i as f32 / trail_len;
                buffers.push(
                    *point,
                    particle.color,
                    particle.size * (0.3 + progress * 0.5),
                );
            }
        }
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when no particle is alive
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Abandon every in-flight particle
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Burst size at full velocity and intensity 1.0
    pub fn base_count(&self) -> u32 {
        self.base_count
    }

    /// Change the burst size for future bursts
    pub fn set_base_count(&mut self, base_count: u32) {
        self.base_count = base_count;
    }

    /// Palette used for future bursts
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Change the palette for future bursts
    pub fn set_color_mode(&mut self, color_mode: ColorMode) {
        self.color_mode = color_mode;
    }
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_COUNT, ColorMode::default())
    }
}
