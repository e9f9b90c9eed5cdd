//! Note-driven color palettes.
//!
//! Every palette is a pure function of the note number, so notes in the same
//! pitch class always share a color.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linear RGB color with channels in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Rgb {
    /// Opaque white, used for unknown palettes
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    /// Create a color from channel values
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, clamping to 1.0
    pub fn scaled_clamped(&self, factor: f32) -> Self {
        Self {
            r: (self.r * factor).min(1.0),
            g: (self.g * factor).min(1.0),
            b: (self.b * factor).min(1.0),
        }
    }

    /// Channels as an array
    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Palette used to color particle bursts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Full hue wheel across the octave
    #[default]
    Rainbow,
    /// Reds through oranges
    Fire,
    /// Cyans through blues
    Ocean,
    /// Four saturated hues, one per group of three pitch classes
    Neon,
}

impl ColorMode {
    /// All palettes in display order
    pub const ALL: [ColorMode; 4] = [
        ColorMode::Rainbow,
        ColorMode::Fire,
        ColorMode::Ocean,
        ColorMode::Neon,
    ];

    /// Lowercase name as used in config files
    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Rainbow => "rainbow",
            ColorMode::Fire => "fire",
            ColorMode::Ocean => "ocean",
            ColorMode::Neon => "neon",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| CoreError::InvalidConfig(format!("unknown color mode '{}'", s)))
    }
}

// Neon hues in degrees: magenta, cyan, yellow, green
const NEON_HUES: [f32; 4] = [300.0, 180.0, 54.0, 120.0];

/// HSV to RGB, all inputs in 0.0..=1.0 (hue as a fraction of a turn).
///
/// Standard six-sector conversion, sector = `floor(h * 6) mod 6`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let scaled = h * 6.0;
    let sector = scaled.floor();
    let f = scaled - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match (sector as i64).rem_euclid(6) {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

/// Color for a note under the given palette
pub fn color_for_note(note: u8, mode: ColorMode) -> Rgb {
    let pitch_class = note % 12;
    let t = f32::from(pitch_class) / 12.0;

    match mode {
        ColorMode::Rainbow => hsv_to_rgb(t, 1.0, 0.85),
        // 18°..36°
        ColorMode::Fire => hsv_to_rgb((18.0 + t * 18.0) / 360.0, 1.0, 0.9),
        // 198°..252°
        ColorMode::Ocean => hsv_to_rgb((198.0 + t * 54.0) / 360.0, 1.0, 0.85),
        ColorMode::Neon => {
            let hue = NEON_HUES[usize::from(pitch_class / 3)];
            hsv_to_rgb(hue / 360.0, 1.0, 0.9)
        }
    }
}

/// Color for a note under a palette chosen by name; unknown names give opaque white
pub fn color_for_note_named(note: u8, mode: &str) -> Rgb {
    ColorMode::from_name(mode)
        .map(|mode| color_for_note(note, mode))
        .unwrap_or(Rgb::WHITE)
}
