//! Spectrum bars and waveform canvas.

use image::{Rgb, RgbImage};
use melodyviz_core::{hsv_to_rgb, SpectrumFrame, SpectrumRenderer};

/// Number of bars drawn across the canvas
pub const BAR_COUNT: usize = 64;

const BAR_GAP_PX: u32 = 2;
const CAP_HEIGHT_PX: u32 = 3;
const CAP_MIN_BAR_PX: f32 = 5.0;
const MAX_BAR_FRACTION: f32 = 0.8;
const WAVEFORM_ALPHA: f32 = 0.3;

/// Draws the spectrum snapshot into an image
pub struct SpectrumCanvas {
    image: RgbImage,
    last_peak: u8,
}

impl SpectrumCanvas {
    /// Create a `width` x `height` canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width.max(1), height.max(1)),
            last_peak: 0,
        }
    }

    /// The last drawn frame
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Peak of the last drawn frame
    pub fn last_peak(&self) -> u8 {
        self.last_peak
    }

    fn draw_bars(&mut self, frequencies: &[u8]) {
        let (width, height) = self.image.dimensions();
        let bar_width = width as f32 / BAR_COUNT as f32;
        let step = (frequencies.len() / BAR_COUNT).max(1);

        for i in 0..BAR_COUNT {
            let Some(&value) = frequencies.get(i * step) else {
                break;
            };
            let bar_height = bar_height(value, height);
            if bar_height <= 0.0 {
                continue;
            }

            let hue = i as f32 / BAR_COUNT as f32;
            let top_color = hsv_to_rgb(hue, 1.0, 0.9);
            let bottom_color = hsv_to_rgb(hue, 1.0, 0.4);
            let cap_color = hsv_to_rgb(hue, 0.4, 1.0);

            let x0 = (i as f32 * bar_width) as u32 + BAR_GAP_PX;
            let x1 = ((i + 1) as f32 * bar_width) as u32;
            let x1 = x1.saturating_sub(BAR_GAP_PX).min(width);
            let top = height.saturating_sub(bar_height.round() as u32);

            for y in top..height {
                // Vertical gradient, brighter at the top
                let t = (y - top) as f32 / bar_height.max(1.0);
                let color = [
                    lerp(top_color.r, bottom_color.r, t),
                    lerp(top_color.g, bottom_color.g, t),
                    lerp(top_color.b, bottom_color.b, t),
                ];
                let cap = bar_height > CAP_MIN_BAR_PX && y < top + CAP_HEIGHT_PX;
                let color = if cap { cap_color.to_array() } else { color };
                for x in x0..x1 {
                    self.image.put_pixel(x, y, to_pixel(color));
                }
            }
        }
    }

    fn draw_waveform(&mut self, waveform: &[u8]) {
        if waveform.is_empty() {
            return;
        }
        let (width, height) = self.image.dimensions();
        let slice = width as f32 / waveform.len() as f32;

        let mut previous: Option<(f32, f32)> = None;
        for (i, sample) in waveform.iter().enumerate() {
            let point = (i as f32 * slice, waveform_y(*sample, height));
            // Segments skip their start pixel so shared endpoints blend once
            self.blend_line(previous.unwrap_or(point), point);
            previous = Some(point);
        }
    }

    fn blend_line(&mut self, from: (f32, f32), to: (f32, f32)) {
        let (width, height) = self.image.dimensions();
        let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as u32;
        for s in 1..=steps {
            let t = s as f32 / steps as f32;
            let x = lerp(from.0, to.0, t).round();
            let y = lerp(from.1, to.1, t).round();
            if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
                continue;
            }
            let pixel = self.image.get_pixel_mut(x as u32, y as u32);
            for channel in pixel.0.iter_mut() {
                let blended = f32::from(*channel) * (1.0 - WAVEFORM_ALPHA) + 255.0 * WAVEFORM_ALPHA;
                *channel = blended.round() as u8;
            }
        }
    }
}

impl SpectrumRenderer for SpectrumCanvas {
    fn draw_spectrum(&mut self, frame: &SpectrumFrame) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb([0, 0, 0]);
        }
        self.draw_bars(&frame.frequencies);
        self.draw_waveform(&frame.waveform);
        self.last_peak = frame.peak();
    }
}

/// Bar height in pixels for a byte magnitude
pub fn bar_height(value: u8, canvas_height: u32) -> f32 {
    f32::from(value) / 255.0 * canvas_height as f32 * MAX_BAR_FRACTION
}

/// Vertical position of a waveform byte (128 sits at mid-height)
pub fn waveform_y(sample: u8, canvas_height: u32) -> f32 {
    f32::from(sample) / 128.0 * canvas_height as f32 / 2.0
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn to_pixel(color: [f32; 3]) -> Rgb<u8> {
    Rgb(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_and_waveform_geometry() {
        assert_eq!(bar_height(255, 100), 80.0);
        assert_eq!(bar_height(0, 100), 0.0);
        assert_eq!(waveform_y(128, 100), 50.0);
        assert_eq!(waveform_y(0, 100), 0.0);
    }

    #[test]
    fn test_full_bar_reaches_eighty_percent() {
        let mut canvas = SpectrumCanvas::new(640, 100);
        let frame = SpectrumFrame {
            frequencies: vec![255; 128],
            waveform: Vec::new(),
        };
        canvas.draw_spectrum(&frame);

        // Bars are 10 px wide with a 2 px gap each side; bar 2 covers x = 22..28
        let x = 24;
        assert_eq!(*canvas.image().get_pixel(20, 99), Rgb([0, 0, 0]));
        assert_ne!(*canvas.image().get_pixel(x, 99), Rgb([0, 0, 0]));
        assert_ne!(*canvas.image().get_pixel(x, 20), Rgb([0, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(x, 19), Rgb([0, 0, 0]));
        assert_eq!(canvas.last_peak(), 255);
    }

    #[test]
    fn test_silence_draws_midline_waveform() {
        let mut canvas = SpectrumCanvas::new(64, 64);
        let frame = SpectrumFrame {
            frequencies: vec![0; 32],
            waveform: vec![128; 64],
        };
        canvas.draw_spectrum(&frame);

        let mid = canvas.image().get_pixel(10, 32);
        // 30 % white over black
        assert_eq!(*mid, Rgb([77, 77, 77]));
        assert_eq!(*canvas.image().get_pixel(10, 10), Rgb([0, 0, 0]));
        assert_eq!(canvas.last_peak(), 0);
    }
}
