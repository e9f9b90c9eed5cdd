//! Software point renderer for particle buffers.
//!
//! Projects each vertex through a fixed perspective camera and splats a soft
//! round sprite with additive blending, then tone-maps into an RGB image.

use glam::{Mat4, Vec3, Vec4};
use image::{Rgb, RgbImage};
use melodyviz_core::{ParticleRenderer, RenderBuffers};

const FOV_Y_DEGREES: f32 = 75.0;
const CAMERA_Z: f32 = 50.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;
const EXPOSURE: f32 = 2.5;
const MAX_RADIUS_PX: f32 = 64.0;

/// Sprite alpha by normalized distance from the center
const SPRITE_STOPS: [(f32, f32); 6] = [
    (0.0, 1.0),
    (0.15, 0.9),
    (0.3, 0.6),
    (0.5, 0.2),
    (0.7, 0.05),
    (1.0, 0.0),
];

/// Renders particle vertices into an image
pub struct PointRenderer {
    width: u32,
    height: u32,
    view_proj: Mat4,
    accum: Vec<Vec3>,
    image: RgbImage,
    last_vertices: usize,
}

impl PointRenderer {
    /// Create a renderer for a `width` x `height` canvas
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let aspect = width as f32 / height as f32;
        let projection = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, NEAR, FAR);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, CAMERA_Z), Vec3::ZERO, Vec3::Y);

        Self {
            width,
            height,
            view_proj: projection * view,
            accum: vec![Vec3::ZERO; (width * height) as usize],
            image: RgbImage::new(width, height),
            last_vertices: 0,
        }
    }

    /// The last rendered frame
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Vertices handed over in the last frame
    pub fn last_vertices(&self) -> usize {
        self.last_vertices
    }

    /// Screen position and pixel radius of a world point, `None` when behind the camera
    pub fn project(&self, position: Vec3, size: f32) -> Option<(f32, f32, f32)> {
        let clip = self.view_proj * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        // Size attenuation: world size scaled by half the canvas height over depth
        let radius = (size * self.height as f32 * 0.5 / clip.w).clamp(0.5, MAX_RADIUS_PX);
        Some((x, y, radius))
    }

    fn splat(&mut self, cx: f32, cy: f32, radius: f32, color: Vec3) {
        let min_x = (cx - radius).floor().max(0.0) as u32;
        let max_x = (cx + radius).ceil().min(self.width as f32 - 1.0);
        let min_y = (cy - radius).floor().max(0.0) as u32;
        let max_y = (cy + radius).ceil().min(self.height as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }

        for y in min_y..=max_y as u32 {
            for x in min_x..=max_x as u32 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let alpha = sprite_alpha((dx * dx + dy * dy).sqrt() / radius);
                if alpha > 0.0 {
                    self.accum[(y * self.width + x) as usize] += color * alpha;
                }
            }
        }
    }

    fn resolve(&mut self) {
        for (pixel, light) in self.image.pixels_mut().zip(&self.accum) {
            *pixel = Rgb([tone_map(light.x), tone_map(light.y), tone_map(light.z)]);
        }
    }
}

impl ParticleRenderer for PointRenderer {
    fn draw_particles(&mut self, buffers: &RenderBuffers) {
        self.accum.fill(Vec3::ZERO);
        for vertex in buffers.iter() {
            if let Some((x, y, radius)) = self.project(vertex.position, vertex.size) {
                let color = Vec3::from_array(vertex.color.to_array());
                self.splat(x, y, radius, color);
            }
        }
        self.resolve();
        self.last_vertices = buffers.len();
    }
}

/// Piecewise-linear sprite falloff; 0 outside the unit radius
fn sprite_alpha(distance: f32) -> f32 {
    if distance >= 1.0 {
        return 0.0;
    }
    SPRITE_STOPS
        .windows(2)
        .find(|pair| distance <= pair[1].0)
        .map(|pair| {
            let (d0, a0) = pair[0];
            let (d1, a1) = pair[1];
            a0 + (a1 - a0) * (distance - d0) / (d1 - d0)
        })
        .unwrap_or(0.0)
}

/// Exposure tone mapping into 0-255
fn tone_map(light: f32) -> u8 {
    let mapped = 1.0 - (-light * EXPOSURE).exp();
    (mapped.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use melodyviz_core::Rgb as Color;

    #[test]
    fn test_origin_projects_to_center() {
        let renderer = PointRenderer::new(200, 100);
        let (x, y, radius) = renderer.project(Vec3::ZERO, 2.0).unwrap();
        assert!((x - 100.0).abs() < 1e-3);
        assert!((y - 50.0).abs() < 1e-3);
        // 2.0 * 50 / 50
        assert!((radius - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_points_behind_camera_are_skipped() {
        let renderer = PointRenderer::new(64, 64);
        assert!(renderer.project(Vec3::new(0.0, 0.0, 60.0), 1.0).is_none());
    }

    #[test]
    fn test_sprite_falloff() {
        assert_eq!(sprite_alpha(0.0), 1.0);
        assert!((sprite_alpha(0.4) - 0.4).abs() < 1e-6);
        assert_eq!(sprite_alpha(1.0), 0.0);
        assert_eq!(sprite_alpha(3.0), 0.0);
    }

    #[test]
    fn test_draw_lights_center_pixel() {
        let mut renderer = PointRenderer::new(64, 64);
        let mut buffers = RenderBuffers::new();
        buffers.push(Vec3::ZERO, Color::new(1.0, 0.0, 0.0), 3.0);
        renderer.draw_particles(&buffers);

        let center = renderer.image().get_pixel(32, 32);
        assert!(center[0] > 100);
        assert_eq!(center[1], 0);
        assert_eq!(*renderer.image().get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(renderer.last_vertices(), 1);
    }

    #[test]
    fn test_empty_frame_is_black() {
        let mut renderer = PointRenderer::new(16, 16);
        renderer.draw_particles(&RenderBuffers::new());
        assert!(renderer.image().pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
