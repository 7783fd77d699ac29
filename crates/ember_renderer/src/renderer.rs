//! Core path tracing.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with bounded depth
//! - Emission from lights and a configurable background
//! - Gamma correction to 8-bit output

use crate::{Color, HitRecord, Scene};
use ember_math::{Interval, Ray};
use rand::RngCore;

/// Display gamma. Output is encoded with exponent `1 / GAMMA`.
pub const GAMMA: f32 = 2.2;

/// Intersections closer than this are ignored, so secondary rays do not
/// re-hit the surface they leave.
pub const T_MIN: f32 = 0.001;

/// Progressive render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Sample slots per pixel; a pixel is the mean of its slots
    pub samples_per_pixel: u32,
    /// Full passes over every slot before the image counts as converged
    pub max_passes: u32,
    /// Frame rate the per-frame ray budget aims for
    pub target_fps: f32,
    /// Seed for the slot order and per-sample generators
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 4,
            max_passes: 10,
            target_fps: 30.0,
            seed: 0x5eed,
        }
    }
}

impl From<&ember_core::ViewerConfig> for RenderConfig {
    fn from(config: &ember_core::ViewerConfig) -> Self {
        Self {
            samples_per_pixel: config.samples_per_pixel.max(1),
            max_passes: config.max_passes.max(1),
            target_fps: config.target_fps,
            seed: config.seed,
        }
    }
}

/// Compute the color seen by a ray.
///
/// Traces the ray through the scene, bouncing off surfaces and
/// accumulating emission until the ray escapes, is absorbed, or runs out
/// of depth.
pub fn ray_color(ray: &Ray, scene: &Scene, depth: u32, rng: &mut dyn RngCore) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::default();
    if !scene.hit(ray, Interval::new(T_MIN, f32::INFINITY), &mut rec) {
        return scene.background().color(ray);
    }

    let material = scene.material(rec.material);
    let emission = material.emitted(rec.u, rec.v, rec.p);

    match material.scatter(ray, &rec, rng) {
        Some(result) => {
            let scattered_color = ray_color(&result.scattered, scene, depth - 1, rng);
            emission + result.attenuation * scattered_color
        }
        None => emission,
    }
}

/// Apply gamma correction. Negative input maps to 0.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(1.0 / GAMMA)
    } else {
        0.0
    }
}

/// Convert a linear color to gamma-encoded 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)).round() as u8;
    [encode(color.x), encode(color.y), encode(color.z), 255]
}
