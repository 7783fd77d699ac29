//! Surface textures.

use crate::{Color, Perlin};
use ember_core::ImageData;
use ember_math::Vec3;
use rand::RngCore;
use std::sync::Arc;

/// Color returned for image textures that have no pixel data.
const MISSING_TEXTURE: Color = Color::new(1.0, 0.0, 1.0);

/// Octaves of turbulence used by the marble noise texture.
const TURBULENCE_DEPTH: u32 = 7;

/// A color as a function of surface UV and hit point.
#[derive(Debug, Clone)]
pub enum Texture {
    Solid(Color),
    /// 3D checkerboard alternating between two sub-textures.
    Checker {
        inv_scale: f32,
        even: Box<Texture>,
        odd: Box<Texture>,
    },
    /// Bitmap lookup by UV. An empty image renders as solid magenta.
    Image(Arc<ImageData>),
    /// Marble-like pattern driven by Perlin turbulence.
    Noise { noise: Arc<Perlin>, scale: f32 },
}

impl Texture {
    pub fn solid(color: Color) -> Self {
        Texture::Solid(color)
    }

    pub fn checker(scale: f32, even: Texture, odd: Texture) -> Self {
        Texture::Checker {
            inv_scale: 1.0 / scale,
            even: Box::new(even),
            odd: Box::new(odd),
        }
    }

    pub fn checker_colors(scale: f32, even: Color, odd: Color) -> Self {
        Self::checker(scale, Texture::Solid(even), Texture::Solid(odd))
    }

    pub fn image(image: Arc<ImageData>) -> Self {
        Texture::Image(image)
    }

    pub fn noise(scale: f32, rng: &mut dyn RngCore) -> Self {
        Texture::Noise {
            noise: Arc::new(Perlin::new(rng)),
            scale,
        }
    }

    pub fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        match self {
            Texture::Solid(color) => *color,

            Texture::Checker { inv_scale, even, odd } => {
                let cell = (p * *inv_scale).floor();
                let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;
                if sum.rem_euclid(2) == 0 {
                    even.value(u, v, p)
                } else {
                    odd.value(u, v, p)
                }
            }

            Texture::Image(image) => {
                if image.is_empty() {
                    return MISSING_TEXTURE;
                }

                // Image rows run top to bottom, v runs bottom to top.
                let u = u.clamp(0.0, 1.0);
                let v = 1.0 - v.clamp(0.0, 1.0);
                let i = ((u * image.width() as f32) as u32).min(image.width() - 1);
                let j = ((v * image.height() as f32) as u32).min(image.height() - 1);
                image.pixel(i, j)
            }

            Texture::Noise { noise, scale } => {
                let phase = scale * p.z + 10.0 * noise.turb(p, TURBULENCE_DEPTH);
                Color::splat(0.5 * (1.0 + phase.sin()))
            }
        }
    }
}

impl From<Color> for Texture {
    fn from(color: Color) -> Self {
        Texture::Solid(color)
    }
}
