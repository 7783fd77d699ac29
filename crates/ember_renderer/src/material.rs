//! Surface materials.
//!
//! Materials live in the scene's material table and are referenced from
//! primitives and hit records by [`MaterialId`].

use crate::sampling::{gen_f32, random_in_unit_sphere, random_unit_vector};
use crate::{HitRecord, Texture};
use ember_math::{reflect, refract, Ray, Vec3, Vec3Ext};
use rand::RngCore;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Index of a material in the scene's material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialId(u32);

impl MaterialId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Outcome of a scattering event.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// How light interacts with a surface.
#[derive(Debug, Clone)]
pub enum Material {
    /// Ideal diffuse reflector.
    Lambertian { albedo: Texture },
    /// Specular reflector. `fuzz` of 0 is a perfect mirror.
    Metal { albedo: Color, fuzz: f32 },
    /// Clear refractive material such as glass or water.
    Dielectric { refraction_index: f32 },
    /// Emitter that never scatters.
    DiffuseLight { emit: Texture },
}

impl Material {
    pub fn lambertian(albedo: Color) -> Self {
        Material::Lambertian {
            albedo: Texture::Solid(albedo),
        }
    }

    pub fn lambertian_textured(albedo: Texture) -> Self {
        Material::Lambertian { albedo }
    }

    /// Create a metal. `fuzz` is clamped to [0, 1].
    pub fn metal(albedo: Color, fuzz: f32) -> Self {
        Material::Metal {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    /// Create a dielectric.
    ///
    /// `refraction_index` is relative to the enclosing medium: 1.5 for glass
    /// in air, 1/1.33 for an air bubble in water.
    pub fn dielectric(refraction_index: f32) -> Self {
        Material::Dielectric { refraction_index }
    }

    pub fn diffuse_light(emit: Color) -> Self {
        Material::DiffuseLight {
            emit: Texture::Solid(emit),
        }
    }

    pub fn diffuse_light_textured(emit: Texture) -> Self {
        Material::DiffuseLight { emit }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        match self {
            Material::Lambertian { albedo } => {
                let mut scatter_direction = rec.normal + random_unit_vector(rng);

                // Catch degenerate scatter direction
                if scatter_direction.near_zero() {
                    scatter_direction = rec.normal;
                }

                Some(ScatterResult {
                    attenuation: albedo.value(rec.u, rec.v, rec.p),
                    scattered: Ray::new(rec.p, scatter_direction),
                })
            }

            Material::Metal { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction().normalize(), rec.normal);
                let scattered_dir = reflected + *fuzz * random_in_unit_sphere(rng);

                // Fuzzed rays that end up below the surface are absorbed.
                if scattered_dir.dot(rec.normal) > 0.0 {
                    Some(ScatterResult {
                        attenuation: *albedo,
                        scattered: Ray::new(rec.p, scattered_dir),
                    })
                } else {
                    None
                }
            }

            Material::Dielectric { refraction_index } => {
                let ri = if rec.front_face {
                    1.0 / refraction_index
                } else {
                    *refraction_index
                };

                let unit_direction = ray_in.direction().normalize();
                let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                let cannot_refract = ri * sin_theta > 1.0;
                let direction = if cannot_refract || reflectance(cos_theta, ri) > gen_f32(rng) {
                    reflect(unit_direction, rec.normal)
                } else {
                    refract(unit_direction, rec.normal, ri)
                };

                Some(ScatterResult {
                    attenuation: Color::ONE,
                    scattered: Ray::new(rec.p, direction),
                })
            }

            Material::DiffuseLight { .. } => None,
        }
    }

    /// Light emitted at a surface point. Black for everything but lights.
    pub fn emitted(&self, u: f32, v: f32, p: Vec3) -> Color {
        match self {
            Material::DiffuseLight { emit } => emit.value(u, v, p),
            _ => Color::ZERO,
        }
    }
}

/// Schlick's approximation for reflectance
fn reflectance(cosine: f32, refraction_index: f32) -> f32 {
    let r0 = ((1.0 - refraction_index) / (1.0 + refraction_index)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
