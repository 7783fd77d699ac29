//! Ember Renderer - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer built for interactive use: instead of blocking
//! until an image is finished, [`ProgressiveRenderer`] traces as many
//! samples as fit in a frame-time budget and blends them into a running
//! per-pixel average that converges over successive frames.
//!
//! Scene data is a closed set of primitives ([`Sphere`], [`Quad`]),
//! materials and textures, stored in arenas and addressed by index. The
//! [`Bvh`] built over the primitives is immutable once constructed.

mod bvh;
mod camera;
mod error;
mod hittable;
mod input;
mod material;
mod perlin;
mod progressive;
mod quad;
mod renderer;
mod sampling;
mod scene;
pub mod scenes;
mod sphere;
mod texture;

pub use bvh::Bvh;
pub use camera::{Camera, MAX_DEPTH_LIMIT};
pub use error::{SceneError, SceneResult};
pub use hittable::{HitRecord, Hittable, HittableList, Primitive};
pub use input::InputState;
pub use material::{Color, Material, MaterialId, ScatterResult};
pub use perlin::Perlin;
pub use progressive::{FrameStats, ProgressiveRenderer, RenderState};
pub use quad::Quad;
pub use renderer::{color_to_rgba, linear_to_gamma, ray_color, RenderConfig, GAMMA, T_MIN};
pub use scene::{Background, Scene, SceneBuilder};
pub use sphere::Sphere;
pub use texture::Texture;

/// Re-export Vec3 and common math types from ember_math
pub use ember_math::{Aabb, Interval, Ray, Vec3};
