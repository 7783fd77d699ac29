//! Ember math - vectors, rays, intervals and bounding boxes.
//!
//! Vector and matrix types come straight from glam; this crate adds the
//! ray-tracing specific pieces on top.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;
mod vec;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;
pub use vec::{reflect, refract, Vec3Ext, NEAR_ZERO_EPSILON};
