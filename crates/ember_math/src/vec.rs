use crate::Vec3;

/// Components smaller than this (in magnitude) count as zero.
pub const NEAR_ZERO_EPSILON: f32 = 1e-8;

/// Ray-tracing helpers on top of `glam::Vec3`.
pub trait Vec3Ext {
    /// True when every component is within [`NEAR_ZERO_EPSILON`] of zero.
    fn near_zero(&self) -> bool;
}

impl Vec3Ext for Vec3 {
    #[inline]
    fn near_zero(&self) -> bool {
        self.abs().max_element() < NEAR_ZERO_EPSILON
    }
}

/// Mirror `v` about the surface normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Bend the unit vector `uv` through a surface with unit normal `n`
/// (facing against `uv`), following Snell's law with `etai_over_etat`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}
