// Transform helpers for glam::Mat4 used when moving scene primitives.
//
// glam already provides transform_point3(), transform_vector3() (w = 0)
// and inverse().

use crate::Vec3;
use glam::Mat4;

/// Extension trait for `Mat4`.
pub trait Mat4Ext {
    /// Rotation of `angle` radians about `axis`, pivoting around `pivot`.
    ///
    /// A zero axis yields the identity.
    fn rotation_about(pivot: Vec3, axis: Vec3, angle: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_about(pivot: Vec3, axis: Vec3, angle: f32) -> Mat4 {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return Mat4::IDENTITY;
        }
        Mat4::from_translation(pivot)
            * Mat4::from_axis_angle(axis, angle)
            * Mat4::from_translation(-pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_vector_ignores_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(mat.transform_vector3(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_rotation_about_pivot_keeps_pivot() {
        let pivot = Vec3::new(1.0, 2.0, 3.0);
        let mat = Mat4::rotation_about(pivot, Vec3::Y, FRAC_PI_2);
        let p = mat.transform_point3(pivot);
        assert_relative_eq!((p - pivot).length(), 0.0, epsilon = 1e-5);

        // +X swings onto -Z under a quarter turn about +Y.
        let q = mat.transform_point3(pivot + Vec3::X);
        assert_relative_eq!((q - (pivot - Vec3::Z)).length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_about_zero_axis_is_identity() {
        assert_eq!(Mat4::rotation_about(Vec3::ONE, Vec3::ZERO, 1.0), Mat4::IDENTITY);
    }

    #[test]
    fn test_rotation_round_trip() {
        let mat = Mat4::rotation_about(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0), 0.7);
        let point = Vec3::new(5.0, 3.0, 2.0);
        let back = mat.inverse().transform_point3(mat.transform_point3(point));
        assert_relative_eq!((back - point).length(), 0.0, epsilon = 1e-4);
    }
}
