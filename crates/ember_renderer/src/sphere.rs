//! Sphere primitive for ray tracing.

use crate::{HitRecord, Hittable, MaterialId, SceneError, SceneResult};
use ember_math::{Aabb, Interval, Mat4, Mat4Ext, Ray, Vec3};
use std::f32::consts::PI;

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    ///
    /// Zero, negative, and non-finite radii are rejected.
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> SceneResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SceneError::InvalidSphere(radius));
        }

        Ok(Self {
            center,
            radius,
            material,
            bbox: Self::bounds(center, radius),
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.center += offset;
        self.bbox = Self::bounds(self.center, self.radius);
    }

    /// A sphere is symmetric about its own center, so this does nothing.
    pub fn rotate(&mut self, _axis: Vec3, _angle: f32) {}

    /// Rotate the center about an arbitrary pivot.
    pub fn rotate_about(&mut self, pivot: Vec3, axis: Vec3, angle: f32) {
        self.center = Mat4::rotation_about(pivot, axis, angle).transform_point3(self.center);
        self.bbox = Self::bounds(self.center, self.radius);
    }

    fn bounds(center: Vec3, radius: f32) -> Aabb {
        let rvec = Vec3::splat(radius);
        Aabb::from_points(center - rvec, center + rvec)
    }

    /// UV coordinates for a point on the unit sphere centered at the origin.
    ///
    /// u wraps around the Y axis, v runs from the south pole (0) to the
    /// north pole (1).
    fn get_sphere_uv(p: Vec3) -> (f32, f32) {
        let u = 1.0 - (p.z.atan2(p.x) + PI) / (2.0 * PI);
        let v = (p.y.clamp(-1.0, 1.0).asin() + PI / 2.0) / PI;
        (u, v)
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return false;
            }
        }

        rec.t = root;
        rec.p = ray.at(rec.t);
        let outward_normal = (rec.p - self.center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        (rec.u, rec.v) = Self::get_sphere_uv(outward_normal);
        rec.material = self.material;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
