//! Planar parallelogram primitive.

use crate::{HitRecord, Hittable, MaterialId, SceneError, SceneResult};
use ember_math::{Aabb, Interval, Mat4, Mat4Ext, Ray, Vec3};

/// Rays closer to parallel with the plane than this are treated as misses.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A parallelogram spanned by corner `q` and edge vectors `u` and `v`.
///
/// The plane data (`normal`, `d`, `w`) is derived from the corner and edges
/// and recomputed whenever the quad moves.
#[derive(Debug, Clone)]
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    normal: Vec3,
    d: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Quad {
    /// Create a quad. Parallel or zero-length edges are rejected.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: MaterialId) -> SceneResult<Self> {
        let n = u.cross(v);
        let area = n.length();
        if !(area.is_finite() && area > 1e-8) {
            return Err(SceneError::DegenerateQuad(area));
        }
        Ok(Self::from_edges(q, u, v, material))
    }

    fn from_edges(q: Vec3, u: Vec3, v: Vec3, material: MaterialId) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        let bbox = Aabb::surrounding(
            &Aabb::from_points(q, q + u + v),
            &Aabb::from_points(q + u, q + v),
        );

        Self {
            q,
            u,
            v,
            w: n / n.dot(n),
            normal,
            d: normal.dot(q),
            material,
            bbox,
        }
    }

    pub fn corner(&self) -> Vec3 {
        self.q
    }

    pub fn edges(&self) -> (Vec3, Vec3) {
        (self.u, self.v)
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn center(&self) -> Vec3 {
        self.q + 0.5 * (self.u + self.v)
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn translate(&mut self, offset: Vec3) {
        *self = Self::from_edges(self.q + offset, self.u, self.v, self.material);
    }

    /// Rotate about `axis` through the quad's center.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.rotate_about(self.center(), axis, angle);
    }

    pub fn rotate_about(&mut self, pivot: Vec3, axis: Vec3, angle: f32) {
        let m = Mat4::rotation_about(pivot, axis, angle);
        *self = Self::from_edges(
            m.transform_point3(self.q),
            m.transform_vector3(self.u),
            m.transform_vector3(self.v),
            self.material,
        );
    }
}

impl Hittable for Quad {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let denom = self.normal.dot(ray.direction());
        if denom.abs() < PARALLEL_EPSILON {
            return false;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.contains(t) {
            return false;
        }

        // Planar coordinates of the hit point in the (u, v) basis.
        let intersection = ray.at(t);
        let planar = intersection - self.q;
        let alpha = self.w.dot(planar.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar));

        let unit = Interval::new(0.0, 1.0);
        if !unit.contains(alpha) || !unit.contains(beta) {
            return false;
        }

        rec.t = t;
        rec.p = intersection;
        rec.u = alpha;
        rec.v = beta;
        rec.material = self.material;
        rec.set_face_normal(ray, self.normal);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
