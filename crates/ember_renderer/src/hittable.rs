//! Hittable trait, HitRecord, and the closed set of scene primitives.

use crate::{MaterialId, Quad, Sphere};
use ember_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material of the surface that was hit
    pub material: MaterialId,
    /// UV texture coordinates
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl HitRecord {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object within the given interval.
    ///
    /// Returns true if hit, and fills in the hit record.
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}

/// A renderable shape.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Quad(Quad),
}

impl Primitive {
    pub fn material(&self) -> MaterialId {
        match self {
            Primitive::Sphere(s) => s.material(),
            Primitive::Quad(q) => q.material(),
        }
    }

    pub fn translate(&mut self, offset: Vec3) {
        match self {
            Primitive::Sphere(s) => s.translate(offset),
            Primitive::Quad(q) => q.translate(offset),
        }
    }

    /// Rotate about `axis` through the primitive's own center.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        match self {
            Primitive::Sphere(s) => s.rotate(axis, angle),
            Primitive::Quad(q) => q.rotate(axis, angle),
        }
    }
}

impl Hittable for Primitive {
    #[inline]
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        match self {
            Primitive::Sphere(s) => s.hit(ray, ray_t, rec),
            Primitive::Quad(q) => q.hit(ray, ray_t, rec),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Sphere(s) => s.bounding_box(),
            Primitive::Quad(q) => q.bounding_box(),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Quad> for Primitive {
    fn from(quad: Quad) -> Self {
        Primitive::Quad(quad)
    }
}

/// A list of primitives, tested by linear scan.
///
/// Used to gather geometry before it is handed to [`crate::Bvh`], and to
/// move or rotate groups (such as the six faces of a box) as one unit.
#[derive(Debug, Clone, Default)]
pub struct HittableList {
    objects: Vec<Primitive>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: impl Into<Primitive>) {
        let object = object.into();
        self.bbox = Aabb::surrounding(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    /// Move every object of `other` into this list.
    pub fn append(&mut self, other: HittableList) {
        for object in other.objects {
            self.add(object);
        }
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.objects.iter()
    }

    pub fn into_primitives(self) -> Vec<Primitive> {
        self.objects
    }

    /// Translate every object by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for object in &mut self.objects {
            object.translate(offset);
        }
        self.bbox = self.bbox.translate(offset);
    }

    /// Rotate every object about `axis` through the list's bounding box
    /// center, keeping the group rigid.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        let pivot = self.bbox.centroid();
        for object in &mut self.objects {
            match object {
                Primitive::Sphere(s) => s.rotate_about(pivot, axis, angle),
                Primitive::Quad(q) => q.rotate_about(pivot, axis, angle),
            }
        }
        self.recompute_bbox();
    }

    fn recompute_bbox(&mut self) {
        self.bbox = self
            .objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            let interval = Interval::new(ray_t.min, closest_so_far);
            if object.hit(ray, interval, rec) {
                hit_anything = true;
                closest_so_far = rec.t;
            }
        }

        hit_anything
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mat() -> MaterialId {
        MaterialId::new(0)
    }

    #[test]
    fn test_set_face_normal() {
        let mut rec = HitRecord::default();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        rec.set_face_normal(&ray, Vec3::Z);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);

        rec.set_face_normal(&ray, Vec3::NEG_Z);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_list_returns_closest_hit() {
        let mut list = HittableList::new();
        list.add(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, mat()).unwrap());
        list.add(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, MaterialId::new(1)).unwrap());

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let mut rec = HitRecord::default();
        assert!(list.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert_relative_eq!(rec.t, 4.0, epsilon = 1e-4);
        assert_eq!(rec.material, MaterialId::new(1));
    }

    #[test]
    fn test_list_bbox_tracks_contents() {
        let mut list = HittableList::new();
        assert!(list.is_empty());
        list.add(Sphere::new(Vec3::ZERO, 1.0, mat()).unwrap());
        list.add(Sphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0, mat()).unwrap());
        assert_eq!(list.len(), 2);
        assert_relative_eq!(list.bounding_box().x.min, -1.0);
        assert_relative_eq!(list.bounding_box().x.max, 5.0);

        list.translate(Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(list.bounding_box().y.min, 1.0);
        assert_relative_eq!(list.bounding_box().y.max, 3.0);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.bounding_box(), Aabb::EMPTY);
    }

    #[test]
    fn test_group_rotation_is_rigid() {
        let mut list = HittableList::new();
        list.add(Sphere::new(Vec3::new(-2.0, 0.0, 0.0), 0.5, mat()).unwrap());
        list.add(Sphere::new(Vec3::new(2.0, 0.0, 0.0), 0.5, mat()).unwrap());

        // Half a turn about Y through the group center swaps the spheres.
        list.rotate(Vec3::Y, std::f32::consts::PI);
        let centers: Vec<Vec3> = list.iter().map(|p| p.bounding_box().centroid()).collect();
        assert_relative_eq!(centers[0].x, 2.0, epsilon = 1e-4);
        assert_relative_eq!(centers[1].x, -2.0, epsilon = 1e-4);
    }
}
