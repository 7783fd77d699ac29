//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in a flat arena and refer to their children by index. Every
//! node has exactly two children; a child is either another node or a
//! primitive. Built once from a [`HittableList`] and immutable afterwards.

use crate::{HitRecord, Hittable, HittableList, Primitive, SceneError, SceneResult};
use ember_math::{Aabb, Interval, Ray};

/// Child slot of a BVH node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Node(u32),
    Leaf(u32),
}

#[derive(Debug, Clone)]
struct BvhNode {
    bbox: Aabb,
    left: Child,
    right: Child,
}

/// Binary BVH over a set of primitives.
#[derive(Debug, Clone)]
pub struct Bvh {
    primitives: Vec<Primitive>,
    nodes: Vec<BvhNode>,
    root: u32,
}

impl Bvh {
    /// Build a BVH from a list of primitives.
    ///
    /// An empty list is an error; callers must supply at least one object.
    pub fn new(list: HittableList) -> SceneResult<Self> {
        if list.is_empty() {
            return Err(SceneError::EmptyBvh);
        }

        let primitives = list.into_primitives();
        let mut order: Vec<u32> = (0..primitives.len() as u32).collect();
        let mut nodes = Vec::with_capacity(primitives.len());
        let root = Self::build(&primitives, &mut order, &mut nodes);

        log::debug!(
            "Built BVH: {} primitives, {} nodes, depth {}",
            primitives.len(),
            nodes.len(),
            Self::depth_of(&nodes, root)
        );

        Ok(Self {
            primitives,
            nodes,
            root,
        })
    }

    /// Recursive construction over a span of primitive indices.
    ///
    /// The span is sorted by the minimum of each primitive's bounding box
    /// along the longest axis of the span's bounds and split at the
    /// midpoint. Spans of one primitive alias the same leaf on both sides.
    fn build(primitives: &[Primitive], span: &mut [u32], nodes: &mut Vec<BvhNode>) -> u32 {
        let bbox = span.iter().fold(Aabb::EMPTY, |acc, &i| {
            Aabb::surrounding(&acc, &primitives[i as usize].bounding_box())
        });

        let (left, right) = match span.len() {
            1 => (Child::Leaf(span[0]), Child::Leaf(span[0])),
            2 => (Child::Leaf(span[0]), Child::Leaf(span[1])),
            n => {
                let axis = bbox.longest_axis();
                span.sort_unstable_by(|&a, &b| {
                    let a_min = primitives[a as usize].bounding_box().axis_interval(axis).min;
                    let b_min = primitives[b as usize].bounding_box().axis_interval(axis).min;
                    a_min.total_cmp(&b_min)
                });

                let (lo, hi) = span.split_at_mut(n / 2);
                let left = Self::build(primitives, lo, nodes);
                let right = Self::build(primitives, hi, nodes);
                (Child::Node(left), Child::Node(right))
            }
        };

        nodes.push(BvhNode { bbox, left, right });
        (nodes.len() - 1) as u32
    }

    fn depth_of(nodes: &[BvhNode], index: u32) -> usize {
        let node = &nodes[index as usize];
        let child_depth = |child: Child| match child {
            Child::Node(i) => Self::depth_of(nodes, i),
            Child::Leaf(_) => 0,
        };
        1 + child_depth(node.left).max(child_depth(node.right))
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of node levels from the root down to the deepest leaf parent.
    pub fn depth(&self) -> usize {
        Self::depth_of(&self.nodes, self.root)
    }

    fn hit_child(&self, child: Child, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        match child {
            Child::Leaf(i) => self.primitives[i as usize].hit(ray, ray_t, rec),
            Child::Node(i) => self.hit_node(i, ray, ray_t, rec),
        }
    }

    fn hit_node(&self, index: u32, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let node = &self.nodes[index as usize];
        if !node.bbox.hit(ray, ray_t) {
            return false;
        }

        let hit_left = self.hit_child(node.left, ray, ray_t, rec);

        // Only check right up to closest hit
        let right_max = if hit_left { rec.t } else { ray_t.max };
        let hit_right = self.hit_child(node.right, ray, Interval::new(ray_t.min, right_max), rec);

        hit_left || hit_right
    }
}

impl Hittable for Bvh {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        self.hit_node(self.root, ray, ray_t, rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.nodes[self.root as usize].bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MaterialId, Quad, Sphere};
    use ember_math::Vec3;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sphere(center: Vec3, radius: f32, id: u32) -> Sphere {
        Sphere::new(center, radius, MaterialId::new(id)).unwrap()
    }

    /// Scatter of spheres and quads with a distinct material per object, so
    /// the hit record identifies which primitive was struck.
    fn random_list(seed: u64, count: usize) -> HittableList {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut list = HittableList::new();
        for i in 0..count {
            let center = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            if i % 3 == 0 {
                let u = Vec3::new(rng.gen_range(0.5..2.0), 0.0, rng.gen_range(-1.0..1.0));
                let v = Vec3::new(0.0, rng.gen_range(0.5..2.0), 0.0);
                list.add(Quad::new(center, u, v, MaterialId::new(i as u32)).unwrap());
            } else {
                list.add(sphere(center, rng.gen_range(0.2..1.5), i as u32));
            }
        }
        list
    }

    #[test]
    fn test_empty_bvh_is_an_error() {
        assert_eq!(Bvh::new(HittableList::new()).unwrap_err(), SceneError::EmptyBvh);
    }

    #[test]
    fn test_single_primitive() {
        let mut list = HittableList::new();
        list.add(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, 0));
        let bvh = Bvh::new(list).unwrap();
        assert_eq!(bvh.node_count(), 1);

        let mut rec = HitRecord::default();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_structure() {
        let bvh = Bvh::new(random_list(1, 100)).unwrap();
        assert_eq!(bvh.primitives().len(), 100);
        // At least n - 1 nodes; spans of one primitive add an aliasing node.
        assert!((99..200).contains(&bvh.node_count()));
        assert!(bvh.depth() <= 8);

        let bbox = bvh.bounding_box();
        for p in bvh.primitives() {
            let b = p.bounding_box();
            assert!(bbox.x.min <= b.x.min && b.x.max <= bbox.x.max);
            assert!(bbox.y.min <= b.y.min && b.y.max <= bbox.y.max);
            assert!(bbox.z.min <= b.z.min && b.z.max <= bbox.z.max);
        }
    }

    #[test]
    fn test_right_child_respects_left_hit() {
        // Near and far spheres along the same ray; the near one must win
        // regardless of which side of the split it lands on.
        let mut list = HittableList::new();
        list.add(sphere(Vec3::new(0.0, 0.0, -20.0), 1.0, 0));
        list.add(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, 1));
        list.add(sphere(Vec3::new(0.0, 0.0, -12.0), 1.0, 2));
        let bvh = Bvh::new(list).unwrap();

        let mut rec = HitRecord::default();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert_eq!(rec.material, MaterialId::new(1));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn bvh_matches_linear_scan(
            seed in 0u64..1000,
            ox in -15.0f32..15.0, oy in -15.0f32..15.0, oz in -15.0f32..15.0,
            dx in -1.0f32..1.0, dy in -1.0f32..1.0, dz in -1.0f32..1.0,
        ) {
            prop_assume!(Vec3::new(dx, dy, dz).length() > 1e-3);
            let list = random_list(seed, 40);
            let bvh = Bvh::new(list.clone()).unwrap();

            let ray = Ray::new(Vec3::new(ox, oy, oz), Vec3::new(dx, dy, dz));
            let ray_t = Interval::new(0.001, f32::INFINITY);
            let mut linear = HitRecord::default();
            let mut tree = HitRecord::default();

            let linear_hit = list.hit(&ray, ray_t, &mut linear);
            let tree_hit = bvh.hit(&ray, ray_t, &mut tree);
            prop_assert_eq!(linear_hit, tree_hit);
            if linear_hit {
                prop_assert!((linear.t - tree.t).abs() <= 1e-4 * linear.t.max(1.0));
                prop_assert!((linear.p - tree.p).length() <= 1e-3 * linear.t.max(1.0));
                prop_assert!((linear.normal - tree.normal).length() <= 1e-4);
                prop_assert_eq!(linear.front_face, tree.front_face);
                prop_assert_eq!(linear.material, tree.material);
            }
        }
    }
}
