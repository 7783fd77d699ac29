//! Scene assembly: geometry, material table, and background.

use crate::{
    Bvh, Color, HitRecord, Hittable, HittableList, Material, MaterialId, Primitive, SceneError,
    SceneResult,
};
use ember_math::{Interval, Ray};

/// What a ray sees when it escapes the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    /// Vertical blend from `horizon` (looking down) to `zenith` (looking up).
    Gradient { horizon: Color, zenith: Color },
    Solid(Color),
}

impl Background {
    /// White-to-blue sky.
    pub fn sky() -> Self {
        Background::Gradient {
            horizon: Color::ONE,
            zenith: Color::new(0.5, 0.7, 1.0),
        }
    }

    pub fn color(&self, ray: &Ray) -> Color {
        match self {
            Background::Gradient { horizon, zenith } => {
                let unit_direction = ray.direction().normalize_or_zero();
                let a = 0.5 * (unit_direction.y + 1.0);
                (1.0 - a) * *horizon + a * *zenith
            }
            Background::Solid(color) => *color,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::sky()
    }
}

/// A renderable scene.
///
/// Every material id referenced by the geometry is guaranteed to resolve,
/// so lookups on the trace path cannot fail.
#[derive(Debug, Clone)]
pub struct Scene {
    world: Bvh,
    materials: Vec<Material>,
    background: Background,
}

impl Scene {
    pub fn world(&self) -> &Bvh {
        &self.world
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.index()]
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        self.world.hit(ray, ray_t, rec)
    }
}

/// Incremental scene construction.
///
/// Register materials first, then add geometry that refers to them.
///
/// ```ignore
/// let mut builder = SceneBuilder::new();
/// let red = builder.add_material(Material::lambertian(Color::new(0.8, 0.1, 0.1)));
/// builder.add(Sphere::new(Vec3::ZERO, 1.0, red)?);
/// let scene = builder.build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    objects: HittableList,
    materials: Vec<Material>,
    background: Background,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId::new((self.materials.len() - 1) as u32)
    }

    pub fn add(&mut self, object: impl Into<Primitive>) -> &mut Self {
        self.objects.add(object);
        self
    }

    pub fn add_list(&mut self, list: HittableList) -> &mut Self {
        self.objects.append(list);
        self
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Validate material references and build the BVH.
    pub fn build(self) -> SceneResult<Scene> {
        let material_count = self.materials.len();
        if let Some(bad) = self
            .objects
            .iter()
            .map(Primitive::material)
            .find(|id| id.index() >= material_count)
        {
            return Err(SceneError::InvalidMaterial(bad));
        }

        let object_count = self.objects.len();
        let world = Bvh::new(self.objects)?;
        log::info!(
            "Scene built: {} objects, {} materials, BVH depth {}",
            object_count,
            material_count,
            world.depth()
        );

        Ok(Scene {
            world,
            materials: self.materials,
            background: self.background,
        })
    }
}
