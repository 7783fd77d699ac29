//! Built-in demo scenes.
//!
//! Each scene comes with a camera placed to frame it. Resolution and depth
//! are left to the caller.

use crate::sampling::{gen_f32, gen_range_f32, random_vec3};
use crate::{
    Background, Camera, Color, HittableList, Material, MaterialId, Quad, Scene, SceneBuilder,
    SceneResult, Sphere, Texture,
};
use ember_core::{ImageCache, ImageData, SceneKind};
use ember_math::Vec3;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;

/// A scene and the camera that frames it.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub scene: Scene,
    pub camera: Camera,
}

/// Build the scene selected in the configuration.
///
/// A missing or unreadable texture never fails the build; the textured
/// scene falls back to an empty image, which renders magenta.
pub fn build(
    kind: SceneKind,
    images: &mut ImageCache,
    texture_path: Option<&str>,
    seed: u64,
) -> SceneResult<DemoScene> {
    let mut rng = StdRng::seed_from_u64(seed);
    log::info!("Building scene {:?}", kind);

    match kind {
        SceneKind::Spheres => random_spheres(&mut rng),
        SceneKind::Cornell => cornell_box(555.0),
        SceneKind::Textured => {
            let image = match texture_path {
                Some(path) => images.load_or_placeholder(path),
                None => {
                    log::warn!("Textured scene without texture_path, using placeholder");
                    Arc::new(ImageData::default())
                }
            };
            textured(image, &mut rng)
        }
    }
}

/// Field of small random spheres around three large ones on a checkered
/// ground.
pub fn random_spheres(rng: &mut dyn RngCore) -> SceneResult<DemoScene> {
    let mut builder = SceneBuilder::new().with_background(Background::sky());

    let ground = builder.add_material(Material::lambertian_textured(Texture::checker_colors(
        0.32,
        Color::new(0.2, 0.3, 0.1),
        Color::new(0.9, 0.9, 0.9),
    )));
    builder.add(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground)?);

    for a in -11..11 {
        for b in -11..11 {
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(rng),
                0.2,
                b as f32 + 0.9 * gen_f32(rng),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat = gen_f32(rng);
            let material = if choose_mat < 0.8 {
                let albedo = random_vec3(rng, 0.0, 1.0) * random_vec3(rng, 0.0, 1.0);
                Material::lambertian(albedo)
            } else if choose_mat < 0.95 {
                Material::metal(random_vec3(rng, 0.5, 1.0), gen_range_f32(rng, 0.0, 0.5))
            } else {
                Material::dielectric(1.5)
            };
            let id = builder.add_material(material);
            builder.add(Sphere::new(center, 0.2, id)?);
        }
    }

    let glass = builder.add_material(Material::dielectric(1.5));
    builder.add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, glass)?);

    let bubble = builder.add_material(Material::dielectric(1.0 / 1.5));
    builder.add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 0.8, bubble)?);

    let diffuse = builder.add_material(Material::lambertian(Color::new(0.4, 0.2, 0.1)));
    builder.add(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, diffuse)?);

    let metal = builder.add_material(Material::metal(Color::new(0.7, 0.6, 0.5), 0.0));
    builder.add(Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0, metal)?);

    let camera = Camera::new()
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0)
        .with_movement_speed(2.0);

    Ok(DemoScene {
        scene: builder.build()?,
        camera,
    })
}

/// Walled room lit by a ceiling panel, with two rotated boxes.
///
/// The room is `size` units on a side, centered on x = 0, y = 0, and spans
/// z from `-0.5 * size` to `-1.5 * size`. The front is open and the camera
/// sits at the origin looking in.
pub fn cornell_box(size: f32) -> SceneResult<DemoScene> {
    let mut builder = SceneBuilder::new().with_background(Background::Solid(Color::ZERO));

    let ivory = builder.add_material(Material::lambertian(Color::new(0.4, 0.4, 0.3)));
    let red = builder.add_material(Material::lambertian(Color::new(0.3, 0.1, 0.1)));
    let green = builder.add_material(Material::lambertian(Color::new(0.3, 0.4, 0.1)));
    let light = builder.add_material(Material::diffuse_light(Color::splat(15.0)));

    let half = size * 0.5;
    let near = -half;
    let far = -size * 1.5;

    // Left, back and right walls
    builder.add(Quad::new(Vec3::new(-half, -half, near), Vec3::new(0.0, 0.0, -size), Vec3::new(0.0, size, 0.0), red)?);
    builder.add(Quad::new(Vec3::new(-half, -half, far), Vec3::new(size, 0.0, 0.0), Vec3::new(0.0, size, 0.0), ivory)?);
    builder.add(Quad::new(Vec3::new(half, -half, far), Vec3::new(0.0, 0.0, size), Vec3::new(0.0, size, 0.0), green)?);
    // Ceiling, light panel just below it, floor
    builder.add(Quad::new(Vec3::new(-half, half, far), Vec3::new(size, 0.0, 0.0), Vec3::new(0.0, 0.0, size), ivory)?);
    builder.add(Quad::new(
        Vec3::new(-size * 0.25, half - 0.01, -size * 1.25),
        Vec3::new(half, 0.0, 0.0),
        Vec3::new(0.0, 0.0, half),
        light,
    )?);
    builder.add(Quad::new(Vec3::new(-half, -half, near), Vec3::new(size, 0.0, 0.0), Vec3::new(0.0, 0.0, -size), ivory)?);

    let unit = size / 555.0;
    let mut tall = make_box(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0) * unit, ivory)?;
    tall.rotate(Vec3::Y, 15f32.to_radians());
    tall.translate(Vec3::new(-140.0, -half / unit, -1.15 * 555.0) * unit);
    builder.add_list(tall);

    let mut short = make_box(Vec3::ZERO, Vec3::splat(165.0) * unit, ivory)?;
    short.rotate(Vec3::Y, (-18f32).to_radians());
    short.translate(Vec3::new(20.0, -half / unit, -0.85 * 555.0) * unit);
    builder.add_list(short);

    let camera = Camera::new()
        .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -size), Vec3::Y)
        .with_lens(60.0, 0.0, size)
        .with_movement_speed(size.sqrt());

    Ok(DemoScene {
        scene: builder.build()?,
        camera,
    })
}

/// Image-mapped globe next to a marble sphere on a checkered floor.
pub fn textured(image: Arc<ImageData>, rng: &mut dyn RngCore) -> SceneResult<DemoScene> {
    let mut builder = SceneBuilder::new().with_background(Background::sky());

    let floor = builder.add_material(Material::lambertian_textured(Texture::checker_colors(
        1.0,
        Color::new(0.2, 0.3, 0.1),
        Color::splat(0.9),
    )));
    builder.add(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, floor)?);

    let globe = builder.add_material(Material::lambertian_textured(Texture::image(image)));
    builder.add(Sphere::new(Vec3::new(-2.2, 2.0, 0.0), 2.0, globe)?);

    let marble = builder.add_material(Material::lambertian_textured(Texture::noise(4.0, rng)));
    builder.add(Sphere::new(Vec3::new(2.2, 2.0, 0.0), 2.0, marble)?);

    let lamp = builder.add_material(Material::diffuse_light(Color::splat(4.0)));
    builder.add(Quad::new(Vec3::new(-1.0, 5.5, -1.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0), lamp)?);

    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 3.0, 12.0), Vec3::new(0.0, 2.0, 0.0), Vec3::Y)
        .with_lens(35.0, 0.0, 12.0)
        .with_movement_speed(3.0);

    Ok(DemoScene {
        scene: builder.build()?,
        camera,
    })
}

/// The six faces of the axis-aligned box with opposite corners `a` and `b`.
pub fn make_box(a: Vec3, b: Vec3, material: MaterialId) -> SceneResult<HittableList> {
    let min = a.min(b);
    let max = a.max(b);

    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    let mut sides = HittableList::new();
    sides.add(Quad::new(Vec3::new(min.x, min.y, max.z), dx, dy, material)?); // front
    sides.add(Quad::new(Vec3::new(max.x, min.y, max.z), -dz, dy, material)?); // right
    sides.add(Quad::new(Vec3::new(max.x, min.y, min.z), -dx, dy, material)?); // back
    sides.add(Quad::new(Vec3::new(min.x, min.y, min.z), dz, dy, material)?); // left
    sides.add(Quad::new(Vec3::new(min.x, max.y, max.z), dx, -dz, material)?); // top
    sides.add(Quad::new(Vec3::new(min.x, min.y, min.z), dx, dz, material)?); // bottom
    Ok(sides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HitRecord, Hittable, SceneError};
    use approx::assert_relative_eq;
    use ember_math::{Interval, Ray};

    #[test]
    fn test_make_box_faces() {
        let sides = make_box(Vec3::ONE, Vec3::ZERO, MaterialId::new(0)).unwrap();
        assert_eq!(sides.len(), 6);
        // Each face box is padded on its flat axis, so the union is a hair
        // larger than the unit cube.
        let bbox = sides.bounding_box();
        assert_relative_eq!(bbox.min().length(), 0.0, epsilon = 1e-3);
        assert_relative_eq!((bbox.max() - Vec3::ONE).length(), 0.0, epsilon = 1e-3);

        // Rays along each axis from outside hit the near face at distance 1.
        for dir in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::NEG_X, Vec3::NEG_Y, Vec3::NEG_Z] {
            let origin = Vec3::splat(0.5) - dir * 1.5;
            let mut rec = HitRecord::default();
            assert!(sides.hit(&Ray::new(origin, dir), Interval::new(0.001, f32::INFINITY), &mut rec));
            assert!((rec.t - 1.0).abs() < 1e-4);
            assert!(rec.front_face, "face toward {dir:?} points inward");
        }
    }

    #[test]
    fn test_flat_box_is_rejected() {
        let result = make_box(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), MaterialId::new(0));
        assert!(matches!(result, Err(SceneError::DegenerateQuad(_))));
    }

    #[test]
    fn test_demo_scenes_build() {
        let mut rng = StdRng::seed_from_u64(0);
        let spheres = random_spheres(&mut rng).unwrap();
        assert!(spheres.scene.world().primitives().len() > 300);

        let cornell = cornell_box(555.0).unwrap();
        assert_eq!(cornell.scene.world().primitives().len(), 6 + 12);

        let textured = textured(Arc::new(ImageData::default()), &mut rng).unwrap();
        assert_eq!(textured.scene.world().primitives().len(), 4);
    }

    #[test]
    fn test_cornell_camera_sees_back_wall() {
        let demo = cornell_box(10.0).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 4.0, 0.0), Vec3::NEG_Z);
        let mut rec = HitRecord::default();
        assert!(demo.scene.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_build_without_texture_falls_back() {
        let mut images = ImageCache::new();
        let demo = build(SceneKind::Textured, &mut images, None, 1).unwrap();
        assert_eq!(demo.scene.world().primitives().len(), 4);

        let demo = build(SceneKind::Textured, &mut images, Some("does/not/exist.png"), 1).unwrap();
        assert_eq!(demo.scene.world().primitives().len(), 4);
        assert!(images.is_empty());
    }
}
