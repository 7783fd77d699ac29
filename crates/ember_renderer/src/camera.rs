//! Camera for ray generation and interactive navigation.

use crate::renderer::ray_color;
use crate::sampling::random_in_unit_disk;
use crate::{Color, InputState, Scene};
use ember_math::{Ray, Vec3};
use rand::RngCore;

/// Upper bound on recursion depth, whatever the configuration asks for.
pub const MAX_DEPTH_LIMIT: u32 = 50;

/// Pitch is kept short of straight up/down so the basis never degenerates.
const PITCH_LIMIT: f32 = 89.0;

/// Speed multiplier while the sprint modifier is held.
const SPRINT_FACTOR: f32 = 4.0;

/// Perspective camera with first-person navigation.
///
/// Orientation is stored as yaw and pitch in degrees. Yaw -90 with pitch 0
/// looks down -Z.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,
    pub max_depth: u32,

    // Camera positioning
    position: Vec3,
    yaw: f32,
    pitch: f32,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Navigation
    /// When false, input is ignored and the camera stays put.
    pub is_moving: bool,
    movement_per_second: f32,
    mouse_sensitivity: f32,

    // Cached computed values (set by initialize())
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 100,
            image_height: 100,
            max_depth: 10,
            position: Vec3::ZERO,
            yaw: -90.0,
            pitch: 0.0,
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            is_moving: false,
            movement_per_second: 1.0,
            mouse_sensitivity: 0.1,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution. Zero dimensions are raised to 1.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self.initialize();
        self
    }

    /// Set the recursion depth, capped at [`MAX_DEPTH_LIMIT`].
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    /// Place the camera at `look_from`, facing `look_at`.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.position = look_from;
        self.vup = vup.normalize_or_zero();
        if self.vup == Vec3::ZERO {
            self.vup = Vec3::Y;
        }

        let forward = (look_at - look_from).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.yaw = forward.z.atan2(forward.x).to_degrees();
            self.pitch = forward
                .y
                .clamp(-1.0, 1.0)
                .asin()
                .to_degrees()
                .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.initialize();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialize();
        self
    }

    /// Set translation speed in world units per second.
    pub fn with_movement_speed(mut self, units_per_second: f32) -> Self {
        self.movement_per_second = units_per_second;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Unit view direction derived from yaw and pitch.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
    }

    /// Recompute the basis and pixel grid from position, orientation and
    /// lens. Must be called after any of those change.
    pub fn initialize(&mut self) {
        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = -self.forward();
        self.u = self.vup.cross(self.w).normalize_or_zero();
        if self.u == Vec3::ZERO {
            self.u = Vec3::X;
        }
        self.v = self.w.cross(self.u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left =
            self.position - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;
    }

    /// Ray through the (possibly fractional) pixel coordinate `(x, y)`.
    ///
    /// Integer coordinates hit pixel centers; callers add their own jitter.
    pub fn get_ray(&self, x: f32, y: f32, rng: &mut dyn RngCore) -> Ray {
        let pixel_sample = self.pixel00_loc + x * self.pixel_delta_u + y * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.position
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Trace one sample through pixel coordinate `(x, y)`.
    pub fn send_ray(&self, scene: &Scene, x: f32, y: f32, rng: &mut dyn RngCore) -> Color {
        let ray = self.get_ray(x, y, rng);
        ray_color(&ray, scene, self.max_depth, rng)
    }

    /// Apply one frame of navigation input.
    ///
    /// Returns true when position or orientation changed, which invalidates
    /// any accumulated samples.
    pub fn update_state(&mut self, dt: f32, input: &InputState) -> bool {
        if input.toggle_movement {
            self.is_moving = !self.is_moving;
            log::debug!("Camera movement {}", if self.is_moving { "enabled" } else { "disabled" });
        }
        if !self.is_moving {
            return false;
        }

        let mut changed = false;

        if input.mouse_delta.x != 0.0 || input.mouse_delta.y != 0.0 {
            self.yaw += input.mouse_delta.x * self.mouse_sensitivity;
            self.pitch = (self.pitch - input.mouse_delta.y * self.mouse_sensitivity)
                .clamp(-PITCH_LIMIT, PITCH_LIMIT);
            changed = true;
        }

        if input.has_movement() {
            changed |= self.apply_movement(dt, input);
        }

        if changed {
            self.initialize();
        }
        changed
    }

    /// Move along the held directions. Opposite keys cancel out.
    fn apply_movement(&mut self, dt: f32, input: &InputState) -> bool {
        let forward = self.forward();
        let right = forward.cross(self.vup).normalize_or_zero();
        let mut direction = Vec3::ZERO;
        if input.forward {
            direction += forward;
        }
        if input.backward {
            direction -= forward;
        }
        if input.right {
            direction += right;
        }
        if input.left {
            direction -= right;
        }
        if input.up {
            direction += self.vup;
        }
        if input.down {
            direction -= self.vup;
        }
        if direction == Vec3::ZERO {
            return false;
        }

        let speed = if input.sprint {
            self.movement_per_second * SPRINT_FACTOR
        } else {
            self.movement_per_second
        };
        self.position += direction * speed * dt;
        true
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.position + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
