//! Progressive accumulation scheduler.
//!
//! The image is a set of slots, one per `(pixel, sample index)` pair. Each
//! frame the scheduler traces as many slots as fit in the frame-time budget,
//! taken from a shuffled permutation that wraps around, and folds every new
//! sample into that slot's running mean. A pixel is displayed as the mean of
//! its slots. Shuffling spreads early samples across the whole image instead
//! of sweeping it scan line by scan line.

use crate::renderer::color_to_rgba;
use crate::sampling::sample_square;
use crate::{Camera, Color, RenderConfig, Scene};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Still tracing new samples every frame.
    Accumulating,
    /// `max_passes` full passes done; the cached frame is shown as is.
    Converged,
}

/// What a call to [`ProgressiveRenderer::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub rays_traced: usize,
    pub passes_completed: u32,
    pub state: RenderState,
    /// Measured seconds per ray this frame, 0 when nothing was traced.
    pub ray_cost: f64,
}

/// Slot indices are `u32`, so a frame holds at most this many slots.
const MAX_SLOTS: u64 = u32::MAX as u64;

/// Clamp a requested resolution and sample count so the slot count fits in
/// [`MAX_SLOTS`]. The height only shrinks when the pixel count alone is
/// too large.
fn fit_slots(width: u32, height: u32, samples_per_pixel: u32) -> (u32, u32, u32) {
    let width = width.max(1);
    let mut height = height.max(1);
    let mut spp = samples_per_pixel.max(1);

    let mut pixels = width as u64 * height as u64;
    if pixels > MAX_SLOTS {
        height = (MAX_SLOTS / width as u64).max(1) as u32;
        pixels = width as u64 * height as u64;
        log::warn!("Render height clamped to {} to keep slot indices in range", height);
    }

    let max_spp = (MAX_SLOTS / pixels).max(1);
    if spp as u64 > max_spp {
        spp = max_spp as u32;
        log::warn!("samples_per_pixel clamped to {} for a {}x{} image", spp, width, height);
    }

    (width, height, spp)
}

/// Frame-budgeted progressive renderer with an RGBA8 output buffer.
pub struct ProgressiveRenderer {
    width: u32,
    height: u32,
    config: RenderConfig,
    /// Running mean per slot
    accum: Vec<Color>,
    /// Samples blended into each slot since the last reset
    counts: Vec<u32>,
    order: Vec<u32>,
    cursor: usize,
    passes_completed: u32,
    state: RenderState,
    frame: Vec<u8>,
    threads: usize,
}

impl ProgressiveRenderer {
    pub fn new(width: u32, height: u32, config: RenderConfig) -> Self {
        let (width, height, samples_per_pixel) =
            fit_slots(width, height, config.samples_per_pixel);
        let config = RenderConfig {
            samples_per_pixel,
            max_passes: config.max_passes.max(1),
            ..config
        };
        let slots = width as usize * height as usize * samples_per_pixel as usize;

        let mut order: Vec<u32> = (0..slots as u32).collect();
        order.shuffle(&mut StdRng::seed_from_u64(config.seed));

        let threads = rayon::current_num_threads();
        log::debug!(
            "Progressive renderer {}x{}, {} spp, {} slots, {} threads",
            width,
            height,
            config.samples_per_pixel,
            slots,
            threads
        );

        let mut renderer = Self {
            width,
            height,
            config,
            accum: vec![Color::ZERO; slots],
            counts: vec![0; slots],
            order,
            cursor: 0,
            passes_completed: 0,
            state: RenderState::Accumulating,
            frame: Vec::new(),
            threads,
        };
        renderer.clear_frame();
        renderer
    }

    /// Rebuild for a new resolution. All accumulated samples are dropped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width.max(1) == self.width && height.max(1) == self.height {
            return;
        }
        *self = Self::new(width, height, self.config.clone());
    }

    /// Discard every sample and start over.
    pub fn reset(&mut self) {
        self.accum.fill(Color::ZERO);
        self.counts.fill(0);
        self.cursor = 0;
        self.passes_completed = 0;
        self.state = RenderState::Accumulating;
        self.clear_frame();
        log::debug!("Accumulation reset");
    }

    /// Run one interactive frame.
    ///
    /// Resets first if the camera moved or a reset was requested, then
    /// traces a batch sized so the frame stays near `target_fps`. Does
    /// nothing once converged.
    pub fn frame(&mut self, scene: &Scene, camera: &Camera, moved: bool, reset_requested: bool) -> FrameStats {
        if moved || reset_requested {
            self.reset();
        }

        if self.state == RenderState::Converged {
            return self.stats(0, 0.0);
        }

        // Probe: one slot traced on this thread to price a ray.
        let Some((slot, pass)) = self.next_slot() else {
            return self.stats(0, 0.0);
        };
        let start = Instant::now();
        let color = self.trace_slot(scene, camera, slot, pass);
        let cost = start.elapsed().as_secs_f64();
        self.commit(&[(slot, color)]);

        let budget = self.ray_budget(cost);
        let traced = 1 + self.advance(scene, camera, budget.saturating_sub(1));
        self.stats(traced, cost)
    }

    /// Rays per frame for a measured per-ray cost, capped at the slot count
    /// so no slot appears twice in one batch.
    fn ray_budget(&self, cost: f64) -> usize {
        let slots = self.slot_count();
        if !(cost > 0.0 && self.config.target_fps > 0.0) {
            return slots;
        }
        let per_thread = (1.0 / (cost * self.config.target_fps as f64)).clamp(1.0, slots as f64);
        (per_thread as usize).saturating_mul(self.threads).min(slots)
    }

    /// Trace up to `count` slots in parallel and blend them in. Returns the
    /// number of slots traced, which is lower than `count` only when the
    /// image converges part way through.
    pub fn advance(&mut self, scene: &Scene, camera: &Camera, count: usize) -> usize {
        let count = count.min(self.slot_count());
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            match self.next_slot() {
                Some(s) => batch.push(s),
                None => break,
            }
        }

        let this = &*self;
        let samples: Vec<(u32, Color)> = batch
            .par_iter()
            .map(|&(slot, pass)| (slot, this.trace_slot(scene, camera, slot, pass)))
            .collect();

        self.commit(&samples);
        samples.len()
    }

    /// Take the next slot from the permutation, advancing the pass counter
    /// on wrap-around. `None` once converged.
    fn next_slot(&mut self) -> Option<(u32, u32)> {
        if self.state == RenderState::Converged || self.order.is_empty() {
            return None;
        }

        let slot = self.order[self.cursor];
        let pass = self.passes_completed;

        self.cursor += 1;
        if self.cursor == self.order.len() {
            self.cursor = 0;
            self.passes_completed += 1;
            log::debug!("Pass {} complete", self.passes_completed);

            if self.passes_completed >= self.config.max_passes {
                self.state = RenderState::Converged;
                log::info!("Converged after {} passes", self.passes_completed);
            }
        }

        Some((slot, pass))
    }

    /// One jittered sample for `slot`, seeded from the slot and pass so the
    /// result does not depend on which thread runs it.
    fn trace_slot(&self, scene: &Scene, camera: &Camera, slot: u32, pass: u32) -> Color {
        let mut rng = StdRng::seed_from_u64(self.config.seed ^ slot as u64 ^ ((pass as u64) << 32));
        let pixel = slot / self.config.samples_per_pixel;
        let x = (pixel % self.width) as f32;
        let y = (pixel / self.width) as f32;
        let (dx, dy) = sample_square(&mut rng);
        camera.send_ray(scene, x + dx, y + dy, &mut rng)
    }

    fn commit(&mut self, samples: &[(u32, Color)]) {
        for &(slot, color) in samples {
            // A NaN or infinite sample would poison the mean for good.
            if !color.is_finite() {
                continue;
            }
            let i = slot as usize;
            let n = self.counts[i];
            let mean = self.accum[i];
            self.accum[i] = mean + (color - mean) / (n + 1) as f32;
            self.counts[i] = n + 1;
        }

        for &(slot, _) in samples {
            self.write_pixel(slot / self.config.samples_per_pixel);
        }
    }

    fn write_pixel(&mut self, pixel: u32) {
        let rgba = color_to_rgba(self.pixel_mean(pixel as usize));
        let offset = pixel as usize * 4;
        self.frame[offset..offset + 4].copy_from_slice(&rgba);
    }

    /// Mean of a pixel's sampled slots; black before any sample lands.
    fn pixel_mean(&self, pixel: usize) -> Color {
        let spp = self.config.samples_per_pixel as usize;
        let range = pixel * spp..(pixel + 1) * spp;
        let (sum, n) = self.accum[range.clone()]
            .iter()
            .zip(&self.counts[range])
            .filter(|(_, count)| **count > 0)
            .fold((Color::ZERO, 0u32), |(sum, n), (c, _)| (sum + *c, n + 1));

        if n == 0 {
            Color::ZERO
        } else {
            sum / n as f32
        }
    }

    /// Linear color currently shown at `(x, y)`.
    pub fn pixel_color(&self, x: u32, y: u32) -> Color {
        self.pixel_mean((y.min(self.height - 1) * self.width + x.min(self.width - 1)) as usize)
    }

    fn clear_frame(&mut self) {
        self.frame = [0, 0, 0, 255].repeat(self.width as usize * self.height as usize);
    }

    fn stats(&self, rays_traced: usize, cost: f64) -> FrameStats {
        FrameStats {
            rays_traced,
            passes_completed: self.passes_completed,
            state: self.state,
            ray_cost: cost,
        }
    }

    /// RGBA8 pixels, row-major, top row first.
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn passes_completed(&self) -> u32 {
        self.passes_completed
    }

    pub fn slot_count(&self) -> usize {
        self.order.len()
    }

    /// Samples blended into `slot` since the last reset.
    pub fn sample_count(&self, slot: usize) -> u32 {
        self.counts.get(slot).copied().unwrap_or(0)
    }

    pub fn total_samples(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Background, Material, SceneBuilder, Sphere};
    use ember_math::Vec3;

    const WIDTH: u32 = 8;
    const HEIGHT: u32 = 6;

    /// White diffuse sphere lit only by the sky.
    fn white_sphere_scene() -> (Scene, Camera) {
        let mut builder = SceneBuilder::new().with_background(Background::sky());
        let white = builder.add_material(Material::lambertian(Color::ONE));
        builder.add(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, white).unwrap());
        let scene = builder.build().unwrap();

        let camera = Camera::new()
            .with_resolution(WIDTH, HEIGHT)
            .with_lens(90.0, 0.0, 1.0)
            .with_max_depth(10);
        (scene, camera)
    }

    fn config(samples_per_pixel: u32, max_passes: u32) -> RenderConfig {
        RenderConfig {
            samples_per_pixel,
            max_passes,
            target_fps: 30.0,
            seed: 7,
        }
    }

    #[test]
    fn test_slot_order_is_a_permutation() {
        let renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(2, 10));
        let mut order = renderer.order.clone();
        assert_ne!(order, (0..96).collect::<Vec<u32>>());
        order.sort_unstable();
        assert_eq!(order, (0..96).collect::<Vec<u32>>());
    }

    #[test]
    fn test_full_pass_samples_every_slot() {
        let (scene, camera) = white_sphere_scene();
        let mut renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(2, 10));

        let traced = renderer.advance(&scene, &camera, renderer.slot_count());
        assert_eq!(traced, 96);
        assert_eq!(renderer.passes_completed(), 1);
        assert!((0..renderer.slot_count()).all(|s| renderer.sample_count(s) == 1));
        assert!(renderer.frame_buffer().chunks(4).all(|px| px[3] == 255 && px[2] > 0));
    }

    #[test]
    fn test_partial_batch_and_oversized_request() {
        let (scene, camera) = white_sphere_scene();
        let mut renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(1, 10));

        assert_eq!(renderer.advance(&scene, &camera, 10), 10);
        assert_eq!(renderer.total_samples(), 10);
        assert_eq!(renderer.passes_completed(), 0);

        // Never more than one pass worth of slots in a single batch.
        assert_eq!(renderer.advance(&scene, &camera, 1000), 48);
        assert!((0..48).all(|s| renderer.sample_count(s) >= 1));
        assert!((0..48).all(|s| renderer.sample_count(s) <= 2));
    }

    #[test]
    fn test_camera_move_resets_accumulation() {
        let (scene, camera) = white_sphere_scene();
        let mut renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(2, 10));
        renderer.advance(&scene, &camera, 96);
        renderer.advance(&scene, &camera, 96);
        assert_eq!(renderer.passes_completed(), 2);

        let stats = renderer.frame(&scene, &camera, true, false);
        assert!(stats.rays_traced >= 1);
        assert_eq!(renderer.total_samples(), stats.rays_traced as u64);
        assert!((0..96).all(|s| renderer.sample_count(s) <= 1));
        assert!(renderer.passes_completed() <= 1);
    }

    #[test]
    fn test_converged_frames_trace_nothing() {
        let (scene, camera) = white_sphere_scene();
        let mut renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(1, 1));
        renderer.advance(&scene, &camera, 48);
        assert_eq!(renderer.state(), RenderState::Converged);

        let before = renderer.frame_buffer().to_vec();
        let stats = renderer.frame(&scene, &camera, false, false);
        assert_eq!(stats.rays_traced, 0);
        assert_eq!(stats.state, RenderState::Converged);
        assert_eq!(renderer.frame_buffer(), &before[..]);
        assert_eq!(renderer.advance(&scene, &camera, 10), 0);

        let stats = renderer.frame(&scene, &camera, false, true);
        assert!(stats.rays_traced >= 1);
    }

    #[test]
    fn test_same_seed_same_image() {
        let (scene, camera) = white_sphere_scene();
        let mut a = ProgressiveRenderer::new(WIDTH, HEIGHT, config(2, 10));
        let mut b = ProgressiveRenderer::new(WIDTH, HEIGHT, config(2, 10));
        for _ in 0..3 {
            a.advance(&scene, &camera, 96);
            b.advance(&scene, &camera, 96);
        }
        assert_eq!(a.frame_buffer(), b.frame_buffer());
    }

    #[test]
    fn test_ray_budget() {
        let renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(1, 10));
        let threads = renderer.threads;
        // Very expensive rays: at least one per thread.
        assert_eq!(renderer.ray_budget(10.0), threads.min(48));
        // Very cheap rays: capped at the slot count.
        assert_eq!(renderer.ray_budget(1e-12), 48);
        assert_eq!(renderer.ray_budget(0.0), 48);
    }

    #[test]
    fn test_fit_slots_keeps_indices_in_u32() {
        assert_eq!(fit_slots(1280, 720, 4), (1280, 720, 4));
        assert_eq!(fit_slots(0, 0, 0), (1, 1, 1));

        let (w, h, spp) = fit_slots(1280, 720, 5000);
        assert_eq!((w, h), (1280, 720));
        assert!(spp < 5000);
        assert!(w as u64 * h as u64 * spp as u64 <= MAX_SLOTS);

        let (w, h, spp) = fit_slots(u32::MAX, u32::MAX, 8);
        assert_eq!(spp, 1);
        assert!(w as u64 * h as u64 <= MAX_SLOTS);
    }

    #[test]
    fn test_blend_is_running_mean() {
        let mut renderer = ProgressiveRenderer::new(1, 1, config(1, 10));
        renderer.commit(&[(0, Color::splat(1.0))]);
        renderer.commit(&[(0, Color::splat(0.0))]);
        renderer.commit(&[(0, Color::splat(0.5))]);
        renderer.commit(&[(0, Color::splat(f32::NAN))]);
        assert_eq!(renderer.sample_count(0), 3);
        assert!((renderer.pixel_color(0, 0) - Color::splat(0.5)).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_resize_starts_over() {
        let (scene, camera) = white_sphere_scene();
        let mut renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(1, 10));
        renderer.advance(&scene, &camera, 20);

        renderer.resize(4, 4);
        assert_eq!(renderer.slot_count(), 16);
        assert_eq!(renderer.total_samples(), 0);
        assert_eq!(renderer.frame_buffer().len(), 64);
    }

    #[test]
    fn test_white_sphere_converges() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (scene, camera) = white_sphere_scene();
        let mut renderer = ProgressiveRenderer::new(WIDTH, HEIGHT, config(1, 100));
        let slots = renderer.slot_count();

        let snapshot = |r: &ProgressiveRenderer| -> Vec<Color> {
            (0..HEIGHT)
                .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
                .map(|(x, y)| r.pixel_color(x, y))
                .collect()
        };

        renderer.advance(&scene, &camera, slots);
        let mut previous = snapshot(&renderer);
        let mut converged_at = None;

        for pass in 2..=60 {
            renderer.advance(&scene, &camera, slots);
            let current = snapshot(&renderer);
            let delta: f32 = previous
                .iter()
                .zip(&current)
                .map(|(a, b)| (*a - *b).abs().max_element())
                .sum::<f32>()
                / current.len() as f32;

            if delta < 0.02 {
                converged_at = Some(pass);
                break;
            }
            previous = current;
        }

        assert!(converged_at.is_some(), "image still changing after 60 passes");
        for color in snapshot(&renderer) {
            assert!(color.min_element() >= 0.0 && color.max_element() <= 1.0);
        }
    }
}
