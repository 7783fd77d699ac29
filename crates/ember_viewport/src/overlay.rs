//! egui stats panel drawn over the traced image.

use ember_math::Vec3;
use ember_renderer::{FrameStats, RenderState};

/// Everything the overlay shows for one frame.
#[derive(Debug, Clone)]
pub struct OverlayStats {
    pub scene_name: String,
    pub frame: FrameStats,
    pub max_passes: u32,
    pub render_size: (u32, u32),
    pub samples_per_pixel: u32,
    pub camera_position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub camera_moving: bool,
}

pub(crate) fn draw(ctx: &egui::Context, stats: &OverlayStats, fps: f32) {
    egui::Window::new("Ember")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", fps));
            ui.label(format!("Scene: {}", stats.scene_name));
            ui.separator();

            let state = match stats.frame.state {
                RenderState::Accumulating => "Accumulating",
                RenderState::Converged => "Converged",
            };
            ui.label(format!("State: {}", state));
            ui.label(format!("Passes: {} / {}", stats.frame.passes_completed, stats.max_passes));
            ui.label(format!("Rays this frame: {}", stats.frame.rays_traced));
            if stats.frame.ray_cost > 0.0 {
                ui.label(format!("Ray cost: {:.1} µs", stats.frame.ray_cost * 1e6));
            }
            ui.label(format!(
                "Resolution: {}x{} @ {} spp",
                stats.render_size.0, stats.render_size.1, stats.samples_per_pixel
            ));

            ui.collapsing("Camera", |ui| {
                let p = stats.camera_position;
                ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                ui.label(format!("Yaw: {:.1}°", stats.yaw));
                ui.label(format!("Pitch: {:.1}°", stats.pitch));
                ui.label(if stats.camera_moving { "Navigation: on" } else { "Navigation: off" });
            });

            ui.collapsing("Controls", |ui| {
                ui.label("Space: toggle navigation");
                ui.label("Mouse: look around");
                ui.label("W/A/S/D: move forward/left/back/right");
                ui.label("E/Q: move up/down");
                ui.label("Left Shift: move faster");
                ui.label("R: restart accumulation");
                ui.label("F1: hide this panel");
            });
        });
}
