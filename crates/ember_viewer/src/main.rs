use anyhow::{Context, Result};
use ember_core::{ImageCache, ViewerConfig};
use ember_math::Vec2;
use ember_renderer::{scenes, Camera, InputState, ProgressiveRenderer, RenderConfig, Scene};
use ember_viewport::{OverlayStats, Presenter};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

mod keymap;

const DEFAULT_CONFIG_PATH: &str = "ember.json";

/// Application state
struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,

    scene: Scene,
    camera: Camera,
    renderer: ProgressiveRenderer,

    // Input state
    keys_held: HashSet<KeyCode>,
    input: InputState,
    last_frame_time: Instant,
}

impl App {
    fn new(config: ViewerConfig) -> Result<Self> {
        let mut images = ImageCache::new();
        let demo = scenes::build(config.scene, &mut images, config.texture_path.as_deref(), config.seed)
            .context("failed to build scene")?;

        let (width, height) = config.render_size(config.window_width, config.window_height);
        let camera = demo
            .camera
            .with_resolution(width, height)
            .with_max_depth(config.max_depth);
        let renderer = ProgressiveRenderer::new(width, height, RenderConfig::from(&config));

        Ok(Self {
            config,
            window: None,
            presenter: None,
            scene: demo.scene,
            camera,
            renderer,
            keys_held: HashSet::new(),
            input: InputState::default(),
            last_frame_time: Instant::now(),
        })
    }

    fn resize(&mut self, window_size: (u32, u32)) {
        if window_size.0 == 0 || window_size.1 == 0 {
            return;
        }
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(window_size);
        }

        let (width, height) = self.config.render_size(window_size.0, window_size.1);
        if (width, height) != (self.renderer.width(), self.renderer.height()) {
            self.renderer.resize(width, height);
            self.camera = self.camera.clone().with_resolution(width, height);
            log::info!("Render size {}x{}", width, height);
        }
    }

    fn set_cursor_captured(&self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };
        let grab = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            log::warn!("Cursor grab failed: {}", e);
        }
        window.set_cursor_visible(!captured);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        // Calculate delta time
        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        if let Some(presenter) = &mut self.presenter {
            presenter.update_fps(delta_time);
        }

        keymap::apply_held(&mut self.input, &self.keys_held);
        let was_moving = self.camera.is_moving;
        let moved = self.camera.update_state(delta_time, &self.input);
        if self.camera.is_moving != was_moving {
            self.set_cursor_captured(self.camera.is_moving);
        }
        let reset = self.input.reset;
        if reset {
            log::info!("Accumulation restarted");
        }

        let frame = self.renderer.frame(&self.scene, &self.camera, moved, reset);
        self.input.end_frame();

        let stats = OverlayStats {
            scene_name: format!("{:?}", self.config.scene),
            frame,
            max_passes: self.config.max_passes,
            render_size: (self.renderer.width(), self.renderer.height()),
            samples_per_pixel: self.config.samples_per_pixel,
            camera_position: self.camera.position(),
            yaw: self.camera.yaw(),
            pitch: self.camera.pitch(),
            camera_moving: self.camera.is_moving,
        };

        let (Some(presenter), Some(window)) = (&mut self.presenter, &self.window) else {
            return;
        };
        let result = presenter.present(
            self.renderer.frame_buffer(),
            self.renderer.width(),
            self.renderer.height(),
            &stats,
            window,
        );

        if let Err(e) = result {
            // Check if it's a surface error we can handle
            if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                match surface_err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        let size = presenter.size;
                        presenter.resize(size);
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        log::error!("Out of memory!");
                        event_loop.exit();
                    }
                    _ => {
                        log::error!("Surface error: {:?}", surface_err);
                    }
                }
            } else {
                log::error!("Present error: {:?}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Ember")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Initialize presenter (async in pollster block)
        let presenter = match pollster::block_on(Presenter::new(window.clone())) {
            Ok(presenter) => presenter,
            Err(e) => {
                log::error!("Failed to initialize presenter: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.window = Some(window);
        self.presenter = Some(presenter);
        self.resize((size.width, size.height));

        log::info!("Window and presenter initialized");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first
        if let (Some(presenter), Some(window)) = (&mut self.presenter, &self.window) {
            if presenter.handle_egui_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.resize((physical_size.width, physical_size.height));
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(keycode),
                    state,
                    repeat,
                    ..
                },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.keys_held.insert(keycode);
                    if !repeat {
                        keymap::apply_press(&mut self.input, keycode);
                    }
                    if keycode == keymap::TOGGLE_UI && !repeat {
                        if let Some(presenter) = &mut self.presenter {
                            presenter.show_ui = !presenter.show_ui;
                        }
                    }
                    if keycode == KeyCode::Escape {
                        event_loop.exit();
                    }
                }
                ElementState::Released => {
                    self.keys_held.remove(&keycode);
                }
            },
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.camera.is_moving {
                self.input.mouse_delta += Vec2::new(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn load_config() -> Result<ViewerConfig> {
    let path = std::env::var("EMBER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ViewerConfig::load_or_default(&path).with_context(|| format!("invalid config {}", path))?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting Ember");

    let config = load_config()?;
    log::info!(
        "Scene {:?}, {} spp, {} passes, target {} fps",
        config.scene,
        config.samples_per_pixel,
        config.max_passes,
        config.target_fps
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
