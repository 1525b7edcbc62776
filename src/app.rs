//! Demo application state and the per-frame loop
//!
//! `DemoState` owns everything a frame needs and knows nothing about the
//! window, so the headless snapshot path drives exactly the same code.

use std::path::Path;
use std::time::Instant;

use macroquad::prelude::{
    clear_background, draw_text, draw_texture_ex, get_frame_time, is_key_down, is_key_pressed,
    is_mouse_button_down, mouse_position, next_frame, screen_height, screen_width, Color,
    DrawTextureParams, FilterMode, KeyCode, MouseButton, Texture2D, Vec2, WHITE,
};
use softpipe::config::DemoConfig;
use softpipe::rasterizer::{merge, pack_rgba, Framebuffer, Rgba, Vec3};
use softpipe::Result;

use crate::scene::{render_mesh, Camera, Mesh, MeshStats, ModelTransform, Projection};

/// Model tilt so the spin shows the top face
const TILT: f32 = 0.45;

/// Frames-per-second readout, refreshed once a second
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self { frames: 0, elapsed: 0.0, fps: 0 }
    }

    /// Count one frame; returns the new rate when a full second has passed
    pub fn tick(&mut self, dt: f32) -> Option<u32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < 1.0 {
            return None;
        }
        self.fps = (self.frames as f32 / self.elapsed).round() as u32;
        self.frames = 0;
        self.elapsed = 0.0;
        Some(self.fps)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// One frame of navigation input, decoupled from the window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    /// Mouse drag in pixels since last frame
    pub look: (f32, f32),
    /// -1, 0 or 1 per axis: W/S, D/A, X/Z
    pub forward: f32,
    pub right: f32,
    pub rise: f32,
}

impl CameraInput {
    /// Sample keyboard and right-button mouse drag
    fn poll(last_mouse: &mut Option<(f32, f32)>) -> Self {
        let axis = |pos: KeyCode, neg: KeyCode| {
            (is_key_down(pos) as i32 - is_key_down(neg) as i32) as f32
        };

        let mut look = (0.0, 0.0);
        if is_mouse_button_down(MouseButton::Right) {
            let pos = mouse_position();
            if let Some(last) = *last_mouse {
                look = (pos.0 - last.0, pos.1 - last.1);
            }
            *last_mouse = Some(pos);
        } else {
            *last_mouse = None;
        }

        Self {
            look,
            forward: axis(KeyCode::W, KeyCode::S),
            right: axis(KeyCode::D, KeyCode::A),
            rise: axis(KeyCode::X, KeyCode::Z),
        }
    }
}

pub struct DemoState {
    pub config: DemoConfig,
    pub fb: Framebuffer,
    pub mesh: Mesh,
    pub camera: Camera,
    pub projection: Projection,
    pub model: ModelTransform,
    pub last_mesh_stats: MeshStats,
    pub fps: FpsCounter,
}

impl DemoState {
    pub fn new(config: DemoConfig) -> Self {
        let fb = Framebuffer::new(config.width, config.height);
        let mesh = Mesh::demo(config.glass_alpha);
        let camera = Camera::new(Vec3::new(0.0, 0.0, -config.camera_distance));
        let projection = Projection {
            fov_y: config.fov_degrees.to_radians(),
            near: config.near_clip,
            far: config.far_clip,
            width: config.width,
            height: config.height,
        };
        Self {
            config,
            fb,
            mesh,
            camera,
            projection,
            model: ModelTransform { yaw: 0.0, tilt: TILT },
            last_mesh_stats: MeshStats::default(),
            fps: FpsCounter::new(),
        }
    }

    /// Advance the animation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.model.yaw = (self.model.yaw + self.config.spin_speed * dt) % std::f32::consts::TAU;
    }

    /// Apply one frame of navigation
    pub fn steer(&mut self, input: &CameraInput, dt: f32) {
        let look = self.config.mouse_sensitivity;
        if input.look != (0.0, 0.0) {
            // drag right turns right, drag down looks down
            self.camera.rotate(input.look.1 * look, -input.look.0 * look);
        }

        let step = self.config.move_speed * dt;
        self.camera.walk(input.forward * step, input.right * step, input.rise * step);
    }

    /// Change the internal resolution, keeping the scene
    pub fn resize(&mut self, width: usize, height: usize) {
        let (width, height) = (width.clamp(1, u16::MAX as usize), height.clamp(1, u16::MAX as usize));
        self.fb.resize(width, height);
        self.projection.width = width;
        self.projection.height = height;
    }

    /// Clear, draw the mesh and merge into `fb.pixels()`
    pub fn render(&mut self) {
        self.fb.clear();
        self.last_mesh_stats =
            render_mesh(&mut self.fb, &self.mesh, &self.model, &self.camera, &self.projection);
        merge(&mut self.fb);
    }

    /// Output pixels flattened over the configured background
    pub fn flattened_pixels(&self) -> Vec<u8> {
        let background = self.config.clear_color;
        self.fb
            .pixels()
            .chunks_exact(4)
            .flat_map(|px| pack_rgba(Rgba::from_rgba8(px[0], px[1], px[2], px[3]).over(background)))
            .collect()
    }
}

/// Render `frames` frames without a window and write the last one as PNG
pub fn snapshot(config: DemoConfig, frames: u32, path: &Path) -> Result<()> {
    let mut state = DemoState::new(config);
    let dt = 1.0 / 60.0;
    let start = Instant::now();

    for _ in 0..frames.max(1) {
        state.update(dt);
        state.render();
    }

    tracing::info!(
        frames = frames.max(1),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "{}",
        state.fb.stats()
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let pixels = state.flattened_pixels();
    image::save_buffer_with_format(
        path,
        &pixels,
        state.fb.width() as u32,
        state.fb.height() as u32,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;
    tracing::info!(path = %path.display(), "snapshot written");
    Ok(())
}

fn to_color(c: Rgba) -> Color {
    Color::new(c.r, c.g, c.b, c.a)
}

/// Window loop; returns when Escape is pressed
///
/// Right-drag looks around, W/A/S/D walk and X/Z move up and down. The
/// internal resolution follows the window at `window_scale` screen pixels
/// per framebuffer pixel.
pub async fn run(config: DemoConfig) {
    let scale = config.window_scale as f32;
    let mut state = DemoState::new(config);
    let mut last_mouse = None;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let target = (
            (screen_width() / scale).round() as usize,
            (screen_height() / scale).round() as usize,
        );
        if target != (state.fb.width(), state.fb.height()) {
            state.resize(target.0, target.1);
        }

        let dt = get_frame_time();
        state.steer(&CameraInput::poll(&mut last_mouse), dt);
        state.update(dt);
        state.render();

        if let Some(fps) = state.fps.tick(dt) {
            let mesh = state.last_mesh_stats;
            tracing::info!(
                fps,
                culled = mesh.culled,
                clipped = mesh.clipped,
                generations = state.fb.arena().generations(),
                epoch = state.fb.arena().epoch(),
                "{}",
                state.fb.stats()
            );
        }

        clear_background(to_color(state.config.clear_color));

        // Fit the framebuffer to the window, keeping its aspect ratio
        let (fb_w, fb_h) = (state.fb.width() as f32, state.fb.height() as f32);
        let scale = (screen_width() / fb_w).min(screen_height() / fb_h);
        let (draw_w, draw_h) = (fb_w * scale, fb_h * scale);
        let draw_x = (screen_width() - draw_w) * 0.5;
        let draw_y = (screen_height() - draw_h) * 0.5;

        let texture =
            Texture2D::from_rgba8(state.fb.width() as u16, state.fb.height() as u16, state.fb.pixels());
        texture.set_filter(FilterMode::Nearest);

        draw_texture_ex(
            &texture,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        draw_text(
            &format!("{} fps | {}", state.fps.fps(), state.fb.stats()),
            8.0,
            20.0,
            18.0,
            WHITE,
        );

        next_frame().await;
    }

    tracing::info!("exiting");
}
