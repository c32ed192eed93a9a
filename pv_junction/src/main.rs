//! PV Principle Demo
//!
//! Photons from the sun are absorbed in a PN-junction solar cell, create
//! electron/hole pairs, and the electrons travel through an external circuit
//! to light a bulb. Rendered with wgpu, with an egui timeline panel.
//!
//! Usage:
//!   pv_junction [scene.toml] [--headless SECONDS] [--seed N]
//!
//! Controls:
//! - Space: Play/pause
//! - R: Reset
//! - Escape: Quit

mod renderer;
mod scene;
mod timeline_ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context as _};
use common::{GraphicsContext, SceneCamera};
use pv_junction::{
    Animation, FrameHandle, FrameScheduler, FrameSink, FrameSnapshot, ManualScheduler,
    PhaseNotice, SceneConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::{SceneRenderer, ShapeInstance};
use timeline_ui::{draw_timeline_panel, PanelAction, PanelView, PANEL_WIDTH};
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

const WINDOW_WIDTH: u32 = 1100;
const WINDOW_HEIGHT: u32 = 600;
/// Frame rate simulated by the headless runner
const HEADLESS_FPS: f64 = 60.0;

/// Frames delivered as winit redraws
struct RedrawScheduler {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl RedrawScheduler {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
        }
    }

    fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle::new(self.next_id);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Keeps the shapes of the latest presented frame for the GPU
#[derive(Default)]
struct SceneSink {
    shapes: Vec<ShapeInstance>,
}

impl FrameSink for SceneSink {
    fn present(&mut self, frame: &FrameSnapshot<'_>) {
        self.shapes = scene::build_scene(frame);
    }

    fn phase_changed(&mut self, notice: &PhaseNotice<'_>) {
        log::info!("{}: {}", notice.label(), notice.info_text());
    }
}

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: SceneRenderer,
    animation: Animation<StdRng, RedrawScheduler>,
    sink: SceneSink,
    camera: SceneCamera,
    config: SceneConfig,
    clock: Instant,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext, config: SceneConfig, rng: StdRng) -> Self {
        let renderer = SceneRenderer::new(&ctx);
        let (width, height) = ctx.size_f32();
        let camera = SceneCamera::new(width, height);

        let scheduler = RedrawScheduler::new(ctx.window.clone());
        let animation = Animation::new(&config, rng, scheduler);
        let mut sink = SceneSink::default();
        sink.present(&animation.snapshot());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            animation,
            sink,
            camera,
            config,
            clock: Instant::now(),
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        let (width, height) = self.ctx.size_f32();
        self.camera.resize(width, height);
        self.ctx.window.request_redraw();
    }

    /// Run the animation tick if this redraw answers its frame request
    fn advance(&mut self) {
        if let Some(handle) = self.animation.scheduler_mut().take_pending() {
            let now = self.clock.elapsed().as_secs_f64();
            self.animation.on_frame(handle, now, &mut self.sink);
        }
    }

    fn apply(&mut self, action: PanelAction) {
        match action {
            PanelAction::TogglePlay => self.animation.toggle(&mut self.sink),
            PanelAction::Reset => self.animation.reset(&mut self.sink),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Build egui UI
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let state = self.animation.state();
        let panel = PanelView {
            title: &self.config.title,
            description: &self.config.description,
            timeline: self.animation.timeline(),
            notice: self.animation.phase_notice(),
            field: self.animation.field(),
            loop_count: state.loop_count,
            elapsed: state.elapsed,
        };
        let mut action = None;
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            action = draw_timeline_panel(ctx, &panel);
        });

        if let Some(action) = action {
            self.apply(action);
        }

        self.egui.state.handle_platform_output(&self.ctx.window, full_output.platform_output);
        let repaint_now = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|viewport| viewport.repaint_delay.is_zero());
        if repaint_now {
            self.ctx.window.request_redraw();
        }

        let tris = self.egui.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui.renderer.update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        // Scene, kept clear of the panel
        self.camera.reserved_right = PANEL_WIDTH * full_output.pixels_per_point;
        self.renderer
            .update_camera(&self.ctx.queue, &self.camera, self.animation.state().elapsed);
        self.renderer
            .update_instances(&self.ctx.device, &self.ctx.queue, &self.sink.shapes);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui.renderer.render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key {
            KeyCode::Space => self.animation.toggle(&mut self.sink),
            KeyCode::KeyR => self.animation.reset(&mut self.sink),
            _ => {}
        }
        self.ctx.window.request_redraw();
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui.state.on_window_event(&self.ctx.window, event);
        if response.repaint {
            self.ctx.window.request_redraw();
        }
        response.consumed
    }
}

/// Logs phase changes and counts frames
#[derive(Default)]
struct LogSink {
    frames: u64,
}

impl FrameSink for LogSink {
    fn present(&mut self, _frame: &FrameSnapshot<'_>) {
        self.frames += 1;
    }

    fn phase_changed(&mut self, notice: &PhaseNotice<'_>) {
        log::info!("{}: {}", notice.label(), notice.info_text());
    }
}

/// Run the animation for `seconds` of simulated time at a fixed frame rate
fn run_headless(config: &SceneConfig, rng: StdRng, seconds: f64) -> anyhow::Result<()> {
    log::info!("Running '{}' headless for {:.1}s", config.title, seconds);

    let mut animation = Animation::new(config, rng, ManualScheduler::new());
    let mut sink = LogSink::default();
    animation.start(&mut sink);

    let step = 1.0 / HEADLESS_FPS;
    let mut now = 0.0;
    while now < seconds {
        let Some(handle) = animation.scheduler_mut().take_pending() else {
            break;
        };
        animation.on_frame(handle, now, &mut sink);
        now += step;
    }
    animation.stop();

    let state = animation.state();
    println!("Simulated {:.2}s in {} frames", state.elapsed, sink.frames);
    println!(
        "Phase: {}  Particles: {}  Active e⁻: {}  Loops: {}  Field: {:.1}%",
        animation.phase_notice().label(),
        state.particles.len(),
        animation.field().active_electrons,
        state.loop_count,
        animation.field().current
    );
    Ok(())
}

fn run_desktop(config: SceneConfig, rng: StdRng) -> anyhow::Result<()> {
    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new(
        &config.title,
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
    ))
    .context("failed to initialise graphics")?;

    let mut app = App::new(ctx, config, rng);

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);

        if let Event::WindowEvent { ref event, .. } = event {
            if app.handle_window_event(event) {
                return;
            }

            match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => app.resize(*size),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => elwt.exit(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key),
                            state,
                            ..
                        },
                    ..
                } => app.handle_key(*key, *state),
                WindowEvent::RedrawRequested => {
                    app.advance();
                    match app.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                        Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                        Err(e) => log::warn!("Render error: {:?}", e),
                    }
                }
                _ => {}
            }
        }
    })?;

    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    config: Option<PathBuf>,
    headless: Option<f64>,
    seed: Option<u64>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => {
                let value = args.next().context("--headless needs a duration in seconds")?;
                let seconds: f64 = value
                    .parse()
                    .with_context(|| format!("invalid --headless duration '{}'", value))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    bail!("--headless duration must be a non-negative number of seconds");
                }
                options.headless = Some(seconds);
            }
            "--seed" => {
                let value = args.next().context("--seed needs a number")?;
                let seed = value
                    .parse()
                    .with_context(|| format!("invalid --seed '{}'", value))?;
                options.seed = Some(seed);
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            path => {
                if options.config.is_some() {
                    bail!("only one scene file may be given");
                }
                options.config = Some(PathBuf::from(path));
            }
        }
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    common::init_logging();

    let options = parse_args(std::env::args().skip(1))?;

    let config = match &options.config {
        Some(path) => SceneConfig::load_from_file(path)
            .with_context(|| format!("failed to load scene from {}", path.display()))?,
        None => SceneConfig::default(),
    };

    let rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match options.headless {
        Some(seconds) => run_headless(&config, rng, seconds),
        None => run_desktop(config, rng),
    }
}
