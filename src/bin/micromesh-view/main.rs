//! Interactive viewer driving the micromesh interaction core.
//!
//! Usage: micromesh-view [--double-click-ms <ms>] [--sensitivity <rad/px>]
//!        [--zoom-factor <f>] [--layer <base|micro>] [--lod <ranks>]
//!
//! Controls:
//! - Left drag: orbit; double-click: recenter on the surface
//! - Middle drag: pan
//! - Scroll wheel: zoom
//! - Alt + left drag: move a vertex (base mesh)
//! - Alt + middle: split vertex; alt + right: split edge; shift + right: flip edge
//! - Ctrl + right: orient vertex toward the eye (micro-mesh)
//! - Shift / ctrl + left: raise / lower subdivision (micro-mesh)
//! - 1-9: select LOD rank; V: top mesh; R: rendering options; Space: screenshot
//! - Arrow keys: orbit in 30° steps
//! - Escape: quit

mod demo_mesh;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use micromesh_control::error::Result;
use micromesh_control::prelude::*;

use demo_mesh::{DemoMesh, RankedLod};

/// Layer shown at startup.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayerArg {
    /// Coarse base mesh
    Base,
    /// Subdivided micro-mesh
    Micro,
}

impl From<LayerArg> for RenderLayer {
    fn from(layer: LayerArg) -> Self {
        match layer {
            LayerArg::Base => RenderLayer::BaseMesh,
            LayerArg::Micro => RenderLayer::MicroMesh,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "micromesh-view", version, about = "Orbit, pick, and edit a demo mesh")]
struct Cli {
    /// Double-click window in milliseconds
    #[arg(long, default_value_t = 250)]
    double_click_ms: u64,

    /// Orbit speed in radians per pixel
    #[arg(long, default_value_t = 0.005)]
    sensitivity: f32,

    /// Radius scale per scroll unit
    #[arg(long, default_value_t = 1.1)]
    zoom_factor: f32,

    /// Layer shown at startup
    #[arg(long, value_enum, default_value_t = LayerArg::Base)]
    layer: LayerArg,

    /// Number of LOD ranks selectable with the digit keys (0 disables)
    #[arg(long, default_value_t = 0)]
    lod: u32,
}

impl Cli {
    fn controller_options(&self) -> ControllerOptions {
        ControllerOptions::default()
            .with_double_click(Duration::from_millis(self.double_click_ms))
            .with_camera(
                CameraOptions::default()
                    .with_rotate_sensitivity(self.sensitivity)
                    .with_zoom_factor(self.zoom_factor),
            )
    }
}

/// Renderer hooks backed by the window. Drawing itself lives elsewhere;
/// this only schedules redraws and tracks offscreen state.
#[derive(Default)]
struct WindowHooks {
    window: Option<Arc<Window>>,
    offscreen: Option<(u32, u32)>,
    screenshot_pending: bool,
}

impl RendererHooks for WindowHooks {
    fn mark_dirty(&mut self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn resize_offscreen(&mut self, width: u32, height: u32) {
        log::debug!("offscreen buffers: {width}x{height}");
        self.offscreen = Some((width, height));
    }

    fn request_screenshot(&mut self) {
        self.screenshot_pending = true;
        self.mark_dirty();
    }
}

/// Application state.
struct App {
    controller: InputController,
    mesh: DemoMesh,
    picker: MeshPicker,
    /// Mesh revision the picker geometry was built from.
    picker_revision: u64,
    lod: RankedLod,
    hooks: WindowHooks,
    layer: RenderLayer,
    modifiers: Modifiers,
    frames: u64,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let controller = InputController::new(cli.controller_options())?;
        let mesh = DemoMesh::octahedron()?;
        let mut app = Self {
            controller,
            mesh,
            picker: MeshPicker::new(),
            picker_revision: 0,
            lod: RankedLod::new(cli.lod),
            hooks: WindowHooks::default(),
            layer: cli.layer.into(),
            modifiers: Modifiers::NONE,
            frames: 0,
        };
        app.sync_picker(true);

        let (center, radius) = app.mesh.bounds();
        app.controller.frame(center, radius * 2.5);
        Ok(app)
    }

    /// Both layers pick against the same demo geometry.
    fn sync_picker(&mut self, force: bool) {
        if !force && self.mesh.revision() == self.picker_revision {
            return;
        }
        let geometry = self.mesh.geometry().clone();
        self.picker.set_layer(RenderLayer::MicroMesh, geometry.clone());
        self.picker.set_layer(RenderLayer::BaseMesh, geometry);
        self.picker_revision = self.mesh.revision();
    }

    /// Run one controller handler with a context borrowed from the app.
    fn dispatch(&mut self, handler: impl FnOnce(&mut InputController, &mut SceneContext<'_>)) {
        let mut ctx = SceneContext {
            mesh_loaded: true,
            layer: self.layer,
            overlay: OverlayFocus::default(),
            picker: &self.picker,
            mesh: &mut self.mesh,
            renderer: &mut self.hooks,
            lod: &mut self.lod,
        };
        handler(&mut self.controller, &mut ctx);
        self.sync_picker(false);
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let minimized = size.width == 0
            || size.height == 0
            || self
                .hooks
                .window
                .as_ref()
                .and_then(|w| w.is_minimized())
                .unwrap_or(false);
        self.dispatch(|c, ctx| c.on_framebuffer_resize(ctx, size.width, size.height, minimized));
        self.hooks.mark_dirty();
    }

    fn key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
            event_loop.exit();
            return;
        }
        let key = Key::from(event.physical_key);
        let action = KeyAction::from_winit(event.state, event.repeat);
        self.dispatch(|c, ctx| c.on_key(ctx, key, action));
    }

    fn redraw(&mut self) {
        self.frames += 1;
        let camera = self.controller.camera();
        let eye = camera.eye_position();
        log::trace!(
            "frame {}: eye ({:.3}, {:.3}, {:.3}), state {:?}, toggles {:?}, selected {:?}, lod {:?}",
            self.frames,
            eye.x,
            eye.y,
            eye.z,
            self.controller.state(),
            self.controller.toggles(),
            self.mesh.selected(),
            self.lod.current()
        );
        if std::mem::take(&mut self.hooks.screenshot_pending) {
            let (w, h) = self.hooks.offscreen.unwrap_or((0, 0));
            log::info!("screenshot of frame {} requested at {w}x{h}", self.frames);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.hooks.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Micromesh Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.hooks.window = Some(window);
        self.resize(size);
        log::info!(
            "Demo mesh: {} vertices, {} faces; layer {:?}",
            self.mesh.geometry().num_vertices(),
            self.mesh.geometry().num_faces(),
            self.layer
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state().into();
            }

            WindowEvent::KeyboardInput { event, .. } => self.key(event_loop, event),

            WindowEvent::CursorMoved { position, .. } => {
                self.dispatch(|c, ctx| c.on_cursor_move(ctx, position.x, position.y));
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let mods = self.modifiers;
                let now = Instant::now();
                self.dispatch(|c, ctx| {
                    c.on_mouse_button(ctx, button.into(), state.into(), mods, now)
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (f64::from(x), f64::from(y)),
                    MouseScrollDelta::PixelDelta(pos) => (pos.x / 100.0, pos.y / 100.0),
                };
                self.dispatch(|c, ctx| c.on_scroll(ctx, x, y));
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let mut app = match App::new(&cli) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
        std::process::exit(1);
    }
}
