//! Input dispatch and modal gating.
//!
//! [`InputController`] turns raw pointer, wheel, key, and resize events into
//! camera motion and mesh commands. It owns the camera and the modal state; the
//! mesh, picker, renderer, and LOD service are borrowed per event through a
//! [`SceneContext`].
//!
//! # Modal states
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Idle | left press, no modifiers | Dragging (or a recenter on double-click) |
//! | Idle | middle press, no modifiers | Panning |
//! | Idle | left press + alt, base mesh shown, vertex under cursor | Editing |
//! | Dragging | left release | Idle |
//! | Panning | middle release | Idle |
//! | Editing | *any* release | Idle, edit committed |
//!
//! The modal state is a single [`Mode`] value, so at most one of dragging,
//! panning, or editing can be active at any time. While editing, every press
//! is ignored.
//!
//! # Discrete commands
//!
//! | Input | Layer | Effect |
//! |-------|-------|--------|
//! | middle + alt | any | split vertex |
//! | right + alt | any | split edge |
//! | right + shift | any | flip edge |
//! | right + ctrl | micro-mesh | select vertex, orient it toward the eye |
//! | left + shift | micro-mesh | subdivision level +1 |
//! | left + ctrl | micro-mesh | subdivision level -1 |
//!
//! Each needs the picker to resolve an element of the right class under the
//! cursor; otherwise, or when the mesh reports a stale id, the command is
//! silently dropped.
//!
//! # Overlay focus
//!
//! Presses, wheel, and keys are ignored while the GUI overlay claims input.
//! Releases are always processed so that a drag, pan, or edit begun before the
//! overlay took focus still ends.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use nalgebra::Point2;

use crate::camera::{CameraOptions, OrbitCamera, Viewport};
use crate::edit::EditSession;
use crate::error::{InteractError, Result};
use crate::input::{ButtonAction, Key, KeyAction, Modifiers, MouseButton};
use crate::picking::{ElementId, PickQuery, PickTarget};
use crate::scene::{MeshEditOps, RenderLayer, SceneContext};

/// Controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    /// Two plain left presses closer than this are a double-click.
    pub double_click: Duration,
    /// Angle (radians) one arrow-key press orbits by.
    pub keyboard_orbit_step: f32,
    /// Camera parameters.
    pub camera: CameraOptions,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            double_click: Duration::from_millis(250),
            keyboard_orbit_step: 30.0_f32.to_radians(),
            camera: CameraOptions::default(),
        }
    }
}

impl ControllerOptions {
    /// Set the double-click window.
    pub fn with_double_click(mut self, window: Duration) -> Self {
        self.double_click = window;
        self
    }

    /// Set the arrow-key orbit step in radians.
    pub fn with_keyboard_orbit_step(mut self, step: f32) -> Self {
        self.keyboard_orbit_step = step;
        self
    }

    /// Set the camera options.
    pub fn with_camera(mut self, camera: CameraOptions) -> Self {
        self.camera = camera;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.keyboard_orbit_step.is_finite() {
            return Err(InteractError::invalid_param(
                "keyboard_orbit_step",
                self.keyboard_orbit_step,
                "must be finite",
            ));
        }
        self.camera.validate()
    }
}

/// Modal interaction state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Left-drag orbiting the camera.
    Dragging,
    /// Middle-drag panning the camera.
    Panning,
    /// Alt-drag moving a vertex.
    Editing(EditSession),
}

/// [`Mode`] without the session payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Nothing in progress.
    Idle,
    /// Orbiting.
    Dragging,
    /// Panning.
    Panning,
    /// Editing a vertex.
    Editing,
}

impl Mode {
    /// The state without payload.
    pub fn state(&self) -> InteractionState {
        match self {
            Mode::Idle => InteractionState::Idle,
            Mode::Dragging => InteractionState::Dragging,
            Mode::Panning => InteractionState::Panning,
            Mode::Editing(_) => InteractionState::Editing,
        }
    }

    /// True when idle.
    pub fn is_idle(&self) -> bool {
        matches!(self, Mode::Idle)
    }

    /// True while a vertex edit is in progress.
    pub fn is_editing(&self) -> bool {
        matches!(self, Mode::Editing(_))
    }
}

/// View flags flipped from the keyboard and read by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewToggles {
    /// Draw the auxiliary top-mesh layer.
    pub show_top_mesh: bool,
    /// Show the rendering options panel.
    pub show_rendering_options: bool,
}

/// Remembers the last plain left press for double-click detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickTimer {
    last: Option<Instant>,
}

impl ClickTimer {
    /// Record a press and return the time since the previous one, if any.
    pub fn restart(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = self.last.map(|at| now.saturating_duration_since(at));
        self.last = Some(now);
        elapsed
    }
}

/// Single-shot mesh commands bound to modified clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Split the vertex nearest the cursor.
    SplitVertex,
    /// Split the edge nearest the cursor.
    SplitEdge,
    /// Flip the edge nearest the cursor.
    FlipEdge,
    /// Select the vertex nearest the cursor and orient it toward the eye.
    OrientVertex,
    /// Raise the subdivision level of the face under the cursor.
    RefineSubdivision,
    /// Lower the subdivision level of the face under the cursor.
    CoarsenSubdivision,
}

impl Command {
    const ALL: [Command; 6] = [
        Command::SplitVertex,
        Command::SplitEdge,
        Command::FlipEdge,
        Command::OrientVertex,
        Command::RefineSubdivision,
        Command::CoarsenSubdivision,
    ];

    /// Commands fired by a press. Modifiers are tested independently, so a
    /// press can fire more than one.
    pub fn for_press(button: MouseButton, mods: Modifiers) -> impl Iterator<Item = Command> {
        Self::ALL
            .into_iter()
            .filter(move |c| c.triggered_by(button, mods))
    }

    fn triggered_by(self, button: MouseButton, mods: Modifiers) -> bool {
        match self {
            Command::SplitVertex => button == MouseButton::Middle && mods.alt,
            Command::SplitEdge => button == MouseButton::Right && mods.alt,
            Command::FlipEdge => button == MouseButton::Right && mods.shift,
            Command::OrientVertex => button == MouseButton::Right && mods.ctrl,
            Command::RefineSubdivision => button == MouseButton::Left && mods.shift,
            Command::CoarsenSubdivision => button == MouseButton::Left && mods.ctrl,
        }
    }

    /// Whether the command is legal while `layer` is displayed.
    pub fn allowed_on(self, layer: RenderLayer) -> bool {
        match self {
            Command::SplitVertex => true,
            Command::SplitEdge | Command::FlipEdge => {
                matches!(layer, RenderLayer::BaseMesh | RenderLayer::MicroMesh)
            }
            Command::OrientVertex | Command::RefineSubdivision | Command::CoarsenSubdivision => {
                layer == RenderLayer::MicroMesh
            }
        }
    }

    /// Element class the command acts on.
    pub fn pick_target(self) -> PickTarget {
        match self {
            Command::SplitVertex | Command::OrientVertex => PickTarget::Vertex,
            Command::SplitEdge | Command::FlipEdge => PickTarget::Edge,
            Command::RefineSubdivision | Command::CoarsenSubdivision => PickTarget::Face,
        }
    }

    fn apply(self, id: ElementId, camera: &OrbitCamera, mesh: &mut dyn MeshEditOps) -> Result<()> {
        match self {
            Command::SplitVertex => mesh.split_vertex(id),
            Command::SplitEdge => mesh.split_edge(id),
            Command::FlipEdge => mesh.flip_edge(id),
            Command::OrientVertex => {
                mesh.select_vertex(id)?;
                mesh.orient_toward(id, camera.eye_position())
            }
            Command::RefineSubdivision => mesh.tweak_subdivision(id, 1),
            Command::CoarsenSubdivision => mesh.tweak_subdivision(id, -1),
        }
    }
}

/// Event dispatcher and owner of the camera and modal state.
#[derive(Debug, Clone)]
pub struct InputController {
    camera: OrbitCamera,
    viewport: Viewport,
    mode: Mode,
    cursor: Option<Point2<f32>>,
    clicks: ClickTimer,
    toggles: ViewToggles,
    options: ControllerOptions,
}

impl Default for InputController {
    fn default() -> Self {
        Self {
            camera: OrbitCamera::default(),
            viewport: Viewport::default(),
            mode: Mode::Idle,
            cursor: None,
            clicks: ClickTimer::default(),
            toggles: ViewToggles::default(),
            options: ControllerOptions::default(),
        }
    }
}

impl InputController {
    /// Create a controller with validated options.
    pub fn new(options: ControllerOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            camera: OrbitCamera::new(options.camera.clone())?,
            options,
            ..Self::default()
        })
    }

    /// Set the initial framebuffer size (builder form).
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
        self
    }

    /// The camera.
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Current framebuffer size.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current modal state.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Current modal state without payload.
    pub fn state(&self) -> InteractionState {
        self.mode.state()
    }

    /// The active edit, if any.
    pub fn edit_session(&self) -> Option<&EditSession> {
        match &self.mode {
            Mode::Editing(session) => Some(session),
            _ => None,
        }
    }

    /// Keyboard-controlled view flags.
    pub fn toggles(&self) -> ViewToggles {
        self.toggles
    }

    /// Last cursor position in framebuffer pixels.
    pub fn cursor(&self) -> Option<Point2<f32>> {
        self.cursor
    }

    /// The options in use.
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Frame a freshly loaded mesh.
    pub fn frame(&mut self, center: nalgebra::Point3<f32>, radius: f32) {
        self.camera.reset(center, radius);
    }

    /// Commit and close the active edit.
    ///
    /// Fails with [`InteractError::InvalidModalTransition`] when no edit is
    /// active; the state is left untouched in that case.
    pub fn finalize_edit(&mut self, ctx: &mut SceneContext<'_>) -> Result<()> {
        match std::mem::take(&mut self.mode) {
            Mode::Editing(session) => {
                let result = session.finalize(&mut *ctx.mesh);
                ctx.renderer.mark_dirty();
                result
            }
            other => {
                self.mode = other;
                Err(InteractError::InvalidModalTransition)
            }
        }
    }

    /// Keyboard callback.
    pub fn on_key(&mut self, ctx: &mut SceneContext<'_>, key: Key, action: KeyAction) {
        if ctx.overlay.wants_keyboard || !ctx.mesh_loaded || action != KeyAction::Press {
            return;
        }

        let step = self.options.keyboard_orbit_step / self.camera.options().rotate_sensitivity;
        match key {
            Key::Digit(digit) => {
                if !ctx.lod.is_active() {
                    return;
                }
                let Some(rank) = NonZeroU32::new(u32::from(digit)) else {
                    return;
                };
                match ctx.lod.select_rank(rank) {
                    Ok(()) => {
                        log::info!("selected LOD rank {rank}");
                        ctx.renderer.mark_dirty();
                    }
                    Err(e) => log::debug!("LOD rank {rank} not selected: {e}"),
                }
            }
            Key::V => {
                self.toggles.show_top_mesh = !self.toggles.show_top_mesh;
                log::info!(
                    "Top mesh: {}",
                    if self.toggles.show_top_mesh { "ON" } else { "OFF" }
                );
                ctx.renderer.mark_dirty();
            }
            Key::R => {
                self.toggles.show_rendering_options = !self.toggles.show_rendering_options;
                log::info!(
                    "Rendering options: {}",
                    if self.toggles.show_rendering_options { "ON" } else { "OFF" }
                );
            }
            Key::Space => ctx.renderer.request_screenshot(),
            Key::Left => self.orbit_by_keys(ctx, step, 0.0),
            Key::Right => self.orbit_by_keys(ctx, -step, 0.0),
            Key::Up => self.orbit_by_keys(ctx, 0.0, step),
            Key::Down => self.orbit_by_keys(ctx, 0.0, -step),
            Key::Other => {}
        }
    }

    /// Arrow keys feed the same pixel-delta entry point as dragging.
    fn orbit_by_keys(&mut self, ctx: &mut SceneContext<'_>, dx_pixels: f32, dy_pixels: f32) {
        self.camera.update_polar_angles(dx_pixels, dy_pixels);
        ctx.renderer.mark_dirty();
    }

    /// Mouse wheel callback. Only the vertical offset zooms.
    pub fn on_scroll(&mut self, ctx: &mut SceneContext<'_>, _x_offset: f64, y_offset: f64) {
        if ctx.overlay.wants_mouse || !ctx.mesh_loaded || y_offset == 0.0 {
            return;
        }
        self.camera.update_polar_radius(y_offset as f32);
        log::trace!("zoom: radius {:.4}", self.camera.radius());
        ctx.renderer.mark_dirty();
    }

    /// Cursor callback, position in framebuffer pixels.
    ///
    /// The position is always tracked so the next delta is correct; motion
    /// only has an effect while a drag, pan, or edit is active.
    pub fn on_cursor_move(&mut self, ctx: &mut SceneContext<'_>, x: f64, y: f64) {
        let position = Point2::new(x as f32, y as f32);
        let previous = self.cursor.replace(position);
        if !ctx.mesh_loaded {
            return;
        }
        let Some(previous) = previous else {
            return;
        };
        let delta = position - previous;

        match &mut self.mode {
            Mode::Idle => return,
            Mode::Editing(session) => {
                session.update(delta, &self.camera, self.viewport);
                log::trace!("edit offset {:?}", session.current_offset());
            }
            Mode::Dragging => self.camera.update_polar_angles(delta.x, delta.y),
            Mode::Panning => {
                let d = self.viewport.normalize_delta(delta.x, delta.y);
                self.camera.pan(d.x, d.y);
            }
        }
        ctx.renderer.mark_dirty();
    }

    /// Mouse button callback. `now` is the event time.
    pub fn on_mouse_button(
        &mut self,
        ctx: &mut SceneContext<'_>,
        button: MouseButton,
        action: ButtonAction,
        mods: Modifiers,
        now: Instant,
    ) {
        match action {
            ButtonAction::Release => self.release(ctx, button),
            ButtonAction::Press => {
                if ctx.overlay.wants_mouse || !ctx.mesh_loaded {
                    return;
                }
                self.press(ctx, button, mods, now);
            }
        }
    }

    fn press(&mut self, ctx: &mut SceneContext<'_>, button: MouseButton, mods: Modifiers, now: Instant) {
        if self.mode.is_editing() {
            return;
        }

        if button == MouseButton::Left && mods.is_empty() {
            let elapsed = self.clicks.restart(now);
            let double = elapsed.is_some_and(|e| e < self.options.double_click)
                && !(mods.ctrl || mods.shift);
            // A second press mid-pan restarts the timer but neither recenters nor drags
            if self.mode.is_idle() {
                if double {
                    self.center_on_cursor(ctx);
                } else {
                    log::debug!("drag started");
                    self.mode = Mode::Dragging;
                }
            }
        }

        if button == MouseButton::Middle && mods.is_empty() && self.mode.is_idle() {
            log::debug!("pan started");
            self.mode = Mode::Panning;
        }

        if button == MouseButton::Left
            && mods.alt
            && ctx.layer == RenderLayer::BaseMesh
            && self.mode.is_idle()
        {
            self.begin_edit(ctx);
        }

        for command in Command::for_press(button, mods) {
            self.run_command(ctx, command);
        }
    }

    fn release(&mut self, ctx: &mut SceneContext<'_>, button: MouseButton) {
        match self.mode {
            Mode::Editing(_) => {
                if let Err(e) = self.finalize_edit(ctx) {
                    log::debug!("edit discarded: {e}");
                }
            }
            Mode::Dragging if button == MouseButton::Left => {
                log::debug!("drag ended");
                self.mode = Mode::Idle;
            }
            Mode::Panning if button == MouseButton::Middle => {
                log::debug!("pan ended");
                self.mode = Mode::Idle;
            }
            _ => {}
        }
    }

    fn pick_query(&self, layer: RenderLayer) -> Option<PickQuery<'_>> {
        Some(PickQuery {
            cursor: self.cursor?,
            layer,
            camera: &self.camera,
            viewport: self.viewport,
        })
    }

    fn center_on_cursor(&mut self, ctx: &mut SceneContext<'_>) {
        let Some(query) = self.pick_query(ctx.layer) else {
            return;
        };
        let surface = ctx.picker.surface_point(&query);
        match surface {
            Some(point) => {
                log::debug!("recentering on ({:.4}, {:.4}, {:.4})", point.x, point.y, point.z);
                self.camera.center_on(point);
                ctx.renderer.mark_dirty();
            }
            None => log::debug!("double-click off the mesh; not recentering"),
        }
    }

    fn begin_edit(&mut self, ctx: &mut SceneContext<'_>) {
        let Some(query) = self.pick_query(ctx.layer) else {
            return;
        };
        let pick = ctx.picker.pick(&query, PickTarget::Vertex);
        if let Some(session) = EditSession::init(pick, &*ctx.mesh) {
            log::debug!("editing {:?}", session.target());
            self.mode = Mode::Editing(session);
        }
    }

    fn run_command(&mut self, ctx: &mut SceneContext<'_>, command: Command) {
        if !command.allowed_on(ctx.layer) {
            log::debug!("{command:?} not available on {:?}", ctx.layer);
            return;
        }
        let Some(query) = self.pick_query(ctx.layer) else {
            return;
        };
        let target = command.pick_target();
        let Some(id) = ctx.picker.pick(&query, target).matching(target) else {
            log::debug!("{command:?}: nothing under the cursor");
            return;
        };

        match command.apply(id, &self.camera, &mut *ctx.mesh) {
            Ok(()) => {
                log::debug!("{command:?} applied to {id:?}");
                ctx.renderer.mark_dirty();
            }
            Err(e) => log::debug!("{command:?} discarded: {e}"),
        }
    }

    /// Framebuffer resize callback.
    ///
    /// Minimized windows report a zero-area framebuffer; such events change
    /// nothing.
    pub fn on_framebuffer_resize(
        &mut self,
        ctx: &mut SceneContext<'_>,
        width: u32,
        height: u32,
        minimized: bool,
    ) {
        if minimized {
            log::debug!("ignoring resize while minimized");
            return;
        }
        let viewport = match Viewport::new(width, height) {
            Ok(viewport) => viewport,
            Err(e) => {
                log::debug!("ignoring resize to {width}x{height}: {e}");
                return;
            }
        };
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
        ctx.renderer.resize_offscreen(width, height);
    }
}
