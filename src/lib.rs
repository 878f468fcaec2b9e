//! # micromesh-control
//!
//! The interaction core of a micro-mesh viewer: it turns raw window events
//! into orbit-camera motion, cursor picking, and mesh edit commands.
//!
//! Nothing here renders or owns mesh data. The host application implements
//! a handful of small traits ([`scene::MeshEditOps`], [`scene::RendererHooks`],
//! [`scene::LodService`], [`picking::PickingService`]) and forwards its window
//! events to an [`controller::InputController`].
//!
//! ## Features
//!
//! - **Orbit camera**: azimuth/elevation/radius with clamping, pan, and
//!   screen-space projection helpers
//! - **Modal input**: drag, pan, and vertex edit as mutually exclusive states
//! - **Gated commands**: vertex/edge splits, edge flips, and subdivision
//!   tweaks bound to modified clicks, filtered by the displayed layer
//! - **Overlay aware**: GUI focus suppresses presses but never releases
//!
//! ## Quick Start
//!
//! ```
//! use micromesh_control::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut camera = OrbitCamera::default();
//! camera.center_on(Point3::new(0.0, 1.0, 0.0));
//! camera.update_polar_angles(40.0, 0.0);
//! camera.update_polar_radius(1.0);
//!
//! let view = camera.derive_view_matrix();
//! let eye = camera.eye_position();
//! let in_view = view.transform_point(&eye);
//! assert!(in_view.coords.norm() < 1e-4);
//! ```
//!
//! ## Wiring a window
//!
//! Every handler takes a [`scene::SceneContext`] built for the duration of
//! one event:
//!
//! ```ignore
//! let mut ctx = SceneContext {
//!     mesh_loaded: true,
//!     layer: RenderLayer::BaseMesh,
//!     overlay: OverlayFocus::default(),
//!     picker: &picker,
//!     mesh: &mut mesh,
//!     renderer: &mut hooks,
//!     lod: &mut lod,
//! };
//! controller.on_mouse_button(&mut ctx, button, action, mods, Instant::now());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera;
pub mod controller;
pub mod edit;
pub mod error;
pub mod input;
pub mod picking;
pub mod scene;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports.
///
/// ```
/// use micromesh_control::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{CameraOptions, OrbitCamera, Viewport};
    pub use crate::controller::{
        ControllerOptions, InputController, InteractionState, Mode, ViewToggles,
    };
    pub use crate::edit::EditSession;
    pub use crate::error::{InteractError, Result};
    pub use crate::input::{ButtonAction, Key, KeyAction, Modifiers, MouseButton};
    pub use crate::picking::{
        ElementId, MeshPicker, PickGeometry, PickQuery, PickResult, PickTarget, PickingService,
    };
    pub use crate::scene::{
        LodService, MeshEditOps, OverlayFocus, RenderLayer, RendererHooks, SceneContext,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::testing::{MeshCall, RecordingMesh, RecordingRenderer, StubLod};
    use nalgebra::Point3;
    use std::time::Instant;

    #[test]
    fn test_edit_through_mesh_picker() {
        let geometry = PickGeometry::from_triangles(
            vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, geometry);
        let mut mesh = RecordingMesh::new(3);
        let mut renderer = RecordingRenderer::default();
        let mut lod = StubLod::default();

        let mut controller = InputController::default();
        let mut ctx = SceneContext {
            mesh_loaded: true,
            layer: RenderLayer::BaseMesh,
            overlay: OverlayFocus::default(),
            picker: &picker,
            mesh: &mut mesh,
            renderer: &mut renderer,
            lod: &mut lod,
        };

        // Center of the default viewport looks straight at the origin
        controller.on_cursor_move(&mut ctx, 512.0, 384.0);
        controller.on_mouse_button(
            &mut ctx,
            MouseButton::Left,
            ButtonAction::Press,
            Modifiers::ALT,
            Instant::now(),
        );
        assert_eq!(controller.state(), InteractionState::Editing);
        // The apex is the vertex closest to the hit at the origin
        assert_eq!(controller.edit_session().unwrap().target(), ElementId::new(2));

        controller.on_cursor_move(&mut ctx, 530.0, 384.0);
        controller.on_mouse_button(
            &mut ctx,
            MouseButton::Left,
            ButtonAction::Release,
            Modifiers::NONE,
            Instant::now(),
        );
        assert_eq!(controller.state(), InteractionState::Idle);
        drop(ctx);

        assert!(matches!(
            mesh.calls.as_slice(),
            [MeshCall::CommitOffset(id, offset)] if *id == ElementId::new(2) && offset.x > 0.0
        ));
    }
}
