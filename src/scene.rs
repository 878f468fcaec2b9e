//! Collaborators the controller talks to.
//!
//! The interaction core decides *when* and *on what* to act; the mesh, the
//! renderer, and the level-of-detail service do the actual work. Each is a
//! trait so the windowing adapter can plug in its own implementation and tests
//! can plug in recording fakes.
//!
//! A [`SceneContext`] bundles borrowed collaborators plus the read-only view
//! state for the duration of one input event. It replaces any ambient global
//! application pointer: every handler receives it explicitly.

use std::num::NonZeroU32;

use nalgebra::{Point3, Vector3};

use crate::error::Result;
use crate::picking::{ElementId, PickingService};

/// Which mesh representation is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderLayer {
    /// The coarse base mesh.
    #[default]
    BaseMesh,
    /// The subdivided, displaced micro-mesh.
    MicroMesh,
}

impl RenderLayer {
    /// Dense index for per-layer tables.
    pub fn index(self) -> usize {
        match self {
            RenderLayer::BaseMesh => 0,
            RenderLayer::MicroMesh => 1,
        }
    }
}

/// What the GUI overlay currently claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayFocus {
    /// The overlay wants pointer events (hovering a panel, dragging a slider).
    pub wants_mouse: bool,
    /// The overlay wants key events (a text field is focused).
    pub wants_keyboard: bool,
}

/// Topology and geometry mutations on the displayed mesh.
///
/// Every method may fail with
/// [`InteractError::InvalidTarget`](crate::error::InteractError::InvalidTarget)
/// when the id went stale; callers discard such commands without retrying.
pub trait MeshEditOps {
    /// Current position of a vertex.
    fn vertex_position(&self, id: ElementId) -> Result<Point3<f32>>;

    /// Split a vertex.
    fn split_vertex(&mut self, id: ElementId) -> Result<()>;

    /// Split an edge at its midpoint.
    fn split_edge(&mut self, id: ElementId) -> Result<()>;

    /// Flip an edge shared by two triangles.
    fn flip_edge(&mut self, id: ElementId) -> Result<()>;

    /// Raise (`delta > 0`) or lower the subdivision level of a base face.
    fn tweak_subdivision(&mut self, id: ElementId, delta: i32) -> Result<()>;

    /// Move a vertex by `offset`.
    fn commit_offset(&mut self, id: ElementId, offset: Vector3<f32>) -> Result<()>;

    /// Make a vertex the current selection.
    fn select_vertex(&mut self, id: ElementId) -> Result<()>;

    /// Point a vertex's displacement direction toward `eye`.
    fn orient_toward(&mut self, id: ElementId, eye: Point3<f32>) -> Result<()>;
}

/// Hooks into the external renderer.
pub trait RendererHooks {
    /// The scene changed and needs a full redraw.
    fn mark_dirty(&mut self);

    /// Reallocate offscreen buffers for a new framebuffer size.
    fn resize_offscreen(&mut self, width: u32, height: u32);

    /// Capture the next frame to an image.
    fn request_screenshot(&mut self);
}

/// Level-of-detail ("quality") ranking service.
pub trait LodService {
    /// Whether an LOD mode is active, i.e. ranks are selectable.
    fn is_active(&self) -> bool;

    /// Jump the view to the `rank`-th ranked level (1-indexed).
    fn select_rank(&mut self, rank: NonZeroU32) -> Result<()>;
}

/// Collaborators and read-only view state for one input event.
pub struct SceneContext<'a> {
    /// Whether a mesh is loaded; almost every command requires one.
    pub mesh_loaded: bool,
    /// The layer currently displayed.
    pub layer: RenderLayer,
    /// What the GUI overlay wants to capture.
    pub overlay: OverlayFocus,
    /// Cursor picking.
    pub picker: &'a dyn PickingService,
    /// Mesh mutations.
    pub mesh: &'a mut dyn MeshEditOps,
    /// Renderer hooks.
    pub renderer: &'a mut dyn RendererHooks,
    /// Level-of-detail service.
    pub lod: &'a mut dyn LodService,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_index_is_dense() {
        assert_eq!(RenderLayer::BaseMesh.index(), 0);
        assert_eq!(RenderLayer::MicroMesh.index(), 1);
        assert_eq!(RenderLayer::default(), RenderLayer::BaseMesh);
    }
}
