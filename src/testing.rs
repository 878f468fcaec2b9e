//! Recording collaborators shared by unit tests.

use std::cell::Cell;
use std::num::NonZeroU32;

use nalgebra::{Point3, Vector3};

use crate::error::{InteractError, Result};
use crate::picking::{ElementId, PickQuery, PickResult, PickTarget, PickingService};
use crate::scene::{LodService, MeshEditOps, RendererHooks};

/// A call made on [`RecordingMesh`].
#[derive(Debug, Clone, PartialEq)]
pub enum MeshCall {
    SplitVertex(ElementId),
    SplitEdge(ElementId),
    FlipEdge(ElementId),
    TweakSubdivision(ElementId, i32),
    CommitOffset(ElementId, Vector3<f32>),
    SelectVertex(ElementId),
    OrientToward(ElementId, Point3<f32>),
}

/// Mesh with `num_elements` live ids; anything at or above that is stale.
#[derive(Debug, Default)]
pub struct RecordingMesh {
    pub num_elements: usize,
    pub calls: Vec<MeshCall>,
}

impl RecordingMesh {
    pub fn new(num_elements: usize) -> Self {
        Self {
            num_elements,
            calls: Vec::new(),
        }
    }

    fn check(&self, id: ElementId) -> Result<()> {
        if id.index() < self.num_elements {
            Ok(())
        } else {
            Err(InteractError::InvalidTarget(id))
        }
    }

    fn record(&mut self, id: ElementId, call: MeshCall) -> Result<()> {
        self.check(id)?;
        self.calls.push(call);
        Ok(())
    }

    pub fn commits(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MeshCall::CommitOffset(..)))
            .count()
    }
}

impl MeshEditOps for RecordingMesh {
    fn vertex_position(&self, id: ElementId) -> Result<Point3<f32>> {
        self.check(id)?;
        Ok(Point3::new(id.index() as f32, 0.0, 0.0))
    }

    fn split_vertex(&mut self, id: ElementId) -> Result<()> {
        self.record(id, MeshCall::SplitVertex(id))
    }

    fn split_edge(&mut self, id: ElementId) -> Result<()> {
        self.record(id, MeshCall::SplitEdge(id))
    }

    fn flip_edge(&mut self, id: ElementId) -> Result<()> {
        self.record(id, MeshCall::FlipEdge(id))
    }

    fn tweak_subdivision(&mut self, id: ElementId, delta: i32) -> Result<()> {
        self.record(id, MeshCall::TweakSubdivision(id, delta))
    }

    fn commit_offset(&mut self, id: ElementId, offset: Vector3<f32>) -> Result<()> {
        self.record(id, MeshCall::CommitOffset(id, offset))
    }

    fn select_vertex(&mut self, id: ElementId) -> Result<()> {
        self.record(id, MeshCall::SelectVertex(id))
    }

    fn orient_toward(&mut self, id: ElementId, eye: Point3<f32>) -> Result<()> {
        self.record(id, MeshCall::OrientToward(id, eye))
    }
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub dirty: usize,
    pub resizes: Vec<(u32, u32)>,
    pub screenshots: usize,
}

impl RendererHooks for RecordingRenderer {
    fn mark_dirty(&mut self) {
        self.dirty += 1;
    }

    fn resize_offscreen(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn request_screenshot(&mut self) {
        self.screenshots += 1;
    }
}

#[derive(Debug, Default)]
pub struct StubLod {
    pub active: bool,
    pub selected: Vec<u32>,
}

impl LodService for StubLod {
    fn is_active(&self) -> bool {
        self.active
    }

    fn select_rank(&mut self, rank: NonZeroU32) -> Result<()> {
        if !self.active {
            return Err(InteractError::LodInactive);
        }
        self.selected.push(rank.get());
        Ok(())
    }
}

/// Picker that answers every query with fixed ids.
#[derive(Debug, Default)]
pub struct FixedPicker {
    pub vertex: Option<ElementId>,
    pub edge: Option<ElementId>,
    pub face: Option<ElementId>,
    pub surface: Option<Point3<f32>>,
    pub queries: Cell<usize>,
}

impl FixedPicker {
    /// Everything resolves to element 0 and the surface point (1, 2, 3).
    pub fn hitting() -> Self {
        Self {
            vertex: Some(ElementId::new(0)),
            edge: Some(ElementId::new(0)),
            face: Some(ElementId::new(0)),
            surface: Some(Point3::new(1.0, 2.0, 3.0)),
            queries: Cell::new(0),
        }
    }

    /// Nothing under the cursor.
    pub fn missing() -> Self {
        Self::default()
    }
}

impl PickingService for FixedPicker {
    fn pick(&self, _query: &PickQuery<'_>, target: PickTarget) -> PickResult {
        self.queries.set(self.queries.get() + 1);
        match target {
            PickTarget::Vertex => self.vertex.map_or(PickResult::None, PickResult::Vertex),
            PickTarget::Edge => self.edge.map_or(PickResult::None, PickResult::Edge),
            PickTarget::Face => self.face.map_or(PickResult::None, PickResult::Face),
        }
    }

    fn surface_point(&self, _query: &PickQuery<'_>) -> Option<Point3<f32>> {
        self.queries.set(self.queries.get() + 1);
        self.surface
    }
}
