//! Direct-manipulation vertex editing.
//!
//! An [`EditSession`] lives exactly as long as one alt-drag. It is created from
//! a pick, accumulates cursor motion as a world-space offset in the plane
//! facing the camera, and is consumed by [`EditSession::finalize`], which
//! commits the offset to the mesh. Because `finalize` takes the session by
//! value, a session cannot be committed twice.

use nalgebra::{Point3, Vector2, Vector3};

use crate::camera::{OrbitCamera, Viewport};
use crate::error::Result;
use crate::picking::{ElementId, PickResult};
use crate::scene::MeshEditOps;

/// An in-progress vertex drag.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    target: ElementId,
    original_position: Point3<f32>,
    current_offset: Vector3<f32>,
}

impl EditSession {
    /// Start editing the picked vertex.
    ///
    /// Returns `None` (and nothing is started) when the pick found no vertex or
    /// the vertex has gone stale.
    pub fn init(pick: PickResult, mesh: &dyn MeshEditOps) -> Option<Self> {
        let target = pick.vertex()?;
        match mesh.vertex_position(target) {
            Ok(original_position) => Some(Self {
                target,
                original_position,
                current_offset: Vector3::zeros(),
            }),
            Err(e) => {
                log::debug!("edit not started: {e}");
                None
            }
        }
    }

    /// The vertex being dragged.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Where the vertex was when the drag began.
    pub fn original_position(&self) -> Point3<f32> {
        self.original_position
    }

    /// Offset accumulated so far.
    pub fn current_offset(&self) -> Vector3<f32> {
        self.current_offset
    }

    /// Where the vertex would land if committed now.
    pub fn current_position(&self) -> Point3<f32> {
        self.original_position + self.current_offset
    }

    /// Accumulate a cursor delta (pixels, y down).
    ///
    /// The delta is mapped onto the plane through the vertex facing the
    /// camera, scaled so the vertex tracks the cursor at its own depth.
    pub fn update(&mut self, cursor_delta: Vector2<f32>, camera: &OrbitCamera, viewport: Viewport) {
        if !(cursor_delta.x.is_finite() && cursor_delta.y.is_finite()) {
            return;
        }
        let scale = camera.world_units_per_pixel(&self.current_position(), viewport);
        let (right, up) = camera.view_basis();
        self.current_offset += (right * cursor_delta.x - up * cursor_delta.y) * scale;
    }

    /// Commit the accumulated offset and end the session.
    pub fn finalize(self, mesh: &mut dyn MeshEditOps) -> Result<()> {
        log::debug!(
            "committing edit of {:?}: offset ({:.4}, {:.4}, {:.4})",
            self.target,
            self.current_offset.x,
            self.current_offset.y,
            self.current_offset.z
        );
        mesh.commit_offset(self.target, self.current_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MeshCall, RecordingMesh};

    #[test]
    fn test_init_requires_vertex() {
        let mesh = RecordingMesh::new(4);
        assert!(EditSession::init(PickResult::None, &mesh).is_none());
        assert!(EditSession::init(PickResult::Edge(ElementId::new(1)), &mesh).is_none());

        let session = EditSession::init(PickResult::Vertex(ElementId::new(2)), &mesh).unwrap();
        assert_eq!(session.target(), ElementId::new(2));
        assert_eq!(session.original_position(), Point3::new(2.0, 0.0, 0.0));
        assert_eq!(session.current_offset(), Vector3::zeros());
    }

    #[test]
    fn test_init_stale_vertex_is_noop() {
        let mesh = RecordingMesh::new(4);
        assert!(EditSession::init(PickResult::Vertex(ElementId::new(9)), &mesh).is_none());
    }

    #[test]
    fn test_update_moves_in_view_plane() {
        let mesh = RecordingMesh::new(1);
        let mut session = EditSession::init(PickResult::Vertex(ElementId::new(0)), &mesh).unwrap();
        let camera = OrbitCamera::default();
        let viewport = Viewport::default();

        session.update(Vector2::new(10.0, 0.0), &camera, viewport);
        session.update(Vector2::new(0.0, -4.0), &camera, viewport);

        let (right, up) = camera.view_basis();
        let forward = camera.target() - camera.eye_position();
        let offset = session.current_offset();

        // No motion along the view direction
        assert!(offset.dot(&forward).abs() < 1e-5);
        // Right and up (screen y is down, so -4 px is upward)
        assert!(offset.dot(&right) > 0.0);
        assert!(offset.dot(&up) > 0.0);
    }

    #[test]
    fn test_vertex_tracks_cursor_on_screen() {
        let mesh = RecordingMesh::new(1);
        let mut session = EditSession::init(PickResult::Vertex(ElementId::new(0)), &mesh).unwrap();
        let mut camera = OrbitCamera::default();
        camera.center_on(session.original_position());
        let viewport = Viewport::default();

        let before = camera.project(&session.current_position(), viewport).unwrap();
        session.update(Vector2::new(25.0, 15.0), &camera, viewport);
        let after = camera.project(&session.current_position(), viewport).unwrap();

        assert!((after.x - before.x - 25.0).abs() < 0.1);
        assert!((after.y - before.y - 15.0).abs() < 0.1);
    }

    #[test]
    fn test_finalize_commits_once() {
        let mut mesh = RecordingMesh::new(1);
        let mut session = EditSession::init(PickResult::Vertex(ElementId::new(0)), &mesh).unwrap();
        session.update(Vector2::new(3.0, 3.0), &OrbitCamera::default(), Viewport::default());
        let offset = session.current_offset();

        session.finalize(&mut mesh).unwrap();
        assert_eq!(mesh.calls, vec![MeshCall::CommitOffset(ElementId::new(0), offset)]);
    }

    #[test]
    fn test_finalize_reports_stale_target() {
        let mut mesh = RecordingMesh::new(1);
        let session = EditSession::init(PickResult::Vertex(ElementId::new(0)), &mesh).unwrap();
        mesh.num_elements = 0;
        assert!(session.finalize(&mut mesh).unwrap_err().is_stale_target());
        assert!(mesh.calls.is_empty());
    }
}
