//! Cursor picking.
//!
//! The controller only consumes the [`PickingService`] contract: "what element
//! of this class lies under the cursor on this layer?". [`MeshPicker`] is a
//! reference implementation that casts a camera ray against triangle soup and
//! snaps the hit to the nearest vertex or edge of the hit triangle.
//!
//! ```
//! use micromesh_control::camera::{OrbitCamera, Viewport};
//! use micromesh_control::picking::{MeshPicker, PickGeometry, PickQuery, PickTarget, PickingService};
//! use micromesh_control::scene::RenderLayer;
//! use nalgebra::{Point2, Point3};
//!
//! let geometry = PickGeometry::from_triangles(
//!     vec![
//!         Point3::new(-1.0, -1.0, 0.0),
//!         Point3::new(1.0, -1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! )
//! .unwrap();
//! let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, geometry);
//!
//! let camera = OrbitCamera::default();
//! let viewport = Viewport::default();
//! let query = PickQuery {
//!     cursor: Point2::new(512.0, 384.0),
//!     layer: RenderLayer::BaseMesh,
//!     camera: &camera,
//!     viewport,
//! };
//! assert!(picker.pick(&query, PickTarget::Face).face().is_some());
//! ```

use std::collections::HashMap;
use std::fmt;

use nalgebra::{Point2, Point3, Vector3};

use crate::camera::{OrbitCamera, Viewport};
use crate::error::{InteractError, Result};
use crate::scene::RenderLayer;

/// Opaque handle to a mesh element (vertex, edge, or face).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ElementId(u32);

impl ElementId {
    /// Create a handle from a raw index.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "element index {} too large", index);
        Self(index as u32)
    }

    /// The raw index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for ElementId {
    fn from(v: usize) -> Self {
        Self::new(v)
    }
}

/// Element class a command wants under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// Nearest vertex.
    Vertex,
    /// Nearest edge.
    Edge,
    /// Face under the cursor.
    Face,
}

/// Outcome of a pick. Recomputed per query, never stored past the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickResult {
    /// Nothing under the cursor.
    #[default]
    None,
    /// A vertex.
    Vertex(ElementId),
    /// An edge.
    Edge(ElementId),
    /// A face.
    Face(ElementId),
}

impl PickResult {
    /// The picked vertex, if any.
    pub fn vertex(self) -> Option<ElementId> {
        match self {
            PickResult::Vertex(id) => Some(id),
            _ => None,
        }
    }

    /// The picked edge, if any.
    pub fn edge(self) -> Option<ElementId> {
        match self {
            PickResult::Edge(id) => Some(id),
            _ => None,
        }
    }

    /// The picked face, if any.
    pub fn face(self) -> Option<ElementId> {
        match self {
            PickResult::Face(id) => Some(id),
            _ => None,
        }
    }

    /// The element id if this result is of the requested class.
    pub fn matching(self, target: PickTarget) -> Option<ElementId> {
        match target {
            PickTarget::Vertex => self.vertex(),
            PickTarget::Edge => self.edge(),
            PickTarget::Face => self.face(),
        }
    }

    /// True when nothing was hit.
    pub fn is_none(self) -> bool {
        self == PickResult::None
    }
}

/// Everything a picker needs to resolve the cursor.
#[derive(Debug, Clone, Copy)]
pub struct PickQuery<'a> {
    /// Cursor position in framebuffer pixels, origin top-left.
    pub cursor: Point2<f32>,
    /// Layer being displayed.
    pub layer: RenderLayer,
    /// Current camera.
    pub camera: &'a OrbitCamera,
    /// Current framebuffer size.
    pub viewport: Viewport,
}

/// Resolves mesh elements under a screen-space cursor.
pub trait PickingService {
    /// Element of the requested class nearest the cursor on `query.layer`.
    fn pick(&self, query: &PickQuery<'_>, target: PickTarget) -> PickResult;

    /// The surface point under the cursor, if the cursor is over the mesh.
    fn surface_point(&self, query: &PickQuery<'_>) -> Option<Point3<f32>>;
}

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3<f32>,
    /// Unit direction.
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a ray, normalizing the direction.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        let direction = direction
            .try_normalize(1e-10)
            .unwrap_or_else(|| -Vector3::z());
        Self { origin, direction }
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Möller-Trumbore ray-triangle intersection.
/// Returns the distance along the ray if hit.
pub fn ray_triangle_intersect(
    ray: &Ray,
    v0: &Point3<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    // Parallel to the triangle plane
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > EPSILON).then_some(t)
}

/// Distance from `p` to the segment `[a, b]`.
fn point_segment_distance(p: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>) -> f32 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-20 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Triangle geometry for one render layer.
#[derive(Debug, Clone, Default)]
pub struct PickGeometry {
    positions: Vec<Point3<f32>>,
    triangles: Vec<[usize; 3]>,
    /// Edge ids of each triangle's `(0,1)`, `(1,2)`, `(2,0)` sides.
    triangle_edges: Vec<[usize; 3]>,
    /// Endpoints of each edge, lower index first.
    edges: Vec<[usize; 2]>,
}

/// The closest triangle along a ray.
#[derive(Debug, Clone, Copy)]
struct TriangleHit {
    triangle: usize,
    point: Point3<f32>,
}

impl PickGeometry {
    /// Build from positions and triangle indices.
    ///
    /// Edge ids are assigned in first-seen order while walking the triangles.
    pub fn from_triangles(positions: Vec<Point3<f32>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        let mut edge_ids: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges = Vec::new();
        let mut triangle_edges = Vec::with_capacity(triangles.len());

        for (face, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&v| v >= positions.len()) {
                return Err(InteractError::invalid_param(
                    "triangles",
                    format!("face {face} vertex {bad}"),
                    "vertex index out of range",
                ));
            }
            let mut ids = [0; 3];
            for (k, id) in ids.iter_mut().enumerate() {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                let key = (a.min(b), a.max(b));
                *id = *edge_ids.entry(key).or_insert_with(|| {
                    edges.push([key.0, key.1]);
                    edges.len() - 1
                });
            }
            triangle_edges.push(ids);
        }

        Ok(Self {
            edges,
            positions,
            triangles,
            triangle_edges,
        })
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of unique edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of triangles.
    pub fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    /// Triangle vertex indices.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Endpoints of an edge, lower vertex index first.
    pub fn edge(&self, edge: usize) -> Option<[usize; 2]> {
        self.edges.get(edge).copied()
    }

    /// Update one vertex position in place.
    pub fn set_position(&mut self, vertex: usize, position: Point3<f32>) {
        if let Some(p) = self.positions.get_mut(vertex) {
            *p = position;
        }
    }

    fn cast(&self, ray: &Ray) -> Option<TriangleHit> {
        let mut best: Option<(usize, f32)> = None;
        for (i, tri) in self.triangles.iter().enumerate() {
            let [a, b, c] = tri.map(|v| &self.positions[v]);
            if let Some(t) = ray_triangle_intersect(ray, a, b, c) {
                if best.is_none_or(|(_, d)| t < d) {
                    best = Some((i, t));
                }
            }
        }
        best.map(|(triangle, t)| TriangleHit {
            triangle,
            point: ray.at(t),
        })
    }

    fn nearest_vertex(&self, hit: &TriangleHit) -> usize {
        let tri = self.triangles[hit.triangle];
        let mut best = tri[0];
        let mut best_dist = f32::INFINITY;
        for v in tri {
            let d = (self.positions[v] - hit.point).norm_squared();
            if d < best_dist {
                best = v;
                best_dist = d;
            }
        }
        best
    }

    fn nearest_edge(&self, hit: &TriangleHit) -> usize {
        let tri = self.triangles[hit.triangle];
        let edges = self.triangle_edges[hit.triangle];
        let mut best = edges[0];
        let mut best_dist = f32::INFINITY;
        for k in 0..3 {
            let a = &self.positions[tri[k]];
            let b = &self.positions[tri[(k + 1) % 3]];
            let d = point_segment_distance(&hit.point, a, b);
            if d < best_dist {
                best = edges[k];
                best_dist = d;
            }
        }
        best
    }
}

/// Ray-casting picker with independent geometry per render layer.
#[derive(Debug, Clone, Default)]
pub struct MeshPicker {
    layers: [Option<PickGeometry>; 2],
}

impl MeshPicker {
    /// Create a picker with no geometry on any layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach geometry to a layer (builder form).
    pub fn with_layer(mut self, layer: RenderLayer, geometry: PickGeometry) -> Self {
        self.set_layer(layer, geometry);
        self
    }

    /// Replace the geometry of a layer.
    pub fn set_layer(&mut self, layer: RenderLayer, geometry: PickGeometry) {
        self.layers[layer.index()] = Some(geometry);
    }

    /// Geometry attached to a layer.
    pub fn geometry(&self, layer: RenderLayer) -> Option<&PickGeometry> {
        self.layers[layer.index()].as_ref()
    }

    /// Mutable geometry attached to a layer.
    pub fn geometry_mut(&mut self, layer: RenderLayer) -> Option<&mut PickGeometry> {
        self.layers[layer.index()].as_mut()
    }

    fn hit(&self, query: &PickQuery<'_>) -> Option<(&PickGeometry, TriangleHit)> {
        let geometry = self.geometry(query.layer)?;
        let ray = query.camera.screen_ray(query.cursor, query.viewport);
        geometry.cast(&ray).map(|hit| (geometry, hit))
    }
}

impl PickingService for MeshPicker {
    fn pick(&self, query: &PickQuery<'_>, target: PickTarget) -> PickResult {
        let Some((geometry, hit)) = self.hit(query) else {
            return PickResult::None;
        };
        match target {
            PickTarget::Vertex => PickResult::Vertex(geometry.nearest_vertex(&hit).into()),
            PickTarget::Edge => PickResult::Edge(geometry.nearest_edge(&hit).into()),
            PickTarget::Face => PickResult::Face(hit.triangle.into()),
        }
    }

    fn surface_point(&self, query: &PickQuery<'_>) -> Option<Point3<f32>> {
        self.hit(query).map(|(_, hit)| hit.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit quad in the z = 0 plane, split along its diagonal.
    fn create_quad() -> PickGeometry {
        let positions = vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        PickGeometry::from_triangles(positions, vec![[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    /// Camera looking straight down -z at the origin.
    fn front_camera() -> OrbitCamera {
        let mut camera = OrbitCamera::default();
        camera.reset(Point3::origin(), 3.0);
        // reset leaves a slight elevation; level it out
        let e = camera.elevation();
        camera.update_polar_angles(0.0, -e / camera.options().rotate_sensitivity);
        camera
    }

    fn query<'a>(camera: &'a OrbitCamera, x: f32, y: f32, layer: RenderLayer) -> PickQuery<'a> {
        let viewport = Viewport::default();
        PickQuery {
            cursor: Point2::new(x, y),
            layer,
            camera,
            viewport,
        }
    }

    fn screen_of(camera: &OrbitCamera, p: Point3<f32>) -> Point2<f32> {
        camera.project(&p, Viewport::default()).unwrap()
    }

    #[test]
    fn test_edge_ids_are_shared() {
        let quad = create_quad();
        assert_eq!(quad.num_vertices(), 4);
        assert_eq!(quad.num_faces(), 2);
        // 4 boundary edges + 1 diagonal
        assert_eq!(quad.num_edges(), 5);
        assert_eq!(quad.edge(0), Some([0, 1]));
        // (2,0) closes the first triangle and is the shared diagonal
        assert_eq!(quad.edge(2), Some([0, 2]));
        assert_eq!(quad.edge(5), None);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let result = PickGeometry::from_triangles(vec![Point3::origin(); 2], vec![[0, 1, 2]]);
        assert!(matches!(result, Err(InteractError::InvalidParameter { .. })));
    }

    #[test]
    fn test_ray_triangle_hit_and_miss() {
        let a = Point3::new(-1.0, -1.0, 0.0);
        let b = Point3::new(1.0, -1.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -2.0));
        let t = ray_triangle_intersect(&ray, &a, &b, &c).unwrap();
        assert!((t - 5.0).abs() < 1e-5);

        let miss = Ray::new(Point3::new(3.0, 0.0, 5.0), -Vector3::z());
        assert!(ray_triangle_intersect(&miss, &a, &b, &c).is_none());

        let away = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::z());
        assert!(ray_triangle_intersect(&away, &a, &b, &c).is_none());
    }

    #[test]
    fn test_pick_vertex_near_corner() {
        let camera = front_camera();
        let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, create_quad());

        let s = screen_of(&camera, Point3::new(0.9, 0.85, 0.0));
        let result = picker.pick(&query(&camera, s.x, s.y, RenderLayer::BaseMesh), PickTarget::Vertex);
        assert_eq!(result, PickResult::Vertex(ElementId::new(2)));
    }

    #[test]
    fn test_pick_edge_near_side() {
        let camera = front_camera();
        let quad = create_quad();
        let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, quad);

        // Just inside the bottom side (0 -> 1), which is edge 0
        let s = screen_of(&camera, Point3::new(0.2, -0.95, 0.0));
        let result = picker.pick(&query(&camera, s.x, s.y, RenderLayer::BaseMesh), PickTarget::Edge);
        assert_eq!(result, PickResult::Edge(ElementId::new(0)));
    }

    #[test]
    fn test_pick_face_and_surface_point() {
        let camera = front_camera();
        let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, create_quad());

        // Upper-left half belongs to triangle 1
        let s = screen_of(&camera, Point3::new(-0.5, 0.5, 0.0));
        let q = query(&camera, s.x, s.y, RenderLayer::BaseMesh);
        assert_eq!(picker.pick(&q, PickTarget::Face), PickResult::Face(ElementId::new(1)));

        let p = picker.surface_point(&q).unwrap();
        assert!((p - Point3::new(-0.5, 0.5, 0.0)).norm() < 1e-3);
    }

    #[test]
    fn test_pick_misses_off_mesh() {
        let camera = front_camera();
        let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, create_quad());
        let q = query(&camera, 2.0, 2.0, RenderLayer::BaseMesh);
        assert!(picker.pick(&q, PickTarget::Vertex).is_none());
        assert!(picker.surface_point(&q).is_none());
    }

    #[test]
    fn test_layer_without_geometry_picks_nothing() {
        let camera = front_camera();
        let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, create_quad());
        let q = query(&camera, 512.0, 384.0, RenderLayer::MicroMesh);
        assert!(picker.pick(&q, PickTarget::Face).is_none());
    }

    #[test]
    fn test_matching_filters_kind() {
        let r = PickResult::Edge(ElementId::new(3));
        assert_eq!(r.matching(PickTarget::Edge), Some(ElementId::new(3)));
        assert_eq!(r.matching(PickTarget::Vertex), None);
        assert_eq!(PickResult::None.matching(PickTarget::Face), None);
    }
}
