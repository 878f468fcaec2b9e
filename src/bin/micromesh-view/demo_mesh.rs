//! In-memory mesh the viewer edits.
//!
//! Stands in for a loaded base mesh: triangle soup plus per-face subdivision
//! levels and per-vertex displacement directions. Topology edits rebuild the
//! pick geometry, and [`DemoMesh::revision`] tells the viewer when to resync
//! its picker.

use std::num::NonZeroU32;

use nalgebra::{Point3, Vector3};

use micromesh_control::error::{InteractError, Result};
use micromesh_control::picking::{ElementId, PickGeometry};
use micromesh_control::scene::{LodService, MeshEditOps};

/// Highest subdivision level a face may reach.
const MAX_SUBDIVISION_LEVEL: u8 = 5;

/// Editable triangle mesh.
#[derive(Debug, Clone)]
pub struct DemoMesh {
    geometry: PickGeometry,
    levels: Vec<u8>,
    directions: Vec<Vector3<f32>>,
    selected: Option<usize>,
    revision: u64,
}

impl DemoMesh {
    /// Unit octahedron centered at the origin.
    pub fn octahedron() -> Result<Self> {
        let positions = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let triangles = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        let directions = positions.iter().map(|p| p.coords.normalize()).collect();
        let levels = vec![0; triangles.len()];
        Ok(Self {
            geometry: PickGeometry::from_triangles(positions, triangles)?,
            levels,
            directions,
            selected: None,
            revision: 0,
        })
    }

    /// Geometry for picking.
    pub fn geometry(&self) -> &PickGeometry {
        &self.geometry
    }

    /// Bumped on every change to positions or topology.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Currently selected vertex.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Bounding sphere (center, radius) for framing.
    pub fn bounds(&self) -> (Point3<f32>, f32) {
        let positions = self.geometry.positions();
        if positions.is_empty() {
            return (Point3::origin(), 1.0);
        }
        let sum = positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let center = Point3::from(sum / positions.len() as f32);
        let radius = positions
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0_f32, f32::max);
        (center, radius.max(1e-3))
    }

    fn vertex(&self, id: ElementId) -> Result<usize> {
        let v = id.index();
        if v < self.geometry.num_vertices() {
            Ok(v)
        } else {
            Err(InteractError::InvalidTarget(id))
        }
    }

    fn face(&self, id: ElementId) -> Result<usize> {
        let f = id.index();
        if f < self.geometry.num_faces() {
            Ok(f)
        } else {
            Err(InteractError::InvalidTarget(id))
        }
    }

    /// Faces containing edge `a-b`, each with the corner index where the
    /// directed side `tri[k] -> tri[k+1]` runs along the edge.
    fn edge_faces(&self, a: usize, b: usize) -> Vec<(usize, usize)> {
        self.geometry
            .triangles()
            .iter()
            .enumerate()
            .filter_map(|(f, tri)| {
                (0..3)
                    .find(|&k| {
                        let (p, q) = (tri[k], tri[(k + 1) % 3]);
                        (p == a && q == b) || (p == b && q == a)
                    })
                    .map(|k| (f, k))
            })
            .collect()
    }

    fn rebuild(&mut self, positions: Vec<Point3<f32>>, triangles: Vec<[usize; 3]>) -> Result<()> {
        self.geometry = PickGeometry::from_triangles(positions, triangles)?;
        self.levels.resize(self.geometry.num_faces(), 0);
        self.revision += 1;
        Ok(())
    }

    fn push_vertex(
        positions: &mut Vec<Point3<f32>>,
        directions: &mut Vec<Vector3<f32>>,
        position: Point3<f32>,
        direction: Vector3<f32>,
    ) -> usize {
        positions.push(position);
        directions.push(direction);
        positions.len() - 1
    }
}

impl MeshEditOps for DemoMesh {
    fn vertex_position(&self, id: ElementId) -> Result<Point3<f32>> {
        let v = self.vertex(id)?;
        Ok(self.geometry.positions()[v])
    }

    /// Peels a new vertex off toward the centroid of the first face around
    /// the vertex and fans that face around it.
    fn split_vertex(&mut self, id: ElementId) -> Result<()> {
        let v = self.vertex(id)?;
        let mut triangles = self.geometry.triangles().to_vec();
        let Some((f, k)) = triangles
            .iter()
            .enumerate()
            .find_map(|(f, tri)| tri.iter().position(|&x| x == v).map(|k| (f, k)))
        else {
            return Err(InteractError::DegenerateGeometry {
                what: "isolated vertex",
            });
        };

        let mut positions = self.geometry.positions().to_vec();
        let tri = triangles[f];
        let centroid = Point3::from(
            (positions[tri[0]].coords + positions[tri[1]].coords + positions[tri[2]].coords) / 3.0,
        );
        let moved = positions[v] + (centroid - positions[v]) / 3.0;
        let direction = self.directions[v];
        let w = Self::push_vertex(&mut positions, &mut self.directions, moved, direction);

        let (a, b) = (tri[(k + 1) % 3], tri[(k + 2) % 3]);
        triangles[f] = [w, a, b];
        triangles.push([v, a, w]);
        triangles.push([v, w, b]);
        log::info!("split vertex {v} -> {w}");
        self.rebuild(positions, triangles)
    }

    fn split_edge(&mut self, id: ElementId) -> Result<()> {
        let [a, b] = self
            .geometry
            .edge(id.index())
            .ok_or(InteractError::InvalidTarget(id))?;
        let faces = self.edge_faces(a, b);

        let mut positions = self.geometry.positions().to_vec();
        let mid = Point3::from((positions[a].coords + positions[b].coords) / 2.0);
        let direction = (self.directions[a] + self.directions[b])
            .try_normalize(1e-6)
            .unwrap_or(self.directions[a]);
        let m = Self::push_vertex(&mut positions, &mut self.directions, mid, direction);

        let mut triangles = self.geometry.triangles().to_vec();
        for (f, k) in faces {
            let tri = triangles[f];
            let (p, q, r) = (tri[k], tri[(k + 1) % 3], tri[(k + 2) % 3]);
            triangles[f] = [p, m, r];
            triangles.push([m, q, r]);
            let level = self.levels[f];
            self.levels.push(level);
        }
        log::info!("split edge {a}-{b} at new vertex {m}");
        self.rebuild(positions, triangles)
    }

    fn flip_edge(&mut self, id: ElementId) -> Result<()> {
        let [a, b] = self
            .geometry
            .edge(id.index())
            .ok_or(InteractError::InvalidTarget(id))?;
        let &[(f1, k1), (f2, k2)] = self.edge_faces(a, b).as_slice() else {
            return Err(InteractError::DegenerateGeometry {
                what: "edge is not shared by exactly two faces",
            });
        };

        let mut triangles = self.geometry.triangles().to_vec();
        let (t1, t2) = (triangles[f1], triangles[f2]);
        let (p, q, r) = (t1[k1], t1[(k1 + 1) % 3], t1[(k1 + 2) % 3]);
        let s = t2[(k2 + 2) % 3];
        if r == s || !self.edge_faces(r, s).is_empty() {
            return Err(InteractError::DegenerateGeometry {
                what: "flip would duplicate an edge",
            });
        }

        triangles[f1] = [r, p, s];
        triangles[f2] = [s, q, r];
        log::info!("flipped edge {a}-{b} to {r}-{s}");
        self.rebuild(self.geometry.positions().to_vec(), triangles)
    }

    fn tweak_subdivision(&mut self, id: ElementId, delta: i32) -> Result<()> {
        let f = self.face(id)?;
        let level = (i32::from(self.levels[f]) + delta).clamp(0, i32::from(MAX_SUBDIVISION_LEVEL));
        self.levels[f] = level as u8;
        log::info!("face {f}: subdivision level {level}");
        self.revision += 1;
        Ok(())
    }

    fn commit_offset(&mut self, id: ElementId, offset: Vector3<f32>) -> Result<()> {
        let v = self.vertex(id)?;
        let moved = self.geometry.positions()[v] + offset;
        self.geometry.set_position(v, moved);
        self.revision += 1;
        Ok(())
    }

    fn select_vertex(&mut self, id: ElementId) -> Result<()> {
        self.selected = Some(self.vertex(id)?);
        Ok(())
    }

    fn orient_toward(&mut self, id: ElementId, eye: Point3<f32>) -> Result<()> {
        let v = self.vertex(id)?;
        let direction = (eye - self.geometry.positions()[v])
            .try_normalize(1e-6)
            .ok_or(InteractError::DegenerateGeometry {
                what: "eye coincides with vertex",
            })?;
        self.directions[v] = direction;
        self.revision += 1;
        Ok(())
    }
}

/// Fixed number of precomputed quality levels, selectable by rank.
#[derive(Debug, Clone, Default)]
pub struct RankedLod {
    ranks: u32,
    current: Option<NonZeroU32>,
}

impl RankedLod {
    /// `ranks == 0` leaves the mode inactive.
    pub fn new(ranks: u32) -> Self {
        Self {
            ranks,
            current: None,
        }
    }

    /// Last selected rank.
    pub fn current(&self) -> Option<NonZeroU32> {
        self.current
    }
}

impl LodService for RankedLod {
    fn is_active(&self) -> bool {
        self.ranks > 0
    }

    fn select_rank(&mut self, rank: NonZeroU32) -> Result<()> {
        if !self.is_active() {
            return Err(InteractError::LodInactive);
        }
        if rank.get() > self.ranks {
            return Err(InteractError::invalid_param(
                "rank",
                rank,
                "exceeds the number of ranks",
            ));
        }
        self.current = Some(rank);
        Ok(())
    }
}
