//! Benchmarks for input dispatch and picking.

use std::hint::black_box;
use std::num::NonZeroU32;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion};
use micromesh_control::prelude::*;
use nalgebra::{Point2, Point3, Vector3};

/// Flat grid of `n x n` quads in the z = 0 plane, centered on the origin.
fn create_grid(n: usize) -> PickGeometry {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    let mut triangles = Vec::with_capacity(n * n * 2);
    let half = n as f32 / 2.0;

    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(i as f32 - half, j as f32 - half, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }

    PickGeometry::from_triangles(positions, triangles).unwrap()
}

/// Accepts every edit and discards it.
struct NullScene;

impl MeshEditOps for NullScene {
    fn vertex_position(&self, _id: ElementId) -> Result<Point3<f32>> {
        Ok(Point3::origin())
    }
    fn split_vertex(&mut self, _id: ElementId) -> Result<()> {
        Ok(())
    }
    fn split_edge(&mut self, _id: ElementId) -> Result<()> {
        Ok(())
    }
    fn flip_edge(&mut self, _id: ElementId) -> Result<()> {
        Ok(())
    }
    fn tweak_subdivision(&mut self, _id: ElementId, _delta: i32) -> Result<()> {
        Ok(())
    }
    fn commit_offset(&mut self, _id: ElementId, _offset: Vector3<f32>) -> Result<()> {
        Ok(())
    }
    fn select_vertex(&mut self, _id: ElementId) -> Result<()> {
        Ok(())
    }
    fn orient_toward(&mut self, _id: ElementId, _eye: Point3<f32>) -> Result<()> {
        Ok(())
    }
}

impl RendererHooks for NullScene {
    fn mark_dirty(&mut self) {}
    fn resize_offscreen(&mut self, _width: u32, _height: u32) {}
    fn request_screenshot(&mut self) {}
}

impl LodService for NullScene {
    fn is_active(&self) -> bool {
        false
    }
    fn select_rank(&mut self, _rank: NonZeroU32) -> Result<()> {
        Err(InteractError::LodInactive)
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, create_grid(8));
    let mut mesh = NullScene;
    let mut renderer = NullScene;
    let mut lod = NullScene;

    c.bench_function("drag_1000_moves", |b| {
        b.iter(|| {
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
            controller.on_cursor_move(&mut ctx, 0.0, 0.0);
            controller.on_mouse_button(
                &mut ctx,
                MouseButton::Left,
                ButtonAction::Press,
                Modifiers::NONE,
                Instant::now(),
            );
            for i in 0..1000 {
                controller.on_cursor_move(&mut ctx, f64::from(i), f64::from(i / 2));
            }
            black_box(controller.camera().eye_position())
        });
    });
}

fn bench_picking(c: &mut Criterion) {
    let picker = MeshPicker::new().with_layer(RenderLayer::BaseMesh, create_grid(64));
    let mut camera = OrbitCamera::default();
    camera.reset(Point3::origin(), 80.0);
    let viewport = Viewport::default();

    c.bench_function("pick_vertex_grid_64x64", |b| {
        let query = PickQuery {
            cursor: Point2::new(500.0, 400.0),
            layer: RenderLayer::BaseMesh,
            camera: &camera,
            viewport,
        };
        b.iter(|| black_box(picker.pick(&query, PickTarget::Vertex)));
    });

    c.bench_function("surface_point_grid_64x64", |b| {
        let query = PickQuery {
            cursor: Point2::new(500.0, 400.0),
            layer: RenderLayer::BaseMesh,
            camera: &camera,
            viewport,
        };
        b.iter(|| black_box(picker.surface_point(&query)));
    });
}

criterion_group!(benches, bench_dispatch, bench_picking);
criterion_main!(benches);
