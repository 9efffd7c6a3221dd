//! Integration test: beam samples carve the seated sheet.
//!
//! A sheet is seated on the bed the same way the simulator seats it; cutting
//! a preset removes mask cells along the outline only and carves the mesh
//! without leaving dangling indices.

use std::f64::consts::FRAC_PI_2;

use cutter_common::machine::{CutterConfig, MaterialConfig};
use cutter_control::carving::{CarveOutcome, carve};
use cutter_control::cutter::LaserCutter;
use cutter_control::mask::{CutMask, SurfaceMapper};
use cutter_control::material::{BodyKind, CutTarget, CuttableMaterial};
use cutter_control::mesh::SurfaceMesh;
use nalgebra::{Isometry3, Point2, Point3, Translation3, UnitQuaternion, Vector3};

// ── Helpers ─────────────────────────────────────────────────────────

/// 100 mm sheet with a 2 mm beam.
fn small_sheet_config() -> MaterialConfig {
    MaterialConfig {
        surface_size: [0.1, 0.1],
        cut_radius: 0.02,
        ..MaterialConfig::default()
    }
}

fn cut_shape(shape: &str, material: MaterialConfig) -> LaserCutter {
    cut_shape_on(Isometry3::identity(), shape, material)
}

fn cut_shape_on(bed: Isometry3<f64>, shape: &str, material: MaterialConfig) -> LaserCutter {
    let mut cutter = LaserCutter::from_config(&CutterConfig::default())
        .unwrap()
        .with_bed_frame(bed);
    cutter.set_power(true);
    let seat = cutter.work_area().seat_frame([75.0, 75.0]);
    cutter.place_material(CuttableMaterial::plate("sheet", seat, &material, 40));
    assert!(cutter.start_shape(shape).is_started());
    cutter.run_until_idle(1.0 / 60.0, 100_000).unwrap();
    cutter
}

fn assert_consistent(mesh: &SurfaceMesh) {
    let n = mesh.vertex_count() as u32;
    assert!(mesh.triangles().iter().flatten().all(|&i| i < n));
    assert_eq!(mesh.normals().len(), mesh.vertex_count());
    assert_eq!(mesh.uvs().len(), mesh.vertex_count());
    assert_eq!(mesh.tangents().len(), mesh.vertex_count());
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn square_cuts_outline_only() {
    let cutter = cut_shape("Square", small_sheet_config());
    let sheet = cutter.material().unwrap();
    let mask = sheet.mask().unwrap();

    // Square corners (50,50) and (100,100) mm map to uv 0.25 and 0.75.
    for uv in [[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75], [0.5, 0.25]] {
        assert!(mask.is_removed_uv(Point2::new(uv[0], uv[1])), "{uv:?} not cut");
    }
    assert!(!mask.is_removed_uv(Point2::new(0.5, 0.5)));
    assert!(!mask.is_removed_uv(Point2::new(0.05, 0.95)));

    let mesh = sheet.mesh();
    assert!(mesh.vertex_count() < 41 * 41);
    assert!(mesh.vertex_count() > 0);
    assert_consistent(mesh);
}

#[test]
fn moved_bed_cuts_the_same_outline() {
    let bed = Isometry3::from_parts(
        Translation3::new(2.0, 0.8, -1.5),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
    );
    let at_origin = cut_shape("Square", small_sheet_config());
    let moved = cut_shape_on(bed, "Square", small_sheet_config());

    let expected: Vec<_> = at_origin.material().unwrap().mask().unwrap().removed_cells().collect();
    let actual: Vec<_> = moved.material().unwrap().mask().unwrap().removed_cells().collect();
    assert_eq!(actual, expected);
    assert_eq!(
        moved.material().unwrap().mesh().vertex_count(),
        at_origin.material().unwrap().mesh().vertex_count()
    );
}

#[test]
fn first_carve_promotes_sheet() {
    let cutter = cut_shape("Triangle", small_sheet_config());
    let sheet = cutter.material().unwrap();
    assert_eq!(sheet.body(), BodyKind::Dynamic { mass_kg: 0.1 });
    assert!(sheet.is_grabbable());
    assert!(sheet.collider_revision() >= 1);
    assert_eq!(cutter.stats().promotions, 1);
}

#[test]
fn sheet_stays_static_without_physics() {
    let cutter = cut_shape(
        "Triangle",
        MaterialConfig {
            physics_after_cut: false,
            ..small_sheet_config()
        },
    );
    let sheet = cutter.material().unwrap();
    assert_eq!(sheet.body(), BodyKind::Static);
    assert!(sheet.carve_count() > 0);
}

#[test]
fn rebuilds_only_when_mask_changes() {
    let cutter = cut_shape("Square", small_sheet_config());
    let stats = cutter.stats();
    assert!(stats.samples > 0);
    assert!(stats.mask_changes <= stats.samples);
    assert_eq!(stats.rebuilds, stats.mask_changes);
    assert_eq!(
        cutter.material().unwrap().carve_count(),
        stats.rebuilds
    );
}

#[test]
fn same_disc_twice_is_idempotent() {
    let mut sheet = CuttableMaterial::plate(
        "sheet",
        Isometry3::identity(),
        &MaterialConfig::default(),
        32,
    );
    let first = sheet.cut_at(&Point3::new(0.1, -0.2, 0.0));
    let removed = sheet.mask().unwrap().removed_count();
    let vertices = sheet.mesh().vertex_count();

    let second = sheet.cut_at(&Point3::new(0.1, -0.2, 0.0));
    assert!(first.mask_changed);
    assert!(!second.mask_changed);
    assert!(second.carve.is_none());
    assert_eq!(sheet.mask().unwrap().removed_count(), removed);
    assert_eq!(sheet.mesh().vertex_count(), vertices);
}

#[test]
fn later_paints_never_restore_cells() {
    let mut mask = CutMask::new(64);
    mask.paint_disc(Point2::new(0.2, 0.2), 0.1);
    let first: Vec<_> = mask.removed_cells().collect();
    for uv in [[0.8, 0.8], [0.2, 0.8], [0.21, 0.19]] {
        mask.paint_disc(Point2::new(uv[0], uv[1]), 0.05);
        for &(x, y) in &first {
            assert!(mask.is_removed(x, y));
        }
    }
}

#[test]
fn isolated_triangle_outside_cut_survives() {
    // Strip of 4 quads plus a separate triangle in the far corner.
    let mut positions = Vec::new();
    for i in 0..5 {
        let x = -0.4 + 0.1 * i as f64;
        positions.push(Point3::new(x, -0.05, 0.0));
        positions.push(Point3::new(x, 0.05, 0.0));
    }
    positions.extend([
        Point3::new(0.40, 0.40, 0.0),
        Point3::new(0.45, 0.40, 0.0),
        Point3::new(0.40, 0.45, 0.0),
    ]);
    let mut triangles = Vec::new();
    for q in 0..4u32 {
        let a = q * 2;
        triangles.push([a, a + 2, a + 3]);
        triangles.push([a, a + 3, a + 1]);
    }
    triangles.push([10, 11, 12]);
    let uvs = positions
        .iter()
        .map(|p| Point2::new(p.x + 0.5, p.y + 0.5))
        .collect();
    let normals = vec![Vector3::z(); positions.len()];
    let mut mesh = SurfaceMesh::new(positions, normals, uvs, triangles).unwrap();

    let mut mask = CutMask::new(256);
    mask.paint_disc(Point2::new(0.3, 0.5), 0.1);
    let mapper = SurfaceMapper::unit(Isometry3::identity());

    let CarveOutcome::Rebuilt(stats) = carve(&mut mesh, &mask, &mapper) else {
        panic!("expected rebuild");
    };
    assert!(stats.removed_vertices > 0);
    assert_consistent(&mesh);

    let island = mesh.triangles().last().copied().unwrap();
    let corners: Vec<_> = island.iter().map(|&i| mesh.positions()[i as usize]).collect();
    assert_eq!(
        corners,
        [
            Point3::new(0.40, 0.40, 0.0),
            Point3::new(0.45, 0.40, 0.0),
            Point3::new(0.40, 0.45, 0.0)
        ]
    );
}
