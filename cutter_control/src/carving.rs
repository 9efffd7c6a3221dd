//! Mesh carving: drop every vertex whose surface cell is removed, drop every
//! triangle touching a dropped vertex, and compact the survivors.
//!
//! Survivor order is preserved and indices are remapped densely, so the
//! rebuilt mesh never references a vertex that no longer exists.

use tracing::debug;

use crate::mask::{CutMask, SurfaceMapper};
use crate::mesh::SurfaceMesh;

/// Counts from one rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarveStats {
    pub kept_vertices: usize,
    pub removed_vertices: usize,
    pub kept_triangles: usize,
    pub dropped_triangles: usize,
}

impl CarveStats {
    /// The rebuild removed the last vertex.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.kept_vertices == 0
    }

    /// Anything was removed.
    #[inline]
    pub fn changed(&self) -> bool {
        self.removed_vertices > 0 || self.dropped_triangles > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarveOutcome {
    /// Mesh was already empty; nothing touched.
    Skipped,
    Rebuilt(CarveStats),
}

/// Rebuild `mesh` against `mask`.
///
/// A vertex survives when the cell under its local position (mapped through
/// `mapper`) is not removed. A triangle survives only when all three of its
/// vertices survive.
pub fn carve(mesh: &mut SurfaceMesh, mask: &CutMask, mapper: &SurfaceMapper) -> CarveOutcome {
    if mesh.is_empty() {
        return CarveOutcome::Skipped;
    }

    let vertex_count = mesh.vertex_count();
    let mut remap: Vec<Option<u32>> = Vec::with_capacity(vertex_count);
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for (i, position) in mesh.positions().iter().enumerate() {
        let uv = mapper.local_to_surface_uv(position);
        if mask.is_removed_uv(uv) {
            remap.push(None);
            continue;
        }
        remap.push(Some(positions.len() as u32));
        positions.push(*position);
        normals.push(mesh.normals()[i]);
        uvs.push(mesh.uvs()[i]);
    }

    let triangles: Vec<[u32; 3]> = mesh
        .triangles()
        .iter()
        .filter_map(|tri| {
            Some([
                remap[tri[0] as usize]?,
                remap[tri[1] as usize]?,
                remap[tri[2] as usize]?,
            ])
        })
        .collect();

    let stats = CarveStats {
        kept_vertices: positions.len(),
        removed_vertices: vertex_count - positions.len(),
        kept_triangles: triangles.len(),
        dropped_triangles: mesh.triangle_count() - triangles.len(),
    };

    mesh.replace_buffers(positions, normals, uvs, triangles);

    debug!(
        kept_vertices = stats.kept_vertices,
        removed_vertices = stats.removed_vertices,
        kept_triangles = stats.kept_triangles,
        dropped_triangles = stats.dropped_triangles,
        "mesh carved"
    );
    CarveOutcome::Rebuilt(stats)
}

// ─── Tests ──────────────────────────────────────────────────────────
