//! Triangle mesh of a cuttable sheet in local object space.
//!
//! Holds positions, normals, UVs, triangle index triples, and the derived
//! bounding box and tangents. Buffers are validated on construction; the
//! carving engine replaces them wholesale and re-derives bounds/tangents.

use nalgebra::{Point2, Point3, Vector3, Vector4};
use thiserror::Error;

/// Upper bound on [`SurfaceMesh::plate`] subdivisions per side.
pub const MAX_PLATE_SUBDIVISIONS: u32 = 1024;

/// Malformed mesh buffers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("{attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
}

// ─── Bounds ─────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Inverted box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn include_point(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Tight box around `points`, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut aabb = Self::empty();
        let mut any = false;
        for p in points {
            aabb.include_point(p);
            any = true;
        }
        any.then_some(aabb)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }
}

// ─── Surface Mesh ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    positions: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
    uvs: Vec<Point2<f64>>,
    triangles: Vec<[u32; 3]>,
    /// xyz = tangent, w = bitangent handedness (±1).
    tangents: Vec<Vector4<f64>>,
    bounds: Option<Aabb>,
}

impl SurfaceMesh {
    /// Build a mesh from raw buffers.
    ///
    /// `normals` and `uvs` must have one entry per position and every index
    /// must reference an existing vertex.
    pub fn new(
        positions: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        uvs: Vec<Point2<f64>>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, MeshError> {
        let n = positions.len();
        if normals.len() != n {
            return Err(MeshError::AttributeLength {
                attribute: "normals",
                expected: n,
                actual: normals.len(),
            });
        }
        if uvs.len() != n {
            return Err(MeshError::AttributeLength {
                attribute: "uvs",
                expected: n,
                actual: uvs.len(),
            });
        }
        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= n) {
                return Err(MeshError::IndexOutOfRange {
                    triangle: t,
                    index,
                    vertex_count: n,
                });
            }
        }

        let mut mesh = Self::default();
        mesh.replace_buffers(positions, normals, uvs, triangles);
        Ok(mesh)
    }

    /// Subdivided plate of `size = [w, h]` centred on the origin in the XY
    /// plane, facing +Z, with UVs spanning `[0,1]²`.
    ///
    /// `subdivisions` is clamped to `1..=MAX_PLATE_SUBDIVISIONS`.
    pub fn plate(size: [f64; 2], subdivisions: u32) -> Self {
        let s = plate_subdivisions(subdivisions);
        let side = s + 1;
        let count = side * side;

        let mut positions = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);
        for j in 0..side {
            let v = j as f64 / s as f64;
            for i in 0..side {
                let u = i as f64 / s as f64;
                positions.push(Point3::new((u - 0.5) * size[0], (v - 0.5) * size[1], 0.0));
                normals.push(Vector3::z());
                uvs.push(Point2::new(u, v));
            }
        }

        // Vertex count fits u32 for any clamped subdivision count.
        let mut triangles = Vec::with_capacity(s * s * 2);
        for j in 0..s {
            for i in 0..s {
                let a = (j * side + i) as u32;
                let b = a + 1;
                let c = a + side as u32;
                let d = c + 1;
                triangles.push([a, b, d]);
                triangles.push([a, d, c]);
            }
        }

        let mut mesh = Self::default();
        mesh.replace_buffers(positions, normals, uvs, triangles);
        mesh
    }

    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    #[inline]
    pub fn uvs(&self) -> &[Point2<f64>] {
        &self.uvs
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn tangents(&self) -> &[Vector4<f64>] {
        &self.tangents
    }

    /// Bounding box; `None` for an empty mesh.
    #[inline]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Swap in new buffers and re-derive bounds and tangents.
    ///
    /// Callers guarantee consistency; used by the carving engine whose
    /// remapping cannot produce dangling indices.
    pub(crate) fn replace_buffers(
        &mut self,
        positions: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        uvs: Vec<Point2<f64>>,
        triangles: Vec<[u32; 3]>,
    ) {
        self.positions = positions;
        self.normals = normals;
        self.uvs = uvs;
        self.triangles = triangles;
        self.recalculate_bounds();
        self.recalculate_tangents();
    }

    pub fn recalculate_bounds(&mut self) {
        self.bounds = Aabb::from_points(&self.positions);
    }

    /// Per-vertex tangents from UV gradients, Gram-Schmidt orthogonalized
    /// against the normal.
    pub fn recalculate_tangents(&mut self) {
        let n = self.positions.len();
        let mut sdirs = vec![Vector3::zeros(); n];
        let mut tdirs = vec![Vector3::zeros(); n];

        for tri in &self.triangles {
            let [i0, i1, i2] = tri.map(|i| i as usize);
            let e1 = self.positions[i1] - self.positions[i0];
            let e2 = self.positions[i2] - self.positions[i0];
            let d1 = self.uvs[i1] - self.uvs[i0];
            let d2 = self.uvs[i2] - self.uvs[i0];

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < 1e-12 {
                continue;
            }
            let r = 1.0 / det;
            let sdir = (e1 * d2.y - e2 * d1.y) * r;
            let tdir = (e2 * d1.x - e1 * d2.x) * r;
            for i in [i0, i1, i2] {
                sdirs[i] += sdir;
                tdirs[i] += tdir;
            }
        }

        self.tangents = (0..n)
            .map(|i| {
                let normal = self.normals[i];
                let t = sdirs[i] - normal * normal.dot(&sdirs[i]);
                let t = if t.norm() > 1e-12 {
                    t.normalize()
                } else {
                    any_perpendicular(&normal)
                };
                let w = if normal.cross(&t).dot(&tdirs[i]) < 0.0 {
                    -1.0
                } else {
                    1.0
                };
                Vector4::new(t.x, t.y, t.z, w)
            })
            .collect();
    }
}

fn plate_subdivisions(requested: u32) -> usize {
    requested.clamp(1, MAX_PLATE_SUBDIVISIONS) as usize
}

/// Unit vector perpendicular to `n` (X for a degenerate normal).
fn any_perpendicular(n: &Vector3<f64>) -> Vector3<f64> {
    if n.norm() < 1e-12 {
        return Vector3::x();
    }
    let arbitrary = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    arbitrary.cross(n).normalize()
}

// ─── Tests ──────────────────────────────────────────────────────────
