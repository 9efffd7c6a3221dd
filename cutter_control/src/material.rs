//! Cuttable sheet: mesh + lazily created cut mask + physics promotion.
//!
//! Each beam sample paints a disc into the mask; when the mask changes the
//! mesh is carved against it. A carved sheet with `physics_after_cut` set is
//! promoted once from a static fixture to a grabbable dynamic body.

use cutter_common::machine::MaterialConfig;
use nalgebra::{Isometry3, Point3};
use tracing::{debug, info};

use crate::carving::{CarveOutcome, carve};
use crate::mask::{CutMask, SurfaceMapper};
use crate::mesh::SurfaceMesh;

/// Rigid-body mode of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BodyKind {
    /// Fixed in the work area.
    #[default]
    Static,
    /// Free body with gravity.
    Dynamic { mass_kg: f64 },
}

/// Result of one beam sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CutResult {
    /// The sample removed at least one new mask cell.
    pub mask_changed: bool,
    /// Carve result, present only when the mask changed.
    pub carve: Option<CarveOutcome>,
    /// The body was promoted to dynamic by this sample.
    pub promoted: bool,
}

impl CutResult {
    /// The mesh was rebuilt by this sample.
    pub fn rebuilt(&self) -> bool {
        matches!(self.carve, Some(CarveOutcome::Rebuilt(_)))
    }
}

/// Anything the beam can cut.
pub trait CutTarget {
    /// Apply one beam sample at a world-space contact point.
    fn cut_at(&mut self, world: &Point3<f64>) -> CutResult;
}

#[derive(Debug, Clone)]
pub struct CuttableMaterial {
    name: String,
    mesh: SurfaceMesh,
    /// Created on first cut.
    mask: Option<CutMask>,
    mapper: SurfaceMapper,
    resolution: u32,
    cut_radius: f64,
    physics_after_cut: bool,
    scrap_mass_kg: f64,
    body: BodyKind,
    grabbable: bool,
    /// Bumped whenever the collider must be regenerated from the mesh.
    collider_revision: u64,
    carve_count: u64,
}

impl CuttableMaterial {
    /// Wrap `mesh` placed at world `frame`.
    pub fn new(
        name: impl Into<String>,
        mesh: SurfaceMesh,
        frame: Isometry3<f64>,
        config: &MaterialConfig,
    ) -> Self {
        Self {
            name: name.into(),
            mesh,
            mask: None,
            mapper: SurfaceMapper::new(frame, config.surface_size),
            resolution: config.mask_resolution,
            cut_radius: config.cut_radius,
            physics_after_cut: config.physics_after_cut,
            scrap_mass_kg: config.scrap_mass_kg,
            body: BodyKind::Static,
            grabbable: false,
            collider_revision: 0,
            carve_count: 0,
        }
    }

    /// Flat subdivided plate sized to `config.surface_size`.
    pub fn plate(
        name: impl Into<String>,
        frame: Isometry3<f64>,
        config: &MaterialConfig,
        subdivisions: u32,
    ) -> Self {
        Self::new(
            name,
            SurfaceMesh::plate(config.surface_size, subdivisions),
            frame,
            config,
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// `None` until the first cut.
    #[inline]
    pub fn mask(&self) -> Option<&CutMask> {
        self.mask.as_ref()
    }

    #[inline]
    pub fn mapper(&self) -> &SurfaceMapper {
        &self.mapper
    }

    /// Move the sheet (e.g. after being grabbed and re-seated).
    pub fn set_frame(&mut self, frame: Isometry3<f64>) {
        self.mapper.set_frame(frame);
    }

    #[inline]
    pub fn body(&self) -> BodyKind {
        self.body
    }

    #[inline]
    pub fn is_grabbable(&self) -> bool {
        self.grabbable
    }

    #[inline]
    pub fn collider_revision(&self) -> u64 {
        self.collider_revision
    }

    /// Number of mesh rebuilds so far.
    #[inline]
    pub fn carve_count(&self) -> u64 {
        self.carve_count
    }

    /// Every vertex has been cut away.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.mesh.is_empty()
    }

    fn promote(&mut self) -> bool {
        if !self.physics_after_cut || self.body != BodyKind::Static {
            return false;
        }
        self.body = BodyKind::Dynamic {
            mass_kg: self.scrap_mass_kg,
        };
        self.grabbable = true;
        info!(material = %self.name, mass_kg = self.scrap_mass_kg, "material promoted to dynamic body");
        true
    }
}

impl CutTarget for CuttableMaterial {
    fn cut_at(&mut self, world: &Point3<f64>) -> CutResult {
        let uv = self.mapper.world_to_surface_uv(world);
        let resolution = self.resolution;
        let mask = self.mask.get_or_insert_with(|| CutMask::new(resolution));
        if !mask.paint_disc(uv, self.cut_radius) {
            return CutResult::default();
        }

        let outcome = carve(&mut self.mesh, mask, &self.mapper);
        let mut result = CutResult {
            mask_changed: true,
            carve: Some(outcome),
            promoted: false,
        };
        let CarveOutcome::Rebuilt(stats) = outcome else {
            return result;
        };

        self.carve_count += 1;
        debug!(
            material = %self.name,
            u = uv.x,
            v = uv.y,
            vertices = stats.kept_vertices,
            "cut applied"
        );
        if stats.is_exhausted() {
            info!(material = %self.name, "material fully cut away");
            return result;
        }
        if self.physics_after_cut {
            result.promoted = self.promote();
            self.collider_revision += 1;
        }
        result
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
