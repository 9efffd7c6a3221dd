//! Work area socket: holds at most one sheet on the cutter bed.

use std::f64::consts::FRAC_PI_2;

use cutter_common::units::mm_to_m;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use tracing::info;

use crate::material::CuttableMaterial;

#[derive(Debug, Clone)]
pub struct WorkArea {
    /// World-from-bed transform.
    bed_frame: Isometry3<f64>,
    socket: Option<CuttableMaterial>,
}

impl WorkArea {
    pub fn new(bed_frame: Isometry3<f64>) -> Self {
        Self {
            bed_frame,
            socket: None,
        }
    }

    #[inline]
    pub fn bed_frame(&self) -> &Isometry3<f64> {
        &self.bed_frame
    }

    pub fn set_bed_frame(&mut self, bed_frame: Isometry3<f64>) {
        self.bed_frame = bed_frame;
    }

    /// Seat a sheet, returning whatever was in the socket before.
    pub fn place(&mut self, material: CuttableMaterial) -> Option<CuttableMaterial> {
        info!(material = %material.name(), "material placed");
        self.socket.replace(material)
    }

    pub fn remove(&mut self) -> Option<CuttableMaterial> {
        let removed = self.socket.take();
        if let Some(m) = &removed {
            info!(material = %m.name(), "material removed");
        }
        removed
    }

    #[inline]
    pub fn has_material(&self) -> bool {
        self.socket.is_some()
    }

    #[inline]
    pub fn material(&self) -> Option<&CuttableMaterial> {
        self.socket.as_ref()
    }

    #[inline]
    pub fn material_mut(&mut self) -> Option<&mut CuttableMaterial> {
        self.socket.as_mut()
    }

    /// World frame of a sheet lying flat on the bed, centred under head
    /// position `center_mm`.
    ///
    /// Sheet +X runs along head travel (bed +X), sheet +Y along gantry
    /// travel (bed −Z), and the sheet faces bed +Y. Matches the stock axis
    /// mapping.
    pub fn seat_frame(&self, center_mm: [f64; 2]) -> Isometry3<f64> {
        let on_bed = Isometry3::from_parts(
            Translation3::new(mm_to_m(center_mm[0]), 0.0, -mm_to_m(center_mm[1])),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2),
        );
        self.bed_frame * on_bed
    }

    /// World point expressed in bed coordinates.
    pub fn grid_position(&self, world: &Point3<f64>) -> Point3<f64> {
        self.bed_frame.inverse_transform_point(world)
    }
}

impl Default for WorkArea {
    fn default() -> Self {
        Self::new(Isometry3::identity())
    }
}
