//! Two-axis cutting head: head carriage (waypoint X) + gantry (waypoint Y).
//!
//! Both axes are sampled together to answer "are we at the target yet" and
//! to locate the beam contact point on the bed.

use cutter_common::machine::{AxisConfig, HeadConfig};
use nalgebra::{Isometry3, Point2, Point3, Vector3};

use crate::axis::AxisController;

/// The motorized head assembly.
#[derive(Debug, Clone)]
pub struct CuttingHead {
    head: AxisController,
    gantry: AxisController,
    /// World-from-bed transform.
    bed_frame: Isometry3<f64>,
    /// Beam contact offset [m] in the bed frame.
    beam_origin: Vector3<f64>,
}

impl CuttingHead {
    pub fn new(head: &AxisConfig, gantry: &AxisConfig, config: &HeadConfig) -> Self {
        Self {
            head: AxisController::new(head),
            gantry: AxisController::new(gantry),
            bed_frame: Isometry3::identity(),
            beam_origin: Vector3::from(config.beam_origin_m),
        }
    }

    /// Place the bed in the world.
    pub fn with_bed_frame(mut self, bed_frame: Isometry3<f64>) -> Self {
        self.bed_frame = bed_frame;
        self
    }

    pub fn set_bed_frame(&mut self, bed_frame: Isometry3<f64>) {
        self.bed_frame = bed_frame;
    }

    #[inline]
    pub fn head_axis(&self) -> &AxisController {
        &self.head
    }

    #[inline]
    pub fn gantry_axis(&self) -> &AxisController {
        &self.gantry
    }

    #[inline]
    pub fn bed_frame(&self) -> &Isometry3<f64> {
        &self.bed_frame
    }

    /// Command both axes toward a waypoint [mm] at `rate` [mm/s].
    pub fn command(&mut self, target: Point2<f64>, rate: f64) {
        self.head.set_target(target.x, rate);
        self.gantry.set_target(target.y, rate);
    }

    /// Advance both axes. Returns whether either axis moved this tick.
    pub fn tick(&mut self, dt: f64) -> bool {
        let head_moved = self.head.tick(dt);
        let gantry_moved = self.gantry.tick(dt);
        head_moved || gantry_moved
    }

    /// Whether either axis is still approaching its target.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.head.is_moving() || self.gantry.is_moving()
    }

    /// Actual position `[head, gantry]` [mm].
    #[inline]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.head.position(), self.gantry.position())
    }

    /// Commanded position `[head, gantry]` [mm].
    #[inline]
    pub fn target(&self) -> Point2<f64> {
        Point2::new(self.head.target(), self.gantry.target())
    }

    /// Jump both axes instantly (homing, power-loss recovery).
    pub fn reset_to(&mut self, position: Point2<f64>) {
        self.head.reset_to(position.x);
        self.gantry.reset_to(position.y);
    }

    /// Beam contact point in the bed frame [m].
    pub fn contact_point_local(&self) -> Point3<f64> {
        Point3::from(self.beam_origin + self.head.displacement() + self.gantry.displacement())
    }

    /// Beam contact point in world space [m].
    pub fn contact_point(&self) -> Point3<f64> {
        self.bed_frame * self.contact_point_local()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
