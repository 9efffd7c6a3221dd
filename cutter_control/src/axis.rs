//! Bounded, constant-rate single-axis servo.
//!
//! One implementation serves both the head carriage and the gantry; the
//! direction sign and the local transform axis come from [`AxisConfig`].
//!
//! ## Invariants
//!
//! - `current` and `target` always lie in `[min, max]`.
//! - `is_moving()` is false iff `current == target` (within
//!   [`POSITION_EPSILON_MM`]).
//! - Out-of-range requests are clamped, never rejected.

use cutter_common::consts::POSITION_EPSILON_MM;
use cutter_common::machine::AxisConfig;
use cutter_common::units::mm_to_m;
use nalgebra::Vector3;
use tracing::trace;

/// Rate-limited position servo over a clamped range [mm].
#[derive(Debug, Clone)]
pub struct AxisController {
    name: String,
    /// Lower travel bound [mm].
    min: f64,
    /// Upper travel bound [mm].
    max: f64,
    /// Direction sign applied to the transform (+1.0 or -1.0).
    sign: f64,
    /// Transform component displaced by this axis.
    axis_index: usize,
    /// Transform origin [m].
    mount_offset: Vector3<f64>,
    /// Actual position [mm].
    current: f64,
    /// Commanded position [mm].
    target: f64,
    /// Approach rate [mm/s].
    rate: f64,
    moving: bool,
    /// Transform position [m] after the last applied move.
    local_position: Vector3<f64>,
}

impl AxisController {
    /// Create an axis parked at its (clamped) home position.
    pub fn new(config: &AxisConfig) -> Self {
        let (min, max) = if config.max_mm >= config.min_mm {
            (config.min_mm, config.max_mm)
        } else {
            (config.max_mm, config.min_mm)
        };
        let mount_offset = Vector3::from(config.mount_offset_m);

        let mut axis = Self {
            name: config.name.clone(),
            min,
            max,
            sign: config.direction.sign(),
            axis_index: config.local_axis.index(),
            mount_offset,
            current: min,
            target: min,
            rate: 0.0,
            moving: false,
            local_position: mount_offset,
        };
        axis.reset_to(config.home_mm);
        axis
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actual position [mm].
    #[inline]
    pub fn position(&self) -> f64 {
        self.current
    }

    /// Commanded position [mm].
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Approach rate of the last command [mm/s].
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Travel range `(min, max)` [mm].
    #[inline]
    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Transform position [m]: mount offset plus the signed displacement.
    #[inline]
    pub fn local_position(&self) -> Vector3<f64> {
        self.local_position
    }

    /// Signed displacement [m] along the local axis, without the mount offset.
    #[inline]
    pub fn displacement(&self) -> Vector3<f64> {
        self.local_position - self.mount_offset
    }

    /// Clamp a position into the travel range.
    #[inline]
    pub fn clamp(&self, position: f64) -> f64 {
        position.clamp(self.min, self.max)
    }

    /// Command a new target. Does not advance time.
    ///
    /// Non-finite positions are ignored; negative or non-finite rates
    /// clamp to zero.
    pub fn set_target(&mut self, position: f64, rate: f64) {
        if !position.is_finite() {
            return;
        }
        self.target = self.clamp(position);
        self.rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        self.moving = (self.target - self.current).abs() > POSITION_EPSILON_MM;
        if !self.moving && self.current != self.target {
            self.current = self.target;
            self.apply_position();
        }
        trace!(
            "axis {}: target={:.4} rate={:.3} moving={}",
            self.name, self.target, self.rate, self.moving
        );
    }

    /// Advance toward the target by `rate * dt`, never overshooting.
    ///
    /// Returns whether the axis was moving when the tick started, i.e.
    /// whether this tick displaced it.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.moving {
            return false;
        }

        let step = self.rate * dt.max(0.0);
        self.current = move_towards(self.current, self.target, step);

        if (self.target - self.current).abs() <= POSITION_EPSILON_MM {
            self.current = self.target;
            self.moving = false;
        }

        self.apply_position();
        true
    }

    /// Jump instantly to `position`, bypassing rate-limited motion.
    ///
    /// Used for homing at startup and power-loss recovery.
    pub fn reset_to(&mut self, position: f64) {
        if !position.is_finite() {
            return;
        }
        let clamped = self.clamp(position);
        self.current = clamped;
        self.target = clamped;
        self.moving = false;
        self.apply_position();
    }

    fn apply_position(&mut self) {
        let mut local = self.mount_offset;
        local[self.axis_index] += self.sign * mm_to_m(self.current);
        self.local_position = local;
    }
}

/// Move `current` toward `target` by at most `max_delta`.
#[inline]
fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta * delta.signum()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
