//! Cutter configuration sections (axes, motion, material, head, shapes).
//!
//! All sections deserialize from one TOML document via
//! [`ConfigLoader`](crate::config::ConfigLoader). Every section has a default
//! reproducing the stock desktop cutter, so an empty file is a valid config.
//! Call [`CutterConfig::validate`] after loading.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    CUT_RADIUS_DEFAULT, CUTTING_SPEED_DEFAULT, FAST_SPEED_DEFAULT, GANTRY_MAX_MM_DEFAULT,
    HEAD_MAX_MM_DEFAULT, MASK_RESOLUTION_DEFAULT, MASK_RESOLUTION_MAX, MASK_RESOLUTION_MIN,
    MIN_AXIS_TRAVEL_MM, MIN_PATH_POINTS, SCRAP_MASS_DEFAULT,
};
use crate::state::{AxisDirection, LocalAxis};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete cutter configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "cutter-sim"
///
/// [gantry_axis]
/// name = "gantry"
/// max_mm = 500.0
/// direction = "negative"
/// local_axis = "z"
///
/// [motion]
/// cutting_speed_mm_s = 40.0
///
/// [[shapes]]
/// name = "Slot"
/// points = [[10.0, 10.0], [60.0, 10.0]]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CutterConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Head carriage, driven by waypoint X.
    #[serde(default = "AxisConfig::head_default")]
    pub head_axis: AxisConfig,

    /// Gantry, driven by waypoint Y.
    #[serde(default = "AxisConfig::gantry_default")]
    pub gantry_axis: AxisConfig,

    #[serde(default)]
    pub motion: MotionConfig,

    #[serde(default)]
    pub material: MaterialConfig,

    #[serde(default)]
    pub head: HeadConfig,

    /// User shapes appended to the built-in library.
    #[serde(default)]
    pub shapes: Vec<ShapeConfig>,
}

impl Default for CutterConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            head_axis: AxisConfig::head_default(),
            gantry_axis: AxisConfig::gantry_default(),
            motion: MotionConfig::default(),
            material: MaterialConfig::default(),
            head: HeadConfig::default(),
            shapes: Vec::new(),
        }
    }
}

impl CutterConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.head_axis.validate()?;
        self.gantry_axis.validate()?;
        self.motion.validate()?;
        self.material.validate()?;
        self.head.validate()?;
        for shape in &self.shapes {
            shape.validate()?;
        }
        Ok(())
    }

    /// Home position `[head_mm, gantry_mm]`.
    ///
    /// `motion.home_mm` wins when set; otherwise each axis' own `home_mm`.
    pub fn home_mm(&self) -> [f64; 2] {
        self.motion
            .home_mm
            .unwrap_or([self.head_axis.home_mm, self.gantry_axis.home_mm])
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn check_finite(field: &str, values: &[f64]) -> Result<(), ConfigError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be finite")))
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Single-axis servo configuration.
///
/// Travel and home are in millimeters; the mount offset is the transform
/// origin in meters that the axis displacement is added to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Human-readable name (e.g. "head", "gantry").
    pub name: String,

    /// Lower travel bound [mm].
    #[serde(default)]
    pub min_mm: f64,

    /// Upper travel bound [mm]. Must exceed `min_mm` by at least 10 mm.
    pub max_mm: f64,

    /// Home position [mm]. Clamped into range at runtime.
    #[serde(default)]
    pub home_mm: f64,

    /// Sign applied when mapping position onto the transform.
    #[serde(default)]
    pub direction: AxisDirection,

    /// Transform axis the actuator displaces.
    #[serde(default)]
    pub local_axis: LocalAxis,

    /// Transform origin [m] the displacement is applied to.
    #[serde(default)]
    pub mount_offset_m: [f64; 3],
}

impl AxisConfig {
    /// Head carriage: 0–100 mm along +X.
    pub fn head_default() -> Self {
        Self {
            name: "head".to_string(),
            min_mm: 0.0,
            max_mm: HEAD_MAX_MM_DEFAULT,
            home_mm: 0.0,
            direction: AxisDirection::Positive,
            local_axis: LocalAxis::X,
            mount_offset_m: [0.0; 3],
        }
    }

    /// Gantry: 0–500 mm along −Z.
    pub fn gantry_default() -> Self {
        Self {
            name: "gantry".to_string(),
            min_mm: 0.0,
            max_mm: GANTRY_MAX_MM_DEFAULT,
            home_mm: 0.0,
            direction: AxisDirection::Negative,
            local_axis: LocalAxis::Z,
            mount_offset_m: [0.0; 3],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(invalid("axis name cannot be empty".to_string()));
        }
        check_finite(
            &format!("axis '{}' travel", self.name),
            &[self.min_mm, self.max_mm, self.home_mm],
        )?;
        check_finite(
            &format!("axis '{}' mount_offset_m", self.name),
            &self.mount_offset_m,
        )?;
        if self.max_mm < self.min_mm + MIN_AXIS_TRAVEL_MM {
            return Err(invalid(format!(
                "axis '{}': max_mm {} must be at least min_mm {} + {}",
                self.name, self.max_mm, self.min_mm, MIN_AXIS_TRAVEL_MM
            )));
        }
        Ok(())
    }
}

// ─── Motion ─────────────────────────────────────────────────────────

/// Feed rates and home position for the path follower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionConfig {
    /// Rate while the beam is on [mm/s].
    #[serde(default = "default_cutting_speed")]
    pub cutting_speed_mm_s: f64,

    /// Rapid rate for approach and return [mm/s].
    #[serde(default = "default_fast_speed")]
    pub fast_speed_mm_s: f64,

    /// Override of the home position `[head_mm, gantry_mm]`.
    #[serde(default)]
    pub home_mm: Option<[f64; 2]>,
}

fn default_cutting_speed() -> f64 {
    CUTTING_SPEED_DEFAULT
}
fn default_fast_speed() -> f64 {
    FAST_SPEED_DEFAULT
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            cutting_speed_mm_s: CUTTING_SPEED_DEFAULT,
            fast_speed_mm_s: FAST_SPEED_DEFAULT,
            home_mm: None,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("cutting_speed_mm_s", self.cutting_speed_mm_s),
            ("fast_speed_mm_s", self.fast_speed_mm_s),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{field} {value} must be > 0")));
            }
        }
        if let Some(home) = self.home_mm {
            check_finite("motion.home_mm", &home)?;
        }
        Ok(())
    }
}

// ─── Material ───────────────────────────────────────────────────────

/// Cuttable sheet parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialConfig {
    /// Cut-mask cells per side.
    #[serde(default = "default_mask_resolution")]
    pub mask_resolution: u32,

    /// Beam radius as a fraction of the surface side, in (0, 1].
    #[serde(default = "default_cut_radius")]
    pub cut_radius: f64,

    /// Surface extent `[width, height]` in local units, centred on the origin.
    #[serde(default = "default_surface_size")]
    pub surface_size: [f64; 2],

    /// Promote the sheet to a loose, grabbable body after the first carve.
    #[serde(default = "default_true")]
    pub physics_after_cut: bool,

    /// Mass [kg] given to the promoted body.
    #[serde(default = "default_scrap_mass")]
    pub scrap_mass_kg: f64,
}

fn default_mask_resolution() -> u32 {
    MASK_RESOLUTION_DEFAULT
}
fn default_cut_radius() -> f64 {
    CUT_RADIUS_DEFAULT
}
fn default_surface_size() -> [f64; 2] {
    [1.0, 1.0]
}
fn default_true() -> bool {
    true
}
fn default_scrap_mass() -> f64 {
    SCRAP_MASS_DEFAULT
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            mask_resolution: MASK_RESOLUTION_DEFAULT,
            cut_radius: CUT_RADIUS_DEFAULT,
            surface_size: default_surface_size(),
            physics_after_cut: true,
            scrap_mass_kg: SCRAP_MASS_DEFAULT,
        }
    }
}

impl MaterialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mask_resolution < MASK_RESOLUTION_MIN || self.mask_resolution > MASK_RESOLUTION_MAX
        {
            return Err(invalid(format!(
                "mask_resolution {} out of range [{}, {}]",
                self.mask_resolution, MASK_RESOLUTION_MIN, MASK_RESOLUTION_MAX
            )));
        }
        if !self.cut_radius.is_finite() || self.cut_radius <= 0.0 || self.cut_radius > 1.0 {
            return Err(invalid(format!(
                "cut_radius {} out of range (0, 1]",
                self.cut_radius
            )));
        }
        if self
            .surface_size
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(invalid(format!(
                "surface_size {:?} must be positive",
                self.surface_size
            )));
        }
        if !self.scrap_mass_kg.is_finite() || self.scrap_mass_kg <= 0.0 {
            return Err(invalid(format!(
                "scrap_mass_kg {} must be > 0",
                self.scrap_mass_kg
            )));
        }
        Ok(())
    }
}

// ─── Head ───────────────────────────────────────────────────────────

/// Beam geometry relative to the bed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadConfig {
    /// Offset [m] of the beam contact point from the axis displacement sum.
    #[serde(default)]
    pub beam_origin_m: [f64; 3],
}

impl HeadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite("head.beam_origin_m", &self.beam_origin_m)
    }
}

// ─── Shapes ─────────────────────────────────────────────────────────

/// A named waypoint list in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeConfig {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

impl ShapeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(invalid("shape name cannot be empty".to_string()));
        }
        if self.points.len() < MIN_PATH_POINTS {
            return Err(invalid(format!(
                "shape '{}' needs at least {} points, got {}",
                self.name,
                MIN_PATH_POINTS,
                self.points.len()
            )));
        }
        for point in &self.points {
            check_finite(&format!("shape '{}' points", self.name), point)?;
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
