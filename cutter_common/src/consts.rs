//! Physical defaults and parameter bounds.
//!
//! Speeds and travel are expressed in millimeters for configuration
//! legibility; transform math happens in meters (see [`crate::units`]).

use static_assertions::const_assert;

/// Millimeters per meter. Fixed conversion ratio for all transform math.
pub const MM_PER_METER: f64 = 1000.0;

/// Tolerance [mm] under which an axis is considered at its target.
pub const POSITION_EPSILON_MM: f64 = 1e-6;

/// Minimum travel [mm] between an axis' `min_mm` and `max_mm`.
pub const MIN_AXIS_TRAVEL_MM: f64 = 10.0;

/// Default head (X) travel upper bound [mm].
pub const HEAD_MAX_MM_DEFAULT: f64 = 100.0;

/// Default gantry travel upper bound [mm].
pub const GANTRY_MAX_MM_DEFAULT: f64 = 500.0;

/// Default cutting feed rate [mm/s].
pub const CUTTING_SPEED_DEFAULT: f64 = 50.0;

/// Default rapid (non-cutting) rate [mm/s].
pub const FAST_SPEED_DEFAULT: f64 = 150.0;

/// Default cut-mask resolution (cells per side).
pub const MASK_RESOLUTION_DEFAULT: u32 = 256;
pub const MASK_RESOLUTION_MIN: u32 = 8;
pub const MASK_RESOLUTION_MAX: u32 = 4096;

/// Default beam radius as a fraction of the surface side.
pub const CUT_RADIUS_DEFAULT: f64 = 0.1;

/// Default mass [kg] of a carved piece once it becomes a loose scrap.
pub const SCRAP_MASS_DEFAULT: f64 = 0.1;

/// Minimum number of waypoints in a cuttable path.
pub const MIN_PATH_POINTS: usize = 2;

/// Maximum concurrent interlock subscribers.
pub const MAX_INTERLOCK_SUBSCRIBERS: usize = 8;

/// Pending interlock changes buffered per subscriber.
pub const INTERLOCK_MAILBOX_DEPTH: usize = 16;

const_assert!(MASK_RESOLUTION_DEFAULT >= MASK_RESOLUTION_MIN);
const_assert!(MASK_RESOLUTION_DEFAULT <= MASK_RESOLUTION_MAX);
const_assert!(MIN_PATH_POINTS >= 2);
const_assert!(MAX_INTERLOCK_SUBSCRIBERS > 0);
