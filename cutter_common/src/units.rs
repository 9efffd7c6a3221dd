//! Unit conversion between configuration millimeters and transform meters.

use crate::consts::MM_PER_METER;

/// Convert millimeters to meters.
#[inline]
pub fn mm_to_m(millimeters: f64) -> f64 {
    millimeters / MM_PER_METER
}

/// Convert meters to millimeters.
#[inline]
pub fn m_to_mm(meters: f64) -> f64 {
    meters * MM_PER_METER
}
