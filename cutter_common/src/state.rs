//! State and axis-mapping enums shared by the cutter core.
//!
//! `FollowerState` uses `#[repr(u8)]` so it can be reported compactly in
//! diagnostics alongside the session statistics.

use serde::{Deserialize, Serialize};

// ─── Path Follower State ────────────────────────────────────────────

/// Lifecycle of one cut job on the path follower.
///
/// `Idle → ApproachStart → Cutting → ReturnHome → Idle`. Cancellation from
/// any active state jumps straight to `ReturnHome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum FollowerState {
    /// No session; the head is parked or homing finished.
    #[default]
    Idle = 0,
    /// Rapid move to the first waypoint, beam off.
    ApproachStart = 1,
    /// Traversing interior segments at cutting speed, beam on.
    Cutting = 2,
    /// Rapid move back to the home position, beam off.
    ReturnHome = 3,
}

impl FollowerState {
    /// Whether a session currently owns the head.
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

// ─── Axis Mapping ───────────────────────────────────────────────────

/// Sign applied to an axis position when it is mapped onto its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AxisDirection {
    #[default]
    Positive,
    Negative,
}

impl AxisDirection {
    /// `+1.0` or `-1.0`.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// Local transform axis an actuator displaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocalAxis {
    #[default]
    X,
    Y,
    Z,
}

impl LocalAxis {
    /// Component index into an `[x, y, z]` triple.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
