//! Prelude module for common re-exports.
//!
//! ```rust
//! use cutter_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::machine::{
    AxisConfig, CutterConfig, HeadConfig, MaterialConfig, MotionConfig, ShapeConfig,
};

// ─── State & Safety ─────────────────────────────────────────────────
pub use crate::safety::{Interlock, InterlockFlags};
pub use crate::state::{AxisDirection, FollowerState, LocalAxis};

// ─── Units ──────────────────────────────────────────────────────────
pub use crate::consts::MM_PER_METER;
pub use crate::units::{m_to_mm, mm_to_m};
