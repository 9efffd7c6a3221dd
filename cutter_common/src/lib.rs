//! Laser Cutter Common Library
//!
//! Shared constants, unit conversion, configuration loading and state types
//! used by the cutter control crate and its simulator binary.
//!
//! # Module Structure
//!
//! - [`consts`] - Physical defaults and bounds
//! - [`units`] - Millimeter/meter conversion at the fixed 1000:1 ratio
//! - [`config`] - Generic TOML loading (`ConfigLoader`, `SharedConfig`)
//! - [`machine`] - Cutter configuration sections with bounds validation
//! - [`safety`] - Interlock bitflags
//! - [`state`] - Follower state and axis mapping enums
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cutter_common::prelude::*;
//!
//! let flags = InterlockFlags::READY;
//! assert!(flags.contains(InterlockFlags::DOOR_CLOSED));
//! ```

pub mod config;
pub mod consts;
pub mod machine;
pub mod prelude;
pub mod safety;
pub mod state;
pub mod units;
