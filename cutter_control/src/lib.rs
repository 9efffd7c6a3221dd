//! # Laser Cutter Control Library
//!
//! Tick-driven core of a two-axis laser cutter: rate-limited axis servos, a
//! waypoint path follower, a monotonic cut mask over the material surface and
//! the mesh carving engine that removes cut-away geometry.
//!
//! ## Data Flow (one tick)
//!
//! 1. **Interlocks**: queued sensor changes are drained; a lost condition
//!    cancels the running path.
//! 2. **Axes**: head and gantry advance toward their targets.
//! 3. **Beam sample**: while cutting, the contact point is painted into the
//!    cut mask.
//! 4. **Carving**: if the mask changed, the mesh is rebuilt without the
//!    removed vertices.
//!
//! Everything is single-threaded and allocation happens only when a mesh is
//! rebuilt.

pub mod axis;
pub mod carving;
pub mod config;
pub mod cutter;
pub mod feedback;
pub mod follower;
pub mod head;
pub mod interlock;
pub mod mask;
pub mod material;
pub mod mesh;
pub mod path;
pub mod session;
pub mod shapes;
pub mod stats;
pub mod work_area;
