//! Running counters for a cutter's lifetime, O(1) per tick.

use serde::Serialize;

use crate::follower::FollowerEvent;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Simulated time [s].
    pub sim_time_s: f64,
    /// Largest tick step seen [s].
    pub max_dt_s: f64,
    /// Simulated time with the beam on [s].
    pub beam_time_s: f64,
    /// Beam samples applied to a material.
    pub samples: u64,
    /// Samples that removed new mask cells.
    pub mask_changes: u64,
    /// Mesh rebuilds.
    pub rebuilds: u64,
    /// Static → dynamic promotions.
    pub promotions: u64,
    pub waypoints_reached: u64,
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub sessions_cancelled: u64,
    /// Homing moves made without a path (e.g. power off while idle).
    pub homings: u64,
    /// Start requests refused by a precondition.
    pub rejected_starts: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick of `dt` seconds.
    #[inline]
    pub fn record_tick(&mut self, dt: f64, cutting: bool) {
        self.tick_count += 1;
        self.sim_time_s += dt;
        if dt > self.max_dt_s {
            self.max_dt_s = dt;
        }
        if cutting {
            self.beam_time_s += dt;
        }
    }

    pub fn record_event(&mut self, event: &FollowerEvent) {
        match event {
            FollowerEvent::Sampled(result) => {
                self.samples += 1;
                if result.mask_changed {
                    self.mask_changes += 1;
                }
                if result.rebuilt() {
                    self.rebuilds += 1;
                }
                if result.promoted {
                    self.promotions += 1;
                }
            }
            FollowerEvent::WaypointReached(_) => self.waypoints_reached += 1,
            FollowerEvent::Finished { cancelled: true } => self.sessions_cancelled += 1,
            FollowerEvent::Finished { cancelled: false } => self.sessions_completed += 1,
            FollowerEvent::Homed => self.homings += 1,
            FollowerEvent::StateChanged { .. } | FollowerEvent::CuttingChanged(_) => {}
        }
    }

    /// Average tick step [s] (0 if no ticks).
    pub fn avg_dt_s(&self) -> f64 {
        if self.tick_count == 0 {
            0.0
        } else {
            self.sim_time_s / self.tick_count as f64
        }
    }
}
