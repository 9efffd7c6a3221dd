//! Path follower: the `Idle → ApproachStart → Cutting → ReturnHome → Idle`
//! state machine driving the cutting head along a waypoint path.
//!
//! The follower is resumable: every call to [`PathFollower::tick`] advances
//! the head exactly once, takes at most one beam sample, and returns. Nothing
//! blocks between waypoints; arrival is detected by polling the head's
//! `is_moving` after the axes have advanced.

use cutter_common::machine::MotionConfig;
use cutter_common::state::FollowerState;
use heapless::Vec as FixedVec;
use nalgebra::Point2;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::head::CuttingHead;
use crate::material::{CutResult, CutTarget};
use crate::path::WaypointPath;

/// Upper bound on events emitted by a single follower call.
pub const MAX_FOLLOWER_EVENTS: usize = 8;

/// Feed rates [mm/s].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedRates {
    /// Beam-on traversal between waypoints.
    pub cutting_mm_s: f64,
    /// Approach and return moves.
    pub fast_mm_s: f64,
}

impl FeedRates {
    pub fn from_config(motion: &MotionConfig) -> Self {
        Self {
            cutting_mm_s: motion.cutting_speed_mm_s,
            fast_mm_s: motion.fast_speed_mm_s,
        }
    }
}

impl Default for FeedRates {
    fn default() -> Self {
        Self::from_config(&MotionConfig::default())
    }
}

/// Something observable that happened during a follower call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowerEvent {
    StateChanged {
        from: FollowerState,
        to: FollowerState,
    },
    /// Beam switched on or off.
    CuttingChanged(bool),
    /// Head stopped at waypoint `n` (n >= 1).
    WaypointReached(usize),
    /// One beam sample was applied.
    Sampled(CutResult),
    /// Back home and idle after a path.
    Finished { cancelled: bool },
    /// Back home and idle after a plain homing move.
    Homed,
}

pub type FollowerEvents = FixedVec<FollowerEvent, MAX_FOLLOWER_EVENTS>;

/// Result of one [`PathFollower::tick`].
#[derive(Debug, Clone, Default)]
pub struct FollowerTick {
    /// Either axis was moving at the start of the tick.
    pub moved: bool,
    pub events: FollowerEvents,
}

/// A path was offered while another one is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("follower busy ({0:?})")]
pub struct FollowerBusy(pub FollowerState);

#[derive(Debug, Clone)]
pub struct PathFollower {
    state: FollowerState,
    path: Option<WaypointPath>,
    /// Waypoint currently commanded.
    index: usize,
    cutting: bool,
    home: Point2<f64>,
    rates: FeedRates,
    cancelled: bool,
}

impl PathFollower {
    pub fn new(home: Point2<f64>) -> Self {
        Self {
            state: FollowerState::Idle,
            path: None,
            index: 0,
            cutting: false,
            home,
            rates: FeedRates::default(),
            cancelled: false,
        }
    }

    #[inline]
    pub fn state(&self) -> FollowerState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Beam on: true only while traversing interior segments.
    #[inline]
    pub fn is_cutting(&self) -> bool {
        self.cutting
    }

    /// A path owns the head. A plain homing move does not; a new path may
    /// take over from it.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.is_active() && self.path.is_some()
    }

    #[inline]
    pub fn waypoint_index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn home(&self) -> Point2<f64> {
        self.home
    }

    #[inline]
    pub fn path(&self) -> Option<&WaypointPath> {
        self.path.as_ref()
    }

    /// Accept `path` and start the approach to its first waypoint.
    ///
    /// Refused while another path is running, even if it is already on its
    /// way home. Interrupts a plain homing move.
    pub fn begin(
        &mut self,
        path: WaypointPath,
        head: &mut CuttingHead,
        rates: FeedRates,
    ) -> Result<FollowerEvents, FollowerBusy> {
        if self.is_busy() {
            return Err(FollowerBusy(self.state));
        }

        let mut events = FollowerEvents::new();
        info!(waypoints = path.len(), length_mm = path.length_mm(), "path accepted");
        head.command(path.first(), rates.fast_mm_s);
        self.rates = rates;
        self.path = Some(path);
        self.index = 0;
        self.cancelled = false;
        self.transition(FollowerState::ApproachStart, &mut events);
        Ok(events)
    }

    /// Abandon the remaining waypoints and head home. No-op when idle or
    /// already returning.
    pub fn cancel(&mut self, head: &mut CuttingHead) -> FollowerEvents {
        let mut events = FollowerEvents::new();
        if matches!(self.state, FollowerState::Idle | FollowerState::ReturnHome) {
            return events;
        }
        warn!(state = ?self.state, waypoint = self.index, "path cancelled, returning home");
        self.cancelled = true;
        self.return_home(head, &mut events);
        events
    }

    /// Return home from any state.
    pub fn go_home(&mut self, head: &mut CuttingHead) -> FollowerEvents {
        if self.state != FollowerState::Idle {
            return self.cancel(head);
        }
        let mut events = FollowerEvents::new();
        self.cancelled = false;
        self.return_home(head, &mut events);
        events
    }

    /// Advance the head by `dt`, then react to its new position.
    ///
    /// While cutting, a sample is taken whenever the head was moving this
    /// tick (including the tick it arrives), after the axes advanced.
    pub fn tick(
        &mut self,
        dt: f64,
        head: &mut CuttingHead,
        target: Option<&mut dyn CutTarget>,
    ) -> FollowerTick {
        let mut out = FollowerTick {
            moved: head.tick(dt),
            events: FollowerEvents::new(),
        };
        let events = &mut out.events;

        match self.state {
            FollowerState::Idle => {}
            FollowerState::ApproachStart => {
                if !head.is_moving() {
                    self.index = 1;
                    match self.waypoint(1) {
                        Some(next) => {
                            self.transition(FollowerState::Cutting, events);
                            self.set_cutting(true, events);
                            head.command(next, self.rates.cutting_mm_s);
                        }
                        None => self.return_home(head, events),
                    }
                }
            }
            FollowerState::Cutting => {
                if out.moved {
                    if let Some(target) = target {
                        let contact = head.contact_point();
                        let result = target.cut_at(&contact);
                        if result.mask_changed {
                            trace!(x = contact.x, y = contact.y, z = contact.z, "cut sample");
                        }
                        let _ = events.push(FollowerEvent::Sampled(result));
                    }
                }
                if !head.is_moving() {
                    debug!(waypoint = self.index, "waypoint reached");
                    let _ = events.push(FollowerEvent::WaypointReached(self.index));
                    self.index += 1;
                    match self.waypoint(self.index) {
                        Some(next) => head.command(next, self.rates.cutting_mm_s),
                        None => self.return_home(head, events),
                    }
                }
            }
            FollowerState::ReturnHome => {
                if !head.is_moving() {
                    self.transition(FollowerState::Idle, events);
                    self.index = 0;
                    let event = match self.path.take() {
                        Some(_) => FollowerEvent::Finished {
                            cancelled: self.cancelled,
                        },
                        None => FollowerEvent::Homed,
                    };
                    info!(?event, "head home, follower idle");
                    let _ = events.push(event);
                }
            }
        }
        out
    }

    fn waypoint(&self, index: usize) -> Option<Point2<f64>> {
        self.path.as_ref().and_then(|p| p.get(index))
    }

    fn return_home(&mut self, head: &mut CuttingHead, events: &mut FollowerEvents) {
        self.set_cutting(false, events);
        head.command(self.home, self.rates.fast_mm_s);
        self.transition(FollowerState::ReturnHome, events);
    }

    fn transition(&mut self, to: FollowerState, events: &mut FollowerEvents) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(?from, ?to, "follower transition");
        let _ = events.push(FollowerEvent::StateChanged { from, to });
    }

    fn set_cutting(&mut self, on: bool, events: &mut FollowerEvents) {
        if self.cutting == on {
            return;
        }
        self.cutting = on;
        let _ = events.push(FollowerEvent::CuttingChanged(on));
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
