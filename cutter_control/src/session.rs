//! Cutting session controller.
//!
//! The only place start preconditions are checked (power, door, material,
//! no active session). Once admitted, the session subscribes to the
//! interlocks; any sensor dropping to its unsafe state cancels the path at
//! the next tick boundary. The subscription is released when the follower
//! returns to idle.

use cutter_common::machine::CutterConfig;
use cutter_common::safety::Interlock;
use cutter_common::state::FollowerState;
use nalgebra::Point2;
use tracing::{debug, info, warn};

use crate::feedback::Feedback;
use crate::follower::{FeedRates, FollowerEvent, FollowerTick, PathFollower};
use crate::head::CuttingHead;
use crate::interlock::{InterlockMonitor, SubscriptionId};
use crate::material::CutTarget;
use crate::path::WaypointPath;
use crate::stats::SessionStats;
use crate::work_area::WorkArea;

/// Why a start request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    /// Fewer than two waypoints, or a non-finite one.
    InvalidPath,
    UnknownShape,
    PowerOff,
    DoorOpen,
    NoMaterial,
    SessionActive,
    /// Interlock subscriber table exhausted.
    SubscribersFull,
}

impl From<Interlock> for StartRejection {
    fn from(missing: Interlock) -> Self {
        match missing {
            Interlock::Power => Self::PowerOff,
            Interlock::Door => Self::DoorOpen,
            Interlock::Material => Self::NoMaterial,
        }
    }
}

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    Rejected(StartRejection),
}

impl StartOutcome {
    #[inline]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

/// Collaborators borrowed for one session call.
pub struct SessionContext<'a> {
    pub interlocks: &'a mut InterlockMonitor,
    pub work_area: &'a mut WorkArea,
}

#[derive(Debug)]
pub struct SessionController {
    head: CuttingHead,
    follower: PathFollower,
    rates: FeedRates,
    feedback: Feedback,
    subscription: Option<SubscriptionId>,
    stats: SessionStats,
}

impl SessionController {
    pub fn new(head: CuttingHead, home: Point2<f64>, rates: FeedRates) -> Self {
        Self {
            head,
            follower: PathFollower::new(home),
            rates,
            feedback: Feedback::default(),
            subscription: None,
            stats: SessionStats::new(),
        }
    }

    /// Head built from the axis sections, parked at the configured home.
    pub fn from_config(config: &CutterConfig) -> Self {
        let mut head = CuttingHead::new(&config.head_axis, &config.gantry_axis, &config.head);
        let [x, y] = config.home_mm();
        let home = Point2::new(x, y);
        head.reset_to(home);
        // Home as the axes will actually reach it.
        let home = head.position();
        Self::new(head, home, FeedRates::from_config(&config.motion))
    }

    #[inline]
    pub fn head(&self) -> &CuttingHead {
        &self.head
    }

    #[inline]
    pub fn head_mut(&mut self) -> &mut CuttingHead {
        &mut self.head
    }

    #[inline]
    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    #[inline]
    pub fn state(&self) -> FollowerState {
        self.follower.state()
    }

    #[inline]
    pub fn is_cutting(&self) -> bool {
        self.follower.is_cutting()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.follower.is_active()
    }

    #[inline]
    pub fn rates(&self) -> FeedRates {
        self.rates
    }

    #[inline]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[inline]
    pub fn feedback_mut(&mut self) -> &mut Feedback {
        &mut self.feedback
    }

    /// Whether an interlock subscription is currently held.
    #[inline]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Start cutting along `points` [mm].
    pub fn start(&mut self, points: &[Point2<f64>], ctx: &mut SessionContext<'_>) -> StartOutcome {
        match WaypointPath::new(points.to_vec()) {
            Ok(path) => self.start_path(path, ctx),
            Err(e) => {
                debug!(error = %e, "path not admitted");
                self.reject(StartRejection::InvalidPath)
            }
        }
    }

    /// Admit `path` if the machine is ready. A plain homing move in progress
    /// is interrupted; a running path is not.
    pub fn start_path(&mut self, path: WaypointPath, ctx: &mut SessionContext<'_>) -> StartOutcome {
        if self.follower.is_busy() {
            return self.reject(StartRejection::SessionActive);
        }
        if let Some(missing) = ctx.interlocks.flags().first_missing() {
            return self.reject(missing.into());
        }
        if !ctx.work_area.has_material() {
            return self.reject(StartRejection::NoMaterial);
        }

        let id = match ctx.interlocks.subscribe() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "cannot watch interlocks");
                return self.reject(StartRejection::SubscribersFull);
            }
        };
        let events = match self.follower.begin(path, &mut self.head, self.rates) {
            Ok(events) => events,
            Err(_) => {
                ctx.interlocks.unsubscribe(id);
                return self.reject(StartRejection::SessionActive);
            }
        };

        self.subscription = Some(id);
        self.stats.sessions_started += 1;
        info!(
            material = ctx.work_area.material().map(|m| m.name()).unwrap_or_default(),
            "cut session started"
        );
        self.dispatch(&events, ctx);
        StartOutcome::Started
    }

    /// Cancel the running path and return home. No-op when idle.
    pub fn stop(&mut self, ctx: &mut SessionContext<'_>) {
        let events = self.follower.cancel(&mut self.head);
        self.dispatch(&events, ctx);
    }

    pub fn go_home(&mut self, ctx: &mut SessionContext<'_>) {
        let events = self.follower.go_home(&mut self.head);
        self.dispatch(&events, ctx);
    }

    /// One simulation frame: react to interlock changes, then advance the
    /// follower (axes first, beam sample second).
    pub fn tick(&mut self, dt: f64, ctx: &mut SessionContext<'_>) -> FollowerTick {
        if let Some(id) = self.subscription {
            let changes = ctx.interlocks.drain(id);
            if let Some(lost) = changes.iter().find(|c| !c.engaged) {
                warn!(interlock = ?lost.interlock, "interlock lost during session");
                let events = self.follower.cancel(&mut self.head);
                self.dispatch(&events, ctx);
            }
        }

        let target = ctx
            .work_area
            .material_mut()
            .map(|m| m as &mut dyn CutTarget);
        let tick = self.follower.tick(dt, &mut self.head, target);
        self.stats.record_tick(dt, self.follower.is_cutting());
        self.dispatch(&tick.events, ctx);
        tick
    }

    pub(crate) fn reject(&mut self, reason: StartRejection) -> StartOutcome {
        self.stats.rejected_starts += 1;
        warn!(?reason, state = ?self.follower.state(), "start rejected");
        StartOutcome::Rejected(reason)
    }

    fn dispatch(&mut self, events: &[FollowerEvent], ctx: &mut SessionContext<'_>) {
        for event in events {
            self.stats.record_event(event);
            match event {
                FollowerEvent::CuttingChanged(on) => self.feedback.cutting_changed(*on),
                FollowerEvent::Finished { .. } | FollowerEvent::Homed => {
                    if let Some(id) = self.subscription.take() {
                        ctx.interlocks.unsubscribe(id);
                    }
                }
                _ => {}
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::CuttableMaterial;
    use cutter_common::machine::MaterialConfig;
    use cutter_common::safety::InterlockFlags;
    use nalgebra::Isometry3;

    struct Rig {
        session: SessionController,
        interlocks: InterlockMonitor,
        work_area: WorkArea,
    }

    impl Rig {
        fn ready() -> Self {
            let mut work_area = WorkArea::default();
            work_area.place(CuttableMaterial::plate(
                "sheet",
                Isometry3::identity(),
                &MaterialConfig::default(),
                4,
            ));
            Self {
                session: SessionController::from_config(&CutterConfig::default()),
                interlocks: InterlockMonitor::new(InterlockFlags::READY),
                work_area,
            }
        }

        fn start(&mut self, points: &[[f64; 2]]) -> StartOutcome {
            let points: Vec<_> = points.iter().map(|&[x, y]| Point2::new(x, y)).collect();
            let mut ctx = SessionContext {
                interlocks: &mut self.interlocks,
                work_area: &mut self.work_area,
            };
            self.session.start(&points, &mut ctx)
        }

        fn tick(&mut self) -> FollowerTick {
            let mut ctx = SessionContext {
                interlocks: &mut self.interlocks,
                work_area: &mut self.work_area,
            };
            self.session.tick(0.01, &mut ctx)
        }
    }

    const LINE: [[f64; 2]; 2] = [[0.0, 0.0], [20.0, 0.0]];

    #[test]
    fn short_path_is_rejected() {
        let mut rig = Rig::ready();
        assert_eq!(
            rig.start(&[[1.0, 1.0]]),
            StartOutcome::Rejected(StartRejection::InvalidPath)
        );
        assert!(!rig.session.is_active());
        assert_eq!(rig.session.stats().rejected_starts, 1);
    }

    #[test]
    fn each_interlock_blocks_start() {
        for (interlock, reason) in [
            (Interlock::Power, StartRejection::PowerOff),
            (Interlock::Door, StartRejection::DoorOpen),
            (Interlock::Material, StartRejection::NoMaterial),
        ] {
            let mut rig = Rig::ready();
            rig.interlocks.set(interlock, false);
            assert_eq!(rig.start(&LINE), StartOutcome::Rejected(reason));
            assert_eq!(rig.interlocks.subscriber_count(), 0);
        }
    }

    #[test]
    fn empty_socket_blocks_start() {
        let mut rig = Rig::ready();
        rig.work_area.remove();
        assert_eq!(
            rig.start(&LINE),
            StartOutcome::Rejected(StartRejection::NoMaterial)
        );
    }

    #[test]
    fn second_start_rejected_while_active() {
        let mut rig = Rig::ready();
        assert!(rig.start(&LINE).is_started());
        assert_eq!(
            rig.start(&[[5.0, 5.0], [6.0, 6.0]]),
            StartOutcome::Rejected(StartRejection::SessionActive)
        );
        assert_eq!(rig.interlocks.subscriber_count(), 1);
    }

    #[test]
    fn start_interrupts_plain_homing() {
        let mut rig = Rig::ready();
        rig.session.head_mut().reset_to(Point2::new(30.0, 30.0));
        let mut ctx = SessionContext {
            interlocks: &mut rig.interlocks,
            work_area: &mut rig.work_area,
        };
        rig.session.go_home(&mut ctx);
        assert_eq!(rig.session.state(), FollowerState::ReturnHome);

        assert!(rig.start(&LINE).is_started());
        assert_eq!(rig.session.state(), FollowerState::ApproachStart);
        assert!(rig.session.is_subscribed());
        while rig.session.is_active() {
            rig.tick();
        }
        assert_eq!(rig.session.stats().sessions_completed, 1);
        assert_eq!(rig.session.stats().homings, 0);
    }

    #[test]
    fn subscription_released_on_finish() {
        let mut rig = Rig::ready();
        assert!(rig.start(&LINE).is_started());
        assert!(rig.session.is_subscribed());
        let mut ticks = 0;
        while rig.session.is_active() {
            rig.tick();
            ticks += 1;
            assert!(ticks < 10_000);
        }
        assert!(!rig.session.is_subscribed());
        assert_eq!(rig.interlocks.subscriber_count(), 0);
        assert_eq!(rig.session.stats().sessions_completed, 1);
    }

    #[test]
    fn door_open_cancels_within_one_tick() {
        let mut rig = Rig::ready();
        assert!(rig.start(&[[0.0, 0.0], [50.0, 0.0], [50.0, 50.0]]).is_started());
        for _ in 0..5 {
            rig.tick();
        }
        assert!(rig.session.is_cutting());

        rig.interlocks.set(Interlock::Door, false);
        rig.tick();
        assert_eq!(rig.session.state(), FollowerState::ReturnHome);
        assert!(!rig.session.is_cutting());
    }

    #[test]
    fn regained_interlock_does_not_cancel() {
        let mut rig = Rig::ready();
        rig.interlocks.set(Interlock::Door, false);
        rig.interlocks.set(Interlock::Door, true);
        assert!(rig.start(&LINE).is_started());
        rig.tick();
        assert_eq!(rig.session.state(), FollowerState::Cutting);
    }

    #[test]
    fn cutting_samples_the_placed_material() {
        let mut rig = Rig::ready();
        assert!(rig.start(&[[0.0, 0.0], [0.0, 0.0], [20.0, 0.0]]).is_started());
        while rig.session.is_active() {
            rig.tick();
        }
        let stats = rig.session.stats();
        assert!(stats.samples > 0);
        assert!(rig.work_area.material().unwrap().mask().is_some());
    }
}
