//! The assembled laser cutter: interlocks, work area socket, cutting head
//! session and the preset shape library behind one tick-driven facade.

use cutter_common::config::ConfigError;
use cutter_common::machine::CutterConfig;
use cutter_common::safety::{Interlock, InterlockFlags};
use cutter_common::state::FollowerState;
use nalgebra::{Isometry3, Point2};
use tracing::info;

use crate::config::LoadedConfig;
use crate::feedback::FeedbackSink;
use crate::follower::FollowerTick;
use crate::head::CuttingHead;
use crate::interlock::InterlockMonitor;
use crate::material::CuttableMaterial;
use crate::session::{SessionContext, SessionController, StartOutcome, StartRejection};
use crate::shapes::ShapeLibrary;
use crate::stats::SessionStats;
use crate::work_area::WorkArea;

#[derive(Debug)]
pub struct LaserCutter {
    interlocks: InterlockMonitor,
    work_area: WorkArea,
    session: SessionController,
    shapes: ShapeLibrary,
}

impl LaserCutter {
    /// Validate `config` and build a powered-off cutter with the door closed
    /// and an empty socket.
    pub fn from_config(config: &CutterConfig) -> Result<Self, ConfigError> {
        let loaded = crate::config::finish(config.clone())?;
        info!(
            service = %loaded.config.shared.service_name,
            shapes = loaded.shapes.len(),
            "laser cutter assembled"
        );
        Ok(Self::from_loaded(&loaded))
    }

    /// Build from an already validated configuration.
    pub fn from_loaded(loaded: &LoadedConfig) -> Self {
        Self {
            interlocks: InterlockMonitor::new(InterlockFlags::default()),
            work_area: WorkArea::default(),
            session: SessionController::from_config(&loaded.config),
            shapes: loaded.shapes.clone(),
        }
    }

    /// Place the bed (and the head riding on it) in the world.
    pub fn with_bed_frame(mut self, bed_frame: Isometry3<f64>) -> Self {
        self.work_area.set_bed_frame(bed_frame);
        self.session.head_mut().set_bed_frame(bed_frame);
        self
    }

    /// Split borrow into the session and its collaborators.
    fn session_ctx(&mut self) -> (&mut SessionController, SessionContext<'_>) {
        (
            &mut self.session,
            SessionContext {
                interlocks: &mut self.interlocks,
                work_area: &mut self.work_area,
            },
        )
    }

    pub fn attach_feedback(&mut self, sink: Box<dyn FeedbackSink>) {
        self.session.feedback_mut().attach(sink);
    }

    // ─── Sensors ────────────────────────────────────────────────────

    /// Toggle main power. Switching off also sends the head home, whether
    /// or not a cut is running.
    pub fn set_power(&mut self, on: bool) {
        if !self.interlocks.set(Interlock::Power, on) {
            return;
        }
        self.session.feedback_mut().power_changed(on);
        // A running session cancels itself on its next tick.
        if !on && !self.session.is_active() {
            let (session, mut ctx) = self.session_ctx();
            session.go_home(&mut ctx);
        }
    }

    #[inline]
    pub fn is_powered(&self) -> bool {
        self.interlocks.is_set(Interlock::Power)
    }

    pub fn set_door_open(&mut self, open: bool) {
        self.interlocks.set(Interlock::Door, !open);
    }

    #[inline]
    pub fn is_door_open(&self) -> bool {
        !self.interlocks.is_set(Interlock::Door)
    }

    /// Seat a sheet, returning the one it replaces. Swapping sheets reads as
    /// a removal followed by a placement to anything watching the socket.
    pub fn place_material(&mut self, material: CuttableMaterial) -> Option<CuttableMaterial> {
        if self.work_area.has_material() {
            self.interlocks.set(Interlock::Material, false);
        }
        let previous = self.work_area.place(material);
        self.interlocks.set(Interlock::Material, true);
        previous
    }

    pub fn remove_material(&mut self) -> Option<CuttableMaterial> {
        let removed = self.work_area.remove();
        self.interlocks.set(Interlock::Material, false);
        removed
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Start cutting along `points` [mm].
    pub fn start(&mut self, points: &[Point2<f64>]) -> StartOutcome {
        let (session, mut ctx) = self.session_ctx();
        session.start(points, &mut ctx)
    }

    /// Start a preset from the shape library (case-insensitive name).
    pub fn start_shape(&mut self, name: &str) -> StartOutcome {
        let Some(path) = self.shapes.find(name).cloned() else {
            return self.session.reject(StartRejection::UnknownShape);
        };
        let (session, mut ctx) = self.session_ctx();
        session.start_path(path, &mut ctx)
    }

    pub fn stop(&mut self) {
        let (session, mut ctx) = self.session_ctx();
        session.stop(&mut ctx);
    }

    pub fn go_home(&mut self) {
        let (session, mut ctx) = self.session_ctx();
        session.go_home(&mut ctx);
    }

    /// Advance the machine by one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> FollowerTick {
        let (session, mut ctx) = self.session_ctx();
        session.tick(dt, &mut ctx)
    }

    /// Tick until the head is idle. Returns the number of ticks taken, or
    /// `None` if still active after `max_ticks`.
    pub fn run_until_idle(&mut self, dt: f64, max_ticks: u64) -> Option<u64> {
        for n in 0..max_ticks {
            if !self.session.is_active() {
                return Some(n);
            }
            self.tick(dt);
        }
        (!self.session.is_active()).then_some(max_ticks)
    }

    // ─── Status ─────────────────────────────────────────────────────

    #[inline]
    pub fn head(&self) -> &CuttingHead {
        self.session.head()
    }

    #[inline]
    pub fn state(&self) -> FollowerState {
        self.session.state()
    }

    #[inline]
    pub fn is_cutting(&self) -> bool {
        self.session.is_cutting()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    #[inline]
    pub fn interlocks(&self) -> &InterlockMonitor {
        &self.interlocks
    }

    #[inline]
    pub fn work_area(&self) -> &WorkArea {
        &self.work_area
    }

    #[inline]
    pub fn material(&self) -> Option<&CuttableMaterial> {
        self.work_area.material()
    }

    #[inline]
    pub fn shapes(&self) -> &ShapeLibrary {
        &self.shapes
    }

    #[inline]
    pub fn stats(&self) -> &SessionStats {
        self.session.stats()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
