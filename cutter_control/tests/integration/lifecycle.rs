//! Integration test: full cut job lifecycle.
//!
//! Idle → ApproachStart → Cutting → ReturnHome → Idle, with the beam on only
//! between the first and last waypoint.

use std::cell::RefCell;
use std::rc::Rc;

use cutter_common::machine::{CutterConfig, MaterialConfig};
use cutter_common::state::FollowerState;
use cutter_control::cutter::LaserCutter;
use cutter_control::feedback::{FeedbackEvent, FeedbackLog};
use cutter_control::follower::FollowerEvent;
use cutter_control::material::CuttableMaterial;
use cutter_control::session::{StartOutcome, StartRejection};
use nalgebra::{Isometry3, Point2};

// ── Helpers ─────────────────────────────────────────────────────────

const DT: f64 = 0.01;

fn ready_cutter() -> LaserCutter {
    let mut cutter = LaserCutter::from_config(&CutterConfig::default()).unwrap();
    cutter.set_power(true);
    cutter.set_door_open(false);
    cutter.place_material(CuttableMaterial::plate(
        "sheet",
        Isometry3::identity(),
        &MaterialConfig::default(),
        16,
    ));
    cutter
}

fn points(raw: &[[f64; 2]]) -> Vec<Point2<f64>> {
    raw.iter().map(|&[x, y]| Point2::new(x, y)).collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn three_point_path_cuts_only_interior_segments() {
    let mut cutter = ready_cutter();
    assert_eq!(
        cutter.start(&points(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]])),
        StartOutcome::Started
    );

    let mut visited = vec![cutter.state()];
    let mut return_home_entries = 0;
    let mut ticks = 0;
    while cutter.is_active() {
        let tick = cutter.tick(DT);
        for event in &tick.events {
            if let FollowerEvent::StateChanged { to, .. } = event {
                visited.push(*to);
                if *to == FollowerState::ReturnHome {
                    return_home_entries += 1;
                }
            }
        }
        assert_eq!(
            cutter.is_cutting(),
            cutter.state() == FollowerState::Cutting,
            "beam state out of step in {:?}",
            cutter.state()
        );
        ticks += 1;
        assert!(ticks < 10_000, "job never finished");
    }

    assert_eq!(
        visited,
        [
            FollowerState::ApproachStart,
            FollowerState::Cutting,
            FollowerState::ReturnHome,
            FollowerState::Idle
        ]
    );
    assert_eq!(return_home_entries, 1);
    assert_eq!(cutter.stats().waypoints_reached, 2);
    assert_eq!(cutter.head().position(), Point2::origin());
}

#[test]
fn feedback_brackets_the_cut() {
    let log = Rc::new(RefCell::new(FeedbackLog::default()));
    let mut cutter = LaserCutter::from_config(&CutterConfig::default()).unwrap();
    cutter.attach_feedback(Box::new(log.clone()));
    cutter.set_power(true);
    cutter.place_material(CuttableMaterial::plate(
        "sheet",
        Isometry3::identity(),
        &MaterialConfig::default(),
        4,
    ));

    assert!(cutter.start_shape("Triangle").is_started());
    cutter.run_until_idle(DT, 100_000).unwrap();

    assert_eq!(
        log.borrow().events(),
        &[
            FeedbackEvent::Power(true),
            FeedbackEvent::Cutting(true),
            FeedbackEvent::Cutting(false),
        ]
    );
}

#[test]
fn presets_run_back_to_back() {
    let mut cutter = ready_cutter();
    for shape in ["Square", "triangle"] {
        assert!(cutter.start_shape(shape).is_started());
        cutter.run_until_idle(1.0 / 60.0, 100_000).unwrap();
        assert_eq!(cutter.state(), FollowerState::Idle);
    }
    let stats = cutter.stats();
    assert_eq!(stats.sessions_started, 2);
    assert_eq!(stats.sessions_completed, 2);
    // Square has 4 cut segments, Triangle 3.
    assert_eq!(stats.waypoints_reached, 7);
    assert_eq!(cutter.interlocks().subscriber_count(), 0);
}

#[test]
fn new_path_rejected_while_running() {
    let mut cutter = ready_cutter();
    assert!(cutter.start_shape("Square").is_started());
    cutter.tick(DT);
    assert_eq!(
        cutter.start_shape("Triangle"),
        StartOutcome::Rejected(StartRejection::SessionActive)
    );

    // Redirecting requires an explicit stop first.
    cutter.stop();
    cutter.run_until_idle(DT, 100_000).unwrap();
    assert!(cutter.start_shape("Triangle").is_started());
}

#[test]
fn short_path_is_a_noop() {
    let mut cutter = ready_cutter();
    assert_eq!(
        cutter.start(&points(&[[10.0, 10.0]])),
        StartOutcome::Rejected(StartRejection::InvalidPath)
    );
    assert_eq!(cutter.state(), FollowerState::Idle);
    assert_eq!(cutter.head().target(), Point2::origin());
}

#[test]
fn out_of_range_waypoints_are_clamped() {
    let mut cutter = ready_cutter();
    assert!(cutter.start(&points(&[[0.0, 0.0], [250.0, 0.0]])).is_started());
    let mut farthest: f64 = 0.0;
    while cutter.is_active() {
        cutter.tick(0.05);
        farthest = farthest.max(cutter.head().position().x);
    }
    assert_eq!(farthest, 100.0);
}
