//! Integration test: interlock-driven cancellation.
//!
//! Losing power, opening the door or pulling the material mid-cut sends the
//! head straight home and skips the remaining waypoints.

use cutter_common::machine::{CutterConfig, MaterialConfig};
use cutter_common::safety::Interlock;
use cutter_common::state::FollowerState;
use cutter_control::cutter::LaserCutter;
use cutter_control::follower::FollowerEvent;
use cutter_control::material::CuttableMaterial;
use cutter_control::session::{StartOutcome, StartRejection};
use nalgebra::{Isometry3, Point2};

// ── Helpers ─────────────────────────────────────────────────────────

const DT: f64 = 0.01;

fn sheet() -> CuttableMaterial {
    CuttableMaterial::plate("sheet", Isometry3::identity(), &MaterialConfig::default(), 8)
}

fn cutting_square() -> LaserCutter {
    let mut cutter = LaserCutter::from_config(&CutterConfig::default()).unwrap();
    cutter.set_power(true);
    cutter.place_material(sheet());
    assert!(cutter.start_shape("Square").is_started());
    while !cutter.is_cutting() {
        cutter.tick(DT);
    }
    // Partway along the first cut segment.
    for _ in 0..20 {
        cutter.tick(DT);
    }
    assert_eq!(cutter.state(), FollowerState::Cutting);
    cutter
}

/// Run to idle, returning every waypoint reached on the way.
fn finish(cutter: &mut LaserCutter) -> Vec<usize> {
    let mut reached = Vec::new();
    let mut ticks = 0;
    while cutter.is_active() {
        for event in &cutter.tick(DT).events {
            if let FollowerEvent::WaypointReached(i) = event {
                reached.push(*i);
            }
        }
        assert!(!cutter.is_cutting());
        ticks += 1;
        assert!(ticks < 100_000);
    }
    reached
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn door_open_mid_cut_returns_home() {
    let mut cutter = cutting_square();
    cutter.set_door_open(true);
    cutter.tick(DT);
    assert_eq!(cutter.state(), FollowerState::ReturnHome);
    assert!(!cutter.is_cutting());
    assert_eq!(cutter.head().target(), Point2::origin());

    assert!(finish(&mut cutter).is_empty());
    assert_eq!(cutter.head().position(), Point2::origin());
    assert_eq!(cutter.stats().sessions_cancelled, 1);
    assert_eq!(cutter.interlocks().subscriber_count(), 0);
}

#[test]
fn power_loss_mid_cut_returns_home() {
    let mut cutter = cutting_square();
    cutter.set_power(false);
    cutter.tick(DT);
    assert_eq!(cutter.state(), FollowerState::ReturnHome);
    assert!(finish(&mut cutter).is_empty());
    assert!(!cutter.is_powered());
}

#[test]
fn material_removed_mid_cut_returns_home() {
    let mut cutter = cutting_square();
    let removed = cutter.remove_material().unwrap();
    assert!(removed.mask().is_some());
    cutter.tick(DT);
    assert_eq!(cutter.state(), FollowerState::ReturnHome);
    finish(&mut cutter);
    assert!(!cutter.interlocks().is_set(Interlock::Material));
}

#[test]
fn door_closed_again_does_not_resume() {
    let mut cutter = cutting_square();
    cutter.set_door_open(true);
    cutter.set_door_open(false);
    cutter.tick(DT);
    assert_eq!(cutter.state(), FollowerState::ReturnHome);
}

#[test]
fn explicit_stop_mid_cut() {
    let mut cutter = cutting_square();
    cutter.stop();
    // Takes effect immediately, no tick needed.
    assert_eq!(cutter.state(), FollowerState::ReturnHome);
    assert!(!cutter.is_cutting());
    assert!(finish(&mut cutter).is_empty());
}

#[test]
fn power_off_while_idle_runs_homing() {
    let mut cutter = LaserCutter::from_config(&CutterConfig::default()).unwrap();
    cutter.set_power(true);
    cutter.set_power(false);
    assert_eq!(cutter.state(), FollowerState::ReturnHome);
    // Already home: settles on the next tick.
    assert_eq!(cutter.run_until_idle(DT, 100), Some(1));
    assert_eq!(cutter.head().position(), Point2::origin());
    assert_eq!(cutter.stats().sessions_started, 0);
    assert_eq!(cutter.stats().homings, 1);
}

#[test]
fn every_precondition_checked_at_start() {
    let mut cutter = LaserCutter::from_config(&CutterConfig::default()).unwrap();
    assert_eq!(
        cutter.start_shape("Square"),
        StartOutcome::Rejected(StartRejection::PowerOff)
    );
    cutter.set_power(true);
    cutter.set_door_open(true);
    assert_eq!(
        cutter.start_shape("Square"),
        StartOutcome::Rejected(StartRejection::DoorOpen)
    );
    cutter.set_door_open(false);
    assert_eq!(
        cutter.start_shape("Square"),
        StartOutcome::Rejected(StartRejection::NoMaterial)
    );
    cutter.place_material(sheet());
    assert!(cutter.start_shape("Square").is_started());
    assert_eq!(cutter.stats().rejected_starts, 3);
}
