//! Integration test: configuration files drive the assembled machine.

use std::io::Write;

use cutter_common::config::ConfigError;
use cutter_common::state::FollowerState;
use cutter_control::config::load_config;
use cutter_control::cutter::LaserCutter;
use cutter_control::material::CuttableMaterial;
use nalgebra::{Isometry3, Point2};
use tempfile::NamedTempFile;

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn configured_shape_and_speeds() {
    let file = write_config(
        r#"
        [shared]
        service_name = "slot-cutter"

        [motion]
        cutting_speed_mm_s = 25.0
        fast_speed_mm_s = 100.0

        [[shapes]]
        name = "Slot"
        points = [[10.0, 10.0], [60.0, 10.0]]
        "#,
    );
    let loaded = load_config(file.path()).unwrap();
    let mut cutter = LaserCutter::from_loaded(&loaded);
    cutter.set_power(true);
    cutter.place_material(CuttableMaterial::plate(
        "sheet",
        Isometry3::identity(),
        &loaded.config.material,
        8,
    ));

    assert!(cutter.start_shape("slot").is_started());
    while !cutter.is_cutting() {
        cutter.tick(0.01);
    }
    assert_eq!(cutter.head().head_axis().rate(), 25.0);

    cutter.run_until_idle(0.01, 100_000).unwrap();
    assert_eq!(cutter.state(), FollowerState::Idle);
    assert_eq!(cutter.stats().waypoints_reached, 1);
}

#[test]
fn configured_home_is_used_for_return() {
    let file = write_config(
        r#"
        [motion]
        home_mm = [20.0, 30.0]
        "#,
    );
    let loaded = load_config(file.path()).unwrap();
    let mut cutter = LaserCutter::from_loaded(&loaded);
    assert_eq!(cutter.head().position(), Point2::new(20.0, 30.0));

    cutter.set_power(true);
    cutter.place_material(CuttableMaterial::plate(
        "sheet",
        Isometry3::identity(),
        &loaded.config.material,
        8,
    ));
    assert!(cutter.start_shape("Triangle").is_started());
    cutter.run_until_idle(0.01, 100_000).unwrap();
    assert_eq!(cutter.head().position(), Point2::new(20.0, 30.0));
}

#[test]
fn home_outside_travel_is_clamped() {
    let file = write_config(
        r#"
        [motion]
        home_mm = [-50.0, 900.0]
        "#,
    );
    let loaded = load_config(file.path()).unwrap();
    let cutter = LaserCutter::from_loaded(&loaded);
    assert_eq!(cutter.head().position(), Point2::new(0.0, 500.0));
}

#[test]
fn invalid_material_rejected() {
    let file = write_config(
        r#"
        [material]
        mask_resolution = 2
        "#,
    );
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn malformed_toml_rejected() {
    let file = write_config("[motion\ncutting_speed_mm_s = ");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}
