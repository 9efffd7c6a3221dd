//! # Laser Cutter Simulator
//!
//! Headless run of one cut job: loads the cutter configuration, powers the
//! machine, seats a generated plate on the bed, cuts a preset shape or an
//! explicit waypoint list at a fixed time step, and reports the result.
//! Optionally exports the cut mask as PNG and a TOML run report.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use clap::Parser;
use cutter_common::config::{ConfigError, LogLevel};
use cutter_common::units::mm_to_m;
use cutter_control::config::{LoadedConfig, load_config};
use cutter_control::cutter::LaserCutter;
use cutter_control::feedback::FeedbackLog;
use cutter_control::material::{BodyKind, CuttableMaterial};
use cutter_control::mesh::MAX_PLATE_SUBDIVISIONS;
use cutter_control::path::WaypointPath;
use cutter_control::session::{StartOutcome, StartRejection};
use cutter_control::stats::SessionStats;
use nalgebra::{Isometry3, Translation3};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Laser cutter simulator
#[derive(Parser, Debug)]
#[command(name = "cutter_sim")]
#[command(version)]
#[command(about = "Headless two-axis laser cutter simulation")]
struct Args {
    /// Cutter configuration TOML. Stock defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Preset shape to cut.
    #[arg(long, default_value = "Square", conflicts_with = "points")]
    shape: String,

    /// Explicit waypoints [mm] as "x,y;x,y;...".
    #[arg(long, value_name = "POINTS")]
    points: Option<WaypointPath>,

    /// Simulation time step [s].
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Give up after this many ticks.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Plate mesh subdivisions per side.
    #[arg(
        long,
        default_value_t = 64,
        value_parser = clap::value_parser!(u32).range(1..=MAX_PLATE_SUBDIVISIONS as i64)
    )]
    subdivisions: u32,

    /// Bed origin in the world [mm] as "x,y,z".
    #[arg(long, default_value = "0,0,0", value_parser = parse_xyz)]
    bed_origin_mm: [f64; 3],

    /// Plate centre on the bed [mm] as "x,y".
    #[arg(long, default_value = "75,75", value_parser = parse_xy)]
    plate_center_mm: [f64; 2],

    /// Write the cut mask debug texture to this PNG.
    #[arg(long, value_name = "FILE")]
    mask_png: Option<PathBuf>,

    /// Write a TOML run report.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("time step must be positive, got {0}")]
    InvalidStep(f64),

    #[error("cut job rejected: {0:?}")]
    Rejected(StartRejection),

    #[error("cut job still running after {0} ticks")]
    Timeout(u64),

    #[error("nothing was cut, no mask to export")]
    NoMask,

    #[error("failed to write mask image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to encode report: {0}")]
    Report(#[from] toml::ser::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    ticks: u64,
    final_state: String,
    final_state_code: u8,
    head_mm: [f64; 2],
    /// Beam contact point in bed coordinates [m].
    beam_bed_m: [f64; 3],
    beam_on_count: usize,
    removed_cells: usize,
    remaining_vertices: usize,
    remaining_triangles: usize,
    dynamic_body: bool,
    stats: &'a SessionStats,
}

fn main() {
    let args = Args::parse();
    let loaded = match &args.config {
        Some(path) => load_config(path),
        None => Ok(LoadedConfig::default()),
    };
    let log_level = loaded
        .as_ref()
        .map(|l| l.config.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Laser cutter simulator v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(SimError::from)
        .and_then(|loaded| run(&args, &loaded));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args, loaded: &LoadedConfig) -> Result<(), SimError> {
    if !(args.dt.is_finite() && args.dt > 0.0) {
        return Err(SimError::InvalidStep(args.dt));
    }

    let [bx, by, bz] = args.bed_origin_mm.map(mm_to_m);
    let mut cutter = LaserCutter::from_loaded(loaded)
        .with_bed_frame(Isometry3::from(Translation3::new(bx, by, bz)));
    let feedback = Rc::new(RefCell::new(FeedbackLog::default()));
    cutter.attach_feedback(Box::new(feedback.clone()));

    cutter.set_power(true);
    cutter.set_door_open(false);
    let seat = cutter.work_area().seat_frame(args.plate_center_mm);
    cutter.place_material(CuttableMaterial::plate(
        "plate",
        seat,
        &loaded.config.material,
        args.subdivisions,
    ));

    let outcome = match &args.points {
        Some(path) => cutter.start(path.points()),
        None => cutter.start_shape(&args.shape),
    };
    if let StartOutcome::Rejected(reason) = outcome {
        if reason == StartRejection::UnknownShape {
            let available: Vec<&str> = cutter.shapes().names().collect();
            warn!(shape = %args.shape, ?available, "unknown shape");
        }
        return Err(SimError::Rejected(reason));
    }

    let ticks = cutter
        .run_until_idle(args.dt, args.max_ticks)
        .ok_or(SimError::Timeout(args.max_ticks))?;

    let stats = cutter.stats();
    info!(
        ticks,
        sim_time_s = stats.sim_time_s,
        beam_time_s = stats.beam_time_s,
        samples = stats.samples,
        rebuilds = stats.rebuilds,
        waypoints = stats.waypoints_reached,
        "cut job finished"
    );

    if let Some(path) = &args.mask_png {
        let mask = cutter
            .material()
            .and_then(|m| m.mask())
            .ok_or(SimError::NoMask)?;
        mask.texture().save(path)?;
        info!(path = %path.display(), removed = mask.removed_count(), "mask written");
    }

    if let Some(path) = &args.report {
        let beam_on_count = feedback.borrow().beam_on_count();
        write_report(path, &cutter, ticks, beam_on_count)?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}

fn write_report(
    path: &Path,
    cutter: &LaserCutter,
    ticks: u64,
    beam_on_count: usize,
) -> Result<(), SimError> {
    let material = cutter.material();
    let position = cutter.head().position();
    let beam = cutter
        .work_area()
        .grid_position(&cutter.head().contact_point());
    let report = RunReport {
        ticks,
        final_state: format!("{:?}", cutter.state()),
        final_state_code: cutter.state() as u8,
        head_mm: [position.x, position.y],
        beam_bed_m: [beam.x, beam.y, beam.z],
        beam_on_count,
        removed_cells: material
            .and_then(|m| m.mask())
            .map_or(0, |mask| mask.removed_count()),
        remaining_vertices: material.map_or(0, |m| m.mesh().vertex_count()),
        remaining_triangles: material.map_or(0, |m| m.mesh().triangle_count()),
        dynamic_body: material.is_some_and(|m| matches!(m.body(), BodyKind::Dynamic { .. })),
        stats: cutter.stats(),
    };
    std::fs::write(path, toml::to_string_pretty(&report)?)?;
    Ok(())
}

fn parse_xy(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("'{v}': {e}"))
    };
    Ok([parse(x)?, parse(y)?])
}

fn parse_xyz(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    let &[x, y, z] = parts.as_slice() else {
        return Err(format!("expected 'x,y,z', got '{s}'"));
    };
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("'{v}': {e}"))
    };
    Ok([parse(x)?, parse(y)?, parse(z)?])
}

fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
