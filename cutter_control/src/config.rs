//! Cutter configuration loading with cross-section checks.
//!
//! Section-level bounds live in [`CutterConfig::validate`]; this module adds
//! the checks that need more than one section (unique shape names) and
//! warns about values that will be silently clamped at runtime.

use std::collections::HashSet;
use std::path::Path;

use cutter_common::config::{ConfigError, ConfigLoader};
use cutter_common::machine::{AxisConfig, CutterConfig};
use tracing::warn;

use crate::shapes::ShapeLibrary;

/// Validated configuration plus the shape library it describes.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CutterConfig,
    pub shapes: ShapeLibrary,
}

impl Default for LoadedConfig {
    /// Stock cutter with the built-in shapes only.
    fn default() -> Self {
        Self {
            config: CutterConfig::default(),
            shapes: ShapeLibrary::builtin(),
        }
    }
}

/// Load and validate a cutter TOML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    finish(CutterConfig::load(path)?)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(toml: &str) -> Result<LoadedConfig, ConfigError> {
    finish(CutterConfig::from_toml_str(toml)?)
}

/// Every validation step a parsed config goes through, whichever way it
/// entered.
pub(crate) fn finish(config: CutterConfig) -> Result<LoadedConfig, ConfigError> {
    config.validate()?;
    validate_shape_names(&config)?;
    warn_clamped(&config);
    let shapes = ShapeLibrary::with_configured(&config.shapes)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    Ok(LoadedConfig { config, shapes })
}

/// Configured shape names must be unique (case-insensitive).
fn validate_shape_names(config: &CutterConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for shape in &config.shapes {
        if !seen.insert(shape.name.to_ascii_lowercase()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate shape name '{}'",
                shape.name
            )));
        }
    }
    Ok(())
}

fn outside(axis: &AxisConfig, v: f64) -> bool {
    v < axis.min_mm || v > axis.max_mm
}

fn warn_clamped(config: &CutterConfig) {
    let [hx, hy] = config.home_mm();
    if outside(&config.head_axis, hx) || outside(&config.gantry_axis, hy) {
        warn!(home_mm = ?[hx, hy], "home position outside axis travel, will be clamped");
    }
    for shape in &config.shapes {
        let clipped = shape
            .points
            .iter()
            .any(|&[x, y]| outside(&config.head_axis, x) || outside(&config.gantry_axis, y));
        if clipped {
            warn!(shape = %shape.name, "shape leaves axis travel, points will be clamped");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
