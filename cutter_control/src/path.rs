//! Waypoint paths in machine millimeters (`x` → head, `y` → gantry).

use std::str::FromStr;

use cutter_common::consts::MIN_PATH_POINTS;
use nalgebra::Point2;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("path needs at least {min} points, got {0}", min = MIN_PATH_POINTS)]
    TooShort(usize),

    #[error("waypoint {0} is not finite")]
    NonFinite(usize),

    #[error("cannot parse waypoint '{0}', expected 'x,y'")]
    Parse(String),
}

/// Immutable, validated list of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointPath {
    points: Vec<Point2<f64>>,
}

impl WaypointPath {
    pub fn new(points: Vec<Point2<f64>>) -> Result<Self, PathError> {
        if points.len() < MIN_PATH_POINTS {
            return Err(PathError::TooShort(points.len()));
        }
        if let Some(i) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(PathError::NonFinite(i));
        }
        Ok(Self { points })
    }

    pub fn from_mm(points: &[[f64; 2]]) -> Result<Self, PathError> {
        Self::new(points.iter().map(|&[x, y]| Point2::new(x, y)).collect())
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Point2<f64>> {
        self.points.get(index).copied()
    }

    #[inline]
    pub fn first(&self) -> Point2<f64> {
        self.points[0]
    }

    /// Sum of segment lengths [mm].
    pub fn length_mm(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

/// Parses `"x,y;x,y;..."`.
impl FromStr for WaypointPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let points = s
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| -> Result<Point2<f64>, PathError> {
                let (x, y) = p
                    .split_once(',')
                    .ok_or_else(|| PathError::Parse(p.to_string()))?;
                let parse = |v: &str| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|_| PathError::Parse(p.to_string()))
                };
                Ok(Point2::new(parse(x)?, parse(y)?))
            })
            .collect::<Result<Vec<_>, PathError>>()?;
        Self::new(points)
    }
}
