//! Named preset paths: two built-ins plus any configured extras.

use cutter_common::machine::ShapeConfig;

use crate::path::{PathError, WaypointPath};

/// Unit square from (50,50) to (100,100), closed.
pub const SQUARE_MM: [[f64; 2]; 5] = [
    [50.0, 50.0],
    [100.0, 50.0],
    [100.0, 100.0],
    [50.0, 100.0],
    [50.0, 50.0],
];

/// Right triangle in the upper right of the square, closed.
pub const TRIANGLE_MM: [[f64; 2]; 4] = [[100.0, 50.0], [100.0, 100.0], [50.0, 100.0], [100.0, 50.0]];

#[derive(Debug, Clone, PartialEq)]
pub struct PresetShape {
    pub name: String,
    pub path: WaypointPath,
}

#[derive(Debug, Clone)]
pub struct ShapeLibrary {
    shapes: Vec<PresetShape>,
}

impl ShapeLibrary {
    /// Square and Triangle.
    pub fn builtin() -> Self {
        let mut lib = Self { shapes: Vec::new() };
        // Constant data, always valid.
        if let Ok(path) = WaypointPath::from_mm(&SQUARE_MM) {
            lib.insert("Square", path);
        }
        if let Ok(path) = WaypointPath::from_mm(&TRIANGLE_MM) {
            lib.insert("Triangle", path);
        }
        lib
    }

    /// Built-ins extended by `extra`. A configured shape with a built-in
    /// name replaces it.
    pub fn with_configured(extra: &[ShapeConfig]) -> Result<Self, PathError> {
        let mut lib = Self::builtin();
        for shape in extra {
            lib.insert(&shape.name, WaypointPath::from_mm(&shape.points)?);
        }
        Ok(lib)
    }

    /// Add or replace (case-insensitive name match).
    pub fn insert(&mut self, name: &str, path: WaypointPath) {
        match self
            .shapes
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.path = path,
            None => self.shapes.push(PresetShape {
                name: name.to_string(),
                path,
            }),
        }
    }

    /// Case-insensitive lookup.
    pub fn find(&self, name: &str) -> Option<&WaypointPath> {
        self.shapes
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| &s.path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Default for ShapeLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
