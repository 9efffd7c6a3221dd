//! Cut-mask rasterizer: a monotonic boolean grid over normalized surface
//! coordinates `[0,1]×[0,1]`.
//!
//! Cells are addressed `(x, y)` with `x` along `u` and `y` along `v`. Once a
//! cell is marked removed it stays removed for the lifetime of the mask.
//! A debug RGBA texture mirrors the mask (cut cells red, others clear).

use image::{Rgba, RgbaImage};
use nalgebra::{Isometry3, Point2, Point3, Vector2};

/// Debug texture colour of a removed cell.
pub const CUT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

// ─── Surface Mapping ────────────────────────────────────────────────

/// Maps points onto the normalized surface coordinates of a cuttable sheet.
///
/// The sheet occupies `[-w/2, w/2] × [-h/2, h/2]` in its local XY plane,
/// `size = (w, h)`. With the default unit size this is the classic
/// `local + 0.5` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMapper {
    /// World-from-local transform of the sheet.
    frame: Isometry3<f64>,
    /// Local extent of the sheet.
    size: Vector2<f64>,
}

impl SurfaceMapper {
    /// Non-positive or non-finite extents fall back to 1.0.
    pub fn new(frame: Isometry3<f64>, size: [f64; 2]) -> Self {
        let sanitize = |s: f64| if s.is_finite() && s > 0.0 { s } else { 1.0 };
        Self {
            frame,
            size: Vector2::new(sanitize(size[0]), sanitize(size[1])),
        }
    }

    /// Unit-square sheet at `frame`.
    pub fn unit(frame: Isometry3<f64>) -> Self {
        Self::new(frame, [1.0, 1.0])
    }

    #[inline]
    pub fn frame(&self) -> &Isometry3<f64> {
        &self.frame
    }

    pub fn set_frame(&mut self, frame: Isometry3<f64>) {
        self.frame = frame;
    }

    #[inline]
    pub fn size(&self) -> Vector2<f64> {
        self.size
    }

    /// Local sheet point → clamped `(u, v)`.
    pub fn local_to_surface_uv(&self, local: &Point3<f64>) -> Point2<f64> {
        let u = local.x / self.size.x + 0.5;
        let v = local.y / self.size.y + 0.5;
        Point2::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0))
    }

    /// World point → sheet local frame → clamped `(u, v)`.
    pub fn world_to_surface_uv(&self, world: &Point3<f64>) -> Point2<f64> {
        self.local_to_surface_uv(&self.frame.inverse_transform_point(world))
    }
}

// ─── Cut Mask ───────────────────────────────────────────────────────

/// Square occupancy grid of removed cells.
#[derive(Debug, Clone)]
pub struct CutMask {
    resolution: usize,
    cells: Vec<bool>,
    removed: usize,
    texture: RgbaImage,
}

impl CutMask {
    /// Create an uncut mask with `resolution × resolution` cells (at least 1).
    pub fn new(resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let n = resolution as usize;
        Self {
            resolution: n,
            cells: vec![false; n * n],
            removed: 0,
            texture: RgbaImage::new(resolution, resolution),
        }
    }

    /// Cells per side.
    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of removed cells.
    #[inline]
    pub fn removed_count(&self) -> usize {
        self.removed
    }

    /// Debug texture mirroring the mask. Row 0 is the top (`v = 1`) edge.
    #[inline]
    pub fn texture(&self) -> &RgbaImage {
        &self.texture
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.resolution + x
    }

    /// Grid cell nearest to `uv`, clamped into the grid.
    pub fn cell_of(&self, uv: Point2<f64>) -> (usize, usize) {
        let n = self.resolution as f64;
        let last = self.resolution - 1;
        let axis = |t: f64| {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            ((t * n).round() as usize).min(last)
        };
        (axis(uv.x), axis(uv.y))
    }

    /// Whether cell `(x, y)` is removed. Out-of-range cells are not.
    #[inline]
    pub fn is_removed(&self, x: usize, y: usize) -> bool {
        x < self.resolution && y < self.resolution && self.cells[self.index(x, y)]
    }

    /// Whether the cell under `uv` is removed.
    #[inline]
    pub fn is_removed_uv(&self, uv: Point2<f64>) -> bool {
        let (x, y) = self.cell_of(uv);
        self.is_removed(x, y)
    }

    /// Paint a filled disc centred at `uv` with radius `radius_uv` given as
    /// a fraction of the surface side (`radius_uv * resolution` cells).
    ///
    /// Returns whether any cell was newly removed.
    pub fn paint_disc(&mut self, uv: Point2<f64>, radius_uv: f64) -> bool {
        let (cx, cy) = self.cell_of(uv);
        let radius_cells = radius_uv * self.resolution as f64;
        self.paint_disc_cells(Point2::new(cx as f64, cy as f64), radius_cells)
    }

    /// Paint every cell whose centre lies within `radius` (grid cells,
    /// Euclidean, boundary inclusive) of `center`.
    ///
    /// Returns whether any cell was newly removed.
    pub fn paint_disc_cells(&mut self, center: Point2<f64>, radius: f64) -> bool {
        if !(center.x.is_finite() && center.y.is_finite() && radius.is_finite()) || radius < 0.0 {
            return false;
        }

        let last = (self.resolution - 1) as f64;
        let x0 = (center.x - radius).floor().max(0.0);
        let x1 = (center.x + radius).ceil().min(last);
        let y0 = (center.y - radius).floor().max(0.0);
        let y1 = (center.y + radius).ceil().min(last);
        if x0 > x1 || y0 > y1 {
            return false;
        }

        let r2 = radius * radius;
        let mut changed = false;
        for y in y0 as usize..=y1 as usize {
            let dy = y as f64 - center.y;
            for x in x0 as usize..=x1 as usize {
                let dx = x as f64 - center.x;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let i = self.index(x, y);
                if !self.cells[i] {
                    self.cells[i] = true;
                    self.removed += 1;
                    let row = (self.resolution - 1 - y) as u32;
                    self.texture.put_pixel(x as u32, row, CUT_COLOR);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Iterate removed cells as `(x, y)`.
    pub fn removed_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.resolution;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cut)| **cut)
            .map(move |(i, _)| (i % n, i / n))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
