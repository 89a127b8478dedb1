//! # Diagnostics
//!
//! Text dumps of grids and slices, plus the [`DebugDraw`] hook the
//! voxelizer reports every classified sample to.

use std::fmt::Write as _;

use cloudslicer_shared::{IntVec3, Vec3, ASCII_SOLID_THRESHOLD};

use crate::grid::OccupancyGrid;
use crate::slice::Slice;

/// Receives one call per lattice sample.
///
/// Implementations typically draw a marker per sample (solid vs. empty).
pub trait DebugDraw {
    /// Called with the world-space sample point and its classification.
    fn sample(&mut self, point: Vec3, occupied: bool);
}

/// Records samples in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleRecorder {
    /// Samples in the order they were reported.
    pub samples: Vec<(Vec3, bool)>,
}

impl SampleRecorder {
    /// Number of samples reported as occupied.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.samples.iter().filter(|(_, occupied)| *occupied).count()
    }
}

impl DebugDraw for SampleRecorder {
    fn sample(&mut self, point: Vec3, occupied: bool) {
        self.samples.push((point, occupied));
    }
}

/// Renders a grid layer by layer.
///
/// Each Z layer starts with a `Z=<k>` line followed by one row per Y with
/// `X` for occupied and `.` for empty points.
#[must_use]
pub fn grid_to_ascii(grid: &OccupancyGrid) -> String {
    let d = grid.density();
    let mut out = String::with_capacity(grid.len() + (d.y.max(0) as usize + 8) * d.z.max(0) as usize);
    for z in 0..d.z {
        let _ = writeln!(out, "Z={z}");
        for y in 0..d.y {
            for x in 0..d.x {
                out.push(if grid.get(IntVec3::new(x, y, z)) { 'X' } else { '.' });
            }
            out.push('\n');
        }
    }
    out
}

/// Renders a slice as rows of its width: `X` at or above 1, `0` below.
#[must_use]
pub fn slice_to_ascii(slice: &Slice) -> String {
    let width = slice.width();
    if width == 0 {
        return String::new();
    }
    let mut out = String::with_capacity(slice.data().len() + slice.height());
    for row in slice.data().chunks(width) {
        for &value in row {
            out.push(solid_char(value));
        }
        out.push('\n');
    }
    out
}

/// Renders a raw value array as a square image.
///
/// The side is `⌊√len⌋`; trailing values that do not fill a row are dropped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn values_to_ascii(values: &[f32]) -> String {
    let side = (values.len() as f64).sqrt() as usize;
    let mut out = String::with_capacity(values.len() + side);
    for y in 0..side {
        for x in 0..side {
            let value = values.get(x + y * side).copied().unwrap_or(0.0);
            out.push(solid_char(value));
        }
        out.push('\n');
    }
    out
}

#[inline]
fn solid_char(value: f32) -> char {
    if value >= ASCII_SOLID_THRESHOLD {
        'X'
    } else {
        '0'
    }
}
