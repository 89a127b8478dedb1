//! # Slice Resampler
//!
//! Cuts an occupancy grid with an oriented plane and resamples the cut into
//! a fixed resolution image.
//!
//! ## Geometry
//!
//! The plane's rotator gives three axes: X is "right" along the image, Y is
//! "up" and Z is the plane normal. The grid box centre is projected onto the
//! plane along the normal, and an image rectangle of the requested physical
//! size is laid out around that projection:
//!
//! ```text
//!   TopLeft ─────────── TopRight
//!      │                   │
//!      │        +          │      + = projected box centre
//!      │                   │
//!   BottomLeft ──────── BottomRight
//! ```
//!
//! Pixel `(0, 0)` samples `BottomLeft`, pixel `(W-1, 0)` samples
//! `BottomRight` and pixel `(0, H-1)` samples `TopLeft`.
//!
//! ## Intensity
//!
//! Each sample is snapped (truncated, then clamped) to a lattice coordinate.
//! The pixel value is the occupancy of the 8 corners of the unit cell
//! starting there, scaled so that a full cell reads `intensity_scale`.
//! Corners past the far faces of the grid count as empty.

use cloudslicer_shared::{IntPoint, IntVec3, Plane, Rotator, Vec2, Vec3, CELL_CORNERS};
use tracing::debug;

use crate::config::SlicerConfig;
use crate::error::{CloudError, CloudResult};
use crate::grid::{CloudBox, OccupancyGrid};
use crate::slice::Slice;

/// Corner offsets of a unit cell, origin first.
const CELL_OFFSETS: [IntVec3; CELL_CORNERS as usize] = [
    IntVec3::new(0, 0, 0),
    IntVec3::new(1, 0, 0),
    IntVec3::new(0, 1, 0),
    IntVec3::new(0, 0, 1),
    IntVec3::new(1, 1, 0),
    IntVec3::new(0, 1, 1),
    IntVec3::new(1, 0, 1),
    IntVec3::new(1, 1, 1),
];

/// Everything that describes one cut through a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceRequest {
    /// Any point on the cutting plane.
    pub plane_origin: Vec3,
    /// Orientation of the cutting plane; its Z axis is the normal.
    pub plane_orientation: Rotator,
    /// Box the grid was sampled from.
    pub cloud_box: CloudBox,
    /// Physical size of the imaged rectangle.
    pub physical_size: Vec2,
    /// Output pixel count along each axis.
    pub resolution: IntPoint,
}

impl SliceRequest {
    /// Lays out the image rectangle for this request.
    #[must_use]
    pub fn canvas(&self) -> ProjectionCanvas {
        ProjectionCanvas::new(self)
    }
}

/// The image rectangle in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionCanvas {
    /// Projection of the box centre onto the plane.
    pub center: Vec3,
    /// Corner sampled by pixel `(0, 0)`.
    pub bottom_left: Vec3,
    /// Corner sampled by pixel `(W-1, 0)`.
    pub bottom_right: Vec3,
    /// Corner sampled by pixel `(0, H-1)`.
    pub top_left: Vec3,
    /// Corner opposite `bottom_left`.
    pub top_right: Vec3,
    points: IntPoint,
}

impl ProjectionCanvas {
    fn new(request: &SliceRequest) -> Self {
        let (right, up, normal) = request.plane_orientation.axes();
        let plane = Plane::from_point_normal(request.plane_origin, normal);

        let origin = request.cloud_box.center;
        let center = origin - plane.normal * plane.plane_dot(origin);
        let half_x = right * (request.physical_size.x / 2.0);
        let half_y = up * (request.physical_size.y / 2.0);

        Self {
            center,
            bottom_left: center - half_x - half_y,
            bottom_right: center + half_x - half_y,
            top_left: center - half_x + half_y,
            top_right: center + half_x + half_y,
            points: request.resolution,
        }
    }

    /// World position sampled by pixel `(x, y)`.
    #[must_use]
    pub fn point(&self, x: i32, y: i32) -> Vec3 {
        let x_axis = self.bottom_right - self.bottom_left;
        let y_axis = self.top_left - self.bottom_left;
        self.bottom_left + x_axis * alpha(x, self.points.x) + y_axis * alpha(y, self.points.y)
    }
}

/// Interpolation weight of `index` among `count` evenly spread samples.
/// A single sample sits at the start.
#[allow(clippy::cast_precision_loss)]
#[inline]
fn alpha(index: i32, count: i32) -> f32 {
    if count <= 1 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}

/// Turns grids into slices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceResampler {
    intensity_scale: f32,
    max_slice_pixels: usize,
}

impl Default for SliceResampler {
    fn default() -> Self {
        Self::from_config(&SlicerConfig::default())
    }
}

impl SliceResampler {
    /// Creates a resampler with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resampler from the resampler part of a configuration.
    #[must_use]
    pub fn from_config(config: &SlicerConfig) -> Self {
        Self {
            intensity_scale: config.intensity_scale,
            max_slice_pixels: config.max_slice_pixels,
        }
    }

    /// Sets the slice size budget.
    #[must_use]
    pub const fn with_max_slice_pixels(mut self, max: usize) -> Self {
        self.max_slice_pixels = max;
        self
    }

    /// Checks the request before any work is done.
    ///
    /// # Errors
    ///
    /// `InvalidResolution`, `InvalidExtent`, `InvalidPlane` or
    /// `BudgetExceeded`.
    pub fn validate(&self, request: &SliceRequest) -> CloudResult<()> {
        let resolution = request.resolution;
        if resolution.x < 1 || resolution.y < 1 {
            return Err(CloudError::InvalidResolution(resolution));
        }
        if !request.cloud_box.is_well_formed() {
            return Err(CloudError::InvalidExtent);
        }
        // Cached slices must stay finite to be saveable.
        if !(request.plane_origin.is_finite()
            && request.plane_orientation.is_finite()
            && request.physical_size.is_finite())
        {
            return Err(CloudError::InvalidPlane);
        }
        let requested = resolution.area();
        if requested > self.max_slice_pixels {
            return Err(CloudError::BudgetExceeded {
                requested,
                budget: self.max_slice_pixels,
            });
        }
        Ok(())
    }

    /// Resamples `grid` along the plane described by `request`.
    ///
    /// The grid is only read. The same grid and request always produce the
    /// same slice.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDensity` for a grid without points, otherwise any
    /// error of [`validate`](Self::validate).
    pub fn resample(&self, grid: &OccupancyGrid, request: &SliceRequest) -> CloudResult<Slice> {
        let density = grid.density();
        if grid.is_empty() || !density.all_at_least(1) {
            return Err(CloudError::InvalidDensity(density));
        }
        self.validate(request)?;

        let canvas = request.canvas();
        let min = request.cloud_box.min();
        let step = request.cloud_box.step(density);
        #[allow(clippy::cast_precision_loss)]
        let per_corner = self.intensity_scale / CELL_CORNERS as f32;

        let resolution = request.resolution;
        let mut data = Vec::with_capacity(resolution.area());
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let world = canvas.point(x, y);
                let cell = (world - min).div_elem(step).truncate().clamp_to(density);
                data.push(per_corner * cell_occupancy(grid, cell) as f32);
            }
        }

        debug!(
            "Resampled {}x{} slice from {}x{}x{} grid",
            resolution.x, resolution.y, density.x, density.y, density.z
        );
        Slice::new(data, request.physical_size, resolution)
    }
}

/// Number of occupied corners of the unit cell starting at `origin`.
fn cell_occupancy(grid: &OccupancyGrid, origin: IntVec3) -> u32 {
    CELL_OFFSETS
        .iter()
        .map(|&offset| u32::from(grid.get(origin + offset)))
        .sum()
}
