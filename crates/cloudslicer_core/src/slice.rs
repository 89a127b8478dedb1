//! # Slices
//!
//! A slice is a 2D intensity image cut through a grid by a plane.
//! Pixels are stored row-major: pixel `(x, y)` lives at `y * width + x`.

use cloudslicer_shared::{IntPoint, Vec2};

use crate::data_array::DataArray;
use crate::error::{CloudError, CloudResult};

/// A resampled cross-section of an occupancy grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slice {
    /// Physical size of the imaged rectangle.
    physical_size: Vec2,
    /// Pixel count along each axis.
    resolution: IntPoint,
    /// Pixel intensities, row-major.
    data: Vec<f32>,
}

impl Slice {
    /// Creates a slice from its pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if a component is negative, or
    /// `Deserialization` if `data.len()` is not `width * height`.
    pub fn new(data: Vec<f32>, physical_size: Vec2, resolution: IntPoint) -> CloudResult<Self> {
        if resolution.x < 0 || resolution.y < 0 {
            return Err(CloudError::InvalidResolution(resolution));
        }
        if data.len() != resolution.area() {
            return Err(CloudError::Deserialization(format!(
                "slice holds {} values, resolution {}x{} needs {}",
                data.len(),
                resolution.x,
                resolution.y,
                resolution.area()
            )));
        }
        Ok(Self {
            physical_size,
            resolution,
            data,
        })
    }

    /// Physical size of the imaged rectangle.
    #[must_use]
    pub const fn physical_size(&self) -> Vec2 {
        self.physical_size
    }

    /// Pixel count along each axis.
    #[must_use]
    pub const fn resolution(&self) -> IntPoint {
        self.resolution
    }

    /// Pixel intensities, row-major.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of pixels per row.
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.resolution.x as usize
    }

    /// Number of rows.
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.resolution.y as usize
    }

    /// Intensity of pixel `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.data.get(y * self.width() + x).copied()
    }

    /// Returns true if the slice has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copies the pixels into a fixed-capacity staging array.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if the slice has more pixels than the
    /// array can hold; the array is left unchanged in that case.
    pub fn stage_into(&self, target: &mut DataArray<f32>) -> CloudResult<()> {
        target.set_array(self.data.clone())
    }

    /// Consumes the slice and returns its pixels.
    #[must_use]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}
