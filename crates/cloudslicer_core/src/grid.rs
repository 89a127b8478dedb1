//! # Occupancy Grid
//!
//! A point cloud is a dense boolean lattice of `Nx × Ny × Nz` samples.
//!
//! ## Layout
//!
//! Points are stored X-fastest: the plain index of `(x, y, z)` is
//! `x + y * Nx + z * Nx * Ny`. This matches the order in which the
//! voxelizer visits the lattice, so a freshly built grid is filled by
//! plain `push`es.

use cloudslicer_shared::{IntVec3, Vec3};

use crate::error::{CloudError, CloudResult};

/// Dense boolean occupancy lattice.
///
/// The default grid has density `(0, 0, 0)` and no points; it is what
/// lookups hand out for clouds that exist without a grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancyGrid {
    /// Occupancy flags in plain-index order.
    points: Vec<bool>,
    /// Number of samples along each axis.
    density: IntVec3,
}

impl OccupancyGrid {
    /// Creates a grid of the given density with every point empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDensity` if a component is negative.
    pub fn empty(density: IntVec3) -> CloudResult<Self> {
        if !density.all_at_least(0) {
            return Err(CloudError::InvalidDensity(density));
        }
        Ok(Self {
            points: vec![false; density.volume()],
            density,
        })
    }

    /// Wraps existing occupancy flags.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDensity` if a component is negative, or
    /// `Deserialization` if `points.len()` is not `Nx * Ny * Nz`.
    pub fn from_points(points: Vec<bool>, density: IntVec3) -> CloudResult<Self> {
        if !density.all_at_least(0) {
            return Err(CloudError::InvalidDensity(density));
        }
        if points.len() != density.volume() {
            return Err(CloudError::Deserialization(format!(
                "point count {} does not match density {}x{}x{}",
                points.len(),
                density.x,
                density.y,
                density.z
            )));
        }
        Ok(Self { points, density })
    }

    /// Converts a lattice coordinate to a plain index for a lattice of `size`.
    ///
    /// The result is only meaningful for coordinates that are valid in `size`.
    #[inline]
    #[must_use]
    pub const fn to_plain_index(coord: IntVec3, size: IntVec3) -> i64 {
        coord.x as i64 + coord.y as i64 * size.x as i64 + coord.z as i64 * size.x as i64 * size.y as i64
    }

    /// Returns true if `coord` lies inside the lattice.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self, coord: IntVec3) -> bool {
        coord.x >= 0
            && coord.x < self.density.x
            && coord.y >= 0
            && coord.y < self.density.y
            && coord.z >= 0
            && coord.z < self.density.z
    }

    /// Occupancy at `coord`; out-of-range coordinates read as empty.
    #[inline]
    #[must_use]
    pub fn get(&self, coord: IntVec3) -> bool {
        self.plain_index(coord)
            .and_then(|index| self.points.get(index).copied())
            .unwrap_or(false)
    }

    /// Sets occupancy at `coord`. Returns false if `coord` is out of range.
    pub fn set(&mut self, coord: IntVec3, occupied: bool) -> bool {
        match self.plain_index(coord) {
            Some(index) => {
                self.points[index] = occupied;
                true
            }
            None => false,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn plain_index(&self, coord: IntVec3) -> Option<usize> {
        if self.is_valid(coord) {
            Some(Self::to_plain_index(coord, self.density) as usize)
        } else {
            None
        }
    }

    /// Number of samples along each axis.
    #[inline]
    #[must_use]
    pub const fn density(&self) -> IntVec3 {
        self.density
    }

    /// Occupancy flags in plain-index order.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[bool] {
        &self.points
    }

    /// Total number of lattice points.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the grid has no points (the default grid).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of occupied points.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.points.iter().filter(|&&p| p).count()
    }

    /// Iterates every lattice coordinate in plain-index order with its flag.
    pub fn iter(&self) -> impl Iterator<Item = (IntVec3, bool)> + '_ {
        let d = self.density;
        self.points.iter().enumerate().map(move |(i, &occupied)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let i = i as i32;
            let x = i % d.x;
            let y = (i / d.x) % d.y;
            let z = i / (d.x * d.y);
            (IntVec3::new(x, y, z), occupied)
        })
    }

    /// Consumes the grid and returns its raw parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<bool>, IntVec3) {
        (self.points, self.density)
    }
}

/// World-space box a grid was sampled from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CloudBox {
    /// Box centre.
    pub center: Vec3,
    /// Half size along each axis.
    pub extent: Vec3,
}

impl CloudBox {
    /// Creates a box from its centre and half size.
    #[must_use]
    pub const fn new(center: Vec3, extent: Vec3) -> Self {
        Self { center, extent }
    }

    /// Lowest corner.
    #[inline]
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.extent
    }

    /// Highest corner.
    #[inline]
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.extent
    }

    /// Lattice spacing for `density` samples per axis: `(max - min) / density`.
    #[inline]
    #[must_use]
    pub fn step(&self, density: IntVec3) -> Vec3 {
        (self.max() - self.min()).div_elem(density.as_vec3())
    }

    /// World position of lattice point `coord` for the given spacing.
    #[inline]
    #[must_use]
    pub fn lattice_point(&self, coord: IntVec3, step: Vec3) -> Vec3 {
        self.min() + coord.as_vec3().mul_elem(step)
    }

    /// Returns true if every extent component is positive and finite.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.center.is_finite()
            && self.extent.is_finite()
            && self.extent.x > 0.0
            && self.extent.y > 0.0
            && self.extent.z > 0.0
    }
}

/// Accumulates a grid in lattice order.
///
/// Used by the voxelizer so the finished grid can only be observed once
/// every point has been classified.
pub(crate) struct GridAccumulator {
    points: Vec<bool>,
    density: IntVec3,
}

impl GridAccumulator {
    pub(crate) fn with_density(density: IntVec3) -> Self {
        Self {
            points: Vec::with_capacity(density.volume()),
            density,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, occupied: bool) {
        self.points.push(occupied);
    }

    pub(crate) fn finish(self) -> CloudResult<OccupancyGrid> {
        OccupancyGrid::from_points(self.points, self.density)
    }
}
