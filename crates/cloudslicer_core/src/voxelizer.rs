//! # Voxel Grid Builder
//!
//! Samples a box on a regular `Nx × Ny × Nz` lattice and classifies each
//! sample as inside or outside solid geometry.
//!
//! ## Classification
//!
//! For a sample `p` two vertical probes are cast towards it, one from the
//! box floor `(p.x, p.y, min.z)` and one from the box ceiling
//! `(p.x, p.y, max.z)`. The sample is occupied iff BOTH probes hit.
//! A point sitting under or above a body only sees one crossing.
//!
//! This is an approximation, not a point-in-solid test: a vertical line
//! that leaves and re-enters the same body (concave shapes, stacked
//! layers) is misclassified, and so are points exactly on a surface.
//!
//! ## Degenerate probes
//!
//! A sample on the floor or ceiling would give a zero-length probe, so
//! that probe's start is pushed outward by `probe_nudge`.

use cloudslicer_shared::{nearly_equal, IntVec3, Vec3};
use tracing::{info, trace};

use crate::config::SlicerConfig;
use crate::debug::{grid_to_ascii, DebugDraw};
use crate::error::{CloudError, CloudResult};
use crate::grid::{CloudBox, GridAccumulator, OccupancyGrid};
use crate::oracle::GeometryOracle;

/// Builds occupancy grids by probing a [`GeometryOracle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelGridBuilder {
    probe_nudge: f32,
    surface_tolerance: f32,
    max_grid_points: usize,
}

impl Default for VoxelGridBuilder {
    fn default() -> Self {
        Self::from_config(&SlicerConfig::default())
    }
}

impl VoxelGridBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the voxelizer part of a configuration.
    #[must_use]
    pub fn from_config(config: &SlicerConfig) -> Self {
        Self {
            probe_nudge: config.probe_nudge,
            surface_tolerance: config.surface_tolerance,
            max_grid_points: config.max_grid_points,
        }
    }

    /// Sets the grid size budget.
    #[must_use]
    pub const fn with_max_grid_points(mut self, max: usize) -> Self {
        self.max_grid_points = max;
        self
    }

    /// Checks the preconditions of [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// `InvalidDensity`, `InvalidExtent` or `BudgetExceeded`.
    pub fn validate(&self, cloud_box: &CloudBox, density: IntVec3) -> CloudResult<()> {
        if !density.all_at_least(1) {
            return Err(CloudError::InvalidDensity(density));
        }
        if !cloud_box.is_well_formed() {
            return Err(CloudError::InvalidExtent);
        }
        let requested = density.volume();
        if requested > self.max_grid_points {
            return Err(CloudError::BudgetExceeded {
                requested,
                budget: self.max_grid_points,
            });
        }
        Ok(())
    }

    /// Voxelizes `cloud_box` at `density`.
    ///
    /// # Errors
    ///
    /// Returns `NoSpatialContext` when `oracle` is `None`, otherwise any
    /// error of [`validate`](Self::validate). No partial grid is ever
    /// returned.
    pub fn build(
        &self,
        oracle: Option<&dyn GeometryOracle>,
        cloud_box: CloudBox,
        density: IntVec3,
    ) -> CloudResult<OccupancyGrid> {
        self.build_with_debug(oracle, cloud_box, density, None)
    }

    /// Like [`build`](Self::build), reporting every sample to `debug`.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_with_debug(
        &self,
        oracle: Option<&dyn GeometryOracle>,
        cloud_box: CloudBox,
        density: IntVec3,
        mut debug: Option<&mut dyn DebugDraw>,
    ) -> CloudResult<OccupancyGrid> {
        let oracle = oracle.ok_or(CloudError::NoSpatialContext)?;
        self.validate(&cloud_box, density)?;

        let step = cloud_box.step(density);
        let mut acc = GridAccumulator::with_density(density);
        let mut occupied_count = 0usize;

        for z in 0..density.z {
            for y in 0..density.y {
                for x in 0..density.x {
                    let point = cloud_box.lattice_point(IntVec3::new(x, y, z), step);
                    let occupied = self.classify(oracle, &cloud_box, point);
                    if let Some(sink) = debug.as_deref_mut() {
                        sink.sample(point, occupied);
                    }
                    occupied_count += usize::from(occupied);
                    acc.push(occupied);
                }
            }
        }

        let grid = acc.finish()?;
        info!(
            "Voxelized {}x{}x{} grid: {} of {} points occupied",
            density.x,
            density.y,
            density.z,
            occupied_count,
            grid.len()
        );
        trace!("Point cloud:\n{}", grid_to_ascii(&grid));
        Ok(grid)
    }

    /// Classifies a single world-space sample against the box's floor and
    /// ceiling.
    #[must_use]
    pub fn classify(&self, oracle: &dyn GeometryOracle, cloud_box: &CloudBox, point: Vec3) -> bool {
        let (low, high) = self.probe_starts(cloud_box, point);
        // Short-circuit: the ceiling probe is skipped when the floor misses.
        oracle.probe_segment(low, point) && oracle.probe_segment(high, point)
    }

    /// Start points of the floor and ceiling probes for `point`.
    #[must_use]
    pub fn probe_starts(&self, cloud_box: &CloudBox, point: Vec3) -> (Vec3, Vec3) {
        let min = cloud_box.min();
        let max = cloud_box.max();
        let mut low = Vec3::new(point.x, point.y, min.z);
        let mut high = Vec3::new(point.x, point.y, max.z);

        if nearly_equal(point.z, low.z, self.surface_tolerance) {
            low.z -= self.probe_nudge;
        }
        if nearly_equal(point.z, high.z, self.surface_tolerance) {
            high.z += self.probe_nudge;
        }
        (low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::SampleRecorder;
    use crate::oracle::{FnOracle, ParryScene};
    use std::cell::Cell;

    fn scenario_box() -> CloudBox {
        CloudBox::new(Vec3::ZERO, Vec3::splat(10.0))
    }

    #[test]
    fn test_no_hits_gives_empty_grid() {
        let never = FnOracle(|_: Vec3, _: Vec3| false);
        let grid = VoxelGridBuilder::new()
            .build(Some(&never), scenario_box(), IntVec3::new(2, 2, 2))
            .unwrap();
        assert_eq!(grid.density(), IntVec3::new(2, 2, 2));
        assert_eq!(grid.points(), &[false; 8]);
    }

    #[test]
    fn test_missing_oracle_aborts() {
        let err = VoxelGridBuilder::new()
            .build(None, scenario_box(), IntVec3::new(2, 2, 2))
            .unwrap_err();
        assert_eq!(err, CloudError::NoSpatialContext);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let never = FnOracle(|_: Vec3, _: Vec3| false);
        let builder = VoxelGridBuilder::new();
        assert!(matches!(
            builder.build(Some(&never), scenario_box(), IntVec3::new(0, 2, 2)),
            Err(CloudError::InvalidDensity(_))
        ));
        assert!(matches!(
            builder.build(
                Some(&never),
                CloudBox::new(Vec3::ZERO, Vec3::new(1.0, -1.0, 1.0)),
                IntVec3::new(1, 1, 1)
            ),
            Err(CloudError::InvalidExtent)
        ));
        assert!(matches!(
            builder
                .with_max_grid_points(7)
                .build(Some(&never), scenario_box(), IntVec3::new(2, 2, 2)),
            Err(CloudError::BudgetExceeded { requested: 8, budget: 7 })
        ));
    }

    #[test]
    fn test_floor_sample_probe_is_nudged() {
        let builder = VoxelGridBuilder::new();
        let cloud_box = scenario_box();
        let (low, high) = builder.probe_starts(&cloud_box, Vec3::new(1.0, 2.0, -10.0));
        assert_eq!(low, Vec3::new(1.0, 2.0, -11.0));
        assert_eq!(high, Vec3::new(1.0, 2.0, 10.0));

        let (low, _) = builder.probe_starts(&cloud_box, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(low, Vec3::new(1.0, 2.0, -10.0));
    }

    #[test]
    fn test_both_probes_required() {
        // Hits only when probing upward (from below the sample).
        let floor_only = FnOracle(|start: Vec3, end: Vec3| start.z < end.z);
        let grid = VoxelGridBuilder::new()
            .build(Some(&floor_only), scenario_box(), IntVec3::new(2, 2, 2))
            .unwrap();
        assert_eq!(grid.occupied_count(), 0);

        let always = FnOracle(|_: Vec3, _: Vec3| true);
        let grid = VoxelGridBuilder::new()
            .build(Some(&always), scenario_box(), IntVec3::new(2, 2, 2))
            .unwrap();
        assert_eq!(grid.occupied_count(), 8);
    }

    #[test]
    fn test_probe_count() {
        let calls = Cell::new(0usize);
        let always = FnOracle(|_: Vec3, _: Vec3| {
            calls.set(calls.get() + 1);
            true
        });
        VoxelGridBuilder::new()
            .build(Some(&always), scenario_box(), IntVec3::new(3, 2, 1))
            .unwrap();
        assert_eq!(calls.get(), 12);
    }

    #[test]
    fn test_box_in_scene() {
        // Solid slab covering z in [-2, 2] over the whole box footprint.
        let mut scene = ParryScene::new();
        scene.add_cuboid(Vec3::ZERO, Vec3::new(20.0, 20.0, 2.0));

        let grid = VoxelGridBuilder::new()
            .build(Some(&scene), scenario_box(), IntVec3::new(2, 2, 4))
            .unwrap();

        // z samples: -10, -5, 0, 5. Only z = 0 lies inside the slab.
        for (coord, occupied) in grid.iter() {
            assert_eq!(occupied, coord.z == 2, "unexpected value at {coord:?}");
        }
        assert_eq!(grid.occupied_count(), 4);
    }

    #[test]
    fn test_debug_sink_sees_every_sample() {
        let always = FnOracle(|_: Vec3, _: Vec3| true);
        let mut recorder = SampleRecorder::default();
        VoxelGridBuilder::new()
            .build_with_debug(
                Some(&always),
                scenario_box(),
                IntVec3::new(2, 1, 1),
                Some(&mut recorder),
            )
            .unwrap();
        assert_eq!(
            recorder.samples,
            vec![
                (Vec3::new(-10.0, -10.0, -10.0), true),
                (Vec3::new(0.0, -10.0, -10.0), true),
            ]
        );
    }
}
