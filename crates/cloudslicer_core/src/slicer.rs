//! # Slicer
//!
//! Ties the pieces together: a [`Slicer`] holds the configuration, the
//! attached world (a [`GeometryOracle`]) and an optional debug sink, and
//! runs cache-aware operations against a [`CloudCache`] handed in per call.
//!
//! ```text
//! generate_or_load_point_cloud ──► VoxelGridBuilder ──► cache.set_cloud
//!                                        ▲
//!                                   GeometryOracle
//!
//! calculate_or_load_slice ──► cache grid ──► SliceResampler ──► cache.set_slice
//! ```
//!
//! Every operation works on the cloud tag from the configuration.

use std::sync::Arc;

use cloudslicer_shared::{IntPoint, IntVec3, Rotator, Vec2, Vec3};
use tracing::{debug, warn};

use crate::cache::CloudCache;
use crate::config::SlicerConfig;
use crate::data_array::DataArray;
use crate::debug::DebugDraw;
use crate::error::{CloudError, CloudResult};
use crate::grid::{CloudBox, OccupancyGrid};
use crate::oracle::GeometryOracle;
use crate::resample::{SliceRequest, SliceResampler};
use crate::slice::Slice;
use crate::voxelizer::VoxelGridBuilder;

/// Cache-aware front end for voxelizing and slicing.
pub struct Slicer {
    config: SlicerConfig,
    builder: VoxelGridBuilder,
    resampler: SliceResampler,
    world: Option<Arc<dyn GeometryOracle>>,
    debug_sink: Option<Box<dyn DebugDraw>>,
    canvas: DataArray<f32>,
}

impl Slicer {
    /// Creates a slicer with no world attached.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` fails validation.
    pub fn new(config: SlicerConfig) -> CloudResult<Self> {
        config.validate()?;
        Ok(Self {
            builder: VoxelGridBuilder::from_config(&config),
            resampler: SliceResampler::from_config(&config),
            canvas: DataArray::new(config.canvas_capacity()),
            world: None,
            debug_sink: None,
            config,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SlicerConfig {
        &self.config
    }

    /// Cloud tag every operation reads and writes.
    #[must_use]
    pub fn cloud_tag(&self) -> &str {
        &self.config.cloud_tag
    }

    /// Attaches the world that voxelization probes.
    pub fn attach_world(&mut self, world: Arc<dyn GeometryOracle>) {
        self.world = Some(world);
    }

    /// Detaches the world, returning it.
    pub fn detach_world(&mut self) -> Option<Arc<dyn GeometryOracle>> {
        self.world.take()
    }

    /// Returns true if a world is attached.
    #[must_use]
    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }

    /// Attaches the sink that receives voxelizer samples when `draw_debug`
    /// is enabled.
    pub fn attach_debug_sink(&mut self, sink: Box<dyn DebugDraw>) {
        self.debug_sink = Some(sink);
    }

    /// Detaches the debug sink, returning it.
    pub fn detach_debug_sink(&mut self) -> Option<Box<dyn DebugDraw>> {
        self.debug_sink.take()
    }

    /// Returns the cached grid, or voxelizes the box and caches the result.
    ///
    /// A cloud entry that only exists because slices were stored under it
    /// has no grid yet and is voxelized like a missing one; its slices are
    /// kept.
    ///
    /// # Errors
    ///
    /// `NoSpatialContext` when no world is attached and the grid is not
    /// cached, or any builder validation error. The cache is unchanged on
    /// error.
    pub fn generate_or_load_point_cloud(
        &mut self,
        cache: &mut CloudCache,
        box_center: Vec3,
        box_extent: Vec3,
        density: IntVec3,
    ) -> CloudResult<OccupancyGrid> {
        let tag = self.config.cloud_tag.as_str();
        if let Some(grid) = cache.get_cloud(tag).filter(|grid| !grid.is_empty()) {
            debug!("Point cloud {:?} served from cache", tag);
            return Ok(grid);
        }

        let Some(world) = self.world.as_deref() else {
            warn!("No world attached, cannot voxelize point cloud {:?}", tag);
            return Err(CloudError::NoSpatialContext);
        };
        let sink = match self.debug_sink.as_deref_mut() {
            Some(sink) if self.config.draw_debug => Some(sink as &mut dyn DebugDraw),
            _ => None,
        };

        let grid = self.builder.build_with_debug(
            Some(world),
            CloudBox::new(box_center, box_extent),
            density,
            sink,
        )?;
        cache.set_cloud(tag, grid.clone());
        Ok(grid)
    }

    /// Returns the cached slice under `slice_tag`, or resamples the cached
    /// grid and caches the result.
    ///
    /// # Errors
    ///
    /// `NotCached` when the slice is missing and there is no grid to cut,
    /// or any resampler validation error. The cache is unchanged on error.
    pub fn calculate_or_load_slice(
        &self,
        cache: &mut CloudCache,
        request: &SliceRequest,
        slice_tag: &str,
    ) -> CloudResult<Slice> {
        let tag = self.config.cloud_tag.as_str();
        if let Some(slice) = cache.get_slice(tag, slice_tag) {
            debug!("Slice {:?} of cloud {:?} served from cache", slice_tag, tag);
            return Ok(slice);
        }

        let slice = self.calculate_slice(cache, request)?;
        cache.set_slice(tag, slice_tag, slice.clone());
        Ok(slice)
    }

    /// [`calculate_or_load_slice`](Self::calculate_or_load_slice) with the
    /// request spelled out.
    ///
    /// # Errors
    ///
    /// Same as [`calculate_or_load_slice`](Self::calculate_or_load_slice).
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_or_load_slice_on_plane(
        &self,
        cache: &mut CloudCache,
        plane_origin: Vec3,
        plane_orientation: Rotator,
        cloud_box_extent: Vec3,
        cloud_box_origin: Vec3,
        physical_size: Vec2,
        resolution: IntPoint,
        slice_tag: &str,
    ) -> CloudResult<Slice> {
        let request = SliceRequest {
            plane_origin,
            plane_orientation,
            cloud_box: CloudBox::new(cloud_box_origin, cloud_box_extent),
            physical_size,
            resolution,
        };
        self.calculate_or_load_slice(cache, &request, slice_tag)
    }

    /// Resamples the cached grid without storing the result.
    ///
    /// # Errors
    ///
    /// `NotCached` when the cloud has no grid, or any resampler validation
    /// error.
    pub fn calculate_slice(&self, cache: &CloudCache, request: &SliceRequest) -> CloudResult<Slice> {
        let tag = self.config.cloud_tag.as_str();
        let result = cache.with_cloud(tag, |grid| {
            if grid.is_empty() {
                None
            } else {
                Some(self.resampler.resample(grid, request))
            }
        });

        match result.flatten() {
            Some(slice) => slice,
            None => {
                warn!("Point cloud {:?} is not cached", tag);
                Err(CloudError::cloud_not_cached(tag))
            }
        }
    }

    /// Stores an externally computed slice under `slice_tag`.
    pub fn cache_slice(&self, cache: &mut CloudCache, slice: Slice, slice_tag: &str) {
        cache.set_slice(self.config.cloud_tag.as_str(), slice_tag, slice);
    }

    /// Returns true if a grid is cached under the configured tag.
    #[must_use]
    pub fn is_cache_set(&self, cache: &CloudCache) -> bool {
        cache
            .with_cloud(self.cloud_tag(), |grid| !grid.is_empty())
            .unwrap_or(false)
    }

    /// Replays the cached grid into `sink`, one sample per lattice point,
    /// positioned inside `cloud_box`. Returns the number of samples drawn.
    ///
    /// # Errors
    ///
    /// `NotCached` when the cloud has no grid, `InvalidExtent` for a
    /// malformed box.
    pub fn draw_cached_cloud(
        &self,
        cache: &CloudCache,
        cloud_box: CloudBox,
        sink: &mut dyn DebugDraw,
    ) -> CloudResult<usize> {
        if !cloud_box.is_well_formed() {
            return Err(CloudError::InvalidExtent);
        }
        let tag = self.cloud_tag();
        let drawn = cache.with_cloud(tag, |grid| {
            let step = cloud_box.step(grid.density());
            let mut drawn = 0;
            for (coord, occupied) in grid.iter() {
                sink.sample(cloud_box.lattice_point(coord, step), occupied);
                drawn += 1;
            }
            drawn
        });

        match drawn {
            Some(drawn) if drawn > 0 => Ok(drawn),
            _ => {
                warn!("Point cloud {:?} is not cached, nothing to draw", tag);
                Err(CloudError::cloud_not_cached(tag))
            }
        }
    }

    /// Copies the cached slice under `slice_tag` into the staging canvas.
    ///
    /// # Errors
    ///
    /// `NotCached` when the slice is missing, `CapacityExceeded` when it has
    /// more pixels than the canvas.
    pub fn stage_slice(&mut self, cache: &CloudCache, slice_tag: &str) -> CloudResult<&DataArray<f32>> {
        let tag = self.config.cloud_tag.as_str();
        let canvas = &mut self.canvas;
        cache
            .with_slice(tag, slice_tag, |slice| slice.stage_into(canvas))
            .ok_or_else(|| CloudError::slice_not_cached(tag, slice_tag))??;
        Ok(&self.canvas)
    }

    /// The staging canvas.
    #[must_use]
    pub fn canvas(&self) -> &DataArray<f32> {
        &self.canvas
    }

    /// Saves `cache` to the configured pack path.
    ///
    /// # Errors
    ///
    /// See [`CloudCache::save`].
    pub fn save_cache(&self, cache: &CloudCache) -> CloudResult<()> {
        cache.save(&self.config.pack_path)
    }

    /// Loads `cache` from the configured pack path.
    ///
    /// # Errors
    ///
    /// See [`CloudCache::load`].
    pub fn load_cache(&self, cache: &mut CloudCache) -> CloudResult<()> {
        cache.load(&self.config.pack_path)
    }
}

impl std::fmt::Debug for Slicer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slicer")
            .field("config", &self.config)
            .field("has_world", &self.world.is_some())
            .field("has_debug_sink", &self.debug_sink.is_some())
            .field("canvas_len", &self.canvas.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::SampleRecorder;
    use crate::oracle::{FnOracle, ParryScene};
    use std::cell::Cell;
    use std::rc::Rc;

    fn slab_world() -> Arc<dyn GeometryOracle> {
        let mut scene = ParryScene::new();
        scene.add_cuboid(Vec3::ZERO, Vec3::new(20.0, 20.0, 2.0));
        Arc::new(scene)
    }

    fn slicer_with_world() -> Slicer {
        let mut slicer = Slicer::new(SlicerConfig::default()).unwrap();
        slicer.attach_world(slab_world());
        slicer
    }

    fn flat_request(resolution: IntPoint) -> SliceRequest {
        SliceRequest {
            plane_origin: Vec3::ZERO,
            plane_orientation: Rotator::IDENTITY,
            cloud_box: CloudBox::new(Vec3::ZERO, Vec3::splat(10.0)),
            physical_size: Vec2::new(10.0, 10.0),
            resolution,
        }
    }

    struct CountingSink(Rc<Cell<usize>>);

    impl DebugDraw for CountingSink {
        fn sample(&mut self, _point: Vec3, _occupied: bool) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_generate_without_world() {
        let mut slicer = Slicer::new(SlicerConfig::default()).unwrap();
        let mut cache = CloudCache::new();
        let err = slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap_err();
        assert_eq!(err, CloudError::NoSpatialContext);
        assert!(cache.is_empty());
        assert!(!slicer.is_cache_set(&cache));
    }

    #[test]
    fn test_generate_caches_under_tag() {
        let mut slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        let grid = slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 4))
            .unwrap();
        assert_eq!(grid.occupied_count(), 4);
        assert_eq!(cache.get_cloud("Default"), Some(grid));
        assert!(slicer.is_cache_set(&cache));
    }

    #[test]
    fn test_generate_short_circuits_without_world() {
        let mut slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        let first = slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        slicer.detach_world();
        let second = slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_implicit_entry_is_voxelized_and_keeps_slices() {
        let mut slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        slicer.cache_slice(&mut cache, Slice::default(), "kept");
        assert!(!slicer.is_cache_set(&cache));

        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        assert!(slicer.is_cache_set(&cache));
        assert!(cache.contains_slice("Default", "kept"));
    }

    #[test]
    fn test_debug_sink_only_when_enabled() {
        let count = Rc::new(Cell::new(0));
        let mut cache = CloudCache::new();

        let mut slicer = slicer_with_world();
        slicer.attach_debug_sink(Box::new(CountingSink(Rc::clone(&count))));
        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        assert_eq!(count.get(), 0);

        let config = SlicerConfig {
            draw_debug: true,
            cloud_tag: "Other".into(),
            ..SlicerConfig::default()
        };
        let mut slicer = Slicer::new(config).unwrap();
        slicer.attach_world(slab_world());
        slicer.attach_debug_sink(Box::new(CountingSink(Rc::clone(&count))));
        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        assert_eq!(count.get(), 8);
    }

    #[test]
    fn test_slice_requires_cached_grid() {
        let slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        let err = slicer
            .calculate_or_load_slice(&mut cache, &flat_request(IntPoint::new(2, 2)), "s")
            .unwrap_err();
        assert_eq!(err, CloudError::cloud_not_cached("Default"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_slice_is_cached_and_reused() {
        let mut slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();

        let slice = slicer
            .calculate_or_load_slice_on_plane(
                &mut cache,
                Vec3::ZERO,
                Rotator::IDENTITY,
                Vec3::splat(10.0),
                Vec3::ZERO,
                Vec2::new(10.0, 10.0),
                IntPoint::new(3, 3),
                "mid",
            )
            .unwrap();
        assert_eq!(slice.data().len(), 9);
        assert_eq!(cache.get_slice("Default", "mid"), Some(slice.clone()));

        // A different request under the same tag returns the cached slice.
        let again = slicer
            .calculate_or_load_slice(&mut cache, &flat_request(IntPoint::new(5, 5)), "mid")
            .unwrap();
        assert_eq!(again, slice);
    }

    #[test]
    fn test_calculate_slice_does_not_cache() {
        let mut slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        slicer.calculate_slice(&cache, &flat_request(IntPoint::new(2, 2))).unwrap();
        assert!(cache.slice_tags("Default").is_empty());
    }

    #[test]
    fn test_draw_cached_cloud() {
        let mut slicer = slicer_with_world();
        let mut cache = CloudCache::new();
        let cloud_box = CloudBox::new(Vec3::ZERO, Vec3::splat(10.0));

        let mut recorder = SampleRecorder::default();
        assert!(slicer.draw_cached_cloud(&cache, cloud_box, &mut recorder).is_err());

        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 4))
            .unwrap();
        let drawn = slicer.draw_cached_cloud(&cache, cloud_box, &mut recorder).unwrap();
        assert_eq!(drawn, 16);
        assert_eq!(recorder.occupied_count(), 4);
        assert_eq!(recorder.samples[0].0, Vec3::splat(-10.0));
    }

    #[test]
    fn test_stage_slice() {
        let config = SlicerConfig {
            canvas_size: 2,
            ..SlicerConfig::default()
        };
        let mut slicer = Slicer::new(config).unwrap();
        let mut cache = CloudCache::new();
        let small = Slice::new(vec![1.0; 4], Vec2::new(1.0, 1.0), IntPoint::new(2, 2)).unwrap();
        let large = Slice::new(vec![1.0; 9], Vec2::new(1.0, 1.0), IntPoint::new(3, 3)).unwrap();
        slicer.cache_slice(&mut cache, small, "small");
        slicer.cache_slice(&mut cache, large, "large");

        assert_eq!(slicer.stage_slice(&cache, "small").unwrap().len(), 4);
        assert!(matches!(
            slicer.stage_slice(&cache, "large"),
            Err(CloudError::CapacityExceeded { capacity: 4, requested: 9 })
        ));
        assert!(matches!(
            slicer.stage_slice(&cache, "missing"),
            Err(CloudError::NotCached { .. })
        ));
        assert_eq!(slicer.canvas().len(), 4);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SlicerConfig {
            probe_nudge: 0.0,
            ..SlicerConfig::default()
        };
        assert!(matches!(Slicer::new(config), Err(CloudError::InvalidConfig(_))));

        let config = SlicerConfig {
            canvas_size: usize::MAX,
            ..SlicerConfig::default()
        };
        assert!(matches!(Slicer::new(config), Err(CloudError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_finite_plane_leaves_cache_saveable() {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("test_slicer_nan_plane_{id}.json"));
        let config = SlicerConfig {
            pack_path: path.clone(),
            ..SlicerConfig::default()
        };
        let mut slicer = Slicer::new(config).unwrap();
        slicer.attach_world(slab_world());

        let mut cache = CloudCache::new();
        slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(2, 2, 2))
            .unwrap();
        let before = cache.clone();

        let result = slicer.calculate_or_load_slice_on_plane(
            &mut cache,
            Vec3::ZERO,
            Rotator::IDENTITY,
            Vec3::splat(10.0),
            Vec3::ZERO,
            Vec2::new(f32::NAN, 1.0),
            IntPoint::new(2, 2),
            "bad",
        );
        assert_eq!(result, Err(CloudError::InvalidPlane));
        assert_eq!(cache, before);
        assert!(!cache.contains_slice(slicer.cloud_tag(), "bad"));

        slicer.save_cache(&cache).unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_fn_oracle_world() {
        let mut slicer = Slicer::new(SlicerConfig::default()).unwrap();
        slicer.attach_world(Arc::new(FnOracle(|_: Vec3, _: Vec3| true)));
        let mut cache = CloudCache::new();
        let grid = slicer
            .generate_or_load_point_cloud(&mut cache, Vec3::ZERO, Vec3::splat(1.0), IntVec3::new(1, 1, 1))
            .unwrap();
        assert_eq!(grid.points(), &[true]);
    }
}
