//! # Cloud Cache
//!
//! Two-level tagged store: cloud tag → { occupancy grid, slice tag → slice }.
//!
//! The cache owns every entry. Getters hand out clones (or borrow through
//! a closure with the `with_*` methods), so nothing a caller holds can
//! change what is cached.
//!
//! ## Implicit entries
//!
//! Storing a slice under an unknown cloud creates that cloud with an empty
//! default grid. Storing a grid never touches the slices already cached
//! under the same tag.

use std::collections::HashMap;
use std::sync::Arc;

use cloudslicer_shared::{IntPoint, IntVec3, Vec2};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::grid::OccupancyGrid;
use crate::slice::Slice;

/// A grid together with the slices cut from it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudEntry {
    /// Occupancy grid; the default (empty) grid when only slices were set.
    pub point_cloud: OccupancyGrid,
    /// Slices by slice tag.
    pub slices: HashMap<String, Slice>,
}

/// Whole cache state, as saved to and loaded from disk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudPack {
    /// Entries by cloud tag.
    pub clouds: HashMap<String, CloudEntry>,
}

impl CloudPack {
    /// Creates an empty pack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Small fixed pack: cloud `"Test"` with a single occupied point and one
    /// 1×1 slice `"Test"` of value 1.
    #[must_use]
    pub fn test_pack() -> Self {
        let point_cloud = OccupancyGrid::from_points(vec![true], IntVec3::new(1, 1, 1))
            .unwrap_or_default();
        let slice = Slice::new(vec![1.0], Vec2::new(1.0, 1.0), IntPoint::new(1, 1))
            .unwrap_or_default();

        let mut slices = HashMap::new();
        slices.insert("Test".to_string(), slice);

        let mut clouds = HashMap::new();
        clouds.insert(
            "Test".to_string(),
            CloudEntry {
                point_cloud,
                slices,
            },
        );
        Self { clouds }
    }

    /// Number of clouds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    /// Returns true if the pack holds no clouds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Total number of slices over all clouds.
    #[must_use]
    pub fn slice_count(&self) -> usize {
        self.clouds.values().map(|entry| entry.slices.len()).sum()
    }
}

/// In-memory cloud/slice cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudCache {
    pack: CloudPack,
}

impl CloudCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding `pack`.
    #[must_use]
    pub fn from_pack(pack: CloudPack) -> Self {
        Self { pack }
    }

    /// Stores `grid` under `cloud_tag`, keeping any slices already there.
    pub fn set_cloud(&mut self, cloud_tag: impl Into<String>, grid: OccupancyGrid) {
        let cloud_tag = cloud_tag.into();
        let d = grid.density();
        debug!("Caching cloud {:?} ({}x{}x{})", cloud_tag, d.x, d.y, d.z);
        self.pack.clouds.entry(cloud_tag).or_default().point_cloud = grid;
    }

    /// Copy of the grid under `cloud_tag`.
    ///
    /// `None` means not found; callers wanting the default grid in that
    /// case use `unwrap_or_default()`.
    #[must_use]
    pub fn get_cloud(&self, cloud_tag: &str) -> Option<OccupancyGrid> {
        self.pack
            .clouds
            .get(cloud_tag)
            .map(|entry| entry.point_cloud.clone())
    }

    /// Runs `f` on the grid under `cloud_tag` without copying it.
    pub fn with_cloud<F, R>(&self, cloud_tag: &str, f: F) -> Option<R>
    where
        F: FnOnce(&OccupancyGrid) -> R,
    {
        self.pack
            .clouds
            .get(cloud_tag)
            .map(|entry| f(&entry.point_cloud))
    }

    /// Copy of the whole entry under `cloud_tag`.
    #[must_use]
    pub fn get_cloud_with_slices(&self, cloud_tag: &str) -> Option<CloudEntry> {
        self.pack.clouds.get(cloud_tag).cloned()
    }

    /// Stores `slice` under `(cloud_tag, slice_tag)`, creating the cloud
    /// entry (with the default grid) if it does not exist.
    pub fn set_slice(
        &mut self,
        cloud_tag: impl Into<String>,
        slice_tag: impl Into<String>,
        slice: Slice,
    ) {
        let cloud_tag = cloud_tag.into();
        let slice_tag = slice_tag.into();
        let entry = self.pack.clouds.entry(cloud_tag.clone()).or_default();
        let replaced = entry.slices.insert(slice_tag.clone(), slice).is_some();
        debug!(
            "{} slice {:?} of cloud {:?}",
            if replaced { "Replaced" } else { "Cached" },
            slice_tag,
            cloud_tag
        );
    }

    /// Copy of the slice under `(cloud_tag, slice_tag)`.
    #[must_use]
    pub fn get_slice(&self, cloud_tag: &str, slice_tag: &str) -> Option<Slice> {
        self.pack
            .clouds
            .get(cloud_tag)
            .and_then(|entry| entry.slices.get(slice_tag))
            .cloned()
    }

    /// Runs `f` on the slice under `(cloud_tag, slice_tag)` without copying it.
    pub fn with_slice<F, R>(&self, cloud_tag: &str, slice_tag: &str, f: F) -> Option<R>
    where
        F: FnOnce(&Slice) -> R,
    {
        self.pack
            .clouds
            .get(cloud_tag)
            .and_then(|entry| entry.slices.get(slice_tag))
            .map(f)
    }

    /// Returns true if a cloud entry exists under `cloud_tag`.
    #[must_use]
    pub fn contains_cloud(&self, cloud_tag: &str) -> bool {
        self.pack.clouds.contains_key(cloud_tag)
    }

    /// Returns true if a slice exists under `(cloud_tag, slice_tag)`.
    #[must_use]
    pub fn contains_slice(&self, cloud_tag: &str, slice_tag: &str) -> bool {
        self.pack
            .clouds
            .get(cloud_tag)
            .is_some_and(|entry| entry.slices.contains_key(slice_tag))
    }

    /// Removes a cloud and its slices, returning them if they existed.
    pub fn remove_cloud(&mut self, cloud_tag: &str) -> Option<CloudEntry> {
        let removed = self.pack.clouds.remove(cloud_tag);
        if removed.is_some() {
            debug!("Removed cloud {:?}", cloud_tag);
        }
        removed
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        debug!("Clearing {} cached clouds", self.pack.len());
        self.pack.clouds.clear();
    }

    /// Cloud tags, sorted.
    #[must_use]
    pub fn cloud_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.pack.clouds.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Slice tags of `cloud_tag`, sorted. Empty if the cloud is unknown.
    #[must_use]
    pub fn slice_tags(&self, cloud_tag: &str) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .pack
            .clouds
            .get(cloud_tag)
            .map(|entry| entry.slices.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tags.sort_unstable();
        tags
    }

    /// Number of clouds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pack.len()
    }

    /// Returns true if no cloud is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pack.is_empty()
    }

    /// The whole cache state.
    #[must_use]
    pub fn pack(&self) -> &CloudPack {
        &self.pack
    }

    /// Swaps in a new state, returning the old one.
    pub fn replace_pack(&mut self, pack: CloudPack) -> CloudPack {
        std::mem::replace(&mut self.pack, pack)
    }

    /// Consumes the cache and returns its state.
    #[must_use]
    pub fn into_pack(self) -> CloudPack {
        self.pack
    }
}

/// A cache behind a single lock, for sharing between threads.
///
/// The lock guards the whole pack. Compound operations (look up, compute,
/// store) should hold one write guard throughout so no other writer can
/// interleave.
#[derive(Clone, Debug, Default)]
pub struct SharedCloudCache {
    inner: Arc<RwLock<CloudCache>>,
}

impl SharedCloudCache {
    /// Creates an empty shared cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing cache.
    #[must_use]
    pub fn from_cache(cache: CloudCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Acquires shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, CloudCache> {
        self.inner.read()
    }

    /// Acquires exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, CloudCache> {
        self.inner.write()
    }

    /// Runs `f` under the read lock.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CloudCache) -> R,
    {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CloudCache) -> R,
    {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_slice(value: f32) -> Slice {
        Slice::new(vec![value; 4], Vec2::new(2.0, 2.0), IntPoint::new(2, 2)).unwrap()
    }

    fn small_grid() -> OccupancyGrid {
        OccupancyGrid::from_points(vec![true, false], IntVec3::new(2, 1, 1)).unwrap()
    }

    #[test]
    fn test_missing_cloud_is_not_found() {
        let cache = CloudCache::new();
        let found = cache.get_cloud("missing");
        assert!(found.is_none());

        let grid = found.unwrap_or_default();
        assert_eq!(grid.density(), IntVec3::ZERO);
        assert!(grid.points().is_empty());
    }

    #[test]
    fn test_slice_before_cloud_creates_entry() {
        let mut cache = CloudCache::new();
        cache.set_slice("cloudA", "sliceA", small_slice(1.0));

        let grid = cache.get_cloud("cloudA").unwrap();
        assert_eq!(grid, OccupancyGrid::default());
        assert_eq!(cache.get_slice("cloudA", "sliceA"), Some(small_slice(1.0)));
        assert!(cache.get_slice("cloudA", "sliceB").is_none());
        assert!(cache.get_slice("cloudB", "sliceA").is_none());
    }

    #[test]
    fn test_set_cloud_keeps_slices() {
        let mut cache = CloudCache::new();
        cache.set_slice("cloudA", "sliceA", small_slice(1.0));
        cache.set_cloud("cloudA", small_grid());

        let entry = cache.get_cloud_with_slices("cloudA").unwrap();
        assert_eq!(entry.point_cloud, small_grid());
        assert_eq!(entry.slices.len(), 1);
    }

    #[test]
    fn test_set_slice_overwrites() {
        let mut cache = CloudCache::new();
        cache.set_slice("c", "s", small_slice(1.0));
        cache.set_slice("c", "s", small_slice(2.0));
        assert_eq!(cache.with_slice("c", "s", |s| s.data()[0]), Some(2.0));
        assert_eq!(cache.slice_tags("c"), vec!["s"]);
    }

    #[test]
    fn test_returned_copies_are_detached() {
        let mut cache = CloudCache::new();
        cache.set_cloud("c", small_grid());

        let mut copy = cache.get_cloud("c").unwrap();
        copy.set(IntVec3::new(1, 0, 0), true);
        assert_eq!(cache.with_cloud("c", OccupancyGrid::occupied_count), Some(1));
    }

    #[test]
    fn test_maintenance() {
        let mut cache = CloudCache::new();
        cache.set_cloud("b", small_grid());
        cache.set_cloud("a", small_grid());
        cache.set_slice("a", "z", small_slice(1.0));
        cache.set_slice("a", "y", small_slice(1.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.cloud_tags(), vec!["a", "b"]);
        assert_eq!(cache.slice_tags("a"), vec!["y", "z"]);
        assert!(cache.slice_tags("nope").is_empty());
        assert!(cache.contains_slice("a", "y"));

        let removed = cache.remove_cloud("a").unwrap();
        assert_eq!(removed.slices.len(), 2);
        assert!(!cache.contains_cloud("a"));
        assert!(cache.remove_cloud("a").is_none());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_test_pack_shape() {
        let pack = CloudPack::test_pack();
        assert_eq!(pack.len(), 1);
        assert_eq!(pack.slice_count(), 1);
        let entry = &pack.clouds["Test"];
        assert_eq!(entry.point_cloud.points(), &[true]);
        assert_eq!(entry.slices["Test"].data(), &[1.0]);
    }

    #[test]
    fn test_shared_cache_across_threads() {
        let shared = SharedCloudCache::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.with_write(|cache| {
                        cache.set_slice("cloud", format!("slice{i}"), small_slice(i as f32));
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.read().slice_tags("cloud").len(), 4);
        assert_eq!(shared.with_read(CloudCache::len), 1);
    }
}
