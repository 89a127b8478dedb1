//! # Cloudslicer Core
//!
//! Voxel occupancy grids, plane slices through them and the on-disk cache
//! that keeps both between runs.
//!
//! - A [`VoxelGridBuilder`] samples a box on a regular lattice and asks a
//!   [`GeometryOracle`] which samples are inside solid geometry.
//! - A [`SliceResampler`] cuts a grid with an oriented plane and produces
//!   a fixed resolution intensity image.
//! - A [`CloudCache`] stores grids and slices by tag and round trips the
//!   whole pack through one JSON file.
//! - The [`Slicer`] front end runs the "return cached, else compute and
//!   cache" operations on top of all three.
//!
//! ## Architecture Rules
//!
//! 1. **Synchronous** - no threads, no async; share a cache through
//!    [`SharedCloudCache`] if you need to
//! 2. **All or nothing** - a failed operation never leaves a half-written
//!    cache behind
//! 3. **Deterministic** - same oracle and same inputs give the same grid
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cloudslicer_core::{CloudCache, ParryScene, Slicer, SlicerConfig};
//! use cloudslicer_shared::{IntVec3, Vec3};
//!
//! let mut scene = ParryScene::new();
//! scene.add_cuboid(Vec3::ZERO, Vec3::new(20.0, 20.0, 2.0));
//!
//! let mut slicer = Slicer::new(SlicerConfig::default())?;
//! slicer.attach_world(Arc::new(scene));
//!
//! let mut cache = CloudCache::new();
//! let grid = slicer.generate_or_load_point_cloud(
//!     &mut cache, Vec3::ZERO, Vec3::splat(10.0), IntVec3::new(16, 16, 16))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod config;
pub mod data_array;
pub mod debug;
pub mod error;
pub mod grid;
pub mod oracle;
pub mod persistence;
pub mod resample;
pub mod slice;
pub mod slicer;
pub mod voxelizer;

pub use cache::{CloudCache, CloudEntry, CloudPack, SharedCloudCache};
pub use config::SlicerConfig;
pub use data_array::{to_image_coord, DataArray};
pub use debug::{grid_to_ascii, slice_to_ascii, values_to_ascii, DebugDraw, SampleRecorder};
pub use error::{CloudError, CloudResult};
pub use grid::{CloudBox, OccupancyGrid};
pub use oracle::{FnOracle, GeometryOracle, ParryScene, SceneBody};
pub use persistence::{load_pack, pack_from_json, pack_to_json, save_pack};
pub use resample::{ProjectionCanvas, SliceRequest, SliceResampler};
pub use slice::Slice;
pub use slicer::Slicer;
pub use voxelizer::VoxelGridBuilder;
