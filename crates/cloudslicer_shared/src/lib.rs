//! # Cloudslicer Shared
//!
//! Common types used by every crate in the workspace.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `parry3d` or any other geometry backend
//! - `serde_json` or anything that touches the filesystem
//!
//! If you need scene queries, put them in `cloudslicer_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    ASCII_SOLID_THRESHOLD, CELL_CORNERS, DEFAULT_CLOUD_TAG, DEFAULT_INTENSITY_SCALE,
    DEFAULT_PACK_FILE, DEFAULT_PROBE_NUDGE,
};
pub use math::{nearly_equal, IntPoint, IntVec3, Plane, Rotator, Vec2, Vec3, SMALL_NUMBER};
