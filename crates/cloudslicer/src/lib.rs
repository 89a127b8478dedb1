//! # Cloudslicer
//!
//! Scene files and the `slice_inspect` tool.
//!
//! A [`SceneConfig`] describes collision shapes, the box to voxelize and
//! the planes to cut. `slice_inspect` turns one into a cached, saved pack:
//!
//! ```text
//! scene.toml ──► ParryScene ──► Slicer ──► CloudCache ──► FCloudPackDefault.txt
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod scene;

pub use error::{AppError, AppResult};
pub use scene::{CloudConfig, PlaneConfig, SceneConfig, ShapeConfig};
