//! # Cloud Error Types
//!
//! All errors that can occur while building, slicing, caching or persisting
//! point clouds.

use std::path::PathBuf;

use cloudslicer_shared::{IntPoint, IntVec3};
use thiserror::Error;

/// Errors that can occur in the cloud slicing system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CloudError {
    /// No geometry oracle is attached, so nothing can be probed.
    #[error("no spatial context available")]
    NoSpatialContext,

    /// The requested cloud (or slice within it) is not in the cache.
    #[error("not cached: cloud {cloud_tag:?}{}", slice_suffix(.slice_tag.as_deref()))]
    NotCached {
        /// Cloud tag that was looked up.
        cloud_tag: String,
        /// Slice tag that was looked up, if any.
        slice_tag: Option<String>,
    },

    /// The in-memory pack could not be turned into a document.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The document does not describe a valid pack.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The file content is not well-formed JSON.
    #[error("malformed pack document: {0}")]
    Parse(String),

    /// Reading or writing the pack file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// The pack file does not exist.
    #[error("pack file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A write exceeded the pre-declared capacity of a data array.
    #[error("capacity exceeded: capacity {capacity}, requested {requested}")]
    CapacityExceeded {
        /// Declared capacity.
        capacity: usize,
        /// Number of elements the caller tried to store.
        requested: usize,
    },

    /// Grid density has a component below 1.
    #[error("invalid density {0:?}: every component must be at least 1")]
    InvalidDensity(IntVec3),

    /// Box extent has a non-positive or non-finite component.
    #[error("invalid box extent: every component must be positive and finite")]
    InvalidExtent,

    /// Plane origin, orientation or image size holds NaN or infinity.
    #[error("invalid slice plane: origin, orientation and size must be finite")]
    InvalidPlane,

    /// Target resolution has a component below 1.
    #[error("invalid resolution {0:?}: every component must be at least 1")]
    InvalidResolution(IntPoint),

    /// The request is larger than the configured latency budget.
    #[error("budget exceeded: requested {requested} samples, budget {budget}")]
    BudgetExceeded {
        /// Samples the request would take.
        requested: usize,
        /// Configured maximum.
        budget: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn slice_suffix(slice_tag: Option<&str>) -> String {
    slice_tag
        .map(|tag| format!(", slice {tag:?}"))
        .unwrap_or_default()
}

impl CloudError {
    /// Creates a `NotCached` error for a missing cloud.
    #[must_use]
    pub fn cloud_not_cached(cloud_tag: impl Into<String>) -> Self {
        Self::NotCached {
            cloud_tag: cloud_tag.into(),
            slice_tag: None,
        }
    }

    /// Creates a `NotCached` error for a missing slice.
    #[must_use]
    pub fn slice_not_cached(cloud_tag: impl Into<String>, slice_tag: impl Into<String>) -> Self {
        Self::NotCached {
            cloud_tag: cloud_tag.into(),
            slice_tag: Some(slice_tag.into()),
        }
    }
}

impl From<std::io::Error> for CloudError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for CloudError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type for cloud operations.
pub type CloudResult<T> = Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_cached_messages() {
        let err = CloudError::cloud_not_cached("cloudA");
        assert_eq!(err.to_string(), "not cached: cloud \"cloudA\"");

        let err = CloudError::slice_not_cached("cloudA", "sliceA");
        assert_eq!(err.to_string(), "not cached: cloud \"cloudA\", slice \"sliceA\"");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(CloudError::from(io), CloudError::Io(msg) if msg.contains("denied")));
    }
}
