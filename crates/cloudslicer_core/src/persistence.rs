//! # Pack Persistence
//!
//! The whole cache is stored as one JSON document:
//!
//! ```json
//! { "Data": {
//!     "<cloud tag>": {
//!       "PointCloud": { "Points": [true, false], "PointDensity": { "X": 2, "Y": 1, "Z": 1 } },
//!       "SlicePack": { "Data": {
//!         "<slice tag>": {
//!           "PhysicalSize": { "X": 10.0, "Y": 10.0 },
//!           "Resolution": { "X": 2, "Y": 2 },
//!           "Data": [0.0, 32.0, 64.0, 256.0] } } } } } }
//! ```
//!
//! Vectors are written as `{"X", "Y"[, "Z"]}` objects. Loading also
//! accepts plain arrays (`[2, 1, 1]`).
//!
//! ## Failure behaviour
//!
//! - Save converts and serializes in memory before touching the disk. If
//!   conversion fails nothing is written. The write itself is a plain
//!   overwrite (no temp file + rename).
//! - Load parses, converts and validates completely before anything is
//!   handed back, so a failed load never disturbs the caller's cache.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use cloudslicer_shared::{IntPoint, IntVec3, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cache::{CloudCache, CloudEntry, CloudPack};
use crate::error::{CloudError, CloudResult};
use crate::grid::OccupancyGrid;
use crate::slice::Slice;

// =============================================================================
// DOCUMENT MODEL
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackDocument {
    #[serde(rename = "Data")]
    data: BTreeMap<String, CloudDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CloudDocument {
    #[serde(rename = "PointCloud")]
    point_cloud: PointCloudDocument,
    #[serde(rename = "SlicePack")]
    slice_pack: SlicePackDocument,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PointCloudDocument {
    #[serde(rename = "Points")]
    points: Vec<bool>,
    #[serde(rename = "PointDensity")]
    point_density: Int3Document,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlicePackDocument {
    #[serde(rename = "Data")]
    data: BTreeMap<String, SliceDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SliceDocument {
    #[serde(rename = "PhysicalSize")]
    physical_size: Float2Document,
    #[serde(rename = "Resolution")]
    resolution: Int2Document,
    #[serde(rename = "Data")]
    data: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Int3Document {
    Object {
        #[serde(rename = "X")]
        x: i32,
        #[serde(rename = "Y")]
        y: i32,
        #[serde(rename = "Z")]
        z: i32,
    },
    Array([i32; 3]),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Int2Document {
    Object {
        #[serde(rename = "X")]
        x: i32,
        #[serde(rename = "Y")]
        y: i32,
    },
    Array([i32; 2]),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Float2Document {
    Object {
        #[serde(rename = "X")]
        x: f32,
        #[serde(rename = "Y")]
        y: f32,
    },
    Array([f32; 2]),
}

impl From<IntVec3> for Int3Document {
    fn from(v: IntVec3) -> Self {
        Self::Object {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Int3Document> for IntVec3 {
    fn from(doc: Int3Document) -> Self {
        match doc {
            Int3Document::Object { x, y, z } => Self::new(x, y, z),
            Int3Document::Array([x, y, z]) => Self::new(x, y, z),
        }
    }
}

impl From<IntPoint> for Int2Document {
    fn from(p: IntPoint) -> Self {
        Self::Object { x: p.x, y: p.y }
    }
}

impl From<Int2Document> for IntPoint {
    fn from(doc: Int2Document) -> Self {
        match doc {
            Int2Document::Object { x, y } | Int2Document::Array([x, y]) => Self::new(x, y),
        }
    }
}

impl From<Vec2> for Float2Document {
    fn from(v: Vec2) -> Self {
        Self::Object { x: v.x, y: v.y }
    }
}

impl From<Float2Document> for Vec2 {
    fn from(doc: Float2Document) -> Self {
        match doc {
            Float2Document::Object { x, y } | Float2Document::Array([x, y]) => Self::new(x, y),
        }
    }
}

// =============================================================================
// MODEL <-> DOCUMENT
// =============================================================================

impl TryFrom<&CloudPack> for PackDocument {
    type Error = CloudError;

    fn try_from(pack: &CloudPack) -> CloudResult<Self> {
        let mut data = BTreeMap::new();
        for (cloud_tag, entry) in &pack.clouds {
            let mut slices = BTreeMap::new();
            for (slice_tag, slice) in &entry.slices {
                // JSON has no NaN or infinity; serde_json would emit `null`.
                let size = slice.physical_size();
                if !(size.x.is_finite() && size.y.is_finite())
                    || slice.data().iter().any(|v| !v.is_finite())
                {
                    return Err(CloudError::Serialization(format!(
                        "slice {slice_tag:?} of cloud {cloud_tag:?} holds non-finite values"
                    )));
                }
                slices.insert(
                    slice_tag.clone(),
                    SliceDocument {
                        physical_size: size.into(),
                        resolution: slice.resolution().into(),
                        data: slice.data().to_vec(),
                    },
                );
            }
            data.insert(
                cloud_tag.clone(),
                CloudDocument {
                    point_cloud: PointCloudDocument {
                        points: entry.point_cloud.points().to_vec(),
                        point_density: entry.point_cloud.density().into(),
                    },
                    slice_pack: SlicePackDocument { data: slices },
                },
            );
        }
        Ok(Self { data })
    }
}

impl TryFrom<PackDocument> for CloudPack {
    type Error = CloudError;

    fn try_from(doc: PackDocument) -> CloudResult<Self> {
        let mut clouds = HashMap::with_capacity(doc.data.len());
        for (cloud_tag, cloud) in doc.data {
            let point_cloud = OccupancyGrid::from_points(
                cloud.point_cloud.points,
                cloud.point_cloud.point_density.into(),
            )
            .map_err(|err| invalid_entry(&cloud_tag, None, &err))?;

            let mut slices = HashMap::with_capacity(cloud.slice_pack.data.len());
            for (slice_tag, slice) in cloud.slice_pack.data {
                let slice = Slice::new(slice.data, slice.physical_size.into(), slice.resolution.into())
                    .map_err(|err| invalid_entry(&cloud_tag, Some(&slice_tag), &err))?;
                slices.insert(slice_tag, slice);
            }

            clouds.insert(
                cloud_tag,
                CloudEntry {
                    point_cloud,
                    slices,
                },
            );
        }
        Ok(Self { clouds })
    }
}

fn invalid_entry(cloud_tag: &str, slice_tag: Option<&str>, err: &CloudError) -> CloudError {
    let reason = match err {
        CloudError::Deserialization(msg) => msg.clone(),
        other => other.to_string(),
    };
    match slice_tag {
        Some(slice_tag) => CloudError::Deserialization(format!(
            "slice {slice_tag:?} of cloud {cloud_tag:?}: {reason}"
        )),
        None => CloudError::Deserialization(format!("cloud {cloud_tag:?}: {reason}")),
    }
}

// =============================================================================
// TEXT
// =============================================================================

/// Serializes a pack to pretty-printed JSON. Keys are written sorted.
///
/// # Errors
///
/// Returns `Serialization` if a slice holds NaN or infinite values.
pub fn pack_to_json(pack: &CloudPack) -> CloudResult<String> {
    let doc = PackDocument::try_from(pack)?;
    serde_json::to_string_pretty(&doc).map_err(|err| CloudError::Serialization(err.to_string()))
}

/// Parses a pack from JSON text.
///
/// # Errors
///
/// Returns `Parse` if the text is not JSON, and `Deserialization` if it is
/// JSON but not a valid pack (missing fields, wrong types, point or pixel
/// counts that do not match the declared sizes).
pub fn pack_from_json(text: &str) -> CloudResult<CloudPack> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| CloudError::Parse(err.to_string()))?;
    let doc: PackDocument =
        serde_json::from_value(value).map_err(|err| CloudError::Deserialization(err.to_string()))?;
    CloudPack::try_from(doc)
}

// =============================================================================
// FILES
// =============================================================================

/// Writes `pack` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// `Serialization` (nothing written) or `Io`.
pub fn save_pack(pack: &CloudPack, path: &Path) -> CloudResult<()> {
    let result = pack_to_json(pack).and_then(|json| {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    });

    match &result {
        Ok(()) => info!(
            "Saved cloud pack ({} clouds, {} slices) to {}",
            pack.len(),
            pack.slice_count(),
            path.display()
        ),
        Err(err) => error!("Failed to save cloud pack to {}: {}", path.display(), err),
    }
    result
}

/// Reads a pack from `path`.
///
/// # Errors
///
/// `NotFound`, `Io`, `Parse` or `Deserialization`.
pub fn load_pack(path: &Path) -> CloudResult<CloudPack> {
    let result = std::fs::read_to_string(path)
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CloudError::NotFound(path.to_path_buf())
            } else {
                CloudError::from(err)
            }
        })
        .and_then(|text| pack_from_json(&text));

    match &result {
        Ok(pack) => info!(
            "Loaded cloud pack ({} clouds, {} slices) from {}",
            pack.len(),
            pack.slice_count(),
            path.display()
        ),
        Err(err) => error!("Failed to load cloud pack from {}: {}", path.display(), err),
    }
    result
}

impl CloudCache {
    /// Writes the whole cache to `path`.
    ///
    /// # Errors
    ///
    /// See [`save_pack`].
    pub fn save(&self, path: &Path) -> CloudResult<()> {
        save_pack(self.pack(), path)
    }

    /// Replaces the whole cache with the pack stored at `path`.
    ///
    /// On any error the cache keeps its current content.
    ///
    /// # Errors
    ///
    /// See [`load_pack`].
    pub fn load(&mut self, path: &Path) -> CloudResult<()> {
        let pack = load_pack(path)?;
        self.replace_pack(pack);
        Ok(())
    }
}
