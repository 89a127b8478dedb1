//! # Slicer Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.
//!
//! ```toml
//! pack_path = "FCloudPackDefault.txt"
//! cloud_tag = "Default"
//! probe_nudge = 1.0
//! max_grid_points = 1000000
//! ```

use std::path::{Path, PathBuf};

use cloudslicer_shared::{
    DEFAULT_CLOUD_TAG, DEFAULT_INTENSITY_SCALE, DEFAULT_PACK_FILE, DEFAULT_PROBE_NUDGE,
    SMALL_NUMBER,
};
use serde::Deserialize;

use crate::error::{CloudError, CloudResult};

/// Settings for the voxelizer, the resampler and the pack file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlicerConfig {
    /// Where the cloud pack is saved and loaded.
    #[serde(default = "default_pack_path")]
    pub pack_path: PathBuf,

    /// Cloud tag the slicer reads and writes.
    #[serde(default = "default_cloud_tag")]
    pub cloud_tag: String,

    /// Distance a probe endpoint is pushed outward when it coincides with
    /// the sample point.
    #[serde(default = "default_probe_nudge")]
    pub probe_nudge: f32,

    /// Tolerance for "sample lies on the box face".
    #[serde(default = "default_surface_tolerance")]
    pub surface_tolerance: f32,

    /// Intensity of a pixel whose eight cell corners are all occupied.
    #[serde(default = "default_intensity_scale")]
    pub intensity_scale: f32,

    /// Largest grid (`Nx * Ny * Nz`) the voxelizer accepts.
    #[serde(default = "default_max_grid_points")]
    pub max_grid_points: usize,

    /// Largest slice (`W * H`) the resampler accepts.
    #[serde(default = "default_max_slice_pixels")]
    pub max_slice_pixels: usize,

    /// Report every voxelizer sample to the attached debug sink.
    #[serde(default)]
    pub draw_debug: bool,

    /// Side length of the square staging canvas.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: usize,
}

fn default_pack_path() -> PathBuf {
    PathBuf::from(DEFAULT_PACK_FILE)
}

fn default_cloud_tag() -> String {
    DEFAULT_CLOUD_TAG.to_string()
}

fn default_probe_nudge() -> f32 {
    DEFAULT_PROBE_NUDGE
}

fn default_surface_tolerance() -> f32 {
    SMALL_NUMBER
}

fn default_intensity_scale() -> f32 {
    DEFAULT_INTENSITY_SCALE
}

fn default_max_grid_points() -> usize {
    16_777_216
}

fn default_max_slice_pixels() -> usize {
    4_194_304
}

fn default_canvas_size() -> usize {
    64
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            pack_path: default_pack_path(),
            cloud_tag: default_cloud_tag(),
            probe_nudge: default_probe_nudge(),
            surface_tolerance: default_surface_tolerance(),
            intensity_scale: default_intensity_scale(),
            max_grid_points: default_max_grid_points(),
            max_slice_pixels: default_max_slice_pixels(),
            draw_debug: false,
            canvas_size: default_canvas_size(),
        }
    }
}

impl SlicerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> CloudResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is missing, `Io` if it cannot be read
    /// and `InvalidConfig` if its content is rejected.
    pub fn load(path: &Path) -> CloudResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CloudError::NotFound(path.to_path_buf())
            } else {
                CloudError::from(err)
            }
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first offending field.
    pub fn validate(&self) -> CloudResult<()> {
        if self.cloud_tag.is_empty() {
            return Err(CloudError::InvalidConfig("cloud_tag must not be empty".into()));
        }
        if !(self.probe_nudge.is_finite() && self.probe_nudge > 0.0) {
            return Err(CloudError::InvalidConfig("probe_nudge must be positive".into()));
        }
        if !(self.surface_tolerance.is_finite() && self.surface_tolerance >= 0.0) {
            return Err(CloudError::InvalidConfig(
                "surface_tolerance must be non-negative".into(),
            ));
        }
        if !(self.intensity_scale.is_finite() && self.intensity_scale > 0.0) {
            return Err(CloudError::InvalidConfig("intensity_scale must be positive".into()));
        }
        if self.max_grid_points == 0 || self.max_slice_pixels == 0 {
            return Err(CloudError::InvalidConfig("budgets must be non-zero".into()));
        }
        if self.canvas_size == 0 {
            return Err(CloudError::InvalidConfig("canvas_size must be non-zero".into()));
        }
        match self.canvas_size.checked_mul(self.canvas_size) {
            Some(pixels) if pixels <= self.max_slice_pixels => {}
            _ => {
                return Err(CloudError::InvalidConfig(format!(
                    "canvas_size {} squared exceeds max_slice_pixels {}",
                    self.canvas_size, self.max_slice_pixels
                )));
            }
        }
        Ok(())
    }

    /// Pixel count of the staging canvas.
    ///
    /// Saturates for configurations that fail [`validate`](Self::validate).
    #[must_use]
    pub fn canvas_capacity(&self) -> usize {
        self.canvas_size.saturating_mul(self.canvas_size)
    }
}
