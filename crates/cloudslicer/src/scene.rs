//! # Scene Files
//!
//! A scene file places collision shapes in the world and says which box to
//! voxelize and which planes to cut:
//!
//! ```toml
//! [slicer]
//! cloud_tag = "Demo"
//!
//! [cloud]
//! center = [0.0, 0.0, 0.0]
//! extent = [50.0, 50.0, 50.0]
//! density = [32, 32, 32]
//!
//! [[shapes]]
//! kind = "cuboid"
//! translation = [0.0, 0.0, -30.0]
//! half_extents = [60.0, 60.0, 5.0]
//!
//! [[shapes]]
//! kind = "ball"
//! translation = [10.0, 0.0, 0.0]
//! radius = 15.0
//!
//! [[planes]]
//! tag = "Z0"
//! origin = [0.0, 0.0, 0.0]
//! physical_size = [100.0, 100.0]
//! resolution = [32, 32]
//! ```
//!
//! `[slicer]` takes every key of [`SlicerConfig`]. A plane without
//! `rotation` faces up (normal +Z).

use std::path::Path;

use cloudslicer_core::{CloudBox, ParryScene, SliceRequest, SlicerConfig};
use cloudslicer_shared::{IntPoint, IntVec3, Rotator, Vec2, Vec3};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// A whole scene file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Slicer settings.
    #[serde(default)]
    pub slicer: SlicerConfig,
    /// Box to voxelize.
    pub cloud: CloudConfig,
    /// Solid bodies.
    #[serde(default)]
    pub shapes: Vec<ShapeConfig>,
    /// Planes to cut through the grid.
    #[serde(default)]
    pub planes: Vec<PlaneConfig>,
}

/// The voxelized box and its lattice.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloudConfig {
    /// Box centre.
    pub center: [f32; 3],
    /// Box half size.
    pub extent: [f32; 3],
    /// Samples per axis.
    pub density: [i32; 3],
}

/// One collision body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeConfig {
    /// Axis-aligned box.
    Cuboid {
        /// Centre.
        translation: [f32; 3],
        /// Half size along each axis.
        half_extents: [f32; 3],
    },
    /// Sphere.
    Ball {
        /// Centre.
        translation: [f32; 3],
        /// Radius.
        radius: f32,
    },
    /// Capsule with its axis along Z.
    Capsule {
        /// Centre.
        translation: [f32; 3],
        /// Half length of the straight segment.
        half_height: f32,
        /// Radius.
        radius: f32,
    },
}

/// One cutting plane.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaneConfig {
    /// Slice tag the result is cached under.
    pub tag: String,
    /// Any point on the plane.
    pub origin: [f32; 3],
    /// Plane orientation; Z of the rotation is the normal.
    #[serde(default)]
    pub rotation: Rotator,
    /// Physical size of the image rectangle.
    pub physical_size: [f32; 2],
    /// Output pixels per axis.
    pub resolution: [i32; 2],
}

impl SceneConfig {
    /// Parses and validates a scene.
    ///
    /// # Errors
    ///
    /// `Toml` for malformed documents, `InvalidScene` or `Cloud` for
    /// impossible values.
    pub fn from_toml_str(text: &str) -> AppResult<Self> {
        let scene: Self = toml::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Loads and validates a scene file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise see
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Built-in scene used when no file is given: a floor slab, a ball
    /// resting on it and a standing capsule, cut by one horizontal and one
    /// vertical plane.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            slicer: SlicerConfig {
                cloud_tag: "Demo".into(),
                ..SlicerConfig::default()
            },
            cloud: CloudConfig {
                center: [0.0, 0.0, 0.0],
                extent: [50.0, 50.0, 50.0],
                density: [24, 24, 24],
            },
            shapes: vec![
                ShapeConfig::Cuboid {
                    translation: [0.0, 0.0, -35.0],
                    half_extents: [60.0, 60.0, 8.0],
                },
                ShapeConfig::Ball {
                    translation: [-15.0, 5.0, -5.0],
                    radius: 20.0,
                },
                ShapeConfig::Capsule {
                    translation: [25.0, -20.0, 0.0],
                    half_height: 20.0,
                    radius: 8.0,
                },
            ],
            planes: vec![
                PlaneConfig {
                    tag: "Horizontal".into(),
                    origin: [0.0, 0.0, -5.0],
                    rotation: Rotator::IDENTITY,
                    physical_size: [100.0, 100.0],
                    resolution: [32, 32],
                },
                PlaneConfig {
                    tag: "Vertical".into(),
                    origin: [0.0, 0.0, 0.0],
                    rotation: Rotator::new(90.0, 0.0, 0.0),
                    physical_size: [100.0, 100.0],
                    resolution: [32, 32],
                },
            ],
        }
    }

    /// Checks everything serde cannot.
    ///
    /// # Errors
    ///
    /// `Cloud(InvalidConfig)` for bad slicer settings, `InvalidScene` for
    /// non-positive shape sizes, a malformed cloud box, duplicate plane tags
    /// or empty plane resolutions.
    pub fn validate(&self) -> AppResult<()> {
        self.slicer.validate()?;

        let density = self.density();
        if !density.all_at_least(1) {
            return Err(AppError::InvalidScene(format!(
                "cloud density {:?} must be at least 1 on every axis",
                self.cloud.density
            )));
        }
        if !self.cloud_box().is_well_formed() {
            return Err(AppError::InvalidScene(
                "cloud extent must be positive on every axis".into(),
            ));
        }

        for (i, shape) in self.shapes.iter().enumerate() {
            if !shape.is_well_formed() {
                return Err(AppError::InvalidScene(format!(
                    "shape #{i} has a non-positive size"
                )));
            }
        }

        let mut tags = std::collections::HashSet::new();
        for plane in &self.planes {
            if !tags.insert(plane.tag.as_str()) {
                return Err(AppError::InvalidScene(format!(
                    "plane tag {:?} is used twice",
                    plane.tag
                )));
            }
            if plane.resolution.iter().any(|&r| r < 1) {
                return Err(AppError::InvalidScene(format!(
                    "plane {:?} needs a resolution of at least 1x1",
                    plane.tag
                )));
            }
        }
        Ok(())
    }

    /// The voxelized box.
    #[must_use]
    pub fn cloud_box(&self) -> CloudBox {
        CloudBox::new(
            Vec3::from_array(self.cloud.center),
            Vec3::from_array(self.cloud.extent),
        )
    }

    /// Samples per axis.
    #[must_use]
    pub fn density(&self) -> IntVec3 {
        let [x, y, z] = self.cloud.density;
        IntVec3::new(x, y, z)
    }

    /// Places every shape in a fresh scene.
    #[must_use]
    pub fn build_scene(&self) -> ParryScene {
        let mut scene = ParryScene::new();
        for shape in &self.shapes {
            match *shape {
                ShapeConfig::Cuboid {
                    translation,
                    half_extents,
                } => scene.add_cuboid(Vec3::from_array(translation), Vec3::from_array(half_extents)),
                ShapeConfig::Ball { translation, radius } => {
                    scene.add_ball(Vec3::from_array(translation), radius);
                }
                ShapeConfig::Capsule {
                    translation,
                    half_height,
                    radius,
                } => scene.add_capsule(Vec3::from_array(translation), half_height, radius),
            }
        }
        scene
    }

    /// One resample request per plane, with its tag.
    #[must_use]
    pub fn slice_requests(&self) -> Vec<(String, SliceRequest)> {
        let cloud_box = self.cloud_box();
        self.planes
            .iter()
            .map(|plane| {
                let [w, h] = plane.physical_size;
                let [rx, ry] = plane.resolution;
                let request = SliceRequest {
                    plane_origin: Vec3::from_array(plane.origin),
                    plane_orientation: plane.rotation,
                    cloud_box,
                    physical_size: Vec2::new(w, h),
                    resolution: IntPoint::new(rx, ry),
                };
                (plane.tag.clone(), request)
            })
            .collect()
    }
}

impl ShapeConfig {
    fn is_well_formed(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            Self::Cuboid { half_extents, .. } => half_extents.iter().all(|&h| positive(h)),
            Self::Ball { radius, .. } => positive(radius),
            Self::Capsule {
                half_height, radius, ..
            } => positive(half_height) && positive(radius),
        }
    }
}
