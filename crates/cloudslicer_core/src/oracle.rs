//! # Geometry Oracle
//!
//! The voxelizer never looks at geometry directly. It only asks one
//! question: "does the segment from `start` to `end` cross a solid
//! surface?". Anything that can answer that is a [`GeometryOracle`].
//!
//! Two implementations ship with the crate:
//!
//! - [`ParryScene`]: a set of `parry3d` shapes placed in world space
//! - [`FnOracle`]: wraps a closure, handy for analytic scenes and tests

use std::sync::Arc;

use cloudslicer_shared::Vec3;
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::query::Ray;
use parry3d::shape::SharedShape;

/// Segment-versus-scene intersection query.
pub trait GeometryOracle {
    /// Returns true if the segment `start → end` hits solid geometry.
    fn probe_segment(&self, start: Vec3, end: Vec3) -> bool;
}

impl<T: GeometryOracle + ?Sized> GeometryOracle for &T {
    fn probe_segment(&self, start: Vec3, end: Vec3) -> bool {
        (**self).probe_segment(start, end)
    }
}

impl<T: GeometryOracle + ?Sized> GeometryOracle for Box<T> {
    fn probe_segment(&self, start: Vec3, end: Vec3) -> bool {
        (**self).probe_segment(start, end)
    }
}

impl<T: GeometryOracle + ?Sized> GeometryOracle for Arc<T> {
    fn probe_segment(&self, start: Vec3, end: Vec3) -> bool {
        (**self).probe_segment(start, end)
    }
}

/// Oracle backed by a closure `(start, end) -> hit`.
pub struct FnOracle<F>(pub F);

impl<F> GeometryOracle for FnOracle<F>
where
    F: Fn(Vec3, Vec3) -> bool,
{
    fn probe_segment(&self, start: Vec3, end: Vec3) -> bool {
        (self.0)(start, end)
    }
}

/// A shape placed in world space.
#[derive(Clone)]
pub struct SceneBody {
    /// Collision shape.
    pub shape: SharedShape,
    /// World placement of the shape.
    pub position: Isometry<Real>,
}

/// Static collection of `parry3d` shapes answering segment probes.
///
/// A probe hits when the segment crosses the boundary of any body. The
/// cast is non-solid, so a segment starting inside a body reports the
/// point where it leaves that body.
#[derive(Clone, Default)]
pub struct ParryScene {
    bodies: Vec<SceneBody>,
}

impl ParryScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape at the given placement.
    pub fn add(&mut self, shape: SharedShape, position: Isometry<Real>) {
        self.bodies.push(SceneBody { shape, position });
    }

    /// Adds a shape and returns the scene, for chained construction.
    #[must_use]
    pub fn with(mut self, shape: SharedShape, position: Isometry<Real>) -> Self {
        self.add(shape, position);
        self
    }

    /// Adds an axis-aligned box centred at `center`.
    pub fn add_cuboid(&mut self, center: Vec3, half_extents: Vec3) {
        self.add(
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            Isometry::translation(center.x, center.y, center.z),
        );
    }

    /// Adds a sphere centred at `center`.
    pub fn add_ball(&mut self, center: Vec3, radius: f32) {
        self.add(
            SharedShape::ball(radius),
            Isometry::translation(center.x, center.y, center.z),
        );
    }

    /// Adds a capsule centred at `center` with its axis along Z.
    pub fn add_capsule(&mut self, center: Vec3, half_height: f32, radius: f32) {
        self.add(
            SharedShape::capsule_z(half_height, radius),
            Isometry::translation(center.x, center.y, center.z),
        );
    }

    /// Bodies in insertion order.
    #[must_use]
    pub fn bodies(&self) -> &[SceneBody] {
        &self.bodies
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if the scene has no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl GeometryOracle for ParryScene {
    fn probe_segment(&self, start: Vec3, end: Vec3) -> bool {
        let dir = end - start;
        if dir.length_squared() <= Real::EPSILON {
            return false;
        }

        // Time of impact is measured in segment lengths, so 1.0 is `end`.
        let ray = Ray::new(
            Point::new(start.x, start.y, start.z),
            Vector::new(dir.x, dir.y, dir.z),
        );
        self.bodies.iter().any(|body| {
            body.shape
                .cast_ray(&body.position, &ray, 1.0, false)
                .is_some()
        })
    }
}
