//! Mathematical types shared by the voxelizer, the resampler and the cache.
//!
//! World space is right-handed with Z up. Rotators follow the
//! pitch/yaw/roll convention: yaw turns around Z, pitch around Y and
//! roll around X, all in degrees.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Default tolerance used by [`nearly_equal`].
pub const SMALL_NUMBER: f32 = 1.0e-6;

/// Returns true if `a` and `b` differ by at most `tolerance`.
#[inline]
#[must_use]
pub fn nearly_equal(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

/// 3D Vector - positions, extents, directions
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Vector with all components set to `v`
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a degenerate vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= SMALL_NUMBER {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Component-wise product
    #[must_use]
    pub fn mul_elem(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Component-wise quotient
    #[must_use]
    pub fn div_elem(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y, self.z / other.z)
    }

    /// True if every component is finite
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Truncates every component toward zero (saturating at the `i32` range).
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn truncate(self) -> IntVec3 {
        IntVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }

    /// Approximate equality with a per-component tolerance
    #[must_use]
    pub fn nearly_equals(self, other: Self, tolerance: f32) -> bool {
        nearly_equal(self.x, other.x, tolerance)
            && nearly_equal(self.y, other.y, tolerance)
            && nearly_equal(self.z, other.z, tolerance)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// 2D Vector - physical image sizes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Returns true if no component is NaN or infinite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Integer 3D vector - lattice coordinates and grid densities
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct IntVec3 {
    /// X component
    pub x: i32,
    /// Y component
    pub y: i32,
    /// Z component
    pub z: i32,
}

impl IntVec3 {
    /// Creates a new IntVec3
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Product of the components, or 0 when any component is negative.
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn volume(self) -> usize {
        if self.x < 0 || self.y < 0 || self.z < 0 {
            return 0;
        }
        (self.x as usize)
            .saturating_mul(self.y as usize)
            .saturating_mul(self.z as usize)
    }

    /// True if every component is at least `min`
    #[must_use]
    pub const fn all_at_least(self, min: i32) -> bool {
        self.x >= min && self.y >= min && self.z >= min
    }

    /// Clamps every component into `[0, bounds - 1]`.
    #[must_use]
    pub fn clamp_to(self, bounds: Self) -> Self {
        Self::new(
            self.x.clamp(0, (bounds.x - 1).max(0)),
            self.y.clamp(0, (bounds.y - 1).max(0)),
            self.z.clamp(0, (bounds.z - 1).max(0)),
        )
    }

    /// Converts to a float vector
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl std::ops::Add for IntVec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Integer 2D point - image resolutions and pixel coordinates
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct IntPoint {
    /// X component (width / column)
    pub x: i32,
    /// Y component (height / row)
    pub y: i32,
}

impl IntPoint {
    /// Creates a new IntPoint
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero point
    pub const ZERO: Self = Self::new(0, 0);

    /// `x * y`, or 0 when any component is negative.
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn area(self) -> usize {
        if self.x < 0 || self.y < 0 {
            return 0;
        }
        (self.x as usize).saturating_mul(self.y as usize)
    }
}

/// Orientation as pitch/yaw/roll in degrees.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rotator {
    /// Rotation around the Y axis
    pub pitch: f32,
    /// Rotation around the Z axis
    pub yaw: f32,
    /// Rotation around the X axis
    pub roll: f32,
}

impl Rotator {
    /// Creates a new rotator
    #[must_use]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// No rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0);

    /// Returns true if no angle is NaN or infinite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }

    /// Unit axes of the rotation matrix as `(forward, right, up)`.
    ///
    /// With the identity rotator these are world X, Y and Z.
    #[must_use]
    pub fn axes(self) -> (Vec3, Vec3, Vec3) {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();

        let x_axis = Vec3::new(cp * cy, cp * sy, sp);
        let y_axis = Vec3::new(sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, -sr * cp);
        let z_axis = Vec3::new(-(cr * sp * cy + sr * sy), cy * sr - cr * sp * sy, cr * cp);

        (x_axis.normalized(), y_axis.normalized(), z_axis.normalized())
    }
}

/// Infinite plane `normal · p = w`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed distance of the plane from the origin along `normal`
    pub w: f32,
}

impl Plane {
    /// Plane through `origin` with the given normal (normalized here).
    #[must_use]
    pub fn from_point_normal(origin: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalized();
        Self {
            normal,
            w: origin.dot(normal),
        }
    }

    /// Signed distance from `point` to the plane
    #[must_use]
    pub fn plane_dot(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.w
    }

    /// Orthogonal projection of `point` onto the plane
    #[must_use]
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.plane_dot(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec3::new(5.0, 7.0, 9.0));

        let dot = a.dot(b);
        assert_eq!(dot, 32.0); // 1*4 + 2*5 + 3*6

        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(b.div_elem(Vec3::new(2.0, 5.0, 3.0)), Vec3::new(2.0, 1.0, 2.0));
    }

    #[test]
    fn test_truncate_toward_zero() {
        assert_eq!(Vec3::new(1.9, -0.5, -1.5).truncate(), IntVec3::new(1, 0, -1));
    }

    #[test]
    fn test_int_vec3_clamp_and_volume() {
        let bounds = IntVec3::new(4, 2, 1);
        assert_eq!(IntVec3::new(-3, 7, 0).clamp_to(bounds), IntVec3::new(0, 1, 0));
        assert_eq!(bounds.volume(), 8);
        assert_eq!(IntVec3::new(2, -1, 2).volume(), 0);
        assert_eq!(IntPoint::new(3, 5).area(), 15);
    }

    #[test]
    fn test_identity_rotator_axes() {
        let (x, y, z) = Rotator::IDENTITY.axes();
        assert!(x.nearly_equals(Vec3::X, 1e-6));
        assert!(y.nearly_equals(Vec3::Y, 1e-6));
        assert!(z.nearly_equals(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_rotator_axes_are_orthonormal() {
        let (x, y, z) = Rotator::new(30.0, 45.0, 60.0).axes();
        assert!((x.length() - 1.0).abs() < 1e-5);
        assert!(x.dot(y).abs() < 1e-5);
        assert!(y.dot(z).abs() < 1e-5);
        assert!(x.cross(y).nearly_equals(z, 1e-5));
    }

    #[test]
    fn test_yaw_turns_forward_axis() {
        let (x, _, z) = Rotator::new(0.0, 90.0, 0.0).axes();
        assert!(x.nearly_equals(Vec3::Y, 1e-6));
        assert!(z.nearly_equals(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_plane_projection() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(plane.plane_dot(Vec3::new(1.0, 1.0, 8.0)), 3.0);
        assert_eq!(plane.project(Vec3::new(1.0, 2.0, -4.0)), Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12); // 3 * 4 bytes
    }
}
