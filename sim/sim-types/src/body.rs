//! Body identity and pose types.
//!
//! Bodies live in an arena owned by whoever drives the simulation and are
//! addressed by [`BodyHandle`]. Constraints refer to their two sides through
//! [`BodyRef`], where [`BodyRef::WorldFixed`] stands for an immovable anchor
//! expressed directly in simulation space.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable index of a rigid body inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyHandle(pub usize);

impl BodyHandle {
    /// Create a new body handle.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for BodyHandle {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// One side of a constraint.
///
/// `WorldFixed` has infinite mass: it never moves and receives no impulses.
/// Anchors attached to it are interpreted in simulation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyRef {
    /// A simulated body in the arena.
    Dynamic(BodyHandle),
    /// The immovable world anchor.
    #[default]
    WorldFixed,
}

impl BodyRef {
    /// Get the handle if this side is dynamic.
    #[must_use]
    pub const fn handle(self) -> Option<BodyHandle> {
        match self {
            Self::Dynamic(handle) => Some(handle),
            Self::WorldFixed => None,
        }
    }

    /// Check if this side is the world anchor.
    #[must_use]
    pub const fn is_world(self) -> bool {
        matches!(self, Self::WorldFixed)
    }
}

impl From<BodyHandle> for BodyRef {
    fn from(handle: BodyHandle) -> Self {
        Self::Dynamic(handle)
    }
}

impl From<Option<BodyHandle>> for BodyRef {
    fn from(handle: Option<BodyHandle>) -> Self {
        handle.map_or(Self::WorldFixed, Self::Dynamic)
    }
}

/// Position and orientation of a rigid body or bone.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::{Point3, Vector3};
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Transform a point from local to parent coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to parent coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from parent to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from parent to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Compute the inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: `self * other` (apply `other`, then `self`).
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_handle() {
        let handle = BodyHandle::new(4);
        assert_eq!(handle.index(), 4);
        assert_eq!(handle.to_string(), "Body(4)");
        assert_eq!(BodyHandle::from(4), handle);
    }

    #[test]
    fn test_body_ref_conversions() {
        let dynamic: BodyRef = BodyHandle::new(2).into();
        assert_eq!(dynamic.handle(), Some(BodyHandle::new(2)));
        assert!(!dynamic.is_world());

        let world = BodyRef::from(None::<BodyHandle>);
        assert!(world.is_world());
        assert_eq!(world.handle(), None);
        assert_eq!(BodyRef::default(), BodyRef::WorldFixed);
    }

    #[test]
    fn test_pose_rotation() {
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );

        let world = pose.transform_vector(&Vector3::x());
        assert_relative_eq!(world.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(world.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_inverse_roundtrip() {
        let pose = Pose::from_position_rotation(
            Point3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let p = Point3::new(-4.0, 0.5, 2.0);

        let back = pose.inverse_transform_point(&pose.transform_point(&p));
        assert_relative_eq!(back.coords, p.coords, epsilon = 1e-10);

        let composed = pose.compose(&pose.inverse());
        assert_relative_eq!(composed.position.coords, Vector3::zeros(), epsilon = 1e-10);
        assert_relative_eq!(composed.rotation.angle(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_compose_order() {
        let parent = Pose::from_position_rotation(
            Point3::new(10.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let child = Pose::from_position(Point3::new(1.0, 0.0, 0.0));

        let composed = parent.compose(&child);
        assert_relative_eq!(composed.position.x, 10.0, epsilon = 1e-10);
        assert_relative_eq!(composed.position.y, 1.0, epsilon = 1e-10);
    }
}
