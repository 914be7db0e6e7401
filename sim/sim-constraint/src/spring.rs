//! Linear and angular springs.
//!
//! Springs are applied once at the start of each substep's velocity phase and
//! never take part in limit iteration.

use std::f64::consts::PI;

use nalgebra::{UnitQuaternion, Vector3};
use sim_core::BodySet;

use crate::joint::perpendicular;
use crate::limits::Anchor;

/// Zero-rest-length linear spring and/or an angular spring between two
/// anchors.
///
/// The angular part rotates `reference_axis` (local to the second body) toward
/// `target_axis` expressed in the first body's frame after applying
/// `orientation_offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    /// First side.
    pub first: Anchor,
    /// Second side.
    pub second: Anchor,
    /// Whether the linear spring is active.
    pub linear: bool,
    /// Whether the angular spring is active.
    pub angular: bool,
    /// Linear spring constant.
    pub linear_stiffness: f64,
    /// Angular spring constant.
    pub angular_stiffness: f64,
    /// Axis on the second body that the angular spring aligns.
    pub reference_axis: Vector3<f64>,
    /// Axis the reference axis is pulled toward.
    pub target_axis: Vector3<f64>,
    /// Rotation applied to the target axis in the first body's frame.
    pub orientation_offset: UnitQuaternion<f64>,
}

impl Spring {
    /// Create a spring with both parts disabled.
    #[must_use]
    pub fn new(first: Anchor, second: Anchor) -> Self {
        Self {
            first,
            second,
            linear: false,
            angular: false,
            linear_stiffness: 0.0,
            angular_stiffness: 0.0,
            reference_axis: Vector3::z(),
            target_axis: Vector3::z(),
            orientation_offset: UnitQuaternion::identity(),
        }
    }

    /// Enable the linear part.
    #[must_use]
    pub fn with_linear(mut self, stiffness: f64) -> Self {
        self.linear = true;
        self.linear_stiffness = stiffness;
        self
    }

    /// Enable the angular part.
    #[must_use]
    pub fn with_angular(
        mut self,
        stiffness: f64,
        reference_axis: Vector3<f64>,
        target_axis: Vector3<f64>,
    ) -> Self {
        self.angular = true;
        self.angular_stiffness = stiffness;
        self.reference_axis = reference_axis;
        self.target_axis = target_axis;
        self
    }

    /// Set the rotation applied to the angular target.
    #[must_use]
    pub fn with_orientation_offset(mut self, offset: UnitQuaternion<f64>) -> Self {
        self.orientation_offset = offset;
        self
    }

    /// Apply the spring impulses for a substep of length `dt`.
    pub fn apply_forces(&self, bodies: &mut BodySet, dt: f64) {
        if self.linear {
            let p0 = self.first.world_position(bodies);
            let p1 = self.second.world_position(bodies);
            let impulse = (p1 - p0) * (-self.linear_stiffness * dt);

            bodies.apply_impulse(self.second.body, &p1, &impulse);
            bodies.apply_impulse(self.first.body, &p0, &-impulse);
        }

        if self.angular {
            if let Some(impulse) = self.angular_impulse(bodies, dt) {
                bodies.apply_angular_impulse(self.second.body, &impulse);
                bodies.apply_angular_impulse(self.first.body, &-impulse);
            }
        }
    }

    fn angular_impulse(&self, bodies: &BodySet, dt: f64) -> Option<Vector3<f64>> {
        let current = bodies.pose(self.second.body).rotation * self.reference_axis;
        let target =
            bodies.pose(self.first.body).rotation * (self.orientation_offset * self.target_axis);

        let (axis, angle) = match UnitQuaternion::rotation_between(&current, &target) {
            Some(rotation) => {
                let (axis, angle) = rotation.axis_angle()?;
                (axis.into_inner(), angle)
            }
            None if current.dot(&target) < 0.0 => (perpendicular(&current), PI),
            None => return None,
        };
        Some(axis * (self.angular_stiffness * angle * dt))
    }
}

/// Append a spring between two anchors.
pub fn create_spring(spring: Spring, out: &mut Vec<Spring>) {
    out.push(spring);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use sim_core::RigidBody;
    use sim_types::BodyHandle;

    fn body_at(bodies: &mut BodySet, position: Point3<f64>) -> BodyHandle {
        bodies.insert(RigidBody::from_box(Vector3::new(1.0, 1.0, 1.0), position).unwrap())
    }

    #[test]
    fn test_linear_spring_pulls_toward_anchor() {
        let mut bodies = BodySet::new();
        let h = body_at(&mut bodies, Point3::new(2.0, 0.0, 0.0));

        let spring = Spring::new(Anchor::world(Point3::origin()), Anchor::center_of(h))
            .with_linear(10.0);
        spring.apply_forces(&mut bodies, 0.1);

        // -k · x · dt = -10 · 2 · 0.1
        assert_relative_eq!(bodies.get(h).unwrap().linear_momentum.x, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_spring_is_symmetric() {
        let mut bodies = BodySet::new();
        let a = body_at(&mut bodies, Point3::origin());
        let b = body_at(&mut bodies, Point3::new(0.0, 0.0, 1.0));

        let spring = Spring::new(Anchor::center_of(a), Anchor::center_of(b)).with_linear(5.0);
        spring.apply_forces(&mut bodies, 0.2);

        let pa = bodies.get(a).unwrap().linear_momentum;
        let pb = bodies.get(b).unwrap().linear_momentum;
        assert_relative_eq!(pa + pb, Vector3::zeros(), epsilon = 1e-12);
        assert!(pa.z > 0.0);
    }

    #[test]
    fn test_angular_spring_rotates_toward_target() {
        let mut bodies = BodySet::new();
        let h = body_at(&mut bodies, Point3::origin());

        // Reference X should align with world Y: rotation +90° about Z.
        let spring = Spring::new(Anchor::world(Point3::origin()), Anchor::center_of(h))
            .with_angular(2.0, Vector3::x(), Vector3::y());
        spring.apply_forces(&mut bodies, 0.5);

        let l = bodies.get(h).unwrap().angular_momentum;
        assert_relative_eq!(l.z, 2.0 * std::f64::consts::FRAC_PI_2 * 0.5, epsilon = 1e-9);
        assert_relative_eq!(l.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_opposite_angular_spring_still_turns() {
        let mut bodies = BodySet::new();
        let h = body_at(&mut bodies, Point3::origin());

        let spring = Spring::new(Anchor::world(Point3::origin()), Anchor::center_of(h))
            .with_angular(2.0, Vector3::x(), -Vector3::x());
        spring.apply_forces(&mut bodies, 0.5);

        let l = bodies.get(h).unwrap().angular_momentum;
        assert_relative_eq!(l.norm(), 2.0 * PI * 0.5, epsilon = 1e-9);
        assert_relative_eq!(l.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aligned_angular_spring_is_idle() {
        let mut bodies = BodySet::new();
        let h = body_at(&mut bodies, Point3::origin());

        let mut out = Vec::new();
        create_spring(
            Spring::new(Anchor::world(Point3::origin()), Anchor::center_of(h))
                .with_angular(2.0, Vector3::z(), Vector3::x())
                .with_orientation_offset(UnitQuaternion::from_axis_angle(
                    &Vector3::y_axis(),
                    -std::f64::consts::FRAC_PI_2,
                )),
            &mut out,
        );
        out[0].apply_forces(&mut bodies, 0.5);

        assert_relative_eq!(bodies.get(h).unwrap().angular_momentum.norm(), 0.0, epsilon = 1e-9);
    }
}
