//! Limits, springs and the solver driver for chain dynamics.
//!
//! This crate turns body poses into one-dimensional limits, resolves them with
//! sequential impulses and integrates the bodies forward one substep at a
//! time.
//!
//! # Primitives
//!
//! - [`LinearLimit`]: relative velocity of two anchors along a world axis
//! - [`AngularLimit`]: relative spin of two bodies about a world axis
//! - [`Spring`]: zero-rest-length linear spring and/or angular alignment spring
//!
//! Every primitive references its two sides through [`sim_types::BodyRef`];
//! [`sim_types::BodyRef::WorldFixed`] is an immovable anchor.
//!
//! # Joint Library
//!
//! Factories build sets of primitives from the current poses:
//!
//! - [`constrain_along_direction`], [`constrain_position_nailed`],
//!   [`constrain_position_prismatic`]: locked, ranged and free linear axes
//! - [`constrain_angular_range`]: swing/twist ranges
//! - [`constrain_cone_angle`]: cones and hinges
//! - [`constrain_planar`], [`constrain_spherical_inner`],
//!   [`constrain_spherical_outer`]: keep bodies against planes and spheres
//! - [`create_spring`]
//!
//! # Example
//!
//! ```
//! use sim_constraint::{
//!     constrain_position_nailed, physics_update, Anchor, Constraints, SolverEnvironment,
//! };
//! use sim_core::{BodySet, RigidBody};
//! use sim_types::{Gravity, SolverConfig};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = BodySet::new();
//! let bob = bodies.insert(
//!     RigidBody::from_box(Vector3::new(1.0, 1.0, 1.0), Point3::new(0.0, 0.0, -1.0)).unwrap(),
//! );
//!
//! let env = SolverEnvironment::new(Gravity::earth());
//! let config = SolverConfig::default();
//! let mut constraints = Constraints::new();
//!
//! for _ in 0..10 {
//!     // Limits are rebuilt from the current pose every substep.
//!     constraints.clear_limits();
//!     constrain_position_nailed(
//!         1.0 / 60.0,
//!         &bodies,
//!         Anchor::world(Point3::origin()),
//!         Anchor::body(bob, Point3::new(0.0, 0.0, 1.0)),
//!         &mut constraints.linear,
//!     );
//!     physics_update(1.0 / 60.0, &mut bodies, &[bob], &mut constraints, &env, &config);
//! }
//!
//! let z = bodies.get(bob).unwrap().pose.position.z;
//! assert!((z + 1.0).abs() < 1e-2);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod joint;
mod limits;
mod solver;
mod spring;

pub use joint::{
    constrain_along_direction, constrain_angular_range, constrain_cone_angle, constrain_planar,
    constrain_position_nailed, constrain_position_prismatic, constrain_spherical_inner,
    constrain_spherical_outer, swing_twist, AngularRange, ConeLimit, JointFrame, LinearRange,
    TwistAxis,
};
pub use limits::{Anchor, AngularLimit, LinearLimit};
pub use solver::{physics_update, Constraints, SolverEnvironment};
pub use spring::{create_spring, Spring};

// Re-export types needed for constraint computation
pub use sim_types::{BodyHandle, BodyRef, Pose, Vector3};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion};
    use sim_core::{BodySet, RigidBody};
    use sim_types::{Gravity, SolverConfig};

    #[test]
    fn test_hinge_holds_axis() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(
            RigidBody::from_box(Vector3::new(1.0, 1.0, 1.0), Point3::origin()).unwrap(),
        );
        bodies.get_mut(h).unwrap().angular_momentum = Vector3::new(1.0, 0.0, 0.5);

        let env = SolverEnvironment::new(Gravity::zero());
        let config = SolverConfig::default().damping(0.0, 0.0);
        let cone = ConeLimit {
            axis: Vector3::z(),
            angle: 0.0,
            bias: 1.0,
        };
        let dt = 1.0 / 60.0;
        let mut constraints = Constraints::new();

        for _ in 0..60 {
            constraints.clear_limits();
            constrain_cone_angle(
                dt,
                &bodies,
                JointFrame::world(UnitQuaternion::identity()),
                JointFrame::body(h, UnitQuaternion::identity()),
                &cone,
                &mut constraints.angular,
            );
            physics_update(dt, &mut bodies, &[h], &mut constraints, &env, &config);
        }

        // The Z axis drifts at most one substep's worth before being pulled back.
        let z = bodies.get(h).unwrap().pose.rotation * Vector3::z();
        assert!(z.z > 0.95);
    }
}
