//! Unified API for simulating bone chains.
//!
//! This crate re-exports the complete chain dynamics stack:
//!
//! - [`sim_types`] - Core data types (handles, poses, gravity, errors)
//! - [`sim_core`] - Rigid bodies, mass properties and integrators
//! - [`sim_constraint`] - Joint limits, springs and the substep solver
//! - [`sim_chain`] - Chain node: bones in, simulated bone transforms out
//!
//! # Quick Start
//!
//! ```
//! use sim_physics::prelude::*;
//!
//! /// Four bones hanging straight down, ten units apart.
//! struct Tail;
//!
//! impl PoseSource for Tail {
//!     fn bone_count(&self) -> usize {
//!         4
//!     }
//!     fn parent_of(&self, bone: usize) -> Option<usize> {
//!         bone.checked_sub(1)
//!     }
//!     fn component_transform(&self, bone: usize) -> Pose {
//!         Pose::from_position(Point3::new(0.0, 0.0, -10.0 * bone as f64))
//!     }
//! }
//!
//! /// A character running along +X.
//! struct Running {
//!     time: f64,
//! }
//!
//! impl WorldContext for Running {
//!     fn delta_time(&self) -> f64 {
//!         1.0 / 60.0
//!     }
//!     fn gravity_z(&self) -> f64 {
//!         -980.0
//!     }
//!     fn component_to_world(&self) -> Pose {
//!         Pose::from_position(Point3::new(300.0 * self.time, 0.0, 0.0))
//!     }
//! }
//!
//! let config = ChainConfig::new(0)
//!     .with_end_bone(3)
//!     .with_simulation_space(SimulationSpace::World);
//! let mut node = ChainNode::new(config);
//! let mut world = Running { time: 0.0 };
//! let mut bones = Vec::new();
//!
//! for _ in 0..30 {
//!     node.evaluate(&Tail, &world, &mut bones);
//!     world.time += world.delta_time();
//! }
//!
//! // The tail swings back behind the runner.
//! let tip = bones.iter().find(|b| b.bone == 3).unwrap();
//! assert!(tip.transform.position.x < 0.0);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      sim-physics (this crate)                   │
//! │                     Unified API / re-exports                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//!                                  ▼
//!                       ┌─────────────────────┐
//!                       │      sim-chain      │
//!                       │ Bones, spaces, LOD, │
//!                       │ substep scheduling  │
//!                       └──────────┬──────────┘
//!                                  │
//!                                  ▼
//!                       ┌─────────────────────┐
//!                       │   sim-constraint    │
//!                       │ Limits, springs,    │
//!                       │ substep solver      │
//!                       └──────────┬──────────┘
//!                                  │
//!                                  ▼
//!                       ┌─────────────────────┐
//!                       │      sim-core       │
//!                       │ Bodies, integrators │
//!                       └──────────┬──────────┘
//!                                  │
//!                                  ▼
//!                       ┌─────────────────────┐
//!                       │      sim-types      │
//!                       │    Data structs     │
//!                       └─────────────────────┘
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use sim_chain;
pub use sim_constraint;
pub use sim_core;
pub use sim_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// Import everything you need with a single line:
///
/// ```
/// use sim_physics::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core types from sim-types
    // ========================================================================

    pub use sim_types::{BodyHandle, BodyRef, Pose};
    pub use sim_types::{Gravity, WindSample};
    pub use sim_types::{clamp_damping, decay, SolverConfig, DEFAULT_DAMPING};
    pub use sim_types::SimError;

    // ========================================================================
    // Bodies from sim-core
    // ========================================================================

    pub use sim_core::{BodySet, BodyWind, RigidBody, Shape, Triangle};

    // ========================================================================
    // Limits and solver from sim-constraint
    // ========================================================================

    pub use sim_constraint::{
        // Joint builders
        constrain_along_direction,
        constrain_angular_range,
        constrain_cone_angle,
        constrain_planar,
        constrain_position_nailed,
        constrain_position_prismatic,
        constrain_spherical_inner,
        constrain_spherical_outer,
        // Springs
        create_spring,
        // Solver
        physics_update,
        swing_twist,
        Anchor,
        AngularLimit,
        AngularRange,
        ConeLimit,
        Constraints,
        JointFrame,
        LinearLimit,
        LinearRange,
        SolverEnvironment,
        Spring,
        TwistAxis,
    };

    // ========================================================================
    // Chain node from sim-chain
    // ========================================================================

    pub use sim_chain::{
        discover_chain, AngularSetup, AnimSpring, BoneOutput, ChainConfig, ChainNode,
        CollisionRadius, JointSetup, LinearAxis, NodeState, PlanarLimit, PoseSource,
        SimulationSpace, SpaceBasis, SphereSide, SphericalLimit, SubstepConfig, SubstepPlan,
        SubstepScheduler, WindConfig, WorldContext,
    };

    // ========================================================================
    // Math types from nalgebra
    // ========================================================================

    pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_precision_loss
)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_prelude_imports() {
        let _pose = Pose::identity();
        let _gravity = Gravity::earth();
        let _config = ChainConfig::default();
        let _solver = SolverConfig::default();
    }

    #[test]
    fn test_nailed_body_holds_against_gravity() {
        let mut bodies = BodySet::new();
        let body = RigidBody::from_box(Vector3::from_element(1.0), Point3::new(0.0, 0.0, -1.0))
            .expect("valid box");
        let handle = bodies.insert(body);
        let active = [handle];

        let mut constraints = Constraints::default();
        constrain_position_nailed(
            1.0 / 60.0,
            &bodies,
            Anchor::world(Point3::new(0.0, 0.0, -1.0)),
            Anchor::center_of(handle),
            &mut constraints.linear,
        );
        let env = SolverEnvironment::new(Gravity::earth());
        for _ in 0..60 {
            physics_update(
                1.0 / 60.0,
                &mut bodies,
                &active,
                &mut constraints,
                &env,
                &SolverConfig::default(),
            );
        }

        let position = bodies.get(handle).unwrap().pose.position;
        assert_relative_eq!(position, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_chain_node_through_prelude() {
        struct Stick;

        impl PoseSource for Stick {
            fn bone_count(&self) -> usize {
                2
            }
            fn parent_of(&self, bone: usize) -> Option<usize> {
                bone.checked_sub(1)
            }
            fn component_transform(&self, bone: usize) -> Pose {
                Pose::from_position(Point3::new(0.0, 0.0, -10.0 * bone as f64))
            }
        }

        struct Idle;

        impl WorldContext for Idle {
            fn delta_time(&self) -> f64 {
                1.0 / 60.0
            }
            fn gravity_z(&self) -> f64 {
                0.0
            }
        }

        let mut node = ChainNode::new(ChainConfig::new(0).with_end_bone(1));
        let mut out = Vec::new();
        node.evaluate(&Stick, &Idle, &mut out);

        assert_eq!(node.state(), NodeState::Active);
        assert_eq!(out.len(), 2);
    }
}
