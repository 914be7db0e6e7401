//! Chain scheduler for secondary bone motion.
//!
//! A [`ChainNode`] turns a run of skeleton bones into rigid bodies, joins them
//! with limits, substeps the solver and writes the simulated transforms back
//! as bone poses.
//!
//! # Collaborators
//!
//! The node never owns the skeleton or the scene. It reads them each frame
//! through two traits:
//!
//! - [`PoseSource`]: bone hierarchy, component-space bone transforms and
//!   per-bone level-of-detail validity
//! - [`WorldContext`]: delta time, time dilation, gravity, wind and the
//!   component/actor placement in the world
//!
//! # Simulation Spaces
//!
//! Bodies live in one of the [`SimulationSpace`]s. World space lets a moving
//! character drag its chains through the air; component space ignores the
//! character's motion entirely.
//!
//! # Substepping
//!
//! In adaptive mode the node runs fixed-size substeps and carries leftover
//! time between frames, see [`SubstepScheduler`].

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::module_name_repetitions)]

mod config;
mod node;
mod skeleton;
mod space;
mod substep;

pub use config::{
    AngularSetup, AnimSpring, ChainConfig, CollisionRadius, JointSetup, LinearAxis, PlanarLimit,
    SphereSide, SphericalLimit, SubstepConfig, WindConfig,
};
pub use node::{ChainNode, NodeState};
pub use skeleton::{discover_chain, BoneOutput, PoseSource, WorldContext};
pub use space::{SimulationSpace, SpaceBasis};
pub use substep::{SubstepPlan, SubstepScheduler};

// Joint types used in `JointSetup`
pub use sim_constraint::{AngularRange, ConeLimit, TwistAxis};
