//! Simulation spaces.
//!
//! Bodies are simulated in one of several spaces. Each space is defined by the
//! transform that maps component space into it; everything the scheduler
//! reads from the skeleton or the world is mapped through that basis before
//! it reaches the solver.
//!
//! | Space | Component → simulation |
//! |-------|------------------------|
//! | `Component` | identity |
//! | `Actor` | `actor⁻¹ · component` |
//! | `World` | `component` |
//! | `RootRelative` | `bone(0)⁻¹` |
//! | `BoneRelative(b)` | `bone(b)⁻¹` |

use sim_types::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::skeleton::{PoseSource, WorldContext};

/// Space the bodies are simulated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SimulationSpace {
    /// Skeleton component space.
    #[default]
    Component,
    /// Space of the owning actor.
    Actor,
    /// World space. Moving the component leaves the bodies behind.
    World,
    /// Relative to the skeleton's root bone.
    RootRelative,
    /// Relative to a given bone.
    BoneRelative(usize),
}

impl SimulationSpace {
    /// Transform mapping component space into this space.
    ///
    /// A relative space whose bone is not valid falls back to component
    /// space.
    #[must_use]
    pub fn component_to_sim(&self, pose: &impl PoseSource, world: &impl WorldContext) -> Pose {
        match *self {
            Self::Component => Pose::identity(),
            Self::Actor => world
                .actor_to_world()
                .inverse()
                .compose(&world.component_to_world()),
            Self::World => world.component_to_world(),
            Self::RootRelative => relative_to(pose, 0),
            Self::BoneRelative(bone) => relative_to(pose, bone),
        }
    }
}

fn relative_to(pose: &impl PoseSource, bone: usize) -> Pose {
    if pose.is_bone_valid(bone) {
        pose.component_transform(bone).inverse()
    } else {
        Pose::identity()
    }
}

/// Transforms between the spaces involved in one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceBasis {
    /// Component space into simulation space.
    pub component_to_sim: Pose,
    /// Simulation space into world space.
    pub sim_to_world: Pose,
}

impl SpaceBasis {
    /// Resolve the transforms for `space` from the current frame's inputs.
    #[must_use]
    pub fn new(space: SimulationSpace, pose: &impl PoseSource, world: &impl WorldContext) -> Self {
        let component_to_sim = space.component_to_sim(pose, world);
        let sim_to_world = world
            .component_to_world()
            .compose(&component_to_sim.inverse());
        Self {
            component_to_sim,
            sim_to_world,
        }
    }

    /// Map a component-space pose into simulation space.
    #[must_use]
    pub fn to_sim(&self, component: &Pose) -> Pose {
        self.component_to_sim.compose(component)
    }

    /// Map a simulation-space pose back into component space.
    #[must_use]
    pub fn to_component(&self, sim: &Pose) -> Pose {
        self.component_to_sim.inverse().compose(sim)
    }

    /// Component-space transform of `bone`, expressed in simulation space.
    #[must_use]
    pub fn bone(&self, pose: &impl PoseSource, bone: usize) -> Pose {
        self.to_sim(&pose.component_transform(bone))
    }
}
