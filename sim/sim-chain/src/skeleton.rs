//! Collaborator interfaces: the skeleton that supplies bone poses and the
//! world that supplies time, gravity and wind.

use nalgebra::{Point3, Vector3};
use sim_types::{Pose, Result, SimError, WindSample};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read access to an animated skeleton.
///
/// Bone transforms are in component space.
pub trait PoseSource {
    /// Number of bones in the skeleton.
    fn bone_count(&self) -> usize;

    /// Parent of `bone`, or `None` for a root.
    fn parent_of(&self, bone: usize) -> Option<usize>;

    /// Component-space transform of `bone`.
    fn component_transform(&self, bone: usize) -> Pose;

    /// Whether `bone` is evaluated at the current level of detail.
    fn is_bone_valid(&self, bone: usize) -> bool {
        bone < self.bone_count()
    }

    /// Current level of detail; 0 is the most detailed.
    fn lod_level(&self) -> usize {
        0
    }
}

/// Per-frame input from the surrounding scene.
pub trait WorldContext {
    /// Frame delta time in seconds.
    fn delta_time(&self) -> f64;

    /// Global time dilation.
    fn time_dilation(&self) -> f64 {
        1.0
    }

    /// Signed gravity along world Z.
    fn gravity_z(&self) -> f64;

    /// Component-to-world transform of the skeleton.
    fn component_to_world(&self) -> Pose {
        Pose::identity()
    }

    /// Actor-to-world transform of the skeleton's owner.
    fn actor_to_world(&self) -> Pose {
        Pose::identity()
    }

    /// Wind at a world-space position.
    fn wind_at(&self, _position: &Point3<f64>) -> WindSample {
        WindSample::calm()
    }

    /// Uniform world-space force applied to every body.
    fn external_force(&self) -> Vector3<f64> {
        Vector3::zeros()
    }
}

/// A simulated bone transform written back to the skeleton.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneOutput {
    /// Bone index.
    pub bone: usize,
    /// Component-space transform.
    pub transform: Pose,
}

/// Walk from `end` up the hierarchy to `root`.
///
/// Returns the bones root-first, `root` and `end` included.
///
/// # Errors
///
/// Returns [`SimError::InvalidBone`] when either bone is outside the skeleton
/// and [`SimError::ChainNotFound`] when `root` is not an ancestor of `end`.
pub fn discover_chain(pose: &impl PoseSource, root: usize, end: usize) -> Result<Vec<usize>> {
    let count = pose.bone_count();
    for bone in [root, end] {
        if bone >= count {
            return Err(SimError::InvalidBone(bone));
        }
    }

    let mut chain = vec![end];
    let mut bone = end;
    while bone != root {
        // A well-formed hierarchy never needs more steps than it has bones.
        if chain.len() > count {
            return Err(SimError::ChainNotFound { root, end });
        }
        bone = pose
            .parent_of(bone)
            .ok_or(SimError::ChainNotFound { root, end })?;
        chain.push(bone);
    }

    chain.reverse();
    Ok(chain)
}
