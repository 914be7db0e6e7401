//! The chain node.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized ──(root bone valid)──▶ PendingInit ──(chain built)──▶ Active
//!                                           ▲                           │
//!                                           └── reset / space change / ─┘
//!                                               LOD skip
//! ```
//!
//! Initialization walks from the end bone up to the root bone and creates one
//! box body per bone, root first. Each body hangs from its bone origin toward
//! the next bone; the joint between two bodies sits at the child's bone
//! origin. A space change that finds bodies already built re-expresses them in
//! the new space instead of rebuilding.
//!
//! # Per Frame
//!
//! 1. Activate bodies whose bones became valid, snapping them to the animation
//! 2. Sample wind and rebuild springs toward the animated pose
//! 3. Plan substeps; before each one, rebuild every limit from the current pose
//! 4. Write the simulated bones back in component space

use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sim_constraint::{
    constrain_angular_range, constrain_cone_angle, constrain_planar, constrain_position_nailed,
    constrain_position_prismatic, constrain_spherical_inner, constrain_spherical_outer,
    create_spring, physics_update, Anchor, Constraints, JointFrame, SolverEnvironment, Spring,
};
use sim_core::{BodySet, RigidBody};
use sim_types::{BodyHandle, Gravity, Pose, Result};
use tracing::{debug, trace, warn};

use crate::config::{plane_pose, sphere_center, AngularSetup, ChainConfig, SphereSide};
use crate::skeleton::{discover_chain, BoneOutput, PoseSource, WorldContext};
use crate::space::{SimulationSpace, SpaceBasis};
use crate::substep::{SubstepPlan, SubstepScheduler};

/// Lifecycle of a chain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeState {
    /// Nothing built yet; waiting for a valid root bone.
    #[default]
    Uninitialized,
    /// Bodies are (re)built or re-expressed on the next evaluation.
    PendingInit,
    /// Simulating.
    Active,
}

/// One simulated bone.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Link {
    bone: usize,
    body: BodyHandle,
    /// Body-local vector from the body's center to its bone origin.
    joint_offset: Vector3<f64>,
    /// This link's joint in the parent body's frame.
    parent_anchor: Point3<f64>,
    /// Bone rotation relative to the parent bone at build time.
    rest_rotation: UnitQuaternion<f64>,
    active: bool,
}

impl Link {
    fn body_anchor(&self) -> Anchor {
        Anchor::body(self.body, Point3::from(self.joint_offset))
    }

    /// Body pose for a bone pose.
    fn body_pose(&self, bone: &Pose) -> Pose {
        body_pose(bone, &self.joint_offset)
    }

    /// Bone pose for a body pose.
    fn bone_pose(&self, body: &Pose) -> Pose {
        Pose::from_position_rotation(
            body.transform_point(&Point3::from(self.joint_offset)),
            body.rotation,
        )
    }
}

fn body_pose(bone: &Pose, joint_offset: &Vector3<f64>) -> Pose {
    Pose::from_position_rotation(bone.position - bone.rotation * joint_offset, bone.rotation)
}

/// Drives a chain of bones with rigid-body dynamics.
///
/// A node owns its bodies, constraint containers and scratch buffers, so
/// independent nodes can be evaluated on different threads.
///
/// # Example
///
/// ```
/// use sim_chain::{BoneOutput, ChainConfig, ChainNode, NodeState, PoseSource, WorldContext};
/// use sim_types::Pose;
/// use nalgebra::Point3;
///
/// struct Tail;
///
/// impl PoseSource for Tail {
///     fn bone_count(&self) -> usize { 3 }
///     fn parent_of(&self, bone: usize) -> Option<usize> { bone.checked_sub(1) }
///     fn component_transform(&self, bone: usize) -> Pose {
///         Pose::from_position(Point3::new(0.0, 0.0, -10.0 * bone as f64))
///     }
/// }
///
/// struct Scene;
///
/// impl WorldContext for Scene {
///     fn delta_time(&self) -> f64 { 1.0 / 60.0 }
///     fn gravity_z(&self) -> f64 { -980.0 }
/// }
///
/// let mut node = ChainNode::new(ChainConfig::new(0).with_end_bone(2));
/// let mut out: Vec<BoneOutput> = Vec::new();
/// node.evaluate(&Tail, &Scene, &mut out);
///
/// assert_eq!(node.state(), NodeState::Active);
/// assert_eq!(out.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ChainNode {
    config: ChainConfig,
    state: NodeState,
    reset_requested: bool,
    /// Space the bodies are currently expressed in.
    space: SimulationSpace,
    bodies: BodySet,
    links: Vec<Link>,
    constraints: Constraints,
    scheduler: SubstepScheduler,
    rng: StdRng,
    /// Reused list of bodies simulated this frame.
    active: Vec<BodyHandle>,
}

impl ChainNode {
    /// Create a node. Configuration problems are logged and replaced with
    /// safe fallbacks.
    #[must_use]
    pub fn new(config: ChainConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: NodeState::Uninitialized,
            reset_requested: false,
            space: config.simulation_space,
            bodies: BodySet::new(),
            links: Vec::new(),
            constraints: Constraints::new(),
            scheduler: SubstepScheduler::new(),
            rng: StdRng::seed_from_u64(config.wind.seed),
            active: Vec::new(),
            config,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Replace the configuration and rebuild on the next evaluation.
    pub fn set_config(&mut self, config: ChainConfig) {
        self.config = config.sanitized();
        self.request_reset();
    }

    /// Rebuild all bodies from the animated pose on the next evaluation.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
        if self.state == NodeState::Active {
            self.state = NodeState::PendingInit;
        }
    }

    /// Switch the simulation space. Existing bodies are carried over into the
    /// new space on the next evaluation.
    pub fn set_simulation_space(&mut self, space: SimulationSpace) {
        if space == self.config.simulation_space {
            return;
        }
        self.config.simulation_space = space;
        if self.state == NodeState::Active {
            self.state = NodeState::PendingInit;
        }
    }

    /// Simulated bodies.
    #[must_use]
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Body simulating `bone`, if the bone is part of the chain.
    #[must_use]
    pub fn body_for_bone(&self, bone: usize) -> Option<&RigidBody> {
        let link = self.links.iter().find(|link| link.bone == bone)?;
        self.bodies.get(link.body)
    }

    /// Bones of the chain, root first.
    pub fn bones(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.iter().map(|link| link.bone)
    }

    /// Limits and springs of the last substep.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Time carried into the next frame by adaptive substepping.
    #[must_use]
    pub fn time_debt(&self) -> f64 {
        self.scheduler.debt()
    }

    /// Advance one frame and write the simulated bones into `out`.
    ///
    /// `out` is cleared first. It stays empty when the node passes the
    /// animation through: dynamics disabled, level of detail above the
    /// threshold, or no chain found.
    pub fn evaluate(
        &mut self,
        pose: &impl PoseSource,
        world: &impl WorldContext,
        out: &mut Vec<BoneOutput>,
    ) {
        out.clear();
        if !self.config.enabled {
            return;
        }

        if let Some(threshold) = self.config.lod_threshold {
            let lod = pose.lod_level();
            if lod > threshold {
                if self.state == NodeState::Active {
                    debug!(lod, threshold, "level of detail above threshold, suspending");
                    self.request_reset();
                }
                return;
            }
        }

        if self.state == NodeState::Uninitialized {
            if !pose.is_bone_valid(self.config.root_bone) {
                return;
            }
            self.state = NodeState::PendingInit;
        }

        if self.state == NodeState::PendingInit {
            if let Err(err) = self.initialize(pose, world) {
                warn!(%err, "chain setup failed, passing animation through");
                return;
            }
            self.state = NodeState::Active;
        }

        let basis = SpaceBasis::new(self.space, pose, world);
        self.refresh_links(pose, &basis);
        self.update_wind(world, &basis);
        self.build_springs(pose, &basis);

        let env = self.environment(world, &basis);
        let frame_delta = world.delta_time() * world.time_dilation();
        let plan = self.scheduler.plan(frame_delta, &self.config.substep);
        trace!(
            count = plan.count,
            step = plan.step,
            debt = self.scheduler.debt(),
            "substep plan"
        );
        self.simulate(&plan, pose, &basis, &env);

        for link in self.links.iter().filter(|link| link.active) {
            if let Some(body) = self.bodies.get(link.body) {
                out.push(BoneOutput {
                    bone: link.bone,
                    transform: basis.to_component(&link.bone_pose(&body.pose)),
                });
            }
        }
    }

    fn initialize(&mut self, pose: &impl PoseSource, world: &impl WorldContext) -> Result<()> {
        if self.reset_requested || self.links.is_empty() {
            self.build_chain(pose, world)?;
            self.reset_requested = false;
        } else if self.space != self.config.simulation_space {
            let old = self.space.component_to_sim(pose, world);
            let new = self.config.simulation_space.component_to_sim(pose, world);
            let change = new.compose(&old.inverse());
            for (_, body) in self.bodies.iter_mut() {
                body.transform(&change);
            }
            debug!(
                from = ?self.space,
                to = ?self.config.simulation_space,
                "simulation space changed"
            );
        }
        self.space = self.config.simulation_space;
        Ok(())
    }

    fn build_chain(&mut self, pose: &impl PoseSource, world: &impl WorldContext) -> Result<()> {
        let root = self.config.root_bone;
        let end = self.config.end_bone.unwrap_or(root);
        let bones = discover_chain(pose, root, end)?;

        self.bodies.clear();
        self.links.clear();
        self.constraints.clear();
        self.scheduler.reset();
        self.rng = StdRng::seed_from_u64(self.config.wind.seed);

        let basis = SpaceBasis::new(self.config.simulation_space, pose, world);
        let offsets = joint_offsets(pose, &bones, self.config.local_joint_offset);
        let mut parent: Option<(usize, BodyHandle)> = None;

        for (&bone, &joint_offset) in bones.iter().zip(&offsets) {
            let mut body = make_body(&self.config, &basis.bone(pose, bone), &joint_offset)?;
            body.parent = parent.map(|(_, handle)| handle);
            body.wind.adaption = self.rng.gen_range(0.1..1.0);
            let handle = self.bodies.insert(body);

            let (parent_anchor, rest_rotation) = match parent {
                Some((parent_index, _)) => {
                    let from = pose.component_transform(bones[parent_index]);
                    let to = pose.component_transform(bone);
                    let anchor = from.inverse_transform_vector(&(to.position - from.position))
                        + offsets[parent_index];
                    (Point3::from(anchor), from.rotation.inverse() * to.rotation)
                }
                None => (Point3::origin(), UnitQuaternion::identity()),
            };

            parent = Some((self.links.len(), handle));
            self.links.push(Link {
                bone,
                body: handle,
                joint_offset,
                parent_anchor,
                rest_rotation,
                active: pose.is_bone_valid(bone),
            });
        }

        debug!(root, end, bodies = self.links.len(), "chain built");
        Ok(())
    }

    /// Activate links whose bones became valid and collect the active bodies.
    fn refresh_links(&mut self, pose: &impl PoseSource, basis: &SpaceBasis) {
        self.active.clear();
        for link in &mut self.links {
            let valid = pose.is_bone_valid(link.bone);
            if valid && !link.active {
                if let Some(body) = self.bodies.get_mut(link.body) {
                    body.snap_to(link.body_pose(&basis.bone(pose, link.bone)));
                }
                trace!(bone = link.bone, "body reactivated");
            }
            link.active = valid;
            if valid {
                self.active.push(link.body);
            }
        }
    }

    fn update_wind(&mut self, world: &impl WorldContext, basis: &SpaceBasis) {
        let sampling = self.config.wind.enabled && self.config.wind.body_wind;
        for &handle in &self.active {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            body.wind.enabled = sampling;
            if !sampling {
                continue;
            }
            let position = basis.sim_to_world.transform_point(&body.pose.position);
            let sample = world.wind_at(&position);
            body.wind.direction = basis.sim_to_world.inverse_transform_vector(&sample.direction);
            body.wind.speed = sample.speed * self.config.wind.scale;
        }
    }

    fn build_springs(&mut self, pose: &impl PoseSource, basis: &SpaceBasis) {
        self.constraints.springs.clear();
        let setup = self.config.spring;
        if setup.linear.is_none() && setup.angular.is_none() {
            return;
        }

        for link in self.links.iter().filter(|link| link.active) {
            let target = link.body_pose(&basis.bone(pose, link.bone));
            let mut spring =
                Spring::new(Anchor::world(target.position), Anchor::center_of(link.body));
            if let Some(stiffness) = setup.linear {
                spring = spring.with_linear(stiffness);
            }
            if let Some(stiffness) = setup.angular {
                spring = spring
                    .with_angular(stiffness, setup.angular_axis, setup.angular_axis)
                    .with_orientation_offset(target.rotation);
            }
            create_spring(spring, &mut self.constraints.springs);
        }
    }

    fn environment(&self, world: &impl WorldContext, basis: &SpaceBasis) -> SolverEnvironment {
        let gravity = self.config.gravity_override.map_or_else(
            || {
                let down = basis.sim_to_world.inverse_transform_vector(&-Vector3::z());
                Gravity::from_direction(down, world.gravity_z())
            },
            Gravity::custom,
        );
        let external = basis
            .sim_to_world
            .inverse_transform_vector(&world.external_force());
        SolverEnvironment::new(gravity).with_external_force(external)
    }

    fn simulate(
        &mut self,
        plan: &SubstepPlan,
        pose: &impl PoseSource,
        basis: &SpaceBasis,
        env: &SolverEnvironment,
    ) {
        for _ in 0..plan.count {
            self.build_limits(plan.step, pose, basis);
            physics_update(
                plan.step,
                &mut self.bodies,
                &self.active,
                &mut self.constraints,
                env,
                &self.config.solver,
            );
        }
    }

    /// Rebuild every limit from the current body poses.
    fn build_limits(&mut self, dt: f64, pose: &impl PoseSource, basis: &SpaceBasis) {
        let Self {
            config,
            bodies,
            links,
            constraints,
            ..
        } = self;
        constraints.clear_limits();

        for (i, link) in links.iter().enumerate() {
            if !link.active {
                continue;
            }
            let animated = basis.bone(pose, link.bone);
            let (anchor, frame) = match i.checked_sub(1).map(|p| &links[p]) {
                None => (
                    Anchor::world(animated.position),
                    JointFrame::world(animated.rotation),
                ),
                Some(parent) if parent.active => {
                    let parent_rotation = basis.bone(pose, parent.bone).rotation;
                    (
                        Anchor::body(parent.body, link.parent_anchor),
                        JointFrame::body(
                            parent.body,
                            parent_rotation.inverse() * animated.rotation,
                        ),
                    )
                }
                Some(parent) => {
                    // Inactive parents are not simulated; hold on to where they are.
                    let parent_pose = bodies.pose(parent.body.into());
                    (
                        Anchor::world(parent_pose.transform_point(&link.parent_anchor)),
                        JointFrame::world(parent_pose.rotation * link.rest_rotation),
                    )
                }
            };
            let own_frame = JointFrame::body(link.body, UnitQuaternion::identity());

            if config.joint.is_linear_locked() {
                constrain_position_nailed(
                    dt,
                    bodies,
                    anchor,
                    link.body_anchor(),
                    &mut constraints.linear,
                );
            } else {
                constrain_position_prismatic(
                    dt,
                    bodies,
                    anchor,
                    link.body_anchor(),
                    frame.frame,
                    &config.joint.linear_range(),
                    &mut constraints.linear,
                );
            }

            match &config.joint.angular {
                AngularSetup::SwingTwist(range) => constrain_angular_range(
                    dt,
                    bodies,
                    frame,
                    own_frame,
                    range,
                    &mut constraints.angular,
                ),
                AngularSetup::Cone(cone) => constrain_cone_angle(
                    dt,
                    bodies,
                    frame,
                    own_frame,
                    cone,
                    &mut constraints.angular,
                ),
            }

            for limit in &config.planar_limits {
                let Some(driver) = driver_pose(pose, basis, limit.driving_bone) else {
                    continue;
                };
                let plane = plane_pose(limit, driver.as_ref());
                constrain_planar(dt, bodies, link.body, &plane, &mut constraints.linear);
            }

            for limit in &config.spherical_limits {
                let Some(driver) = driver_pose(pose, basis, limit.driving_bone) else {
                    continue;
                };
                let center = sphere_center(limit, driver.as_ref());
                match limit.side {
                    SphereSide::Inner => constrain_spherical_inner(
                        dt,
                        bodies,
                        link.body,
                        center,
                        limit.radius,
                        &mut constraints.linear,
                    ),
                    SphereSide::Outer => constrain_spherical_outer(
                        dt,
                        bodies,
                        link.body,
                        center,
                        limit.radius,
                        &mut constraints.linear,
                    ),
                }
            }
        }
    }
}

/// Simulation-space pose of a limit's driving bone.
///
/// `Some(None)` for limits fixed in simulation space, `None` when the driving
/// bone is not valid at the current level of detail.
#[allow(clippy::option_option)]
fn driver_pose(
    pose: &impl PoseSource,
    basis: &SpaceBasis,
    bone: Option<usize>,
) -> Option<Option<Pose>> {
    match bone {
        None => Some(None),
        Some(bone) if pose.is_bone_valid(bone) => Some(Some(basis.bone(pose, bone))),
        Some(_) => None,
    }
}

/// Body-local vector from each body's center to its bone origin.
///
/// Without an explicit offset each body spans half the way from its bone to
/// the next one; the last body reuses the offset before it.
fn joint_offsets(
    pose: &impl PoseSource,
    bones: &[usize],
    explicit: Option<Vector3<f64>>,
) -> Vec<Vector3<f64>> {
    if let Some(offset) = explicit {
        return vec![offset; bones.len()];
    }

    let mut offsets: Vec<Vector3<f64>> = Vec::with_capacity(bones.len());
    for (i, &bone) in bones.iter().enumerate() {
        let here = pose.component_transform(bone);
        let offset = match bones.get(i + 1) {
            Some(&next) => {
                let span = here.position - pose.component_transform(next).position;
                here.inverse_transform_vector(&span) * 0.5
            }
            None => offsets.last().copied().unwrap_or_else(Vector3::zeros),
        };
        offsets.push(offset);
    }
    offsets
}

/// Build a body for a bone, falling back to a unit box for degenerate extents.
fn make_body(config: &ChainConfig, bone: &Pose, joint_offset: &Vector3<f64>) -> Result<RigidBody> {
    let target = body_pose(bone, joint_offset);
    let mut body = match RigidBody::from_box(config.box_extents, target.position) {
        Ok(body) => body,
        Err(err) => {
            warn!(%err, "degenerate body, using a unit box");
            RigidBody::from_box(Vector3::from_element(1.0), target.position)?
        }
    };

    body.snap_to(target);
    body.linear_damping = config.linear_damping;
    body.angular_damping = config.angular_damping;
    body.gravity_scale = config.gravity_scale;
    body.collision_radius = config.collision_radius(body.min_half_extent(), body.half_diagonal());
    Ok(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::CollisionRadius;
    use approx::assert_relative_eq;
    use sim_types::SimError;

    /// Bones hanging straight down, ten units apart.
    struct Rope {
        parents: Vec<Option<usize>>,
        valid: Vec<bool>,
    }

    impl Rope {
        fn new(bones: usize) -> Self {
            Self {
                parents: (0..bones).map(|b| b.checked_sub(1)).collect(),
                valid: vec![true; bones],
            }
        }
    }

    impl PoseSource for Rope {
        fn bone_count(&self) -> usize {
            self.parents.len()
        }

        fn parent_of(&self, bone: usize) -> Option<usize> {
            self.parents.get(bone).copied().flatten()
        }

        #[allow(clippy::cast_precision_loss)]
        fn component_transform(&self, bone: usize) -> Pose {
            Pose::from_position(Point3::new(0.0, 0.0, -10.0 * bone as f64))
        }

        fn is_bone_valid(&self, bone: usize) -> bool {
            self.valid.get(bone).copied().unwrap_or(false)
        }
    }

    struct Still;

    impl WorldContext for Still {
        fn delta_time(&self) -> f64 {
            1.0 / 60.0
        }

        fn gravity_z(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_joint_offsets() {
        let rope = Rope::new(3);
        let offsets = joint_offsets(&rope, &[0, 1, 2], None);
        assert_eq!(offsets, vec![Vector3::new(0.0, 0.0, 5.0); 3]);

        let single = joint_offsets(&rope, &[1], None);
        assert_eq!(single, vec![Vector3::zeros()]);

        let explicit = joint_offsets(&rope, &[0, 1], Some(Vector3::x()));
        assert_eq!(explicit, vec![Vector3::x(); 2]);
    }

    #[test]
    fn test_build_places_bodies_between_bones() {
        let mut node = ChainNode::new(
            ChainConfig::new(0)
                .with_end_bone(2)
                .with_box_extents(Vector3::new(2.0, 2.0, 10.0))
                .with_collision(CollisionRadius::InnerSphere),
        );
        let mut out = Vec::new();
        node.evaluate(&Rope::new(3), &Still, &mut out);

        assert_eq!(node.bones().collect::<Vec<_>>(), vec![0, 1, 2]);
        let middle = node.body_for_bone(1).unwrap();
        assert_relative_eq!(middle.pose.position, Point3::new(0.0, 0.0, -15.0), epsilon = 1e-9);
        assert_eq!(middle.parent, Some(BodyHandle::new(0)));
        assert_relative_eq!(middle.collision_radius, 1.0, epsilon = 1e-12);
        assert!(node.body_for_bone(0).unwrap().parent.is_none());

        // Per link: three nailed axes, two bounds per swing axis and the twist.
        assert_eq!(node.constraints().linear.len(), 9);
        assert_eq!(node.constraints().angular.len(), 15);
    }

    #[test]
    fn test_state_transitions() {
        let mut rope = Rope::new(3);
        rope.valid[0] = false;
        let mut node = ChainNode::new(ChainConfig::new(0).with_end_bone(2));
        let mut out = Vec::new();

        node.evaluate(&rope, &Still, &mut out);
        assert_eq!(node.state(), NodeState::Uninitialized);
        assert!(out.is_empty());

        rope.valid[0] = true;
        node.evaluate(&rope, &Still, &mut out);
        assert_eq!(node.state(), NodeState::Active);
        assert_eq!(out.len(), 3);

        node.request_reset();
        assert_eq!(node.state(), NodeState::PendingInit);
        node.evaluate(&rope, &Still, &mut out);
        assert_eq!(node.state(), NodeState::Active);

        node.set_simulation_space(SimulationSpace::World);
        assert_eq!(node.state(), NodeState::PendingInit);
        node.evaluate(&rope, &Still, &mut out);
        assert_eq!(node.state(), NodeState::Active);
    }

    #[test]
    fn test_missing_chain_passes_through() {
        let mut rope = Rope::new(4);
        rope.parents[3] = None;
        let mut node = ChainNode::new(ChainConfig::new(1).with_end_bone(3));
        let mut out = Vec::new();

        node.evaluate(&rope, &Still, &mut out);
        assert_eq!(node.state(), NodeState::PendingInit);
        assert!(out.is_empty());
        assert!(node.bodies().is_empty());
        assert_eq!(
            discover_chain(&rope, 1, 3),
            Err(SimError::ChainNotFound { root: 1, end: 3 })
        );
    }

    #[test]
    fn test_disabled_node_outputs_nothing() {
        let mut config = ChainConfig::new(0).with_end_bone(1);
        config.enabled = false;
        let mut node = ChainNode::new(config);
        let mut out = vec![BoneOutput {
            bone: 9,
            transform: Pose::identity(),
        }];

        node.evaluate(&Rope::new(2), &Still, &mut out);
        assert!(out.is_empty());
        assert_eq!(node.state(), NodeState::Uninitialized);
    }

    #[test]
    fn test_wind_adaption_is_seeded() {
        let config = ChainConfig::new(0).with_end_bone(3).with_wind(1.0, 7);
        let mut a = ChainNode::new(config.clone());
        let mut b = ChainNode::new(config);
        let mut out = Vec::new();
        a.evaluate(&Rope::new(4), &Still, &mut out);
        b.evaluate(&Rope::new(4), &Still, &mut out);

        for bone in 0..4 {
            let (x, y) = (a.body_for_bone(bone).unwrap(), b.body_for_bone(bone).unwrap());
            assert_eq!(x.wind.adaption, y.wind.adaption);
            assert!((0.1..1.0).contains(&x.wind.adaption));
        }
    }
}
