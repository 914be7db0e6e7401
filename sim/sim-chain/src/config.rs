//! Chain node configuration.
//!
//! Every option the node recognizes is a named field here. Configuration is
//! set once or rarely; the per-frame path only reads it.

use nalgebra::{Point3, Vector3};
use sim_constraint::{AngularRange, ConeLimit, LinearRange, TwistAxis};
use sim_types::{clamp_damping, Pose, Result, SimError, SolverConfig, DEFAULT_DAMPING};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::space::SimulationSpace;

/// Extents below this are treated as degenerate.
const EXTENT_EPSILON: f64 = 1e-6;

/// How the collision radius of each body is derived from its box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollisionRadius {
    /// Zero radius: only the center of mass is kept out.
    #[default]
    CenterOfMass,
    /// Fixed radius.
    CustomSphere(f64),
    /// Largest sphere inside the box.
    InnerSphere,
    /// Smallest sphere containing the box.
    OuterSphere,
}

/// Motion allowed along one linear axis of the joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinearAxis {
    /// No motion.
    #[default]
    Locked,
    /// Motion between two offsets.
    Limited {
        /// Lower offset.
        min: f64,
        /// Upper offset.
        max: f64,
    },
    /// Unrestricted motion.
    Free,
}

impl LinearAxis {
    /// Offset range of the axis.
    #[must_use]
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Self::Locked => (0.0, 0.0),
            Self::Limited { min, max } => (min, max),
            Self::Free => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

/// Angular part of each joint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AngularSetup {
    /// Swing/twist ranges.
    SwingTwist(AngularRange),
    /// Cone around an axis; a zero angle makes a hinge.
    Cone(ConeLimit),
}

impl Default for AngularSetup {
    fn default() -> Self {
        Self::SwingTwist(AngularRange {
            twist_axis: TwistAxis::X,
            min: Vector3::from_element(-std::f64::consts::FRAC_PI_4),
            max: Vector3::from_element(std::f64::consts::FRAC_PI_4),
            bias: 1.0,
        })
    }
}

/// Joint setup shared by every link of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointSetup {
    /// Per-axis linear motion in the joint frame.
    pub linear: [LinearAxis; 3],
    /// Angular limits.
    pub angular: AngularSetup,
}

impl JointSetup {
    /// Check if every linear axis is locked.
    #[must_use]
    pub fn is_linear_locked(&self) -> bool {
        self.linear.iter().all(|axis| *axis == LinearAxis::Locked)
    }

    /// Linear ranges of the three axes.
    #[must_use]
    pub fn linear_range(&self) -> LinearRange {
        let mut min = Vector3::zeros();
        let mut max = Vector3::zeros();
        for (i, axis) in self.linear.iter().enumerate() {
            (min[i], max[i]) = axis.bounds();
        }
        LinearRange::new(min, max)
    }
}

/// Spring pulling the bodies toward the animated pose.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimSpring {
    /// Linear spring constant, if the linear spring is enabled.
    pub linear: Option<f64>,
    /// Angular spring constant, if the angular spring is enabled.
    pub angular: Option<f64>,
    /// Body-local axis the angular spring aligns with its animated direction.
    pub angular_axis: Vector3<f64>,
}

impl Default for AnimSpring {
    fn default() -> Self {
        Self {
            linear: None,
            angular: None,
            angular_axis: Vector3::x(),
        }
    }
}

/// Plane the bodies must stay above.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanarLimit {
    /// Bone the plane follows; `None` fixes it in simulation space.
    pub driving_bone: Option<usize>,
    /// Plane relative to the driving bone. The normal is local Z.
    pub plane: Pose,
}

/// Which side of a sphere the bodies are kept on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SphereSide {
    /// Inside the sphere.
    #[default]
    Inner,
    /// Outside the sphere.
    Outer,
}

/// Sphere the bodies are kept inside or outside of.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphericalLimit {
    /// Bone the sphere follows; `None` fixes it in simulation space.
    pub driving_bone: Option<usize>,
    /// Center relative to the driving bone.
    pub offset: Vector3<f64>,
    /// Sphere radius.
    pub radius: f64,
    /// Side the bodies stay on.
    pub side: SphereSide,
}

/// Substep scheduling.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubstepConfig {
    /// Run a variable number of fixed-size substeps, carrying leftover time.
    pub adaptive: bool,
    /// Largest substep, and the fixed step in adaptive mode.
    pub max_physics_delta_time: f64,
    /// Most substeps run in one frame.
    pub max_substeps: usize,
    /// Frames' worth of time that may be carried as debt.
    pub max_debt_frames: usize,
}

impl Default for SubstepConfig {
    fn default() -> Self {
        Self {
            adaptive: false,
            max_physics_delta_time: 1.0 / 30.0,
            max_substeps: 4,
            max_debt_frames: 5,
        }
    }
}

/// Per-node wind settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindConfig {
    /// Global wind switch.
    pub enabled: bool,
    /// Whether this node samples wind.
    pub body_wind: bool,
    /// Multiplier on sampled wind speed.
    pub scale: f64,
    /// Seed for the per-body adaption factors.
    pub seed: u64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            body_wind: false,
            scale: 1.0,
            seed: 0,
        }
    }
}

/// Configuration of a chain node.
///
/// # Example
///
/// ```
/// use sim_chain::{ChainConfig, CollisionRadius};
/// use nalgebra::Vector3;
///
/// let config = ChainConfig::new(2)
///     .with_end_bone(5)
///     .with_box_extents(Vector3::new(2.0, 2.0, 10.0))
///     .with_collision(CollisionRadius::InnerSphere)
///     .with_adaptive_substeps(1.0 / 60.0, 4);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainConfig {
    /// Global dynamics switch. A disabled node passes animation through.
    pub enabled: bool,
    /// First bone of the chain.
    pub root_bone: usize,
    /// Last bone of the chain; the chain is just the root bone when `None`.
    pub end_bone: Option<usize>,
    /// Box extents of every body.
    pub box_extents: Vector3<f64>,
    /// Body-local vector from each body's center to its joint. Derived from
    /// the bone layout when `None`.
    pub local_joint_offset: Option<Vector3<f64>>,
    /// Collision radius convention.
    pub collision: CollisionRadius,
    /// Joint limits.
    pub joint: JointSetup,
    /// Springs toward the animated pose.
    pub spring: AnimSpring,
    /// Linear damping override for every body.
    pub linear_damping: Option<f64>,
    /// Angular damping override for every body.
    pub angular_damping: Option<f64>,
    /// Multiplier on gravity.
    pub gravity_scale: f64,
    /// Simulation-space gravity replacing the world's.
    pub gravity_override: Option<Vector3<f64>>,
    /// Wind sampling.
    pub wind: WindConfig,
    /// Planes the bodies stay above.
    pub planar_limits: Vec<PlanarLimit>,
    /// Spheres the bodies stay inside or outside of.
    pub spherical_limits: Vec<SphericalLimit>,
    /// Space the bodies are simulated in.
    pub simulation_space: SimulationSpace,
    /// Skip simulation at levels of detail above this one.
    pub lod_threshold: Option<usize>,
    /// Substep scheduling.
    pub substep: SubstepConfig,
    /// Solver iteration counts and default damping.
    pub solver: SolverConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root_bone: 0,
            end_bone: None,
            box_extents: Vector3::from_element(1.0),
            local_joint_offset: None,
            collision: CollisionRadius::default(),
            joint: JointSetup::default(),
            spring: AnimSpring::default(),
            linear_damping: None,
            angular_damping: None,
            gravity_scale: 1.0,
            gravity_override: None,
            wind: WindConfig::default(),
            planar_limits: Vec::new(),
            spherical_limits: Vec::new(),
            simulation_space: SimulationSpace::default(),
            lod_threshold: None,
            substep: SubstepConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl ChainConfig {
    /// Create a configuration for a chain starting at `root_bone`.
    #[must_use]
    pub fn new(root_bone: usize) -> Self {
        Self {
            root_bone,
            ..Default::default()
        }
    }

    /// Set the last bone of the chain.
    #[must_use]
    pub fn with_end_bone(mut self, bone: usize) -> Self {
        self.end_bone = Some(bone);
        self
    }

    /// Set the box extents of every body.
    #[must_use]
    pub fn with_box_extents(mut self, extents: Vector3<f64>) -> Self {
        self.box_extents = extents;
        self
    }

    /// Set an explicit joint offset.
    #[must_use]
    pub fn with_joint_offset(mut self, offset: Vector3<f64>) -> Self {
        self.local_joint_offset = Some(offset);
        self
    }

    /// Set the collision radius convention.
    #[must_use]
    pub fn with_collision(mut self, collision: CollisionRadius) -> Self {
        self.collision = collision;
        self
    }

    /// Set the joint limits.
    #[must_use]
    pub fn with_joint(mut self, joint: JointSetup) -> Self {
        self.joint = joint;
        self
    }

    /// Set the springs toward the animated pose.
    #[must_use]
    pub fn with_spring(mut self, spring: AnimSpring) -> Self {
        self.spring = spring;
        self
    }

    /// Override damping for every body.
    #[must_use]
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = Some(clamp_damping(linear, DEFAULT_DAMPING));
        self.angular_damping = Some(clamp_damping(angular, DEFAULT_DAMPING));
        self
    }

    /// Set the gravity multiplier.
    #[must_use]
    pub fn with_gravity_scale(mut self, scale: f64) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Replace world gravity with a simulation-space vector.
    #[must_use]
    pub fn with_gravity_override(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity_override = Some(gravity);
        self
    }

    /// Enable wind sampling with a speed multiplier and adaption seed.
    #[must_use]
    pub fn with_wind(mut self, scale: f64, seed: u64) -> Self {
        self.wind.body_wind = true;
        self.wind.scale = scale;
        self.wind.seed = seed;
        self
    }

    /// Add a plane limit.
    #[must_use]
    pub fn with_planar_limit(mut self, limit: PlanarLimit) -> Self {
        self.planar_limits.push(limit);
        self
    }

    /// Add a sphere limit.
    #[must_use]
    pub fn with_spherical_limit(mut self, limit: SphericalLimit) -> Self {
        self.spherical_limits.push(limit);
        self
    }

    /// Set the simulation space.
    #[must_use]
    pub fn with_simulation_space(mut self, space: SimulationSpace) -> Self {
        self.simulation_space = space;
        self
    }

    /// Skip simulation above a level of detail.
    #[must_use]
    pub fn with_lod_threshold(mut self, lod: usize) -> Self {
        self.lod_threshold = Some(lod);
        self
    }

    /// Run adaptive substeps of `step` seconds, at most `max_substeps` a frame.
    #[must_use]
    pub fn with_adaptive_substeps(mut self, step: f64, max_substeps: usize) -> Self {
        self.substep.adaptive = true;
        self.substep.max_physics_delta_time = step;
        self.substep.max_substeps = max_substeps;
        self
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Collision radius for a body with the given box.
    #[must_use]
    pub fn collision_radius(&self, min_half_extent: f64, half_diagonal: f64) -> f64 {
        match self.collision {
            CollisionRadius::CenterOfMass => 0.0,
            CollisionRadius::CustomSphere(radius) => radius,
            CollisionRadius::InnerSphere => min_half_extent,
            CollisionRadius::OuterSphere => half_diagonal,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: degenerate box extents, an inverted
    /// limit range, a non-positive substep size, or invalid solver damping.
    pub fn validate(&self) -> Result<()> {
        if self.box_extents.iter().any(|e| !e.is_finite() || *e < EXTENT_EPSILON) {
            return Err(SimError::DegenerateShape {
                volume: self.box_extents.product(),
            });
        }

        let linear = self.joint.linear_range();
        check_ranges(&linear.min, &linear.max)?;
        if let AngularSetup::SwingTwist(range) = &self.joint.angular {
            check_ranges(&range.min, &range.max)?;
        }

        let step = self.substep.max_physics_delta_time;
        if !step.is_finite() || step <= 0.0 {
            return Err(SimError::InvalidTimestep(step));
        }

        for limit in &self.spherical_limits {
            if !limit.radius.is_finite() || limit.radius < 0.0 {
                return Err(SimError::invalid_config(format!(
                    "spherical limit radius {} must be non-negative",
                    limit.radius
                )));
            }
        }

        self.solver.validate()
    }

    /// Resolve configuration errors with safe fallbacks, logging each one.
    ///
    /// Degenerate boxes become unit boxes and a bad substep size becomes the
    /// default. Inverted ranges are kept as given.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.box_extents.iter().any(|e| !e.is_finite() || *e < EXTENT_EPSILON) {
            warn!(extents = ?self.box_extents, "degenerate box extents, using a unit box");
            self.box_extents = Vector3::from_element(1.0);
        }

        let linear = self.joint.linear_range();
        if let Err(err) = check_ranges(&linear.min, &linear.max) {
            warn!(%err, "linear limits used as given");
        }
        if let AngularSetup::SwingTwist(range) = &self.joint.angular {
            if let Err(err) = check_ranges(&range.min, &range.max) {
                warn!(%err, "angular limits used as given");
            }
        }

        let step = self.substep.max_physics_delta_time;
        if !step.is_finite() || step <= 0.0 {
            let fallback = SubstepConfig::default().max_physics_delta_time;
            warn!(step, fallback, "invalid substep size");
            self.substep.max_physics_delta_time = fallback;
        }

        if let Err(err) = self.solver.validate() {
            warn!(%err, "clamping solver damping");
            self.solver = self
                .solver
                .damping(self.solver.linear_damping, self.solver.angular_damping);
        }
        for damping in [&mut self.linear_damping, &mut self.angular_damping]
            .into_iter()
            .flatten()
        {
            if !(0.0..=1.0).contains(&*damping) {
                warn!(damping = *damping, "clamping body damping override");
                *damping = clamp_damping(*damping, DEFAULT_DAMPING);
            }
        }

        self
    }
}

fn check_ranges(min: &Vector3<f64>, max: &Vector3<f64>) -> Result<()> {
    for axis in 0..3 {
        if min[axis] > max[axis] {
            return Err(SimError::InvalidLimitRange {
                axis,
                min: min[axis],
                max: max[axis],
            });
        }
    }
    Ok(())
}

/// Plane pose in simulation space.
pub(crate) fn plane_pose(limit: &PlanarLimit, driver: Option<&Pose>) -> Pose {
    driver.map_or(limit.plane, |bone| bone.compose(&limit.plane))
}

/// Sphere center in simulation space.
pub(crate) fn sphere_center(limit: &SphericalLimit, driver: Option<&Pose>) -> Point3<f64> {
    let offset = Point3::from(limit.offset);
    driver.map_or(offset, |bone| bone.transform_point(&offset))
}
