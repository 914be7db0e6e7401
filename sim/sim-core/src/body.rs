//! Rigid bodies and the arena that owns them.
//!
//! Momenta are the state variables. Velocities are derived on demand:
//! linear velocity is `inv_mass · P`, spin is `I⁻¹_world · L`. The world
//! inverse tensor depends on orientation and is refreshed by the solver
//! whenever the orientation changes.

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use sim_types::{BodyHandle, BodyRef, Pose, Result, SimError};

use crate::shape::{Shape, VOLUME_EPSILON};

/// Per-body wind sampling, refreshed once per frame by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyWind {
    /// Whether wind affects this body.
    pub enabled: bool,
    /// Unit direction the wind blows toward.
    pub direction: Vector3<f64>,
    /// Wind speed at the body.
    pub speed: f64,
    /// Per-body response factor, fixed when the body is created.
    pub adaption: f64,
}

impl BodyWind {
    /// Force pulling the body's velocity toward the wind velocity.
    #[must_use]
    pub fn force(&self, linear_velocity: &Vector3<f64>) -> Vector3<f64> {
        if !self.enabled {
            return Vector3::zeros();
        }
        (self.direction * self.speed - linear_velocity) * self.adaption
    }
}

/// A simulated rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Collision geometry, in body-local space.
    pub shapes: Vec<Shape>,
    /// Mass.
    pub mass: f64,
    /// Inverse mass.
    pub inv_mass: f64,
    /// Body-space inverse inertia tensor for unit mass.
    pub inverse_tensor_unit: Matrix3<f64>,
    /// Body-space inverse inertia tensor.
    pub inverse_tensor: Matrix3<f64>,
    /// World-space inverse inertia tensor, cached for the current orientation.
    pub inverse_world_tensor: Matrix3<f64>,
    /// Current pose of the center of mass.
    pub pose: Pose,
    /// Pose at the start of the current substep.
    pub previous: Pose,
    /// Pose produced by integration, committed at the end of the substep.
    pub next: Pose,
    /// Linear momentum.
    pub linear_momentum: Vector3<f64>,
    /// Angular momentum.
    pub angular_momentum: Vector3<f64>,
    /// Parent body in the chain, if any.
    pub parent: Option<BodyHandle>,
    /// Linear damping override; the solver default applies when `None`.
    pub linear_damping: Option<f64>,
    /// Angular damping override; the solver default applies when `None`.
    pub angular_damping: Option<f64>,
    /// Multiplier on gravity.
    pub gravity_scale: f64,
    /// Radius used to offset planar and spherical limits.
    pub collision_radius: f64,
    /// Wind sampling.
    pub wind: BodyWind,
}

impl RigidBody {
    /// Build a body from shapes whose vertices are expressed relative to
    /// `origin`.
    ///
    /// The body is placed at `origin + com` with unit mass and its shapes are
    /// recentered around the combined center of mass.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateShape`] when the total volume is close to
    /// zero and [`SimError::SingularInertia`] when the tensor has no inverse.
    pub fn new(mut shapes: Vec<Shape>, origin: Point3<f64>) -> Result<Self> {
        let volume: f64 = shapes.iter().map(|s| s.volume).sum();
        if !volume.is_finite() || volume.abs() < VOLUME_EPSILON {
            return Err(SimError::DegenerateShape { volume });
        }

        let com = shapes
            .iter()
            .fold(Vector3::<f64>::zeros(), |acc, s| {
                acc + s.center_of_mass.coords * s.volume
            })
            / volume;
        let com = Point3::from(com);

        let inertia = shapes.iter().fold(Matrix3::<f64>::zeros(), |acc, s| {
            acc + s.inertia_about(&com) * (s.volume / volume)
        });
        let inverse = inertia.try_inverse().ok_or(SimError::SingularInertia)?;

        for shape in &mut shapes {
            shape.translate(&-com.coords);
        }

        let pose = Pose::from_position(origin + com.coords);
        Ok(Self {
            shapes,
            mass: 1.0,
            inv_mass: 1.0,
            inverse_tensor_unit: inverse,
            inverse_tensor: inverse,
            inverse_world_tensor: inverse,
            pose,
            previous: pose,
            next: pose,
            linear_momentum: Vector3::zeros(),
            angular_momentum: Vector3::zeros(),
            parent: None,
            linear_damping: None,
            angular_damping: None,
            gravity_scale: 1.0,
            collision_radius: 0.0,
            wind: BodyWind::default(),
        })
    }

    /// Build a box body centered at `center`.
    ///
    /// # Errors
    ///
    /// Fails like [`RigidBody::new`] when any extent is zero.
    pub fn from_box(extents: Vector3<f64>, center: Point3<f64>) -> Result<Self> {
        Self::new(vec![Shape::make_box(extents)], center)
    }

    /// Scale mass, inverse mass, momenta and inverse tensors by `factor`.
    ///
    /// Velocities are unchanged. Non-positive or non-finite factors are
    /// ignored.
    pub fn scale_mass(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.mass *= factor;
        self.inv_mass /= factor;
        self.linear_momentum *= factor;
        self.angular_momentum *= factor;
        self.inverse_tensor /= factor;
        self.inverse_world_tensor /= factor;
    }

    /// Angular velocity.
    #[must_use]
    pub fn spin(&self) -> Vector3<f64> {
        self.inverse_world_tensor * self.angular_momentum
    }

    /// Linear velocity of the center of mass.
    #[must_use]
    pub fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_momentum * self.inv_mass
    }

    /// Velocity of a world-space point rigidly attached to the body.
    #[must_use]
    pub fn point_velocity(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.linear_velocity() + self.spin().cross(&(point - self.pose.position))
    }

    /// Refresh the world inverse tensor from the current orientation.
    pub fn update_world_tensor(&mut self) {
        self.inverse_world_tensor = world_tensor(&self.pose.rotation, &self.inverse_tensor);
    }

    /// World inverse tensor for an arbitrary orientation.
    #[must_use]
    pub fn world_tensor_at(&self, rotation: &UnitQuaternion<f64>) -> Matrix3<f64> {
        world_tensor(rotation, &self.inverse_tensor)
    }

    /// Apply a linear impulse at a world-space point.
    pub fn apply_impulse(&mut self, point: &Point3<f64>, impulse: &Vector3<f64>) {
        self.linear_momentum += impulse;
        self.angular_momentum += (point - self.pose.position).cross(impulse);
    }

    /// Apply an angular impulse.
    pub fn apply_angular_impulse(&mut self, impulse: &Vector3<f64>) {
        self.angular_momentum += impulse;
    }

    /// Add a force at the center of mass over `dt`.
    pub fn add_force(&mut self, force: &Vector3<f64>, dt: f64) {
        self.linear_momentum += force * dt;
    }

    /// Transform a body-local point to world space.
    #[must_use]
    pub fn world_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.pose.transform_point(local)
    }

    /// Reset the pose and zero both momenta.
    pub fn snap_to(&mut self, pose: Pose) {
        self.pose = pose;
        self.previous = pose;
        self.next = pose;
        self.linear_momentum = Vector3::zeros();
        self.angular_momentum = Vector3::zeros();
        self.update_world_tensor();
    }

    /// Re-express the body in another space, where `basis` maps the current
    /// space into the new one.
    pub fn transform(&mut self, basis: &Pose) {
        self.pose = basis.compose(&self.pose);
        self.previous = basis.compose(&self.previous);
        self.next = basis.compose(&self.next);
        self.linear_momentum = basis.rotation * self.linear_momentum;
        self.angular_momentum = basis.rotation * self.angular_momentum;
        self.update_world_tensor();
    }

    /// Check whether the body state is free of `NaN` and `Inf`.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite()
            && self.linear_momentum.iter().all(|x| x.is_finite())
            && self.angular_momentum.iter().all(|x| x.is_finite())
    }

    /// Smallest half extent of the body's vertices along a local axis.
    #[must_use]
    pub fn min_half_extent(&self) -> f64 {
        self.half_extents().min()
    }

    /// Half diagonal of the body's local bounding box.
    #[must_use]
    pub fn half_diagonal(&self) -> f64 {
        self.half_extents().norm()
    }

    fn half_extents(&self) -> Vector3<f64> {
        self.shapes
            .iter()
            .flat_map(|s| s.vertices.iter())
            .fold(Vector3::<f64>::zeros(), |acc, v| acc.sup(&v.coords.abs()))
    }
}

fn world_tensor(rotation: &UnitQuaternion<f64>, local: &Matrix3<f64>) -> Matrix3<f64> {
    let r = rotation.to_rotation_matrix();
    r.matrix() * local * r.matrix().transpose()
}

/// Arena of rigid bodies addressed by [`BodyHandle`].
///
/// Queries taking a [`BodyRef`] treat [`BodyRef::WorldFixed`] and stale
/// handles as an immovable anchor with infinite mass.
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: Vec<RigidBody>,
}

impl BodySet {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body and return its handle.
    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle::new(self.bodies.len() - 1)
    }

    /// Get a body.
    #[must_use]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.index())
    }

    /// Get a body mutably.
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.index())
    }

    /// Resolve a constraint side to a body.
    #[must_use]
    pub fn resolve(&self, side: BodyRef) -> Option<&RigidBody> {
        side.handle().and_then(|h| self.get(h))
    }

    /// Resolve a constraint side to a mutable body.
    pub fn resolve_mut(&mut self, side: BodyRef) -> Option<&mut RigidBody> {
        side.handle().and_then(|h| self.bodies.get_mut(h.index()))
    }

    /// Iterate over bodies with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (BodyHandle::new(i), b))
    }

    /// Iterate mutably over bodies with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.bodies
            .iter_mut()
            .enumerate()
            .map(|(i, b)| (BodyHandle::new(i), b))
    }

    /// All handles, in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> {
        (0..self.bodies.len()).map(BodyHandle::new)
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Check if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Remove all bodies. Existing handles become stale.
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    /// Inverse mass of a constraint side.
    #[must_use]
    pub fn inverse_mass(&self, side: BodyRef) -> f64 {
        self.resolve(side).map_or(0.0, |b| b.inv_mass)
    }

    /// World inverse tensor of a constraint side.
    #[must_use]
    pub fn inverse_world_tensor(&self, side: BodyRef) -> Matrix3<f64> {
        self.resolve(side)
            .map_or_else(Matrix3::zeros, |b| b.inverse_world_tensor)
    }

    /// Pose of a constraint side; identity for the world.
    #[must_use]
    pub fn pose(&self, side: BodyRef) -> Pose {
        self.resolve(side).map_or_else(Pose::identity, |b| b.pose)
    }

    /// World position of an anchor. World-fixed anchors are already in world
    /// space.
    #[must_use]
    pub fn world_point(&self, side: BodyRef, local: &Point3<f64>) -> Point3<f64> {
        self.resolve(side).map_or(*local, |b| b.world_point(local))
    }

    /// Velocity of a world point attached to a constraint side.
    #[must_use]
    pub fn point_velocity(&self, side: BodyRef, point: &Point3<f64>) -> Vector3<f64> {
        self.resolve(side)
            .map_or_else(Vector3::zeros, |b| b.point_velocity(point))
    }

    /// Angular velocity of a constraint side.
    #[must_use]
    pub fn spin(&self, side: BodyRef) -> Vector3<f64> {
        self.resolve(side).map_or_else(Vector3::zeros, RigidBody::spin)
    }

    /// Apply a linear impulse at a world point; no-op for the world.
    pub fn apply_impulse(&mut self, side: BodyRef, point: &Point3<f64>, impulse: &Vector3<f64>) {
        if let Some(body) = self.resolve_mut(side) {
            body.apply_impulse(point, impulse);
        }
    }

    /// Apply an angular impulse; no-op for the world.
    pub fn apply_angular_impulse(&mut self, side: BodyRef, impulse: &Vector3<f64>) {
        if let Some(body) = self.resolve_mut(side) {
            body.apply_angular_impulse(impulse);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(center: Point3<f64>) -> RigidBody {
        RigidBody::from_box(Vector3::new(1.0, 1.0, 1.0), center).unwrap()
    }

    #[test]
    fn test_body_construction() {
        let mut shape = Shape::make_box(Vector3::new(1.0, 1.0, 1.0));
        shape.translate(&Vector3::new(0.0, 0.0, 2.0));

        let body = RigidBody::new(vec![shape], Point3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(
            body.pose.position.coords,
            Vector3::new(1.0, 0.0, 2.0),
            epsilon = 1e-10
        );
        assert_relative_eq!(body.mass, 1.0);
        assert_relative_eq!(
            body.shapes[0].center_of_mass.coords,
            Vector3::zeros(),
            epsilon = 1e-10
        );
        // Unit cube: I = 1/6, so I⁻¹ = 6.
        assert_relative_eq!(body.inverse_tensor[(0, 0)], 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_shape_center_of_mass() {
        let mut left = Shape::make_box(Vector3::new(1.0, 1.0, 1.0));
        left.translate(&Vector3::new(-1.0, 0.0, 0.0));
        let mut right = Shape::make_box(Vector3::new(2.0, 1.0, 1.0));
        right.translate(&Vector3::new(2.0, 0.0, 0.0));

        let body = RigidBody::new(vec![left, right], Point3::origin()).unwrap();
        // Volumes 1 and 2: (−1·1 + 2·2) / 3 = 1.
        assert_relative_eq!(body.pose.position.x, 1.0, epsilon = 1e-10);
        assert!(body.inverse_tensor.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_degenerate_body() {
        let result = RigidBody::from_box(Vector3::new(0.0, 1.0, 1.0), Point3::origin());
        assert!(matches!(result, Err(SimError::DegenerateShape { .. })));
    }

    #[test]
    fn test_scale_mass_preserves_velocity() {
        let mut body = unit_box_at(Point3::origin());
        body.linear_momentum = Vector3::new(1.0, 2.0, 3.0);
        body.angular_momentum = Vector3::new(0.5, 0.0, 0.0);
        let v = body.linear_velocity();
        let w = body.spin();

        body.scale_mass(4.0);
        assert_relative_eq!(body.mass, 4.0);
        assert_relative_eq!(body.inv_mass, 0.25);
        assert_relative_eq!(body.linear_velocity(), v, epsilon = 1e-12);
        assert_relative_eq!(body.spin(), w, epsilon = 1e-12);
        assert_relative_eq!(body.inverse_tensor_unit[(0, 0)], 6.0, epsilon = 1e-9);

        body.scale_mass(0.0);
        assert_relative_eq!(body.mass, 4.0);
    }

    #[test]
    fn test_impulse_at_offset_spins_body() {
        let mut body = unit_box_at(Point3::origin());
        body.apply_impulse(&Point3::new(0.0, 1.0, 0.0), &Vector3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(body.linear_velocity().x, 1.0);
        // r × J = (0,1,0) × (1,0,0) = (0,0,−1)
        assert_relative_eq!(body.angular_momentum, Vector3::new(0.0, 0.0, -1.0));
        assert!(body.spin().z < 0.0);
    }

    #[test]
    fn test_world_tensor_follows_rotation() {
        let mut body =
            RigidBody::from_box(Vector3::new(1.0, 2.0, 3.0), Point3::origin()).unwrap();
        let local_xx = body.inverse_tensor[(0, 0)];
        body.pose.rotation =
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        body.update_world_tensor();
        // After 90° about Z the body's X axis points along world Y.
        assert_relative_eq!(body.inverse_world_tensor[(1, 1)], local_xx, epsilon = 1e-9);
    }

    #[test]
    fn test_snap_and_transform() {
        let mut body = unit_box_at(Point3::origin());
        body.linear_momentum = Vector3::new(1.0, 0.0, 0.0);
        body.snap_to(Pose::from_position(Point3::new(0.0, 0.0, 5.0)));
        assert_relative_eq!(body.linear_momentum.norm(), 0.0);
        assert_relative_eq!(body.previous.position.z, 5.0);

        body.linear_momentum = Vector3::new(1.0, 0.0, 0.0);
        let basis = Pose::from_position_rotation(
            Point3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        body.transform(&basis);
        assert_relative_eq!(
            body.pose.position.coords,
            Vector3::new(1.0, 0.0, 5.0),
            epsilon = 1e-10
        );
        assert_relative_eq!(body.linear_momentum, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_extents_for_radius() {
        let body = RigidBody::from_box(Vector3::new(2.0, 4.0, 4.0), Point3::origin()).unwrap();
        assert_relative_eq!(body.min_half_extent(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.half_diagonal(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_body_set_world_side() {
        let mut set = BodySet::new();
        let handle = set.insert(unit_box_at(Point3::new(0.0, 0.0, 1.0)));
        assert_eq!(set.len(), 1);

        let world = BodyRef::WorldFixed;
        let anchor = Point3::new(3.0, 2.0, 1.0);
        assert_eq!(set.world_point(world, &anchor), anchor);
        assert_relative_eq!(set.inverse_mass(world), 0.0);
        assert_relative_eq!(set.inverse_world_tensor(world), Matrix3::zeros());

        set.apply_impulse(world, &anchor, &Vector3::x());
        let dynamic = BodyRef::from(handle);
        set.apply_impulse(dynamic, &Point3::new(0.0, 0.0, 1.0), &Vector3::x());
        assert_relative_eq!(set.point_velocity(dynamic, &Point3::new(0.0, 0.0, 1.0)).x, 1.0);

        // Stale handles behave like the world.
        assert_relative_eq!(set.inverse_mass(BodyRef::from(BodyHandle::new(9))), 0.0);
    }
}
