//! The per-substep solver driver.
//!
//! # Solver Approach
//!
//! Each call to [`physics_update`] runs one substep, strictly in order:
//!
//! 1. Snapshot poses, damp momenta, add gravity and wind, refresh tensors
//! 2. Add the uniform external force
//! 3. Apply springs once
//! 4. Sweep all limits `pre_iterations` times (biased)
//! 5. Integrate: Euler for position, RK4 for orientation
//! 6. Remove bias from every limit
//! 7. Sweep all limits `post_iterations` times (unbiased)
//! 8. Commit the integrated pose and refresh tensors
//!
//! Limits are swept in container order, linear before angular. Repeated
//! Gauss-Seidel sweeps resolve conflicts between limits; no priority is
//! imposed.

use nalgebra::Vector3;
use sim_core::{integrators, BodySet};
use sim_types::{BodyHandle, Gravity, SolverConfig};
use tracing::{debug, trace};

use crate::limits::{AngularLimit, LinearLimit};
use crate::spring::Spring;

/// Environmental input for one substep.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverEnvironment {
    /// Gravity in simulation space.
    pub gravity: Gravity,
    /// Uniform force added to every active body.
    pub external_force: Vector3<f64>,
}

impl SolverEnvironment {
    /// Create an environment with gravity and no external force.
    #[must_use]
    pub fn new(gravity: Gravity) -> Self {
        Self {
            gravity,
            external_force: Vector3::zeros(),
        }
    }

    /// Set the external force.
    #[must_use]
    pub fn with_external_force(mut self, force: Vector3<f64>) -> Self {
        self.external_force = force;
        self
    }
}

/// Limits and springs for one substep.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Linear limits.
    pub linear: Vec<LinearLimit>,
    /// Angular limits.
    pub angular: Vec<AngularLimit>,
    /// Springs.
    pub springs: Vec<Spring>,
}

impl Constraints {
    /// Create empty containers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all limits, keeping springs.
    pub fn clear_limits(&mut self) {
        self.linear.clear();
        self.angular.clear();
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.clear_limits();
        self.springs.clear();
    }

    /// Total number of limits.
    #[must_use]
    pub fn limit_count(&self) -> usize {
        self.linear.len() + self.angular.len()
    }

    /// Check if there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limit_count() == 0 && self.springs.is_empty()
    }

    fn update_cached(&mut self, bodies: &BodySet) {
        for limit in &mut self.linear {
            limit.update_cached(bodies);
        }
        for limit in &mut self.angular {
            limit.update_cached(bodies);
        }
    }

    fn sweep(&mut self, bodies: &mut BodySet, dt: f64, iterations: usize) {
        for _ in 0..iterations {
            for limit in &mut self.linear {
                limit.iterate(bodies, dt);
            }
            for limit in &mut self.angular {
                limit.iterate(bodies, dt);
            }
        }
    }

    fn remove_bias(&mut self) {
        for limit in &mut self.linear {
            limit.remove_bias();
        }
        for limit in &mut self.angular {
            limit.remove_bias();
        }
    }
}

/// Advance the active bodies by one substep of length `dt`.
///
/// Bodies not listed in `active` are neither forced nor integrated, but still
/// receive impulses from limits that reference them. Non-positive or
/// non-finite `dt` leaves everything untouched.
pub fn physics_update(
    dt: f64,
    bodies: &mut BodySet,
    active: &[BodyHandle],
    constraints: &mut Constraints,
    env: &SolverEnvironment,
    config: &SolverConfig,
) {
    if !dt.is_finite() || dt <= 0.0 {
        debug!(dt, "skipping substep with non-positive timestep");
        return;
    }

    trace!(
        dt,
        bodies = active.len(),
        linear = constraints.linear.len(),
        angular = constraints.angular.len(),
        springs = constraints.springs.len(),
        "substep"
    );

    for &handle in active {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        body.previous = body.pose;
        let linear_damping = body.linear_damping.unwrap_or(config.linear_damping);
        let angular_damping = body.angular_damping.unwrap_or(config.angular_damping);
        integrators::apply_damping(body, linear_damping, angular_damping, dt);

        let gravity = env.gravity.force_on_mass(body.mass) * body.gravity_scale;
        let wind = body.wind.force(&body.linear_velocity());
        body.add_force(&(gravity + wind), dt);
        body.update_world_tensor();
        body.add_force(&env.external_force, dt);
    }

    for spring in &constraints.springs {
        spring.apply_forces(bodies, dt);
    }

    constraints.update_cached(bodies);
    constraints.sweep(bodies, dt, config.pre_iterations);

    for &handle in active {
        if let Some(body) = bodies.get_mut(handle) {
            integrators::integrate_body(body, dt);
        }
    }

    constraints.remove_bias();
    constraints.sweep(bodies, dt, config.post_iterations);

    for &handle in active {
        if let Some(body) = bodies.get_mut(handle) {
            body.pose = body.next;
            body.update_world_tensor();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::limits::Anchor;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion};
    use sim_core::RigidBody;

    fn single_body(position: Point3<f64>) -> (BodySet, Vec<BodyHandle>) {
        let mut bodies = BodySet::new();
        let h = bodies.insert(
            RigidBody::from_box(Vector3::new(1.0, 1.0, 1.0), position).unwrap(),
        );
        (bodies, vec![h])
    }

    #[test]
    fn test_invalid_timestep_is_noop() {
        let (mut bodies, active) = single_body(Point3::origin());
        let env = SolverEnvironment::new(Gravity::earth());
        let mut constraints = Constraints::new();

        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            physics_update(
                dt,
                &mut bodies,
                &active,
                &mut constraints,
                &env,
                &SolverConfig::default(),
            );
        }
        let body = bodies.get(active[0]).unwrap();
        assert_eq!(body.pose.position, Point3::origin());
        assert_eq!(body.linear_momentum, Vector3::zeros());
    }

    #[test]
    fn test_gravity_scale_and_damping_override() {
        let (mut bodies, active) = single_body(Point3::origin());
        {
            let body = bodies.get_mut(active[0]).unwrap();
            body.gravity_scale = 0.5;
            body.linear_damping = Some(0.0);
        }
        let env = SolverEnvironment::new(Gravity::custom(Vector3::new(0.0, 0.0, -10.0)));
        let mut constraints = Constraints::new();

        physics_update(0.1, &mut bodies, &active, &mut constraints, &env, &SolverConfig::default());

        let body = bodies.get(active[0]).unwrap();
        assert_relative_eq!(body.linear_velocity().z, -0.5, epsilon = 1e-12);
        assert_relative_eq!(body.pose.position.z, -0.05, epsilon = 1e-12);
        assert_eq!(body.previous.position, Point3::origin());
    }

    #[test]
    fn test_external_force_and_wind() {
        let (mut bodies, active) = single_body(Point3::origin());
        {
            let body = bodies.get_mut(active[0]).unwrap();
            body.wind.enabled = true;
            body.wind.direction = Vector3::y();
            body.wind.speed = 4.0;
            body.wind.adaption = 0.5;
        }
        let env = SolverEnvironment::new(Gravity::zero())
            .with_external_force(Vector3::new(2.0, 0.0, 0.0));
        let config = SolverConfig::default().damping(0.0, 0.0);
        let mut constraints = Constraints::new();

        physics_update(0.5, &mut bodies, &active, &mut constraints, &env, &config);

        let v = bodies.get(active[0]).unwrap().linear_velocity();
        assert_relative_eq!(v.x, 1.0, epsilon = 1e-12);
        // (4 - 0) · 0.5 · 0.5
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inactive_body_is_not_integrated() {
        let (mut bodies, _) = single_body(Point3::origin());
        let env = SolverEnvironment::new(Gravity::earth());
        let mut constraints = Constraints::new();

        physics_update(0.1, &mut bodies, &[], &mut constraints, &env, &SolverConfig::default());
        assert_eq!(bodies.get(BodyHandle::new(0)).unwrap().pose.position, Point3::origin());
    }

    #[test]
    fn test_spinning_body_keeps_unit_rotation() {
        let (mut bodies, active) = single_body(Point3::origin());
        bodies.get_mut(active[0]).unwrap().angular_momentum = Vector3::new(0.3, 1.0, -0.2);
        let env = SolverEnvironment::new(Gravity::zero());
        let config = SolverConfig::default().damping(0.0, 0.0);
        let mut constraints = Constraints::new();

        for _ in 0..100 {
            physics_update(1.0 / 60.0, &mut bodies, &active, &mut constraints, &env, &config);
        }
        let body = bodies.get(active[0]).unwrap();
        assert_relative_eq!(body.pose.rotation.norm(), 1.0, epsilon = 1e-12);
        assert!(body.pose.rotation.angle_to(&UnitQuaternion::identity()) > 0.1);
    }

    #[test]
    fn test_limit_cancels_gravity() {
        let (mut bodies, active) = single_body(Point3::origin());
        let env = SolverEnvironment::new(Gravity::earth());
        let mut constraints = Constraints::new();
        constraints.linear.push(LinearLimit::new(
            Anchor::world(Point3::origin()),
            Anchor::center_of(active[0]),
            Vector3::z(),
            0.0,
        ));

        physics_update(0.1, &mut bodies, &active, &mut constraints, &env, &SolverConfig::default());

        let body = bodies.get(active[0]).unwrap();
        assert_relative_eq!(body.pose.position.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(body.linear_velocity().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constraints_container() {
        let mut constraints = Constraints::new();
        assert!(constraints.is_empty());
        constraints.springs.push(Spring::new(
            Anchor::world(Point3::origin()),
            Anchor::world(Point3::origin()),
        ));
        constraints.angular.push(AngularLimit::new(
            sim_types::BodyRef::WorldFixed,
            sim_types::BodyRef::WorldFixed,
            Vector3::x(),
            0.0,
        ));
        assert_eq!(constraints.limit_count(), 1);

        constraints.clear_limits();
        assert_eq!(constraints.limit_count(), 0);
        assert!(!constraints.is_empty());
        constraints.clear();
        assert!(constraints.is_empty());
    }
}
