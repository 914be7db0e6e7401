//! One-dimensional limits resolved with sequential impulses.
//!
//! A limit constrains the relative velocity of two bodies along (linear) or
//! about (angular) a world axis. Each iteration computes the impulse that
//! would bring the relative velocity to the target, clamps the *accumulated*
//! impulse to the configured range and applies only the difference.
//!
//! # Sign Convention
//!
//! Relative quantities are measured as second minus first. A positive impulse
//! pushes the second body along the axis and the first body against it, so:
//!
//! - `[0, +∞)` keeps the relative velocity at or above the target (lower bound)
//! - `(−∞, 0]` keeps it at or below the target (upper bound)
//! - an unbounded range makes the limit bilateral
//!
//! # Bias
//!
//! Targets built from positional error inject velocity. After integration
//! [`LinearLimit::remove_bias`] and [`AngularLimit::remove_bias`] swap in a
//! target that no longer corrects position, and a short unbiased pass removes
//! the injected velocity before the pose is committed.

use nalgebra::{Point3, Vector3};
use sim_core::BodySet;
use sim_types::{BodyHandle, BodyRef};

/// Denominators below this are treated as zero.
pub(crate) const EFFECTIVE_MASS_EPSILON: f64 = 1e-12;

/// One side of a constraint: a body and a point on it.
///
/// For [`BodyRef::WorldFixed`] the point is in simulation space; otherwise
/// it is in the body's local frame, relative to its center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// The body, or the world.
    pub body: BodyRef,
    /// Anchor point.
    pub point: Point3<f64>,
}

impl Anchor {
    /// Anchor on a dynamic body at a local point.
    #[must_use]
    pub fn body(handle: BodyHandle, local: Point3<f64>) -> Self {
        Self {
            body: BodyRef::Dynamic(handle),
            point: local,
        }
    }

    /// Anchor at a body's center of mass.
    #[must_use]
    pub fn center_of(handle: BodyHandle) -> Self {
        Self::body(handle, Point3::origin())
    }

    /// Fixed anchor at a point in simulation space.
    #[must_use]
    pub fn world(point: Point3<f64>) -> Self {
        Self {
            body: BodyRef::WorldFixed,
            point,
        }
    }

    /// Current world position of the anchor.
    #[must_use]
    pub fn world_position(&self, bodies: &BodySet) -> Point3<f64> {
        bodies.world_point(self.body, &self.point)
    }
}

/// Linear limit between two anchors along a world axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearLimit {
    /// First side.
    pub first: Anchor,
    /// Second side.
    pub second: Anchor,
    /// Unit axis in simulation space.
    pub axis: Vector3<f64>,
    /// Target relative speed along the axis (second minus first).
    pub target_speed: f64,
    /// Target used after bias removal.
    pub unbiased_target_speed: f64,
    /// Lower force bound.
    pub min_force: f64,
    /// Upper force bound.
    pub max_force: f64,
    effective_inverse_mass: f64,
    accumulated_impulse: f64,
}

impl LinearLimit {
    /// Create a bilateral limit with the given target speed.
    ///
    /// The unbiased target defaults to zero.
    #[must_use]
    pub fn new(first: Anchor, second: Anchor, axis: Vector3<f64>, target_speed: f64) -> Self {
        Self {
            first,
            second,
            axis,
            target_speed,
            unbiased_target_speed: 0.0,
            min_force: f64::NEG_INFINITY,
            max_force: f64::INFINITY,
            effective_inverse_mass: 0.0,
            accumulated_impulse: 0.0,
        }
    }

    /// Set the force range.
    #[must_use]
    pub fn with_force_range(mut self, min: f64, max: f64) -> Self {
        self.min_force = min;
        self.max_force = max;
        self
    }

    /// Set the target used after bias removal.
    #[must_use]
    pub fn with_unbiased_target(mut self, target: f64) -> Self {
        self.unbiased_target_speed = target;
        self
    }

    /// Check if the limit acts in both directions.
    #[must_use]
    pub fn is_bilateral(&self) -> bool {
        self.min_force < 0.0 && self.max_force > 0.0
    }

    /// Impulse applied so far this substep.
    #[must_use]
    pub fn accumulated_impulse(&self) -> f64 {
        self.accumulated_impulse
    }

    /// Cached effective inverse mass along the axis.
    #[must_use]
    pub fn effective_inverse_mass(&self) -> f64 {
        self.effective_inverse_mass
    }

    /// Current separation of the anchors along the axis.
    #[must_use]
    pub fn separation(&self, bodies: &BodySet) -> f64 {
        (self.second.world_position(bodies) - self.first.world_position(bodies)).dot(&self.axis)
    }

    /// Recompute the effective inverse mass from the current orientations.
    pub fn update_cached(&mut self, bodies: &BodySet) {
        let side = |anchor: &Anchor| {
            bodies.resolve(anchor.body).map_or(0.0, |body| {
                let lever = body.world_point(&anchor.point) - body.pose.position;
                let rn = lever.cross(&self.axis);
                body.inv_mass + rn.dot(&(body.inverse_world_tensor * rn))
            })
        };
        self.effective_inverse_mass = side(&self.first) + side(&self.second);
    }

    /// Apply one corrective impulse.
    pub fn iterate(&mut self, bodies: &mut BodySet, dt: f64) {
        if self.effective_inverse_mass < EFFECTIVE_MASS_EPSILON || dt <= 0.0 {
            return;
        }

        let p0 = self.first.world_position(bodies);
        let p1 = self.second.world_position(bodies);
        let relative = (bodies.point_velocity(self.second.body, &p1)
            - bodies.point_velocity(self.first.body, &p0))
        .dot(&self.axis);

        let impulse = (self.target_speed - relative) / self.effective_inverse_mass;
        let previous = self.accumulated_impulse;
        self.accumulated_impulse = (previous + impulse)
            .max(self.min_force * dt)
            .min(self.max_force * dt);
        let applied = self.accumulated_impulse - previous;

        let j = self.axis * applied;
        bodies.apply_impulse(self.second.body, &p1, &j);
        bodies.apply_impulse(self.first.body, &p0, &-j);
    }

    /// Replace the position-correcting target with the unbiased one.
    pub fn remove_bias(&mut self) {
        self.target_speed = self.unbiased_target_speed;
    }
}

/// Angular limit between two bodies about a world axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularLimit {
    /// First body.
    pub first: BodyRef,
    /// Second body.
    pub second: BodyRef,
    /// Unit axis in simulation space.
    pub axis: Vector3<f64>,
    /// Target relative spin about the axis (second minus first).
    pub target_spin: f64,
    /// Lower torque bound.
    pub min_torque: f64,
    /// Upper torque bound.
    pub max_torque: f64,
    spin_to_torque: f64,
    accumulated_impulse: f64,
}

impl AngularLimit {
    /// Create an unbounded limit with the given target spin.
    #[must_use]
    pub fn new(first: BodyRef, second: BodyRef, axis: Vector3<f64>, target_spin: f64) -> Self {
        Self {
            first,
            second,
            axis,
            target_spin,
            min_torque: f64::NEG_INFINITY,
            max_torque: f64::INFINITY,
            spin_to_torque: 0.0,
            accumulated_impulse: 0.0,
        }
    }

    /// Set the torque range.
    #[must_use]
    pub fn with_torque_range(mut self, min: f64, max: f64) -> Self {
        self.min_torque = min;
        self.max_torque = max;
        self
    }

    /// Impulse applied so far this substep.
    #[must_use]
    pub fn accumulated_impulse(&self) -> f64 {
        self.accumulated_impulse
    }

    /// Recompute the spin-to-torque factor from the current orientations.
    pub fn update_cached(&mut self, bodies: &BodySet) {
        let tensor =
            bodies.inverse_world_tensor(self.first) + bodies.inverse_world_tensor(self.second);
        let k = self.axis.dot(&(tensor * self.axis));
        self.spin_to_torque = if k > EFFECTIVE_MASS_EPSILON { 1.0 / k } else { 0.0 };
    }

    /// Apply one corrective angular impulse.
    pub fn iterate(&mut self, bodies: &mut BodySet, dt: f64) {
        if self.spin_to_torque <= 0.0 || dt <= 0.0 {
            return;
        }

        let relative = (bodies.spin(self.second) - bodies.spin(self.first)).dot(&self.axis);
        let impulse = (self.target_spin - relative) * self.spin_to_torque;

        let previous = self.accumulated_impulse;
        self.accumulated_impulse = (previous + impulse)
            .max(self.min_torque * dt)
            .min(self.max_torque * dt);
        let applied = self.accumulated_impulse - previous;

        let j = self.axis * applied;
        bodies.apply_angular_impulse(self.second, &j);
        bodies.apply_angular_impulse(self.first, &-j);
    }

    /// Pull the target spin toward zero.
    ///
    /// One-sided limits keep a target that only permits motion away from
    /// the bound; two-sided limits drop it entirely.
    pub fn remove_bias(&mut self) {
        if self.min_torque >= 0.0 {
            self.target_spin = self.target_spin.min(0.0);
        } else if self.max_torque <= 0.0 {
            self.target_spin = self.target_spin.max(0.0);
        } else {
            self.target_spin = 0.0;
        }
    }
}
