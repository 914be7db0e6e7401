//! Numerical integration for rigid bodies.
//!
//! Positions advance with forward Euler from the current linear velocity.
//! Orientations advance with a fourth-order Runge-Kutta step on the quaternion
//! derivative, re-deriving spin from angular momentum at every stage so the
//! world inverse tensor tracks the intermediate orientations.
//!
//! # Integration Methods
//!
//! | Method | Order | Used For |
//! |--------|-------|----------|
//! | Explicit Euler | 1 | Position; orientation in tests |
//! | RK4 | 4 | Orientation |
//!
//! # Example
//!
//! ```
//! use sim_core::integrators::{integrate_body, RungeKutta4, OrientationIntegrator};
//! use sim_core::RigidBody;
//! use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
//!
//! let mut body = RigidBody::from_box(Vector3::new(1.0, 1.0, 1.0), Point3::origin()).unwrap();
//! body.linear_momentum = Vector3::new(0.0, 0.0, -1.0);
//! integrate_body(&mut body, 0.1);
//! assert!(body.next.position.z < 0.0);
//!
//! let q = RungeKutta4::integrate(
//!     &UnitQuaternion::identity(),
//!     &Matrix3::identity(),
//!     &Vector3::new(0.0, 0.0, 1.0),
//!     0.5,
//! );
//! assert!((q.angle() - 0.5).abs() < 1e-6);
//! ```

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::body::RigidBody;

/// Advances an orientation given constant angular momentum.
pub trait OrientationIntegrator {
    /// Integrate `rotation` forward by `dt`.
    ///
    /// # Arguments
    ///
    /// * `rotation` - Current orientation
    /// * `inverse_tensor` - Body-space inverse inertia tensor
    /// * `angular_momentum` - World-space angular momentum
    /// * `dt` - Timestep in seconds
    fn integrate(
        rotation: &UnitQuaternion<f64>,
        inverse_tensor: &Matrix3<f64>,
        angular_momentum: &Vector3<f64>,
        dt: f64,
    ) -> UnitQuaternion<f64>;
}

/// Explicit Euler on the quaternion derivative.
///
/// ```text
/// q(t+dt) = normalize(q(t) + q'(q(t)) * dt)
/// ```
pub struct ExplicitEuler;

impl OrientationIntegrator for ExplicitEuler {
    fn integrate(
        rotation: &UnitQuaternion<f64>,
        inverse_tensor: &Matrix3<f64>,
        angular_momentum: &Vector3<f64>,
        dt: f64,
    ) -> UnitQuaternion<f64> {
        let q = rotation.into_inner();
        let k = derivative(&q, inverse_tensor, angular_momentum);
        normalize_or(q + k * dt, rotation)
    }
}

/// Fourth-order Runge-Kutta on the quaternion derivative.
///
/// ```text
/// k1 = q'(q)
/// k2 = q'(q + k1 * dt/2)
/// k3 = q'(q + k2 * dt/2)
/// k4 = q'(q + k3 * dt)
/// q(t+dt) = normalize(q + (k1 + 2k2 + 2k3 + k4) * dt/6)
/// ```
pub struct RungeKutta4;

impl OrientationIntegrator for RungeKutta4 {
    fn integrate(
        rotation: &UnitQuaternion<f64>,
        inverse_tensor: &Matrix3<f64>,
        angular_momentum: &Vector3<f64>,
        dt: f64,
    ) -> UnitQuaternion<f64> {
        let q = rotation.into_inner();
        let half = dt * 0.5;

        let k1 = derivative(&q, inverse_tensor, angular_momentum);
        let k2 = derivative(&(q + k1 * half), inverse_tensor, angular_momentum);
        let k3 = derivative(&(q + k2 * half), inverse_tensor, angular_momentum);
        let k4 = derivative(&(q + k3 * dt), inverse_tensor, angular_momentum);

        let sum = k1 + k2 * 2.0 + k3 * 2.0 + k4;
        normalize_or(q + sum * (dt / 6.0), rotation)
    }
}

/// `q' = 0.5 * (0, ω) * q`, with `ω = R(q) I⁻¹ R(q)ᵀ L`.
fn derivative(
    q: &Quaternion<f64>,
    inverse_tensor: &Matrix3<f64>,
    angular_momentum: &Vector3<f64>,
) -> Quaternion<f64> {
    let r = UnitQuaternion::new_normalize(*q).to_rotation_matrix();
    let spin = r.matrix() * inverse_tensor * r.matrix().transpose() * angular_momentum;
    Quaternion::from_imag(spin) * q * 0.5
}

fn normalize_or(q: Quaternion<f64>, fallback: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::try_new(q, 1e-12).unwrap_or(*fallback)
}

/// Advance a body into its `next` pose: Euler for position, RK4 for
/// orientation.
pub fn integrate_body(body: &mut RigidBody, dt: f64) {
    let velocity = body.linear_velocity();
    body.next.position = body.pose.position + velocity * dt;
    body.next.rotation = RungeKutta4::integrate(
        &body.pose.rotation,
        &body.inverse_tensor,
        &body.angular_momentum,
        dt,
    );
}

/// Exponential momentum damping over `dt`.
///
/// Damping values are the fraction of momentum lost per second, so the
/// retained fraction is `(1 - d)^dt`.
pub fn apply_damping(body: &mut RigidBody, linear_damping: f64, angular_damping: f64, dt: f64) {
    body.linear_momentum *= sim_types::decay(linear_damping, dt);
    body.angular_momentum *= sim_types::decay(angular_damping, dt);
}
