//! Joint library: factories that turn the current body poses into limits.
//!
//! Every function here is a pure factory. It reads poses from the arena and
//! appends zero or more primitives to an output container; it never touches
//! momenta. Containers are rebuilt every substep, so targets are computed from
//! the positional error at the moment of the call.
//!
//! # Bounds
//!
//! Separations are measured from the first anchor to the second. A lower
//! bound becomes a limit with force range `[0, +∞)`, an upper bound one with
//! `(−∞, 0]`, and a locked axis a bilateral limit. Bounds that are already
//! satisfied still produce a limit whose target lets the bodies approach the
//! bound but not cross it within the substep.

use std::f64::consts::TAU;

use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use sim_core::BodySet;
use sim_types::{BodyHandle, BodyRef, Pose};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::limits::{Anchor, AngularLimit, LinearLimit};

/// Directions shorter than this are not normalized.
const DIRECTION_EPSILON: f64 = 1e-8;

/// A unit vector perpendicular to `v`.
pub(crate) fn perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    v.cross(&Vector3::x())
        .try_normalize(DIRECTION_EPSILON)
        .or_else(|| v.cross(&Vector3::y()).try_normalize(DIRECTION_EPSILON))
        .unwrap_or_else(Vector3::z)
}

/// Axis used as the twist axis of a swing/twist decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TwistAxis {
    /// Local X.
    #[default]
    X,
    /// Local Y.
    Y,
    /// Local Z.
    Z,
}

impl TwistAxis {
    /// Component index of the axis.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Unit vector along the axis.
    #[must_use]
    pub fn unit(self) -> Vector3<f64> {
        Vector3::ith(self.index(), 1.0)
    }

    /// Component indices of the two swing axes.
    #[must_use]
    pub const fn swing_axes(self) -> [usize; 2] {
        match self {
            Self::X => [1, 2],
            Self::Y => [2, 0],
            Self::Z => [0, 1],
        }
    }
}

/// A body together with a joint frame fixed to it.
///
/// For [`BodyRef::WorldFixed`] the frame is expressed in simulation space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointFrame {
    /// The body, or the world.
    pub body: BodyRef,
    /// Joint frame relative to the body.
    pub frame: UnitQuaternion<f64>,
}

impl JointFrame {
    /// Joint frame on a dynamic body.
    #[must_use]
    pub fn body(handle: BodyHandle, frame: UnitQuaternion<f64>) -> Self {
        Self {
            body: BodyRef::Dynamic(handle),
            frame,
        }
    }

    /// Joint frame fixed in simulation space.
    #[must_use]
    pub fn world(frame: UnitQuaternion<f64>) -> Self {
        Self {
            body: BodyRef::WorldFixed,
            frame,
        }
    }

    /// Current orientation of the frame in simulation space.
    #[must_use]
    pub fn world_rotation(&self, bodies: &BodySet) -> UnitQuaternion<f64> {
        bodies.pose(self.body).rotation * self.frame
    }
}

/// Per-axis translation range for a prismatic joint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearRange {
    /// Lower bound per axis.
    pub min: Vector3<f64>,
    /// Upper bound per axis.
    pub max: Vector3<f64>,
}

impl LinearRange {
    /// Create a range.
    #[must_use]
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// All axes locked at zero.
    #[must_use]
    pub fn locked() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Check if every axis is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.min == self.max
    }
}

/// Swing/twist angular range, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AngularRange {
    /// Twist axis of the joint frames.
    pub twist_axis: TwistAxis,
    /// Lower angle per axis.
    pub min: Vector3<f64>,
    /// Upper angle per axis.
    pub max: Vector3<f64>,
    /// Softness of locked axes and of twist recentering, in `[0, 1]`.
    pub bias: f64,
}

/// Cone limit: the angle between the two frames' `axis` stays below `angle`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConeLimit {
    /// Axis in both joint frames.
    pub axis: Vector3<f64>,
    /// Cone half angle in radians; zero makes a hinge.
    pub angle: f64,
    /// Softness of the hinge correction, in `[0, 1]`.
    pub bias: f64,
}

fn lower_bound(first: Anchor, second: Anchor, axis: Vector3<f64>, target: f64) -> LinearLimit {
    LinearLimit::new(first, second, axis, target)
        .with_force_range(0.0, f64::INFINITY)
        .with_unbiased_target(target.min(0.0))
}

fn upper_bound(first: Anchor, second: Anchor, axis: Vector3<f64>, target: f64) -> LinearLimit {
    LinearLimit::new(first, second, axis, target)
        .with_force_range(f64::NEG_INFINITY, 0.0)
        .with_unbiased_target(target.max(0.0))
}

/// Limit the separation of two anchors along `axis` to `[min, max]`.
///
/// `min == max` locks the axis with one bilateral limit; otherwise each finite
/// bound gets its own one-sided limit.
#[allow(clippy::float_cmp)]
pub fn constrain_along_direction(
    dt: f64,
    bodies: &BodySet,
    first: Anchor,
    second: Anchor,
    axis: Vector3<f64>,
    [min, max]: [f64; 2],
    out: &mut Vec<LinearLimit>,
) {
    if dt <= 0.0 {
        return;
    }
    let Some(axis) = axis.try_normalize(DIRECTION_EPSILON) else {
        return;
    };

    let separation =
        (second.world_position(bodies) - first.world_position(bodies)).dot(&axis);

    if min == max {
        out.push(LinearLimit::new(first, second, axis, (min - separation) / dt));
        return;
    }
    if min.is_finite() {
        out.push(lower_bound(first, second, axis, (min - separation) / dt));
    }
    if max.is_finite() {
        out.push(upper_bound(first, second, axis, (max - separation) / dt));
    }
}

/// Pin two anchors together along all three world axes.
pub fn constrain_position_nailed(
    dt: f64,
    bodies: &BodySet,
    first: Anchor,
    second: Anchor,
    out: &mut Vec<LinearLimit>,
) {
    for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
        constrain_along_direction(dt, bodies, first, second, axis, [0.0, 0.0], out);
    }
}

/// Keep the offset between two anchors inside a box aligned with the prism
/// frame `first rotation · prism_rotation`.
///
/// Locked axes always get a bilateral limit; other axes only get a limit while
/// they are out of range, driving back to the violated bound.
#[allow(clippy::float_cmp)]
pub fn constrain_position_prismatic(
    dt: f64,
    bodies: &BodySet,
    first: Anchor,
    second: Anchor,
    prism_rotation: UnitQuaternion<f64>,
    range: &LinearRange,
    out: &mut Vec<LinearLimit>,
) {
    if dt <= 0.0 {
        return;
    }

    let frame = bodies.pose(first.body).rotation * prism_rotation;
    let offset = second.world_position(bodies) - first.world_position(bodies);

    for i in 0..3 {
        let axis = frame * Vector3::ith(i, 1.0);
        let separation = offset.dot(&axis);
        let (min, max) = (range.min[i], range.max[i]);

        if min == max {
            out.push(LinearLimit::new(first, second, axis, (min - separation) / dt));
        } else if separation < min {
            out.push(lower_bound(first, second, axis, (min - separation) / dt));
        } else if separation > max {
            out.push(upper_bound(first, second, axis, (max - separation) / dt));
        }
    }
}

/// Split `rotation` into a swing followed by a twist about `twist_axis`, such
/// that `rotation = swing * twist`.
///
/// The twist is the identity when the rotation is a half turn about an axis
/// perpendicular to `twist_axis`.
#[must_use]
pub fn swing_twist(
    rotation: &UnitQuaternion<f64>,
    twist_axis: &Vector3<f64>,
) -> (UnitQuaternion<f64>, UnitQuaternion<f64>) {
    let q = rotation.quaternion();
    let projection = twist_axis * q.imag().dot(twist_axis);
    let twist = UnitQuaternion::try_new(Quaternion::from_parts(q.w, projection), 1e-12)
        .unwrap_or_else(UnitQuaternion::identity);
    let swing = rotation * twist.inverse();
    (swing, twist)
}

/// Signed twist angle about `twist_axis` of a twist quaternion.
fn twist_angle(twist: &UnitQuaternion<f64>, twist_axis: &Vector3<f64>) -> f64 {
    2.0 * twist.imag().dot(twist_axis).atan2(twist.w)
}

/// Limit the relative rotation of two joint frames with a swing/twist range.
///
/// Swing axes whose bounds are equal are driven to that angle, scaled by
/// `bias`. Swing ranges narrower than a full turn get two hard one-sided
/// limits. The twist axis always gets a single limit recentering it, scaled by
/// `bias`: toward the locked angle, or toward zero clamped into the range.
#[allow(clippy::float_cmp)]
pub fn constrain_angular_range(
    dt: f64,
    bodies: &BodySet,
    first: JointFrame,
    second: JointFrame,
    range: &AngularRange,
    out: &mut Vec<AngularLimit>,
) {
    if dt <= 0.0 {
        return;
    }

    let frame0 = first.world_rotation(bodies);
    let frame1 = second.world_rotation(bodies);

    let mut relative = frame0.inverse() * frame1;
    if relative.w < 0.0 {
        relative = UnitQuaternion::new_unchecked(-relative.into_inner());
    }

    let twist_local = range.twist_axis.unit();
    let (swing, twist) = swing_twist(&relative, &twist_local);
    let swing_angles = swing.scaled_axis();

    for a in range.twist_axis.swing_axes() {
        let angle = swing_angles[a];
        let axis = frame0 * Vector3::ith(a, 1.0);
        let (min, max) = (range.min[a], range.max[a]);

        if min == max {
            out.push(AngularLimit::new(
                first.body,
                second.body,
                axis,
                range.bias * (min - angle) / dt,
            ));
        } else if max - min < TAU {
            out.push(
                AngularLimit::new(first.body, second.body, axis, (min - angle) / dt)
                    .with_torque_range(0.0, f64::INFINITY),
            );
            out.push(
                AngularLimit::new(first.body, second.body, axis, (max - angle) / dt)
                    .with_torque_range(f64::NEG_INFINITY, 0.0),
            );
        }
    }

    let t = range.twist_axis.index();
    let (min, max) = (range.min[t], range.max[t]);
    let goal = if min == max { min } else { 0.0_f64.max(min).min(max) };
    let angle = twist_angle(&twist, &twist_local);
    out.push(AngularLimit::new(
        first.body,
        second.body,
        frame1 * twist_local,
        range.bias * (goal - angle) / dt,
    ));
}

/// Keep the angle between the two frames' cone axes within the cone.
///
/// A positive cone angle produces a one-sided limit about the axis of
/// misalignment. A zero angle makes a hinge that pulls the axes together,
/// scaled by `bias`.
pub fn constrain_cone_angle(
    dt: f64,
    bodies: &BodySet,
    first: JointFrame,
    second: JointFrame,
    cone: &ConeLimit,
    out: &mut Vec<AngularLimit>,
) {
    if dt <= 0.0 {
        return;
    }
    let Some(axis) = cone.axis.try_normalize(DIRECTION_EPSILON) else {
        return;
    };

    let n0 = first.world_rotation(bodies) * axis;
    let n1 = second.world_rotation(bodies) * axis;
    let angle = n0.dot(&n1).clamp(-1.0, 1.0).acos();
    // Opposite axes have no unique rotation axis; any perpendicular one works.
    let rotation_axis = match n0.cross(&n1).try_normalize(DIRECTION_EPSILON) {
        Some(axis) => axis,
        None if n0.dot(&n1) < 0.0 => perpendicular(&n0),
        None => return,
    };

    if cone.angle > 0.0 {
        out.push(
            AngularLimit::new(first.body, second.body, rotation_axis, (cone.angle - angle) / dt)
                .with_torque_range(f64::NEG_INFINITY, 0.0),
        );
    } else {
        out.push(AngularLimit::new(
            first.body,
            second.body,
            rotation_axis,
            -cone.bias * angle / dt,
        ));
    }
}

/// Keep a body at least its collision radius above a plane.
///
/// The plane passes through `plane.position` with normal `plane.rotation · Z`.
pub fn constrain_planar(
    dt: f64,
    bodies: &BodySet,
    body: BodyHandle,
    plane: &Pose,
    out: &mut Vec<LinearLimit>,
) {
    let Some(rb) = bodies.get(body) else {
        return;
    };
    if dt <= 0.0 {
        return;
    }

    let normal = plane.rotation * Vector3::z();
    let height = (rb.pose.position - plane.position).dot(&normal);
    out.push(lower_bound(
        Anchor::world(plane.position),
        Anchor::center_of(body),
        normal,
        (rb.collision_radius - height) / dt,
    ));
}

/// Distance from `center` to a body, with the unit direction, if the body is
/// not at the center.
fn radial(
    bodies: &BodySet,
    body: BodyHandle,
    center: &Point3<f64>,
) -> Option<(f64, Vector3<f64>, f64)> {
    let rb = bodies.get(body)?;
    let delta = rb.pose.position - center;
    let distance = delta.norm();
    if distance < DIRECTION_EPSILON {
        return None;
    }
    Some((distance, delta / distance, rb.collision_radius))
}

/// Keep a body, including its collision radius, inside a sphere.
pub fn constrain_spherical_inner(
    dt: f64,
    bodies: &BodySet,
    body: BodyHandle,
    center: Point3<f64>,
    radius: f64,
    out: &mut Vec<LinearLimit>,
) {
    if dt <= 0.0 {
        return;
    }
    if let Some((distance, normal, body_radius)) = radial(bodies, body, &center) {
        out.push(upper_bound(
            Anchor::world(center),
            Anchor::center_of(body),
            normal,
            (radius - body_radius - distance) / dt,
        ));
    }
}

/// Keep a body, including its collision radius, outside a sphere.
pub fn constrain_spherical_outer(
    dt: f64,
    bodies: &BodySet,
    body: BodyHandle,
    center: Point3<f64>,
    radius: f64,
    out: &mut Vec<LinearLimit>,
) {
    if dt <= 0.0 {
        return;
    }
    if let Some((distance, normal, body_radius)) = radial(bodies, body, &center) {
        out.push(lower_bound(
            Anchor::world(center),
            Anchor::center_of(body),
            normal,
            (radius + body_radius - distance) / dt,
        ));
    }
}
