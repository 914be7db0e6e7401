//! Core types for chain dynamics.
//!
//! This crate provides the foundational types shared by the solver layers:
//!
//! - [`BodyHandle`] / [`BodyRef`] - Arena addressing and the world anchor
//! - [`Pose`] - Position and orientation of bodies and bones
//! - [`Gravity`] / [`WindSample`] - Environmental inputs
//! - [`SolverConfig`] - Iteration counts and default damping
//! - [`SimError`] - Errors from setup paths
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no physics and no integration.
//! They're the common language between the body arena (sim-core), the
//! constraint solver (sim-constraint) and the chain scheduler (sim-chain).
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{BodyHandle, BodyRef, Pose};
//! use nalgebra::Point3;
//!
//! let anchor = BodyRef::from(BodyHandle::new(0));
//! assert!(!anchor.is_world());
//!
//! let pose = Pose::from_position(Point3::new(0.0, 0.0, 1.0));
//! assert_eq!(pose.position.z, 1.0);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod config;
mod dynamics;
mod error;

pub use body::{BodyHandle, BodyRef, Pose};
pub use config::{clamp_damping, decay, SolverConfig, DEFAULT_DAMPING};
pub use dynamics::{Gravity, WindSample};
pub use error::SimError;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
