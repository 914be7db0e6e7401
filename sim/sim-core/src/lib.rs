//! Rigid bodies and numerical integration for chain dynamics.
//!
//! This crate provides the body representation the constraint solver works
//! on. It builds on [`sim_types`] for handles, poses and errors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         BodySet                             │
//! │  Arena of bodies addressed by BodyHandle                    │
//! │  Resolves BodyRef::WorldFixed to an immovable anchor        │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RigidBody                            │
//! │  Pose, momenta, inverse tensors, per-body overrides         │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!             ┌─────────────┴─────────────┐
//!             ▼                           ▼
//! ┌───────────────────────┐   ┌───────────────────────────────┐
//! │        Shape          │   │         Integrators           │
//! │  Volume, CoM, inertia │   │  Euler position, RK4 rotation │
//! └───────────────────────┘   └───────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use sim_core::{BodySet, RigidBody};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = BodySet::new();
//! let body = RigidBody::from_box(Vector3::new(1.0, 1.0, 4.0), Point3::new(0.0, 0.0, 2.0))
//!     .unwrap();
//! let handle = bodies.insert(body);
//!
//! let body = bodies.get(handle).unwrap();
//! assert!((body.mass - 1.0).abs() < 1e-12);
//! assert!(body.spin().norm() < 1e-12);
//! ```
//!
//! # Mass Properties
//!
//! Shapes are closed triangle meshes. Volume, center of mass and the inertia
//! tensor come from a tetrahedron decomposition and assume unit density;
//! bodies start with unit mass and can be rescaled with
//! [`RigidBody::scale_mass`].

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::cast_possible_truncation,  // u32 triangle indices
)]

mod body;
pub mod integrators;
pub mod shape;

pub use body::{BodySet, BodyWind, RigidBody};
pub use shape::{compute_center_of_mass, compute_inertia_tensor, compute_volume, Shape, Triangle};

// Re-export key types from sim-types for convenience
pub use sim_types::{BodyHandle, BodyRef, Pose, SimError};
