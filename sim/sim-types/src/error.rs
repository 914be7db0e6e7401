//! Error types for chain dynamics.
//!
//! Errors are only produced by setup paths (shape construction, chain
//! discovery, configuration validation). The per-substep solver never fails:
//! it guards numerically and keeps going so that a frame always yields a pose.

use thiserror::Error;

/// Errors that can occur while setting up a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Shape or body has (near) zero volume.
    #[error("degenerate shape: volume {volume} is too small")]
    DegenerateShape {
        /// The computed volume.
        volume: f64,
    },

    /// Inertia tensor could not be inverted.
    #[error("singular inertia tensor")]
    SingularInertia,

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// No path from the end bone up to the root bone.
    #[error("no bone chain from bone {end} up to bone {root}")]
    ChainNotFound {
        /// Configured root bone.
        root: usize,
        /// Configured end bone.
        end: usize,
    },

    /// Bone index does not exist in the skeleton.
    #[error("invalid bone index: {0}")]
    InvalidBone(usize),

    /// Angular or linear limit with `min > max`.
    #[error("invalid limit range on axis {axis}: min {min} > max {max}")]
    InvalidLimitRange {
        /// Axis index (0 = X, 1 = Y, 2 = Z).
        axis: usize,
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    ///
    /// Configuration errors are recoverable: callers fall back to a safe
    /// default and log instead of aborting.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::DegenerateShape { .. }
                | Self::ChainNotFound { .. }
                | Self::InvalidLimitRange { .. }
        )
    }
}
