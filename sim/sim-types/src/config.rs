//! Configuration types for the constraint solver.
//!
//! The solver runs a fixed number of biased iterations before integration and
//! a fixed number of unbiased iterations after it. Damping is expressed as the
//! fraction of momentum lost per second and is applied as `(1 - d)^dt`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default fraction of momentum lost per second.
pub const DEFAULT_DAMPING: f64 = 0.7;

/// Configuration for the physics solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Biased limit iterations before integration.
    pub pre_iterations: usize,
    /// Unbiased limit iterations after integration.
    pub post_iterations: usize,
    /// Default fraction of linear momentum lost per second, in `[0, 1]`.
    pub linear_damping: f64,
    /// Default fraction of angular momentum lost per second, in `[0, 1]`.
    pub angular_damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pre_iterations: 4,
            post_iterations: 1,
            linear_damping: DEFAULT_DAMPING,
            angular_damping: DEFAULT_DAMPING,
        }
    }
}

impl SolverConfig {
    /// Create a high-accuracy solver configuration.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            pre_iterations: 16,
            post_iterations: 4,
            ..Default::default()
        }
    }

    /// Create a fast solver configuration.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            pre_iterations: 2,
            post_iterations: 1,
            ..Default::default()
        }
    }

    /// Set the number of solver iterations.
    #[must_use]
    pub fn iterations(mut self, pre: usize, post: usize) -> Self {
        self.pre_iterations = pre;
        self.post_iterations = post;
        self
    }

    /// Set default damping. Values are clamped to `[0, 1]`; non-finite
    /// values fall back to [`DEFAULT_DAMPING`].
    #[must_use]
    pub fn damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = clamp_damping(linear, DEFAULT_DAMPING);
        self.angular_damping = clamp_damping(angular, DEFAULT_DAMPING);
        self
    }

    /// Damping factor applied to linear momentum over `dt` seconds.
    #[must_use]
    pub fn linear_decay(&self, dt: f64) -> f64 {
        decay(self.linear_damping, dt)
    }

    /// Damping factor applied to angular momentum over `dt` seconds.
    #[must_use]
    pub fn angular_decay(&self, dt: f64) -> f64 {
        decay(self.angular_damping, dt)
    }

    /// Validate the solver configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.linear_damping) {
            return Err(crate::SimError::invalid_config(
                "linear_damping must be between 0 and 1",
            ));
        }

        if !(0.0..=1.0).contains(&self.angular_damping) {
            return Err(crate::SimError::invalid_config(
                "angular_damping must be between 0 and 1",
            ));
        }

        Ok(())
    }
}

/// Clamp a damping fraction into `[0, 1]`, replacing non-finite values with
/// `fallback`.
#[must_use]
pub fn clamp_damping(damping: f64, fallback: f64) -> f64 {
    if damping.is_finite() {
        damping.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Per-interval momentum retention for a per-second loss fraction.
///
/// Non-finite damping is treated as no damping.
#[must_use]
pub fn decay(damping: f64, dt: f64) -> f64 {
    (1.0 - clamp_damping(damping, 0.0)).powf(dt)
}
