//! Substep planning.
//!
//! In fixed mode a frame runs one substep of the frame delta, capped at the
//! maximum step. In adaptive mode every substep has the same size and any
//! leftover time is carried into the next frame as debt, so simulated time
//! tracks real time without ever running more than `max_substeps` a frame.

use crate::config::SubstepConfig;

/// Substeps to run this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubstepPlan {
    /// Number of substeps.
    pub count: usize,
    /// Length of each substep in seconds.
    pub step: f64,
}

impl SubstepPlan {
    /// Total simulated time.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> f64 {
        self.count as f64 * self.step
    }

    /// Check if nothing runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Carries unsimulated time between frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubstepScheduler {
    debt: f64,
}

impl SubstepScheduler {
    /// Create a scheduler with no debt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time carried into the next frame.
    #[must_use]
    pub fn debt(&self) -> f64 {
        self.debt
    }

    /// Drop any carried time.
    pub fn reset(&mut self) {
        self.debt = 0.0;
    }

    /// Plan the substeps for a frame of `frame_delta` seconds.
    ///
    /// Non-positive or non-finite deltas plan nothing and leave the debt
    /// alone.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn plan(&mut self, frame_delta: f64, config: &SubstepConfig) -> SubstepPlan {
        let max_step = config.max_physics_delta_time;
        if !frame_delta.is_finite() || frame_delta <= 0.0 || max_step.is_nan() || max_step <= 0.0
        {
            return SubstepPlan::default();
        }

        if !config.adaptive {
            return SubstepPlan {
                count: 1,
                step: frame_delta.min(max_step),
            };
        }

        let available = frame_delta + self.debt;
        // Truncation: the count is clamped to `max_substeps` right after.
        let count = ((available / max_step).floor() as usize).min(config.max_substeps);
        let max_debt = (config.max_debt_frames * config.max_substeps) as f64 * max_step;

        self.debt = (available - count as f64 * max_step).max(0.0).min(max_debt);
        SubstepPlan {
            count,
            step: max_step,
        }
    }
}
