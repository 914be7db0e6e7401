//! Environmental inputs: gravity and wind.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gravity configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration due to gravity, in simulation space.
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity (9.81 m/s² in -Z direction).
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Zero gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub fn custom(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }

    /// Gravity of magnitude `|gravity_z|` along `direction`.
    ///
    /// Worlds usually report gravity as a signed Z value; the simulation space
    /// may be rotated relative to the world, so the direction is supplied
    /// separately. A zero direction yields zero gravity.
    #[must_use]
    pub fn from_direction(direction: Vector3<f64>, gravity_z: f64) -> Self {
        let dir = direction
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros);
        Self {
            acceleration: dir * gravity_z.abs(),
        }
    }

    /// Compute the gravitational force on a mass.
    #[must_use]
    pub fn force_on_mass(&self, mass: f64) -> Vector3<f64> {
        self.acceleration * mass
    }
}

/// Wind sampled at a point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindSample {
    /// Unit direction the wind blows toward.
    pub direction: Vector3<f64>,
    /// Wind speed.
    pub speed: f64,
}

impl WindSample {
    /// Create a wind sample. The direction is normalized; a zero direction
    /// produces a calm sample.
    #[must_use]
    pub fn new(direction: Vector3<f64>, speed: f64) -> Self {
        direction
            .try_normalize(1e-12)
            .map_or_else(Self::calm, |direction| Self { direction, speed })
    }

    /// No wind.
    #[must_use]
    pub fn calm() -> Self {
        Self::default()
    }

    /// Wind velocity vector.
    #[must_use]
    pub fn velocity(&self) -> Vector3<f64> {
        self.direction * self.speed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gravity_force() {
        let gravity = Gravity::earth();
        let force = gravity.force_on_mass(2.0);
        assert_relative_eq!(force.z, -19.62, epsilon = 1e-10);
    }

    #[test]
    fn test_gravity_from_direction_uses_magnitude() {
        let gravity = Gravity::from_direction(Vector3::new(0.0, 0.0, -2.0), -980.0);
        assert_relative_eq!(gravity.acceleration, Vector3::new(0.0, 0.0, -980.0));

        let sideways = Gravity::from_direction(Vector3::x(), 980.0);
        assert_relative_eq!(sideways.acceleration.x, 980.0);

        let none = Gravity::from_direction(Vector3::zeros(), -980.0);
        assert_relative_eq!(none.acceleration.norm(), 0.0);
    }

    #[test]
    fn test_wind_sample() {
        let wind = WindSample::new(Vector3::new(3.0, 0.0, 4.0), 10.0);
        assert_relative_eq!(wind.direction.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(wind.velocity(), Vector3::new(6.0, 0.0, 8.0), epsilon = 1e-12);

        let calm = WindSample::new(Vector3::zeros(), 10.0);
        assert_relative_eq!(calm.velocity().norm(), 0.0);
    }
}
