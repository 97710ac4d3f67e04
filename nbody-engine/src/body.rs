// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Point-mass bodies and the pairwise gravitational law
//!
//! # Physics Background
//!
//! Every pair of bodies attracts along the line joining them with
//!
//! **a = -G * m * d / (|d|³ + ε)**
//!
//! where `d = target - source`, `m` is the source mass and ε is the
//! softening term. The softening keeps the law finite at zero separation,
//! which also makes a body's contribution to its own acceleration exactly
//! zero. Force is the acceleration scaled by the target's own mass and is
//! antisymmetric: `force(a, b) == -force(b, a)`.
//!
//! The law is evaluated the same way by direct summation, by the tree's
//! leaves, and by accepted tree aggregates, so every protocol agrees on
//! the numerics.

use crate::error::{Result, SimulationError};
use crate::math::Vector3;

/// Gravitational constant used by the reference runs (m³/(kg⋅s²))
pub const GRAVITATIONAL_CONSTANT: f64 = 6.673e-11;

/// Default softening added to the cubed separation
pub const DEFAULT_SOFTENING: f64 = 1e-8;

/// A point mass with position and velocity
///
/// Mass never changes during a run. Position and velocity are never
/// mutated while forces are being evaluated; each step produces a new
/// `Body` value in the next buffer instead.
///
/// # Examples
///
/// ```
/// use nbody_engine::body::Body;
/// use nbody_engine::math::Vector3;
///
/// let sun = Body::new(1.989e30, Vector3::zero(), Vector3::zero());
/// assert!(sun.validate(0).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Mass in kilograms
    pub mass: f64,
    /// Position in meters
    pub position: Vector3,
    /// Velocity in meters per second
    pub velocity: Vector3,
}

impl Body {
    /// Create a new body
    pub fn new(mass: f64, position: Vector3, velocity: Vector3) -> Self {
        Body { mass, position, velocity }
    }

    /// Create a body at rest
    pub fn at_rest(mass: f64, position: Vector3) -> Self {
        Body::new(mass, position, Vector3::zero())
    }

    /// Linear momentum `m * v`
    pub fn momentum(&self) -> Vector3 {
        self.velocity * self.mass
    }

    /// Check the body is usable as simulation input
    ///
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimulationError::InvalidBody {
                index,
                reason: format!("mass must be positive and finite, got {}", self.mass),
            });
        }
        if !self.position.is_finite() {
            return Err(SimulationError::InvalidBody {
                index,
                reason: "position is not finite".to_string(),
            });
        }
        if !self.velocity.is_finite() {
            return Err(SimulationError::InvalidBody {
                index,
                reason: "velocity is not finite".to_string(),
            });
        }
        Ok(())
    }
}

/// Validate every body of an initial state
pub fn validate_bodies(bodies: &[Body]) -> Result<()> {
    if bodies.is_empty() {
        return Err(SimulationError::EmptyBodySet);
    }
    bodies
        .iter()
        .enumerate()
        .try_for_each(|(index, body)| body.validate(index))
}

/// Softened Newtonian gravity
///
/// The softening constant is a tunable value rather than a fixed
/// property of the law; different workloads want different values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityLaw {
    g_constant: f64,
    softening: f64,
}

impl GravityLaw {
    /// Create a law with the given constant and softening
    ///
    /// # Panics
    ///
    /// Panics if `g_constant` is not finite or `softening` is negative or
    /// not finite.
    pub fn new(g_constant: f64, softening: f64) -> Self {
        assert!(g_constant.is_finite(), "Gravitational constant must be finite");
        assert!(
            softening >= 0.0 && softening.is_finite(),
            "Softening must be non-negative and finite"
        );
        GravityLaw { g_constant, softening }
    }

    /// Gravitational constant
    pub fn g_constant(&self) -> f64 {
        self.g_constant
    }

    /// Softening constant
    pub fn softening(&self) -> f64 {
        self.softening
    }

    /// Acceleration at `target` due to a point mass `mass` at `source`
    #[inline]
    pub fn acceleration_towards(&self, target: Vector3, source: Vector3, mass: f64) -> Vector3 {
        let d = target - source;
        let dist = d.norm();
        d * (-self.g_constant * mass / (dist * dist * dist + self.softening))
    }

    /// Acceleration of `target` caused by `source`
    #[inline]
    pub fn acceleration(&self, target: &Body, source: &Body) -> Vector3 {
        self.acceleration_towards(target.position, source.position, source.mass)
    }

    /// Force on `target` caused by `source`
    ///
    /// The mass product is formed before scaling so that swapping the
    /// arguments negates the result exactly.
    #[inline]
    pub fn force(&self, target: &Body, source: &Body) -> Vector3 {
        let d = target.position - source.position;
        let dist = d.norm();
        d * (-self.g_constant * (target.mass * source.mass) / (dist * dist * dist + self.softening))
    }
}

impl Default for GravityLaw {
    fn default() -> Self {
        GravityLaw::new(GRAVITATIONAL_CONSTANT, DEFAULT_SOFTENING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Body, Body) {
        (
            Body::at_rest(2.0e10, Vector3::new(-1.0, 0.5, 0.0)),
            Body::at_rest(3.0e10, Vector3::new(2.0, -1.0, 4.0)),
        )
    }

    #[test]
    fn test_acceleration_points_at_source() {
        let law = GravityLaw::default();
        let (a, b) = pair();
        let acc = law.acceleration(&a, &b);
        let towards = b.position - a.position;
        assert!(acc.dot(&towards) > 0.0);
    }

    #[test]
    fn test_force_antisymmetric() {
        let law = GravityLaw::default();
        let (a, b) = pair();
        assert_eq!(law.force(&a, &b), -law.force(&b, &a));
    }

    #[test]
    fn test_force_is_mass_times_acceleration() {
        let law = GravityLaw::default();
        let (a, b) = pair();
        let f = law.force(&a, &b);
        let expected = law.acceleration(&a, &b) * a.mass;
        assert!((f - expected).norm() <= 1e-12 * f.norm());
    }

    #[test]
    fn test_inverse_square() {
        let law = GravityLaw::new(1.0, 0.0);
        let near = law.acceleration_towards(Vector3::zero(), Vector3::new(1.0, 0.0, 0.0), 1.0);
        let far = law.acceleration_towards(Vector3::zero(), Vector3::new(2.0, 0.0, 0.0), 1.0);
        assert!((near.norm() / far.norm() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_self_contribution_is_zero() {
        let law = GravityLaw::default();
        let (a, _) = pair();
        assert_eq!(law.acceleration(&a, &a), Vector3::zero());
    }

    #[test]
    fn test_softening_bounds_close_encounters() {
        let law = GravityLaw::new(1.0, 1e-3);
        let acc = law.acceleration_towards(Vector3::zero(), Vector3::new(1e-9, 0.0, 0.0), 1.0);
        assert!(acc.is_finite());
        assert!(acc.norm() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "Softening must be non-negative and finite")]
    fn test_negative_softening_panics() {
        GravityLaw::new(1.0, -1.0);
    }

    #[test]
    fn test_validate_rejects_bad_bodies() {
        let zero_mass = Body::at_rest(0.0, Vector3::zero());
        assert!(matches!(
            zero_mass.validate(3),
            Err(SimulationError::InvalidBody { index: 3, .. })
        ));

        let nan_pos = Body::at_rest(1.0, Vector3::new(f64::NAN, 0.0, 0.0));
        assert!(nan_pos.validate(0).is_err());

        assert!(matches!(validate_bodies(&[]), Err(SimulationError::EmptyBodySet)));
    }
}
