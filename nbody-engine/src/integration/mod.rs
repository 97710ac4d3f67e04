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
//! Time integration and conserved-quantity helpers
//!
//! An [`Integrator`] turns a body and its acceleration into the body's
//! state one step later. It never mutates its input: the caller writes the
//! returned value into the next buffer, so force evaluation always reads a
//! consistent snapshot.
//!
//! # Timestep Guidelines
//!
//! The reference workloads use astronomical units (kg, m, s) with
//! timesteps of 10⁵ s. What matters is the ratio of `dt` to the shortest
//! orbital period in the system, not the absolute value.
//! - Too small: Numerical precision issues and wasted computation
//! - Too large: Instability and bodies flung out of close encounters

use crate::body::Body;
use crate::error::{Result, SimulationError};
use crate::math::Vector3;

mod taylor;

pub use taylor::TaylorIntegrator;

/// Total kinetic energy `Σ ½ m v²`
pub fn total_kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .map(|b| 0.5 * b.mass * b.velocity.norm_squared())
        .sum()
}

/// Total linear momentum `Σ m v`
pub fn total_momentum(bodies: &[Body]) -> Vector3 {
    bodies.iter().map(Body::momentum).sum()
}

/// Mass-weighted mean position
///
/// Returns the zero vector for an empty or massless set.
pub fn center_of_mass(bodies: &[Body]) -> Vector3 {
    let mass: f64 = bodies.iter().map(|b| b.mass).sum();
    if mass > 0.0 {
        bodies.iter().map(|b| b.position * b.mass).sum::<Vector3>() / mass
    } else {
        Vector3::zero()
    }
}

/// Fixed-step integration method
pub trait Integrator: Send + Sync {
    /// Get the name of this integrator
    fn name(&self) -> &str;

    /// Get the timestep used by this integrator
    fn timestep(&self) -> f64;

    /// Validate the timestep
    ///
    /// Non-positive or non-finite timesteps are errors. Extremely small
    /// ones are accepted with a warning since they lose precision in f64.
    fn validate_timestep(&self) -> Result<()> {
        let dt = self.timestep();

        if dt <= 0.0 || !dt.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "timestep must be positive and finite, got {}",
                dt
            )));
        }

        if dt < 1e-9 {
            tracing::warn!(dt, "timestep is extremely small and may lose precision");
        }

        Ok(())
    }

    /// State of `body` one timestep later under constant `acceleration`
    fn advance(&self, body: &Body, acceleration: Vector3) -> Body;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_momentum_and_energy() {
        let bodies = [
            Body::new(2.0, Vector3::zero(), Vector3::new(1.0, 0.0, 0.0)),
            Body::new(1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::new(-2.0, 0.0, 0.0)),
        ];
        assert_eq!(total_momentum(&bodies), Vector3::zero());
        assert_eq!(total_kinetic_energy(&bodies), 1.0 + 2.0);
    }

    #[test]
    fn test_center_of_mass() {
        let bodies = [
            Body::at_rest(3.0, Vector3::new(0.0, 0.0, 0.0)),
            Body::at_rest(1.0, Vector3::new(4.0, 0.0, 0.0)),
        ];
        assert_eq!(center_of_mass(&bodies), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(center_of_mass(&[]), Vector3::zero());
    }

    #[test]
    fn test_validate_timestep() {
        assert!(TaylorIntegrator::new(0.01).validate_timestep().is_ok());
        assert!(TaylorIntegrator::new(1e5).validate_timestep().is_ok());
        assert!(TaylorIntegrator::new(1e-12).validate_timestep().is_ok());
    }
}
