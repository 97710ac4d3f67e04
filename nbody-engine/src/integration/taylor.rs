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
//! Second-order Taylor step
//!
//! # Algorithm
//!
//! With the acceleration held constant over the step:
//!
//! ```text
//! x(t + dt) = x(t) + v(t)*dt + 0.5*a(t)*dt²
//! v(t + dt) = v(t) + a(t)*dt
//! ```
//!
//! One force evaluation per step. Position is second-order accurate
//! locally, velocity first-order; good enough for the batch trajectories
//! this engine produces and cheap enough to leave the force evaluation as
//! the only hot spot.

use crate::body::Body;
use crate::math::Vector3;
use super::Integrator;

/// Constant-acceleration kinematic integrator
///
/// # Example
///
/// ```
/// use nbody_engine::body::Body;
/// use nbody_engine::integration::{Integrator, TaylorIntegrator};
/// use nbody_engine::math::Vector3;
///
/// let integrator = TaylorIntegrator::new(2.0);
/// let body = Body::new(1.0, Vector3::zero(), Vector3::new(1.0, 0.0, 0.0));
/// let next = integrator.advance(&body, Vector3::new(0.0, 1.0, 0.0));
/// assert_eq!(next.position, Vector3::new(2.0, 2.0, 0.0));
/// assert_eq!(next.velocity, Vector3::new(1.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaylorIntegrator {
    timestep: f64,
}

impl TaylorIntegrator {
    /// Create an integrator with the given timestep
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite
    pub fn new(timestep: f64) -> Self {
        assert!(
            timestep > 0.0 && timestep.is_finite(),
            "Timestep must be positive and finite"
        );
        TaylorIntegrator { timestep }
    }
}

impl Integrator for TaylorIntegrator {
    fn name(&self) -> &str {
        "Taylor"
    }

    fn timestep(&self) -> f64 {
        self.timestep
    }

    #[inline]
    fn advance(&self, body: &Body, acceleration: Vector3) -> Body {
        let dt = self.timestep;
        Body {
            mass: body.mass,
            position: body.position + body.velocity * dt + acceleration * (0.5 * dt * dt),
            velocity: body.velocity + acceleration * dt,
        }
    }
}
