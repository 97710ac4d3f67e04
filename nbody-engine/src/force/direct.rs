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
//! Exact pairwise summation

use crate::body::{Body, GravityLaw};
use crate::math::Vector3;
use super::ForceEvaluator;

/// Sums the pairwise law over every other body
///
/// Needs no preparation; every query walks the full body slice.
#[derive(Debug, Clone, Copy)]
pub struct DirectSummation {
    law: GravityLaw,
}

impl DirectSummation {
    /// Create a direct-summation evaluator
    pub fn new(law: GravityLaw) -> Self {
        DirectSummation { law }
    }

    /// The gravitational law in use
    pub fn law(&self) -> &GravityLaw {
        &self.law
    }
}

impl ForceEvaluator for DirectSummation {
    fn name(&self) -> &str {
        "direct"
    }

    fn prepare(&mut self, _bodies: &[Body]) {}

    fn acceleration(&self, index: usize, bodies: &[Body]) -> Vector3 {
        let target = &bodies[index];
        let mut total = Vector3::zero();
        for (j, source) in bodies.iter().enumerate() {
            // Skip self-interaction
            if j != index {
                total += self.law.acceleration(target, source);
            }
        }
        total
    }
}
