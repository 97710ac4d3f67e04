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
//! Barnes-Hut approximate evaluation

use crate::body::{Body, GravityLaw};
use crate::math::Vector3;
use crate::tree::Octree;
use super::ForceEvaluator;

/// Evaluates accelerations against an octree rebuilt every step
///
/// `theta` is the opening angle: larger values accept coarser aggregates
/// and traverse less of the tree.
#[derive(Debug, Clone)]
pub struct BarnesHut {
    law: GravityLaw,
    theta: f64,
    tree: Octree,
}

impl BarnesHut {
    /// Create a Barnes-Hut evaluator
    ///
    /// # Panics
    ///
    /// Panics if `theta` is negative or NaN.
    pub fn new(law: GravityLaw, theta: f64) -> Self {
        assert!(theta >= 0.0, "Opening angle must be non-negative");
        BarnesHut {
            law,
            theta,
            tree: Octree::new(),
        }
    }

    /// Opening angle
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Tree built by the last [`ForceEvaluator::prepare`]
    pub fn tree(&self) -> &Octree {
        &self.tree
    }
}

impl ForceEvaluator for BarnesHut {
    fn name(&self) -> &str {
        "barnes-hut"
    }

    fn prepare(&mut self, bodies: &[Body]) {
        self.tree.build(bodies);
    }

    fn acceleration(&self, index: usize, bodies: &[Body]) -> Vector3 {
        self.tree.acceleration(index, bodies, self.theta, &self.law)
    }
}
