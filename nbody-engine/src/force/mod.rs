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
//! Force-evaluation strategies
//!
//! A [`ForceEvaluator`] answers one question per body per step: what is
//! the acceleration of `bodies[index]` given the current body set? Direct
//! summation answers it exactly in O(N) per body; the Barnes-Hut strategy
//! answers it approximately in O(log N) per body after an O(N log N) tree
//! build in [`ForceEvaluator::prepare`].
//!
//! Evaluators are `Send + Sync` so that a prepared evaluator can be shared
//! by every worker thread during the compute phase.

use serde::{Deserialize, Serialize};

use crate::body::{Body, GravityLaw};
use crate::math::Vector3;

mod barnes_hut;
mod direct;

pub use barnes_hut::BarnesHut;
pub use direct::DirectSummation;

/// Strategy that computes per-body accelerations for one time step
pub trait ForceEvaluator: Send + Sync {
    /// Descriptive name for logging
    fn name(&self) -> &str;

    /// Rebuild any per-step structure from the complete current body set
    ///
    /// Called once per step before any [`ForceEvaluator::acceleration`]
    /// query, with the same slice the queries will receive.
    fn prepare(&mut self, bodies: &[Body]);

    /// Acceleration on `bodies[index]` from all other bodies
    fn acceleration(&self, index: usize, bodies: &[Body]) -> Vector3;
}

/// Which force-evaluation strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForceMethod {
    /// Exact O(N²) pairwise summation
    Direct,
    /// Approximate O(N log N) octree evaluation
    #[default]
    BarnesHut,
}

impl ForceMethod {
    /// Build an evaluator for this method
    pub fn evaluator(self, law: GravityLaw, theta: f64) -> Box<dyn ForceEvaluator> {
        match self {
            ForceMethod::Direct => Box::new(DirectSummation::new(law)),
            ForceMethod::BarnesHut => Box::new(BarnesHut::new(law, theta)),
        }
    }
}
