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
//! Octree broadcast with all-gather
//!
//! Each step the root broadcasts the full state. Every rank builds the
//! complete octree from it (redundantly; no tree is ever shipped), advances
//! only its own contiguous slice through the shared step kernel, and the
//! slices are all-gathered back into the next full state. Rank `r`'s slice
//! lands at the same offsets it was taken from, so body order is kept.

use crate::body::Body;
use crate::error::Result;
use crate::executor::Executor;
use crate::force::{BarnesHut, ForceEvaluator};
use crate::simulation::{advance_body, PhaseTimings, SimulationConfig, TrajectorySink};
use super::{Communicator, LocalCluster, Partition};

/// Distributed Barnes-Hut with a redundant per-rank tree
///
/// Always uses the octree regardless of the configured force method.
#[derive(Debug, Clone)]
pub struct TreeExecutor {
    config: SimulationConfig,
}

impl TreeExecutor {
    /// Create a tree executor with `config.workers` ranks
    pub fn new(config: SimulationConfig) -> Self {
        TreeExecutor { config }
    }

    /// Body of one rank
    ///
    /// `initial` is only read on the root.
    pub fn run_rank<C: Communicator>(
        &self,
        comm: &mut C,
        mut sink: Option<&mut dyn TrajectorySink>,
        initial: &[Body],
        partition: &Partition,
    ) -> Result<Vec<Body>> {
        let integrator = self.config.integrator();
        let schedule = self.config.schedule();
        let mut evaluator = BarnesHut::new(self.config.law(), self.config.theta);
        let mut timings = PhaseTimings::default();
        let slice = partition.range(comm.rank());

        let mut current = if comm.is_root() { initial.to_vec() } else { Vec::new() };

        for iteration in 0..self.config.iterations {
            timings.time_communication(|| comm.broadcast_bodies(&mut current))?;
            timings.time_build(|| evaluator.prepare(&current));

            let local: Vec<Body> = timings.time_compute(|| {
                slice
                    .clone()
                    .map(|index| advance_body(index, &current, &evaluator, &integrator))
                    .collect()
            });

            let next = timings.time_communication(|| comm.all_gather_bodies(&local))?;
            if let (Some(frame), Some(sink)) = (schedule.frame_at(iteration), sink.as_deref_mut()) {
                tracing::debug!(iteration, frame, "sampling frame");
                sink.append_frame(frame, &next);
            }
            current = next;

            timings.time_communication(|| comm.barrier())?;
        }

        if comm.is_root() {
            tracing::debug!(nodes = evaluator.tree().node_count(), "final tree size");
            timings.log(self.name());
            Ok(current)
        } else {
            Ok(Vec::new())
        }
    }
}

impl Executor for TreeExecutor {
    fn name(&self) -> &str {
        "tree"
    }

    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>> {
        let ranks = self.config.workers;
        let partition = Partition::contiguous(bodies.len(), ranks);
        partition.warn_if_uneven("bodies");

        LocalCluster::new(ranks)?.run(sink, |comm, sink| self.run_rank(comm, sink, &bodies, &partition))
    }
}
