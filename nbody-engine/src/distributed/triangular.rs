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
//! Triangular pair decomposition
//!
//! The N(N-1)/2 unordered body pairs are numbered through the lower
//! triangle (see [`decode_pair`](super::decode_pair)) and split into
//! contiguous ranges, one per rank. Each rank evaluates the force of every
//! pair in its range once, adding it to the first body and subtracting it
//! from the second. Summing the per-rank force arrays with an all-reduce
//! gives every rank the full net force; dividing by mass gives the
//! acceleration. Every rank then advances all bodies redundantly, so the
//! replicated state stays identical everywhere.

use crate::body::Body;
use crate::error::Result;
use crate::executor::Executor;
use crate::integration::Integrator;
use crate::math::Vector3;
use crate::simulation::{PhaseTimings, SimulationConfig, TrajectorySink};
use super::{pair_count, pairs, Communicator, LocalCluster, Partition};

/// Distributed direct summation exploiting Newton's third law
#[derive(Debug, Clone)]
pub struct TriangularExecutor {
    config: SimulationConfig,
}

impl TriangularExecutor {
    /// Create a triangular executor with `config.workers` ranks
    pub fn new(config: SimulationConfig) -> Self {
        TriangularExecutor { config }
    }

    /// Body of one rank
    ///
    /// `initial` is only read on the root.
    pub fn run_rank<C: Communicator>(
        &self,
        comm: &mut C,
        mut sink: Option<&mut dyn TrajectorySink>,
        initial: &[Body],
        pair_partition: &Partition,
    ) -> Result<Vec<Body>> {
        let law = self.config.law();
        let integrator = self.config.integrator();
        let schedule = self.config.schedule();
        let mut timings = PhaseTimings::default();

        let mut current = if comm.is_root() { initial.to_vec() } else { Vec::new() };
        timings.time_communication(|| comm.broadcast_bodies(&mut current))?;

        let n = current.len();
        let my_pairs = pair_partition.range(comm.rank());
        let mut forces = vec![Vector3::zero(); n];
        let mut next = current.clone();

        for iteration in 0..self.config.iterations {
            timings.time_compute(|| {
                forces.fill(Vector3::zero());
                for (a, b) in pairs(my_pairs.clone()) {
                    let force = law.force(&current[a], &current[b]);
                    forces[a] += force;
                    forces[b] -= force;
                }
            });

            timings.time_communication(|| comm.all_reduce_sum(&mut forces))?;

            timings.time_compute(|| {
                for ((slot, body), force) in next.iter_mut().zip(&current).zip(&forces) {
                    *slot = integrator.advance(body, *force / body.mass);
                }
            });

            if let (Some(frame), Some(sink)) = (schedule.frame_at(iteration), sink.as_deref_mut()) {
                tracing::debug!(iteration, frame, "sampling frame");
                sink.append_frame(frame, &next);
            }

            std::mem::swap(&mut current, &mut next);
            timings.time_communication(|| comm.barrier())?;
        }

        if comm.is_root() {
            timings.log(self.name());
            Ok(current)
        } else {
            Ok(Vec::new())
        }
    }
}

impl Executor for TriangularExecutor {
    fn name(&self) -> &str {
        "triangular"
    }

    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>> {
        let ranks = self.config.workers;
        let pair_partition = Partition::contiguous(pair_count(bodies.len()), ranks);
        pair_partition.warn_if_uneven("body pairs");

        LocalCluster::new(ranks)?.run(sink, |comm, sink| {
            self.run_rank(comm, sink, &bodies, &pair_partition)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SerialExecutor;
    use crate::force::ForceMethod;
    use crate::integration::total_momentum;
    use crate::simulation::{NullSink, TrajectoryLog};

    fn bodies() -> Vec<Body> {
        (0..9)
            .map(|i| {
                let t = i as f64;
                Body::new(
                    5e19 * (1.0 + t * 0.3),
                    Vector3::new(t * 3e6, (t * 1.3).sin() * 4e6, (t * 0.4).cos() * 2e6),
                    Vector3::new(0.0, t, -t),
                )
            })
            .collect()
    }

    #[test]
    fn test_matches_serial_direct() {
        let config = SimulationConfig::configure(0.0, 50.0, 12, 4)
            .unwrap()
            .with_method(ForceMethod::Direct)
            .with_workers(4);
        let serial = SerialExecutor::new(config.clone()).execute(bodies(), &mut NullSink).unwrap();
        let mut log = TrajectoryLog::new(9, 4);
        let triangular = TriangularExecutor::new(config).execute(bodies(), &mut log).unwrap();

        for (a, b) in triangular.iter().zip(&serial) {
            assert!((a.position - b.position).norm() <= 1e-9 * b.position.norm().max(1.0));
            assert!((a.velocity - b.velocity).norm() <= 1e-9 * b.velocity.norm().max(1.0));
        }
        assert_eq!(log.recorded_frames(), 4);
    }

    #[test]
    fn test_momentum_is_conserved() {
        let config = SimulationConfig::configure(0.0, 50.0, 20, 0).unwrap().with_workers(3);
        let initial = bodies();
        let before = total_momentum(&initial);
        let after = total_momentum(&TriangularExecutor::new(config).execute(initial, &mut NullSink).unwrap());
        let scale: f64 = bodies().iter().map(|b| b.momentum().norm()).sum();
        assert!((after - before).norm() <= 1e-12 * scale);
    }

    #[test]
    fn test_more_ranks_than_pairs() {
        let config = SimulationConfig::configure(0.0, 1.0, 2, 0).unwrap().with_workers(5);
        let two = vec![
            Body::at_rest(1e10, Vector3::new(-1.0, 0.0, 0.0)),
            Body::at_rest(1e10, Vector3::new(1.0, 0.0, 0.0)),
        ];
        let result = TriangularExecutor::new(config).execute(two, &mut NullSink).unwrap();
        assert_eq!(result[0].velocity.x, -result[1].velocity.x);
        assert!(result[0].velocity.x > 0.0);
    }
}
