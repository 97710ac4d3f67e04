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
//! Ring pairwise exchange
//!
//! With P ranks, every step runs P-1 exchange rounds. In round `k` rank
//! `r` sends its own slice to `(r + k) mod P` and receives the slice of
//! `(r - k) mod P`, adding that slice's pull on its own bodies. After the
//! last round every rank has seen every other body exactly once and
//! advances its own slice. Forces are computed by direct summation.

use crate::body::{Body, GravityLaw};
use crate::error::Result;
use crate::executor::Executor;
use crate::integration::{Integrator, TaylorIntegrator};
use crate::math::Vector3;
use crate::simulation::{FrameSchedule, PhaseTimings, SimulationConfig, TrajectorySink};
use super::{Communicator, LocalCluster, Packet, Partition};

/// Distributed direct summation with slices passed around a ring
#[derive(Debug, Clone)]
pub struct RingExecutor {
    config: SimulationConfig,
}

impl RingExecutor {
    /// Create a ring executor with `config.workers` ranks
    pub fn new(config: SimulationConfig) -> Self {
        RingExecutor { config }
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
        let law = self.config.law();
        let integrator = self.config.integrator();
        let schedule: FrameSchedule = self.config.schedule();
        let (rank, size) = (comm.rank(), comm.size());
        let mut timings = PhaseTimings::default();

        let mut mine = timings.time_communication(|| comm.scatter_bodies(initial, partition))?;
        let mut next = mine.clone();
        let mut accelerations = vec![Vector3::zero(); mine.len()];

        for iteration in 0..self.config.iterations {
            timings.time_compute(|| {
                accelerations.fill(Vector3::zero());
                accumulate(&mut accelerations, &mine, &mine, true, &law);
            });

            for round in 1..size {
                let dest = (rank + round) % size;
                let source = (rank + size - round) % size;
                let theirs = timings.time_communication(|| {
                    comm.send_recv(Packet::Bodies(mine.clone()), dest, source, round as u32)?
                        .into_bodies()
                })?;
                timings.time_compute(|| accumulate(&mut accelerations, &mine, &theirs, false, &law));
            }

            timings.time_compute(|| advance(&integrator, &mine, &accelerations, &mut next));

            if let Some(frame) = schedule.frame_at(iteration) {
                let gathered = timings.time_communication(|| comm.gather_bodies(&next))?;
                if let (Some(all), Some(sink)) = (gathered, sink.as_deref_mut()) {
                    tracing::debug!(iteration, frame, "sampling frame");
                    sink.append_frame(frame, &all);
                }
            }

            std::mem::swap(&mut mine, &mut next);
            timings.time_communication(|| comm.barrier())?;
        }

        let gathered = timings.time_communication(|| comm.gather_bodies(&mine))?;
        if comm.is_root() {
            timings.log(self.name());
        }
        Ok(gathered.unwrap_or_default())
    }
}

/// Add the pull of every `sources` body on every `targets` body
///
/// With `same_slice` the two slices are the same bodies and a body's pull
/// on itself is skipped.
fn accumulate(
    accelerations: &mut [Vector3],
    targets: &[Body],
    sources: &[Body],
    same_slice: bool,
    law: &GravityLaw,
) {
    for (i, (acceleration, target)) in accelerations.iter_mut().zip(targets).enumerate() {
        for (j, source) in sources.iter().enumerate() {
            if same_slice && i == j {
                continue;
            }
            *acceleration += law.acceleration(target, source);
        }
    }
}

fn advance(integrator: &TaylorIntegrator, bodies: &[Body], accelerations: &[Vector3], next: &mut [Body]) {
    for ((slot, body), acceleration) in next.iter_mut().zip(bodies).zip(accelerations) {
        *slot = integrator.advance(body, *acceleration);
    }
}

impl Executor for RingExecutor {
    fn name(&self) -> &str {
        "ring"
    }

    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>> {
        let ranks = self.config.workers;
        let partition = Partition::contiguous(bodies.len(), ranks);
        partition.warn_if_uneven("bodies");

        LocalCluster::new(ranks)?.run(sink, |comm, sink| self.run_rank(comm, sink, &bodies, &partition))
    }
}
