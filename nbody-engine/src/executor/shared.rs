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
//! Fork-join thread team over a shared double buffer
//!
//! One team of `workers` threads lives for the whole run. Thread `t` owns
//! bodies `t, t + P, t + 2P, ...` and writes only those slots of the next
//! buffer. Each step is two barrier-delimited phases:
//!
//! 1. **Compute**: every thread reads the current buffer and the prepared
//!    evaluator, and writes its own slots of the next buffer.
//! 2. **Leader**: after the first barrier, thread 0 alone samples the
//!    frame, swaps the buffers and prepares the evaluator (builds the tree)
//!    for the new current state. The second barrier releases the team.
//!
//! No other synchronization is needed: within a phase every slot has
//! either many readers or exactly one writer.
//!
//! A panic in either phase is caught and recorded. Every thread still
//! reaches both barriers of that step, then the team stops and the run
//! returns [`SimulationError::WorkerPanicked`](crate::SimulationError::WorkerPanicked).

use crate::body::Body;
use crate::error::Result;
use crate::simulation::{SimulationConfig, TrajectorySink};
use super::Executor;

/// Shared-memory executor backed by a rayon thread pool
#[derive(Debug, Clone)]
pub struct SharedMemoryExecutor {
    config: SimulationConfig,
}

impl SharedMemoryExecutor {
    /// Create a shared-memory executor with `config.workers` threads
    pub fn new(config: SimulationConfig) -> Self {
        SharedMemoryExecutor { config }
    }

    /// Team size
    pub fn threads(&self) -> usize {
        self.config.workers
    }
}

impl Executor for SharedMemoryExecutor {
    fn name(&self) -> &str {
        "shared-memory"
    }

    #[cfg(feature = "parallel")]
    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>> {
        team::run(&self.config, bodies, sink)
    }

    #[cfg(not(feature = "parallel"))]
    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>> {
        let _ = (bodies, sink);
        Err(crate::error::SimulationError::ProtocolUnavailable(
            "shared-memory execution requires the `parallel` feature",
        ))
    }
}

#[cfg(feature = "parallel")]
mod team {
    use std::cell::UnsafeCell;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Barrier, Mutex, PoisonError};

    use crate::body::Body;
    use crate::error::{Result, SimulationError};
    use crate::force::ForceEvaluator;
    use crate::integration::TaylorIntegrator;
    use crate::simulation::{advance_body, FrameSchedule, SimulationConfig, TrajectorySink};

    /// Body array whose slots are written through a shared reference
    struct SlotBuffer {
        slots: Vec<UnsafeCell<Body>>,
    }

    impl SlotBuffer {
        fn new(bodies: Vec<Body>) -> Self {
            SlotBuffer {
                slots: bodies.into_iter().map(UnsafeCell::new).collect(),
            }
        }

        /// # Safety
        ///
        /// No slot may be written while the returned slice is alive.
        unsafe fn as_slice(&self) -> &[Body] {
            // UnsafeCell<Body> has the same layout as Body
            std::slice::from_raw_parts(self.slots.as_ptr() as *const Body, self.slots.len())
        }

        /// # Safety
        ///
        /// The caller must be the only thread accessing slot `index`, and
        /// no slice from [`SlotBuffer::as_slice`] may be alive.
        unsafe fn write(&self, index: usize, body: Body) {
            *self.slots[index].get() = body;
        }

        fn into_bodies(self) -> Vec<Body> {
            self.slots.into_iter().map(UnsafeCell::into_inner).collect()
        }
    }

    /// State touched only by thread 0, between the two barriers
    struct Leader<'s> {
        evaluator: Box<dyn ForceEvaluator>,
        sink: &'s mut dyn TrajectorySink,
        generation: usize,
    }

    struct Team<'s> {
        buffers: [SlotBuffer; 2],
        leader: UnsafeCell<Leader<'s>>,
        barrier: Barrier,
        threads: usize,
        iterations: usize,
        integrator: TaylorIntegrator,
        schedule: FrameSchedule,
        /// Set by any thread that panicked during the current step
        failed: AtomicBool,
        /// Written only in the leader phase, read after the second barrier
        stop: AtomicBool,
        failure: Mutex<Option<SimulationError>>,
    }

    // SAFETY: the buffers and the leader state are only accessed according
    // to the phase discipline in `Team::work`. The evaluator is Sync and
    // the sink is Send; it is only ever touched by one thread at a time.
    unsafe impl Sync for Team<'_> {}

    impl Team<'_> {
        fn buffers(&self, generation: usize) -> (&SlotBuffer, &SlotBuffer) {
            let current = generation % 2;
            (&self.buffers[current], &self.buffers[1 - current])
        }

        /// Run `phase`, turning a panic into a recorded failure
        fn guarded(&self, phase: impl FnOnce()) {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(phase)) {
                let error = SimulationError::from_panic(payload);
                let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
                if failure.is_none() {
                    *failure = Some(error);
                }
                self.failed.store(true, Ordering::Release);
            }
        }

        fn compute(&self, thread: usize) {
            // SAFETY: during the compute phase nobody mutates the leader
            // state, so shared access is fine.
            let leader = unsafe { &*self.leader.get() };
            let (current, next) = self.buffers(leader.generation);
            // SAFETY: the current buffer is never written in this phase.
            let current = unsafe { current.as_slice() };

            for index in (thread..current.len()).step_by(self.threads) {
                let body = advance_body(index, current, leader.evaluator.as_ref(), &self.integrator);
                // SAFETY: strided ownership gives every index exactly one
                // writer and the next buffer has no readers here.
                unsafe { next.write(index, body) };
            }
        }

        /// # Safety
        ///
        /// Only thread 0 may call this, between the two barriers.
        unsafe fn lead(&self, iteration: usize) {
            let leader = &mut *self.leader.get();
            let (_, next) = self.buffers(leader.generation);
            // SAFETY: all writes to the next buffer completed before the
            // first barrier.
            let next = next.as_slice();

            if let Some(frame) = self.schedule.frame_at(iteration) {
                tracing::debug!(iteration, frame, "sampling frame");
                leader.sink.append_frame(frame, next);
            }
            leader.generation += 1;
            if iteration + 1 < self.iterations {
                leader.evaluator.prepare(next);
            }
        }

        fn work(&self, thread: usize) {
            for iteration in 0..self.iterations {
                self.guarded(|| self.compute(thread));

                self.barrier.wait();

                if thread == 0 {
                    if !self.failed.load(Ordering::Acquire) {
                        // SAFETY: every other thread is parked on the second
                        // barrier and holds no reference into the leader state.
                        self.guarded(|| unsafe { self.lead(iteration) });
                    }
                    self.stop.store(self.failed.load(Ordering::Acquire), Ordering::Release);
                }

                self.barrier.wait();

                // every thread sees the same value: `stop` is not written
                // again until after the next first barrier
                if self.stop.load(Ordering::Acquire) {
                    break;
                }
            }
        }
    }

    pub(super) fn run(
        config: &SimulationConfig,
        bodies: Vec<Body>,
        sink: &mut dyn TrajectorySink,
    ) -> Result<Vec<Body>> {
        let threads = config.workers;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("nbody-worker-{}", i))
            .build()
            .map_err(|e| SimulationError::InvalidConfig(format!("failed to build thread pool: {}", e)))?;

        let mut evaluator = config.evaluator();
        evaluator.prepare(&bodies);
        tracing::debug!(threads, evaluator = evaluator.name(), "launching thread team");

        let team = Team {
            buffers: [SlotBuffer::new(bodies.clone()), SlotBuffer::new(bodies)],
            leader: UnsafeCell::new(Leader {
                evaluator,
                sink,
                generation: 0,
            }),
            barrier: Barrier::new(threads),
            threads,
            iterations: config.iterations,
            integrator: config.integrator(),
            schedule: config.schedule(),
            failed: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            failure: Mutex::new(None),
        };

        pool.broadcast(|ctx| team.work(ctx.index()));

        let failure = team.failure.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(error) = failure {
            tracing::error!(error = %error, "thread team aborted");
            return Err(error);
        }

        let generation = team.leader.into_inner().generation;
        let [first, second] = team.buffers;
        Ok(if generation % 2 == 0 {
            first.into_bodies()
        } else {
            second.into_bodies()
        })
    }
}

#[cfg(all(test, feature = "parallel"))]
mod tests {
    use super::*;
    use crate::executor::SerialExecutor;
    use crate::math::Vector3;
    use crate::simulation::TrajectoryLog;

    fn lattice() -> Vec<Body> {
        let mut bodies = Vec::new();
        for i in 0..4 {
            for j in 0..3 {
                let position = Vector3::new(i as f64 * 1e3, j as f64 * 1.5e3, (i * j) as f64 * 7e2);
                bodies.push(Body::at_rest(1e12 + (i + j) as f64 * 1e11, position));
            }
        }
        bodies
    }

    #[test]
    fn test_matches_serial_bitwise() {
        // each body's acceleration is computed by the same code on the same
        // snapshot, so the result is identical regardless of thread count
        let config = SimulationConfig::configure(0.5, 10.0, 20, 4).unwrap().with_workers(3);
        let mut serial_log = TrajectoryLog::new(12, 4);
        let mut shared_log = TrajectoryLog::new(12, 4);

        let serial = SerialExecutor::new(config.clone())
            .execute(lattice(), &mut serial_log)
            .unwrap();
        let shared = SharedMemoryExecutor::new(config)
            .execute(lattice(), &mut shared_log)
            .unwrap();

        assert_eq!(serial, shared);
        for frame in 0..4 {
            assert_eq!(serial_log.frame(frame), shared_log.frame(frame));
        }
    }

    #[test]
    fn test_more_threads_than_bodies() {
        let config = SimulationConfig::configure(1.0, 1.0, 3, 0).unwrap().with_workers(8);
        let bodies = vec![
            Body::at_rest(1e10, Vector3::new(-1.0, 0.0, 0.0)),
            Body::at_rest(1e10, Vector3::new(1.0, 0.0, 0.0)),
        ];
        let result = SharedMemoryExecutor::new(config)
            .execute(bodies, &mut crate::simulation::NullSink)
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!((result[0].position.x + result[1].position.x).abs() < 1e-12);
    }

    struct FailingSink;

    impl TrajectorySink for FailingSink {
        fn append_frame(&mut self, frame: usize, _bodies: &[Body]) {
            panic!("sink rejected frame {}", frame);
        }
    }

    #[test]
    fn test_leader_panic_aborts_team() {
        let config = SimulationConfig::configure(0.5, 1.0, 10, 5).unwrap().with_workers(3);
        let executor = SharedMemoryExecutor::new(config);
        assert_eq!(executor.threads(), 3);

        let result = executor.execute(lattice(), &mut FailingSink);
        match result {
            Err(crate::error::SimulationError::WorkerPanicked(message)) => {
                assert_eq!(message, "sink rejected frame 0");
            }
            other => panic!("expected WorkerPanicked, got {:?}", other),
        }
    }
}
