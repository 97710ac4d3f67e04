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
//! Simulation driver
//!
//! Ties configuration, force evaluation and integration together. Every
//! execution protocol steps bodies through the same kernel,
//! [`advance_body`], so they differ only in how work and state are
//! distributed.
//!
//! # Example
//!
//! ```
//! use nbody_engine::body::Body;
//! use nbody_engine::executor::Protocol;
//! use nbody_engine::math::Vector3;
//! use nbody_engine::simulation::{Simulation, SimulationConfig, TrajectoryLog};
//!
//! let config = SimulationConfig::configure(0.5, 1.0, 10, 5).unwrap();
//! let simulation = Simulation::new(config).unwrap();
//! let bodies = vec![
//!     Body::at_rest(1e10, Vector3::new(-1.0, 0.0, 0.0)),
//!     Body::at_rest(1e10, Vector3::new(1.0, 0.0, 0.0)),
//! ];
//!
//! let mut log = TrajectoryLog::new(bodies.len(), 5);
//! let result = simulation.run(bodies, Protocol::Serial, &mut log).unwrap();
//! assert!(result[0].position.x > -1.0);
//! assert_eq!(log.recorded_frames(), 5);
//! ```

use std::time::Instant;

use crate::body::{validate_bodies, Body};
use crate::error::Result;
use crate::executor::Protocol;
use crate::force::ForceEvaluator;
use crate::integration::Integrator;

mod buffer;
mod config;
mod timings;
mod trajectory;

pub use buffer::DoubleBuffer;
pub use config::{default_workers, SimulationConfig};
pub use timings::PhaseTimings;
pub use trajectory::{FrameSchedule, NullSink, Sample, TrajectoryLog, TrajectorySink};

/// New state of body `index` after one step
///
/// Reads only `current`; the evaluator must already be prepared for it.
#[inline]
pub fn advance_body<E, I>(index: usize, current: &[Body], evaluator: &E, integrator: &I) -> Body
where
    E: ForceEvaluator + ?Sized,
    I: Integrator + ?Sized,
{
    let acceleration = evaluator.acceleration(index, current);
    integrator.advance(&current[index], acceleration)
}

/// Step every body of `current` into `next`
pub fn advance_all<E, I>(current: &[Body], next: &mut [Body], evaluator: &E, integrator: &I)
where
    E: ForceEvaluator + ?Sized,
    I: Integrator + ?Sized,
{
    debug_assert_eq!(current.len(), next.len());
    for (index, slot) in next.iter_mut().enumerate() {
        *slot = advance_body(index, current, evaluator, integrator);
    }
}

/// A validated configuration ready to run
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    /// Validate `config` and wrap it
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Simulation { config })
    }

    /// The configuration this simulation runs with
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run to completion under `protocol`, sampling frames into `sink`
    ///
    /// Returns the final state of every body in input order.
    pub fn run(
        &self,
        bodies: Vec<Body>,
        protocol: Protocol,
        sink: &mut dyn TrajectorySink,
    ) -> Result<Vec<Body>> {
        validate_bodies(&bodies)?;
        let executor = protocol.executor(&self.config)?;

        let span = tracing::info_span!("simulation", protocol = executor.name());
        let _guard = span.enter();
        tracing::info!(
            bodies = bodies.len(),
            iterations = self.config.iterations,
            frames = self.config.frames,
            theta = self.config.theta,
            dt = self.config.dt,
            workers = self.config.workers,
            "starting run"
        );

        let start = Instant::now();
        let result = executor.execute(bodies, sink)?;
        tracing::info!(elapsed_s = start.elapsed().as_secs_f64(), "run complete");
        Ok(result)
    }

    /// Run and collect the trajectory into a fresh [`TrajectoryLog`]
    pub fn run_logged(
        &self,
        bodies: Vec<Body>,
        protocol: Protocol,
    ) -> Result<(Vec<Body>, TrajectoryLog)> {
        let mut log = TrajectoryLog::new(bodies.len(), self.config.frames);
        let result = self.run(bodies, protocol, &mut log)?;
        Ok((result, log))
    }
}
