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
//! Execution protocols
//!
//! An [`Executor`] runs the full step loop over an initial body set and
//! returns the final state. All of them share the step kernel in
//! [`crate::simulation::advance_body`] and the frame rules of
//! [`crate::simulation::FrameSchedule`]; they differ in how the work and
//! the state are split:
//!
//! | Protocol | Work split | State |
//! |----------|------------|-------|
//! | [`Protocol::Serial`] | none | one double buffer |
//! | [`Protocol::SharedMemory`] | strided over a thread team | shared double buffer, two barriers per step |
//! | [`Protocol::DistributedRing`] | contiguous body slices | each rank owns its slice |
//! | [`Protocol::DistributedTriangular`] | contiguous pair ranges | replicated, forces all-reduced |
//! | [`Protocol::DistributedTree`] | contiguous body slices | replicated, tree rebuilt on every rank |

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::distributed::{RingExecutor, TreeExecutor, TriangularExecutor};
use crate::error::Result;
use crate::simulation::{SimulationConfig, TrajectorySink};

mod serial;
mod shared;

pub use serial::SerialExecutor;
pub use shared::SharedMemoryExecutor;

/// Runs a whole simulation under one parallelization strategy
pub trait Executor: Send + Sync {
    /// Descriptive name for logging
    fn name(&self) -> &str;

    /// Step `bodies` through every configured iteration
    ///
    /// Sampled frames go to `sink` from a single thread. Returns the final
    /// state in input order.
    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>>;
}

/// Selects an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Single-threaded loop
    #[default]
    Serial,
    /// Fork-join thread team over a shared double buffer
    SharedMemory,
    /// Ranks pass body slices around a ring, direct summation
    DistributedRing,
    /// Ranks split the pair triangle and all-reduce forces
    DistributedTriangular,
    /// Ranks build the octree redundantly and all-gather their slices
    DistributedTree,
}

impl Protocol {
    /// Every protocol, in declaration order
    pub const ALL: [Protocol; 5] = [
        Protocol::Serial,
        Protocol::SharedMemory,
        Protocol::DistributedRing,
        Protocol::DistributedTriangular,
        Protocol::DistributedTree,
    ];

    /// Build the executor for this protocol
    pub fn executor(self, config: &SimulationConfig) -> Result<Box<dyn Executor>> {
        config.validate()?;
        let config = config.clone();
        Ok(match self {
            Protocol::Serial => Box::new(SerialExecutor::new(config)),
            Protocol::SharedMemory => Box::new(SharedMemoryExecutor::new(config)),
            Protocol::DistributedRing => Box::new(RingExecutor::new(config)),
            Protocol::DistributedTriangular => Box::new(TriangularExecutor::new(config)),
            Protocol::DistributedTree => Box::new(TreeExecutor::new(config)),
        })
    }
}
