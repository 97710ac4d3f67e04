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
//! Single-threaded reference loop

use crate::body::Body;
use crate::error::Result;
use crate::simulation::{advance_all, DoubleBuffer, SimulationConfig, TrajectorySink};
use super::Executor;

/// Steps every body on the calling thread
///
/// Per iteration: prepare the evaluator for the current buffer, advance
/// every body into the next buffer, sample the frame if scheduled, swap.
#[derive(Debug, Clone)]
pub struct SerialExecutor {
    config: SimulationConfig,
}

impl SerialExecutor {
    /// Create a serial executor
    pub fn new(config: SimulationConfig) -> Self {
        SerialExecutor { config }
    }
}

impl Executor for SerialExecutor {
    fn name(&self) -> &str {
        "serial"
    }

    fn execute(&self, bodies: Vec<Body>, sink: &mut dyn TrajectorySink) -> Result<Vec<Body>> {
        let mut evaluator = self.config.evaluator();
        let integrator = self.config.integrator();
        let schedule = self.config.schedule();
        let mut buffers = DoubleBuffer::new(bodies);

        for iteration in 0..self.config.iterations {
            evaluator.prepare(buffers.current());
            let (current, next) = buffers.split_mut();
            advance_all(current, next, evaluator.as_ref(), &integrator);

            if let Some(frame) = schedule.frame_at(iteration) {
                tracing::debug!(iteration, frame, "sampling frame");
                sink.append_frame(frame, buffers.next());
            }
            buffers.swap();
        }

        Ok(buffers.into_current())
    }
}
