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
//! Per-phase wall-clock accounting

use std::time::{Duration, Instant};

/// Time spent in each phase of a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    /// Tree construction and aggregation
    pub build: Duration,
    /// Force evaluation and integration
    pub compute: Duration,
    /// Message exchange, collectives and barriers
    pub communication: Duration,
}

impl PhaseTimings {
    /// Run `f` and charge its duration to the build phase
    pub fn time_build<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.build += start.elapsed();
        out
    }

    /// Run `f` and charge its duration to the compute phase
    pub fn time_compute<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.compute += start.elapsed();
        out
    }

    /// Run `f` and charge its duration to the communication phase
    pub fn time_communication<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.communication += start.elapsed();
        out
    }

    /// Sum over all phases
    pub fn total(&self) -> Duration {
        self.build + self.compute + self.communication
    }

    /// Emit the breakdown at info level
    pub fn log(&self, protocol: &str) {
        tracing::info!(
            protocol,
            build_ms = self.build.as_secs_f64() * 1e3,
            compute_ms = self.compute.as_secs_f64() * 1e3,
            communication_ms = self.communication.as_secs_f64() * 1e3,
            "phase timings"
        );
    }
}
