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
//! # N-Body Engine
//!
//! Gravitational N-body simulation with a Barnes-Hut octree and several
//! interchangeable parallel execution protocols.
//!
//! ## Features
//!
//! - **Barnes-Hut Octree**: Arena-backed tree rebuilt every step, with an
//!   opening-angle criterion trading accuracy for speed
//! - **Direct Summation**: Exact O(N²) reference evaluator
//! - **Shared Memory**: Fork-join thread team over a double buffer
//!   (requires the default `parallel` feature)
//! - **Distributed Memory**: Ring exchange, triangular pair decomposition
//!   and octree broadcast protocols over a message-passing communicator
//! - **Trajectories**: Frame sampling to memory and plain-text output
//!
//! ## Example
//!
//! ```rust
//! use nbody_engine::{Body, Protocol, Simulation, SimulationConfig, Vector3};
//!
//! let config = SimulationConfig::configure(1.0, 100_000.0, 20, 4).unwrap();
//! let simulation = Simulation::new(config).unwrap();
//!
//! let bodies = vec![
//!     Body::at_rest(5.97e24, Vector3::zero()),
//!     Body::new(7.35e22, Vector3::new(3.84e8, 0.0, 0.0), Vector3::new(0.0, 1022.0, 0.0)),
//! ];
//! let (result, log) = simulation.run_logged(bodies, Protocol::Serial).unwrap();
//! assert_eq!(result.len(), 2);
//! assert_eq!(log.recorded_frames(), 4);
//! ```

#![warn(missing_docs)]

/// Error types
pub mod error;

/// Vector math
pub mod math;

/// Bodies and the gravitational law
pub mod body;

/// Octree spatial decomposition
pub mod tree;

/// Force-evaluation strategies
pub mod force;

/// Numerical integration
pub mod integration;

/// Configuration, step kernel and trajectory sampling
pub mod simulation;

/// Serial and shared-memory execution
pub mod executor;

/// Distributed-memory protocols and message passing
pub mod distributed;

/// Text input and output
pub mod io;

pub use body::{Body, GravityLaw};
pub use error::{Result, SimulationError};
pub use executor::{Executor, Protocol};
pub use math::Vector3;
pub use simulation::{Simulation, SimulationConfig, TrajectoryLog, TrajectorySink};
