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
//! Error types for the simulation engine
//!
//! Configuration problems and malformed input are reported through
//! [`SimulationError`]. Numerical degeneracies are not errors: the
//! softening constant mitigates them and any NaN that still appears
//! propagates through the run unchecked.

use std::any::Any;

use thiserror::Error;

/// Errors produced while configuring, loading, or running a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The body set is empty
    #[error("body count must be positive")]
    EmptyBodySet,

    /// A body failed validation before the run started
    #[error("invalid body {index}: {reason}")]
    InvalidBody {
        /// Index of the offending body
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The body list text could not be parsed
    #[error("parse error at record {record}: {reason}")]
    Parse {
        /// Record number (0 is the header)
        record: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document could not be deserialized
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A message-passing operation failed; the whole run is aborted
    #[error("communication failure: {0}")]
    Communication(String),

    /// The requested protocol was compiled out
    #[error("protocol unavailable: {0}")]
    ProtocolUnavailable(&'static str),

    /// A worker thread or rank panicked
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

impl SimulationError {
    /// Wrap a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        SimulationError::WorkerPanicked(message)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SimulationError>;
