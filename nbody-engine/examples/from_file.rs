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
//! Body List Example
//!
//! Loads bodies from a text file, optionally reads run parameters from a
//! TOML file, runs the simulation and writes the sampled trajectory.
//!
//! # Running
//!
//! ```bash
//! cargo run --example from_file --release -- input.txt output.txt
//! cargo run --example from_file --release -- input.txt output.txt run.toml ring
//! ```
//!
//! The input holds the body count followed by `m px py pz vx vy vz` per
//! body. The optional TOML file may set any of `theta`, `dt`,
//! `iterations`, `frames`, `softening`, `gravitational_constant`,
//! `method` and `workers`.

use nbody_engine::io::{load_bodies, save_trajectory};
use nbody_engine::{Protocol, Simulation, SimulationConfig, SimulationError};
use tracing_subscriber::EnvFilter;

fn run(args: &[String]) -> Result<(), SimulationError> {
    let input = &args[1];
    let output = &args[2];

    let config = match args.get(3) {
        Some(path) => SimulationConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    let protocol = match args.get(4).map(String::as_str) {
        None | Some("serial") => Protocol::Serial,
        Some("shared") => Protocol::SharedMemory,
        Some("ring") => Protocol::DistributedRing,
        Some("triangular") => Protocol::DistributedTriangular,
        Some("tree") => Protocol::DistributedTree,
        Some(other) => {
            return Err(SimulationError::InvalidConfig(format!("unknown protocol '{}'", other)))
        }
    };

    let bodies = load_bodies(input)?;
    let simulation = Simulation::new(config)?;
    let (result, log) = simulation.run_logged(bodies, protocol)?;
    save_trajectory(output, &result, &log)?;

    println!(
        "Simulated {} bodies for {} steps, {} frames written to {}",
        result.len(),
        simulation.config().iterations,
        log.recorded_frames(),
        output
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output> [config.toml] [serial|shared|ring|triangular|tree]", args[0]);
        std::process::exit(2);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
