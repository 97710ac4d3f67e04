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
//! Rotating Disk Galaxy Example
//!
//! Builds a flattened disk of stars around a heavy central mass, runs it
//! under the chosen execution protocol, and reports how well momentum and
//! the center of mass were preserved.
//!
//! # Running
//!
//! ```bash
//! # 2000 bodies, Barnes-Hut on a thread team
//! cargo run --example galaxy --release
//!
//! # Distributed octree protocol on 8 ranks, writing the trajectory
//! cargo run --example galaxy --release -- --protocol tree --workers 8 --output galaxy.txt
//!
//! # Verbose logging
//! RUST_LOG=nbody_engine=debug cargo run --example galaxy --release
//! ```

use std::time::Instant;

use nbody_engine::integration::{center_of_mass, total_kinetic_energy, total_momentum};
use nbody_engine::io::save_trajectory;
use nbody_engine::simulation::default_workers;
use nbody_engine::{Body, Protocol, Simulation, SimulationConfig, Vector3};
use tracing_subscriber::EnvFilter;

/// Central mass in kilograms (about 4 million suns)
const CORE_MASS: f64 = 8.0e36;

/// Disk radius in meters
const DISK_RADIUS: f64 = 5.0e13;

struct Options {
    bodies: usize,
    protocol: Protocol,
    workers: usize,
    iterations: usize,
    frames: usize,
    theta: f64,
    output: Option<String>,
}

fn parse_protocol(name: &str) -> Option<Protocol> {
    match name {
        "serial" => Some(Protocol::Serial),
        "shared" => Some(Protocol::SharedMemory),
        "ring" => Some(Protocol::DistributedRing),
        "triangular" => Some(Protocol::DistributedTriangular),
        "tree" => Some(Protocol::DistributedTree),
        _ => None,
    }
}

fn parse_args() -> Options {
    let mut options = Options {
        bodies: 2000,
        protocol: Protocol::SharedMemory,
        workers: default_workers(),
        iterations: 200,
        frames: 20,
        theta: 0.7,
        output: None,
    };

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).map(String::as_str).unwrap_or("");
        match args[i].as_str() {
            "--bodies" => options.bodies = value.parse().unwrap_or(options.bodies),
            "--workers" => options.workers = value.parse().unwrap_or(options.workers),
            "--iterations" => options.iterations = value.parse().unwrap_or(options.iterations),
            "--frames" => options.frames = value.parse().unwrap_or(options.frames),
            "--theta" => options.theta = value.parse().unwrap_or(options.theta),
            "--output" => options.output = Some(value.to_string()),
            "--protocol" => match parse_protocol(value) {
                Some(protocol) => options.protocol = protocol,
                None => eprintln!("Warning: unknown protocol '{}', keeping default", value),
            },
            other => eprintln!("Warning: ignoring unknown argument '{}'", other),
        }
        i += 2;
    }
    options
}

/// Stars on near-circular orbits in a thin disk
fn disk(n: usize) -> Vec<Body> {
    let rng = fastrand::Rng::with_seed(1);
    let g = nbody_engine::body::GRAVITATIONAL_CONSTANT;

    let mut bodies = vec![Body::at_rest(CORE_MASS, Vector3::zero())];
    for _ in 1..n {
        let radius = DISK_RADIUS * (0.05 + 0.95 * rng.f64().sqrt());
        let angle = rng.f64() * std::f64::consts::TAU;
        let height = (rng.f64() - 0.5) * 0.02 * DISK_RADIUS;
        let position = Vector3::new(radius * angle.cos(), radius * angle.sin(), height);

        let speed = (g * CORE_MASS / radius).sqrt();
        let velocity = Vector3::new(-angle.sin(), angle.cos(), 0.0) * speed;
        bodies.push(Body::new(2.0e30 * (0.1 + rng.f64()), position, velocity));
    }
    bodies
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = parse_args();
    let config = match SimulationConfig::configure(
        options.theta,
        100_000.0,
        options.iterations,
        options.frames,
    ) {
        Ok(config) => config.with_workers(options.workers),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let bodies = disk(options.bodies);
    let momentum_before = total_momentum(&bodies);
    let center_before = center_of_mass(&bodies);
    let energy_before = total_kinetic_energy(&bodies);

    println!("=== Disk Galaxy ===");
    println!("Bodies:     {}", bodies.len());
    println!("Protocol:   {:?}", options.protocol);
    println!("Workers:    {}", options.workers);
    println!("Iterations: {}", options.iterations);
    println!("Theta:      {}", options.theta);
    println!();

    let simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let (result, log) = match simulation.run_logged(bodies, options.protocol) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    let momentum_drift = (total_momentum(&result) - momentum_before).norm();
    let center_drift = (center_of_mass(&result) - center_before).norm();
    let energy_ratio = total_kinetic_energy(&result) / energy_before;

    println!("Finished in {:.3} s ({} frames recorded)", elapsed.as_secs_f64(), log.recorded_frames());
    println!("Momentum drift:        {:.3e} kg·m/s", momentum_drift);
    println!("Center of mass drift:  {:.3e} m", center_drift);
    println!("Kinetic energy ratio:  {:.6}", energy_ratio);

    if let Some(path) = options.output {
        if let Err(e) = save_trajectory(&path, &result, &log) {
            eprintln!("Failed to write {}: {}", path, e);
            std::process::exit(1);
        }
        println!("Trajectory written to {}", path);
    }
}
