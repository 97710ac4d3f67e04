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
//! Integration tests for physical behavior of complete runs

use nbody_engine::integration::{center_of_mass, total_momentum};
use nbody_engine::simulation::SimulationConfig;
use nbody_engine::force::ForceMethod;
use nbody_engine::{Body, Protocol, Simulation, Vector3};

fn symmetric_pair(mass: f64, separation: f64) -> Vec<Body> {
    vec![
        Body::at_rest(mass, Vector3::new(-separation / 2.0, 0.0, 0.0)),
        Body::at_rest(mass, Vector3::new(separation / 2.0, 0.0, 0.0)),
    ]
}

#[test]
fn test_symmetric_pair_attracts_symmetrically() {
    let config = SimulationConfig::configure(1.0, 10.0, 1, 1).unwrap();
    for protocol in Protocol::ALL {
        let simulation = Simulation::new(config.clone().with_workers(2)).unwrap();
        let (result, log) = simulation.run_logged(symmetric_pair(1e15, 1e3), protocol).unwrap();

        assert!(result[0].velocity.x > 0.0, "{:?}", protocol);
        assert_eq!(result[0].velocity.x, -result[1].velocity.x, "{:?}", protocol);
        assert_eq!(result[0].position.x, -result[1].position.x, "{:?}", protocol);
        assert_eq!(result[0].position.y, 0.0);
        assert_eq!(log.sample(0, 1).unwrap().position, result[1].position);
    }
}

#[test]
fn test_single_body_drifts_in_a_straight_line() {
    let config = SimulationConfig::configure(1.0, 100_000.0, 40, 8).unwrap().with_workers(3);
    let velocity = Vector3::new(3.0, -2.0, 0.5);
    let start = Vector3::new(1e9, 2e9, -3e9);

    for protocol in Protocol::ALL {
        let simulation = Simulation::new(config.clone()).unwrap();
        let (result, log) = simulation
            .run_logged(vec![Body::new(5.0e24, start, velocity)], protocol)
            .unwrap();

        assert_eq!(result[0].velocity, velocity, "{:?}", protocol);
        let expected = start + velocity * (100_000.0 * 40.0);
        assert!((result[0].position - expected).norm() < 1e-3, "{:?}", protocol);
        assert_eq!(log.recorded_frames(), 8);
    }
}

#[test]
fn test_momentum_conserved_by_direct_summation() {
    let rng = fastrand::Rng::with_seed(99);
    let bodies: Vec<Body> = (0..30)
        .map(|_| {
            Body::new(
                1e22 * (1.0 + rng.f64()),
                Vector3::new(rng.f64(), rng.f64(), rng.f64()) * 1e9,
                Vector3::new(rng.f64() - 0.5, rng.f64() - 0.5, 0.0) * 100.0,
            )
        })
        .collect();
    let scale: f64 = bodies.iter().map(|b| b.momentum().norm()).sum();
    let before = total_momentum(&bodies);

    let config = SimulationConfig::configure(0.0, 1000.0, 50, 0)
        .unwrap()
        .with_method(ForceMethod::Direct);
    let (after, _) = Simulation::new(config).unwrap().run_logged(bodies, Protocol::Serial).unwrap();

    assert!((total_momentum(&after) - before).norm() < 1e-9 * scale);
}

#[test]
fn test_center_of_mass_moves_uniformly() {
    let mut bodies = symmetric_pair(1e20, 2e7);
    for body in &mut bodies {
        body.velocity = Vector3::new(10.0, 0.0, 0.0);
    }
    let before = center_of_mass(&bodies);

    let config = SimulationConfig::configure(0.5, 1000.0, 20, 0).unwrap();
    let (after, _) = Simulation::new(config).unwrap().run_logged(bodies, Protocol::Serial).unwrap();

    let expected = before + Vector3::new(10.0 * 1000.0 * 20.0, 0.0, 0.0);
    assert!((center_of_mass(&after) - expected).norm() < 1e-3);
}

#[test]
fn test_two_body_orbit_stays_bound() {
    // light body on a circular orbit; one period is about 2.8 hours
    let central: f64 = 6e24;
    let radius = 1e7;
    let speed = (6.673e-11 * central / radius).sqrt();
    let bodies = vec![
        Body::at_rest(central, Vector3::zero()),
        Body::new(1.0, Vector3::new(radius, 0.0, 0.0), Vector3::new(0.0, speed, 0.0)),
    ];

    let config = SimulationConfig::configure(1.0, 10.0, 1000, 10).unwrap();
    let (result, log) = Simulation::new(config).unwrap().run_logged(bodies, Protocol::Serial).unwrap();

    let distance = (result[1].position - result[0].position).norm();
    assert!((distance - radius).abs() < 0.05 * radius, "drifted to {}", distance);
    assert!(log.frames().all(|frame| frame[1].position.norm() > 0.5 * radius));
}
