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
//! Benchmarks comparing execution protocols
//!
//! Each iteration runs a short simulation end to end, so the numbers
//! include thread or rank start-up as well as per-step synchronization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nbody_engine::simulation::{NullSink, SimulationConfig};
use nbody_engine::{Body, Executor, Protocol, Vector3};

fn cluster(n: usize) -> Vec<Body> {
    let rng = fastrand::Rng::with_seed(7);
    (0..n)
        .map(|_| {
            let position = Vector3::new(rng.f64() - 0.5, rng.f64() - 0.5, rng.f64() - 0.5) * 1e9;
            let velocity = Vector3::new(rng.f64() - 0.5, rng.f64() - 0.5, 0.0) * 100.0;
            Body::new(1e24 * (0.5 + rng.f64()), position, velocity)
        })
        .collect()
}

fn bench_protocols(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocols");
    group.sample_size(10);
    let bodies = cluster(1000);
    let config = SimulationConfig::configure(1.0, 1000.0, 10, 0).unwrap().with_workers(4);

    for protocol in Protocol::ALL.iter() {
        let executor = protocol.executor(&config).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(executor.name()), protocol, |b, _| {
            b.iter(|| executor.execute(black_box(bodies.clone()), &mut NullSink).unwrap());
        });
    }

    group.finish();
}

fn bench_shared_memory_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_memory_threads");
    group.sample_size(10);
    let bodies = cluster(4000);

    for threads in [1, 2, 4, 8].iter() {
        let config = SimulationConfig::configure(1.0, 1000.0, 5, 0)
            .unwrap()
            .with_workers(*threads);
        let executor = Protocol::SharedMemory.executor(&config).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, _| {
            b.iter(|| executor.execute(black_box(bodies.clone()), &mut NullSink).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_protocols, bench_shared_memory_scaling);
criterion_main!(benches);
