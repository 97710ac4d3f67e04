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
//! Benchmarks comparing force evaluators
//!
//! These benchmarks measure:
//! - Tree build cost for growing body counts
//! - Per-step acceleration cost of direct summation versus Barnes-Hut
//! - The effect of the opening angle on Barnes-Hut cost

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbody_engine::force::{BarnesHut, DirectSummation, ForceEvaluator};
use nbody_engine::tree::Octree;
use nbody_engine::{Body, GravityLaw, Vector3};

fn cluster(n: usize) -> Vec<Body> {
    let rng = fastrand::Rng::with_seed(2024);
    (0..n)
        .map(|_| {
            let position = Vector3::new(rng.f64() - 0.5, rng.f64() - 0.5, rng.f64() - 0.5) * 1e9;
            Body::at_rest(1e24 * (0.5 + rng.f64()), position)
        })
        .collect()
}

fn all_accelerations(evaluator: &dyn ForceEvaluator, bodies: &[Body]) -> Vector3 {
    (0..bodies.len()).map(|i| evaluator.acceleration(i, bodies)).sum()
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");

    for n in [100, 1000, 10_000].iter() {
        let bodies = cluster(*n);
        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            let mut tree = Octree::with_capacity(*n * 2);
            b.iter(|| {
                tree.build(black_box(&bodies));
                tree.node_count()
            });
        });
    }

    group.finish();
}

fn bench_direct_vs_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("accelerations");
    let law = GravityLaw::default();

    for n in [100, 500, 2000].iter() {
        let bodies = cluster(*n);
        group.throughput(Throughput::Elements(*n as u64));

        let direct = DirectSummation::new(law);
        group.bench_with_input(BenchmarkId::new("direct", n), n, |b, _| {
            b.iter(|| all_accelerations(&direct, black_box(&bodies)));
        });

        let mut tree = BarnesHut::new(law, 1.0);
        tree.prepare(&bodies);
        group.bench_with_input(BenchmarkId::new("barnes_hut", n), n, |b, _| {
            b.iter(|| all_accelerations(&tree, black_box(&bodies)));
        });
    }

    group.finish();
}

fn bench_opening_angle(c: &mut Criterion) {
    let mut group = c.benchmark_group("opening_angle");
    let bodies = cluster(2000);

    for theta in [0.2, 0.5, 1.0].iter() {
        let mut tree = BarnesHut::new(GravityLaw::default(), *theta);
        tree.prepare(&bodies);
        group.bench_with_input(BenchmarkId::from_parameter(theta), theta, |b, _| {
            b.iter(|| all_accelerations(&tree, black_box(&bodies)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_direct_vs_tree, bench_opening_angle);
criterion_main!(benches);
