//! Construction and refinement throughput.
//!
//! Three groups:
//! - `construction`: Delaunay triangulation of seeded random point sets
//! - `refinement`: quality refinement of a square at several area bounds
//! - `insertion`: incremental insertion of random points into a fixed mesh
//!
//! Set `DELAUNAY_MESH_BENCH_LOG=1` to print mesh sizes once per case.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use delaunay_mesh::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const COUNTS: &[usize] = &[100, 1_000, 10_000];
const AREA_BOUNDS: &[f64] = &[0.01, 0.001, 0.0001];
const SEED: u64 = 0x5eed_2d;

fn bench_logging_enabled() -> bool {
    std::env::var("DELAUNAY_MESH_BENCH_LOG")
        .map(|value| value != "0")
        .unwrap_or(false)
}

fn random_points(count: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| [rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)])
        .collect()
}

fn unit_square() -> InputGeometry {
    InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).with_closed_polygon(1)
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    for &count in COUNTS {
        let input = InputGeometry::from_points(random_points(count, SEED.wrapping_add(count as u64)));
        if bench_logging_enabled() {
            let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
            println!(
                "construction count={count} triangles={} hull={}",
                mesh.triangle_count(),
                mesh.hull_size()
            );
        }
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| Mesh::triangulate(black_box(input), Behavior::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("refinement");
    group.sample_size(20);
    let input = unit_square();
    for &area in AREA_BOUNDS {
        let behavior = BehaviorBuilder::default()
            .quality(true)
            .min_angle(25.0)
            .max_area(area)
            .build()
            .unwrap();
        if bench_logging_enabled() {
            let mesh = Mesh::triangulate(&input, behavior.clone()).unwrap();
            println!(
                "refinement area={area} triangles={} steiner={}",
                mesh.triangle_count(),
                mesh.steiner_points_inserted()
            );
        }
        group.bench_with_input(BenchmarkId::new("min_angle_25", area), &behavior, |b, behavior| {
            b.iter(|| Mesh::triangulate(black_box(&input), behavior.clone()).unwrap());
        });
    }
    group.finish();
}

fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("insertion");
    let base = Mesh::triangulate(&InputGeometry::from_points(random_points(1_000, SEED)), Behavior::default()).unwrap();
    let extra: Vec<Point> = random_points(1_000, SEED ^ 1)
        .into_iter()
        .map(|[x, y]| Point::new(x.mul_add(0.5, 0.25), y.mul_add(0.5, 0.25)))
        .collect();
    group.throughput(Throughput::Elements(extra.len() as u64));
    group.bench_function("1000_into_1000", |b| {
        b.iter_batched(
            || base.clone(),
            |mut mesh| {
                for &p in &extra {
                    black_box(mesh.insert_point(p).unwrap());
                }
                mesh
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_construction, bench_refinement, bench_insertion);
criterion_main!(benches);
