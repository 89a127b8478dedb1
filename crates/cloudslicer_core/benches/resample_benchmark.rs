//! Benchmark for resampling slices out of a cached grid.
//!
//! Run with: cargo bench --package cloudslicer_core --bench resample_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cloudslicer_core::{CloudBox, OccupancyGrid, SliceRequest, SliceResampler};
use cloudslicer_shared::{IntPoint, IntVec3, Rotator, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_grid(density: IntVec3) -> OccupancyGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let points = (0..density.volume()).map(|_| rng.gen_bool(0.3)).collect();
    OccupancyGrid::from_points(points, density).unwrap()
}

fn benchmark_resolution(c: &mut Criterion) {
    let grid = random_grid(IntVec3::new(64, 64, 64));
    let resampler = SliceResampler::new();

    let mut group = c.benchmark_group("resample_resolution");
    for side in [64, 256, 1024] {
        let request = SliceRequest {
            plane_origin: Vec3::ZERO,
            plane_orientation: Rotator::new(30.0, 45.0, 0.0),
            cloud_box: CloudBox::new(Vec3::ZERO, Vec3::splat(50.0)),
            physical_size: Vec2::new(100.0, 100.0),
            resolution: IntPoint::new(side, side),
        };
        group.throughput(Throughput::Elements(request.resolution.area() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &request, |b, request| {
            b.iter(|| black_box(resampler.resample(&grid, request)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_resolution);
criterion_main!(benches);
