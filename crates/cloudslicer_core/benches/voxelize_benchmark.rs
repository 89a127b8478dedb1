//! Benchmark for voxelizing a box against a parry scene.
//!
//! Run with: cargo bench --package cloudslicer_core --bench voxelize_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cloudslicer_core::{CloudBox, FnOracle, GeometryOracle, ParryScene, VoxelGridBuilder};
use cloudslicer_shared::{IntVec3, Vec3};

fn scene() -> ParryScene {
    let mut scene = ParryScene::new();
    scene.add_cuboid(Vec3::new(-20.0, 0.0, 0.0), Vec3::new(15.0, 40.0, 10.0));
    scene.add_ball(Vec3::new(25.0, 10.0, 5.0), 15.0);
    scene.add_ball(Vec3::new(25.0, -25.0, -20.0), 8.0);
    scene
}

fn benchmark_scene_density(c: &mut Criterion) {
    let scene = scene();
    let builder = VoxelGridBuilder::new();
    let cloud_box = CloudBox::new(Vec3::ZERO, Vec3::splat(50.0));

    let mut group = c.benchmark_group("voxelize_scene");
    for side in [8, 16, 32] {
        let density = IntVec3::new(side, side, side);
        group.throughput(Throughput::Elements(density.volume() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &density, |b, &density| {
            b.iter(|| black_box(builder.build(Some(&scene), cloud_box, density)));
        });
    }
    group.finish();
}

fn benchmark_analytic_oracle(c: &mut Criterion) {
    // Sphere of radius 30: a probe hits when its end lies inside.
    let sphere = FnOracle(|_: Vec3, end: Vec3| end.length_squared() < 900.0);
    let oracle: &dyn GeometryOracle = &sphere;
    let builder = VoxelGridBuilder::new();
    let cloud_box = CloudBox::new(Vec3::ZERO, Vec3::splat(50.0));
    let density = IntVec3::new(64, 64, 64);

    let mut group = c.benchmark_group("voxelize_analytic");
    group.throughput(Throughput::Elements(density.volume() as u64));
    group.bench_function("64_cubed", |b| {
        b.iter(|| black_box(builder.build(Some(oracle), cloud_box, density)));
    });
    group.finish();
}

criterion_group!(benches, benchmark_scene_density, benchmark_analytic_oracle);
criterion_main!(benches);
