//! Single-step advection throughput.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use gyre_bench::{bench_grid, double_gyre_snapshots};
use gyre_core::PositionField;
use gyre_flow::advect_step;
use gyre_velocity::VelocitySampler;

fn bench_advect(c: &mut Criterion) {
    let data_spec = bench_grid(256, 128);
    let snaps = double_gyre_snapshots(data_spec, &[0.0, 0.2]);
    let sampler = VelocitySampler::new(snaps.iter().collect(), 0.0, 0.2);

    let mut group = c.benchmark_group("advect_one_step");
    for (nx, ny) in [(128usize, 64usize), (256, 128), (512, 256)] {
        let out_spec = bench_grid(nx, ny);
        group.bench_function(format!("{nx}x{ny}"), |b| {
            b.iter_batched(
                || PositionField::uniform(out_spec, 0.0),
                |mut field| {
                    advect_step(&mut field, &sampler, 0.2, 0.2);
                    field
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advect);
criterion_main!(benches);
