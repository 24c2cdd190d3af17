//! FTLE kernel throughput.

use criterion::{criterion_group, criterion_main, Criterion};

use gyre_bench::{bench_grid, swirled_positions};
use gyre_ftle::ftle_field;

fn bench_ftle(c: &mut Criterion) {
    let mut group = c.benchmark_group("ftle_field");
    for (nx, ny) in [(128usize, 64usize), (256, 128), (512, 256)] {
        let map = swirled_positions(bench_grid(nx, ny), 2.0);
        group.bench_function(format!("{nx}x{ny}"), |b| {
            b.iter(|| ftle_field(&map))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ftle);
criterion_main!(benches);
