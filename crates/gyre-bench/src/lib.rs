//! Shared fixtures for the Gyre benchmarks.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use gyre_core::{GridSpec, PositionField};
use gyre_test_utils::DoubleGyre;
use gyre_velocity::Snapshot;

/// The benchmark domain: the double gyre's `[0, 2] x [0, 1]`.
pub fn bench_grid(nx: usize, ny: usize) -> GridSpec {
    GridSpec::new(nx, ny, 0.0, 2.0, 0.0, 1.0).expect("valid bench grid")
}

/// Double-gyre snapshots at the given times.
pub fn double_gyre_snapshots(spec: GridSpec, times: &[f64]) -> Vec<Snapshot> {
    let gyre = DoubleGyre::default();
    times
        .iter()
        .map(|&t| Snapshot {
            t,
            field: gyre.sample_on(spec, t),
        })
        .collect()
}

/// A smoothly deformed position field for kernel benchmarks: each seed is
/// displaced by a swirl that stays inside the domain.
pub fn swirled_positions(spec: GridSpec, horizon: f64) -> PositionField {
    let mut map = PositionField::uniform(spec, 0.0);
    {
        let (positions, _) = map.cells_mut();
        for cell in positions.iter_mut() {
            let [x, y] = *cell;
            let sx = (std::f64::consts::PI * x / 2.0).sin();
            let sy = (std::f64::consts::PI * y).sin();
            *cell = [x + 0.05 * sx * sy, y - 0.03 * sx * sy];
        }
    }
    map.set_current_time(horizon);
    map
}
