//! Fixed-step RK4 advection of a particle grid.

use rayon::prelude::*;

use gyre_core::PositionField;
use gyre_velocity::VelocitySampler;

/// Number of RK4 substeps for one output step.
///
/// Substeps are sized to the data cadence so stage times land on or inside
/// snapshot intervals, which keeps the temporal interpolation error of each
/// stage small. When the output step is finer than the cadence this
/// degenerates to a single substep of size `dt_step`.
pub fn substep_count(dt_step: f64, dt_data: f64) -> usize {
    ((dt_step.abs() / dt_data).ceil() as usize).max(1)
}

/// Advance every particle in `field` by exactly `dt_step` (signed).
///
/// Each cell integrates independently with classical RK4 substeps of size
/// `dt_step / substep_count(..)`, evaluating the velocity sampler at the
/// stage positions and times. The caller must have made the whole span
/// `[t, t + dt_step]` resident in the snapshot cache beforehand.
///
/// Afterwards the field's current time advances by `dt_step` and the escape
/// mask is updated: any cell whose position left the domain rectangle is
/// marked, and marks are sticky. Positions are stored unclamped.
///
/// The cell loop is parallel; cells share only the read-only sampler, so the
/// result is bit-identical for any thread count.
pub fn advect_step(
    field: &mut PositionField,
    sampler: &VelocitySampler<'_>,
    dt_step: f64,
    dt_data: f64,
) {
    let n_sub = substep_count(dt_step, dt_data);
    let h = dt_step / n_sub as f64;
    let spec = *field.spec();
    let t_start = field.current_time();

    let (positions, escaped) = field.cells_mut();
    positions
        .par_iter_mut()
        .zip_eq(escaped.par_iter_mut())
        .for_each(|(pos, esc)| {
            let [mut x, mut y] = *pos;
            for s in 0..n_sub {
                let t = t_start + s as f64 * h;
                let [k1x, k1y] = sampler.sample(x, y, t);
                let [k2x, k2y] =
                    sampler.sample(x + 0.5 * h * k1x, y + 0.5 * h * k1y, t + 0.5 * h);
                let [k3x, k3y] =
                    sampler.sample(x + 0.5 * h * k2x, y + 0.5 * h * k2y, t + 0.5 * h);
                let [k4x, k4y] = sampler.sample(x + h * k3x, y + h * k3y, t + h);
                x += h / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x);
                y += h / 6.0 * (k1y + 2.0 * k2y + 2.0 * k3y + k4y);
            }
            *pos = [x, y];
            if !spec.contains(x, y) {
                *esc = true;
            }
        });

    field.set_current_time(t_start + dt_step);
}
