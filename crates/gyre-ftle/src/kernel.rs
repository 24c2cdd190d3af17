//! The FTLE kernel: deformation gradient, Cauchy–Green tensor, exponent.

use rayon::prelude::*;

use gyre_core::{PositionField, ScalarField};

/// Value emitted for cells whose FTLE is undefined.
///
/// A cell is undefined when its own particle or any stencil neighbor's
/// particle left the domain at some composition step, or when the
/// Cauchy–Green eigenvalue degenerates to zero. Downstream consumers can
/// distinguish these cells from genuinely zero stretching.
pub const SENTINEL: f64 = f64::NAN;

/// Compute the FTLE field of a composed flow map.
///
/// For each cell the 2x2 deformation gradient is formed by centered
/// differences of the flow-map positions over the output grid (one-sided at
/// the domain boundary), the Cauchy–Green tensor `C = D^T D` is assembled,
/// and its larger eigenvalue is taken in closed form from trace and
/// determinant. With `T = |t_final - t_origin|`,
///
/// ```text
/// FTLE = ln(lambda_max) / (4 * T)
/// ```
///
/// A zero horizon (`T = 0`) yields exactly `0.0` at every cell. Undefined
/// cells carry [`SENTINEL`]. The cell loop is parallel and bit-deterministic
/// for any thread count.
pub fn ftle_field(map: &PositionField) -> ScalarField {
    let spec = *map.spec();
    let horizon = (map.current_time() - map.origin_time()).abs();
    if horizon == 0.0 {
        return ScalarField::zeros(spec);
    }

    let (nx, ny) = (spec.nx, spec.ny);
    let (dx, dy) = (spec.dx(), spec.dy());

    let values: Vec<f64> = (0..spec.cell_count())
        .into_par_iter()
        .map(|idx| {
            let i = idx / ny;
            let j = idx % ny;

            // Stencil indices; boundary cells fall back to one-sided spans.
            let im = i.saturating_sub(1);
            let ip = (i + 1).min(nx - 1);
            let jm = j.saturating_sub(1);
            let jp = (j + 1).min(ny - 1);

            if map.is_escaped(i, j)
                || map.is_escaped(im, j)
                || map.is_escaped(ip, j)
                || map.is_escaped(i, jm)
                || map.is_escaped(i, jp)
            {
                return SENTINEL;
            }

            let span_x = (ip - im) as f64 * dx;
            let span_y = (jp - jm) as f64 * dy;

            let xp = map.position(ip, j);
            let xm = map.position(im, j);
            let yp = map.position(i, jp);
            let ym = map.position(i, jm);

            // Deformation gradient D, row = output component, col = seed axis.
            let d11 = (xp[0] - xm[0]) / span_x;
            let d21 = (xp[1] - xm[1]) / span_x;
            let d12 = (yp[0] - ym[0]) / span_y;
            let d22 = (yp[1] - ym[1]) / span_y;

            // Cauchy-Green tensor C = D^T D, symmetric positive semi-definite.
            let c11 = d11 * d11 + d21 * d21;
            let c12 = d11 * d12 + d21 * d22;
            let c22 = d12 * d12 + d22 * d22;

            let trace = c11 + c22;
            let det = c11 * c22 - c12 * c12;
            // Rounding can push the discriminant of a near-isotropic tensor
            // marginally negative.
            let disc = (trace * trace - 4.0 * det).max(0.0);
            let lambda_max = 0.5 * (trace + disc.sqrt());

            if lambda_max <= 0.0 {
                SENTINEL
            } else {
                lambda_max.ln() / (4.0 * horizon)
            }
        })
        .collect();

    ScalarField::from_vec(spec, values).expect("one value per cell")
}
