//! Space-time interpolation of velocity snapshots.

use gyre_core::VectorField;

use crate::snapshot::Snapshot;

/// Bilinearly interpolate a vector field at physical coordinates `(x, y)`.
///
/// Sample positions outside the field's domain are clamped to the boundary,
/// so this never fails. The base cell index is clamped to `[0, n - 2]` on
/// each axis and the weights to `[0, 1]`; at an exact grid line the
/// lower-indexed cell wins. The weighted form `(1 - w) * a + w * b` is used
/// so sampling exactly on a node reproduces the stored value bit-for-bit.
pub fn bilinear(field: &VectorField, x: f64, y: f64) -> [f64; 2] {
    let spec = field.spec();

    // Fractional cell coordinates, clamped into the node range.
    let fx = ((x - spec.x_min) / spec.dx()).clamp(0.0, (spec.nx - 1) as f64);
    let fy = ((y - spec.y_min) / spec.dy()).clamp(0.0, (spec.ny - 1) as f64);

    let i0 = (fx.floor() as usize).min(spec.nx - 2);
    let j0 = (fy.floor() as usize).min(spec.ny - 2);
    let wx = (fx - i0 as f64).clamp(0.0, 1.0);
    let wy = (fy - j0 as f64).clamp(0.0, 1.0);

    let v00 = field.get(i0, j0);
    let v10 = field.get(i0 + 1, j0);
    let v01 = field.get(i0, j0 + 1);
    let v11 = field.get(i0 + 1, j0 + 1);

    let mut out = [0.0; 2];
    for c in 0..2 {
        let lo = (1.0 - wx) * v00[c] + wx * v10[c];
        let hi = (1.0 - wx) * v01[c] + wx * v11[c];
        out[c] = (1.0 - wy) * lo + wy * hi;
    }
    out
}

/// Serves `v(x, y, t)` from a window of consecutive resident snapshots.
///
/// Borrowed from [`SnapshotCache::sampler`](crate::SnapshotCache::sampler)
/// after the cache has made the integration span resident. The borrow is
/// immutable and the sampler is `Sync`, so cell-parallel kernels can share
/// one sampler freely.
pub struct VelocitySampler<'a> {
    snaps: Vec<&'a Snapshot>,
    t_first: f64,
    dt_data: f64,
}

impl<'a> VelocitySampler<'a> {
    /// Build a sampler over consecutive snapshots starting at `t_first`.
    ///
    /// `snaps` must hold at least two snapshots at the cadence `dt_data`.
    /// Callers normally obtain a sampler from
    /// [`SnapshotCache::sampler`](crate::SnapshotCache::sampler); this
    /// constructor exists for in-memory snapshot windows.
    pub fn new(snaps: Vec<&'a Snapshot>, t_first: f64, dt_data: f64) -> Self {
        debug_assert!(snaps.len() >= 2);
        Self {
            snaps,
            t_first,
            dt_data,
        }
    }

    /// Velocity at `(x, y, t)`.
    ///
    /// `t` is clamped into the resident window; positions are clamped to the
    /// domain per [`bilinear`]. If `t` coincides with a snapshot time the
    /// temporal weight is exactly 0 or 1 and that snapshot's field is used
    /// verbatim.
    pub fn sample(&self, x: f64, y: f64, t: f64) -> [f64; 2] {
        let rel = (t - self.t_first) / self.dt_data;
        let k = (rel.floor().max(0.0) as usize).min(self.snaps.len() - 2);
        let w = (rel - k as f64).clamp(0.0, 1.0);

        let a = bilinear(&self.snaps[k].field, x, y);
        let b = bilinear(&self.snaps[k + 1].field, x, y);
        [
            (1.0 - w) * a[0] + w * b[0],
            (1.0 - w) * a[1] + w * b[1],
        ]
    }
}
