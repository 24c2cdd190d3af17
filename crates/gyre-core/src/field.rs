//! Field containers over a [`GridSpec`].
//!
//! Three containers cover every value the pipeline moves around: scalars
//! (FTLE output), 2-vectors (velocity snapshots, displacement fields), and
//! particle positions with time stamps and a sticky escape mask.

use crate::error::FieldError;
use crate::grid::GridSpec;

/// A scalar value per grid node, x-major flat storage.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    spec: GridSpec,
    data: Vec<f64>,
}

impl ScalarField {
    /// Zero-filled field over `spec`.
    pub fn zeros(spec: GridSpec) -> Self {
        Self {
            data: vec![0.0; spec.cell_count()],
            spec,
        }
    }

    /// Wrap existing storage, checking the length against the grid.
    pub fn from_vec(spec: GridSpec, data: Vec<f64>) -> Result<Self, FieldError> {
        if data.len() != spec.cell_count() {
            return Err(FieldError::LengthMismatch {
                expected: spec.cell_count(),
                got: data.len(),
            });
        }
        Ok(Self { spec, data })
    }

    /// Grid this field is defined over.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Flat value storage.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Value at node `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.spec.index(i, j)]
    }
}

/// A 2-vector per grid node, x-major flat storage.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorField {
    spec: GridSpec,
    data: Vec<[f64; 2]>,
}

impl VectorField {
    /// Zero-filled field over `spec`.
    pub fn zeros(spec: GridSpec) -> Self {
        Self {
            data: vec![[0.0; 2]; spec.cell_count()],
            spec,
        }
    }

    /// Wrap existing storage, checking the length against the grid.
    pub fn from_vec(spec: GridSpec, data: Vec<[f64; 2]>) -> Result<Self, FieldError> {
        if data.len() != spec.cell_count() {
            return Err(FieldError::LengthMismatch {
                expected: spec.cell_count(),
                got: data.len(),
            });
        }
        Ok(Self { spec, data })
    }

    /// Grid this field is defined over.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Flat value storage.
    pub fn values(&self) -> &[[f64; 2]] {
        &self.data
    }

    /// Mutable flat value storage.
    pub fn values_mut(&mut self) -> &mut [[f64; 2]] {
        &mut self.data
    }

    /// Vector at node `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> [f64; 2] {
        self.data[self.spec.index(i, j)]
    }
}

/// Particle positions seeded on the output grid, advanced through time.
///
/// Cell `(i, j)` holds the current location of the particle that sat at grid
/// node `(i, j)` at the origin time `t0`. Positions are stored unclamped;
/// consumers clamp to the domain rectangle when they use a position as an
/// interpolation site. The escape mask is sticky: once a particle leaves the
/// domain its cell stays marked for the rest of the run and surfaces in the
/// FTLE output as the sentinel value.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionField {
    spec: GridSpec,
    positions: Vec<[f64; 2]>,
    escaped: Vec<bool>,
    t0: f64,
    t: f64,
}

impl PositionField {
    /// Seed particles on the grid nodes at time `t`.
    pub fn uniform(spec: GridSpec, t: f64) -> Self {
        let mut positions = Vec::with_capacity(spec.cell_count());
        for i in 0..spec.nx {
            for j in 0..spec.ny {
                positions.push(spec.node(i, j));
            }
        }
        Self {
            escaped: vec![false; spec.cell_count()],
            positions,
            spec,
            t0: t,
            t,
        }
    }

    /// Re-seed every particle on its grid node at time `t`, clearing the
    /// escape mask.
    pub fn reset_to_uniform(&mut self, t: f64) {
        for i in 0..self.spec.nx {
            for j in 0..self.spec.ny {
                self.positions[self.spec.index(i, j)] = self.spec.node(i, j);
            }
        }
        self.escaped.fill(false);
        self.t0 = t;
        self.t = t;
    }

    /// Grid the particles were seeded on.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Time at which this field was the uniform grid.
    pub fn origin_time(&self) -> f64 {
        self.t0
    }

    /// Current time along the integration.
    pub fn current_time(&self) -> f64 {
        self.t
    }

    /// Set the current time (the advector calls this after a step).
    pub fn set_current_time(&mut self, t: f64) {
        self.t = t;
    }

    /// Current particle positions.
    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }

    /// Sticky escape mask, one flag per cell.
    pub fn escaped(&self) -> &[bool] {
        &self.escaped
    }

    /// Position of the particle seeded at node `(i, j)`.
    pub fn position(&self, i: usize, j: usize) -> [f64; 2] {
        self.positions[self.spec.index(i, j)]
    }

    /// Whether the particle seeded at node `(i, j)` has left the domain.
    pub fn is_escaped(&self, i: usize, j: usize) -> bool {
        self.escaped[self.spec.index(i, j)]
    }

    /// Simultaneous mutable access to positions and escape mask, for the
    /// cell-parallel kernels.
    pub fn cells_mut(&mut self) -> (&mut [[f64; 2]], &mut [bool]) {
        (&mut self.positions, &mut self.escaped)
    }

    /// Number of escaped particles.
    pub fn escaped_count(&self) -> usize {
        self.escaped.iter().filter(|&&e| e).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GridSpec {
        GridSpec::new(3, 4, 0.0, 2.0, 0.0, 3.0).unwrap()
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        let err = ScalarField::from_vec(spec(), vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            FieldError::LengthMismatch {
                expected: 12,
                got: 5
            }
        );
        assert!(VectorField::from_vec(spec(), vec![[0.0; 2]; 13]).is_err());
    }

    #[test]
    fn uniform_positions_match_grid_nodes() {
        let p = PositionField::uniform(spec(), 1.5);
        assert_eq!(p.origin_time(), 1.5);
        assert_eq!(p.current_time(), 1.5);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(p.position(i, j), p.spec().node(i, j));
                assert!(!p.is_escaped(i, j));
            }
        }
    }

    #[test]
    fn reset_clears_positions_mask_and_times() {
        let mut p = PositionField::uniform(spec(), 0.0);
        {
            let (pos, mask) = p.cells_mut();
            pos[0] = [99.0, 99.0];
            mask[0] = true;
        }
        p.set_current_time(4.0);
        assert_eq!(p.escaped_count(), 1);

        p.reset_to_uniform(4.0);
        assert_eq!(p.position(0, 0), [0.0, 0.0]);
        assert_eq!(p.escaped_count(), 0);
        assert_eq!(p.origin_time(), 4.0);
        assert_eq!(p.current_time(), 4.0);
    }

    #[test]
    fn scalar_indexing_is_x_major() {
        let g = spec();
        let data: Vec<f64> = (0..g.cell_count()).map(|k| k as f64).collect();
        let f = ScalarField::from_vec(g, data).unwrap();
        assert_eq!(f.get(0, 0), 0.0);
        assert_eq!(f.get(0, 3), 3.0);
        assert_eq!(f.get(1, 0), 4.0);
        assert_eq!(f.get(2, 3), 11.0);
    }
}
