//! Analytic velocity fields.

use std::f64::consts::PI;

use gyre_core::{GridSpec, VectorField};

/// The standard double-gyre flow on `[0, 2] x [0, 1]`.
///
/// Two counter-rotating cells whose separatrix oscillates about `x = 1`:
///
/// ```text
/// u = -pi A sin(pi f(x, t)) cos(pi y)
/// v =  pi A cos(pi f(x, t)) sin(pi y) df/dx
/// f(x, t) = eps sin(omega t) x^2 + (1 - 2 eps sin(omega t)) x
/// ```
///
/// The domain boundary is invariant (no normal flow), so particles seeded
/// inside stay inside up to integrator error. With `epsilon = 0` the flow
/// is autonomous and symmetric under reflection about `y = 1/2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoubleGyre {
    /// Velocity amplitude `A`.
    pub amplitude: f64,
    /// Angular frequency of the gyre oscillation.
    pub omega: f64,
    /// Oscillation strength `eps`; `0` freezes the separatrix.
    pub epsilon: f64,
}

impl Default for DoubleGyre {
    /// The parameters used throughout the literature and this test suite:
    /// `A = 0.1`, `omega = 2 pi / 10`, `eps = 0.25`.
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            omega: 2.0 * PI / 10.0,
            epsilon: 0.25,
        }
    }
}

impl DoubleGyre {
    /// Velocity at `(x, y, t)`.
    pub fn velocity(&self, x: f64, y: f64, t: f64) -> [f64; 2] {
        let a = self.epsilon * (self.omega * t).sin();
        let f = a * x * x + (1.0 - 2.0 * a) * x;
        let dfdx = 2.0 * a * x + 1.0 - 2.0 * a;
        [
            -PI * self.amplitude * (PI * f).sin() * (PI * y).cos(),
            PI * self.amplitude * (PI * f).cos() * (PI * y).sin() * dfdx,
        ]
    }

    /// Sample the flow onto a grid at time `t`.
    pub fn sample_on(&self, spec: GridSpec, t: f64) -> VectorField {
        let mut field = VectorField::zeros(spec);
        for i in 0..spec.nx {
            for j in 0..spec.ny {
                let [x, y] = spec.node(i, j);
                let idx = spec.index(i, j);
                field.values_mut()[idx] = self.velocity(x, y, t);
            }
        }
        field
    }
}
