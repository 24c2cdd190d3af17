//! Error types shared across the Gyre workspace.

use std::error::Error;
use std::fmt;

/// Errors from [`GridSpec`](crate::GridSpec) construction.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// An axis has fewer than two nodes, so the node spacing is undefined.
    TooFewNodes {
        /// Which axis (`"x"` or `"y"`).
        axis: &'static str,
        /// The offending node count.
        count: usize,
    },
    /// An axis extent is empty, inverted, or non-finite.
    BadExtent {
        /// Which axis (`"x"` or `"y"`).
        axis: &'static str,
        /// Lower bound of the extent.
        min: f64,
        /// Upper bound of the extent.
        max: f64,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewNodes { axis, count } => {
                write!(f, "{axis} axis needs at least 2 nodes, got {count}")
            }
            Self::BadExtent { axis, min, max } => {
                write!(f, "{axis} axis extent [{min}, {max}] is not a valid interval")
            }
        }
    }
}

impl Error for GridError {}

/// Errors from field construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// Backing storage does not match the grid's cell count.
    LengthMismatch {
        /// Cell count implied by the grid.
        expected: usize,
        /// Length of the supplied storage.
        got: usize,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, got } => {
                write!(f, "field storage has {got} cells, grid has {expected}")
            }
        }
    }
}

impl Error for FieldError {}
