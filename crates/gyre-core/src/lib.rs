//! Core types for the Gyre FTLE pipeline.
//!
//! This is the leaf crate with zero internal Gyre dependencies. It defines
//! the uniform grid description, the field containers every other crate
//! operates on, and the small amount of shared vocabulary (integration
//! direction, filename time stamps).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod grid;
pub mod time;

// Re-export core types at crate root for convenience.
pub use error::{FieldError, GridError};
pub use field::{PositionField, ScalarField, VectorField};
pub use grid::GridSpec;
pub use time::{format_time, time_decimals, Direction, StepSchedule};
