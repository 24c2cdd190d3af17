//! Finite-Time Lyapunov Exponent extraction.
//!
//! Given a composed flow map over the output grid, [`ftle_field`] derives
//! the largest singular value of the local deformation gradient by finite
//! differences and turns it into the FTLE scalar; [`write_ftle`] emits the
//! field in the run's text output format.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod kernel;
pub mod output;

pub use kernel::{ftle_field, SENTINEL};
pub use output::write_ftle;
