//! Test fixtures for the Gyre pipeline.
//!
//! The original system synthesized its own velocity input from analytic
//! flows; this crate carries that generator. [`DoubleGyre`] is the standard
//! oscillating two-cell flow used throughout the test suite, and the
//! synthesis helpers write snapshot stacks in the run input format.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod analytic;
pub mod synth;

pub use analytic::DoubleGyre;
pub use synth::{write_double_gyre_snapshots, write_random_snapshots};
