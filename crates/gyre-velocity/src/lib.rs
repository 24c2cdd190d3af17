//! Sampled velocity data: snapshot files, residency cache, and the sampler.
//!
//! A run's velocity input is a stack of text snapshots on the data grid at a
//! uniform cadence. [`SnapshotCache`] owns a bounded window of resident
//! snapshots; [`VelocitySampler`] borrows that window and serves
//! `v(x, y, t)` by bilinear spatial and linear temporal interpolation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod sampler;
pub mod snapshot;

pub use cache::SnapshotCache;
pub use sampler::{bilinear, VelocitySampler};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotError};
