//! Gyre: Finite-Time Lyapunov Exponent fields over sampled 2-D velocity
//! data, computed by unidirectional composition of step flow maps.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Gyre sub-crates. For most users, adding `gyre` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use gyre::prelude::*;
//!
//! let config = RunConfig::load(Path::new("gyre.toml"))?;
//! let paths = RunPaths::under(Path::new("."));
//! let summary = gyre::engine::run(&config, &paths)?;
//! println!("{} FTLE fields written", summary.ftle_fields);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gyre-core` | Grids, fields, direction, schedules |
//! | [`velocity`] | `gyre-velocity` | Snapshot format, cache, sampler |
//! | [`flow`] | `gyre-flow` | Advection, step-map store, composition |
//! | [`ftle`] | `gyre-ftle` | FTLE kernel and output writer |
//! | [`engine`] | `gyre-engine` | Configuration and the run orchestrator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Grid metadata, field storage, and core vocabulary (`gyre-core`).
pub use gyre_core as types;

/// Velocity snapshots, the residency cache, and the space-time sampler
/// (`gyre-velocity`).
pub use gyre_velocity as velocity;

/// The flow-map pipeline: advection, persistence, composition (`gyre-flow`).
pub use gyre_flow as flow;

/// FTLE extraction and output (`gyre-ftle`).
pub use gyre_ftle as ftle;

/// Run configuration and the two-phase orchestrator (`gyre-engine`).
pub use gyre_engine as engine;

/// Common imports for typical Gyre usage.
///
/// ```rust
/// use gyre::prelude::*;
/// ```
pub mod prelude {
    // Core vocabulary
    pub use gyre_core::{Direction, GridSpec, PositionField, ScalarField, StepSchedule, VectorField};

    // Velocity input
    pub use gyre_velocity::{SnapshotCache, VelocitySampler};

    // Flow maps
    pub use gyre_flow::{advect_step, reconstruct, StepMapStore};

    // FTLE
    pub use gyre_ftle::{ftle_field, write_ftle};

    // Orchestration
    pub use gyre_engine::{run, run_with, RunConfig, RunPaths, RunSummary};
}
