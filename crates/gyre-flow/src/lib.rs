//! Flow maps: advect one step, persist, compose.
//!
//! Phase A of a run advects the uniform output grid one output step at a
//! time ([`advect_step`]) and persists each end-position field through
//! [`StepMapStore`]. Phase B rebuilds finite-horizon flow maps by chaining
//! the persisted step maps with bilinear resampling ([`reconstruct`]) —
//! the compositional scheme of Brunton & Rowley (2010), which replaces
//! `O(N²)` re-advections with `O(N)` interpolation passes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod advect;
pub mod compose;
pub mod store;

pub use advect::{advect_step, substep_count};
pub use compose::reconstruct;
pub use store::{FlowMapError, StepMap, StepMapStore};
