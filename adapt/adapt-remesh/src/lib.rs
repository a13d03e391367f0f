//! Anisotropic mesh adaptation pipeline.
//!
//! Drives a full remeshing pass over a [`adapt_types::SimMesh`]:
//!
//! 1. **Tag**: color every entity by its sub-mesh membership
//!    (`adapt-color`), after snapshotting flags into a hidden sub-mesh
//!    ([`snapshot`]).
//! 2. **Export**: flatten the live mesh into the kernel representation,
//!    overwriting entity Ids with contiguous 1-based indices
//!    ([`export`]).
//! 3. **Invoke**: hand mesh + adaptation field to a black-box
//!    [`adapt_kernel::RemeshKernel`] through a drop-guarded session.
//! 4. **Reconstruct**: rebuild nodes, elements, conditions, DOFs and
//!    sub-mesh membership from the kernel output ([`reconstruct`]).
//! 5. **Interpolate**: transfer historical field data from the intact
//!    old mesh onto the new nodes (`adapt-transfer`), with Lagrangian
//!    position bookkeeping around the search.
//! 6. **Clean up**: contiguous Ids, duplicate/superfluous entity
//!    removal, flag restore, buffer release ([`cleanup`]).
//!
//! Entry point: [`RemeshingProcess`], configured by [`RemeshingParams`].

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod cleanup;
mod error;
pub mod export;
pub mod io;
mod params;
mod pipeline;
pub mod reconstruct;
mod result;
pub mod snapshot;

pub use error::{RemeshingError, RemeshingResult};
pub use export::{ExportedMesh, Prototype, ReferenceTable};
pub use params::{Framework, IsoSurfaceParams, RemeshingParams};
pub use pipeline::RemeshingProcess;
pub use reconstruct::RebuildOutcome;
pub use result::RemeshingReport;

// the kernel-facing vocabulary is part of this crate's public surface
pub use adapt_kernel::{Discretization, MidpointKernel, PassthroughKernel, RemeshKernel};
