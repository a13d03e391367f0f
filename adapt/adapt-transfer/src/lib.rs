//! Old→new mesh field transfer for the adaptive remeshing pipeline.
//!
//! After a remeshing pass replaces every entity of a mesh, the new nodes
//! carry no solution data. This crate locates each new node in the intact
//! old mesh (kd-tree candidate search + barycentric containment) and
//! interpolates every historical field frame (and optionally the
//! non-historical values) from the containing element's shape functions.
//! Points that land outside the old mesh fall back to nearest-node copying
//! or clamped extrapolation, depending on policy.
//!
//! Determinism: identical old mesh + identical query positions produce
//! identical results; the parallel per-node phase only computes values,
//! and all mutation happens in one sequential sweep.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod interpolate;
mod locate;

pub use error::{TransferError, TransferResult};
pub use interpolate::{
    interpolate_nodal_values, transfer_element_data, TransferParams, TransferReport,
};
pub use locate::{
    tetrahedron_weights, triangle_weights, ElementLocator, Located, Weights,
};
