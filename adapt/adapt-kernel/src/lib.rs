//! Flat mesh representation and invocation session for remeshing kernels.
//!
//! The remeshing kernel is an external collaborator: it consumes a flat,
//! index-based mesh plus a per-node adaptation field and returns a new flat
//! mesh with per-entity reference tags, required bits and removal lists.
//! This crate defines that contract:
//!
//! - [`FlatMesh`] / [`FlatBlock`]: the kernel-side mesh, partitioned into
//!   homogeneous connectivity blocks per geometry sub-type
//! - [`AdaptionField`]: the sizing metric or level-set signal
//! - [`RemeshKernel`]: the black-box kernel trait
//! - [`KernelSession`]: exclusive owner of the kernel buffers across the
//!   pipeline stages, with a drop-guaranteed release
//! - [`PassthroughKernel`] / [`MidpointKernel`]: deterministic built-in
//!   collaborators for tests and demos
//!
//! # Example
//!
//! ```
//! use adapt_kernel::{
//!     AdaptionField, FlatMesh, KernelConfig, KernelSession, PassthroughKernel,
//! };
//! use adapt_types::MeshDimension;
//!
//! let mut mesh = FlatMesh::for_dimension(MeshDimension::Two);
//! mesh.add_node([0.0, 0.0, 0.0], 0, false);
//! mesh.add_node([1.0, 0.0, 0.0], 0, false);
//! mesh.add_node([0.0, 1.0, 0.0], 0, false);
//! mesh.push_element(0, &[1, 2, 3], 0, false)?;
//!
//! let mut session = KernelSession::new(KernelConfig::default());
//! session.set_mesh(mesh);
//! session.set_field(AdaptionField::Metric(vec![0.5; 3]));
//! session.check()?;
//! session.invoke(&PassthroughKernel)?;
//!
//! assert_eq!(session.output()?.mesh.node_count(), 3);
//! # Ok::<(), adapt_kernel::KernelError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod flat;
mod kernel;
mod midpoint;
mod passthrough;
mod session;

pub use error::{KernelError, KernelResult};
pub use flat::{AdaptionField, DiscardedEntities, FlatBlock, FlatMesh, RefTag};
pub use kernel::{Discretization, KernelConfig, KernelOutput, RemeshKernel};
pub use midpoint::MidpointKernel;
pub use passthrough::PassthroughKernel;
pub use session::KernelSession;
