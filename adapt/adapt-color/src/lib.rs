//! Sub-domain membership coloring.
//!
//! A remeshing pass replaces every entity of a mesh, which destroys the
//! sub-mesh groupings attached to them. This crate assigns a small integer
//! "color" to every unique combination of sub-mesh memberships so that the
//! groupings can be reconstructed after the replacement: colors ride
//! through the remeshing kernel as per-entity reference tags, and the
//! color→paths map turns them back into sub-mesh membership.
//!
//! # Example
//!
//! ```
//! use adapt_color::compute_colors;
//! use adapt_types::{MeshDimension, Node, SimMesh};
//!
//! let mut mesh = SimMesh::new(MeshDimension::Two, 1);
//! mesh.add_node(Node::from_coords(1, 0.0, 0.0, 0.0, 1));
//! mesh.add_node(Node::from_coords(2, 1.0, 0.0, 0.0, 1));
//! mesh.create_submesh("Inlet")?.add_node(1);
//!
//! let colors = compute_colors(&mesh)?;
//! assert_ne!(colors.node_color(1), 0);
//! assert_eq!(colors.node_color(2), 0); // main mesh only
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod color;
mod error;

pub use color::{compute_colors, ColorAssignment, ColorId};
pub use error::{ColorError, ColorResult};
