//! Core simulation mesh data model for the adaptive remeshing pipeline.
//!
//! This crate owns the in-memory representation the rest of the `adapt-*`
//! family operates on:
//!
//! - [`SimMesh`]: nodes + elements + conditions + nested sub-mesh groupings
//! - [`Node`]: positions (initial and current), flags, DOFs, field history
//! - [`Element`] / [`Condition`]: fixed-kind geometry over non-owning node
//!   Ids, shared [`Properties`], entity-local data
//! - [`SubMesh`]: named, non-owning Id groupings used to scope physics and
//!   boundary data
//! - [`EntityFlags`]: boolean entity state that the remeshing pipeline
//!   snapshots and restores across a full mesh replacement
//!
//! # Example
//!
//! ```
//! use adapt_types::{Element, Geometry, GeometryKind, MeshDimension, Node, SimMesh};
//!
//! let mut mesh = SimMesh::new(MeshDimension::Two, 2);
//! mesh.add_node(Node::from_coords(1, 0.0, 0.0, 0.0, 2));
//! mesh.add_node(Node::from_coords(2, 1.0, 0.0, 0.0, 2));
//! mesh.add_node(Node::from_coords(3, 0.0, 1.0, 0.0, 2));
//! mesh.add_element(Element::new(
//!     1,
//!     Geometry::new(GeometryKind::Triangle3, [1, 2, 3])?,
//!     1,
//! ));
//!
//! mesh.create_submesh("Domain")?.add_element(1);
//! assert!(mesh.submesh("Domain").is_some_and(|s| s.contains_element(1)));
//! # Ok::<(), adapt_types::ModelError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod container;
mod entity;
mod error;
pub mod field;
mod flags;
mod geometry;
mod mesh;
mod node;
mod submesh;

/// Unique positive entity identifier (0 is reserved).
pub type EntityId = u32;

/// Identifier of a shared [`Properties`] block.
pub type PropertiesId = u32;

pub use container::{EntityVec, HasId};
pub use entity::{Condition, Element, Properties};
pub use error::{ModelError, ModelResult};
pub use field::{fields, Dof, FieldFrame, FieldValue, NodalHistory};
pub use flags::{flag_by_name, EntityFlags, PERSISTENT_FLAGS};
pub use geometry::{Geometry, GeometryKind, MeshDimension};
pub use mesh::{ProcessInfo, SimMesh};
pub use node::Node;
pub use submesh::SubMesh;
