//! Error types for the mesh data model.

use thiserror::Error;

use crate::geometry::GeometryKind;
use crate::EntityId;

/// Errors that can occur while building or mutating the mesh model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Connectivity length does not match the geometry kind.
    #[error("Geometry {kind:?} expects {expected} nodes, got {actual}")]
    GeometryArity {
        /// Requested geometry kind.
        kind: GeometryKind,
        /// Node count the kind requires.
        expected: usize,
        /// Node count that was supplied.
        actual: usize,
    },

    /// Entity Ids must be positive; 0 is reserved.
    #[error("Entity Id 0 is not a valid Id")]
    ZeroId,

    /// A sub-mesh path did not resolve.
    #[error("Unknown sub-mesh: {path}")]
    UnknownSubMesh {
        /// Dotted path that failed to resolve.
        path: String,
    },

    /// A sub-mesh with the same name already exists at this level.
    #[error("Sub-mesh already exists: {path}")]
    DuplicateSubMesh {
        /// Dotted path of the clashing sub-mesh.
        path: String,
    },

    /// A historical step index beyond the buffer was addressed.
    #[error("History step {step} out of range (buffer size {buffer_size})")]
    StepOutOfRange {
        /// Requested steps-back index.
        step: usize,
        /// Configured history depth.
        buffer_size: usize,
    },

    /// A node referenced by connectivity is not in the mesh.
    #[error("Node {id} referenced by entity {entity} is not in the mesh")]
    DanglingNode {
        /// Missing node Id.
        id: EntityId,
        /// Entity whose connectivity references it.
        entity: EntityId,
    },
}

/// Result type for mesh model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
