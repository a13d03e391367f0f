//! Error types for field transfer.

use thiserror::Error;

/// Errors that can occur during old→new mesh field transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The source (old) mesh has no nodes to interpolate from.
    #[error("Source mesh has no nodes to interpolate from")]
    EmptySourceMesh,

    /// A referenced node is missing from its mesh.
    #[error("Node {id} referenced by element {element} is not in the source mesh")]
    DanglingNode {
        /// Missing node Id.
        id: adapt_types::EntityId,
        /// Element whose connectivity references it.
        element: adapt_types::EntityId,
    },
}

/// Result type for transfer operations.
pub type TransferResult<T> = std::result::Result<T, TransferError>;
