//! Error types for the remeshing pipeline.

use std::path::PathBuf;

use thiserror::Error;

use adapt_types::EntityId;

/// Errors that can abort a remeshing pass.
///
/// Warned-and-recovered situations (node-only sub-meshes, unsupported
/// geometry kinds, duplicated conditions) never surface here; they are
/// logged and the pass continues with the documented degraded behavior.
#[derive(Debug, Error)]
pub enum RemeshingError {
    /// Configuration rejected before any mesh mutation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The mesh has nothing to remesh.
    #[error("Mesh has no nodes to remesh")]
    EmptyMesh,

    /// A node lacks a field the configuration requires.
    #[error("Node {id} is missing required field '{field}'")]
    MissingField {
        /// Offending node Id.
        id: EntityId,
        /// Field name the configuration asked for.
        field: String,
    },

    /// Mesh model error.
    #[error(transparent)]
    Model(#[from] adapt_types::ModelError),

    /// Coloring error.
    #[error(transparent)]
    Color(#[from] adapt_color::ColorError),

    /// Kernel assembly or invocation error (fatal to the pass).
    #[error(transparent)]
    Kernel(#[from] adapt_kernel::KernelError),

    /// Field transfer error.
    #[error(transparent)]
    Transfer(#[from] adapt_transfer::TransferError),

    /// Artifact writing failed.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for remeshing operations.
pub type RemeshingResult<T> = std::result::Result<T, RemeshingError>;
