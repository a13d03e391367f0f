//! Error types for kernel invocation.

use adapt_types::GeometryKind;
use thiserror::Error;

/// Errors that can occur while assembling kernel input or invoking a kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    /// No mesh was handed to the session.
    #[error("No mesh set on the kernel session")]
    MissingMesh,

    /// No adaption field was handed to the session.
    #[error("No adaption field set on the kernel session")]
    MissingField,

    /// The session has not produced output yet.
    #[error("Kernel session has no output (invoke it first)")]
    MissingOutput,

    /// An array length does not match the declared entity count.
    #[error("Size mismatch in {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Which array disagrees.
        what: &'static str,
        /// Length implied by the mesh counts.
        expected: usize,
        /// Length actually stored.
        actual: usize,
    },

    /// Connectivity length does not match the block's geometry kind.
    #[error("Connectivity for {kind:?} expects {expected} nodes, got {actual}")]
    ConnectivityArity {
        /// Geometry kind of the block.
        kind: GeometryKind,
        /// Node count the kind requires.
        expected: usize,
        /// Node count that was supplied.
        actual: usize,
    },

    /// A connectivity index is outside the 1-based node range.
    #[error("Node index {index} out of range (mesh has {count} nodes)")]
    NodeOutOfRange {
        /// Offending 1-based index.
        index: u32,
        /// Node count of the mesh.
        count: usize,
    },

    /// The kernel itself failed; fatal to the whole remeshing pass.
    #[error("Remeshing kernel '{kernel}' failed: {message}")]
    KernelFailure {
        /// Kernel name.
        kernel: String,
        /// Kernel-reported failure text.
        message: String,
    },

    /// The kernel does not support the mesh dimension it was handed.
    #[error("Kernel '{kernel}' does not support this mesh dimension")]
    UnsupportedDimension {
        /// Kernel name.
        kernel: String,
    },
}

/// Result type for kernel operations.
pub type KernelResult<T> = std::result::Result<T, KernelError>;
