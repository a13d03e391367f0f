//! Error types for the coloring engine.

use thiserror::Error;

/// Errors that can occur while computing colors.
#[derive(Debug, Error)]
pub enum ColorError {
    /// A sub-mesh path reported by the mesh failed to resolve again.
    ///
    /// This can only happen when the sub-mesh tree is mutated while a
    /// coloring pass is reading it.
    #[error("Sub-mesh {path} disappeared during coloring")]
    SubMeshVanished {
        /// Dotted path that no longer resolves.
        path: String,
    },
}

/// Result type for coloring operations.
pub type ColorResult<T> = std::result::Result<T, ColorError>;
