//! The remeshing kernel contract.

use crate::error::KernelResult;
use crate::flat::{AdaptionField, DiscardedEntities, FlatMesh};

/// How the kernel discretizes the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discretization {
    /// Follow a sizing metric.
    #[default]
    Standard,
    /// Split the mesh along the zero level-set of a scalar field.
    IsoSurface,
}

/// Configuration forwarded to the kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Global target entity size.
    pub target_size: f64,
    /// Optional cap on the number of produced entities.
    pub target_entity_count: Option<usize>,
    /// Diagnostic verbosity (0 = quiet).
    pub echo_level: u8,
    /// Discretization mode.
    pub discretization: Discretization,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            target_size: 1.0,
            target_entity_count: None,
            echo_level: 0,
            discretization: Discretization::Standard,
        }
    }
}

/// Everything a kernel returns: the new mesh plus its removal lists.
#[derive(Debug, Clone)]
pub struct KernelOutput {
    /// The new flat mesh, with per-entity reference tags and required bits.
    pub mesh: FlatMesh,
    /// Entities of the new mesh the kernel flags for removal.
    pub discarded: DiscardedEntities,
}

/// A black-box remeshing kernel.
///
/// The kernel consumes an exported mesh and an adaptation field and
/// produces a new mesh honoring the field; it knows nothing about DOFs,
/// nodal data or sub-domains. Reference tags are opaque to it and must be
/// propagated onto the entities of the output.
///
/// A kernel-internal failure is fatal to the whole remeshing pass; there
/// is no partial retry.
pub trait RemeshKernel {
    /// Kernel name for diagnostics.
    fn name(&self) -> &'static str;

    /// Produce a new mesh from the input mesh and adaptation field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KernelError::KernelFailure`] (or a more specific
    /// variant) on any non-recoverable kernel-internal failure.
    fn remesh(
        &self,
        input: &FlatMesh,
        field: &AdaptionField,
        config: &KernelConfig,
    ) -> KernelResult<KernelOutput>;
}
