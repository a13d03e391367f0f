//! A kernel that returns its input unchanged.

use crate::error::KernelResult;
use crate::flat::{AdaptionField, DiscardedEntities, FlatMesh};
use crate::kernel::{KernelConfig, KernelOutput, RemeshKernel};

/// Identity kernel: the output mesh is the input mesh.
///
/// Useful for wiring tests and for exercising the full pipeline without a
/// real remeshing library; tags, blocked bits and required bits round-trip
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughKernel;

impl RemeshKernel for PassthroughKernel {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn remesh(
        &self,
        input: &FlatMesh,
        _field: &AdaptionField,
        _config: &KernelConfig,
    ) -> KernelResult<KernelOutput> {
        let mesh = input.clone();
        let discarded = DiscardedEntities::none_for(&mesh);
        Ok(KernelOutput { mesh, discarded })
    }
}
