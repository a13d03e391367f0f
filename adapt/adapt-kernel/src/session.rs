//! Kernel invocation session.

use tracing::debug;

use crate::error::{KernelError, KernelResult};
use crate::flat::{AdaptionField, FlatMesh};
use crate::kernel::{KernelConfig, KernelOutput, RemeshKernel};

/// Owns the kernel-side buffers across the pipeline stages.
///
/// The session is passed by exclusive ownership through export → check →
/// invoke → reconstruction; [`KernelSession::release`] frees every buffer
/// and is also run on drop, so an early error return cannot leak
/// kernel-owned state into the next pass.
#[derive(Debug)]
pub struct KernelSession {
    config: KernelConfig,
    input: Option<FlatMesh>,
    field: Option<AdaptionField>,
    output: Option<KernelOutput>,
}

impl KernelSession {
    /// Start a session.
    #[must_use]
    pub const fn new(config: KernelConfig) -> Self {
        Self {
            config,
            input: None,
            field: None,
            output: None,
        }
    }

    /// Kernel configuration.
    #[must_use]
    pub const fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Hand the exported mesh to the session.
    pub fn set_mesh(&mut self, mesh: FlatMesh) {
        self.input = Some(mesh);
    }

    /// Hand the adaptation field to the session.
    pub fn set_field(&mut self, field: AdaptionField) {
        self.field = Some(field);
    }

    /// The exported input mesh, if set.
    #[must_use]
    pub const fn input(&self) -> Option<&FlatMesh> {
        self.input.as_ref()
    }

    /// The adaptation field, if set.
    #[must_use]
    pub const fn field(&self) -> Option<&AdaptionField> {
        self.field.as_ref()
    }

    /// Check that the input mesh and field agree before invoking.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::MissingMesh`] / [`KernelError::MissingField`]
    /// when a piece is absent, a [`KernelError::SizeMismatch`] when the
    /// field length disagrees with the node count, and whatever
    /// [`FlatMesh::check`] reports.
    pub fn check(&self) -> KernelResult<()> {
        let mesh = self.input.as_ref().ok_or(KernelError::MissingMesh)?;
        let field = self.field.as_ref().ok_or(KernelError::MissingField)?;
        mesh.check()?;
        if field.len() != mesh.node_count() {
            return Err(KernelError::SizeMismatch {
                what: "adaption field",
                expected: mesh.node_count(),
                actual: field.len(),
            });
        }
        Ok(())
    }

    /// Run the kernel on the session's input.
    ///
    /// # Errors
    ///
    /// Propagates kernel failures unchanged; they are fatal to the pass.
    pub fn invoke(&mut self, kernel: &dyn RemeshKernel) -> KernelResult<()> {
        let mesh = self.input.as_ref().ok_or(KernelError::MissingMesh)?;
        let field = self.field.as_ref().ok_or(KernelError::MissingField)?;

        debug!(
            kernel = kernel.name(),
            nodes = mesh.node_count(),
            elements = mesh.element_count(),
            conditions = mesh.condition_count(),
            field = field.kind_name(),
            "invoking remeshing kernel"
        );

        let output = kernel.remesh(mesh, field, &self.config)?;
        debug!(
            kernel = kernel.name(),
            nodes = output.mesh.node_count(),
            elements = output.mesh.element_count(),
            conditions = output.mesh.condition_count(),
            "kernel returned"
        );
        self.output = Some(output);
        Ok(())
    }

    /// The kernel output.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::MissingOutput`] before a successful invoke.
    pub fn output(&self) -> KernelResult<&KernelOutput> {
        self.output.as_ref().ok_or(KernelError::MissingOutput)
    }

    /// Move the kernel output out of the session.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::MissingOutput`] before a successful invoke.
    pub fn take_output(&mut self) -> KernelResult<KernelOutput> {
        self.output.take().ok_or(KernelError::MissingOutput)
    }

    /// Free every kernel-owned buffer. Idempotent.
    pub fn release(&mut self) {
        if self.input.is_some() || self.field.is_some() || self.output.is_some() {
            debug!("releasing kernel session buffers");
        }
        self.input = None;
        self.field = None;
        self.output = None;
    }
}

impl Drop for KernelSession {
    fn drop(&mut self) {
        self.release();
    }
}
