//! Nodal field values, historical data buffers and degrees of freedom.

use hashbrown::HashMap;
use nalgebra::Vector3;

use crate::error::{ModelError, ModelResult};

/// Well-known field names used by the remeshing pipeline.
pub mod fields {
    /// Nodal displacement (Lagrangian bookkeeping).
    pub const DISPLACEMENT: &str = "DISPLACEMENT";
    /// Nodal velocity.
    pub const VELOCITY: &str = "VELOCITY";
    /// Isotropic sizing metric consumed by the remeshing kernel.
    pub const METRIC: &str = "METRIC";
    /// Signed distance field for iso-surface discretization.
    pub const DISTANCE: &str = "DISTANCE";
}

/// A single field value stored on an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// Scalar field component.
    Scalar(f64),
    /// Three-component vector field (2-D meshes leave z at 0).
    Vector(Vector3<f64>),
}

impl FieldValue {
    /// The zero value of the same variant.
    #[inline]
    #[must_use]
    pub fn zeroed(&self) -> Self {
        match self {
            Self::Scalar(_) => Self::Scalar(0.0),
            Self::Vector(_) => Self::Vector(Vector3::zeros()),
        }
    }

    /// Scalar accessor.
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Vector(_) => None,
        }
    }

    /// Vector accessor.
    #[inline]
    #[must_use]
    pub fn as_vector(&self) -> Option<Vector3<f64>> {
        match self {
            Self::Vector(v) => Some(*v),
            Self::Scalar(_) => None,
        }
    }
}

/// A set of named field values, one slot per variable.
pub type FieldFrame = HashMap<String, FieldValue>;

/// Fixed-depth buffer of historical field frames.
///
/// Frame 0 is the current step; frame `i` is `i` steps back. The depth is
/// decided by the owning mesh and is identical for every node.
#[derive(Debug, Clone)]
pub struct NodalHistory {
    frames: Vec<FieldFrame>,
}

impl NodalHistory {
    /// Create an empty history with the given buffer depth (at least 1).
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            frames: vec![FieldFrame::new(); buffer_size.max(1)],
        }
    }

    /// Configured history depth.
    #[inline]
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.frames.len()
    }

    /// Frame at `step` steps back.
    #[inline]
    #[must_use]
    pub fn frame(&self, step: usize) -> Option<&FieldFrame> {
        self.frames.get(step)
    }

    /// Mutable frame at `step` steps back.
    #[inline]
    pub fn frame_mut(&mut self, step: usize) -> Option<&mut FieldFrame> {
        self.frames.get_mut(step)
    }

    /// Read a value at a given step.
    #[must_use]
    pub fn get(&self, name: &str, step: usize) -> Option<&FieldValue> {
        self.frames.get(step).and_then(|frame| frame.get(name))
    }

    /// Store a value at a given step.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::StepOutOfRange`] when `step` exceeds the buffer.
    pub fn set(&mut self, name: &str, step: usize, value: FieldValue) -> ModelResult<()> {
        let buffer_size = self.frames.len();
        let frame = self
            .frames
            .get_mut(step)
            .ok_or(ModelError::StepOutOfRange { step, buffer_size })?;
        frame.insert(name.to_owned(), value);
        Ok(())
    }

    /// Convenience scalar store.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::StepOutOfRange`] when `step` exceeds the buffer.
    pub fn set_scalar(&mut self, name: &str, step: usize, value: f64) -> ModelResult<()> {
        self.set(name, step, FieldValue::Scalar(value))
    }

    /// Convenience vector store.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::StepOutOfRange`] when `step` exceeds the buffer.
    pub fn set_vector(&mut self, name: &str, step: usize, value: Vector3<f64>) -> ModelResult<()> {
        self.set(name, step, FieldValue::Vector(value))
    }
}

/// A degree of freedom handle attached to a node.
///
/// The remeshing pipeline only cares about the variable name and the
/// fixity bit; solver-side equation Ids live outside this model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dof {
    /// Variable the DOF solves for.
    pub variable: String,
    /// Whether the DOF is currently fixed (Dirichlet).
    pub fixed: bool,
}

impl Dof {
    /// Create a free DOF for a variable.
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            fixed: false,
        }
    }

    /// Fix the DOF.
    pub fn fix(&mut self) {
        self.fixed = true;
    }

    /// Free the DOF.
    pub fn free(&mut self) {
        self.fixed = false;
    }
}
