//! Mesh nodes.

use nalgebra::Point3;

use crate::field::{Dof, FieldFrame, NodalHistory};
use crate::flags::EntityFlags;
use crate::EntityId;

/// A mesh node.
///
/// Carries both the initial (undeformed) and current position so that the
/// Lagrangian framework can move between reference frames, a fixed-depth
/// historical field buffer, a non-historical value store, flags and the
/// node's degree-of-freedom handles.
#[derive(Debug, Clone)]
pub struct Node {
    id: EntityId,
    /// Position at mesh creation (reference configuration).
    pub initial_position: Point3<f64>,
    /// Current position.
    pub position: Point3<f64>,
    /// Boolean state.
    pub flags: EntityFlags,
    /// Degree-of-freedom handles.
    pub dofs: Vec<Dof>,
    /// Historical field buffer; frame 0 is the current step.
    pub history: NodalHistory,
    /// Non-historical values.
    pub values: FieldFrame,
}

impl Node {
    /// Create a node at a position; the initial position starts equal to it.
    #[must_use]
    pub fn new(id: EntityId, position: Point3<f64>, buffer_size: usize) -> Self {
        Self {
            id,
            initial_position: position,
            position,
            flags: EntityFlags::default(),
            dofs: Vec::new(),
            history: NodalHistory::new(buffer_size),
            values: FieldFrame::new(),
        }
    }

    /// Create a node from raw coordinates.
    #[must_use]
    pub fn from_coords(id: EntityId, x: f64, y: f64, z: f64, buffer_size: usize) -> Self {
        Self::new(id, Point3::new(x, y, z), buffer_size)
    }

    /// Node Id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Overwrite the node Id.
    #[inline]
    pub fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    /// Whether a flag is set.
    #[inline]
    #[must_use]
    pub const fn is(&self, flag: EntityFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set_flag(&mut self, flag: EntityFlags, value: bool) {
        self.flags.set(flag, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_positions_start_equal() {
        let node = Node::from_coords(1, 1.0, 2.0, 3.0, 2);
        assert_eq!(node.position, node.initial_position);
        assert_eq!(node.history.buffer_size(), 2);
    }

    #[test]
    fn node_flags() {
        let mut node = Node::from_coords(1, 0.0, 0.0, 0.0, 1);
        assert!(!node.is(EntityFlags::INLET));
        node.set_flag(EntityFlags::INLET, true);
        assert!(node.is(EntityFlags::INLET));
        node.set_flag(EntityFlags::INLET, false);
        assert!(!node.is(EntityFlags::INLET));
    }
}
