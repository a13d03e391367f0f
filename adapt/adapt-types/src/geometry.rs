//! Geometry kinds and entity connectivity.

use smallvec::SmallVec;

use crate::error::{ModelError, ModelResult};
use crate::EntityId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spatial dimension of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeshDimension {
    /// Planar meshes (z is carried but ignored).
    Two,
    /// Volumetric meshes.
    Three,
}

impl MeshDimension {
    /// Number of coordinate components that carry information.
    #[inline]
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// The closed set of topological geometry kinds the model supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeometryKind {
    /// 2-node line (2-D boundary condition).
    Line2,
    /// 3-node triangle (2-D element or 3-D boundary condition).
    Triangle3,
    /// 4-node quadrilateral (3-D boundary condition).
    Quadrilateral4,
    /// 4-node tetrahedron (3-D element).
    Tetrahedron4,
    /// 6-node prism (3-D element).
    Prism6,
}

impl GeometryKind {
    /// Number of nodes the kind requires.
    #[inline]
    #[must_use]
    pub const fn node_count(self) -> usize {
        match self {
            Self::Line2 => 2,
            Self::Triangle3 => 3,
            Self::Quadrilateral4 | Self::Tetrahedron4 => 4,
            Self::Prism6 => 6,
        }
    }

    /// Local topological dimension of the kind.
    #[inline]
    #[must_use]
    pub const fn local_dimension(self) -> usize {
        match self {
            Self::Line2 => 1,
            Self::Triangle3 | Self::Quadrilateral4 => 2,
            Self::Tetrahedron4 | Self::Prism6 => 3,
        }
    }
}

/// Ordered, non-owning node connectivity of a fixed geometry kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    kind: GeometryKind,
    nodes: SmallVec<[EntityId; 8]>,
}

impl Geometry {
    /// Create a geometry, checking that the connectivity matches the kind.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::GeometryArity`] when the node count does not
    /// match the kind, and [`ModelError::ZeroId`] when a node Id is 0.
    pub fn new(kind: GeometryKind, nodes: impl IntoIterator<Item = EntityId>) -> ModelResult<Self> {
        let nodes: SmallVec<[EntityId; 8]> = nodes.into_iter().collect();
        if nodes.len() != kind.node_count() {
            return Err(ModelError::GeometryArity {
                kind,
                expected: kind.node_count(),
                actual: nodes.len(),
            });
        }
        if nodes.iter().any(|&id| id == 0) {
            return Err(ModelError::ZeroId);
        }
        Ok(Self { kind, nodes })
    }

    /// The geometry kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Node Ids in connectivity order.
    #[inline]
    #[must_use]
    pub fn node_ids(&self) -> &[EntityId] {
        &self.nodes
    }

    /// Rewrite every node Id through a mapping.
    ///
    /// Ids absent from the mapping are left untouched.
    pub fn remap_nodes(&mut self, map: &hashbrown::HashMap<EntityId, EntityId>) {
        for id in &mut self.nodes {
            if let Some(&new_id) = map.get(id) {
                *id = new_id;
            }
        }
    }
}
