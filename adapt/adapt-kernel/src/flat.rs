//! Flat, index-based mesh representation consumed by remeshing kernels.

use adapt_types::{GeometryKind, MeshDimension};

use crate::error::{KernelError, KernelResult};

/// Per-entity reference tag carried through the kernel.
///
/// The pipeline stores sub-mesh colors here; the kernel treats tags as
/// opaque and propagates them onto the entities of the new mesh.
pub type RefTag = u32;

/// One homogeneous connectivity block (all entities share a geometry kind).
///
/// Connectivity is stored flat with a stride equal to the kind's node
/// count; indices are 1-based, matching the contiguous Ids the export
/// adapter assigns.
#[derive(Debug, Clone)]
pub struct FlatBlock {
    kind: GeometryKind,
    connectivity: Vec<u32>,
    tags: Vec<RefTag>,
    required: Vec<bool>,
}

impl FlatBlock {
    /// Create an empty block for a geometry kind.
    #[must_use]
    pub const fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            connectivity: Vec::new(),
            tags: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Geometry kind of every entity in the block.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Number of entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the block is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Append one entity.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ConnectivityArity`] when the node count does
    /// not match the block's geometry kind.
    pub fn push(&mut self, nodes: &[u32], tag: RefTag, required: bool) -> KernelResult<()> {
        if nodes.len() != self.kind.node_count() {
            return Err(KernelError::ConnectivityArity {
                kind: self.kind,
                expected: self.kind.node_count(),
                actual: nodes.len(),
            });
        }
        self.connectivity.extend_from_slice(nodes);
        self.tags.push(tag);
        self.required.push(required);
        Ok(())
    }

    /// Connectivity of the i-th entity (0-based).
    #[must_use]
    pub fn entity(&self, i: usize) -> Option<&[u32]> {
        let stride = self.kind.node_count();
        self.connectivity.get(i * stride..(i + 1) * stride)
    }

    /// Reference tag of the i-th entity (0-based).
    #[must_use]
    pub fn tag(&self, i: usize) -> RefTag {
        self.tags.get(i).copied().unwrap_or(0)
    }

    /// Required flag of the i-th entity (0-based).
    #[must_use]
    pub fn required(&self, i: usize) -> bool {
        self.required.get(i).copied().unwrap_or(false)
    }

    /// Iterate `(connectivity, tag, required)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&[u32], RefTag, bool)> {
        let stride = self.kind.node_count();
        self.connectivity
            .chunks_exact(stride)
            .zip(&self.tags)
            .zip(&self.required)
            .map(|((nodes, &tag), &required)| (nodes, tag, required))
    }

    fn check(&self, node_count: usize, what: &'static str) -> KernelResult<()> {
        let expected = self.len() * self.kind.node_count();
        if self.connectivity.len() != expected {
            return Err(KernelError::SizeMismatch {
                what,
                expected,
                actual: self.connectivity.len(),
            });
        }
        if self.required.len() != self.tags.len() {
            return Err(KernelError::SizeMismatch {
                what,
                expected: self.tags.len(),
                actual: self.required.len(),
            });
        }
        for &index in &self.connectivity {
            if index == 0 || index as usize > node_count {
                return Err(KernelError::NodeOutOfRange {
                    index,
                    count: node_count,
                });
            }
        }
        Ok(())
    }
}

/// The kernel-side mesh: coordinates plus homogeneous connectivity blocks.
///
/// Elements and conditions are partitioned by geometry sub-type the way
/// volumetric kernels expect them: planar meshes carry one block per
/// family (triangles / lines), volumetric meshes carry two (tetrahedra +
/// prisms / triangles + quadrilaterals).
#[derive(Debug, Clone)]
pub struct FlatMesh {
    dimension: MeshDimension,
    coordinates: Vec<[f64; 3]>,
    node_tags: Vec<RefTag>,
    node_blocked: Vec<bool>,
    node_required: Vec<bool>,
    elements: Vec<FlatBlock>,
    conditions: Vec<FlatBlock>,
}

impl FlatMesh {
    /// Create an empty flat mesh with the block layout for a dimension.
    #[must_use]
    pub fn for_dimension(dimension: MeshDimension) -> Self {
        let (elements, conditions) = match dimension {
            MeshDimension::Two => (
                vec![FlatBlock::new(GeometryKind::Triangle3)],
                vec![FlatBlock::new(GeometryKind::Line2)],
            ),
            MeshDimension::Three => (
                vec![
                    FlatBlock::new(GeometryKind::Tetrahedron4),
                    FlatBlock::new(GeometryKind::Prism6),
                ],
                vec![
                    FlatBlock::new(GeometryKind::Triangle3),
                    FlatBlock::new(GeometryKind::Quadrilateral4),
                ],
            ),
        };
        Self {
            dimension,
            coordinates: Vec::new(),
            node_tags: Vec::new(),
            node_blocked: Vec::new(),
            node_required: Vec::new(),
            elements,
            conditions,
        }
    }

    /// Mesh dimension.
    #[inline]
    #[must_use]
    pub const fn dimension(&self) -> MeshDimension {
        self.dimension
    }

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.coordinates.len()
    }

    /// Append a node; returns its 1-based index.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: node counts beyond u32 are unsupported by design
    pub fn add_node(&mut self, coordinates: [f64; 3], tag: RefTag, blocked: bool) -> u32 {
        self.coordinates.push(coordinates);
        self.node_tags.push(tag);
        self.node_blocked.push(blocked);
        self.node_required.push(false);
        self.coordinates.len() as u32
    }

    /// Coordinates of the i-th node (0-based).
    #[must_use]
    pub fn coordinate(&self, i: usize) -> Option<[f64; 3]> {
        self.coordinates.get(i).copied()
    }

    /// Reference tag of the i-th node (0-based).
    #[must_use]
    pub fn node_tag(&self, i: usize) -> RefTag {
        self.node_tags.get(i).copied().unwrap_or(0)
    }

    /// Blocked bit of the i-th node (0-based).
    #[must_use]
    pub fn node_blocked(&self, i: usize) -> bool {
        self.node_blocked.get(i).copied().unwrap_or(false)
    }

    /// Required/corner bit of the i-th node (0-based).
    #[must_use]
    pub fn node_required(&self, i: usize) -> bool {
        self.node_required.get(i).copied().unwrap_or(false)
    }

    /// Mark a node (1-based index) as required/corner.
    pub fn set_node_required(&mut self, index: u32) {
        if let Some(slot) = self.node_required.get_mut(index.saturating_sub(1) as usize) {
            *slot = true;
        }
    }

    /// Element connectivity blocks.
    #[must_use]
    pub fn element_blocks(&self) -> &[FlatBlock] {
        &self.elements
    }

    /// Condition connectivity blocks.
    #[must_use]
    pub fn condition_blocks(&self) -> &[FlatBlock] {
        &self.conditions
    }

    /// Index of the element block holding a geometry kind, if supported.
    #[must_use]
    pub fn element_block_for(&self, kind: GeometryKind) -> Option<usize> {
        self.elements.iter().position(|b| b.kind() == kind)
    }

    /// Index of the condition block holding a geometry kind, if supported.
    #[must_use]
    pub fn condition_block_for(&self, kind: GeometryKind) -> Option<usize> {
        self.conditions.iter().position(|b| b.kind() == kind)
    }

    /// Append an element to the block for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ConnectivityArity`] on arity mismatch. Calls
    /// for unsupported kinds are the caller's responsibility to filter.
    pub fn push_element(
        &mut self,
        block: usize,
        nodes: &[u32],
        tag: RefTag,
        required: bool,
    ) -> KernelResult<()> {
        match self.elements.get_mut(block) {
            Some(b) => b.push(nodes, tag, required),
            None => Err(KernelError::SizeMismatch {
                what: "element block index",
                expected: self.elements.len(),
                actual: block,
            }),
        }
    }

    /// Append a condition to the block for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ConnectivityArity`] on arity mismatch.
    pub fn push_condition(
        &mut self,
        block: usize,
        nodes: &[u32],
        tag: RefTag,
        required: bool,
    ) -> KernelResult<()> {
        match self.conditions.get_mut(block) {
            Some(b) => b.push(nodes, tag, required),
            None => Err(KernelError::SizeMismatch {
                what: "condition block index",
                expected: self.conditions.len(),
                actual: block,
            }),
        }
    }

    /// Total element count over all blocks.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.iter().map(FlatBlock::len).sum()
    }

    /// Total condition count over all blocks.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.conditions.iter().map(FlatBlock::len).sum()
    }

    /// Verify internal consistency: array lengths against entity counts and
    /// connectivity indices against the node range.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn check(&self) -> KernelResult<()> {
        let nodes = self.node_count();
        if self.node_tags.len() != nodes {
            return Err(KernelError::SizeMismatch {
                what: "node tags",
                expected: nodes,
                actual: self.node_tags.len(),
            });
        }
        if self.node_blocked.len() != nodes {
            return Err(KernelError::SizeMismatch {
                what: "node blocked bits",
                expected: nodes,
                actual: self.node_blocked.len(),
            });
        }
        for block in &self.elements {
            block.check(nodes, "element block")?;
        }
        for block in &self.conditions {
            block.check(nodes, "condition block")?;
        }
        Ok(())
    }
}

/// Ordered per-block lists of entity indices the kernel flags for removal.
///
/// Indices are 1-based into the *output* mesh's blocks; flagged entities
/// contribute no entity during reconstruction (e.g. the discarded side of
/// an iso-surface split).
#[derive(Debug, Clone, Default)]
pub struct DiscardedEntities {
    /// Per element block, ascending 1-based indices.
    pub elements: Vec<Vec<u32>>,
    /// Per condition block, ascending 1-based indices.
    pub conditions: Vec<Vec<u32>>,
}

impl DiscardedEntities {
    /// Empty lists shaped for a mesh's block layout.
    #[must_use]
    pub fn none_for(mesh: &FlatMesh) -> Self {
        Self {
            elements: vec![Vec::new(); mesh.element_blocks().len()],
            conditions: vec![Vec::new(); mesh.condition_blocks().len()],
        }
    }

    /// Whether nothing is discarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(Vec::is_empty) && self.conditions.iter().all(Vec::is_empty)
    }
}

/// The adaptation signal driving the kernel's sizing decisions.
#[derive(Debug, Clone)]
pub enum AdaptionField {
    /// Isotropic target size per node.
    Metric(Vec<f64>),
    /// Symmetric 2-D metric tensor per node (xx, yy, xy).
    TensorMetric2(Vec<[f64; 3]>),
    /// Symmetric 3-D metric tensor per node (xx, yy, zz, xy, yz, xz).
    TensorMetric3(Vec<[f64; 6]>),
    /// Signed distance per node, for iso-surface discretization.
    LevelSet(Vec<f64>),
}

impl AdaptionField {
    /// Number of per-node entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Metric(v) | Self::LevelSet(v) => v.len(),
            Self::TensorMetric2(v) => v.len(),
            Self::TensorMetric3(v) => v.len(),
        }
    }

    /// Whether the field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Metric(_) => "metric",
            Self::TensorMetric2(_) => "tensor-metric-2d",
            Self::TensorMetric3(_) => "tensor-metric-3d",
            Self::LevelSet(_) => "level-set",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_push_and_iter() {
        let mut block = FlatBlock::new(GeometryKind::Triangle3);
        block.push(&[1, 2, 3], 4, false).unwrap();
        block.push(&[2, 3, 4], 0, true).unwrap();

        assert_eq!(block.len(), 2);
        assert_eq!(block.entity(1), Some(&[2, 3, 4][..]));
        assert_eq!(block.tag(0), 4);
        assert!(block.required(1));

        let collected: Vec<_> = block.iter().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].0, &[1, 2, 3]);
    }

    #[test]
    fn block_rejects_bad_arity() {
        let mut block = FlatBlock::new(GeometryKind::Line2);
        let err = block.push(&[1, 2, 3], 0, false);
        assert!(matches!(err, Err(KernelError::ConnectivityArity { .. })));
    }

    #[test]
    fn mesh_layout_by_dimension() {
        let planar = FlatMesh::for_dimension(MeshDimension::Two);
        assert_eq!(planar.element_blocks().len(), 1);
        assert_eq!(planar.element_block_for(GeometryKind::Triangle3), Some(0));
        assert_eq!(planar.element_block_for(GeometryKind::Tetrahedron4), None);

        let volumetric = FlatMesh::for_dimension(MeshDimension::Three);
        assert_eq!(volumetric.element_blocks().len(), 2);
        assert_eq!(volumetric.condition_block_for(GeometryKind::Quadrilateral4), Some(1));
    }

    #[test]
    fn check_catches_out_of_range_index() {
        let mut mesh = FlatMesh::for_dimension(MeshDimension::Two);
        mesh.add_node([0.0, 0.0, 0.0], 0, false);
        mesh.add_node([1.0, 0.0, 0.0], 0, false);
        mesh.push_element(0, &[1, 2, 3], 0, false).unwrap();

        let err = mesh.check();
        assert!(matches!(err, Err(KernelError::NodeOutOfRange { index: 3, .. })));
    }

    #[test]
    fn field_lengths() {
        assert_eq!(AdaptionField::Metric(vec![1.0, 2.0]).len(), 2);
        assert_eq!(AdaptionField::TensorMetric3(vec![[0.0; 6]]).len(), 1);
        assert!(AdaptionField::LevelSet(Vec::new()).is_empty());
    }
}
