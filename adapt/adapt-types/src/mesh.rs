//! The simulation mesh.

use hashbrown::{HashMap, HashSet};

use crate::container::EntityVec;
use crate::entity::{Condition, Element, Properties};
use crate::error::{ModelError, ModelResult};
use crate::flags::EntityFlags;
use crate::geometry::MeshDimension;
use crate::node::Node;
use crate::{EntityId, PropertiesId};

/// Process-wide step/time registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInfo {
    /// Current solution step.
    pub step: u32,
    /// Current time increment.
    pub delta_time: f64,
}

/// The discretized simulation domain.
///
/// Owns ordered collections of nodes, elements and conditions (each with a
/// unique positive Id), a tree of named sub-meshes referencing subsets of
/// those entities by Id, and the shared properties registry.
///
/// # Example
///
/// ```
/// use adapt_types::{GeometryKind, Geometry, Element, MeshDimension, Node, SimMesh};
///
/// let mut mesh = SimMesh::new(MeshDimension::Two, 1);
/// mesh.add_node(Node::from_coords(1, 0.0, 0.0, 0.0, 1));
/// mesh.add_node(Node::from_coords(2, 1.0, 0.0, 0.0, 1));
/// mesh.add_node(Node::from_coords(3, 0.0, 1.0, 0.0, 1));
///
/// let geometry = Geometry::new(GeometryKind::Triangle3, [1, 2, 3])?;
/// mesh.add_element(Element::new(1, geometry, 1));
///
/// assert_eq!(mesh.nodes().len(), 3);
/// assert_eq!(mesh.elements().len(), 1);
/// # Ok::<(), adapt_types::ModelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SimMesh {
    dimension: MeshDimension,
    buffer_size: usize,
    nodes: EntityVec<Node>,
    elements: EntityVec<Element>,
    conditions: EntityVec<Condition>,
    submeshes: Vec<crate::submesh::SubMesh>,
    properties: HashMap<PropertiesId, Properties>,
    /// Step/time registry shared with the solver.
    pub process_info: ProcessInfo,
}

impl SimMesh {
    /// Create an empty mesh.
    ///
    /// `buffer_size` is the historical field depth every node carries
    /// (at least 1).
    #[must_use]
    pub fn new(dimension: MeshDimension, buffer_size: usize) -> Self {
        Self {
            dimension,
            buffer_size: buffer_size.max(1),
            nodes: EntityVec::new(),
            elements: EntityVec::new(),
            conditions: EntityVec::new(),
            submeshes: Vec::new(),
            properties: HashMap::new(),
            process_info: ProcessInfo::default(),
        }
    }

    /// Spatial dimension.
    #[inline]
    #[must_use]
    pub const fn dimension(&self) -> MeshDimension {
        self.dimension
    }

    /// Historical buffer depth of every node.
    #[inline]
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Node container.
    #[inline]
    #[must_use]
    pub const fn nodes(&self) -> &EntityVec<Node> {
        &self.nodes
    }

    /// Mutable node container.
    #[inline]
    pub fn nodes_mut(&mut self) -> &mut EntityVec<Node> {
        &mut self.nodes
    }

    /// Element container.
    #[inline]
    #[must_use]
    pub const fn elements(&self) -> &EntityVec<Element> {
        &self.elements
    }

    /// Mutable element container.
    #[inline]
    pub fn elements_mut(&mut self) -> &mut EntityVec<Element> {
        &mut self.elements
    }

    /// Condition container.
    #[inline]
    #[must_use]
    pub const fn conditions(&self) -> &EntityVec<Condition> {
        &self.conditions
    }

    /// Mutable condition container.
    #[inline]
    pub fn conditions_mut(&mut self) -> &mut EntityVec<Condition> {
        &mut self.conditions
    }

    /// Insert a node, replacing any node with the same Id.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node);
    }

    /// Insert an element, replacing any element with the same Id.
    pub fn add_element(&mut self, element: Element) {
        self.elements.insert(element);
    }

    /// Insert a condition, replacing any condition with the same Id.
    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.insert(condition);
    }

    // ------------------------------------------------------------------
    // Sub-meshes
    // ------------------------------------------------------------------

    /// Root-level sub-meshes.
    #[must_use]
    pub fn submeshes(&self) -> &[crate::submesh::SubMesh] {
        &self.submeshes
    }

    /// Create a sub-mesh at a dotted path; intermediate levels are created.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSubMesh`] when the leaf already exists
    /// and [`ModelError::UnknownSubMesh`] for an empty path.
    pub fn create_submesh(&mut self, path: &str) -> ModelResult<&mut crate::submesh::SubMesh> {
        if self.submesh(path).is_some() {
            return Err(ModelError::DuplicateSubMesh {
                path: path.to_owned(),
            });
        }
        self.ensure_submesh(path)
    }

    /// Sub-mesh at a dotted path, created (with intermediate levels) when
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownSubMesh`] for an empty path.
    pub fn ensure_submesh(&mut self, path: &str) -> ModelResult<&mut crate::submesh::SubMesh> {
        let mut segments = path.split('.');
        let first = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ModelError::UnknownSubMesh {
                path: path.to_owned(),
            })?;

        let pos = match self.submeshes.iter().position(|s| s.name() == first) {
            Some(pos) => pos,
            None => {
                self.submeshes.push(crate::submesh::SubMesh::new(first));
                self.submeshes.len() - 1
            }
        };
        let mut current = &mut self.submeshes[pos];
        for segment in segments {
            current = current.ensure_child(segment);
        }
        Ok(current)
    }

    /// Look up a sub-mesh by dotted path.
    #[must_use]
    pub fn submesh(&self, path: &str) -> Option<&crate::submesh::SubMesh> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };
        let root = self.submeshes.iter().find(|s| s.name() == first)?;
        match rest {
            Some(rest) => root.find(rest),
            None => Some(root),
        }
    }

    /// Look up a sub-mesh by dotted path, mutably.
    pub fn submesh_mut(&mut self, path: &str) -> Option<&mut crate::submesh::SubMesh> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };
        let root = self.submeshes.iter_mut().find(|s| s.name() == first)?;
        match rest {
            Some(rest) => root.find_mut(rest),
            None => Some(root),
        }
    }

    /// Remove a root-level sub-mesh (and its whole subtree).
    pub fn remove_submesh(&mut self, name: &str) -> bool {
        let before = self.submeshes.len();
        self.submeshes.retain(|s| s.name() != name);
        self.submeshes.len() != before
    }

    /// Dotted paths of every sub-mesh at every nesting level, in tree order.
    #[must_use]
    pub fn recursive_submesh_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for sub in &self.submeshes {
            sub.collect_paths("", &mut out);
        }
        out
    }

    /// Drop all entity Ids from every sub-mesh; the tree survives.
    pub fn clear_submesh_entities(&mut self) {
        for sub in &mut self.submeshes {
            sub.clear_entities();
        }
    }

    /// Rewrite entity Ids in every sub-mesh through old→new maps.
    pub fn remap_submesh_ids(
        &mut self,
        node_map: &HashMap<EntityId, EntityId>,
        element_map: &HashMap<EntityId, EntityId>,
        condition_map: &HashMap<EntityId, EntityId>,
    ) {
        for sub in &mut self.submeshes {
            sub.remap_ids(node_map, element_map, condition_map);
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Register properties, replacing any with the same Id.
    pub fn add_properties(&mut self, properties: Properties) {
        self.properties.insert(properties.id(), properties);
    }

    /// Properties by Id.
    #[must_use]
    pub fn properties(&self, id: PropertiesId) -> Option<&Properties> {
        self.properties.get(&id)
    }

    /// Properties by Id, created empty when absent.
    pub fn properties_or_create(&mut self, id: PropertiesId) -> &mut Properties {
        self.properties.entry(id).or_insert_with(|| Properties::new(id))
    }

    // ------------------------------------------------------------------
    // Bulk replacement support
    // ------------------------------------------------------------------

    /// Move every node, element and condition out of the mesh, leaving the
    /// containers empty and every sub-mesh without entity Ids.
    ///
    /// The sub-mesh tree, properties registry and process info survive;
    /// this is the first half of a full mesh replacement.
    pub fn drain_entities(&mut self) -> (Vec<Node>, Vec<Element>, Vec<Condition>) {
        self.clear_submesh_entities();
        (
            self.nodes.take(),
            self.elements.take(),
            self.conditions.take(),
        )
    }

    /// Remove all nodes carrying a flag, from the container and from every
    /// sub-mesh. Returns the number removed.
    pub fn remove_nodes_flagged(&mut self, flag: EntityFlags) -> usize {
        let removed: HashSet<EntityId> = self
            .nodes
            .iter()
            .filter(|n| n.is(flag))
            .map(Node::id)
            .collect();
        self.nodes.retain(|n| !n.is(flag));
        let empty = HashSet::new();
        for sub in &mut self.submeshes {
            sub.remove_ids(&removed, &empty, &empty);
        }
        removed.len()
    }

    /// Remove all elements carrying a flag, from the container and from
    /// every sub-mesh. Returns the number removed.
    pub fn remove_elements_flagged(&mut self, flag: EntityFlags) -> usize {
        let removed: HashSet<EntityId> = self
            .elements
            .iter()
            .filter(|e| e.is(flag))
            .map(Element::id)
            .collect();
        self.elements.retain(|e| !e.is(flag));
        let empty = HashSet::new();
        for sub in &mut self.submeshes {
            sub.remove_ids(&empty, &removed, &empty);
        }
        removed.len()
    }

    /// Remove all conditions carrying a flag, from the container and from
    /// every sub-mesh. Returns the number removed.
    pub fn remove_conditions_flagged(&mut self, flag: EntityFlags) -> usize {
        let removed: HashSet<EntityId> = self
            .conditions
            .iter()
            .filter(|c| c.is(flag))
            .map(Condition::id)
            .collect();
        self.conditions.retain(|c| !c.is(flag));
        let empty = HashSet::new();
        for sub in &mut self.submeshes {
            sub.remove_ids(&empty, &empty, &removed);
        }
        removed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, GeometryKind};
    use crate::submesh::SubMesh;

    fn two_triangle_mesh() -> SimMesh {
        let mut mesh = SimMesh::new(MeshDimension::Two, 1);
        mesh.add_node(Node::from_coords(1, 0.0, 0.0, 0.0, 1));
        mesh.add_node(Node::from_coords(2, 1.0, 0.0, 0.0, 1));
        mesh.add_node(Node::from_coords(3, 1.0, 1.0, 0.0, 1));
        mesh.add_node(Node::from_coords(4, 0.0, 1.0, 0.0, 1));
        let tri_a = Geometry::new(GeometryKind::Triangle3, [1, 2, 3]).unwrap();
        let tri_b = Geometry::new(GeometryKind::Triangle3, [1, 3, 4]).unwrap();
        mesh.add_element(Element::new(1, tri_a, 1));
        mesh.add_element(Element::new(2, tri_b, 1));
        mesh
    }

    #[test]
    fn submesh_create_and_lookup() {
        let mut mesh = two_triangle_mesh();
        mesh.create_submesh("Domain").unwrap().add_elements([1, 2]);
        mesh.create_submesh("Domain.Left").unwrap().add_element(1);

        assert!(mesh.submesh("Domain").is_some());
        assert!(mesh.submesh("Domain.Left").is_some());
        assert!(mesh.submesh("Domain.Right").is_none());
        assert!(mesh.create_submesh("Domain").is_err());

        let names = mesh.recursive_submesh_names();
        assert_eq!(names, vec!["Domain", "Domain.Left"]);
    }

    #[test]
    fn drain_entities_clears_submesh_ids() {
        let mut mesh = two_triangle_mesh();
        mesh.create_submesh("Domain").unwrap().add_elements([1, 2]);

        let (nodes, elements, conditions) = mesh.drain_entities();
        assert_eq!(nodes.len(), 4);
        assert_eq!(elements.len(), 2);
        assert!(conditions.is_empty());
        assert!(mesh.nodes().is_empty());
        assert_eq!(mesh.submesh("Domain").map(SubMesh::element_count), Some(0));
    }

    #[test]
    fn remove_flagged_nodes_updates_submeshes() {
        let mut mesh = two_triangle_mesh();
        mesh.create_submesh("Wet").unwrap().add_nodes([1, 2]);

        mesh.nodes_mut()
            .get_mut(2)
            .unwrap()
            .set_flag(EntityFlags::TO_ERASE, true);
        let removed = mesh.remove_nodes_flagged(EntityFlags::TO_ERASE);

        assert_eq!(removed, 1);
        assert_eq!(mesh.nodes().len(), 3);
        assert!(mesh.submesh("Wet").is_some_and(|s| !s.contains_node(2)));
    }

    #[test]
    fn properties_or_create() {
        let mut mesh = two_triangle_mesh();
        assert!(mesh.properties(3).is_none());
        mesh.properties_or_create(3);
        assert!(mesh.properties(3).is_some());
    }
}
