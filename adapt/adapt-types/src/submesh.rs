//! Named, nested sub-domain groupings.

use hashbrown::HashSet;

use crate::EntityId;

/// A named, non-owning grouping of entity Ids within a mesh.
///
/// Sub-meshes reference mesh entities by Id and may nest arbitrarily.
/// Membership is hierarchical: an entity belonging to a child sub-mesh is
/// also considered a member of every ancestor. Nested sub-meshes are
/// addressed by dotted paths (`"Outer.Inner"`).
#[derive(Debug, Clone, Default)]
pub struct SubMesh {
    name: String,
    nodes: HashSet<EntityId>,
    elements: HashSet<EntityId>,
    conditions: HashSet<EntityId>,
    children: Vec<SubMesh>,
}

impl SubMesh {
    /// Create an empty sub-mesh.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sub-mesh name (single segment, not the dotted path).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node Id.
    pub fn add_node(&mut self, id: EntityId) {
        self.nodes.insert(id);
    }

    /// Add several node Ids.
    pub fn add_nodes(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.nodes.extend(ids);
    }

    /// Add an element Id.
    pub fn add_element(&mut self, id: EntityId) {
        self.elements.insert(id);
    }

    /// Add several element Ids.
    pub fn add_elements(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.elements.extend(ids);
    }

    /// Add a condition Id.
    pub fn add_condition(&mut self, id: EntityId) {
        self.conditions.insert(id);
    }

    /// Add several condition Ids.
    pub fn add_conditions(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.conditions.extend(ids);
    }

    /// Node Ids stored directly on this level.
    #[must_use]
    pub fn own_node_ids(&self) -> &HashSet<EntityId> {
        &self.nodes
    }

    /// Element Ids stored directly on this level.
    #[must_use]
    pub fn own_element_ids(&self) -> &HashSet<EntityId> {
        &self.elements
    }

    /// Condition Ids stored directly on this level.
    #[must_use]
    pub fn own_condition_ids(&self) -> &HashSet<EntityId> {
        &self.conditions
    }

    /// Whether a node is a member of this sub-mesh or any descendant.
    #[must_use]
    pub fn contains_node(&self, id: EntityId) -> bool {
        self.nodes.contains(&id) || self.children.iter().any(|c| c.contains_node(id))
    }

    /// Whether an element is a member of this sub-mesh or any descendant.
    #[must_use]
    pub fn contains_element(&self, id: EntityId) -> bool {
        self.elements.contains(&id) || self.children.iter().any(|c| c.contains_element(id))
    }

    /// Whether a condition is a member of this sub-mesh or any descendant.
    #[must_use]
    pub fn contains_condition(&self, id: EntityId) -> bool {
        self.conditions.contains(&id) || self.children.iter().any(|c| c.contains_condition(id))
    }

    /// All node Ids, including descendants.
    #[must_use]
    pub fn node_ids(&self) -> HashSet<EntityId> {
        let mut out = self.nodes.clone();
        for child in &self.children {
            out.extend(child.node_ids());
        }
        out
    }

    /// All element Ids, including descendants.
    #[must_use]
    pub fn element_ids(&self) -> HashSet<EntityId> {
        let mut out = self.elements.clone();
        for child in &self.children {
            out.extend(child.element_ids());
        }
        out
    }

    /// All condition Ids, including descendants.
    #[must_use]
    pub fn condition_ids(&self) -> HashSet<EntityId> {
        let mut out = self.conditions.clone();
        for child in &self.children {
            out.extend(child.condition_ids());
        }
        out
    }

    /// Total node count including descendants.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_ids().len()
    }

    /// Total element count including descendants.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_ids().len()
    }

    /// Total condition count including descendants.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.condition_ids().len()
    }

    /// Child sub-meshes.
    #[must_use]
    pub fn children(&self) -> &[SubMesh] {
        &self.children
    }

    /// Child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&SubMesh> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable child by name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut SubMesh> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Child by name, created when absent.
    pub fn ensure_child(&mut self, name: &str) -> &mut SubMesh {
        let pos = match self.children.iter().position(|c| c.name == name) {
            Some(pos) => pos,
            None => {
                self.children.push(SubMesh::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[pos]
    }

    /// Remove a child by name. Returns whether it existed.
    pub fn remove_child(&mut self, name: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c.name != name);
        self.children.len() != before
    }

    /// Resolve a dotted path relative to this sub-mesh.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&SubMesh> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Resolve a dotted path relative to this sub-mesh, mutably.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut SubMesh> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Append the dotted paths of this sub-mesh and all descendants.
    pub fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{prefix}.{}", self.name)
        };
        out.push(path.clone());
        for child in &self.children {
            child.collect_paths(&path, out);
        }
    }

    /// Drop all entity Ids at this level and below; the tree survives.
    pub fn clear_entities(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.conditions.clear();
        for child in &mut self.children {
            child.clear_entities();
        }
    }

    /// Rewrite all entity Ids through old→new maps, recursively.
    ///
    /// Ids absent from a map are dropped: a missing entry means the entity
    /// no longer exists in the mesh.
    pub fn remap_ids(
        &mut self,
        node_map: &hashbrown::HashMap<EntityId, EntityId>,
        element_map: &hashbrown::HashMap<EntityId, EntityId>,
        condition_map: &hashbrown::HashMap<EntityId, EntityId>,
    ) {
        self.nodes = self.nodes.iter().filter_map(|id| node_map.get(id).copied()).collect();
        self.elements = self
            .elements
            .iter()
            .filter_map(|id| element_map.get(id).copied())
            .collect();
        self.conditions = self
            .conditions
            .iter()
            .filter_map(|id| condition_map.get(id).copied())
            .collect();
        for child in &mut self.children {
            child.remap_ids(node_map, element_map, condition_map);
        }
    }

    /// Remove specific entity Ids at all nesting levels.
    pub fn remove_ids(
        &mut self,
        nodes: &HashSet<EntityId>,
        elements: &HashSet<EntityId>,
        conditions: &HashSet<EntityId>,
    ) {
        self.nodes.retain(|id| !nodes.contains(id));
        self.elements.retain(|id| !elements.contains(id));
        self.conditions.retain(|id| !conditions.contains(id));
        for child in &mut self.children {
            child.remove_ids(nodes, elements, conditions);
        }
    }
}
