//! Cleanup and consistency pass.

use hashbrown::HashSet;
use rayon::prelude::*;
use tracing::{debug, info};

use adapt_types::{Condition, Element, EntityFlags, EntityId, SimMesh};

/// Renumber every node, element and condition to a contiguous 1..=N range
/// in current container order, rewriting connectivity and sub-mesh Id
/// sets to match.
pub fn reorder_ids(mesh: &mut SimMesh) {
    let node_map = mesh.nodes_mut().renumber();
    let element_map = mesh.elements_mut().renumber();
    let condition_map = mesh.conditions_mut().renumber();

    for element in mesh.elements_mut().iter_mut() {
        element.geometry.remap_nodes(&node_map);
    }
    for condition in mesh.conditions_mut().iter_mut() {
        condition.geometry.remap_nodes(&node_map);
    }

    mesh.remap_submesh_ids(&node_map, &element_map, &condition_map);
}

/// Remove every entity flagged `TO_ERASE`, at all nesting levels.
///
/// Returns `(nodes, elements, conditions)` removal counts.
pub fn remove_erased_entities(mesh: &mut SimMesh) -> (usize, usize, usize) {
    let nodes = mesh.remove_nodes_flagged(EntityFlags::TO_ERASE);
    let elements = mesh.remove_elements_flagged(EntityFlags::TO_ERASE);
    let conditions = mesh.remove_conditions_flagged(EntityFlags::TO_ERASE);
    if nodes + elements + conditions > 0 {
        debug!(nodes, elements, conditions, "removed entities flagged for erasure");
    }
    (nodes, elements, conditions)
}

/// Detect and remove conditions sharing the same node set.
///
/// Remeshing can produce duplicated boundary geometries; the first
/// occurrence survives, later ones are flagged and removed from all
/// nesting levels. Returns the number removed.
pub fn clear_duplicate_conditions(mesh: &mut SimMesh, echo_level: u8) -> usize {
    let mut seen: HashSet<Vec<EntityId>> = HashSet::with_capacity(mesh.conditions().len());
    let mut duplicates = 0usize;

    for condition in mesh.conditions_mut().iter_mut() {
        let mut key: Vec<EntityId> = condition.geometry.node_ids().to_vec();
        key.sort_unstable();
        if seen.insert(key) {
            continue;
        }
        condition.set_flag(EntityFlags::TO_ERASE, true);
        duplicates += 1;
        if echo_level > 2 {
            info!(condition = condition.id(), "duplicated condition will be removed");
        }
    }

    if duplicates > 0 {
        mesh.remove_conditions_flagged(EntityFlags::TO_ERASE);
    }
    duplicates
}

/// Remove nodes not referenced by any element, at all nesting levels.
///
/// Returns the number removed.
pub fn clean_superfluous_nodes(mesh: &mut SimMesh) -> usize {
    let referenced: HashSet<EntityId> = mesh
        .elements()
        .as_slice()
        .par_iter()
        .fold(HashSet::new, |mut acc, element| {
            acc.extend(element.geometry.node_ids().iter().copied());
            acc
        })
        .reduce(HashSet::new, |mut a, b| {
            a.extend(b);
            a
        });

    for node in mesh.nodes_mut().iter_mut() {
        node.set_flag(EntityFlags::TO_ERASE, !referenced.contains(&node.id()));
    }
    let removed = mesh.remove_nodes_flagged(EntityFlags::TO_ERASE);
    info!(removed, "superfluous nodes cleared");
    removed
}

/// Give new entities the value layout the old entities had, zero-filled,
/// without touching slots an interpolation pass already wrote.
pub fn zero_entity_data(mesh: &mut SimMesh, old: &SimMesh) {
    if let Some(template) = old.elements().first().map(|e| e.data.clone()) {
        for element in mesh.elements_mut().iter_mut() {
            element.zero_missing_data(&template);
        }
    }
    if let Some(template) = old.conditions().first().map(|c| c.data.clone()) {
        for condition in mesh.conditions_mut().iter_mut() {
            condition.zero_missing_data(&template);
        }
    }
}

/// Re-initialize element/condition local state (data-parallel).
pub fn initialize_entities(mesh: &mut SimMesh) {
    mesh.elements_mut()
        .as_mut_slice()
        .par_iter_mut()
        .for_each(Element::initialize);
    mesh.conditions_mut()
        .as_mut_slice()
        .par_iter_mut()
        .for_each(Condition::initialize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_types::{FieldValue, Geometry, GeometryKind, MeshDimension, Node};

    fn mesh_with_gaps() -> SimMesh {
        let mut mesh = SimMesh::new(MeshDimension::Two, 1);
        for (id, x) in [(2, 0.0), (5, 1.0), (9, 2.0)] {
            mesh.add_node(Node::from_coords(id, x, 0.0, 0.0, 1));
        }
        mesh.add_node(Node::from_coords(12, 1.0, 1.0, 0.0, 1));
        let tri = Geometry::new(GeometryKind::Triangle3, [2, 5, 12]).unwrap();
        mesh.add_element(Element::new(4, tri, 1));
        let edge = Geometry::new(GeometryKind::Line2, [2, 5]).unwrap();
        mesh.add_condition(Condition::new(8, edge, 1));
        mesh
    }

    #[test]
    fn reorder_makes_ids_contiguous_and_consistent() {
        let mut mesh = mesh_with_gaps();
        mesh.create_submesh("S").unwrap().add_nodes([5, 9]);

        reorder_ids(&mut mesh);

        let node_ids: Vec<EntityId> = mesh.nodes().iter().map(Node::id).collect();
        assert_eq!(node_ids, vec![1, 2, 3, 4]);
        // element connectivity follows the renumbering (2→1, 5→2, 12→4)
        let element = mesh.elements().get(1).unwrap();
        assert_eq!(element.geometry.node_ids(), &[1, 2, 4]);
        // sub-mesh sets follow too (5→2, 9→3)
        let sub = mesh.submesh("S").unwrap();
        assert!(sub.contains_node(2));
        assert!(sub.contains_node(3));
        assert!(!sub.contains_node(5));
    }

    #[test]
    fn duplicate_conditions_are_removed() {
        let mut mesh = mesh_with_gaps();
        // same node set as condition 8, opposite orientation
        let edge = Geometry::new(GeometryKind::Line2, [5, 2]).unwrap();
        mesh.add_condition(Condition::new(9, edge, 1));

        let removed = clear_duplicate_conditions(&mut mesh, 0);
        assert_eq!(removed, 1);
        assert_eq!(mesh.conditions().len(), 1);
        assert!(mesh.conditions().get(8).is_some());
    }

    #[test]
    fn superfluous_nodes_are_cleared() {
        let mut mesh = mesh_with_gaps();
        // node 9 is referenced by no element
        let removed = clean_superfluous_nodes(&mut mesh);
        assert_eq!(removed, 1);
        assert!(mesh.nodes().get(9).is_none());
        assert_eq!(mesh.nodes().len(), 3);
    }

    #[test]
    fn zero_entity_data_copies_layout() {
        let mut old = mesh_with_gaps();
        old.elements_mut()
            .get_mut(4)
            .unwrap()
            .data
            .insert("DAMAGE".to_owned(), FieldValue::Scalar(0.9));

        let mut mesh = mesh_with_gaps();
        zero_entity_data(&mut mesh, &old);
        let data = &mesh.elements().get(4).unwrap().data;
        assert_eq!(data.get("DAMAGE"), Some(&FieldValue::Scalar(0.0)));
    }

    #[test]
    fn initialize_entities_clears_local_state() {
        let mut mesh = mesh_with_gaps();
        mesh.elements_mut()
            .get_mut(4)
            .unwrap()
            .data
            .insert("DAMAGE".to_owned(), FieldValue::Scalar(0.9));

        initialize_entities(&mut mesh);
        assert!(mesh.elements().get(4).unwrap().data.is_empty());
    }
}
