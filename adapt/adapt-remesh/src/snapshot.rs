//! Flag persistence across the mesh replacement.
//!
//! Flags live on entity instances, which a remeshing pass destroys. Before
//! the replacement, the pipeline records flag state as a hidden sub-mesh
//! with one child per persistent flag. Because those children take part in
//! the coloring pass like any other sub-mesh, the new entities come back
//! as members of the matching children, and the flags can be re-applied
//! from membership before the snapshot is deleted.

use adapt_types::{flag_by_name, EntityId, SimMesh, PERSISTENT_FLAGS};

use crate::error::RemeshingResult;

/// Name of the hidden snapshot sub-mesh.
pub const FLAG_SNAPSHOT: &str = "__flag_snapshot";

/// Prefix of each per-flag child.
const FLAG_PREFIX: &str = "FLAG_";

/// Record current flag state as the snapshot sub-mesh.
///
/// Flags carried by no entity get no child, so empty combinations do not
/// pollute the coloring pass.
///
/// # Errors
///
/// Propagates sub-mesh creation failures.
pub fn create_flag_snapshot(mesh: &mut SimMesh) -> RemeshingResult<()> {
    let mut recorded: Vec<(String, Vec<EntityId>, Vec<EntityId>, Vec<EntityId>)> = Vec::new();

    for &(name, flag) in PERSISTENT_FLAGS {
        let nodes: Vec<EntityId> = mesh
            .nodes()
            .iter()
            .filter(|n| n.is(flag))
            .map(adapt_types::Node::id)
            .collect();
        let elements: Vec<EntityId> = mesh
            .elements()
            .iter()
            .filter(|e| e.is(flag))
            .map(adapt_types::Element::id)
            .collect();
        let conditions: Vec<EntityId> = mesh
            .conditions()
            .iter()
            .filter(|c| c.is(flag))
            .map(adapt_types::Condition::id)
            .collect();

        if nodes.is_empty() && elements.is_empty() && conditions.is_empty() {
            continue;
        }
        recorded.push((format!("{FLAG_PREFIX}{name}"), nodes, elements, conditions));
    }

    let root = mesh.ensure_submesh(FLAG_SNAPSHOT)?;
    for (child_name, nodes, elements, conditions) in recorded {
        let child = root.ensure_child(&child_name);
        child.add_nodes(nodes);
        child.add_elements(elements);
        child.add_conditions(conditions);
    }
    Ok(())
}

/// Re-apply flags from snapshot membership, then delete the snapshot.
///
/// Missing entities (removed by the remesher) are skipped silently; a
/// snapshot child whose name does not match a known flag is ignored.
pub fn restore_flag_snapshot(mesh: &mut SimMesh) {
    let Some(root) = mesh.submesh(FLAG_SNAPSHOT) else {
        return;
    };

    let mut to_apply = Vec::new();
    for child in root.children() {
        let Some(flag) = child
            .name()
            .strip_prefix(FLAG_PREFIX)
            .and_then(flag_by_name)
        else {
            continue;
        };
        to_apply.push((
            flag,
            child.node_ids(),
            child.element_ids(),
            child.condition_ids(),
        ));
    }

    for (flag, nodes, elements, conditions) in to_apply {
        for id in nodes {
            if let Some(node) = mesh.nodes_mut().get_mut(id) {
                node.set_flag(flag, true);
            }
        }
        for id in elements {
            if let Some(element) = mesh.elements_mut().get_mut(id) {
                element.set_flag(flag, true);
            }
        }
        for id in conditions {
            if let Some(condition) = mesh.conditions_mut().get_mut(id) {
                condition.set_flag(flag, true);
            }
        }
    }

    mesh.remove_submesh(FLAG_SNAPSHOT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_types::{EntityFlags, MeshDimension, Node};

    fn flagged_mesh() -> SimMesh {
        let mut mesh = SimMesh::new(MeshDimension::Two, 1);
        for id in 1..=3 {
            mesh.add_node(Node::from_coords(id, f64::from(id), 0.0, 0.0, 1));
        }
        mesh.nodes_mut()
            .get_mut(2)
            .unwrap()
            .set_flag(EntityFlags::INLET, true);
        mesh
    }

    #[test]
    fn snapshot_records_only_carried_flags() {
        let mut mesh = flagged_mesh();
        create_flag_snapshot(&mut mesh).unwrap();

        let root = mesh.submesh(FLAG_SNAPSHOT).unwrap();
        assert_eq!(root.children().len(), 1);
        assert!(root.find("FLAG_INLET").is_some_and(|s| s.contains_node(2)));
    }

    #[test]
    fn restore_reapplies_and_removes_snapshot() {
        let mut mesh = flagged_mesh();
        create_flag_snapshot(&mut mesh).unwrap();

        // simulate the replacement wiping flags
        mesh.nodes_mut().get_mut(2).unwrap().flags = EntityFlags::default();

        restore_flag_snapshot(&mut mesh);
        assert!(mesh.nodes().get(2).unwrap().is(EntityFlags::INLET));
        assert!(mesh.submesh(FLAG_SNAPSHOT).is_none());
    }

    #[test]
    fn restore_without_snapshot_is_a_no_op() {
        let mut mesh = flagged_mesh();
        restore_flag_snapshot(&mut mesh);
        assert!(mesh.submesh(FLAG_SNAPSHOT).is_none());
    }
}
