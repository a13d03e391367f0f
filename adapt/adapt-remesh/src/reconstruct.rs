//! Mesh reconstruction: flat kernel output → live mesh entities.

use hashbrown::{HashMap, HashSet};
use tracing::{debug, info};

use adapt_color::{ColorAssignment, ColorId};
use adapt_kernel::{FlatBlock, KernelOutput};
use adapt_types::{Condition, Dof, Element, EntityId, Geometry, Node, SimMesh};

use crate::error::RemeshingResult;
use crate::export::ReferenceTable;

/// Counts of what reconstruction created and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RebuildOutcome {
    /// Nodes created.
    pub nodes_created: usize,
    /// Elements created.
    pub elements_created: usize,
    /// Conditions created.
    pub conditions_created: usize,
    /// Element slots skipped on kernel removal lists.
    pub elements_skipped: usize,
    /// Condition slots skipped on kernel removal lists.
    pub conditions_skipped: usize,
}

/// Rebuild the live mesh from the kernel output.
///
/// The mesh must already be emptied of entities (the old ones live on in
/// the temporary old-mesh copy); its sub-mesh tree, properties registry
/// and process info are intact. Every new node receives a copy of the
/// captured DOF template. Entities on the kernel's removal lists are
/// skipped without an error; remaining entities are instantiated from the
/// reference-table prototype of their reported color (falling back to the
/// sole registered prototype) and receive freshly allocated contiguous
/// Ids, strictly increasing from 1 within their kind.
///
/// After bulk insertion, every color > 0 maps its entities into every
/// sub-mesh the color stands for, and each sub-mesh's node set is closed
/// under its element/condition membership. Colors without a corresponding
/// sub-mesh are silently treated as main-mesh-only.
///
/// # Errors
///
/// Propagates geometry construction failures (malformed kernel output).
pub fn rebuild_mesh(
    mesh: &mut SimMesh,
    output: &KernelOutput,
    colors: &ColorAssignment,
    references: &ReferenceTable,
    dof_template: &[Dof],
    echo_level: u8,
) -> RemeshingResult<RebuildOutcome> {
    let mut outcome = RebuildOutcome::default();
    let buffer_size = mesh.buffer_size();

    let mut color_nodes: HashMap<ColorId, Vec<EntityId>> = HashMap::new();
    let mut color_elements: HashMap<ColorId, Vec<EntityId>> = HashMap::new();
    let mut color_conditions: HashMap<ColorId, Vec<EntityId>> = HashMap::new();

    // nodes
    let flat = &output.mesh;
    let mut nodes = Vec::with_capacity(flat.node_count());
    for i in 0..flat.node_count() {
        #[allow(clippy::cast_possible_truncation)]
        let id = (i + 1) as EntityId;
        let [x, y, z] = flat.coordinate(i).unwrap_or([0.0; 3]);
        let mut node = Node::from_coords(id, x, y, z, buffer_size);
        node.dofs = dof_template.to_vec();
        let tag = flat.node_tag(i);
        if tag != 0 {
            color_nodes.entry(tag).or_default().push(id);
        }
        nodes.push(node);
    }
    outcome.nodes_created = nodes.len();
    mesh.nodes_mut().extend(nodes);

    // conditions (only when the old mesh had any prototype to clone from)
    if references.has_conditions() {
        let mut created = Vec::new();
        let mut next_id: EntityId = 1;
        for (block_index, block) in flat.condition_blocks().iter().enumerate() {
            let removal = output
                .discarded
                .conditions
                .get(block_index)
                .map_or(&[][..], Vec::as_slice);
            let (made, skipped) = build_entities(
                block,
                removal,
                &mut next_id,
                |id, geometry, properties| Condition::new(id, geometry, properties),
                |color| references.condition_for(color).map(|p| p.properties),
                &mut color_conditions,
            )?;
            outcome.conditions_skipped += skipped;
            created.extend(made);
        }
        outcome.conditions_created = created.len();
        mesh.conditions_mut().extend(created);
    }

    // elements
    if references.has_elements() {
        let mut created = Vec::new();
        let mut next_id: EntityId = 1;
        for (block_index, block) in flat.element_blocks().iter().enumerate() {
            let removal = output
                .discarded
                .elements
                .get(block_index)
                .map_or(&[][..], Vec::as_slice);
            let (made, skipped) = build_entities(
                block,
                removal,
                &mut next_id,
                |id, geometry, properties| Element::new(id, geometry, properties),
                |color| references.element_for(color).map(|p| p.properties),
                &mut color_elements,
            )?;
            outcome.elements_skipped += skipped;
            created.extend(made);
        }
        outcome.elements_created = created.len();
        mesh.elements_mut().extend(created);
    }

    // sub-mesh membership from colors
    for (color, paths) in colors.colors() {
        for path in paths {
            let Some(sub) = mesh.submesh_mut(path) else {
                // color without a live sub-mesh: main-mesh-only
                continue;
            };
            if let Some(ids) = color_nodes.get(&color) {
                sub.add_nodes(ids.iter().copied());
            }
            if let Some(ids) = color_elements.get(&color) {
                sub.add_elements(ids.iter().copied());
            }
            if let Some(ids) = color_conditions.get(&color) {
                sub.add_conditions(ids.iter().copied());
            }
        }
    }

    // close every sub-mesh's node set under element/condition membership
    close_submesh_nodes(mesh);

    if echo_level > 0 {
        info!(
            nodes = outcome.nodes_created,
            elements = outcome.elements_created,
            conditions = outcome.conditions_created,
            skipped_elements = outcome.elements_skipped,
            skipped_conditions = outcome.conditions_skipped,
            "mesh rebuilt from kernel output"
        );
    } else {
        debug!(?outcome, "mesh rebuilt from kernel output");
    }

    Ok(outcome)
}

/// Create the entities of one connectivity block, honoring the removal
/// list and allocating contiguous Ids.
fn build_entities<T>(
    block: &FlatBlock,
    removal: &[u32],
    next_id: &mut EntityId,
    make: impl Fn(EntityId, Geometry, adapt_types::PropertiesId) -> T,
    properties_for: impl Fn(ColorId) -> Option<adapt_types::PropertiesId>,
    color_buckets: &mut HashMap<ColorId, Vec<EntityId>>,
) -> RemeshingResult<(Vec<T>, usize)> {
    let mut created = Vec::with_capacity(block.len());
    let mut skipped = 0usize;
    let mut removal_cursor = 0usize;

    for (i, (connectivity, tag, _required)) in block.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let slot = (i + 1) as u32;
        if removal.get(removal_cursor) == Some(&slot) {
            removal_cursor += 1;
            skipped += 1;
            continue;
        }

        // color 0 or an unknown color both resolve to the fallback entry
        let Some(properties) = properties_for(tag) else {
            skipped += 1;
            continue;
        };

        let geometry = Geometry::new(block.kind(), connectivity.iter().copied())?;
        let id = *next_id;
        created.push(make(id, geometry, properties));
        if tag != 0 {
            color_buckets.entry(tag).or_default().push(id);
        }
        *next_id += 1;
    }

    Ok((created, skipped))
}

/// Add to every sub-mesh every node referenced by an element or condition
/// already in it (at every nesting level).
pub(crate) fn close_submesh_nodes(mesh: &mut SimMesh) {
    for path in mesh.recursive_submesh_names() {
        let Some(sub) = mesh.submesh(&path) else {
            continue;
        };
        let element_ids = sub.element_ids();
        let condition_ids = sub.condition_ids();

        let mut referenced: HashSet<EntityId> = HashSet::new();
        for id in element_ids {
            if let Some(element) = mesh.elements().get(id) {
                referenced.extend(element.geometry.node_ids().iter().copied());
            }
        }
        for id in condition_ids {
            if let Some(condition) = mesh.conditions().get(id) {
                referenced.extend(condition.geometry.node_ids().iter().copied());
            }
        }

        if let Some(sub) = mesh.submesh_mut(&path) {
            sub.add_nodes(referenced);
        }
    }
}
