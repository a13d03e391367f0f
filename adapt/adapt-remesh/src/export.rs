//! Mesh export adapter: live mesh → flat kernel representation.

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{info, warn};

use adapt_color::{compute_colors, ColorAssignment, ColorId};
use adapt_kernel::{AdaptionField, FlatMesh};
use adapt_types::{
    fields, Dof, EntityFlags, EntityId, FieldValue, GeometryKind, MeshDimension, PropertiesId,
    SimMesh,
};

use crate::error::{RemeshingError, RemeshingResult};
use crate::params::{Framework, RemeshingParams};

/// One exemplar per color, enough to instantiate new entities of that
/// color: the geometry kind it carried and the shared properties it
/// referenced.
#[derive(Debug, Clone, Copy)]
pub struct Prototype {
    /// Geometry kind of the exemplar.
    pub kind: GeometryKind,
    /// Properties the exemplar referenced.
    pub properties: PropertiesId,
}

/// Color → prototype tables for elements and conditions.
///
/// Color 0 holds the fallback prototype (the sole registered type); a
/// color without an exact entry falls back to it. This assumes each
/// sub-domain carries one homogeneous entity type, a documented
/// limitation inherited from the reconstruction contract.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    elements: HashMap<ColorId, Prototype>,
    conditions: HashMap<ColorId, Prototype>,
}

impl ReferenceTable {
    /// Record the fallback element prototype.
    pub fn set_default_element(&mut self, prototype: Prototype) {
        self.elements.insert(0, prototype);
    }

    /// Record the fallback condition prototype.
    pub fn set_default_condition(&mut self, prototype: Prototype) {
        self.conditions.insert(0, prototype);
    }

    /// Record the first element exemplar seen for a color.
    pub fn insert_element(&mut self, color: ColorId, prototype: Prototype) {
        self.elements.entry(color).or_insert(prototype);
    }

    /// Record the first condition exemplar seen for a color.
    pub fn insert_condition(&mut self, color: ColorId, prototype: Prototype) {
        self.conditions.entry(color).or_insert(prototype);
    }

    /// Element prototype for a color, falling back to the color-0 entry.
    #[must_use]
    pub fn element_for(&self, color: ColorId) -> Option<Prototype> {
        self.elements
            .get(&color)
            .or_else(|| self.elements.get(&0))
            .copied()
    }

    /// Condition prototype for a color, falling back to the color-0 entry.
    #[must_use]
    pub fn condition_for(&self, color: ColorId) -> Option<Prototype> {
        self.conditions
            .get(&color)
            .or_else(|| self.conditions.get(&0))
            .copied()
    }

    /// Whether any element prototype is registered.
    #[must_use]
    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    /// Whether any condition prototype is registered.
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Drop every prototype.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.conditions.clear();
    }
}

/// Everything the export pass hands to the rest of the pipeline.
#[derive(Debug)]
pub struct ExportedMesh {
    /// The flat kernel-side mesh.
    pub flat: FlatMesh,
    /// Color maps computed over the pre-export entity Ids.
    pub colors: ColorAssignment,
    /// DOF template captured from a representative node, every DOF freed.
    pub dof_template: Vec<Dof>,
    /// Color → prototype tables for reconstruction.
    pub references: ReferenceTable,
    /// Elements excluded because their kind is unsupported here.
    pub skipped_elements: usize,
    /// Conditions excluded because their kind is unsupported here.
    pub skipped_conditions: usize,
}

/// Walk the live mesh and populate the flat kernel representation.
///
/// Side effect: every node, element and condition Id is overwritten with
/// its contiguous 1-based export index (irreversible for this pass), and
/// element/condition connectivity is rewritten to the new node Ids.
/// Geometry kinds the kernel layout does not support are skipped with a
/// warning and excluded from the kernel-side counts; the pass continues.
///
/// # Errors
///
/// Propagates coloring and flat-mesh assembly failures.
pub fn export_mesh(mesh: &mut SimMesh, params: &RemeshingParams) -> RemeshingResult<ExportedMesh> {
    let colors = compute_colors(mesh)?;
    let dimension = mesh.dimension();
    let mut flat = FlatMesh::for_dimension(dimension);

    // census of exportable entities (data-parallel count, warnings for
    // unsupported kinds)
    let probe = FlatMesh::for_dimension(dimension);
    let (element_counts, skipped_elements) = census(
        mesh.elements().as_slice(),
        |e| (probe.element_block_for(e.geometry.kind()), e.geometry.kind()),
        "element",
    );
    let (condition_counts, skipped_conditions) = census(
        mesh.conditions().as_slice(),
        |c| (probe.condition_block_for(c.geometry.kind()), c.geometry.kind()),
        "condition",
    );
    if params.echo_level > 0 && (skipped_elements > 0 || skipped_conditions > 0) {
        info!(
            elements = mesh.elements().len(),
            exportable_elements = element_counts[0] + element_counts[1],
            conditions = mesh.conditions().len(),
            exportable_conditions = condition_counts[0] + condition_counts[1],
            "some entities are excluded from the kernel counts"
        );
    }

    // DOF template from an arbitrary representative node (all nodes are
    // assumed to share the same DOF set); freed before export since the
    // kernel does not model DOFs
    let mut dof_template = mesh
        .nodes()
        .first()
        .map(|n| n.dofs.clone())
        .unwrap_or_default();
    for dof in &mut dof_template {
        dof.free();
    }

    // nodes: contiguous 1-based Ids overwrite entity Ids
    let lagrangian = params.framework == Framework::Lagrangian;
    let mut node_map: HashMap<EntityId, EntityId> = HashMap::with_capacity(mesh.nodes().len());
    for (i, node) in mesh.nodes_mut().iter_mut().enumerate() {
        let old_id = node.id();
        #[allow(clippy::cast_possible_truncation)]
        let new_id = (i + 1) as EntityId;
        let p = if lagrangian {
            node.initial_position
        } else {
            node.position
        };
        flat.add_node([p.x, p.y, p.z], colors.node_color(old_id), node.is(EntityFlags::BLOCKED));
        node_map.insert(old_id, new_id);
        node.set_id(new_id);
    }

    // reference prototypes: the fallback entry first, then one exemplar
    // per color
    let mut references = ReferenceTable::default();
    if let Some(first) = mesh.elements().first() {
        references.set_default_element(Prototype {
            kind: first.geometry.kind(),
            properties: first.properties,
        });
    }
    if let Some(first) = mesh.conditions().first() {
        let kind = match dimension {
            MeshDimension::Two => GeometryKind::Line2,
            MeshDimension::Three => GeometryKind::Triangle3,
        };
        references.set_default_condition(Prototype {
            kind,
            properties: first.properties,
        });
    }

    // elements
    let mut element_map: HashMap<EntityId, EntityId> =
        HashMap::with_capacity(mesh.elements().len());
    for (i, element) in mesh.elements_mut().iter_mut().enumerate() {
        let old_id = element.id();
        let color = colors.element_color(old_id);
        element.geometry.remap_nodes(&node_map);
        if let Some(block) = flat.element_block_for(element.geometry.kind()) {
            flat.push_element(
                block,
                element.geometry.node_ids(),
                color,
                element.is(EntityFlags::BLOCKED),
            )?;
            references.insert_element(
                color,
                Prototype {
                    kind: element.geometry.kind(),
                    properties: element.properties,
                },
            );
        }
        #[allow(clippy::cast_possible_truncation)]
        let new_id = (i + 1) as EntityId;
        element_map.insert(old_id, new_id);
        element.set_id(new_id);
    }

    // conditions
    let mut condition_map: HashMap<EntityId, EntityId> =
        HashMap::with_capacity(mesh.conditions().len());
    for (i, condition) in mesh.conditions_mut().iter_mut().enumerate() {
        let old_id = condition.id();
        let color = colors.condition_color(old_id);
        condition.geometry.remap_nodes(&node_map);
        if let Some(block) = flat.condition_block_for(condition.geometry.kind()) {
            flat.push_condition(
                block,
                condition.geometry.node_ids(),
                color,
                condition.is(EntityFlags::BLOCKED),
            )?;
            references.insert_condition(
                color,
                Prototype {
                    kind: condition.geometry.kind(),
                    properties: condition.properties,
                },
            );
        }
        #[allow(clippy::cast_possible_truncation)]
        let new_id = (i + 1) as EntityId;
        condition_map.insert(old_id, new_id);
        condition.set_id(new_id);
    }

    // sub-mesh Id sets must follow the overwritten Ids
    mesh.remap_submesh_ids(&node_map, &element_map, &condition_map);

    Ok(ExportedMesh {
        flat,
        colors,
        dof_template,
        references,
        skipped_elements,
        skipped_conditions,
    })
}

/// Assemble the per-node adaptation field in export node order.
///
/// Standard mode reads the `METRIC` non-historical value per node, filling
/// the configured global target size where a node carries none. Iso-surface
/// mode reads the configured level-set variable and fails on any node
/// missing it.
///
/// # Errors
///
/// Returns [`RemeshingError::MissingField`] when the iso-surface variable
/// is absent from a node.
pub fn build_adaption_field(
    mesh: &SimMesh,
    params: &RemeshingParams,
) -> RemeshingResult<AdaptionField> {
    match params.discretization {
        adapt_kernel::Discretization::Standard => {
            let metric = mesh
                .nodes()
                .iter()
                .map(|n| {
                    n.values
                        .get(fields::METRIC)
                        .and_then(FieldValue::as_scalar)
                        .unwrap_or(params.target_size)
                })
                .collect();
            Ok(AdaptionField::Metric(metric))
        }
        adapt_kernel::Discretization::IsoSurface => {
            let name = &params.iso_surface.variable;
            let mut values = Vec::with_capacity(mesh.nodes().len());
            for node in mesh.nodes() {
                let value = if params.iso_surface.nonhistorical_variable {
                    node.values.get(name).and_then(FieldValue::as_scalar)
                } else {
                    node.history.get(name, 0).and_then(FieldValue::as_scalar)
                };
                let value = value.ok_or_else(|| RemeshingError::MissingField {
                    id: node.id(),
                    field: name.clone(),
                })?;
                values.push(value);
            }
            Ok(AdaptionField::LevelSet(values))
        }
    }
}

/// Warn about sub-meshes that contain only nodes: they are not guaranteed
/// to survive the pass.
pub(crate) fn warn_node_only_submeshes(mesh: &SimMesh) {
    for path in mesh.recursive_submesh_names() {
        let Some(sub) = mesh.submesh(&path) else {
            continue;
        };
        if sub.node_count() > 0 && sub.element_count() == 0 && sub.condition_count() == 0 {
            warn!(
                submesh = %path,
                "sub-mesh contains only nodes and no elements/conditions; \
                 it is not guaranteed to survive the remeshing pass"
            );
        }
    }
}

/// Data-parallel count of entities per connectivity block, warning about
/// unsupported kinds.
fn census<T: Sync>(
    items: &[T],
    classify: impl Fn(&T) -> (Option<usize>, GeometryKind) + Sync,
    family: &'static str,
) -> ([usize; 2], usize) {
    items
        .par_iter()
        .map(|item| match classify(item) {
            (Some(0), _) => ([1, 0], 0),
            (Some(_), _) => ([0, 1], 0),
            (None, kind) => {
                warn!(
                    family,
                    ?kind,
                    nodes = kind.node_count(),
                    "geometry kind cannot be remeshed here; entity is skipped"
                );
                ([0, 0], 1)
            }
        })
        .reduce(
            || ([0, 0], 0),
            |a, b| ([a.0[0] + b.0[0], a.0[1] + b.0[1]], a.1 + b.1),
        )
}
