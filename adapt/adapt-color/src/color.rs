//! Membership-set coloring.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use tracing::debug;

use adapt_types::{EntityId, SimMesh};

use crate::error::{ColorError, ColorResult};

/// Integer proxy for one unique combination of sub-mesh memberships.
///
/// Color 0 is reserved for "belongs to no named sub-mesh" (main mesh only).
pub type ColorId = u32;

/// The result of one coloring pass over a mesh.
///
/// Maps every node, element and condition Id to its color, and every color
/// back to the list of sub-mesh paths the combination stands for. Entities
/// absent from the maps carry color 0.
#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    node_colors: HashMap<EntityId, ColorId>,
    element_colors: HashMap<EntityId, ColorId>,
    condition_colors: HashMap<EntityId, ColorId>,
    names: HashMap<ColorId, Vec<String>>,
}

impl ColorAssignment {
    /// Color of a node (0 when unmapped).
    #[must_use]
    pub fn node_color(&self, id: EntityId) -> ColorId {
        self.node_colors.get(&id).copied().unwrap_or(0)
    }

    /// Color of an element (0 when unmapped).
    #[must_use]
    pub fn element_color(&self, id: EntityId) -> ColorId {
        self.element_colors.get(&id).copied().unwrap_or(0)
    }

    /// Color of a condition (0 when unmapped).
    #[must_use]
    pub fn condition_color(&self, id: EntityId) -> ColorId {
        self.condition_colors.get(&id).copied().unwrap_or(0)
    }

    /// Sub-mesh paths a color stands for (empty for color 0 and unknown
    /// colors).
    #[must_use]
    pub fn names_of(&self, color: ColorId) -> &[String] {
        self.names.get(&color).map_or(&[], Vec::as_slice)
    }

    /// Iterate over every named color and its sub-mesh paths.
    pub fn colors(&self) -> impl Iterator<Item = (ColorId, &[String])> {
        self.names.iter().map(|(c, n)| (*c, n.as_slice()))
    }

    /// Number of named colors (color 0 excluded).
    #[must_use]
    pub fn color_count(&self) -> usize {
        self.names.len()
    }
}

/// Compute colors for every entity of a mesh.
///
/// Membership is collected over every sub-mesh at every nesting level
/// (an entity in a nested sub-mesh is also a member of its ancestors).
/// Identical membership sets always map to identical colors within one
/// invocation; color values are allocated in sorted combination order, so
/// the same mesh always produces the same assignment. Values are not
/// stable across mesh topology changes.
///
/// # Errors
///
/// Returns [`ColorError::SubMeshVanished`] when the sub-mesh tree is
/// mutated concurrently with the pass.
pub fn compute_colors(mesh: &SimMesh) -> ColorResult<ColorAssignment> {
    let paths = mesh.recursive_submesh_names();

    let mut node_sets: HashMap<EntityId, Vec<String>> = HashMap::new();
    let mut element_sets: HashMap<EntityId, Vec<String>> = HashMap::new();
    let mut condition_sets: HashMap<EntityId, Vec<String>> = HashMap::new();

    for path in &paths {
        let sub = mesh
            .submesh(path)
            .ok_or_else(|| ColorError::SubMeshVanished { path: path.clone() })?;
        for id in sub.node_ids() {
            node_sets.entry(id).or_default().push(path.clone());
        }
        for id in sub.element_ids() {
            element_sets.entry(id).or_default().push(path.clone());
        }
        for id in sub.condition_ids() {
            condition_sets.entry(id).or_default().push(path.clone());
        }
    }

    // Canonicalize membership lists and collect the unique combinations.
    let mut combinations: BTreeSet<Vec<String>> = BTreeSet::new();
    for sets in [&mut node_sets, &mut element_sets, &mut condition_sets] {
        for membership in sets.values_mut() {
            membership.sort_unstable();
            membership.dedup();
            combinations.insert(membership.clone());
        }
    }

    // Colors 1..=N in sorted combination order.
    let mut combination_colors: HashMap<Vec<String>, ColorId> = HashMap::new();
    let mut names: HashMap<ColorId, Vec<String>> = HashMap::new();
    let mut next = 1;
    for combination in combinations {
        combination_colors.insert(combination.clone(), next);
        names.insert(next, combination);
        next += 1;
    }

    let to_colors = |sets: HashMap<EntityId, Vec<String>>| -> HashMap<EntityId, ColorId> {
        sets.into_iter()
            .filter_map(|(id, membership)| {
                combination_colors.get(&membership).map(|&c| (id, c))
            })
            .collect()
    };

    let assignment = ColorAssignment {
        node_colors: to_colors(node_sets),
        element_colors: to_colors(element_sets),
        condition_colors: to_colors(condition_sets),
        names,
    };

    debug!(
        colors = assignment.color_count(),
        submeshes = paths.len(),
        "computed sub-mesh colors"
    );

    Ok(assignment)
}
