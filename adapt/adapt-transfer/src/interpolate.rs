//! Old→new mesh field interpolation.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, warn};

use adapt_types::{EntityId, FieldFrame, FieldValue, Node, SimMesh};

use crate::error::{TransferError, TransferResult};
use crate::locate::{ElementLocator, Located, Weights};

/// Interpolation policy knobs.
#[derive(Debug, Clone)]
pub struct TransferParams {
    /// Bound on candidate host elements tested per point.
    pub max_search_attempts: usize,
    /// Also transfer the non-historical value store.
    pub interpolate_non_historical: bool,
    /// Extrapolate from the closest host instead of copying the nearest
    /// node when a point lies outside every candidate.
    pub extrapolate_contour_values: bool,
    /// Let 3-D triangle elements act as interpolation hosts.
    pub surface_elements: bool,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            max_search_attempts: 100,
            interpolate_non_historical: false,
            extrapolate_contour_values: false,
            surface_elements: false,
        }
    }
}

/// Outcome counts of one interpolation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferReport {
    /// Nodes processed.
    pub nodes_total: usize,
    /// Nodes matched inside a host element.
    pub inside: usize,
    /// Nodes matched by clamped extrapolation.
    pub extrapolated: usize,
    /// Nodes that fell back to nearest-node copying.
    pub nearest_node: usize,
}

enum Outcome {
    Inside,
    Extrapolated,
    NearestNode,
}

struct NodePayload {
    id: EntityId,
    frames: Vec<FieldFrame>,
    values: Option<FieldFrame>,
    outcome: Outcome,
}

/// Interpolate every historical field frame (and optionally the
/// non-historical values) from the old mesh onto the new mesh's nodes.
///
/// Both meshes must be in the same reference frame: in the Lagrangian
/// framework the caller resets the old mesh to its undeformed
/// configuration before calling this. The pass is deterministic for
/// identical inputs; per-node work runs in parallel and the results are
/// applied in a single sequential sweep.
///
/// # Errors
///
/// Returns [`TransferError::EmptySourceMesh`] when the old mesh has no
/// nodes while the new mesh has some, and propagates connectivity errors
/// from the locator.
pub fn interpolate_nodal_values(
    old: &SimMesh,
    new: &mut SimMesh,
    params: &TransferParams,
) -> TransferResult<TransferReport> {
    let mut report = TransferReport {
        nodes_total: new.nodes().len(),
        ..TransferReport::default()
    };
    if new.nodes().is_empty() {
        return Ok(report);
    }

    let locator = ElementLocator::build(old, params.surface_elements)?;
    let buffer_size = new.buffer_size();

    let queries: Vec<(EntityId, Point3<f64>)> =
        new.nodes().iter().map(|n| (n.id(), n.position)).collect();

    let payloads: Vec<TransferResult<NodePayload>> = queries
        .par_iter()
        .map(|&(id, point)| {
            let located = locator.locate(
                point,
                params.max_search_attempts,
                params.extrapolate_contour_values,
            )?;
            let (frames, values, outcome) = match located {
                Located::Inside { weights, .. } => {
                    let (frames, values) = weighted_payload(old, &weights, buffer_size, params);
                    (frames, values, Outcome::Inside)
                }
                Located::Extrapolated { weights, .. } => {
                    let (frames, values) = weighted_payload(old, &weights, buffer_size, params);
                    (frames, values, Outcome::Extrapolated)
                }
                Located::NearestNode { node } => {
                    let (frames, values) = copied_payload(old, node, buffer_size, params);
                    (frames, values, Outcome::NearestNode)
                }
            };
            Ok(NodePayload {
                id,
                frames,
                values,
                outcome,
            })
        })
        .collect();

    // Single-threaded apply keeps the mutation on the orchestrating thread.
    for payload in payloads {
        let payload = payload?;
        match payload.outcome {
            Outcome::Inside => report.inside += 1,
            Outcome::Extrapolated => report.extrapolated += 1,
            Outcome::NearestNode => report.nearest_node += 1,
        }
        if let Some(node) = new.nodes_mut().get_mut(payload.id) {
            for (step, frame) in payload.frames.into_iter().enumerate() {
                if let Some(slot) = node.history.frame_mut(step) {
                    *slot = frame;
                }
            }
            if let Some(values) = payload.values {
                node.values = values;
            }
        }
    }

    if report.nearest_node > 0 {
        warn!(
            fallbacks = report.nearest_node,
            total = report.nodes_total,
            "some nodes fell back to nearest-node copying"
        );
    }
    debug!(
        inside = report.inside,
        extrapolated = report.extrapolated,
        nearest = report.nearest_node,
        "nodal interpolation finished"
    );

    Ok(report)
}

/// Transfer element-local data (internal variables) from the old mesh by
/// nearest-centroid matching.
///
/// Every new element receives a clone of the data frame of the
/// geometrically closest old element. Used by the Lagrangian framework
/// after the nodal pass.
///
/// # Errors
///
/// Returns [`TransferError::DanglingNode`] on broken connectivity in
/// either mesh.
pub fn transfer_element_data(old: &SimMesh, new: &mut SimMesh) -> TransferResult<()> {
    if old.elements().is_empty() || new.elements().is_empty() {
        return Ok(());
    }

    let mut ids = Vec::with_capacity(old.elements().len());
    let mut tree: kiddo::KdTree<f64, 3> = kiddo::KdTree::new();
    for element in old.elements() {
        let c = centroid(old, element.geometry.node_ids(), element.id())?;
        #[allow(clippy::cast_possible_truncation)]
        let item = ids.len() as u64;
        tree.add(&[c.x, c.y, c.z], item);
        ids.push(element.id());
    }

    let targets: Vec<(EntityId, Point3<f64>)> = new
        .elements()
        .iter()
        .map(|e| Ok((e.id(), centroid(new, e.geometry.node_ids(), e.id())?)))
        .collect::<TransferResult<_>>()?;

    for (id, c) in targets {
        let nearest = tree.nearest_n::<kiddo::SquaredEuclidean>(&[c.x, c.y, c.z], 1);
        let Some(found) = nearest.first() else {
            continue;
        };
        let donor_id = ids[found.item as usize];
        let data = old
            .elements()
            .get(donor_id)
            .map(|e| e.data.clone())
            .unwrap_or_default();
        if let Some(element) = new.elements_mut().get_mut(id) {
            element.data = data;
        }
    }

    Ok(())
}

fn centroid(mesh: &SimMesh, node_ids: &[EntityId], entity: EntityId) -> TransferResult<Point3<f64>> {
    let mut sum = Vector3::zeros();
    for &id in node_ids {
        let node = mesh
            .nodes()
            .get(id)
            .ok_or(TransferError::DanglingNode {
                id,
                element: entity,
            })?;
        sum += node.position.coords;
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(Point3::from(sum / node_ids.len() as f64))
}

/// Weighted combination of donor-node frames and values.
fn weighted_payload(
    old: &SimMesh,
    weights: &Weights,
    buffer_size: usize,
    params: &TransferParams,
) -> (Vec<FieldFrame>, Option<FieldFrame>) {
    let donors: Vec<(&Node, f64)> = weights
        .iter()
        .filter_map(|&(id, w)| old.nodes().get(id).map(|n| (n, w)))
        .collect();

    let mut frames = Vec::with_capacity(buffer_size);
    for step in 0..buffer_size {
        let mut scalars: HashMap<String, f64> = HashMap::new();
        let mut vectors: HashMap<String, Vector3<f64>> = HashMap::new();
        for &(node, w) in &donors {
            let Some(frame) = node.history.frame(step) else {
                continue;
            };
            accumulate(frame, w, &mut scalars, &mut vectors);
        }
        frames.push(into_frame(scalars, vectors));
    }

    let values = params.interpolate_non_historical.then(|| {
        let mut scalars: HashMap<String, f64> = HashMap::new();
        let mut vectors: HashMap<String, Vector3<f64>> = HashMap::new();
        for &(node, w) in &donors {
            accumulate(&node.values, w, &mut scalars, &mut vectors);
        }
        into_frame(scalars, vectors)
    });

    (frames, values)
}

/// Wholesale copy of one donor node's frames and values.
fn copied_payload(
    old: &SimMesh,
    donor: EntityId,
    buffer_size: usize,
    params: &TransferParams,
) -> (Vec<FieldFrame>, Option<FieldFrame>) {
    let Some(node) = old.nodes().get(donor) else {
        return (vec![FieldFrame::new(); buffer_size], None);
    };
    let mut frames = Vec::with_capacity(buffer_size);
    for step in 0..buffer_size {
        frames.push(node.history.frame(step).cloned().unwrap_or_default());
    }
    let values = params
        .interpolate_non_historical
        .then(|| node.values.clone());
    (frames, values)
}

fn accumulate(
    frame: &FieldFrame,
    weight: f64,
    scalars: &mut HashMap<String, f64>,
    vectors: &mut HashMap<String, Vector3<f64>>,
) {
    for (name, value) in frame {
        match value {
            FieldValue::Scalar(v) => {
                *scalars.entry(name.clone()).or_insert(0.0) += weight * v;
            }
            FieldValue::Vector(v) => {
                *vectors.entry(name.clone()).or_insert_with(Vector3::zeros) += weight * v;
            }
        }
    }
}

fn into_frame(scalars: HashMap<String, f64>, vectors: HashMap<String, Vector3<f64>>) -> FieldFrame {
    let mut frame = FieldFrame::with_capacity(scalars.len() + vectors.len());
    for (name, v) in scalars {
        frame.insert(name, FieldValue::Scalar(v));
    }
    for (name, v) in vectors {
        frame.insert(name, FieldValue::Vector(v));
    }
    frame
}
