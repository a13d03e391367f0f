//! Point location over a mesh.

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Matrix3, Point3};
use tracing::debug;

use adapt_types::{Element, EntityId, GeometryKind, MeshDimension, SimMesh};

use crate::error::{TransferError, TransferResult};

/// Barycentric weights accepted as "inside" down to this signed tolerance.
const INSIDE_TOL: f64 = 1e-10;

/// Cells flatter than this are treated as degenerate and never matched.
const DEGENERATE_TOL: f64 = 1e-14;

/// Per-donor-node interpolation weights.
pub type Weights = Vec<(EntityId, f64)>;

/// Where a query point landed relative to the searched mesh.
#[derive(Debug, Clone)]
pub enum Located {
    /// Inside a host element; weights are the shape-function values.
    Inside {
        /// Host element Id.
        element: EntityId,
        /// Donor node Ids with their weights (sum to 1).
        weights: Weights,
    },
    /// Outside every candidate; weights of the closest candidate, clamped.
    Extrapolated {
        /// Closest candidate element Id.
        element: EntityId,
        /// Clamped, renormalized donor weights.
        weights: Weights,
    },
    /// No usable host element; fall back to the nearest node.
    NearestNode {
        /// Nearest source node Id.
        node: EntityId,
    },
}

/// Spatial search structure over a mesh's elements and nodes.
///
/// Candidate host elements are found through a kd-tree over element
/// centroids; containment is then decided by barycentric coordinates.
/// Triangles and tetrahedra act as hosts; other kinds are skipped (their
/// nodes still participate in the nearest-node fallback).
pub struct ElementLocator<'a> {
    mesh: &'a SimMesh,
    element_ids: Vec<EntityId>,
    element_tree: KdTree<f64, 3>,
    node_ids: Vec<EntityId>,
    node_tree: KdTree<f64, 3>,
}

impl<'a> ElementLocator<'a> {
    /// Build the search structure.
    ///
    /// With `surface_elements` set, 3-D triangle elements also act as
    /// hosts (surface meshes); otherwise only the dimension's volume
    /// elements do.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::EmptySourceMesh`] when the mesh has no
    /// nodes, and [`TransferError::DanglingNode`] when element
    /// connectivity references a missing node.
    pub fn build(mesh: &'a SimMesh, surface_elements: bool) -> TransferResult<Self> {
        if mesh.nodes().is_empty() {
            return Err(TransferError::EmptySourceMesh);
        }

        let host_kinds: &[GeometryKind] = match mesh.dimension() {
            MeshDimension::Two => &[GeometryKind::Triangle3],
            MeshDimension::Three if surface_elements => {
                &[GeometryKind::Tetrahedron4, GeometryKind::Triangle3]
            }
            MeshDimension::Three => &[GeometryKind::Tetrahedron4],
        };

        let mut element_ids = Vec::new();
        let mut element_tree: KdTree<f64, 3> = KdTree::new();
        for element in mesh.elements() {
            if !host_kinds.contains(&element.geometry.kind()) {
                continue;
            }
            let centroid = element_centroid(mesh, element)?;
            #[allow(clippy::cast_possible_truncation)]
            let item = element_ids.len() as u64;
            element_tree.add(&[centroid.x, centroid.y, centroid.z], item);
            element_ids.push(element.id());
        }

        let mut node_ids = Vec::new();
        let mut node_tree: KdTree<f64, 3> = KdTree::new();
        for node in mesh.nodes() {
            let p = node.position;
            #[allow(clippy::cast_possible_truncation)]
            let item = node_ids.len() as u64;
            node_tree.add(&[p.x, p.y, p.z], item);
            node_ids.push(node.id());
        }

        debug!(
            hosts = element_ids.len(),
            nodes = node_ids.len(),
            "built element locator"
        );

        Ok(Self {
            mesh,
            element_ids,
            element_tree,
            node_ids,
            node_tree,
        })
    }

    /// Locate a point, testing at most `max_attempts` candidate elements.
    ///
    /// With `extrapolate` set, a point outside every candidate is matched
    /// to its closest candidate with clamped weights instead of falling
    /// back to the nearest node.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::DanglingNode`] on broken connectivity.
    pub fn locate(
        &self,
        point: Point3<f64>,
        max_attempts: usize,
        extrapolate: bool,
    ) -> TransferResult<Located> {
        let query = [point.x, point.y, point.z];

        if !self.element_ids.is_empty() {
            let attempts = max_attempts.max(1).min(self.element_ids.len());
            let candidates = self.element_tree.nearest_n::<SquaredEuclidean>(&query, attempts);

            for candidate in &candidates {
                let element_id = self.element_ids[candidate.item as usize];
                if let Some(weights) = self.weights_in(element_id, point)? {
                    if weights.iter().all(|&(_, w)| w >= -INSIDE_TOL) {
                        return Ok(Located::Inside {
                            element: element_id,
                            weights,
                        });
                    }
                }
            }

            if extrapolate {
                if let Some(first) = candidates.first() {
                    let element_id = self.element_ids[first.item as usize];
                    if let Some(weights) = self.weights_in(element_id, point)? {
                        return Ok(Located::Extrapolated {
                            element: element_id,
                            weights: clamp_weights(weights),
                        });
                    }
                }
            }
        }

        let nearest = self.node_tree.nearest_n::<SquaredEuclidean>(&query, 1);
        nearest
            .first()
            .map(|n| Located::NearestNode {
                node: self.node_ids[n.item as usize],
            })
            .ok_or(TransferError::EmptySourceMesh)
    }

    /// Barycentric weights of a point in an element, or `None` for
    /// degenerate geometry.
    fn weights_in(&self, element_id: EntityId, point: Point3<f64>) -> TransferResult<Option<Weights>> {
        let Some(element) = self.mesh.elements().get(element_id) else {
            return Ok(None);
        };
        let positions = element_positions(self.mesh, element)?;
        let ids = element.geometry.node_ids();

        let raw = match element.geometry.kind() {
            GeometryKind::Triangle3 => {
                triangle_weights(point, positions[0], positions[1], positions[2])
                    .map(|w| w.to_vec())
            }
            GeometryKind::Tetrahedron4 => {
                tetrahedron_weights(point, positions[0], positions[1], positions[2], positions[3])
                    .map(|w| w.to_vec())
            }
            _ => None,
        };

        Ok(raw.map(|w| ids.iter().copied().zip(w).collect()))
    }
}

fn element_positions(mesh: &SimMesh, element: &Element) -> TransferResult<Vec<Point3<f64>>> {
    element
        .geometry
        .node_ids()
        .iter()
        .map(|&id| {
            mesh.nodes()
                .get(id)
                .map(|n| n.position)
                .ok_or(TransferError::DanglingNode {
                    id,
                    element: element.id(),
                })
        })
        .collect()
}

fn element_centroid(mesh: &SimMesh, element: &Element) -> TransferResult<Point3<f64>> {
    let positions = element_positions(mesh, element)?;
    let mut sum = nalgebra::Vector3::zeros();
    for p in &positions {
        sum += p.coords;
    }
    #[allow(clippy::cast_precision_loss)]
    let centroid = Point3::from(sum / positions.len() as f64);
    Ok(centroid)
}

/// Barycentric weights of `p` in triangle `(a, b, c)`.
///
/// Works for planar meshes and for triangles embedded in 3-D (the point is
/// implicitly projected onto the triangle's plane).
#[must_use]
pub fn triangle_weights(
    p: Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
) -> Option<[f64; 3]> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00.mul_add(d11, -(d01 * d01));
    if denom.abs() < DEGENERATE_TOL {
        return None;
    }

    let v = d11.mul_add(d20, -(d01 * d21)) / denom;
    let w = d00.mul_add(d21, -(d01 * d20)) / denom;
    Some([1.0 - v - w, v, w])
}

/// Barycentric weights of `p` in tetrahedron `(a, b, c, d)`.
#[must_use]
pub fn tetrahedron_weights(
    p: Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    d: Point3<f64>,
) -> Option<[f64; 4]> {
    let m = Matrix3::from_columns(&[b - a, c - a, d - a]);
    if m.determinant().abs() < DEGENERATE_TOL {
        return None;
    }
    let local = m.lu().solve(&(p - a))?;
    Some([1.0 - local.x - local.y - local.z, local.x, local.y, local.z])
}

/// Clamp weights to `[0, 1]` and renormalize so they sum to 1.
fn clamp_weights(mut weights: Weights) -> Weights {
    for (_, w) in &mut weights {
        *w = w.clamp(0.0, 1.0);
    }
    let total: f64 = weights.iter().map(|&(_, w)| w).sum();
    if total > DEGENERATE_TOL {
        for (_, w) in &mut weights {
            *w /= total;
        }
    } else if let Some((_, first)) = weights.first_mut() {
        // all weights clamped away: pin everything on the closest corner
        *first = 1.0;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_types::{Geometry, MeshDimension, Node, SimMesh};

    fn square_mesh() -> SimMesh {
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
    fn triangle_weights_at_vertices() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let w = triangle_weights(a, a, b, c).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-12);
        let w = triangle_weights(c, a, b, c).unwrap();
        assert!((w[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_triangle_is_rejected() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(triangle_weights(a, a, b, c).is_none());
    }

    #[test]
    fn tetrahedron_weights_sum_to_one() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(0.0, 0.0, 1.0);
        let p = Point3::new(0.25, 0.25, 0.25);

        let w = tetrahedron_weights(p, a, b, c, d).unwrap();
        approx::assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn locate_inside_element() {
        let mesh = square_mesh();
        let locator = ElementLocator::build(&mesh, false).unwrap();

        let located = locator
            .locate(Point3::new(0.6, 0.2, 0.0), 4, false)
            .unwrap();
        match located {
            Located::Inside { element, weights } => {
                assert_eq!(element, 1);
                let sum: f64 = weights.iter().map(|&(_, w)| w).sum();
                assert!((sum - 1.0).abs() < 1e-10);
            }
            other => panic!("expected Inside, got {other:?}"),
        }
    }

    #[test]
    fn locate_outside_falls_back_to_nearest_node() {
        let mesh = square_mesh();
        let locator = ElementLocator::build(&mesh, false).unwrap();

        let located = locator
            .locate(Point3::new(5.0, 5.0, 0.0), 4, false)
            .unwrap();
        assert!(matches!(located, Located::NearestNode { node: 3 }));
    }

    #[test]
    fn locate_outside_extrapolates_when_asked() {
        let mesh = square_mesh();
        let locator = ElementLocator::build(&mesh, false).unwrap();

        let located = locator.locate(Point3::new(5.0, 5.0, 0.0), 4, true).unwrap();
        match located {
            Located::Extrapolated { weights, .. } => {
                let sum: f64 = weights.iter().map(|&(_, w)| w).sum();
                assert!((sum - 1.0).abs() < 1e-10);
                assert!(weights.iter().all(|&(_, w)| (0.0..=1.0).contains(&w)));
            }
            other => panic!("expected Extrapolated, got {other:?}"),
        }
    }

    #[test]
    fn empty_mesh_is_an_error() {
        let mesh = SimMesh::new(MeshDimension::Two, 1);
        assert!(matches!(
            ElementLocator::build(&mesh, false),
            Err(TransferError::EmptySourceMesh)
        ));
    }
}
