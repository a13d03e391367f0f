//! A deterministic uniform-refinement kernel for planar meshes.

use hashbrown::HashMap;

use adapt_types::MeshDimension;

use crate::error::{KernelError, KernelResult};
use crate::flat::{AdaptionField, DiscardedEntities, FlatMesh, RefTag};
use crate::kernel::{KernelConfig, KernelOutput, RemeshKernel};

/// Splits every triangle into four at its edge midpoints.
///
/// Line conditions along split edges are split in two, reusing the same
/// midpoint nodes. A midpoint node inherits the common reference tag of
/// its edge endpoints, or tag 0 when the endpoints disagree. Planar
/// meshes only.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointKernel;

struct EdgeCache {
    midpoints: HashMap<(u32, u32), u32>,
}

impl EdgeCache {
    fn new() -> Self {
        Self {
            midpoints: HashMap::new(),
        }
    }

    /// 1-based midpoint node of the edge (a, b), created on first use.
    fn midpoint(&mut self, mesh: &mut FlatMesh, input: &FlatMesh, a: u32, b: u32) -> u32 {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&existing) = self.midpoints.get(&key) {
            return existing;
        }

        let pa = input.coordinate(a as usize - 1).unwrap_or([0.0; 3]);
        let pb = input.coordinate(b as usize - 1).unwrap_or([0.0; 3]);
        let mid = [
            (pa[0] + pb[0]) * 0.5,
            (pa[1] + pb[1]) * 0.5,
            (pa[2] + pb[2]) * 0.5,
        ];

        let tag_a = input.node_tag(a as usize - 1);
        let tag_b = input.node_tag(b as usize - 1);
        let tag: RefTag = if tag_a == tag_b { tag_a } else { 0 };

        let index = mesh.add_node(mid, tag, false);
        self.midpoints.insert(key, index);
        index
    }
}

impl RemeshKernel for MidpointKernel {
    fn name(&self) -> &'static str {
        "midpoint"
    }

    fn remesh(
        &self,
        input: &FlatMesh,
        _field: &AdaptionField,
        _config: &KernelConfig,
    ) -> KernelResult<KernelOutput> {
        if input.dimension() != MeshDimension::Two {
            return Err(KernelError::UnsupportedDimension {
                kernel: self.name().to_owned(),
            });
        }

        let mut mesh = FlatMesh::for_dimension(MeshDimension::Two);
        for i in 0..input.node_count() {
            let coords = input
                .coordinate(i)
                .ok_or(KernelError::NodeOutOfRange {
                    index: u32::try_from(i + 1).unwrap_or(u32::MAX),
                    count: input.node_count(),
                })?;
            let index = mesh.add_node(coords, input.node_tag(i), input.node_blocked(i));
            if input.node_required(i) {
                mesh.set_node_required(index);
            }
        }

        let mut cache = EdgeCache::new();

        for (nodes, tag, required) in input.element_blocks()[0].iter() {
            let (a, b, c) = (nodes[0], nodes[1], nodes[2]);
            let ab = cache.midpoint(&mut mesh, input, a, b);
            let bc = cache.midpoint(&mut mesh, input, b, c);
            let ca = cache.midpoint(&mut mesh, input, c, a);

            mesh.push_element(0, &[a, ab, ca], tag, required)?;
            mesh.push_element(0, &[ab, b, bc], tag, required)?;
            mesh.push_element(0, &[ca, bc, c], tag, required)?;
            mesh.push_element(0, &[ab, bc, ca], tag, required)?;
        }

        for (nodes, tag, required) in input.condition_blocks()[0].iter() {
            let (a, b) = (nodes[0], nodes[1]);
            let mid = cache.midpoint(&mut mesh, input, a, b);
            mesh.push_condition(0, &[a, mid], tag, required)?;
            mesh.push_condition(0, &[mid, b], tag, required)?;
        }

        let discarded = DiscardedEntities::none_for(&mesh);
        Ok(KernelOutput { mesh, discarded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> FlatMesh {
        let mut mesh = FlatMesh::for_dimension(MeshDimension::Two);
        mesh.add_node([0.0, 0.0, 0.0], 1, false);
        mesh.add_node([1.0, 0.0, 0.0], 1, false);
        mesh.add_node([0.0, 1.0, 0.0], 2, false);
        mesh.push_element(0, &[1, 2, 3], 5, false).unwrap();
        mesh.push_condition(0, &[1, 2], 9, false).unwrap();
        mesh
    }

    #[test]
    fn triangle_splits_into_four() {
        let input = unit_triangle();
        let output = MidpointKernel
            .remesh(
                &input,
                &AdaptionField::Metric(vec![1.0; 3]),
                &KernelConfig::default(),
            )
            .unwrap();

        assert_eq!(output.mesh.node_count(), 6);
        assert_eq!(output.mesh.element_count(), 4);
        assert_eq!(output.mesh.condition_count(), 2);
        output.mesh.check().unwrap();

        // every child triangle keeps the parent's tag
        for i in 0..4 {
            assert_eq!(output.mesh.element_blocks()[0].tag(i), 5);
        }
    }

    #[test]
    fn midpoint_tag_follows_edge_endpoints() {
        let input = unit_triangle();
        let output = MidpointKernel
            .remesh(
                &input,
                &AdaptionField::Metric(vec![1.0; 3]),
                &KernelConfig::default(),
            )
            .unwrap();

        // node 4 is the midpoint of edge (1, 2): both endpoints tag 1
        assert_eq!(output.mesh.node_tag(3), 1);
        // node 5 is the midpoint of edge (2, 3): tags 1 vs 2 disagree
        assert_eq!(output.mesh.node_tag(4), 0);
    }

    #[test]
    fn condition_split_reuses_element_midpoint() {
        let input = unit_triangle();
        let output = MidpointKernel
            .remesh(
                &input,
                &AdaptionField::Metric(vec![1.0; 3]),
                &KernelConfig::default(),
            )
            .unwrap();

        // the condition along (1, 2) references the same midpoint node the
        // triangle split created; no duplicate node is added
        let conditions = &output.mesh.condition_blocks()[0];
        assert_eq!(conditions.entity(0), Some(&[1, 4][..]));
        assert_eq!(conditions.entity(1), Some(&[4, 2][..]));
    }

    #[test]
    fn volumetric_input_is_rejected() {
        let input = FlatMesh::for_dimension(MeshDimension::Three);
        let err = MidpointKernel.remesh(
            &input,
            &AdaptionField::Metric(Vec::new()),
            &KernelConfig::default(),
        );
        assert!(matches!(err, Err(KernelError::UnsupportedDimension { .. })));
    }
}
