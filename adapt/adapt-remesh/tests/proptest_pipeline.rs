//! Property-based pipeline invariants over generated meshes.

use adapt_kernel::MidpointKernel;
use adapt_remesh::{RemeshingParams, RemeshingProcess};
use adapt_types::{Element, EntityId, Geometry, GeometryKind, MeshDimension, Node, SimMesh};
use proptest::prelude::*;

/// Structured k×k unit-square triangulation.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn grid_mesh(k: usize) -> SimMesh {
    let mut mesh = SimMesh::new(MeshDimension::Two, 1);
    let n = k + 1;
    for j in 0..n {
        for i in 0..n {
            let id = (j * n + i + 1) as EntityId;
            mesh.add_node(Node::from_coords(
                id,
                i as f64 / k as f64,
                j as f64 / k as f64,
                0.0,
                1,
            ));
        }
    }
    let mut element_id: EntityId = 1;
    for j in 0..k {
        for i in 0..k {
            let n00 = (j * n + i + 1) as EntityId;
            let n10 = n00 + 1;
            let n01 = n00 + n as EntityId;
            let n11 = n01 + 1;
            let tri_a = Geometry::new(GeometryKind::Triangle3, [n00, n10, n11]).unwrap();
            let tri_b = Geometry::new(GeometryKind::Triangle3, [n00, n11, n01]).unwrap();
            mesh.add_element(Element::new(element_id, tri_a, 1));
            mesh.add_element(Element::new(element_id + 1, tri_b, 1));
            element_id += 2;
        }
    }
    mesh
}

fn total_area(mesh: &SimMesh) -> f64 {
    mesh.elements()
        .iter()
        .map(|e| {
            let p: Vec<_> = e
                .geometry
                .node_ids()
                .iter()
                .map(|&id| mesh.nodes().get(id).unwrap().position)
                .collect();
            (p[1] - p[0]).cross(&(p[2] - p[0])).norm() * 0.5
        })
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn pass_keeps_ids_contiguous_and_subdomains_closed(
        k in 1usize..4,
        fraction in 0.0f64..1.0,
    ) {
        let mut mesh = grid_mesh(k);

        // tag a leading fraction of the elements as a sub-domain
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let tagged = ((mesh.elements().len() as f64) * fraction) as usize;
        let ids: Vec<EntityId> = mesh
            .elements()
            .iter()
            .take(tagged)
            .map(Element::id)
            .collect();
        if !ids.is_empty() {
            mesh.create_submesh("Left").unwrap().add_elements(ids);
        }

        let process =
            RemeshingProcess::new(RemeshingParams::default().with_echo_level(0)).unwrap();
        process.execute(&mut mesh, &MidpointKernel).unwrap();

        // Ids form exactly 1..=N per entity kind
        let node_ids: Vec<EntityId> = mesh.nodes().iter().map(Node::id).collect();
        prop_assert_eq!(node_ids, (1..=mesh.nodes().len() as EntityId).collect::<Vec<_>>());
        let element_ids: Vec<EntityId> = mesh.elements().iter().map(Element::id).collect();
        prop_assert_eq!(
            element_ids,
            (1..=mesh.elements().len() as EntityId).collect::<Vec<_>>()
        );

        // uniform midpoint refinement preserves the total area
        prop_assert!((total_area(&mesh) - 1.0).abs() < 1e-9);

        // closure: sub-domain node sets contain every referenced node
        if let Some(sub) = mesh.submesh("Left") {
            for id in sub.element_ids() {
                let element = mesh.elements().get(id).unwrap();
                for &node_id in element.geometry.node_ids() {
                    prop_assert!(sub.contains_node(node_id));
                }
            }
        }
    }
}
