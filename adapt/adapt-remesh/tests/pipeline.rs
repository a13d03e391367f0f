//! End-to-end pipeline scenarios.

use adapt_kernel::{
    AdaptionField, DiscardedEntities, FlatMesh, KernelConfig, KernelOutput, KernelResult,
    MidpointKernel, PassthroughKernel, RemeshKernel,
};
use adapt_remesh::{Discretization, Framework, RemeshingError, RemeshingParams, RemeshingProcess};
use adapt_types::{
    fields, Condition, Element, EntityFlags, EntityId, Geometry, GeometryKind, MeshDimension,
    Node, SimMesh,
};
use nalgebra::Vector3;

/// Unit square: 4 nodes, 2 triangles, a boundary edge, one sub-domain
/// holding both triangles.
fn unit_square() -> SimMesh {
    let mut mesh = SimMesh::new(MeshDimension::Two, 2);
    for (id, x, y) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0), (4, 0.0, 1.0)] {
        mesh.add_node(Node::from_coords(id, x, y, 0.0, 2));
    }
    let tri_a = Geometry::new(GeometryKind::Triangle3, [1, 2, 3]).unwrap();
    let tri_b = Geometry::new(GeometryKind::Triangle3, [1, 3, 4]).unwrap();
    mesh.add_element(Element::new(1, tri_a, 1));
    mesh.add_element(Element::new(2, tri_b, 1));
    let edge = Geometry::new(GeometryKind::Line2, [1, 2]).unwrap();
    mesh.add_condition(Condition::new(1, edge, 1));
    mesh.create_submesh("Domain").unwrap().add_elements([1, 2]);
    mesh
}

fn quiet() -> RemeshingParams {
    RemeshingParams::default().with_echo_level(0)
}

fn total_area(mesh: &SimMesh) -> f64 {
    mesh.elements()
        .iter()
        .filter(|e| e.geometry.kind() == GeometryKind::Triangle3)
        .map(|e| {
            let p: Vec<_> = e
                .geometry
                .node_ids()
                .iter()
                .map(|&id| mesh.nodes().get(id).unwrap().position)
                .collect();
            let ab = p[1] - p[0];
            let ac = p[2] - p[0];
            ab.cross(&ac).norm() * 0.5
        })
        .sum()
}

fn assert_contiguous_ids(mesh: &SimMesh) {
    let node_ids: Vec<EntityId> = mesh.nodes().iter().map(Node::id).collect();
    assert_eq!(node_ids, (1..=mesh.nodes().len() as EntityId).collect::<Vec<_>>());
    let element_ids: Vec<EntityId> = mesh.elements().iter().map(Element::id).collect();
    assert_eq!(
        element_ids,
        (1..=mesh.elements().len() as EntityId).collect::<Vec<_>>()
    );
    let condition_ids: Vec<EntityId> = mesh.conditions().iter().map(Condition::id).collect();
    assert_eq!(
        condition_ids,
        (1..=mesh.conditions().len() as EntityId).collect::<Vec<_>>()
    );
}

#[test]
fn unit_square_round_trip_preserves_area_and_subdomain() {
    let mut mesh = unit_square();
    // target size large enough to avoid refinement: passthrough models this
    let process = RemeshingProcess::new(quiet().with_target_size(10.0)).unwrap();
    let report = process.execute(&mut mesh, &PassthroughKernel).unwrap();

    assert!(report.elements_after >= 1);
    approx::assert_relative_eq!(total_area(&mesh), 1.0, epsilon = 1e-6);

    // the sub-domain still holds 100% of the final elements
    let sub = mesh.submesh("Domain").unwrap();
    assert_eq!(sub.element_count(), mesh.elements().len());
    assert_contiguous_ids(&mesh);
}

#[test]
fn two_runs_are_deterministic() {
    let run = || {
        let mut mesh = unit_square();
        let process = RemeshingProcess::new(quiet()).unwrap();
        let report = process.execute(&mut mesh, &MidpointKernel).unwrap();
        (report.nodes_after, report.elements_after, total_area(&mesh))
    };

    let (nodes_a, elements_a, area_a) = run();
    let (nodes_b, elements_b, area_b) = run();
    assert_eq!(nodes_a, nodes_b);
    assert_eq!(elements_a, elements_b);
    assert!((area_a - area_b).abs() < 1e-10 * area_a.max(1.0));
    // midpoint refinement preserves the total area exactly
    assert!((area_a - 1.0).abs() < 1e-9);
}

#[test]
fn refinement_interpolates_history_onto_new_nodes() {
    let mut mesh = unit_square();
    // a field linear in x, two steps back
    for id in 1..=4 {
        let x = mesh.nodes().get(id).unwrap().position.x;
        let node = mesh.nodes_mut().get_mut(id).unwrap();
        node.history.set_scalar("PRESSURE", 0, x).unwrap();
        node.history.set_scalar("PRESSURE", 1, 10.0 * x).unwrap();
    }

    let process = RemeshingProcess::new(quiet()).unwrap();
    process.execute(&mut mesh, &MidpointKernel).unwrap();

    // every node of the refined mesh must reproduce the linear field
    for node in mesh.nodes() {
        let x = node.position.x;
        let current = node.history.get("PRESSURE", 0).unwrap().as_scalar().unwrap();
        let previous = node.history.get("PRESSURE", 1).unwrap().as_scalar().unwrap();
        assert!((current - x).abs() < 1e-9, "node {} current", node.id());
        assert!((previous - 10.0 * x).abs() < 1e-9, "node {} previous", node.id());
    }
}

#[test]
fn coincident_node_recovers_two_step_history_exactly() {
    let mut mesh = unit_square();
    for id in 1..=4 {
        let node = mesh.nodes_mut().get_mut(id).unwrap();
        node.history.set_scalar("TEMPERATURE", 0, 5.0).unwrap();
        node.history.set_scalar("TEMPERATURE", 1, 7.0).unwrap();
    }

    let process = RemeshingProcess::new(quiet()).unwrap();
    process.execute(&mut mesh, &PassthroughKernel).unwrap();

    let node = mesh.nodes().get(1).unwrap();
    let current = node.history.get("TEMPERATURE", 0).unwrap().as_scalar().unwrap();
    let previous = node.history.get("TEMPERATURE", 1).unwrap().as_scalar().unwrap();
    assert!((current - 5.0).abs() < 1e-9);
    assert!((previous - 7.0).abs() < 1e-9);
}

#[test]
fn node_only_subdomain_is_not_fatal() {
    let mut mesh = unit_square();
    mesh.create_submesh("Probes").unwrap().add_nodes([1, 3]);

    let process = RemeshingProcess::new(quiet()).unwrap();
    process.execute(&mut mesh, &PassthroughKernel).unwrap();

    // the sub-mesh may survive (possibly without entities) or lose its
    // members; both are acceptable, only a fatal error is not
    assert!(mesh.submesh("Probes").is_some());
}

#[test]
fn inlet_flag_survives_the_round_trip() {
    let mut mesh = unit_square();
    mesh.nodes_mut()
        .get_mut(2)
        .unwrap()
        .set_flag(EntityFlags::INLET, true);

    let process = RemeshingProcess::new(quiet()).unwrap();
    process.execute(&mut mesh, &PassthroughKernel).unwrap();

    // the node at (1, 0) round-trips under passthrough; find it by position
    let inlet_node = mesh
        .nodes()
        .iter()
        .find(|n| (n.position.x - 1.0).abs() < 1e-12 && n.position.y.abs() < 1e-12)
        .unwrap();
    assert!(inlet_node.is(EntityFlags::INLET));
}

#[test]
fn dof_template_is_attached_to_every_new_node() {
    let mut mesh = unit_square();
    for id in 1..=4 {
        let node = mesh.nodes_mut().get_mut(id).unwrap();
        let mut dof = adapt_types::Dof::new("DISPLACEMENT_X");
        dof.fix();
        node.dofs.push(dof);
    }

    let process = RemeshingProcess::new(quiet()).unwrap();
    process.execute(&mut mesh, &MidpointKernel).unwrap();

    for node in mesh.nodes() {
        assert_eq!(node.dofs.len(), 1);
        assert_eq!(node.dofs[0].variable, "DISPLACEMENT_X");
        // the template was freed before export
        assert!(!node.dofs[0].fixed);
    }
}

#[test]
fn lagrangian_pass_advances_positions_by_displacement() {
    let mut mesh = unit_square();
    let shift = Vector3::new(0.25, 0.0, 0.0);
    for id in 1..=4 {
        let node = mesh.nodes_mut().get_mut(id).unwrap();
        node.history
            .set_vector(fields::DISPLACEMENT, 0, shift)
            .unwrap();
        // the solver has already moved the mesh
        node.position += shift;
    }

    let params = quiet().with_framework(Framework::Lagrangian);
    let process = RemeshingProcess::new(params).unwrap();
    process.execute(&mut mesh, &PassthroughKernel).unwrap();

    for node in mesh.nodes() {
        let expected = node.initial_position + shift;
        assert!((node.position - expected).norm() < 1e-9, "node {}", node.id());
    }
}

#[test]
fn eulerian_pass_deduplicates_conditions() {
    let mut mesh = unit_square();
    // same edge twice, opposite orientation
    let edge = Geometry::new(GeometryKind::Line2, [2, 1]).unwrap();
    mesh.add_condition(Condition::new(2, edge, 1));

    let process = RemeshingProcess::new(quiet()).unwrap();
    let report = process.execute(&mut mesh, &PassthroughKernel).unwrap();

    assert_eq!(report.duplicate_conditions_removed, 1);
    assert_eq!(mesh.conditions().len(), 1);
    assert_contiguous_ids(&mesh);
}

/// A kernel that returns its input but flags the first element slot for
/// removal, as an iso-surface extraction would for a discarded region.
struct DiscardFirstElement;

impl RemeshKernel for DiscardFirstElement {
    fn name(&self) -> &'static str {
        "discard-first-element"
    }

    fn remesh(
        &self,
        input: &FlatMesh,
        _field: &AdaptionField,
        _config: &KernelConfig,
    ) -> KernelResult<KernelOutput> {
        let mesh = input.clone();
        let mut discarded = DiscardedEntities::none_for(&mesh);
        discarded.elements[0].push(1);
        Ok(KernelOutput { mesh, discarded })
    }
}

#[test]
fn iso_surface_region_removal_drops_entities_and_superfluous_nodes() {
    let mut mesh = unit_square();
    for id in 1..=4 {
        let node = mesh.nodes_mut().get_mut(id).unwrap();
        node.history
            .set_scalar(fields::DISTANCE, 0, node.position.x - 0.5)
            .unwrap();
    }

    let mut params = quiet().with_discretization(Discretization::IsoSurface);
    params.iso_surface.remove_regions = true;
    let process = RemeshingProcess::new(params).unwrap();
    let report = process.execute(&mut mesh, &DiscardFirstElement).unwrap();

    // triangle [1,2,3] is gone; node 2 is referenced by nothing anymore
    assert_eq!(report.elements_discarded_by_kernel, 1);
    assert_eq!(mesh.elements().len(), 1);
    assert_eq!(report.superfluous_nodes_removed, 1);
    assert_eq!(mesh.nodes().len(), 3);
    // region removal recreates the boundary from scratch; none here
    assert!(mesh.conditions().is_empty());
    assert_contiguous_ids(&mesh);
}

#[test]
fn iso_surface_mode_requires_the_level_set_field() {
    let mut mesh = unit_square();
    let params = quiet().with_discretization(Discretization::IsoSurface);
    let process = RemeshingProcess::new(params).unwrap();

    let err = process.execute(&mut mesh, &PassthroughKernel);
    assert!(matches!(err, Err(RemeshingError::MissingField { .. })));
    // fail-fast: the mesh was not touched, no snapshot was left behind
    assert_eq!(mesh.nodes().len(), 4);
    assert!(mesh.submesh("__flag_snapshot").is_none());
}

#[test]
fn empty_mesh_is_rejected() {
    let mut mesh = SimMesh::new(MeshDimension::Two, 1);
    let process = RemeshingProcess::new(quiet()).unwrap();
    assert!(matches!(
        process.execute(&mut mesh, &PassthroughKernel),
        Err(RemeshingError::EmptyMesh)
    ));
}

#[test]
fn closure_invariant_holds_after_refinement() {
    let mut mesh = unit_square();
    let process = RemeshingProcess::new(quiet()).unwrap();
    process.execute(&mut mesh, &MidpointKernel).unwrap();

    let sub = mesh.submesh("Domain").unwrap();
    assert!(sub.element_count() > 0);
    for id in sub.element_ids() {
        let element = mesh.elements().get(id).unwrap();
        for &node_id in element.geometry.node_ids() {
            assert!(
                sub.contains_node(node_id),
                "node {node_id} of element {id} missing from sub-domain"
            );
        }
    }
}

#[test]
fn second_pass_runs_on_the_result_of_the_first() {
    let mut mesh = unit_square();
    let process = RemeshingProcess::new(quiet()).unwrap();
    let first = process.execute(&mut mesh, &MidpointKernel).unwrap();
    let second = process.execute(&mut mesh, &MidpointKernel).unwrap();

    assert_eq!(second.nodes_before, first.nodes_after);
    assert!(second.elements_after > second.elements_before);
    assert!((total_area(&mesh) - 1.0).abs() < 1e-9);
    assert_contiguous_ids(&mesh);
}
