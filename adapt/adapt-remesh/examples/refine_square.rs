//! Refine a unit square twice with the built-in midpoint kernel and print
//! the pass reports.
//!
//! Run with: `cargo run -p adapt-remesh --example refine_square`

use adapt_kernel::MidpointKernel;
use adapt_remesh::{RemeshingParams, RemeshingProcess};
use adapt_types::{Element, Geometry, GeometryKind, MeshDimension, Node, SimMesh};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut mesh = SimMesh::new(MeshDimension::Two, 1);
    for (id, x, y) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0), (4, 0.0, 1.0)] {
        mesh.add_node(Node::from_coords(id, x, y, 0.0, 1));
    }
    mesh.add_element(Element::new(
        1,
        Geometry::new(GeometryKind::Triangle3, [1, 2, 3])?,
        1,
    ));
    mesh.add_element(Element::new(
        2,
        Geometry::new(GeometryKind::Triangle3, [1, 3, 4])?,
        1,
    ));
    mesh.create_submesh("Domain")?.add_elements([1, 2]);

    let process = RemeshingProcess::new(RemeshingParams::default().with_target_size(0.25))?;

    for pass in 1..=2 {
        let report = process.execute(&mut mesh, &MidpointKernel)?;
        println!(
            "pass {pass}: {} -> {} nodes, {} -> {} elements",
            report.nodes_before, report.nodes_after, report.elements_before, report.elements_after
        );
    }

    let domain = mesh
        .submesh("Domain")
        .ok_or("Domain sub-mesh disappeared")?;
    println!(
        "Domain sub-mesh: {} elements, {} nodes",
        domain.element_count(),
        domain.node_count()
    );
    Ok(())
}
