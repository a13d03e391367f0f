//! Artifact writers: kernel-native mesh/solution dumps, native text mesh,
//! before/after debug mesh.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use adapt_kernel::{AdaptionField, FlatBlock, FlatMesh};
use adapt_types::{GeometryKind, MeshDimension, SimMesh, SubMesh};

use crate::error::{RemeshingError, RemeshingResult};

fn mesh_keyword(kind: GeometryKind) -> &'static str {
    match kind {
        GeometryKind::Line2 => "Edges",
        GeometryKind::Triangle3 => "Triangles",
        GeometryKind::Quadrilateral4 => "Quadrilaterals",
        GeometryKind::Tetrahedron4 => "Tetrahedra",
        GeometryKind::Prism6 => "Prisms",
    }
}

fn element_type_name(kind: GeometryKind, dimension: MeshDimension) -> &'static str {
    match (kind, dimension) {
        (GeometryKind::Line2, _) => "Element2D2N",
        (GeometryKind::Triangle3, MeshDimension::Two) => "Element2D3N",
        (GeometryKind::Triangle3, MeshDimension::Three) => "Element3D3N",
        (GeometryKind::Quadrilateral4, MeshDimension::Two) => "Element2D4N",
        (GeometryKind::Quadrilateral4, MeshDimension::Three) => "Element3D4N",
        (GeometryKind::Tetrahedron4, _) => "Element3D4N",
        (GeometryKind::Prism6, _) => "Element3D6N",
    }
}

fn condition_type_name(kind: GeometryKind, dimension: MeshDimension) -> &'static str {
    match (kind, dimension) {
        (GeometryKind::Line2, MeshDimension::Two) => "Condition2D2N",
        (GeometryKind::Line2, MeshDimension::Three) => "LineCondition3D2N",
        (GeometryKind::Triangle3, _) => "SurfaceCondition3D3N",
        (GeometryKind::Quadrilateral4, _) => "SurfaceCondition3D4N",
        (GeometryKind::Tetrahedron4, _) | (GeometryKind::Prism6, _) => "Condition3D",
    }
}

fn create(path: &Path) -> RemeshingResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| RemeshingError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn finish(path: &Path, result: std::io::Result<()>) -> RemeshingResult<()> {
    result.map_err(|source| RemeshingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of the kernel-native mesh dump for one step.
#[must_use]
pub fn mesh_artifact_path(filename: &str, step: u32, post: bool) -> PathBuf {
    if post {
        PathBuf::from(format!("{filename}_step={step}.o.mesh"))
    } else {
        PathBuf::from(format!("{filename}_step={step}.mesh"))
    }
}

/// Path of the solution dump for one step.
#[must_use]
pub fn sol_artifact_path(filename: &str, step: u32, post: bool) -> PathBuf {
    if post {
        PathBuf::from(format!("{filename}_step={step}.o.sol"))
    } else {
        PathBuf::from(format!("{filename}_step={step}.sol"))
    }
}

/// Write a flat mesh in the kernel-native line-oriented text format.
///
/// # Errors
///
/// Returns [`RemeshingError::Io`] on any write failure.
pub fn save_flat_mesh(path: &Path, mesh: &FlatMesh) -> RemeshingResult<()> {
    let mut w = create(path)?;
    finish(path, write_flat_mesh(&mut w, mesh))
}

fn write_flat_mesh(w: &mut impl Write, mesh: &FlatMesh) -> std::io::Result<()> {
    writeln!(w, "MeshVersionFormatted 2")?;
    writeln!(w, "Dimension")?;
    writeln!(w, "{}", mesh.dimension().components())?;

    writeln!(w, "Vertices")?;
    writeln!(w, "{}", mesh.node_count())?;
    for i in 0..mesh.node_count() {
        let [x, y, z] = mesh.coordinate(i).unwrap_or([0.0; 3]);
        match mesh.dimension() {
            MeshDimension::Two => writeln!(w, "{x} {y} {}", mesh.node_tag(i))?,
            MeshDimension::Three => writeln!(w, "{x} {y} {z} {}", mesh.node_tag(i))?,
        }
    }

    for block in mesh.element_blocks().iter().chain(mesh.condition_blocks()) {
        write_block(w, block)?;
    }

    writeln!(w, "End")
}

fn write_block(w: &mut impl Write, block: &FlatBlock) -> std::io::Result<()> {
    if block.is_empty() {
        return Ok(());
    }
    writeln!(w, "{}", mesh_keyword(block.kind()))?;
    writeln!(w, "{}", block.len())?;
    for (connectivity, tag, _) in block.iter() {
        for node in connectivity {
            write!(w, "{node} ")?;
        }
        writeln!(w, "{tag}")?;
    }
    Ok(())
}

/// Write an adaptation field in the kernel-native solution format.
///
/// # Errors
///
/// Returns [`RemeshingError::Io`] on any write failure.
pub fn save_adaption_field(
    path: &Path,
    field: &AdaptionField,
    dimension: MeshDimension,
) -> RemeshingResult<()> {
    let mut w = create(path)?;
    finish(path, write_adaption_field(&mut w, field, dimension))
}

fn write_adaption_field(
    w: &mut impl Write,
    field: &AdaptionField,
    dimension: MeshDimension,
) -> std::io::Result<()> {
    writeln!(w, "MeshVersionFormatted 2")?;
    writeln!(w, "Dimension")?;
    writeln!(w, "{}", dimension.components())?;
    writeln!(w, "SolAtVertices")?;
    writeln!(w, "{}", field.len())?;

    match field {
        AdaptionField::Metric(values) | AdaptionField::LevelSet(values) => {
            writeln!(w, "1 1")?;
            for v in values {
                writeln!(w, "{v}")?;
            }
        }
        AdaptionField::TensorMetric2(values) => {
            writeln!(w, "1 3")?;
            for [xx, yy, xy] in values {
                writeln!(w, "{xx} {xy} {yy}")?;
            }
        }
        AdaptionField::TensorMetric3(values) => {
            writeln!(w, "1 3")?;
            for [xx, yy, zz, xy, yz, xz] in values {
                writeln!(w, "{xx} {xy} {yy} {xz} {yz} {zz}")?;
            }
        }
    }

    writeln!(w, "End")
}

/// Write the final mesh as a native `.mdpa`-style text dump.
///
/// # Errors
///
/// Returns [`RemeshingError::Io`] on any write failure.
pub fn save_mdpa(path: &Path, mesh: &SimMesh) -> RemeshingResult<()> {
    let mut w = create(path)?;
    finish(path, write_mdpa(&mut w, mesh))
}

fn write_mdpa(w: &mut impl Write, mesh: &SimMesh) -> std::io::Result<()> {
    writeln!(w, "Begin ModelPartData")?;
    writeln!(w, "End ModelPartData")?;
    writeln!(w)?;

    writeln!(w, "Begin Nodes")?;
    for node in mesh.nodes() {
        let p = node.position;
        writeln!(w, "  {} {} {} {}", node.id(), p.x, p.y, p.z)?;
    }
    writeln!(w, "End Nodes")?;
    writeln!(w)?;

    for kind in [
        GeometryKind::Triangle3,
        GeometryKind::Quadrilateral4,
        GeometryKind::Tetrahedron4,
        GeometryKind::Prism6,
        GeometryKind::Line2,
    ] {
        let group: Vec<_> = mesh
            .elements()
            .iter()
            .filter(|e| e.geometry.kind() == kind)
            .collect();
        if group.is_empty() {
            continue;
        }
        writeln!(w, "Begin Elements {}", element_type_name(kind, mesh.dimension()))?;
        for element in group {
            write!(w, "  {} {}", element.id(), element.properties)?;
            for node in element.geometry.node_ids() {
                write!(w, " {node}")?;
            }
            writeln!(w)?;
        }
        writeln!(w, "End Elements")?;
        writeln!(w)?;
    }

    for kind in [
        GeometryKind::Line2,
        GeometryKind::Triangle3,
        GeometryKind::Quadrilateral4,
    ] {
        let group: Vec<_> = mesh
            .conditions()
            .iter()
            .filter(|c| c.geometry.kind() == kind)
            .collect();
        if group.is_empty() {
            continue;
        }
        writeln!(
            w,
            "Begin Conditions {}",
            condition_type_name(kind, mesh.dimension())
        )?;
        for condition in group {
            write!(w, "  {} {}", condition.id(), condition.properties)?;
            for node in condition.geometry.node_ids() {
                write!(w, " {node}")?;
            }
            writeln!(w)?;
        }
        writeln!(w, "End Conditions")?;
        writeln!(w)?;
    }

    for sub in mesh.submeshes() {
        write_submesh(w, sub, 0)?;
    }
    Ok(())
}

fn write_submesh(w: &mut impl Write, sub: &SubMesh, depth: usize) -> std::io::Result<()> {
    let pad = "  ".repeat(depth);
    writeln!(w, "{pad}Begin SubModelPart {}", sub.name())?;

    let mut node_ids: Vec<_> = sub.own_node_ids().iter().copied().collect();
    node_ids.sort_unstable();
    writeln!(w, "{pad}  Begin SubModelPartNodes")?;
    for id in node_ids {
        writeln!(w, "{pad}    {id}")?;
    }
    writeln!(w, "{pad}  End SubModelPartNodes")?;

    let mut element_ids: Vec<_> = sub.own_element_ids().iter().copied().collect();
    element_ids.sort_unstable();
    writeln!(w, "{pad}  Begin SubModelPartElements")?;
    for id in element_ids {
        writeln!(w, "{pad}    {id}")?;
    }
    writeln!(w, "{pad}  End SubModelPartElements")?;

    let mut condition_ids: Vec<_> = sub.own_condition_ids().iter().copied().collect();
    condition_ids.sort_unstable();
    writeln!(w, "{pad}  Begin SubModelPartConditions")?;
    for id in condition_ids {
        writeln!(w, "{pad}    {id}")?;
    }
    writeln!(w, "{pad}  End SubModelPartConditions")?;

    for child in sub.children() {
        write_submesh(w, child, depth + 1)?;
    }

    writeln!(w, "{pad}End SubModelPart")
}

/// Write a side-by-side before/after mesh: the new mesh's nodes and
/// elements tagged 1, the old mesh's tagged 2, old node Ids offset past
/// the new ones.
///
/// # Errors
///
/// Returns [`RemeshingError::Io`] on any write failure.
pub fn save_debug_pair(path: &Path, new_mesh: &SimMesh, old_mesh: &SimMesh) -> RemeshingResult<()> {
    let mut w = create(path)?;
    finish(path, write_debug_pair(&mut w, new_mesh, old_mesh))
}

fn write_debug_pair(
    w: &mut impl Write,
    new_mesh: &SimMesh,
    old_mesh: &SimMesh,
) -> std::io::Result<()> {
    writeln!(w, "MeshVersionFormatted 2")?;
    writeln!(w, "Dimension")?;
    writeln!(w, "{}", new_mesh.dimension().components())?;

    writeln!(w, "Vertices")?;
    writeln!(w, "{}", new_mesh.nodes().len() + old_mesh.nodes().len())?;
    for node in new_mesh.nodes().iter().chain(old_mesh.nodes()) {
        let p = node.position;
        writeln!(w, "{} {} {} 0", p.x, p.y, p.z)?;
    }

    // new node Ids are 1..=n; old node Ids are shifted past them
    let offset = new_mesh.nodes().max_id();
    writeln!(w, "Cells")?;
    writeln!(
        w,
        "{}",
        new_mesh.elements().len() + old_mesh.elements().len()
    )?;
    for element in new_mesh.elements() {
        for node in element.geometry.node_ids() {
            write!(w, "{node} ")?;
        }
        writeln!(w, "1")?;
    }
    for element in old_mesh.elements() {
        for node in element.geometry.node_ids() {
            write!(w, "{} ", node + offset)?;
        }
        writeln!(w, "2")?;
    }

    writeln!(w, "End")
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_types::{Element, Geometry, Node};

    fn tmp(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("adapt_remesh_io_{name}_{}", std::process::id()))
    }

    fn tiny_mesh() -> SimMesh {
        let mut mesh = SimMesh::new(MeshDimension::Two, 1);
        mesh.add_node(Node::from_coords(1, 0.0, 0.0, 0.0, 1));
        mesh.add_node(Node::from_coords(2, 1.0, 0.0, 0.0, 1));
        mesh.add_node(Node::from_coords(3, 0.0, 1.0, 0.0, 1));
        let tri = Geometry::new(GeometryKind::Triangle3, [1, 2, 3]).unwrap();
        mesh.add_element(Element::new(1, tri, 1));
        mesh.create_submesh("Domain").unwrap().add_element(1);
        mesh
    }

    #[test]
    fn flat_mesh_roundtrips_to_text() {
        let mut flat = FlatMesh::for_dimension(MeshDimension::Two);
        flat.add_node([0.0, 0.0, 0.0], 0, false);
        flat.add_node([1.0, 0.0, 0.0], 0, false);
        flat.add_node([0.0, 1.0, 0.0], 1, false);
        flat.push_element(0, &[1, 2, 3], 0, false).unwrap();

        let path = tmp("flat.mesh");
        save_flat_mesh(&path, &flat).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Vertices\n3"));
        assert!(text.contains("Triangles\n1"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn sol_file_has_scalar_header() {
        let field = AdaptionField::Metric(vec![0.5, 0.5, 0.5]);
        let path = tmp("field.sol");
        save_adaption_field(&path, &field, MeshDimension::Two).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("SolAtVertices\n3\n1 1"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn mdpa_dump_contains_submesh_blocks() {
        let mesh = tiny_mesh();
        let path = tmp("dump.mdpa");
        save_mdpa(&path, &mesh).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Begin Nodes"));
        assert!(text.contains("Begin Elements Element2D3N"));
        assert!(text.contains("Begin SubModelPart Domain"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn debug_pair_merges_both_meshes() {
        let mesh = tiny_mesh();
        let path = tmp("pair.mesh");
        save_debug_pair(&path, &mesh, &mesh).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Vertices\n6"));
        assert!(text.contains("Cells\n2"));
        std::fs::remove_file(&path).ok();
    }
}
