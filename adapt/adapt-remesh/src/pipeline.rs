//! Pipeline orchestration: tag → export → invoke → reconstruct →
//! interpolate → cleanup.

use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::info;

use adapt_kernel::{KernelSession, RemeshKernel};
use adapt_transfer::{interpolate_nodal_values, transfer_element_data};
use adapt_types::{fields, EntityFlags, FieldValue, SimMesh};

use crate::cleanup;
use crate::error::{RemeshingError, RemeshingResult};
use crate::export;
use crate::io;
use crate::params::{Framework, RemeshingParams};
use crate::result::RemeshingReport;
use crate::snapshot;

/// The anisotropic mesh adaptation process.
///
/// One instance is configured once and can drive any number of passes.
/// A pass either completes fully or aborts with an error before the live
/// mesh replacement; the live mesh is only mutated in place once the
/// kernel has produced a usable output, so a fatal error leaves the
/// simulation mesh in the state of the last completed pass.
///
/// # Example
///
/// ```
/// use adapt_kernel::PassthroughKernel;
/// use adapt_remesh::{RemeshingParams, RemeshingProcess};
/// use adapt_types::{Element, Geometry, GeometryKind, MeshDimension, Node, SimMesh};
///
/// let mut mesh = SimMesh::new(MeshDimension::Two, 1);
/// mesh.add_node(Node::from_coords(1, 0.0, 0.0, 0.0, 1));
/// mesh.add_node(Node::from_coords(2, 1.0, 0.0, 0.0, 1));
/// mesh.add_node(Node::from_coords(3, 0.0, 1.0, 0.0, 1));
/// mesh.add_element(Element::new(
///     1,
///     Geometry::new(GeometryKind::Triangle3, [1, 2, 3])?,
///     1,
/// ));
///
/// let process = RemeshingProcess::new(RemeshingParams::default().with_echo_level(0))?;
/// let report = process.execute(&mut mesh, &PassthroughKernel)?;
/// assert_eq!(report.nodes_after, 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct RemeshingProcess {
    params: RemeshingParams,
}

impl RemeshingProcess {
    /// Validate the configuration and build the process.
    ///
    /// # Errors
    ///
    /// Returns [`RemeshingError::InvalidConfig`] before any mesh mutation
    /// when the settings are malformed.
    pub fn new(params: RemeshingParams) -> RemeshingResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The configuration this process runs with.
    #[must_use]
    pub const fn params(&self) -> &RemeshingParams {
        &self.params
    }

    /// Run one full remeshing pass on a mesh.
    ///
    /// # Errors
    ///
    /// Any fatal error (invalid field data, kernel failure, malformed
    /// kernel output) aborts the pass; warnings (node-only sub-meshes,
    /// unsupported geometry kinds, duplicated conditions) are logged and
    /// recovered locally.
    #[allow(clippy::too_many_lines)]
    pub fn execute(
        &self,
        mesh: &mut SimMesh,
        kernel: &dyn RemeshKernel,
    ) -> RemeshingResult<RemeshingReport> {
        let params = &self.params;
        if mesh.nodes().is_empty() {
            return Err(RemeshingError::EmptyMesh);
        }

        let mut report = RemeshingReport {
            nodes_before: mesh.nodes().len(),
            elements_before: mesh.elements().len(),
            conditions_before: mesh.conditions().len(),
            ..RemeshingReport::default()
        };
        if params.echo_level > 0 {
            info!(
                nodes = report.nodes_before,
                elements = report.elements_before,
                conditions = report.conditions_before,
                "before remeshing"
            );
        }

        // iso-surface region removal recreates the boundary from scratch
        if params.remove_regions() {
            for condition in mesh.conditions_mut().iter_mut() {
                condition.set_flag(EntityFlags::TO_ERASE, true);
            }
            mesh.remove_conditions_flagged(EntityFlags::TO_ERASE);
            info!("conditions cleared for region removal");
        }

        export::warn_node_only_submeshes(mesh);

        // field first: it reads nodes in the same container order export
        // indexes them, and failing here leaves the mesh untouched
        let field = export::build_adaption_field(mesh, params)?;

        snapshot::create_flag_snapshot(mesh)?;
        let mut exported = export::export_mesh(mesh, params)?;
        report.colors_used = exported.colors.color_count();
        report.elements_skipped_on_export = exported.skipped_elements;
        report.conditions_skipped_on_export = exported.skipped_conditions;

        let mut session = KernelSession::new(params.kernel_config());
        session.set_mesh(exported.flat);
        session.set_field(field);
        session.check()?;

        let step = mesh.process_info.step;
        if params.save_external_files {
            if let (Some(flat), Some(field)) = (session.input(), session.field()) {
                io::save_flat_mesh(&io::mesh_artifact_path(&params.filename, step, false), flat)?;
                io::save_adaption_field(
                    &io::sol_artifact_path(&params.filename, step, false),
                    field,
                    mesh.dimension(),
                )?;
            }
        }

        session.invoke(kernel)?;

        if params.save_external_files {
            io::save_flat_mesh(
                &io::mesh_artifact_path(&params.filename, step, true),
                &session.output()?.mesh,
            )?;
        }

        // replace the live containers; the old entities stay intact in a
        // temporary mesh until interpolation is done
        let mut old_mesh = SimMesh::new(mesh.dimension(), mesh.buffer_size());
        old_mesh.process_info = mesh.process_info;
        let (nodes, elements, conditions) = mesh.drain_entities();
        old_mesh.nodes_mut().extend(nodes);
        old_mesh.elements_mut().extend(elements);
        old_mesh.conditions_mut().extend(conditions);

        let output = session.take_output()?;
        report.elements_discarded_by_kernel =
            output.discarded.elements.iter().map(Vec::len).sum();
        report.conditions_discarded_by_kernel =
            output.discarded.conditions.iter().map(Vec::len).sum();

        crate::reconstruct::rebuild_mesh(
            mesh,
            &output,
            &exported.colors,
            &exported.references,
            &exported.dof_template,
            params.echo_level,
        )?;

        cleanup::reorder_ids(mesh);
        snapshot::restore_flag_snapshot(mesh);

        // interpolation must run in the frame the old mesh was meshed in
        if params.framework == Framework::Lagrangian {
            old_mesh
                .nodes_mut()
                .as_mut_slice()
                .par_iter_mut()
                .for_each(|node| node.position = node.initial_position);
        }

        if params.debug_result_mesh {
            let path = std::path::PathBuf::from(format!(
                "{}_before_after_step={step}.mesh",
                params.filename
            ));
            io::save_debug_pair(&path, mesh, &old_mesh)?;
        }

        report.transfer = interpolate_nodal_values(&old_mesh, mesh, &params.transfer_params())?;

        if params.initialize_entities {
            cleanup::initialize_entities(mesh);
        }

        if params.framework == Framework::Lagrangian {
            // advance to the deformed configuration; inside a nonlinear
            // iteration the previous displacement step is the consistent one
            let displacement_step = usize::from(params.remesh_at_non_linear_iteration);
            mesh.nodes_mut()
                .as_mut_slice()
                .par_iter_mut()
                .for_each(|node| {
                    let displacement = node
                        .history
                        .get(fields::DISPLACEMENT, displacement_step)
                        .and_then(FieldValue::as_vector)
                        .unwrap_or_else(Vector3::zeros);
                    node.position = node.initial_position + displacement;
                });

            transfer_element_data(&old_mesh, mesh)?;
        }

        cleanup::zero_entity_data(mesh, &old_mesh);

        // the old mesh has served its purpose
        drop(old_mesh);

        if params.framework == Framework::Eulerian {
            report.duplicate_conditions_removed =
                cleanup::clear_duplicate_conditions(mesh, params.echo_level);
        }

        if params.remove_regions() {
            report.superfluous_nodes_removed = cleanup::clean_superfluous_nodes(mesh);
        }

        cleanup::remove_erased_entities(mesh);
        cleanup::reorder_ids(mesh);

        exported.references.clear();
        session.release();

        if params.save_mdpa_file {
            let path = std::path::PathBuf::from(format!("{}.mdpa", params.filename));
            io::save_mdpa(&path, mesh)?;
        }

        report.nodes_after = mesh.nodes().len();
        report.elements_after = mesh.elements().len();
        report.conditions_after = mesh.conditions().len();
        if params.echo_level > 0 {
            info!(
                nodes = report.nodes_after,
                elements = report.elements_after,
                conditions = report.conditions_after,
                "after remeshing"
            );
        }

        Ok(report)
    }
}
