//! Remeshing pipeline configuration.

use adapt_kernel::{Discretization, KernelConfig};
use adapt_transfer::TransferParams;

use crate::error::{RemeshingError, RemeshingResult};

/// Reference-frame convention of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framework {
    /// Mesh is fixed in space; fields flow through it.
    #[default]
    Eulerian,
    /// Mesh nodes move with material particles; positions are reset to the
    /// undeformed configuration around interpolation and advanced by the
    /// interpolated displacement afterwards.
    Lagrangian,
}

/// Iso-surface discretization options.
#[derive(Debug, Clone)]
pub struct IsoSurfaceParams {
    /// Scalar field the kernel splits along.
    pub variable: String,
    /// Read the field from the non-historical store instead of the
    /// current historical frame.
    pub nonhistorical_variable: bool,
    /// Discard the entities on the negative side of the surface and the
    /// nodes left without an element afterwards.
    pub remove_regions: bool,
}

impl Default for IsoSurfaceParams {
    fn default() -> Self {
        Self {
            variable: adapt_types::fields::DISTANCE.to_owned(),
            nonhistorical_variable: false,
            remove_regions: false,
        }
    }
}

/// Configuration of one remeshing pass.
///
/// Builder-style setters allow fluent construction; [`RemeshingParams::validate`]
/// runs before any mesh mutation and rejects malformed settings fail-fast.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RemeshingParams {
    /// Base path for dumped mesh/solution artifacts.
    pub filename: String,
    /// Diagnostic verbosity (0 = quiet; higher levels add info reports).
    pub echo_level: u8,
    /// Reference-frame convention.
    pub framework: Framework,
    /// Metric-following or iso-surface discretization.
    pub discretization: Discretization,
    /// Dump kernel-native mesh and solution files per save step.
    pub save_external_files: bool,
    /// Dump a native text mesh of the final result.
    pub save_mdpa_file: bool,
    /// Iso-surface options (only read in iso-surface mode).
    pub iso_surface: IsoSurfaceParams,
    /// Re-initialize element/condition local state after the pass.
    pub initialize_entities: bool,
    /// Also interpolate the non-historical value store.
    pub interpolate_non_historical: bool,
    /// Extrapolate for points outside the old mesh instead of copying the
    /// nearest node.
    pub extrapolate_contour_values: bool,
    /// Let 3-D triangle elements act as interpolation hosts.
    pub surface_elements: bool,
    /// Bound on point-location candidate attempts per node.
    pub max_search_attempts: usize,
    /// Remeshing happens inside a nonlinear iteration: advance the
    /// Lagrangian mesh with the previous displacement step instead of the
    /// current one.
    pub remesh_at_non_linear_iteration: bool,
    /// Write a combined before/after mesh for debugging.
    pub debug_result_mesh: bool,
    /// Global target entity size handed to the kernel.
    pub target_size: f64,
    /// Optional cap on produced entities handed to the kernel.
    pub target_entity_count: Option<usize>,
}

impl Default for RemeshingParams {
    fn default() -> Self {
        Self {
            filename: "out".to_owned(),
            echo_level: 3,
            framework: Framework::Eulerian,
            discretization: Discretization::Standard,
            save_external_files: false,
            save_mdpa_file: false,
            iso_surface: IsoSurfaceParams::default(),
            initialize_entities: true,
            interpolate_non_historical: true,
            extrapolate_contour_values: true,
            surface_elements: false,
            max_search_attempts: 1000,
            remesh_at_non_linear_iteration: false,
            debug_result_mesh: false,
            target_size: 1.0,
            target_entity_count: None,
        }
    }
}

impl RemeshingParams {
    /// Create parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the artifact base path.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set the diagnostic verbosity.
    #[must_use]
    pub const fn with_echo_level(mut self, echo_level: u8) -> Self {
        self.echo_level = echo_level;
        self
    }

    /// Set the reference-frame convention.
    #[must_use]
    pub const fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = framework;
        self
    }

    /// Set the discretization mode.
    #[must_use]
    pub const fn with_discretization(mut self, discretization: Discretization) -> Self {
        self.discretization = discretization;
        self
    }

    /// Set the kernel's global target size.
    #[must_use]
    pub const fn with_target_size(mut self, target_size: f64) -> Self {
        self.target_size = target_size;
        self
    }

    /// Set the point-location retry bound.
    #[must_use]
    pub const fn with_max_search_attempts(mut self, attempts: usize) -> Self {
        self.max_search_attempts = attempts;
        self
    }

    /// Whether this pass discards iso-surface regions.
    #[must_use]
    pub fn remove_regions(&self) -> bool {
        self.discretization == Discretization::IsoSurface && self.iso_surface.remove_regions
    }

    /// Validate the configuration before any mesh mutation.
    ///
    /// # Errors
    ///
    /// Returns [`RemeshingError::InvalidConfig`] describing the first
    /// malformed setting found.
    pub fn validate(&self) -> RemeshingResult<()> {
        if self.max_search_attempts == 0 {
            return Err(RemeshingError::InvalidConfig(
                "max_search_attempts must be at least 1".to_owned(),
            ));
        }
        if self.discretization == Discretization::Standard
            && !(self.target_size.is_finite() && self.target_size > 0.0)
        {
            return Err(RemeshingError::InvalidConfig(format!(
                "target_size must be finite and positive, got {}",
                self.target_size
            )));
        }
        if self.discretization == Discretization::IsoSurface && self.iso_surface.variable.is_empty()
        {
            return Err(RemeshingError::InvalidConfig(
                "iso_surface.variable must name the level-set field".to_owned(),
            ));
        }
        if (self.save_external_files || self.save_mdpa_file || self.debug_result_mesh)
            && self.filename.is_empty()
        {
            return Err(RemeshingError::InvalidConfig(
                "filename must be set when artifact output is enabled".to_owned(),
            ));
        }
        Ok(())
    }

    /// The kernel-facing slice of this configuration.
    #[must_use]
    pub fn kernel_config(&self) -> KernelConfig {
        KernelConfig {
            target_size: self.target_size,
            target_entity_count: self.target_entity_count,
            echo_level: self.echo_level,
            discretization: self.discretization,
        }
    }

    /// The interpolation-facing slice of this configuration.
    #[must_use]
    pub fn transfer_params(&self) -> TransferParams {
        TransferParams {
            max_search_attempts: self.max_search_attempts,
            interpolate_non_historical: self.interpolate_non_historical,
            extrapolate_contour_values: self.extrapolate_contour_values,
            surface_elements: self.surface_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        RemeshingParams::default().validate().unwrap();
    }

    #[test]
    fn builder_chains() {
        let params = RemeshingParams::new()
            .with_framework(Framework::Lagrangian)
            .with_target_size(0.25)
            .with_echo_level(0);
        assert_eq!(params.framework, Framework::Lagrangian);
        assert!((params.target_size - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_search_attempts_rejected() {
        let params = RemeshingParams::new().with_max_search_attempts(0);
        assert!(matches!(
            params.validate(),
            Err(RemeshingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn bad_target_size_rejected() {
        let params = RemeshingParams::new().with_target_size(0.0);
        assert!(params.validate().is_err());

        let params = RemeshingParams::new().with_target_size(f64::NAN);
        assert!(params.validate().is_err());
    }

    #[test]
    fn iso_surface_needs_variable() {
        let mut params =
            RemeshingParams::new().with_discretization(Discretization::IsoSurface);
        params.iso_surface.variable.clear();
        assert!(params.validate().is_err());
    }

    #[test]
    fn artifacts_need_filename() {
        let mut params = RemeshingParams::new().with_filename("");
        params.save_mdpa_file = true;
        assert!(params.validate().is_err());
    }

    #[test]
    fn remove_regions_only_in_iso_mode() {
        let mut params = RemeshingParams::new();
        params.iso_surface.remove_regions = true;
        assert!(!params.remove_regions());

        params.discretization = Discretization::IsoSurface;
        assert!(params.remove_regions());
    }
}
