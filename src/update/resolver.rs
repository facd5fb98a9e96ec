//! Runtime-coupled version resolution
//!
//! A derived tool (the chisel tool used to produce chiseled images) only
//! matters to runtime images. Changing its version without a concurrent
//! runtime rebuild yields no observable difference in the output images, so
//! its variable is bumped only when the runtime itself changes.

use super::VariableUpdater;
use crate::domain::{find_dependency, DependencyInfo, Resolution, VariableBinding};
use crate::error::ManifestError;
use crate::manifest::{version_variable_name, ManifestStore, VersionType};

/// Simple name of the dependency a coupled variable follows
pub const RUNTIME_DEPENDENCY: &str = "runtime";

/// Decide whether `variable_name` adopts `proposed_value`
///
/// The variable changes only when it belongs to `dockerfile_version`, a
/// `runtime` dependency is available, and that dependency's version differs
/// from the build version currently recorded for `dockerfile_version`. The
/// runtime dependency is returned as the justification for a change.
///
/// Missing manifest variables are fatal and never retried.
pub fn resolve<S: ManifestStore + ?Sized>(
    store: &S,
    variable_name: &str,
    dockerfile_version: &str,
    proposed_value: &str,
    available_dependencies: &[DependencyInfo],
) -> Result<Resolution, ManifestError> {
    let current_value = store.get_variable_value(variable_name)?;
    let binding = VariableBinding::new(
        variable_name,
        dockerfile_version,
        current_value,
        proposed_value,
    );

    let runtime = match find_dependency(available_dependencies, RUNTIME_DEPENDENCY) {
        Some(runtime) if binding.matches_version_family() => runtime,
        _ => return Ok(Resolution::unchanged(binding)),
    };

    let runtime_variable =
        version_variable_name(VersionType::Build, RUNTIME_DEPENDENCY, dockerfile_version);
    let current_runtime_version = store.get_variable_value(&runtime_variable)?;

    if runtime.simple_version == current_runtime_version {
        tracing::debug!(
            variable = variable_name,
            runtime = %runtime.simple_version,
            "runtime unchanged, keeping coupled variable"
        );
        return Ok(Resolution::unchanged(binding));
    }

    Ok(Resolution::changed(binding, vec![runtime.clone()]))
}

/// Updater for a variable that moves in lockstep with the runtime
#[derive(Debug, Clone)]
pub struct RuntimeCoupledUpdater {
    variable_name: String,
    dockerfile_version: String,
    proposed_value: String,
}

impl RuntimeCoupledUpdater {
    /// Create a new coupled updater
    pub fn new(
        variable_name: impl Into<String>,
        dockerfile_version: impl Into<String>,
        proposed_value: impl Into<String>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            dockerfile_version: dockerfile_version.into(),
            proposed_value: proposed_value.into(),
        }
    }

    /// Returns the version family this updater evaluates
    pub fn dockerfile_version(&self) -> &str {
        &self.dockerfile_version
    }
}

impl VariableUpdater for RuntimeCoupledUpdater {
    fn variable_name(&self) -> &str {
        &self.variable_name
    }

    fn resolve(
        &self,
        store: &dyn ManifestStore,
        dependencies: &[DependencyInfo],
    ) -> Result<Resolution, ManifestError> {
        resolve(
            store,
            &self.variable_name,
            &self.dockerfile_version,
            &self.proposed_value,
            dependencies,
        )
    }
}
