//! Direct version updates
//!
//! A version variable such as `sdk|9.0|build-version` simply follows the
//! version discovered for its dependency.

use super::VariableUpdater;
use crate::domain::{DependencyInfo, Resolution, VariableBinding};
use crate::error::ManifestError;
use crate::manifest::{version_variable_name, ManifestStore, VersionType};

/// Updater that sets a build-version variable to its dependency's version
#[derive(Debug, Clone)]
pub struct DirectVersionUpdater {
    variable_name: String,
    dockerfile_version: String,
    dependency: DependencyInfo,
}

impl DirectVersionUpdater {
    /// Create an updater for `dependency` within `dockerfile_version`
    pub fn new(dependency: DependencyInfo, dockerfile_version: impl Into<String>) -> Self {
        let dockerfile_version = dockerfile_version.into();
        let variable_name = version_variable_name(
            VersionType::Build,
            &dependency.simple_name,
            &dockerfile_version,
        );
        Self {
            variable_name,
            dockerfile_version,
            dependency,
        }
    }

    /// Returns the dependency this updater follows
    pub fn dependency(&self) -> &DependencyInfo {
        &self.dependency
    }
}

impl VariableUpdater for DirectVersionUpdater {
    fn variable_name(&self) -> &str {
        &self.variable_name
    }

    fn resolve(
        &self,
        store: &dyn ManifestStore,
        _dependencies: &[DependencyInfo],
    ) -> Result<Resolution, ManifestError> {
        let current_value = store.get_variable_value(&self.variable_name)?;
        let binding = VariableBinding::new(
            &self.variable_name,
            &self.dockerfile_version,
            current_value,
            &self.dependency.simple_version,
        );

        if binding.current_value == binding.proposed_value {
            Ok(Resolution::unchanged(binding))
        } else {
            Ok(Resolution::changed(binding, vec![self.dependency.clone()]))
        }
    }
}
