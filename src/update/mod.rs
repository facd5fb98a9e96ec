//! Dependency update resolution for manifest variables
//!
//! This module provides:
//! - The VariableUpdater trait implemented by each update rule
//! - Direct updates: a build-version variable follows its dependency
//! - Runtime-coupled updates: a derived tool moves only with the runtime
//! - UpdatePass, which resolves every tracked variable against one snapshot

mod direct;
mod resolver;

pub use direct::DirectVersionUpdater;
pub use resolver::{resolve, RuntimeCoupledUpdater, RUNTIME_DEPENDENCY};

use crate::domain::{DependencyInfo, Resolution};
use crate::error::{ConfigError, ManifestError};
use crate::manifest::ManifestStore;
use std::str::FromStr;

/// A rule deciding the next value of one manifest variable
pub trait VariableUpdater {
    /// The manifest variable this updater owns
    fn variable_name(&self) -> &str;

    /// Resolve the variable against a manifest snapshot
    fn resolve(
        &self,
        store: &dyn ManifestStore,
        dependencies: &[DependencyInfo],
    ) -> Result<Resolution, ManifestError>;
}

/// A proposed new value for a runtime-coupled variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoupledProposal {
    /// Variable to update
    pub variable_name: String,
    /// Value to adopt when the runtime changes
    pub proposed_value: String,
}

impl CoupledProposal {
    /// Create a new proposal
    pub fn new(variable_name: impl Into<String>, proposed_value: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
            proposed_value: proposed_value.into(),
        }
    }
}

impl FromStr for CoupledProposal {
    type Err = ConfigError;

    /// Parses `variable=value`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidKeyValue {
            value: s.to_string(),
        };
        let (name, value) = s.split_once('=').ok_or_else(invalid)?;
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(name, value))
    }
}

/// A planned set of updaters evaluated against a single manifest snapshot
pub struct UpdatePass {
    updaters: Vec<Box<dyn VariableUpdater>>,
    dependencies: Vec<DependencyInfo>,
}

impl UpdatePass {
    /// Create a pass from explicit updaters
    pub fn new(updaters: Vec<Box<dyn VariableUpdater>>, dependencies: Vec<DependencyInfo>) -> Self {
        Self {
            updaters,
            dependencies,
        }
    }

    /// Plan updaters for one version family
    ///
    /// Each dependency gets a direct updater when its build-version variable
    /// exists. Every coupled proposal gets a runtime-coupled updater; one whose
    /// variable belongs to another family resolves as unchanged. Variables
    /// defined as `$(other)` references are left out entirely.
    pub fn plan<S: ManifestStore + ?Sized>(
        store: &S,
        dockerfile_version: &str,
        dependencies: Vec<DependencyInfo>,
        proposals: &[CoupledProposal],
    ) -> Self {
        let mut updaters: Vec<Box<dyn VariableUpdater>> = Vec::new();

        for dep in &dependencies {
            let updater = DirectVersionUpdater::new(dep.clone(), dockerfile_version);
            let variable = updater.variable_name();
            if !store.has_variable(variable) {
                tracing::debug!(variable, "no build-version variable, skipping");
            } else if store.is_reference(variable) {
                tracing::debug!(variable, "defined by reference, skipping");
            } else {
                updaters.push(Box::new(updater));
            }
        }

        for proposal in proposals {
            if store.is_reference(&proposal.variable_name) {
                tracing::debug!(
                    variable = %proposal.variable_name,
                    "defined by reference, skipping"
                );
                continue;
            }
            if !proposal.variable_name.contains(dockerfile_version) {
                tracing::warn!(
                    variable = %proposal.variable_name,
                    dockerfile_version,
                    "variable does not belong to this dockerfile version"
                );
            }
            updaters.push(Box::new(RuntimeCoupledUpdater::new(
                &proposal.variable_name,
                dockerfile_version,
                &proposal.proposed_value,
            )));
        }

        Self::new(updaters, dependencies)
    }

    /// Returns the number of planned updaters
    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    /// Returns true if nothing is planned
    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }

    /// Returns the variables this pass evaluates, in order
    pub fn variable_names(&self) -> Vec<&str> {
        self.updaters.iter().map(|u| u.variable_name()).collect()
    }

    /// Resolve every updater against the same read-only snapshot
    ///
    /// The first resolution error aborts the pass.
    pub fn run(&self, store: &dyn ManifestStore) -> Result<Vec<Resolution>, ManifestError> {
        self.updaters
            .iter()
            .map(|updater| {
                let resolution = updater.resolve(store, &self.dependencies)?;
                tracing::debug!("{}", resolution);
                Ok(resolution)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::JsonManifestStore;

    fn store() -> JsonManifestStore {
        JsonManifestStore::from_variables([
            ("runtime|8.0|build-version", "8.0.11"),
            ("runtime|9.0|build-version", "9.0.0"),
            ("sdk|9.0|build-version", "9.0.100"),
            ("chisel|8.0|version", "v0.9.0"),
            ("chisel|9.0|version", "v1.0.0"),
        ])
    }

    #[test]
    fn test_parse_coupled_proposal() {
        let proposal: CoupledProposal = "chisel|9.0|version=v1.2.3".parse().unwrap();
        assert_eq!(proposal, CoupledProposal::new("chisel|9.0|version", "v1.2.3"));
        assert!("chisel|9.0|version".parse::<CoupledProposal>().is_err());
        assert!("chisel|9.0|version=".parse::<CoupledProposal>().is_err());
    }

    #[test]
    fn test_plan_skips_absent_direct_variables() {
        let deps = vec![
            DependencyInfo::new("runtime", "9.0.1"),
            DependencyInfo::new("aspnet", "9.0.1"),
        ];
        let pass = UpdatePass::plan(&store(), "9.0", deps, &[]);
        assert_eq!(pass.variable_names(), vec!["runtime|9.0|build-version"]);
    }

    #[test]
    fn test_plan_skips_reference_variables() {
        let store = JsonManifestStore::from_variables([
            ("runtime|9.0|build-version", "9.0.0"),
            ("aspnet|9.0|build-version", "$(runtime|9.0|build-version)"),
            ("chisel|9.0|version", "v1.0.0"),
            ("chisel|9.0|url", "https://example.com/$(chisel|9.0|version)"),
        ]);
        let deps = vec![
            DependencyInfo::new("runtime", "9.0.1"),
            DependencyInfo::new("aspnet", "9.0.1"),
        ];
        let proposals = vec![
            CoupledProposal::new("chisel|9.0|version", "v1.1.0"),
            CoupledProposal::new("chisel|9.0|url", "https://example.com/v1.1.0"),
        ];
        let pass = UpdatePass::plan(&store, "9.0", deps, &proposals);
        assert_eq!(
            pass.variable_names(),
            vec!["runtime|9.0|build-version", "chisel|9.0|version"]
        );
    }

    #[test]
    fn test_plan_orders_direct_before_coupled() {
        let deps = vec![DependencyInfo::new("sdk", "9.0.200")];
        let proposals = vec![CoupledProposal::new("chisel|9.0|version", "v1.2.3")];
        let pass = UpdatePass::plan(&store(), "9.0", deps, &proposals);
        assert_eq!(pass.len(), 2);
        assert_eq!(
            pass.variable_names(),
            vec!["sdk|9.0|build-version", "chisel|9.0|version"]
        );
    }

    #[test]
    fn test_empty_plan() {
        let pass = UpdatePass::plan(&store(), "9.0", Vec::new(), &[]);
        assert!(pass.is_empty());
        assert!(pass.run(&store()).unwrap().is_empty());
    }

    #[test]
    fn test_run_couples_chisel_to_runtime() {
        let deps = vec![
            DependencyInfo::new("runtime", "9.0.1"),
            DependencyInfo::new("sdk", "9.0.100"),
        ];
        let proposals = vec![CoupledProposal::new("chisel|9.0|version", "v1.2.3")];
        let store = store();
        let pass = UpdatePass::plan(&store, "9.0", deps, &proposals);
        let resolutions = pass.run(&store).unwrap();

        let changed: Vec<&str> = resolutions
            .iter()
            .filter(|r| r.is_change())
            .map(|r| r.variable_name())
            .collect();
        assert_eq!(
            changed,
            vec!["runtime|9.0|build-version", "chisel|9.0|version"]
        );
    }

    #[test]
    fn test_run_reads_snapshot_not_planned_values() {
        // The runtime build-version update is planned first; the coupled
        // updater must still compare against the recorded 9.0.0.
        let deps = vec![DependencyInfo::new("runtime", "9.0.1")];
        let proposals = vec![CoupledProposal::new("chisel|9.0|version", "v1.2.3")];
        let store = store();
        let pass = UpdatePass::plan(&store, "9.0", deps, &proposals);
        let resolutions = pass.run(&store).unwrap();

        assert_eq!(resolutions.len(), 2);
        assert!(resolutions.iter().all(|r| r.is_change()));
    }

    #[test]
    fn test_run_runtime_unchanged_keeps_chisel() {
        let deps = vec![DependencyInfo::new("runtime", "9.0.0")];
        let proposals = vec![CoupledProposal::new("chisel|9.0|version", "v1.2.3")];
        let store = store();
        let pass = UpdatePass::plan(&store, "9.0", deps, &proposals);
        let resolutions = pass.run(&store).unwrap();

        assert!(resolutions.iter().all(|r| !r.is_change()));
    }

    #[test]
    fn test_run_other_family_proposal_is_unchanged() {
        let deps = vec![DependencyInfo::new("runtime", "9.0.1")];
        let proposals = vec![CoupledProposal::new("chisel|8.0|version", "v1.2.3")];
        let store = store();
        let pass = UpdatePass::plan(&store, "9.0", deps, &proposals);
        let resolutions = pass.run(&store).unwrap();

        let chisel = resolutions
            .iter()
            .find(|r| r.variable_name() == "chisel|8.0|version")
            .unwrap();
        assert!(!chisel.is_change());
        assert_eq!(chisel.resolved_value, "v0.9.0");
    }

    #[test]
    fn test_run_aborts_on_missing_variable() {
        let deps = vec![DependencyInfo::new("runtime", "10.0.0")];
        let proposals = vec![CoupledProposal::new("chisel|10.0|version", "v2.0.0")];
        let store = store();
        let pass = UpdatePass::plan(&store, "10.0", deps, &proposals);
        assert!(matches!(
            pass.run(&store),
            Err(ManifestError::MissingVariable { .. })
        ));
    }
}
