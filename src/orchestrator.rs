//! Update orchestrator for the dependency-update workflow
//!
//! This module provides:
//! - Workflow coordination: load → plan → resolve → write
//! - Validation of conflicting direct and coupled updates
//! - Dry-run mode support

use crate::cli::UpdateArgs;
use crate::domain::{DependencyInfo, UpdateSummary};
use crate::error::{AppError, ConfigError};
use crate::manifest::{
    version_variable_name, JsonManifestStore, ManifestWriter, VersionType, WriteResult,
};
use crate::progress::Progress;
use crate::update::{CoupledProposal, UpdatePass};
use std::path::PathBuf;

/// Orchestrator for one update pass over a manifest
pub struct Orchestrator {
    manifest: PathBuf,
    dockerfile_version: String,
    dependencies: Vec<DependencyInfo>,
    proposals: Vec<CoupledProposal>,
    dry_run: bool,
    show_progress: bool,
}

/// Result of running the orchestrator
#[derive(Debug)]
pub struct OrchestratorResult {
    /// Every resolution of the pass
    pub summary: UpdateSummary,
    /// Outcome of writing the changes back
    pub write_result: WriteResult,
}

impl OrchestratorResult {
    /// Returns true if some change could not be written
    pub fn has_errors(&self) -> bool {
        self.write_result.has_errors()
    }
}

impl Orchestrator {
    /// Create an orchestrator from CLI arguments
    pub fn new(args: &UpdateArgs) -> Self {
        Self {
            manifest: args.manifest.clone(),
            dockerfile_version: args.dockerfile_version.clone(),
            dependencies: args.dependencies.clone(),
            proposals: args.coupled.clone(),
            dry_run: args.dry_run,
            show_progress: false,
        }
    }

    /// Show a spinner while the pass runs
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Reject a coupled proposal for a variable a dependency already drives
    fn validate(&self) -> Result<(), ConfigError> {
        for proposal in &self.proposals {
            let conflict = self.dependencies.iter().find(|dep| {
                version_variable_name(VersionType::Build, &dep.simple_name, &self.dockerfile_version)
                    == proposal.variable_name
            });
            if let Some(dep) = conflict {
                return Err(ConfigError::ConflictingOptions {
                    message: format!(
                        "'{}' is updated directly by dependency '{}' and cannot also be coupled",
                        proposal.variable_name, dep.simple_name
                    ),
                });
            }
        }
        Ok(())
    }

    /// Run the update workflow
    ///
    /// All variables are resolved against the manifest as loaded; the file
    /// is only written after every resolution has succeeded.
    pub fn run(&self) -> Result<OrchestratorResult, AppError> {
        self.validate()?;

        let mut progress = Progress::new(self.show_progress);
        progress.spinner(&format!("Resolving {}", self.manifest.display()));

        let store = JsonManifestStore::load(&self.manifest)?;
        let pass = UpdatePass::plan(
            &store,
            &self.dockerfile_version,
            self.dependencies.clone(),
            &self.proposals,
        );
        tracing::debug!(
            manifest = %self.manifest.display(),
            dockerfile_version = %self.dockerfile_version,
            updaters = pass.len(),
            "planned update pass"
        );

        let resolutions = match pass.run(&store) {
            Ok(resolutions) => resolutions,
            Err(e) => {
                progress.clear();
                return Err(e.into());
            }
        };

        let mut summary = UpdateSummary::new(&self.manifest, self.dry_run);
        for resolution in resolutions {
            summary.add_resolution(resolution);
        }

        let write_result = ManifestWriter::new(self.dry_run).apply(&self.manifest, &summary)?;
        progress.clear();

        tracing::info!(
            changed = summary.change_count(),
            unchanged = summary.unchanged_count(),
            dry_run = self.dry_run,
            "update pass complete"
        );

        Ok(OrchestratorResult {
            summary,
            write_result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManifestError;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
  "variables": {
    "base-url|public|maintenance": "https://dotnetcli.azureedge.net/dotnet",
    "runtime|9.0|build-version": "9.0.0",
    "aspnet|9.0|build-version": "$(runtime|9.0|build-version)",
    "chisel|9.0|version": "v1.0.0"
  }
}
"#;

    fn setup() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.versions.json");
        fs::write(&path, MANIFEST).unwrap();
        (dir, path)
    }

    fn args(path: &PathBuf, deps: &[(&str, &str)], coupled: &[(&str, &str)], dry_run: bool) -> UpdateArgs {
        UpdateArgs {
            manifest: path.clone(),
            dockerfile_version: "9.0".to_string(),
            dependencies: deps.iter().map(|(n, v)| DependencyInfo::new(*n, *v)).collect(),
            coupled: coupled
                .iter()
                .map(|(n, v)| CoupledProposal::new(*n, *v))
                .collect(),
            dry_run,
            json: false,
        }
    }

    #[test]
    fn test_runtime_change_moves_chisel() {
        let (_dir, path) = setup();
        let result = Orchestrator::new(&args(
            &path,
            &[("runtime", "9.0.1")],
            &[("chisel|9.0|version", "v1.1.0")],
            false,
        ))
        .run()
        .unwrap();

        assert_eq!(result.summary.change_count(), 2);
        assert!(result.write_result.file_modified);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""runtime|9.0|build-version": "9.0.1""#));
        assert!(content.contains(r#""chisel|9.0|version": "v1.1.0""#));
        assert!(content.contains(r#""aspnet|9.0|build-version": "$(runtime|9.0|build-version)""#));
    }

    #[test]
    fn test_reference_variable_keeps_its_reference() {
        let (_dir, path) = setup();
        let result = Orchestrator::new(&args(
            &path,
            &[("runtime", "9.0.1"), ("aspnet", "9.0.1")],
            &[],
            false,
        ))
        .run()
        .unwrap();

        let changed: Vec<&str> = result.summary.changes().map(|r| r.variable_name()).collect();
        assert_eq!(changed, vec!["runtime|9.0|build-version"]);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""runtime|9.0|build-version": "9.0.1""#));
        assert!(content.contains(r#""aspnet|9.0|build-version": "$(runtime|9.0|build-version)""#));
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let (_dir, path) = setup();
        let result = Orchestrator::new(&args(
            &path,
            &[("runtime", "9.0.1")],
            &[("chisel|9.0|version", "v1.1.0")],
            true,
        ))
        .run()
        .unwrap();

        assert_eq!(result.write_result.updates_applied, 2);
        assert!(!result.write_result.file_modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST);
    }

    #[test]
    fn test_unchanged_runtime_keeps_chisel() {
        let (_dir, path) = setup();
        let result = Orchestrator::new(&args(
            &path,
            &[("runtime", "9.0.0")],
            &[("chisel|9.0|version", "v1.1.0")],
            false,
        ))
        .run()
        .unwrap();

        assert!(!result.summary.has_changes());
        assert!(!result.write_result.file_modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST);
    }

    #[test]
    fn test_conflicting_proposal_rejected() {
        let (_dir, path) = setup();
        let err = Orchestrator::new(&args(
            &path,
            &[("runtime", "9.0.1")],
            &[("runtime|9.0|build-version", "9.0.5")],
            false,
        ))
        .run()
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::ConflictingOptions { .. })
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = Orchestrator::new(&args(&path, &[], &[], false)).run().unwrap_err();
        assert!(matches!(err, AppError::Manifest(ManifestError::NotFound { .. })));
    }

    #[test]
    fn test_missing_runtime_variable_aborts_without_writing() {
        let (_dir, path) = setup();
        let mut update = args(
            &path,
            &[("runtime", "10.0.0")],
            &[("chisel|10.0|version", "v2.0.0")],
            false,
        );
        update.dockerfile_version = "10.0".to_string();
        let err = Orchestrator::new(&update).run().unwrap_err();

        assert!(matches!(
            err,
            AppError::Manifest(ManifestError::MissingVariable { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST);
    }
}
