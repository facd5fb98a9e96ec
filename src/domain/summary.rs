//! Update pass summary types

use super::{DependencyInfo, Resolution};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of one dependency-update pass over a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// Manifest file the pass read from
    pub manifest: PathBuf,
    /// Every resolution produced, in updater order
    pub resolutions: Vec<Resolution>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl UpdateSummary {
    /// Creates a new UpdateSummary
    pub fn new(manifest: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            manifest: manifest.into(),
            resolutions: Vec::new(),
            dry_run,
        }
    }

    /// Adds a resolution
    pub fn add_resolution(&mut self, resolution: Resolution) {
        self.resolutions.push(resolution);
    }

    /// Returns all resolutions that change a value
    pub fn changes(&self) -> impl Iterator<Item = &Resolution> {
        self.resolutions.iter().filter(|r| r.is_change())
    }

    /// Returns all resolutions that keep the current value
    pub fn unchanged(&self) -> impl Iterator<Item = &Resolution> {
        self.resolutions.iter().filter(|r| !r.is_change())
    }

    /// Returns the number of changed variables
    pub fn change_count(&self) -> usize {
        self.changes().count()
    }

    /// Returns the number of unchanged variables
    pub fn unchanged_count(&self) -> usize {
        self.unchanged().count()
    }

    /// Returns true if any variable changes
    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }

    /// Returns the distinct dependencies that justified changes
    pub fn used_dependencies(&self) -> Vec<&DependencyInfo> {
        let mut used: Vec<&DependencyInfo> = Vec::new();
        for dep in self.changes().flat_map(|r| r.used_dependencies.iter()) {
            if !used.contains(&dep) {
                used.push(dep);
            }
        }
        used
    }
}
