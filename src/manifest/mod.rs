//! Manifest store access and update operations
//!
//! This module provides:
//! - The `ManifestStore` lookup seam used by update resolution
//! - Version variable naming conventions
//! - A JSON-backed store with `$(name)` reference expansion
//! - ManifestWriter for persisting changed variables

mod store;
mod writer;

pub use store::JsonManifestStore;
pub use writer::{ManifestWriter, WriteResult};

use crate::error::ManifestError;
use std::fmt;

/// Read-only key-value view of the manifest variables
pub trait ManifestStore {
    /// Returns the fully expanded value of a variable
    fn get_variable_value(&self, name: &str) -> Result<String, ManifestError>;

    /// Returns true if the variable is defined
    fn has_variable(&self, name: &str) -> bool;

    /// Returns true if the variable's value refers to other variables
    ///
    /// Such a variable follows its targets and is never rewritten.
    fn is_reference(&self, name: &str) -> bool;
}

/// Kind of version a version variable records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionType {
    /// Version the images are built from
    Build,
    /// Version advertised to users
    Product,
}

impl VersionType {
    /// Returns the lowercase name used in variable keys
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Build => "build",
            VersionType::Product => "product",
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the manifest key holding a version, e.g. `runtime|9.0|build-version`
pub fn version_variable_name(
    version_type: VersionType,
    simple_name: &str,
    dockerfile_version: &str,
) -> String {
    format!("{}|{}|{}-version", simple_name, dockerfile_version, version_type)
}
