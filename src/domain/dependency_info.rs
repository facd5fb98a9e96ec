//! Dependency information supplied to an update pass

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A named dependency and the version discovered for it in this pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Short identifier such as "runtime" or "aspnet"
    pub simple_name: String,
    /// Version token discovered for this dependency
    pub simple_version: String,
}

impl DependencyInfo {
    /// Creates a new dependency info
    pub fn new(simple_name: impl Into<String>, simple_version: impl Into<String>) -> Self {
        Self {
            simple_name: simple_name.into(),
            simple_version: simple_version.into(),
        }
    }
}

impl fmt::Display for DependencyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.simple_name, self.simple_version)
    }
}

impl FromStr for DependencyInfo {
    type Err = ConfigError;

    /// Parses `name=version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidKeyValue {
            value: s.to_string(),
        };
        let (name, version) = s.split_once('=').ok_or_else(invalid)?;
        let (name, version) = (name.trim(), version.trim());
        if name.is_empty() || version.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(name, version))
    }
}

/// Finds the first dependency with the given simple name
pub fn find_dependency<'a>(
    dependencies: &'a [DependencyInfo],
    simple_name: &str,
) -> Option<&'a DependencyInfo> {
    dependencies.iter().find(|d| d.simple_name == simple_name)
}
