//! Variable bindings and resolution results

use super::DependencyInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked manifest variable under evaluation in one update pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBinding {
    /// Key into the manifest store
    pub variable_name: String,
    /// Version family the variable belongs to (e.g. "9.0")
    pub dockerfile_version: String,
    /// Value currently recorded in the manifest
    pub current_value: String,
    /// Value to adopt if the update rule holds
    pub proposed_value: String,
}

impl VariableBinding {
    /// Creates a new binding
    pub fn new(
        variable_name: impl Into<String>,
        dockerfile_version: impl Into<String>,
        current_value: impl Into<String>,
        proposed_value: impl Into<String>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            dockerfile_version: dockerfile_version.into(),
            current_value: current_value.into(),
            proposed_value: proposed_value.into(),
        }
    }

    /// Returns true if the variable name carries its version family
    pub fn matches_version_family(&self) -> bool {
        self.variable_name.contains(&self.dockerfile_version)
    }
}

/// Outcome of resolving a single variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The binding that was evaluated
    pub binding: VariableBinding,
    /// Value the variable should hold after this pass
    pub resolved_value: String,
    /// Dependencies that justified a change (empty when unchanged)
    pub used_dependencies: Vec<DependencyInfo>,
}

impl Resolution {
    /// Keeps the current value with no justification
    pub fn unchanged(binding: VariableBinding) -> Self {
        Self {
            resolved_value: binding.current_value.clone(),
            binding,
            used_dependencies: Vec::new(),
        }
    }

    /// Adopts the proposed value, justified by the given dependencies
    pub fn changed(binding: VariableBinding, used_dependencies: Vec<DependencyInfo>) -> Self {
        Self {
            resolved_value: binding.proposed_value.clone(),
            binding,
            used_dependencies,
        }
    }

    /// Returns true if the resolved value differs from the current value
    pub fn is_change(&self) -> bool {
        self.resolved_value != self.binding.current_value
    }

    /// Returns the variable name
    pub fn variable_name(&self) -> &str {
        &self.binding.variable_name
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_change() {
            write!(
                f,
                "{}: {} → {}",
                self.binding.variable_name, self.binding.current_value, self.resolved_value
            )
        } else {
            write!(
                f,
                "{}: unchanged ({})",
                self.binding.variable_name, self.binding.current_value
            )
        }
    }
}
