//! Core domain models for image-harness
//!
//! This module contains the fundamental types used throughout the application:
//! - Dependency information supplied to an update pass
//! - Variable bindings and resolution results
//! - Subprocess execution results
//! - Test categories selectable from the CLI
//! - Update summary structures

mod dependency_info;
mod execution_result;
mod summary;
mod test_category;
mod variable_binding;

pub use dependency_info::{find_dependency, DependencyInfo};
pub use execution_result::ExecutionResult;
pub use summary::UpdateSummary;
pub use test_category::TestCategory;
pub use variable_binding::{Resolution, VariableBinding};
