//! Container engine access
//!
//! This module provides:
//! - EngineCommand: typed engine subcommands rendered to argument vectors
//! - resource_exists: image/container/volume existence probing
//! - ContainerEngine: build, run, pull and idempotent cleanup of resources

mod command;
mod lifecycle;
mod probe;

pub use command::{BuildArgs, EngineCommand, ResourceKind, RunArgs};
pub use lifecycle::{ContainerEngine, DEFAULT_ENGINE};
pub use probe::resource_exists;
