//! image-harness - container image test and release harness library
//!
//! This library provides the core functionality for:
//! - Updating version variables in a manifest, including tools whose
//!   version is coupled to the runtime
//! - Driving a container engine with bounded retry and idempotent cleanup
//! - Running image test scenarios and validating image-info metadata

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod exec;
pub mod http;
pub mod image_info;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod scenario;
pub mod update;
