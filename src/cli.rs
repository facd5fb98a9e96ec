//! CLI argument parsing module for image-harness
//!
//! Every test option falls back to the environment variable the CI pipeline
//! sets, so the same binary runs unchanged locally and in a build agent.

use crate::config::{HarnessConfig, Secret};
use crate::domain::{DependencyInfo, TestCategory};
use crate::engine::DEFAULT_ENGINE;
use crate::error::ConfigError;
use crate::update::CoupledProposal;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Container image test and release harness
#[derive(Parser, Debug, Clone)]
#[command(
    name = "image-harness",
    version,
    about = "Container image test and release harness"
)]
pub struct CliArgs {
    /// Enable verbose (debug) logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run image test scenarios
    Test(TestArgs),
    /// Update version variables in the manifest
    UpdateDependencies(UpdateArgs),
}

/// Options for `test`
#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Product version under test (e.g. 9.0)
    #[arg(long = "version", env = "IMAGE_VERSION")]
    pub image_version: String,

    /// Architecture tag component (e.g. amd64, arm64v8)
    #[arg(long, env = "IMAGE_ARCH", default_value = "amd64")]
    pub architecture: String,

    /// OS tag component (e.g. bookworm-slim, alpine3.21)
    #[arg(long, env = "IMAGE_OS")]
    pub os: String,

    /// Registry to prefix image references with
    #[arg(long, env = "REGISTRY")]
    pub registry: Option<String>,

    /// Prefix prepended to repository names
    #[arg(long, env = "REPO_PREFIX", default_value = "")]
    pub repo_prefix: String,

    /// Test category to run (can be specified multiple times)
    #[arg(long = "category", value_enum, action = ArgAction::Append)]
    pub categories: Vec<TestCategory>,

    /// Image-info file to validate in the pre-build category
    #[arg(long, env = "IMAGE_INFO_PATH")]
    pub image_info: Option<PathBuf>,

    /// Pull images from the registry instead of using local builds
    #[arg(
        long,
        env = "PULL_IMAGES",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub pull_images: bool,

    /// Skip HTTP verification of web samples
    #[arg(
        long,
        env = "DISABLE_HTTP_VERIFICATION",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub disable_http_verification: bool,

    /// Token passed to sample builds as ACCESSTOKEN
    #[arg(long, env = "INTERNAL_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Container engine binary
    #[arg(long, env = "CONTAINER_ENGINE", default_value = DEFAULT_ENGINE)]
    pub engine: String,

    /// Directory containing the sample applications
    #[arg(long, default_value = "samples")]
    pub samples_dir: PathBuf,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl TestArgs {
    /// Selected categories in order, without duplicates
    pub fn categories(&self) -> Result<Vec<TestCategory>, ConfigError> {
        let mut categories: Vec<TestCategory> = Vec::new();
        for category in &self.categories {
            if !categories.contains(category) {
                categories.push(*category);
            }
        }
        if categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        Ok(categories)
    }

    /// Build the harness configuration
    pub fn to_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new(&self.image_version, &self.os, &self.architecture);
        config.engine = self.engine.clone();
        config.registry = self.registry.clone().filter(|r| !r.is_empty());
        config.repo_prefix = self.repo_prefix.clone();
        config.image_info_path = self.image_info.clone();
        config.pull_images = self.pull_images;
        config.verify_http = !self.disable_http_verification;
        config.access_token = self.access_token.as_deref().map(Secret::new);
        config.samples_dir = self.samples_dir.clone();
        config
    }
}

/// Options for `update-dependencies`
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Manifest file holding the version variables
    #[arg(long, default_value = "manifest.versions.json")]
    pub manifest: PathBuf,

    /// Dockerfile version family to update (e.g. 9.0)
    #[arg(long)]
    pub dockerfile_version: String,

    /// Discovered dependency version as NAME=VERSION (can be specified multiple times)
    #[arg(long = "dependency", value_name = "NAME=VERSION", action = ArgAction::Append)]
    pub dependencies: Vec<DependencyInfo>,

    /// Runtime-coupled variable proposal as VARIABLE=VALUE (can be specified multiple times)
    #[arg(long = "coupled", value_name = "VARIABLE=VALUE", action = ArgAction::Append)]
    pub coupled: Vec<CoupledProposal>,

    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}
