//! Test categories selectable from the CLI

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A group of image tests run together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestCategory {
    /// Runtime image
    Runtime,
    /// Runtime dependencies image
    RuntimeDeps,
    /// ASP.NET image
    Aspnet,
    /// SDK image
    Sdk,
    /// Checks that run before any image is built
    PreBuild,
    /// Sample application images
    Sample,
    /// Image size reporting
    ImageSize,
    /// Monitor image
    Monitor,
}

impl TestCategory {
    /// Returns the CLI name of this category
    pub fn name(&self) -> &'static str {
        match self {
            TestCategory::Runtime => "runtime",
            TestCategory::RuntimeDeps => "runtime-deps",
            TestCategory::Aspnet => "aspnet",
            TestCategory::Sdk => "sdk",
            TestCategory::PreBuild => "pre-build",
            TestCategory::Sample => "sample",
            TestCategory::ImageSize => "image-size",
            TestCategory::Monitor => "monitor",
        }
    }

    /// Returns the image repository exercised by this category, if any
    pub fn repo(&self) -> Option<&'static str> {
        match self {
            TestCategory::Runtime => Some("runtime"),
            TestCategory::RuntimeDeps => Some("runtime-deps"),
            TestCategory::Aspnet => Some("aspnet"),
            TestCategory::Sdk => Some("sdk"),
            TestCategory::Monitor => Some("monitor"),
            TestCategory::Sample => Some("samples"),
            TestCategory::PreBuild | TestCategory::ImageSize => None,
        }
    }

    /// Returns all categories
    pub fn all() -> &'static [TestCategory] {
        &[
            TestCategory::Runtime,
            TestCategory::RuntimeDeps,
            TestCategory::Aspnet,
            TestCategory::Sdk,
            TestCategory::PreBuild,
            TestCategory::Sample,
            TestCategory::ImageSize,
            TestCategory::Monitor,
        ]
    }

    /// Repositories whose images ship as products (sized by image-size)
    pub fn product_repos() -> &'static [&'static str] {
        &["runtime-deps", "runtime", "aspnet", "sdk"]
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
