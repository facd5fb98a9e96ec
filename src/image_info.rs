//! Image-info metadata emitted by image builds
//!
//! The build pipeline writes one JSON document describing every image it
//! produced. Before images are tested, the document is checked for missing
//! tags, malformed digests and unparseable creation timestamps.

use crate::error::ImageInfoError;
use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// `[<repo>@]sha256:<64 hex>`
static DIGEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@\s]+@)?sha256:[0-9a-f]{64}$").expect("Invalid regex")
});

/// Root of an image-info document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    #[serde(default)]
    pub repos: Vec<RepoInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    pub repo: String,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    #[serde(default)]
    pub platforms: Vec<PlatformInfo>,
}

/// One built image for a specific OS and architecture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub dockerfile: String,
    #[serde(default)]
    pub simple_tags: Vec<String>,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub os_type: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub created: String,
}

/// A problem found in an image-info document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub repo: String,
    pub dockerfile: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.repo, self.dockerfile, self.message)
    }
}

impl ImageInfo {
    /// Load and parse an image-info file
    pub fn load(path: &Path) -> Result<Self, ImageInfoError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ImageInfoError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::parse(&content, path)
    }

    /// Parse image-info JSON; `path` is used for error context
    pub fn parse(content: &str, path: &Path) -> Result<Self, ImageInfoError> {
        serde_json::from_str(content).map_err(|e| ImageInfoError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Iterate over every platform together with its repository
    pub fn platforms(&self) -> impl Iterator<Item = (&RepoInfo, &PlatformInfo)> {
        self.repos.iter().flat_map(|repo| {
            repo.images
                .iter()
                .flat_map(move |image| image.platforms.iter().map(move |p| (repo, p)))
        })
    }

    /// Platforms built for the given OS version and architecture
    pub fn platforms_matching(&self, os: &str, architecture: &str) -> Vec<(&RepoInfo, &PlatformInfo)> {
        self.platforms()
            .filter(|(_, p)| {
                p.os_version.eq_ignore_ascii_case(os)
                    && p.architecture.eq_ignore_ascii_case(architecture)
            })
            .collect()
    }

    /// Check every platform; an empty result means the document is valid
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (repo, platform) in self.platforms() {
            let mut issue = |message: String| {
                issues.push(ValidationIssue {
                    repo: repo.repo.clone(),
                    dockerfile: platform.dockerfile.clone(),
                    message,
                })
            };

            if platform.simple_tags.iter().all(|t| t.trim().is_empty()) {
                issue("no tags".to_string());
            }
            if !DIGEST_RE.is_match(&platform.digest) {
                issue(format!("malformed digest '{}'", platform.digest));
            }
            if let Err(e) = DateTime::parse_from_rfc3339(&platform.created) {
                issue(format!("invalid created timestamp '{}': {}", platform.created, e));
            }
        }

        issues
    }
}
