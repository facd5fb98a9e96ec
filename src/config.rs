//! Harness configuration
//!
//! `HarnessConfig` is built once from CLI arguments (which fall back to the
//! pipeline's environment variables) and passed by reference. Nothing here
//! reads or mutates the process environment.

use crate::engine::DEFAULT_ENGINE;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Repository holding the sample application images
pub const SAMPLES_REPO: &str = "samples";

/// A credential that must never be printed
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value, for handing to a child process
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

/// Settings for a test run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Container engine binary
    pub engine: String,
    /// Product version under test, e.g. `9.0`
    pub image_version: String,
    /// OS tag component, e.g. `bookworm-slim`
    pub os: String,
    /// Architecture tag component, e.g. `amd64`
    pub architecture: String,
    /// Registry host prefixed to image references
    pub registry: Option<String>,
    /// Prefix prepended to repository names
    pub repo_prefix: String,
    /// Image-info file emitted by the build
    pub image_info_path: Option<PathBuf>,
    /// Pull images instead of expecting local builds
    pub pull_images: bool,
    /// Verify web samples over HTTP
    pub verify_http: bool,
    /// Token passed to sample builds as `ACCESSTOKEN`
    pub access_token: Option<Secret>,
    /// Directory containing the sample application sources
    pub samples_dir: PathBuf,
}

impl HarnessConfig {
    /// Create a configuration for one image version/os/architecture
    pub fn new(
        image_version: impl Into<String>,
        os: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            image_version: image_version.into(),
            os: os.into(),
            architecture: architecture.into(),
            registry: None,
            repo_prefix: String::new(),
            image_info_path: None,
            pull_images: false,
            verify_http: true,
            access_token: None,
            samples_dir: PathBuf::from("samples"),
        }
    }

    /// Returns the tag shared by every product image, `<version>-<os>-<arch>`
    pub fn image_tag(&self) -> String {
        format!("{}-{}-{}", self.image_version, self.os, self.architecture)
    }

    /// Returns `[<registry>/]<repo-prefix><repo>`
    pub fn repository(&self, repo: &str) -> String {
        match self.registry.as_deref().filter(|r| !r.is_empty()) {
            Some(registry) => format!(
                "{}/{}{}",
                registry.trim_end_matches('/'),
                self.repo_prefix,
                repo
            ),
            None => format!("{}{}", self.repo_prefix, repo),
        }
    }

    /// Returns the full reference of a product image
    pub fn image_reference(&self, repo: &str) -> String {
        format!("{}:{}", self.repository(repo), self.image_tag())
    }

    /// Returns the full reference of a sample image such as `dotnetapp`
    pub fn sample_reference(&self, sample: &str) -> String {
        format!("{}:{}", self.repository(SAMPLES_REPO), sample)
    }

    /// Returns the access token, if one is configured and non-empty
    pub fn access_token(&self) -> Option<&Secret> {
        self.access_token.as_ref().filter(|t| !t.is_empty())
    }
}

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a container or image name unique within this process
///
/// Format: `<prefix>-<pid>-<millis>-<n>`.
pub fn unique_name(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}-{}", prefix, std::process::id(), millis, n)
}
