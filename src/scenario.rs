//! Image test scenarios
//!
//! `TestRunner` executes one scenario per selected test category against
//! the configured images. A failing scenario is recorded in the report and
//! the remaining scenarios still run. Every scenario removes the containers
//! and images it created, whether or not its check passed.

use crate::config::{unique_name, HarnessConfig};
use crate::domain::TestCategory;
use crate::engine::{BuildArgs, ContainerEngine, RunArgs};
use crate::error::{AppError, ExecError, ImageInfoError};
use crate::exec::CommandRunner;
use crate::http::EndpointVerifier;
use crate::image_info::ImageInfo;
use crate::progress::Progress;
use serde::Serialize;
use std::time::Instant;

const SERVER_VERSION_TEMPLATE: &str = "{{.Server.Version}}";
const OS_TEMPLATE: &str = "{{.Os}}";
const CONSOLE_SAMPLE: &str = "dotnetapp";
const WEB_SAMPLE: &str = "aspnetapp";
const WEB_SAMPLE_PORT: &str = "8080";

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub category: TestCategory,
    pub passed: bool,
    /// Informational lines gathered while the scenario ran
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Outcomes of every scenario in a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestReport {
    /// Tag shared by the images under test
    pub image_tag: String,
    pub results: Vec<ScenarioResult>,
}

impl TestReport {
    pub fn new(image_tag: impl Into<String>) -> Self {
        Self {
            image_tag: image_tag.into(),
            results: Vec::new(),
        }
    }

    /// Returns true if every scenario passed
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// Returns the failed scenarios
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Runs test scenarios through a container engine
pub struct TestRunner<'a, R, V> {
    engine: &'a ContainerEngine<R>,
    verifier: &'a V,
    config: &'a HarnessConfig,
    progress: Progress,
}

impl<'a, R: CommandRunner, V: EndpointVerifier> TestRunner<'a, R, V> {
    pub fn new(engine: &'a ContainerEngine<R>, verifier: &'a V, config: &'a HarnessConfig) -> Self {
        Self {
            engine,
            verifier,
            config,
            progress: Progress::disabled(),
        }
    }

    /// Show a progress bar while scenarios run
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the scenario of each category in order
    pub async fn run(&mut self, categories: &[TestCategory]) -> TestReport {
        let mut report = TestReport::new(self.config.image_tag());
        self.progress
            .start_steps(categories.len() as u64, "Running image tests");

        for &category in categories {
            self.progress.step(category.name());
            let started = Instant::now();
            let mut details = Vec::new();

            let outcome = self.run_category(category, &mut details).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(()) => {
                    tracing::info!(%category, duration_ms, "scenario passed");
                    ScenarioResult {
                        category,
                        passed: true,
                        details,
                        error: None,
                        duration_ms,
                    }
                }
                Err(e) => {
                    tracing::warn!(%category, duration_ms, "scenario failed: {}", e);
                    ScenarioResult {
                        category,
                        passed: false,
                        details,
                        error: Some(e.to_string()),
                        duration_ms,
                    }
                }
            };
            report.results.push(result);
            self.progress.advance();
        }

        self.progress.clear();
        report
    }

    async fn run_category(
        &self,
        category: TestCategory,
        details: &mut Vec<String>,
    ) -> Result<(), AppError> {
        match category {
            TestCategory::PreBuild => self.pre_build(details).await,
            TestCategory::RuntimeDeps => self.runtime_deps(details).await,
            TestCategory::Runtime | TestCategory::Aspnet => {
                self.run_product(category, &["dotnet", "--list-runtimes"], details)
                    .await
            }
            TestCategory::Sdk => {
                self.run_product(category, &["dotnet", "--version"], details)
                    .await
            }
            TestCategory::Monitor => self.run_product(category, &["--version"], details).await,
            TestCategory::ImageSize => self.image_size(details).await,
            TestCategory::Sample => self.sample(details).await,
        }
    }

    async fn pre_build(&self, details: &mut Vec<String>) -> Result<(), AppError> {
        let version = self.engine.version(SERVER_VERSION_TEMPLATE).await?;
        details.push(format!("{} server version {}", self.engine.program(), version));

        let Some(path) = &self.config.image_info_path else {
            return Ok(());
        };
        let info = ImageInfo::load(path)?;
        let issues = info.validate();
        if let Some(first) = issues.first() {
            return Err(ImageInfoError::Invalid {
                path: path.clone(),
                count: issues.len(),
                first: first.to_string(),
            }
            .into());
        }
        details.push(format!(
            "{}: {} platform(s) valid",
            path.display(),
            info.platforms().count()
        ));
        Ok(())
    }

    async fn runtime_deps(&self, details: &mut Vec<String>) -> Result<(), AppError> {
        let image = self.config.image_reference("runtime-deps");
        self.ensure_image(&image).await?;

        let os = self.engine.inspect(&image, OS_TEMPLATE).await?;
        if os != "linux" {
            return Err(ExecError::unexpected_output(
                format!("{} inspect {}", self.engine.program(), image),
                format!("expected OS 'linux', got '{}'", os),
            )
            .into());
        }
        details.push(format!("{}: os {}", image, os));
        Ok(())
    }

    /// Run a command in a product image and require it to succeed
    async fn run_product(
        &self,
        category: TestCategory,
        command: &[&str],
        details: &mut Vec<String>,
    ) -> Result<(), AppError> {
        let Some(repo) = category.repo() else {
            return Ok(());
        };
        let image = self.config.image_reference(repo);
        self.ensure_image(&image).await?;

        let result = self
            .engine
            .run(RunArgs::new(&image).auto_remove().command(command.iter().copied()))
            .await?;
        details.extend(
            result
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| format!("{}: {}", repo, line)),
        );
        Ok(())
    }

    async fn image_size(&self, details: &mut Vec<String>) -> Result<(), AppError> {
        for repo in TestCategory::product_repos() {
            let image = self.config.image_reference(repo);
            self.ensure_image(&image).await?;
            let size = self.engine.image_size(&image).await?;
            details.push(format!(
                "{}: {} bytes ({:.1} MB)",
                image,
                size,
                size as f64 / 1_000_000.0
            ));
        }
        Ok(())
    }

    async fn sample(&self, details: &mut Vec<String>) -> Result<(), AppError> {
        let (image, built) = self.sample_image(CONSOLE_SAMPLE).await?;
        let name = unique_name(CONSOLE_SAMPLE);

        let outcome = self
            .engine
            .run(RunArgs::new(&image).name(&name).auto_remove())
            .await;
        let cleanup = self.cleanup(Some(&name), built.then_some(image.as_str())).await;
        let result = outcome?;
        cleanup?;

        details.push(format!(
            "{}: {}",
            image,
            result.stdout.lines().last().unwrap_or("ran").trim()
        ));

        if self.config.verify_http {
            self.web_sample(details).await?;
        }
        Ok(())
    }

    async fn web_sample(&self, details: &mut Vec<String>) -> Result<(), AppError> {
        let (image, built) = self.sample_image(WEB_SAMPLE).await?;
        let name = unique_name(WEB_SAMPLE);

        let outcome = self.verify_web_container(&image, &name).await;
        let cleanup = self.cleanup(Some(&name), built.then_some(image.as_str())).await;
        let url = outcome?;
        cleanup?;

        details.push(format!("{}: {} responded", image, url));
        Ok(())
    }

    async fn verify_web_container(&self, image: &str, name: &str) -> Result<String, AppError> {
        self.engine
            .run(
                RunArgs::new(image)
                    .name(name)
                    .detach()
                    .publish(WEB_SAMPLE_PORT),
            )
            .await?;
        let port = self
            .engine
            .host_port(name, &format!("{}/tcp", WEB_SAMPLE_PORT))
            .await?;
        let url = format!("http://localhost:{}/", port);
        self.verifier.verify(&url).await?;
        Ok(url)
    }

    /// Pull or build a sample image; the flag is true when it was built here
    async fn sample_image(&self, sample: &str) -> Result<(String, bool), AppError> {
        if self.config.pull_images {
            let image = self.config.sample_reference(sample);
            self.engine.pull(&image).await?;
            return Ok((image, false));
        }

        let tag = unique_name(sample);
        let mut args = BuildArgs::new(&tag, self.config.samples_dir.join(sample))
            .build_arg("TAG", self.config.image_tag());
        if let Some(token) = self.config.access_token() {
            args = args.secret_build_arg("ACCESSTOKEN", token.expose());
        }
        self.engine.build(args).await?;
        Ok((tag, true))
    }

    /// Make sure a product image is available locally
    async fn ensure_image(&self, image: &str) -> Result<(), AppError> {
        if self.config.pull_images {
            self.engine.pull(image).await?;
            return Ok(());
        }
        if !self.engine.image_exists(image).await? {
            return Err(ExecError::unexpected_output(
                format!("{} image ls -q {}", self.engine.program(), image),
                format!("image '{}' not found; build it or pass --pull-images", image),
            )
            .into());
        }
        Ok(())
    }

    /// Remove a container and then an image, attempting both
    async fn cleanup(&self, container: Option<&str>, image: Option<&str>) -> Result<(), AppError> {
        let container = match container {
            Some(name) => self.engine.delete_container(name).await,
            None => Ok(()),
        };
        let image = match image {
            Some(image) => self.engine.delete_image(image).await,
            None => Ok(()),
        };
        container?;
        image?;
        Ok(())
    }
}
