//! Container lifecycle operations
//!
//! `ContainerEngine` drives the engine binary through `ProcessExecutor`.
//! Deletes are idempotent: each one probes first and only removes a
//! resource that exists.

use super::{resource_exists, BuildArgs, EngineCommand, ResourceKind, RunArgs};
use crate::domain::ExecutionResult;
use crate::error::ExecError;
use crate::exec::{CommandRunner, ExecOptions, Invocation, ProcessExecutor, SystemRunner};

/// Engine binary used when none is configured
pub const DEFAULT_ENGINE: &str = "docker";

const SIZE_TEMPLATE: &str = "{{.Size}}";

/// Wrapper around a container engine binary
#[derive(Debug, Clone)]
pub struct ContainerEngine<R = SystemRunner> {
    program: String,
    executor: ProcessExecutor<R>,
}

impl ContainerEngine<SystemRunner> {
    /// Create a wrapper that spawns `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_executor(program, ProcessExecutor::new())
    }
}

impl Default for ContainerEngine<SystemRunner> {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE)
    }
}

impl<R: CommandRunner> ContainerEngine<R> {
    /// Create a wrapper over a custom executor
    pub fn with_executor(program: impl Into<String>, executor: ProcessExecutor<R>) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    /// Returns the engine binary name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the underlying executor
    pub fn executor(&self) -> &ProcessExecutor<R> {
        &self.executor
    }

    /// Build the invocation for `command`, registering its secrets
    pub fn invocation(&self, command: &EngineCommand) -> Invocation {
        command
            .secrets()
            .iter()
            .fold(
                Invocation::new(&self.program).args(command.to_args()),
                |invocation, secret| invocation.secret(secret.as_str()),
            )
    }

    async fn execute(
        &self,
        command: &EngineCommand,
        options: ExecOptions,
    ) -> Result<ExecutionResult, ExecError> {
        let invocation = self.invocation(command);
        self.executor.execute_with_logging(&invocation, options).await
    }

    /// Run a query command and return its trimmed stdout
    async fn query(&self, command: EngineCommand) -> Result<String, ExecError> {
        let invocation = self.invocation(&command);
        let result = self
            .executor
            .execute(&invocation, ExecOptions::strict())
            .await?;
        Ok(result.trimmed_stdout().to_string())
    }

    /// Build an image
    pub async fn build(&self, args: BuildArgs) -> Result<ExecutionResult, ExecError> {
        tracing::info!(tag = %args.tag, context = %args.context.display(), "building image");
        self.execute(&EngineCommand::Build(args), ExecOptions::strict())
            .await
    }

    /// Run a container, failing on a non-zero exit
    pub async fn run(&self, args: RunArgs) -> Result<ExecutionResult, ExecError> {
        self.run_with_options(args, ExecOptions::strict()).await
    }

    /// Run a container with explicit error handling
    pub async fn run_with_options(
        &self,
        args: RunArgs,
        options: ExecOptions,
    ) -> Result<ExecutionResult, ExecError> {
        tracing::debug!(image = %args.image, "running container");
        self.execute(&EngineCommand::Run(args), options).await
    }

    /// Pull an image, retrying transient registry failures
    pub async fn pull(&self, image: &str) -> Result<ExecutionResult, ExecError> {
        tracing::info!(image, "pulling image");
        let command = EngineCommand::Pull {
            image: image.to_string(),
        };
        self.execute(&command, ExecOptions::strict().with_auto_retry())
            .await
    }

    /// Returns true if an image matching `image` is present locally
    pub async fn image_exists(&self, image: &str) -> Result<bool, ExecError> {
        self.exists(ResourceKind::Image, image).await
    }

    /// Returns true if a container named exactly `name` exists, running or not
    pub async fn container_exists(&self, name: &str) -> Result<bool, ExecError> {
        self.exists(ResourceKind::Container, name).await
    }

    /// Returns true if a volume named exactly `name` exists
    pub async fn volume_exists(&self, name: &str) -> Result<bool, ExecError> {
        self.exists(ResourceKind::Volume, name).await
    }

    async fn exists(&self, kind: ResourceKind, filter: &str) -> Result<bool, ExecError> {
        resource_exists(&self.executor, &self.program, kind, filter).await
    }

    /// Remove an image if it exists
    pub async fn delete_image(&self, image: &str) -> Result<(), ExecError> {
        self.delete(ResourceKind::Image, image).await
    }

    /// Remove a container if it exists, logging its output first
    pub async fn delete_container(&self, name: &str) -> Result<(), ExecError> {
        if !self.container_exists(name).await? {
            return Ok(());
        }

        let logs = EngineCommand::Logs {
            container: name.to_string(),
        };
        match self
            .executor
            .execute(
                &self.invocation(&logs),
                ExecOptions::strict().with_ignore_errors(),
            )
            .await
        {
            Ok(result) if !result.stdout.trim().is_empty() || !result.stderr.trim().is_empty() => {
                tracing::info!(
                    container = name,
                    "container logs:\n{}{}",
                    result.stdout,
                    result.stderr
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(container = name, "could not read container logs: {}", e),
        }

        self.remove(ResourceKind::Container, name).await
    }

    /// Remove a volume if it exists
    pub async fn delete_volume(&self, name: &str) -> Result<(), ExecError> {
        self.delete(ResourceKind::Volume, name).await
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<(), ExecError> {
        if !self.exists(kind, name).await? {
            tracing::debug!(%kind, name, "nothing to delete");
            return Ok(());
        }
        self.remove(kind, name).await
    }

    async fn remove(&self, kind: ResourceKind, name: &str) -> Result<(), ExecError> {
        let command = EngineCommand::Remove {
            kind,
            name: name.to_string(),
        };
        self.execute(&command, ExecOptions::strict()).await?;
        Ok(())
    }

    /// Evaluate a Go template against an image or container
    pub async fn inspect(&self, target: &str, template: &str) -> Result<String, ExecError> {
        self.query(EngineCommand::Inspect {
            template: template.to_string(),
            target: target.to_string(),
        })
        .await
    }

    /// Evaluate a Go template against the engine version information
    pub async fn version(&self, template: &str) -> Result<String, ExecError> {
        self.query(EngineCommand::Version {
            template: template.to_string(),
        })
        .await
    }

    /// Returns the output of a container
    pub async fn logs(&self, container: &str) -> Result<String, ExecError> {
        let command = EngineCommand::Logs {
            container: container.to_string(),
        };
        let result = self
            .executor
            .execute(&self.invocation(&command), ExecOptions::strict())
            .await?;
        Ok(format!("{}{}", result.stdout, result.stderr))
    }

    /// Returns the size of an image in bytes
    pub async fn image_size(&self, image: &str) -> Result<u64, ExecError> {
        let output = self.inspect(image, SIZE_TEMPLATE).await?;
        output.parse().map_err(|_| {
            ExecError::unexpected_output(
                format!("{} inspect {}", self.program, image),
                format!("expected an image size, got '{}'", output),
            )
        })
    }

    /// Returns the host port bound to `container_port` (e.g. `8080/tcp`)
    pub async fn host_port(&self, container: &str, container_port: &str) -> Result<u16, ExecError> {
        let template = format!(
            "{{{{(index (index .NetworkSettings.Ports \"{}\") 0).HostPort}}}}",
            container_port
        );
        let output = self.inspect(container, &template).await?;
        output.parse().map_err(|_| {
            ExecError::unexpected_output(
                format!("{} inspect {}", self.program, container),
                format!("expected a host port for {}, got '{}'", container_port, output),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingRunner;

    fn engine(runner: RecordingRunner) -> ContainerEngine<RecordingRunner> {
        ContainerEngine::with_executor("docker", ProcessExecutor::with_runner(runner))
    }

    fn calls(engine: &ContainerEngine<RecordingRunner>) -> Vec<String> {
        engine.executor().runner().calls()
    }

    #[test]
    fn test_default_engine_is_docker() {
        assert_eq!(ContainerEngine::default().program(), "docker");
        assert_eq!(ContainerEngine::new("podman").program(), "podman");
    }

    #[test]
    fn test_invocation_masks_build_secrets() {
        let engine = engine(RecordingRunner::new());
        let command = EngineCommand::Build(
            BuildArgs::new("app", ".").secret_build_arg("ACCESSTOKEN", "pat-123"),
        );
        let invocation = engine.invocation(&command);
        assert_eq!(
            invocation.to_string(),
            "docker build -t app --build-arg ACCESSTOKEN=*** ."
        );
    }

    #[tokio::test]
    async fn test_delete_absent_image_only_probes() {
        let engine = engine(RecordingRunner::new());
        engine.delete_image("img:1").await.unwrap();
        assert_eq!(calls(&engine), vec!["image ls -q img:1"]);
    }

    #[tokio::test]
    async fn test_delete_present_image_removes() {
        let engine = engine(RecordingRunner::new().stdout("image ls", "abc\n"));
        engine.delete_image("img:1").await.unwrap();
        assert_eq!(calls(&engine), vec!["image ls -q img:1", "image rm -f img:1"]);
    }

    #[tokio::test]
    async fn test_delete_absent_volume_only_probes() {
        let engine = engine(RecordingRunner::new());
        engine.delete_volume("data").await.unwrap();
        assert_eq!(calls(&engine), vec!["volume ls -q --filter name=^data$"]);
    }

    #[tokio::test]
    async fn test_delete_container_captures_logs_first() {
        let engine = engine(
            RecordingRunner::new()
                .stdout("container ls", "f00d\n")
                .fail("logs", 1),
        );
        engine.delete_container("web").await.unwrap();
        assert_eq!(
            calls(&engine),
            vec![
                "container ls -a -q --filter name=^web$",
                "logs web",
                "container rm -f web",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_container_removes_when_logs_unreadable() {
        let engine = engine(
            RecordingRunner::new()
                .stdout("container ls", "f00d\n")
                .io_error("logs"),
        );
        engine.delete_container("web").await.unwrap();
        assert_eq!(engine.executor().runner().calls_starting_with("container rm -f web"), 1);
    }

    #[tokio::test]
    async fn test_delete_absent_container_skips_logs() {
        let engine = engine(RecordingRunner::new());
        engine.delete_container("web").await.unwrap();
        assert_eq!(calls(&engine), vec!["container ls -a -q --filter name=^web$"]);
    }

    #[tokio::test]
    async fn test_failed_removal_is_error() {
        let engine = engine(
            RecordingRunner::new()
                .stdout("volume ls", "data\n")
                .fail("volume rm", 1),
        );
        assert!(engine.delete_volume("data").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_retries_until_success() {
        let engine = engine(RecordingRunner::new().respond(
            "pull",
            vec![
                ExecutionResult::new(1, "", "TLS handshake timeout"),
                ExecutionResult::new(1, "", "TLS handshake timeout"),
                ExecutionResult::new(0, "Status: Downloaded", ""),
            ],
        ));
        let result = engine.pull("mcr/runtime:9.0").await.unwrap();
        assert!(result.success());
        assert_eq!(engine.executor().runner().calls_starting_with("pull"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_gives_up_after_five_attempts() {
        let engine = engine(RecordingRunner::new().fail("pull", 1));
        let err = engine.pull("mcr/runtime:9.0").await.unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(engine.executor().runner().calls_starting_with("pull"), 5);
    }

    #[tokio::test]
    async fn test_run_is_strict_and_not_retried() {
        let engine = engine(RecordingRunner::new().fail("run", 125));
        let err = engine
            .run(RunArgs::new("img").auto_remove().command(["dotnet", "--version"]))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(125));
        assert_eq!(calls(&engine), vec!["run --rm img dotnet --version"]);
    }

    #[tokio::test]
    async fn test_run_with_ignore_errors() {
        let engine = engine(RecordingRunner::new().fail("run", 3));
        let result = engine
            .run_with_options(RunArgs::new("img"), ExecOptions::strict().with_ignore_errors())
            .await
            .unwrap();
        assert_eq!(result.exit_code, 3);
    }

    #[tokio::test]
    async fn test_inspect_and_version_trim_output() {
        let engine = engine(
            RecordingRunner::new()
                .stdout("inspect", "linux\n")
                .stdout("version", " 27.3.1 \n"),
        );
        assert_eq!(engine.inspect("img", "{{.Os}}").await.unwrap(), "linux");
        assert_eq!(
            engine.version("{{.Server.Version}}").await.unwrap(),
            "27.3.1"
        );
    }

    #[tokio::test]
    async fn test_image_size() {
        let engine = engine(RecordingRunner::new().stdout("inspect", "216541234\n"));
        assert_eq!(engine.image_size("img").await.unwrap(), 216_541_234);
        assert_eq!(calls(&engine), vec!["inspect -f {{.Size}} img"]);
    }

    #[tokio::test]
    async fn test_image_size_rejects_garbage() {
        let engine = engine(RecordingRunner::new().stdout("inspect", "<no value>\n"));
        assert!(matches!(
            engine.image_size("img").await,
            Err(ExecError::UnexpectedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn test_host_port() {
        let engine = engine(RecordingRunner::new().stdout("inspect", "49153\n"));
        assert_eq!(engine.host_port("web", "8080/tcp").await.unwrap(), 49153);
        assert_eq!(
            calls(&engine),
            vec![r#"inspect -f {{(index (index .NetworkSettings.Ports "8080/tcp") 0).HostPort}} web"#]
        );
    }

    #[tokio::test]
    async fn test_logs_concatenates_streams() {
        let engine = engine(RecordingRunner::new().respond(
            "logs",
            vec![ExecutionResult::new(0, "listening\n", "warn: x\n")],
        ));
        assert_eq!(engine.logs("web").await.unwrap(), "listening\nwarn: x\n");
    }
}
