//! Typed container engine commands
//!
//! Each variant renders to the argument vector passed to the engine binary,
//! so no command line is ever assembled by string concatenation.

use std::fmt;
use std::path::PathBuf;

/// Kinds of engine resources that can be listed and removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Container,
    Volume,
}

impl ResourceKind {
    /// Returns the engine's management subcommand for this kind
    pub fn subcommand(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Container => "container",
            ResourceKind::Volume => "volume",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subcommand())
    }
}

/// Arguments for `build`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    pub tag: String,
    pub context: PathBuf,
    pub dockerfile: Option<PathBuf>,
    pub platform: Option<String>,
    pub build_args: Vec<(String, String)>,
    /// Build-arg values that must be masked when displayed
    pub secrets: Vec<String>,
}

impl BuildArgs {
    /// Build `context` into an image tagged `tag`
    pub fn new(tag: impl Into<String>, context: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            context: context.into(),
            ..Default::default()
        }
    }

    /// Use a Dockerfile other than `<context>/Dockerfile`
    pub fn dockerfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(path.into());
        self
    }

    /// Target a specific platform, e.g. `linux/arm64`
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Add a `--build-arg`
    pub fn build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.push((key.into(), value.into()));
        self
    }

    /// Add a `--build-arg` whose value is masked in logs and errors
    pub fn secret_build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        self.secrets.push(value.clone());
        self.build_args.push((key.into(), value));
        self
    }
}

/// Arguments for `run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub image: String,
    pub name: Option<String>,
    pub detach: bool,
    pub remove: bool,
    pub env: Vec<(String, String)>,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub entrypoint: Option<String>,
    pub command: Vec<String>,
}

impl RunArgs {
    /// Run `image` with its default command
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn detach(mut self) -> Self {
        self.detach = true;
        self
    }

    /// Remove the container when it exits
    pub fn auto_remove(mut self) -> Self {
        self.remove = true;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Publish a container port, e.g. `8080` or `8080:80`
    pub fn publish(mut self, port: impl Into<String>) -> Self {
        self.ports.push(port.into());
        self
    }

    pub fn volume(mut self, spec: impl Into<String>) -> Self {
        self.volumes.push(spec.into());
        self
    }

    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Command and arguments passed after the image
    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }
}

/// A single container engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Build(BuildArgs),
    Run(RunArgs),
    Pull { image: String },
    Remove { kind: ResourceKind, name: String },
    List { kind: ResourceKind, filter: String },
    Inspect { template: String, target: String },
    Version { template: String },
    Logs { container: String },
}

impl EngineCommand {
    /// Render the argument vector, excluding the engine binary itself
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            EngineCommand::Build(build) => {
                args.extend(["build".to_string(), "-t".to_string(), build.tag.clone()]);
                if let Some(platform) = &build.platform {
                    args.extend(["--platform".to_string(), platform.clone()]);
                }
                for (key, value) in &build.build_args {
                    args.extend(["--build-arg".to_string(), format!("{}={}", key, value)]);
                }
                if let Some(dockerfile) = &build.dockerfile {
                    args.extend(["-f".to_string(), dockerfile.display().to_string()]);
                }
                args.push(build.context.display().to_string());
            }
            EngineCommand::Run(run) => {
                args.push("run".to_string());
                if run.detach {
                    args.push("-d".to_string());
                }
                if run.remove {
                    args.push("--rm".to_string());
                }
                if let Some(name) = &run.name {
                    args.extend(["--name".to_string(), name.clone()]);
                }
                for (key, value) in &run.env {
                    args.extend(["-e".to_string(), format!("{}={}", key, value)]);
                }
                for port in &run.ports {
                    args.extend(["-p".to_string(), port.clone()]);
                }
                for volume in &run.volumes {
                    args.extend(["-v".to_string(), volume.clone()]);
                }
                if let Some(entrypoint) = &run.entrypoint {
                    args.extend(["--entrypoint".to_string(), entrypoint.clone()]);
                }
                args.push(run.image.clone());
                args.extend(run.command.iter().cloned());
            }
            EngineCommand::Pull { image } => {
                args.extend(["pull".to_string(), image.clone()]);
            }
            EngineCommand::Remove { kind, name } => {
                args.extend([
                    kind.subcommand().to_string(),
                    "rm".to_string(),
                    "-f".to_string(),
                    name.clone(),
                ]);
            }
            EngineCommand::List { kind, filter } => {
                args.extend([kind.subcommand().to_string(), "ls".to_string()]);
                match kind {
                    ResourceKind::Image => {
                        args.extend(["-q".to_string(), filter.clone()]);
                    }
                    ResourceKind::Container => {
                        args.extend([
                            "-a".to_string(),
                            "-q".to_string(),
                            "--filter".to_string(),
                            format!("name=^{}$", filter),
                        ]);
                    }
                    ResourceKind::Volume => {
                        args.extend([
                            "-q".to_string(),
                            "--filter".to_string(),
                            format!("name=^{}$", filter),
                        ]);
                    }
                }
            }
            EngineCommand::Inspect { template, target } => {
                args.extend([
                    "inspect".to_string(),
                    "-f".to_string(),
                    template.clone(),
                    target.clone(),
                ]);
            }
            EngineCommand::Version { template } => {
                args.extend(["version".to_string(), "-f".to_string(), template.clone()]);
            }
            EngineCommand::Logs { container } => {
                args.extend(["logs".to_string(), container.clone()]);
            }
        }
        args
    }

    /// Values to mask when this command is displayed
    pub fn secrets(&self) -> &[String] {
        match self {
            EngineCommand::Build(build) => &build.secrets,
            _ => &[],
        }
    }
}
