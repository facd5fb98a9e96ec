//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Manifest store lookups and writes (configuration errors)
//! - ExecError: Container engine subprocess failures
//! - HttpError: HTTP verification of sample containers
//! - ImageInfoError: Loading emitted image metadata
//! - ConfigError: Issues with CLI configuration

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest store related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Subprocess execution errors
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// HTTP verification errors
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Image-info loading errors
    #[error(transparent)]
    ImageInfo(#[from] ImageInfoError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to the manifest store
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Variable is not defined in the manifest
    #[error("variable '{name}' is not defined in the manifest")]
    MissingVariable { name: String },

    /// Variable is defined but its value is unusable
    #[error("variable '{name}' has an invalid value: {message}")]
    InvalidVariable { name: String, message: String },

    /// Variable references form a cycle
    #[error("circular reference while resolving variable '{name}'")]
    CircularReference { name: String },

    /// Changed variable could not be located in the file text
    #[error("variable '{name}' could not be located in {path}")]
    VariableNotInFile { name: String, path: PathBuf },
}

/// Errors related to running external commands
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading process output or waiting for exit failed
    #[error("I/O error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero code
    #[error("command '{command}' failed with exit code {exit_code}: {stderr}")]
    ProcessFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The process succeeded but printed something we could not interpret
    #[error("unexpected output from '{command}': {message}")]
    UnexpectedOutput { command: String, message: String },
}

/// Errors related to HTTP verification
#[derive(Error, Debug)]
pub enum HttpError {
    /// Request could not be completed
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// Non-success status code
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Timeout
    #[error("timeout while requesting {url}")]
    Timeout { url: String },
}

/// Errors related to image-info files
#[derive(Error, Debug)]
pub enum ImageInfoError {
    /// Failed to read the image-info file
    #[error("failed to read image info {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the image-info file
    #[error("failed to parse image info {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// The image-info file parsed but failed validation
    #[error("image info {path} has {count} issue(s), first: {first}")]
    Invalid {
        path: PathBuf,
        count: usize,
        first: String,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed name=value argument
    #[error("invalid value '{value}': expected format 'name=value'")]
    InvalidKeyValue { value: String },

    /// No test category selected
    #[error("no test category selected: pass at least one --category")]
    NoCategories,

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new MissingVariable error
    pub fn missing_variable(name: impl Into<String>) -> Self {
        ManifestError::MissingVariable { name: name.into() }
    }

    /// Creates a new InvalidVariable error
    pub fn invalid_variable(name: impl Into<String>, message: impl Into<String>) -> Self {
        ManifestError::InvalidVariable {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new CircularReference error
    pub fn circular_reference(name: impl Into<String>) -> Self {
        ManifestError::CircularReference { name: name.into() }
    }

    /// Creates a new VariableNotInFile error
    pub fn variable_not_in_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ManifestError::VariableNotInFile {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl ExecError {
    /// Creates a new ProcessFailed error
    pub fn process_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        ExecError::ProcessFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new UnexpectedOutput error
    pub fn unexpected_output(command: impl Into<String>, message: impl Into<String>) -> Self {
        ExecError::UnexpectedOutput {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Returns the exit code if the process ran and failed
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::ProcessFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

impl HttpError {
    /// Creates a new Request error
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        HttpError::Request {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(url: impl Into<String>) -> Self {
        HttpError::Timeout { url: url.into() }
    }
}
