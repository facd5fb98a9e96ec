//! Rendering of update results and test reports
//!
//! Text is for people at a terminal; JSON is for pipelines that consume the
//! harness output.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::orchestrator::OrchestratorResult;
use crate::scenario::TestReport;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// How much a formatter prints besides the summary line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Summary and failures only
    Quiet,
    #[default]
    Normal,
    /// Also unchanged variables and the dependency behind each change
    Verbose,
}

impl Verbosity {
    /// `--quiet` and `--verbose` are mutually exclusive on the command line
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Verbosity::Quiet,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// ANSI colors in text output
    pub color: bool,
}

impl OutputConfig {
    /// Build from the `--json`, `--verbose` and `--quiet` flags, without color
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        Self {
            format: OutputFormat::from_json_flag(json),
            verbosity: Verbosity::from_flags(verbose, quiet),
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

pub trait OutputFormatter {
    /// Render the outcome of an `update-dependencies` run
    fn format_update(
        &self,
        result: &OrchestratorResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Render the outcome of a `test` run
    fn format_report(&self, report: &TestReport, writer: &mut dyn Write) -> std::io::Result<()>;
}

pub fn create_formatter(config: &OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
    }
}
