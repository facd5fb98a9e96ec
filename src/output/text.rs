//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Changed manifest variables with the dependencies that justified them
//! - Per-scenario pass/fail lines with details and errors
//! - Summary lines for both

use crate::domain::Resolution;
use crate::orchestrator::OrchestratorResult;
use crate::output::{OutputFormatter, Verbosity};
use crate::scenario::{ScenarioResult, TestReport};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_color(verbosity, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn dry_run_prefix(&self, dry_run: bool) -> String {
        match (dry_run, self.color) {
            (false, _) => String::new(),
            (true, true) => format!("{} ", "(dry-run)".cyan()),
            (true, false) => "(dry-run) ".to_string(),
        }
    }

    fn max_name_length(resolutions: &[&Resolution]) -> usize {
        resolutions
            .iter()
            .map(|r| r.variable_name().len())
            .max()
            .unwrap_or(0)
    }

    fn format_change_line(
        &self,
        resolution: &Resolution,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let because = resolution
            .used_dependencies
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        if self.color {
            writeln!(
                writer,
                "  {} {} {} {}",
                format!("{:width$}", resolution.variable_name(), width = width),
                resolution.binding.current_value.dimmed(),
                "→".dimmed(),
                resolution.resolved_value.bright_white().bold(),
            )?;
        } else {
            writeln!(
                writer,
                "  {:width$} {} -> {}",
                resolution.variable_name(),
                resolution.binding.current_value,
                resolution.resolved_value,
                width = width
            )?;
        }

        if self.verbosity == Verbosity::Verbose && !because.is_empty() {
            writeln!(writer, "  {:width$}   (from {})", "", because, width = width)?;
        }
        Ok(())
    }

    fn format_unchanged_line(
        &self,
        resolution: &Resolution,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let line = format!(
            "  {:width$} {} (unchanged)",
            resolution.variable_name(),
            resolution.resolved_value,
            width = width
        );
        if self.color {
            writeln!(writer, "{}", line.dimmed())
        } else {
            writeln!(writer, "{}", line)
        }
    }

    fn format_scenario(&self, result: &ScenarioResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let seconds = result.duration_ms as f64 / 1000.0;
        let status = match (result.passed, self.color) {
            (true, true) => "PASS".green().bold().to_string(),
            (false, true) => "FAIL".red().bold().to_string(),
            (true, false) => "PASS".to_string(),
            (false, false) => "FAIL".to_string(),
        };
        writeln!(
            writer,
            "{} {:<14} ({:.1}s)",
            status,
            result.category.name(),
            seconds
        )?;

        if self.verbosity != Verbosity::Quiet {
            for detail in &result.details {
                writeln!(writer, "     {}", detail)?;
            }
        }
        if let Some(error) = &result.error {
            if self.color {
                writeln!(writer, "     {}", error.red())?;
            } else {
                writeln!(writer, "     {}", error)?;
            }
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_update(
        &self,
        result: &OrchestratorResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let summary = &result.summary;
        let prefix = self.dry_run_prefix(summary.dry_run);
        let changes: Vec<&Resolution> = summary.changes().collect();
        let unchanged: Vec<&Resolution> = summary.unchanged().collect();

        if self.verbosity != Verbosity::Quiet {
            let path = summary.manifest.display().to_string();
            if self.color {
                writeln!(writer, "{}{}", prefix, path.bold())?;
            } else {
                writeln!(writer, "{}{}", prefix, path)?;
            }

            let shown: Vec<&Resolution> = if self.verbosity == Verbosity::Verbose {
                changes.iter().chain(unchanged.iter()).copied().collect()
            } else {
                changes.clone()
            };
            let width = Self::max_name_length(&shown).max(20);

            for resolution in &changes {
                self.format_change_line(resolution, width, writer)?;
            }
            if self.verbosity == Verbosity::Verbose {
                for resolution in &unchanged {
                    self.format_unchanged_line(resolution, width, writer)?;
                }
            }
            writeln!(writer)?;
        }

        for error in &result.write_result.errors {
            if self.color {
                writeln!(writer, "{} {}", "error:".red().bold(), error)?;
            } else {
                writeln!(writer, "error: {}", error)?;
            }
        }

        let verb = if summary.dry_run {
            "would be updated"
        } else {
            "updated"
        };
        if changes.is_empty() {
            writeln!(writer, "{}All variables are up to date", prefix)?;
        } else if self.color {
            writeln!(
                writer,
                "{}{} {} {}, {} unchanged",
                prefix,
                changes.len().to_string().green().bold(),
                if changes.len() == 1 { "variable" } else { "variables" },
                verb,
                unchanged.len()
            )?;
        } else {
            writeln!(
                writer,
                "{}{} {} {}, {} unchanged",
                prefix,
                changes.len(),
                if changes.len() == 1 { "variable" } else { "variables" },
                verb,
                unchanged.len()
            )?;
        }
        Ok(())
    }

    fn format_report(&self, report: &TestReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            writeln!(writer, "Image tag: {}", report.image_tag)?;
        }
        for result in &report.results {
            if self.verbosity == Verbosity::Quiet && result.passed {
                continue;
            }
            self.format_scenario(result, writer)?;
        }

        let line = format!(
            "{} passed, {} failed",
            report.passed_count(),
            report.failed_count()
        );
        match (report.passed(), self.color) {
            (true, true) => writeln!(writer, "\n{}", line.green()),
            (false, true) => writeln!(writer, "\n{}", line.red()),
            _ => writeln!(writer, "\n{}", line),
        }
    }
}
