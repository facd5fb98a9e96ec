//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of update passes
//! - JSON serialization of test reports

use crate::orchestrator::OrchestratorResult;
use crate::output::{OutputFormatter, Verbosity};
use crate::scenario::TestReport;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of an update pass
#[derive(Serialize)]
struct JsonUpdateOutput {
    manifest: String,
    dry_run: bool,
    file_modified: bool,
    summary: JsonSummary,
    changes: Vec<JsonChange>,
    /// Unchanged variables (only in verbose mode)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unchanged: Vec<JsonUnchanged>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct JsonSummary {
    changed: usize,
    unchanged: usize,
}

#[derive(Serialize)]
struct JsonChange {
    variable: String,
    from: String,
    to: String,
    /// Dependencies that justified the change, as `name version`
    because: Vec<String>,
}

#[derive(Serialize)]
struct JsonUnchanged {
    variable: String,
    value: String,
}

/// JSON representation of a test report
#[derive(Serialize)]
struct JsonReportOutput<'a> {
    passed: bool,
    summary: JsonReportSummary,
    #[serde(flatten)]
    report: &'a TestReport,
}

#[derive(Serialize)]
struct JsonReportSummary {
    passed: usize,
    failed: usize,
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format_update(
        &self,
        result: &OrchestratorResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let summary = &result.summary;

        let changes = summary
            .changes()
            .map(|r| JsonChange {
                variable: r.variable_name().to_string(),
                from: r.binding.current_value.clone(),
                to: r.resolved_value.clone(),
                because: r.used_dependencies.iter().map(|d| d.to_string()).collect(),
            })
            .collect();

        let unchanged = if self.verbosity == Verbosity::Verbose {
            summary
                .unchanged()
                .map(|r| JsonUnchanged {
                    variable: r.variable_name().to_string(),
                    value: r.resolved_value.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let output = JsonUpdateOutput {
            manifest: summary.manifest.display().to_string(),
            dry_run: summary.dry_run,
            file_modified: result.write_result.file_modified,
            summary: JsonSummary {
                changed: summary.change_count(),
                unchanged: summary.unchanged_count(),
            },
            changes,
            unchanged,
            errors: result
                .write_result
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect(),
        };

        write_json(&output, writer)
    }

    fn format_report(&self, report: &TestReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonReportOutput {
            passed: report.passed(),
            summary: JsonReportSummary {
                passed: report.passed_count(),
                failed: report.failed_count(),
            },
            report,
        };
        write_json(&output, writer)
    }
}
