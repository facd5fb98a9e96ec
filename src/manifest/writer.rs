//! Manifest file writing
//!
//! This module provides:
//! - ManifestWriter for persisting changed variables back to the manifest
//! - Dry-run mode support (no actual file modifications)
//! - Format preservation: only the changed string values are rewritten

use crate::domain::UpdateSummary;
use crate::error::ManifestError;
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Writer for manifest files that applies variable changes
pub struct ManifestWriter {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

/// Result of applying changes to a manifest file
#[derive(Debug)]
pub struct WriteResult {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Number of variables successfully rewritten
    pub updates_applied: usize,
    /// Whether the file was actually modified
    pub file_modified: bool,
    /// Variables that could not be rewritten
    pub errors: Vec<ManifestError>,
}

impl WriteResult {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            updates_applied: 0,
            file_modified: false,
            errors: Vec::new(),
        }
    }

    /// Returns true if any changes were applied
    pub fn has_updates(&self) -> bool {
        self.updates_applied > 0
    }

    /// Returns true if any errors occurred
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl ManifestWriter {
    /// Create a new ManifestWriter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Check if this writer is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply every change in the summary to the manifest file
    pub fn apply(&self, path: &Path, summary: &UpdateSummary) -> Result<WriteResult, ManifestError> {
        let mut result = WriteResult::new(path);
        if !summary.has_changes() {
            return Ok(result);
        }

        let content = fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))?;
        let mut current_content = content;

        for change in summary.changes() {
            match set_variable(&current_content, change.variable_name(), &change.resolved_value) {
                Some(updated) => {
                    current_content = updated;
                    result.updates_applied += 1;
                }
                None => result
                    .errors
                    .push(ManifestError::variable_not_in_file(change.variable_name(), path)),
            }
        }

        if result.updates_applied > 0 && !self.dry_run {
            fs::write(path, &current_content).map_err(|e| ManifestError::write_error(path, e))?;
            result.file_modified = true;
        }

        tracing::debug!(
            path = %path.display(),
            applied = result.updates_applied,
            dry_run = self.dry_run,
            "applied manifest changes"
        );

        Ok(result)
    }
}

static VARIABLES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""variables"\s*:\s*\{"#).unwrap());

/// Byte range of the body of the first `"variables": { ... }` object
fn variables_body(content: &str) -> Option<Range<usize>> {
    let start = VARIABLES_RE.find(content)?.end();
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in content.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Replace the string value of `"name": "..."` inside the `variables` object
///
/// Returns None if the variable is not present there as a string entry.
pub fn set_variable(content: &str, name: &str, new_value: &str) -> Option<String> {
    let body = variables_body(content)?;
    let pattern = format!(r#"("{}"\s*:\s*)"(?:[^"\\]|\\.)*""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;

    let encoded = serde_json::to_string(new_value).ok()?;
    let section = &content[body.clone()];
    let caps = re.captures(section)?;
    let whole = caps.get(0)?;

    let mut result = String::with_capacity(content.len() + encoded.len());
    result.push_str(&content[..body.start + whole.start()]);
    result.push_str(&caps[1]);
    result.push_str(&encoded);
    result.push_str(&content[body.start + whole.end()..]);
    Some(result)
}
