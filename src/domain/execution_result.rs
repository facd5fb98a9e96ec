//! Result of a single subprocess invocation

use serde::{Deserialize, Serialize};

/// Exit code and captured output of one process run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Process exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ExecutionResult {
    /// Creates a new execution result
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns stdout with surrounding whitespace removed
    pub fn trimmed_stdout(&self) -> &str {
        self.stdout.trim()
    }
}
