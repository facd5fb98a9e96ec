//! Process spawning
//!
//! `CommandRunner` is the seam between execution policy and the operating
//! system; tests substitute scripted runners.

use super::{Invocation, OutputObserver};
use crate::domain::ExecutionResult;
use crate::error::ExecError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Trait for running a single process to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation once, forwarding output lines to `observer`
    ///
    /// A non-zero exit is reported through the result, not as an error.
    async fn run(
        &self,
        invocation: &Invocation,
        observer: &dyn OutputObserver,
    ) -> Result<ExecutionResult, ExecError>;
}

/// Runner that spawns real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }
}

/// Read `reader` line by line, forwarding and capturing each line
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD.
async fn pump<R, F>(reader: Option<R>, mut on_line: F) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut captured = String::new();
    let Some(reader) = reader else {
        return Ok(captured);
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        on_line(line);
        captured.push_str(line);
        captured.push('\n');
    }
    Ok(captured)
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        observer: &dyn OutputObserver,
    ) -> Result<ExecutionResult, ExecError> {
        tracing::debug!("running: {}", invocation);

        let mut child = Command::new(invocation.program())
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::try_join!(
            pump(stdout, |line| observer.on_stdout(line)),
            pump(stderr, |line| observer.on_stderr(line)),
            child.wait(),
        )
        .map_err(|source| ExecError::Io {
            command: invocation.to_string(),
            source,
        })?;

        Ok(ExecutionResult::new(
            status.code().unwrap_or(-1),
            stdout,
            stderr,
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingObserver {
        stdout: Mutex<Vec<String>>,
        stderr: Mutex<Vec<String>>,
    }

    impl OutputObserver for CollectingObserver {
        fn on_stdout(&self, line: &str) {
            self.stdout.lock().unwrap().push(line.to_string());
        }

        fn on_stderr(&self, line: &str) {
            self.stderr.lock().unwrap().push(line.to_string());
        }
    }

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let observer = CollectingObserver::default();
        let result = SystemRunner::new()
            .run(&sh("echo one; echo two; echo oops >&2"), &observer)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout, "one\ntwo\n");
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(*observer.stdout.lock().unwrap(), vec!["one", "two"]);
        assert_eq!(*observer.stderr.lock().unwrap(), vec!["oops"]);
    }

    #[tokio::test]
    async fn test_reports_non_zero_exit() {
        let observer = CollectingObserver::default();
        let result = SystemRunner::new()
            .run(&sh("echo failing >&2; exit 3"), &observer)
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr.trim(), "failing");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let observer = CollectingObserver::default();
        let err = SystemRunner::new()
            .run(
                &Invocation::new("image-harness-definitely-not-a-program"),
                &observer,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_output_is_replaced() {
        let observer = CollectingObserver::default();
        let result = SystemRunner::new()
            .run(&sh("printf 'ok\\n\\377\\376 binary\\r\\n'; printf 'tail\\377' >&2"), &observer)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout, "ok\n\u{fffd}\u{fffd} binary\n");
        assert_eq!(result.stderr, "tail\u{fffd}\n");
        assert_eq!(*observer.stdout.lock().unwrap(), vec!["ok", "\u{fffd}\u{fffd} binary"]);
    }
}
