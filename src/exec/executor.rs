//! Process execution policy
//!
//! Wraps a `CommandRunner` with:
//! - Strict or lenient handling of non-zero exit codes
//! - Bounded retry with exponential backoff (5 attempts, 1s/5s/25s/125s)
//!
//! Backoff sleeps use the tokio timer, so dropping the returned future (for
//! example from an outer `tokio::time::timeout`) cancels a retry sequence.

use super::{CommandRunner, Invocation, NullObserver, OutputObserver, SystemRunner, TracingObserver};
use crate::domain::ExecutionResult;
use crate::error::ExecError;
use std::time::Duration;

/// Maximum number of attempts when auto-retry is enabled
const MAX_ATTEMPTS: u32 = 5;

/// Base of the exponential backoff, in seconds
const WAIT_FACTOR: u64 = 5;

/// Per-call error handling options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Return non-zero results instead of failing
    pub ignore_errors: bool,
    /// Retry non-zero results with backoff
    pub auto_retry: bool,
}

impl ExecOptions {
    /// Fail on non-zero exit, no retry
    pub fn strict() -> Self {
        Self::default()
    }

    /// Return non-zero results to the caller
    pub fn with_ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Retry non-zero results with backoff
    pub fn with_auto_retry(mut self) -> Self {
        self.auto_retry = true;
        self
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `wait_factor^(n - 1)` seconds
    pub wait_factor: u64,
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_attempts: u32, wait_factor: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait_factor,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        Duration::from_secs(self.wait_factor.saturating_pow(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, WAIT_FACTOR)
    }
}

/// Runs processes with the caller's error and retry policy
#[derive(Debug, Clone)]
pub struct ProcessExecutor<R = SystemRunner> {
    runner: R,
    retry: RetryPolicy,
}

impl ProcessExecutor<SystemRunner> {
    /// Create an executor that spawns real processes
    pub fn new() -> Self {
        Self::with_runner(SystemRunner::new())
    }
}

impl Default for ProcessExecutor<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> ProcessExecutor<R> {
    /// Create an executor over a custom runner
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the underlying runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a command, discarding live output
    pub async fn execute(
        &self,
        invocation: &Invocation,
        options: ExecOptions,
    ) -> Result<ExecutionResult, ExecError> {
        self.execute_with_observer(invocation, options, &NullObserver)
            .await
    }

    /// Run a command, logging each output line as it arrives
    pub async fn execute_with_logging(
        &self,
        invocation: &Invocation,
        options: ExecOptions,
    ) -> Result<ExecutionResult, ExecError> {
        let observer = TracingObserver::new(invocation.program());
        self.execute_with_observer(invocation, options, &observer)
            .await
    }

    /// Run a command, streaming output lines to `observer`
    pub async fn execute_with_observer(
        &self,
        invocation: &Invocation,
        options: ExecOptions,
        observer: &dyn OutputObserver,
    ) -> Result<ExecutionResult, ExecError> {
        let max_attempts = if options.auto_retry {
            self.retry.max_attempts
        } else {
            1
        };

        let mut attempt = 1;
        let result = loop {
            let result = self.runner.run(invocation, observer).await?;
            if result.success() || attempt >= max_attempts {
                break result;
            }

            let delay = self.retry.delay_after(attempt);
            tracing::warn!(
                command = %invocation,
                exit_code = result.exit_code,
                attempt,
                max_attempts,
                "command failed, retrying in {}s",
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        };

        if !result.success() && !options.ignore_errors {
            return Err(ExecError::process_failed(
                invocation.to_string(),
                result.exit_code,
                invocation.redact(result.stderr.trim()),
            ));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Runner that replays scripted exit codes and records call times
    struct ScriptedRunner {
        exit_codes: Mutex<VecDeque<i32>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedRunner {
        fn new(exit_codes: &[i32]) -> Self {
            Self {
                exit_codes: Mutex::new(exit_codes.iter().copied().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            _invocation: &Invocation,
            observer: &dyn OutputObserver,
        ) -> Result<ExecutionResult, ExecError> {
            self.calls.lock().unwrap().push(Instant::now());
            let code = self.exit_codes.lock().unwrap().pop_front().unwrap_or(0);
            observer.on_stdout("attempt");
            let stderr = if code == 0 { "" } else { "registry unavailable\n" };
            Ok(ExecutionResult::new(code, "out\n", stderr))
        }
    }

    fn pull() -> Invocation {
        Invocation::new("docker").args(["pull", "example/image:tag"])
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        let delays: Vec<u64> = (1..5).map(|i| policy.delay_after(i).as_secs()).collect();
        assert_eq!(delays, vec![1, 5, 25, 125]);
    }

    #[test]
    fn test_retry_policy_requires_one_attempt() {
        assert_eq!(RetryPolicy::new(0, 2).max_attempts, 1);
    }

    #[test]
    fn test_exec_options_builders() {
        let options = ExecOptions::strict();
        assert!(!options.ignore_errors && !options.auto_retry);
        let options = ExecOptions::strict().with_ignore_errors().with_auto_retry();
        assert!(options.ignore_errors && options.auto_retry);
    }

    #[tokio::test]
    async fn test_success_returns_result() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[0]));
        let result = executor.execute(&pull(), ExecOptions::strict()).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "out\n");
        assert_eq!(executor.runner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_strict_failure_is_error() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[1]));
        let err = executor
            .execute(&pull(), ExecOptions::strict())
            .await
            .unwrap_err();

        match err {
            ExecError::ProcessFailed {
                command,
                exit_code,
                stderr,
            } => {
                assert_eq!(command, "docker pull example/image:tag");
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "registry unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(executor.runner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_ignore_errors_returns_failure() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[2]));
        let result = executor
            .execute(&pull(), ExecOptions::strict().with_ignore_errors())
            .await
            .unwrap();
        assert_eq!(result.exit_code, 2);
        assert_eq!(executor.runner().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_retry_exhausts_with_backoff() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[1, 1, 1, 1, 1, 0]));
        let result = executor
            .execute(
                &pull(),
                ExecOptions::strict().with_auto_retry().with_ignore_errors(),
            )
            .await
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert_eq!(executor.runner().call_count(), 5);
        assert_eq!(
            executor.runner().gaps(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(5),
                Duration::from_secs(25),
                Duration::from_secs(125),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_retry_exhausted_strict_is_error() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[1, 1, 1, 1, 1]));
        let err = executor
            .execute(&pull(), ExecOptions::strict().with_auto_retry())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(executor.runner().call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_retry_stops_on_success() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[1, 1, 0]));
        let result = executor
            .execute(&pull(), ExecOptions::strict().with_auto_retry())
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(executor.runner().call_count(), 3);
        assert_eq!(
            executor.runner().gaps(),
            vec![Duration::from_secs(1), Duration::from_secs(5)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sequence_can_be_cancelled() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[1, 1, 1, 1, 1]));
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            executor.execute(&pull(), ExecOptions::strict().with_auto_retry()),
        )
        .await;

        assert!(outcome.is_err());
        // Attempts at t=0, t=1s and t=6s; the 25s backoff is interrupted
        assert_eq!(executor.runner().call_count(), 3);
    }

    #[tokio::test]
    async fn test_secret_is_masked_in_failure() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[1]));
        let invocation = Invocation::new("docker")
            .args(["build", "--build-arg", "ACCESSTOKEN=s3cret", "."])
            .secret("s3cret");
        let err = executor
            .execute(&invocation, ExecOptions::strict())
            .await
            .unwrap_err();
        assert!(!format!("{}", err).contains("s3cret"));
    }

    #[tokio::test]
    async fn test_execute_with_logging() {
        let executor = ProcessExecutor::with_runner(ScriptedRunner::new(&[0]));
        let result = executor
            .execute_with_logging(&pull(), ExecOptions::strict())
            .await
            .unwrap();
        assert!(result.success());
    }
}
