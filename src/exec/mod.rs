//! External process execution
//!
//! This module provides:
//! - Invocation: a program plus arguments, with secret masking for display
//! - OutputObserver: receives stdout/stderr lines as they are produced
//! - CommandRunner: the seam that actually spawns processes
//! - ProcessExecutor: strict/lenient error policy and bounded retry with
//!   exponential backoff

mod executor;
mod invocation;
mod observer;
mod runner;

pub use executor::{ExecOptions, ProcessExecutor, RetryPolicy};
pub use invocation::Invocation;
pub use observer::{NullObserver, OutputObserver, TracingObserver};
pub use runner::{CommandRunner, SystemRunner};
