//! Resource existence probing

use super::{EngineCommand, ResourceKind};
use crate::error::ExecError;
use crate::exec::{CommandRunner, ExecOptions, Invocation, ProcessExecutor};

/// Returns true if the engine lists a resource of `kind` matching `filter`
///
/// The list command runs leniently: a failing engine reports "absent"
/// rather than an error. Only a spawn failure is propagated.
pub async fn resource_exists<R: CommandRunner>(
    executor: &ProcessExecutor<R>,
    program: &str,
    kind: ResourceKind,
    filter: &str,
) -> Result<bool, ExecError> {
    let command = EngineCommand::List {
        kind,
        filter: filter.to_string(),
    };
    let invocation = Invocation::new(program).args(command.to_args());
    let result = executor
        .execute(&invocation, ExecOptions::strict().with_ignore_errors())
        .await?;

    let exists = !result.trimmed_stdout().is_empty();
    tracing::debug!(%kind, filter, exists, "probed resource");
    Ok(exists)
}
