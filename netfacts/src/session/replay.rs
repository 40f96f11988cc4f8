//! Canned command output for tests and offline runs.

use std::sync::Arc;

use indexmap::IndexMap;
use log::trace;

use super::{CommandSource, RawCommandResult};

/// Answers commands from a fixed map. Commands missing from the map are
/// reported as unsupported.
///
/// Clones share the map, so a replay source can be handed to several
/// categories collected at once.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    results: Arc<IndexMap<String, RawCommandResult>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the output text of `command`.
    pub fn with_output(self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.with_result(command, RawCommandResult::Text(output.into()))
    }

    /// Make `command` fail with `reason`.
    pub fn with_failure(self, command: impl Into<String>, reason: impl Into<String>) -> Self {
        self.with_result(command, RawCommandResult::Failed(reason.into()))
    }

    /// Set the result of `command`.
    pub fn with_result(mut self, command: impl Into<String>, result: RawCommandResult) -> Self {
        Arc::make_mut(&mut self.results).insert(command.into(), result);
        self
    }

    /// Number of canned commands.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl CommandSource for ReplaySource {
    async fn fetch(&mut self, commands: &[String]) -> Vec<RawCommandResult> {
        commands
            .iter()
            .map(|command| {
                trace!("replay: {}", command);
                self.results
                    .get(command)
                    .cloned()
                    .unwrap_or(RawCommandResult::Unsupported)
            })
            .collect()
    }
}
