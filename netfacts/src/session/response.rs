//! Response type for command execution results.

use std::time::Duration;

use super::RawCommandResult;
use crate::platform::Verdict;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Classification of the output.
    pub verdict: Verdict,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        verdict: Verdict,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            verdict,
        }
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.verdict == Verdict::Ok
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }

    /// Convert into the result handed to the fact engine.
    pub fn into_raw(self) -> RawCommandResult {
        match &self.verdict {
            Verdict::Ok => RawCommandResult::Text(self.result),
            Verdict::Unsupported(_) => RawCommandResult::Unsupported,
            Verdict::Failed(marker) => RawCommandResult::Failed(self.result_line(marker)),
        }
    }

    /// The output line carrying `marker`, or the marker itself.
    fn result_line(&self, marker: &str) -> String {
        self.lines()
            .find(|line| line.contains(marker))
            .map(|line| line.trim().to_string())
            .unwrap_or_else(|| marker.to_string())
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
