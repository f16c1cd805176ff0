//! Response type for command execution results.

use std::time::Duration;

use crate::platform::Mode;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Mode the prompt belongs to, if it matched one.
    pub mode: Option<Mode>,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure marker found in the output.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            mode: None,
            elapsed,
            failure_message: None,
        }
    }

    /// Set the mode the trailing prompt belongs to.
    pub fn with_mode(mut self, mode: Option<Mode>) -> Self {
        self.mode = mode;
        self
    }

    /// Mark the response as rejected by the device.
    pub fn with_failure(mut self, message: Option<impl Into<String>>) -> Self {
        self.failure_message = message.map(Into::into);
        self
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
