//! Interactive command support for prompts that require an answer.
//!
//! Some steps of a device session do not end at a mode prompt:
//! - Cisco `enable` may ask for the enable secret
//! - Huawei `save` asks "Are you sure to continue? [Y/N]:"
//!
//! [`Driver::send_interactive`](super::Driver::send_interactive) handles
//! these by sending a sequence of inputs, each waiting for its own pattern
//! before proceeding.

use std::time::Duration;

use regex::bytes::Regex;

use crate::error::{ChannelError, Result};

/// An event in an interactive command sequence.
///
/// Each event consists of:
/// - `input`: the text to send (command or answer like "y")
/// - `pattern`: the pattern to wait for after sending the input
/// - `hidden`: whether the input must be masked in logs and results
///
/// # Example
///
/// ```rust
/// use netpush::driver::InteractiveEvent;
///
/// let events = vec![
///     InteractiveEvent::new("save", r"(?i)\[y/n\]:?\s*$").unwrap(),
///     InteractiveEvent::new("y", r"(?m)^<[\w.\-]+>\s?$").unwrap(),
/// ];
/// assert_eq!(events.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct InteractiveEvent {
    /// The input to send (command or response).
    pub input: String,

    /// Pattern to wait for after sending input.
    pub pattern: Regex,

    /// Whether this input should be hidden in logs (e.g., secrets).
    pub hidden: bool,

    /// Optional timeout override for this specific event.
    pub timeout: Option<Duration>,
}

impl InteractiveEvent {
    /// Create a new interactive event, failing if the pattern is invalid.
    pub fn new(input: impl Into<String>, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(ChannelError::InvalidPattern)?;
        Ok(Self::with_pattern(input, pattern))
    }

    /// Create an event from an already compiled pattern.
    pub fn with_pattern(input: impl Into<String>, pattern: Regex) -> Self {
        Self {
            input: input.into(),
            pattern,
            hidden: false,
            timeout: None,
        }
    }

    /// Create an event for hidden input (like an enable secret).
    pub fn hidden(input: impl Into<String>, pattern: Regex) -> Self {
        Self::with_pattern(input, pattern).with_hidden(true)
    }

    /// Set a custom timeout for this event.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mark this event's input as hidden.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Input as it may appear in logs.
    pub fn display_input(&self) -> &str {
        if self.hidden { "********" } else { &self.input }
    }
}

/// Result of an interactive command sequence.
#[derive(Debug, Clone)]
pub struct InteractiveResult {
    /// Results from each step in the sequence.
    pub steps: Vec<InteractiveStep>,

    /// Total time for the entire sequence.
    pub elapsed: Duration,

    /// Whether any step failed.
    pub failed: bool,
}

impl InteractiveResult {
    /// Create a new interactive result.
    pub fn new(steps: Vec<InteractiveStep>, elapsed: Duration) -> Self {
        let failed = steps.iter().any(|s| s.failed);
        Self {
            steps,
            elapsed,
            failed,
        }
    }

    /// Get the final output (from the last step).
    pub fn final_output(&self) -> Option<&str> {
        self.steps.last().map(|s| s.output.as_str())
    }

    /// Raw output of every step, concatenated.
    pub fn full_raw_output(&self) -> String {
        self.steps.iter().map(|s| s.raw_output.as_str()).collect()
    }

    /// First failure message, if any step failed.
    pub fn failure_message(&self) -> Option<&str> {
        self.steps
            .iter()
            .find_map(|s| s.failure_message.as_deref())
    }
}

/// Result of a single step in an interactive sequence.
#[derive(Debug, Clone)]
pub struct InteractiveStep {
    /// The input that was sent (masked if hidden).
    pub input: String,

    /// The output received after sending input, echo removed.
    pub output: String,

    /// The raw output before normalization.
    pub raw_output: String,

    /// Time taken for this step.
    pub elapsed: Duration,

    /// Whether this step failed.
    pub failed: bool,

    /// Failure message if failed.
    pub failure_message: Option<String>,
}

impl InteractiveStep {
    /// Create a successful step.
    pub fn success(
        input: impl Into<String>,
        output: impl Into<String>,
        raw_output: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            raw_output: raw_output.into(),
            elapsed,
            failed: false,
            failure_message: None,
        }
    }

    /// Create a failed step.
    pub fn failed(
        input: impl Into<String>,
        output: impl Into<String>,
        raw_output: impl Into<String>,
        elapsed: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            raw_output: raw_output.into(),
            elapsed,
            failed: true,
            failure_message: Some(message.into()),
        }
    }
}
