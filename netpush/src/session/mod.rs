//! Configuration sessions.
//!
//! A [`ConfigurationSession`] drives one device through the mode-transition,
//! command-batch and persistence protocol of its dialect and records every
//! step as a [`CommandResult`]. Failures inside a session never surface as
//! [`crate::Error`]; they are classified by [`ErrorKind`] and end up in the
//! [`TaskPayload`] produced by [`aggregate`].
//!
//! ```text
//! Disconnected -> Connected(user) -> [privileged] -> configuration
//!     -> exiting-configuration -> [committing -> saving] -> Completed
//!                       (any non-terminal state) -> Failed
//! ```

mod protocol;
mod result;

pub use protocol::{ConfigurationSession, SessionObserver};
pub use result::{Outcome, ResultLog, TaskPayload, aggregate};

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, DriverError, Error};

/// Lifecycle status shared by sessions and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Status {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Completed => "completed",
            Status::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Which protocol step produced a [`CommandResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Privileged,
    EnterConfig,
    Command,
    ExitConfig,
    Commit,
    Save,
    Inspect,
}

/// Classification of a session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unreachable host, rejected authentication, transport timeout or a
    /// dropped connection.
    Connection,
    /// A mode-entry or mode-exit command did not reach the expected prompt.
    ModeTransition,
    /// A command was rejected by the device.
    Command,
    /// The commit step failed; staged changes may remain.
    CommitFailed,
    /// Changes are active but were not persisted.
    UnsavedConfig,
    /// The device kind is not supported.
    UnknownDialect,
    /// The overall session deadline expired.
    SessionTimeout,
    /// The request was rejected before any device contact.
    InvalidRequest,
}

impl ErrorKind {
    /// Classify an API error raised during a step.
    ///
    /// Lost connections are always `Connection`; anything else takes the
    /// kind of the step that was running.
    pub fn classify(err: &Error, step: ErrorKind) -> ErrorKind {
        match err {
            Error::Transport(_) => ErrorKind::Connection,
            Error::Channel(ChannelError::Closed | ChannelError::Ssh(_)) => ErrorKind::Connection,
            Error::Driver(DriverError::NotConnected) => ErrorKind::Connection,
            Error::Dialect(_) => ErrorKind::UnknownDialect,
            Error::Request(_) => ErrorKind::InvalidRequest,
            _ => step,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Connection => "connection error",
            ErrorKind::ModeTransition => "mode transition error",
            ErrorKind::Command => "command error",
            ErrorKind::CommitFailed => "commit failed",
            ErrorKind::UnsavedConfig => "configuration not saved",
            ErrorKind::UnknownDialect => "unknown dialect",
            ErrorKind::SessionTimeout => "session deadline expired",
            ErrorKind::InvalidRequest => "invalid request",
        };
        f.write_str(name)
    }
}

/// The single authoritative error of a failed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Command being executed when the session failed.
    pub command: Option<String>,
}

impl SessionFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>, command: Option<&str>) -> Self {
        Self {
            kind,
            message: message.into(),
            command: command.map(str::to_string),
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command {
            Some(command) => write!(f, "{} on '{}': {}", self.kind, command, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Outcome of one step sent to the device.
///
/// Recorded once, in execution order, and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub step: StepKind,
    /// Literal command text sent.
    pub command: String,
    /// Everything read back, echo and prompt included.
    pub raw_output: String,
    /// Output with echo and trailing prompt removed.
    pub output: String,
    pub success: bool,
    pub error: Option<ErrorKind>,
    /// Failure detail (device marker or transport error).
    pub message: Option<String>,
    pub elapsed: Duration,
}

impl CommandResult {
    /// A step the device accepted.
    pub fn succeeded(
        step: StepKind,
        command: impl Into<String>,
        raw_output: impl Into<String>,
        output: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            step,
            command: command.into(),
            raw_output: raw_output.into(),
            output: output.into(),
            success: true,
            error: None,
            message: None,
            elapsed,
        }
    }

    /// A step that failed with `kind`.
    pub fn failed(
        step: StepKind,
        command: impl Into<String>,
        raw_output: impl Into<String>,
        output: impl Into<String>,
        elapsed: Duration,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step,
            command: command.into(),
            raw_output: raw_output.into(),
            output: output.into(),
            success: false,
            error: Some(kind),
            message: Some(message.into()),
            elapsed,
        }
    }

    /// The failure this result stands for, if it failed.
    pub fn failure(&self) -> Option<SessionFailure> {
        let kind = self.error?;
        Some(SessionFailure::new(
            kind,
            self.message.clone().unwrap_or_else(|| kind.to_string()),
            Some(&self.command),
        ))
    }
}

/// Commands to run in one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "commands", rename_all = "snake_case")]
pub enum Batch {
    /// Configuration commands: fail-fast, then commit and save if the
    /// dialect needs it.
    Configure(Vec<String>),
    /// Read-only commands: each runs regardless of the others.
    Inspect(Vec<String>),
}

impl Batch {
    pub fn commands(&self) -> &[String] {
        match self {
            Batch::Configure(commands) | Batch::Inspect(commands) => commands,
        }
    }

    pub fn is_inspection(&self) -> bool {
        matches!(self, Batch::Inspect(_))
    }
}
