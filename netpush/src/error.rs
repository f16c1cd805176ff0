//! Error types for netpush.
//!
//! These are API-level errors returned from fallible calls. Failures that
//! happen *inside* a device session are not surfaced through this type; they
//! are classified into [`ErrorKind`](crate::session::ErrorKind) and recorded in
//! the task payload instead.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netpush operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Dialect lookup errors
    #[error("Dialect error: {0}")]
    Dialect(#[from] DialectError),

    /// Task tracking errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Rejected task requests
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict verification)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command execution, mode tracking).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Prompt did not match any mode of the dialect
    #[error("Unknown mode from prompt: '{prompt}'")]
    UnknownMode { prompt: String },
}

/// Dialect registry errors.
#[derive(Error, Debug)]
pub enum DialectError {
    /// The device kind is not one of the supported dialects
    #[error("Unknown dialect '{tag}'")]
    UnknownDialect { tag: String },
}

/// Task tracker errors.
#[derive(Error, Debug)]
pub enum TaskError {
    /// No task with this id
    #[error("Task {id} not found")]
    NotFound { id: uuid::Uuid },

    /// A terminal status was already recorded for this task
    #[error("Task {id} is already terminal ({status})")]
    AlreadyTerminal { id: uuid::Uuid, status: String },

    /// Transition not allowed from the current status
    #[error("Task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: uuid::Uuid,
        from: String,
        to: String,
    },
}

/// Task request validation errors, raised before any device contact.
#[derive(Error, Debug)]
pub enum RequestError {
    /// VLAN id outside 1..=4094
    #[error("VLAN ID must be between 1 and 4094, got {0}")]
    VlanOutOfRange(u16),

    /// Dotted-quad mask is malformed or non-contiguous
    #[error("Invalid subnet mask '{0}'")]
    InvalidMask(String),

    /// IPv4 address does not parse
    #[error("Invalid IPv4 address '{0}'")]
    InvalidAddress(String),

    /// A required text field is empty
    #[error("Missing value for '{0}'")]
    MissingField(&'static str),

    /// Numeric field outside its valid range
    #[error("Value {value} out of range for '{field}'")]
    OutOfRange { field: &'static str, value: u32 },
}

/// Result type alias using netpush's Error.
pub type Result<T> = std::result::Result<T, Error>;
