//! SSH transport layer wrapping russh.
//!
//! This module owns the physical connection: TCP connect under a timeout,
//! host key verification, authentication, and PTY shell channel creation.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
