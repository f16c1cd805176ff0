//! Builder for creating device drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use super::generic::GenericDriver;
use crate::device::DeviceDescriptor;
use crate::error::{DriverError, Result};
use crate::platform::{DialectKind, DialectRegistry};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_search_depth() -> usize {
    1000
}

fn default_terminal_width() -> u32 {
    511
}

fn default_terminal_height() -> u32 {
    24
}

/// Session-wide settings shared by every device session.
///
/// Durations deserialize from `{ "secs": .., "nanos": .. }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bound on TCP connect, key exchange and authentication.
    pub connect_timeout: Duration,

    /// Bound on each read-until-prompt.
    pub command_timeout: Duration,

    /// Bytes from the end of the output searched for a prompt.
    pub search_depth: usize,

    /// PTY width.
    pub terminal_width: u32,

    /// PTY height.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// known_hosts file, `None` for the user's default.
    pub known_hosts_path: Option<PathBuf>,

    /// Overall bound on one session, from connect to the last step.
    pub session_deadline: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
            search_depth: default_search_depth(),
            terminal_width: default_terminal_width(),
            terminal_height: default_terminal_height(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            session_deadline: None,
        }
    }
}

impl SessionConfig {
    /// Set the overall session deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.session_deadline = Some(deadline);
        self
    }

    /// Set the per-read command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use netpush::driver::{Driver, DriverBuilder};
/// use netpush::platform::DialectKind;
///
/// # async fn example() -> Result<(), netpush::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .dialect(DialectKind::CiscoIos)
///     .build()?;
/// driver.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    dialect: Option<DialectKind>,
    config: SessionConfig,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            dialect: None,
            config: SessionConfig::default(),
        }
    }

    /// Start from a device descriptor and shared session settings.
    pub fn from_device(device: &DeviceDescriptor, config: &SessionConfig) -> Self {
        Self {
            host: device.host.clone(),
            port: device.port,
            username: Some(device.username.clone()),
            auth: AuthMethod::Password(device.password.clone()),
            dialect: Some(device.dialect),
            config: config.clone(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set the device dialect.
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-read command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set how many trailing bytes are searched for a prompt.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.config.search_depth = depth;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.config.terminal_width = width;
        self.config.terminal_height = height;
        self
    }

    /// Set host key verification.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.config.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.known_hosts_path = Some(path.into());
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Call `open()` on the
    /// returned driver to establish the connection.
    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        let kind = self.dialect.ok_or_else(|| DriverError::InvalidConfig {
            message: "Dialect must be specified".to_string(),
        })?;

        if self.config.search_depth == 0 {
            return Err(DriverError::InvalidConfig {
                message: "Search depth must be positive".to_string(),
            }
            .into());
        }

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.config.connect_timeout,
            terminal_width: self.config.terminal_width,
            terminal_height: self.config.terminal_height,
            host_key_verification: self.config.host_key_verification,
            known_hosts_path: self.config.known_hosts_path,
        };

        Ok(GenericDriver::new(
            ssh_config,
            DialectRegistry::lookup(kind),
            self.config.command_timeout,
            self.config.search_depth,
        ))
    }
}
