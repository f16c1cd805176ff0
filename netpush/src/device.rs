//! Device descriptors supplied by the inventory layer.

use std::fmt;

use secrecy::SecretString;
use serde::Deserialize;

use crate::platform::DialectKind;

fn default_port() -> u16 {
    22
}

/// Connection details of one device.
///
/// Secrets never appear in `Debug` output and are not serializable.
#[derive(Clone, Deserialize)]
pub struct DeviceDescriptor {
    /// Inventory name, used in task records and logs.
    pub name: String,

    /// Hostname or IP address.
    pub host: String,

    /// SSH port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user.
    pub username: String,

    /// Login password.
    pub password: SecretString,

    /// Enable secret, for dialects with a privileged step.
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Recorded device kind.
    #[serde(alias = "device_type")]
    pub dialect: DialectKind,
}

impl DeviceDescriptor {
    /// Create a descriptor on the default port with no enable secret.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        dialect: DialectKind,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            username: username.into(),
            password: SecretString::from(password.into()),
            secret: None,
            dialect,
        }
    }

    /// Set the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the enable secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// `host:port`, the identity of the physical connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}
