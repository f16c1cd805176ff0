//! # netpush
//!
//! Async configuration sessions for multi-vendor network devices.
//!
//! netpush opens an interactive SSH shell on a switch or router, walks it
//! through the vendor's mode transitions, pushes an ordered batch of
//! commands with fail-fast semantics and, where the vendor stages changes,
//! commits and saves them. Every session runs as a tracked task whose
//! result can be polled.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Cisco IOS, IOS-XE, NX-OS and Huawei VRP/VRPv8 dialects
//! - Efficient pattern buffer matching (tail search)
//! - Per-step results with error classification
//! - Concurrent task tracking, one session per device at a time
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netpush::{DeviceDescriptor, SessionConfig, TaskRequest, TaskRunner};
//! use netpush::platform::DialectKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netpush::Error> {
//!     let runner = TaskRunner::ssh(SessionConfig::default());
//!     let device = DeviceDescriptor::new("core-sw1", "192.168.1.1", "admin", "secret", DialectKind::Huawei);
//!
//!     let task = runner.submit(device, TaskRequest::CreateVlan { vlan: 100, name: Some("users".into()) })?;
//!     let task = runner.wait(task.id).await?;
//!     println!("{}", task.payload_json.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod device;
pub mod driver;
pub mod error;
pub mod platform;
pub mod session;
pub mod task;
pub mod transport;

// Re-export main types for convenience
pub use device::DeviceDescriptor;
pub use driver::{Driver, DriverBuilder, GenericDriver, Response, SessionConfig};
pub use error::{Error, Result};
pub use platform::{Dialect, DialectKind, DialectRegistry, Mode};
pub use session::{Batch, CommandResult, ConfigurationSession, ErrorKind, Status, TaskPayload};
pub use task::{TaskRequest, TaskRunner, TaskStatusView, TaskTracker};
pub use transport::{AuthMethod, SshConfig};
