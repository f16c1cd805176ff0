//! Device drivers.
//!
//! A driver owns one interactive shell on one device: it sends a line, reads
//! until a prompt of the device's dialect shows up, and tracks which mode
//! that prompt belongs to. The configuration session drives the protocol on
//! top of this contract.

mod builder;
mod generic;
mod interactive;
mod response;

#[cfg(test)]
pub(crate) mod scripted;

pub use builder::{DriverBuilder, SessionConfig};
pub use generic::GenericDriver;
pub use interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
pub use response::Response;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::platform::{Dialect, Mode};

/// Trait for device drivers.
pub trait Driver: Send {
    /// Open the connection and wait for the first prompt.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt, bounded by `timeout`.
    fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send {
        let timeout = self.timeout();
        self.send_command_with_timeout(command, timeout)
    }

    /// Send an interactive command sequence.
    ///
    /// Each event sends its input and waits for its own pattern, which lets
    /// the caller answer secret prompts and confirmations.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use netpush::driver::{Driver, InteractiveEvent};
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), netpush::Error> {
    /// let events = vec![
    ///     InteractiveEvent::new("save", r"(?i)\[y/n\]:?\s*$")?,
    ///     InteractiveEvent::new("y", r"(?m)^<[\w.\-]+>\s?$")?,
    /// ];
    /// let result = driver.send_interactive(&events).await?;
    /// # Ok(())
    /// # }
    /// ```
    fn send_interactive(
        &mut self,
        events: &[InteractiveEvent],
    ) -> impl Future<Output = Result<InteractiveResult>> + Send;

    /// Check if the driver is connected.
    fn is_open(&self) -> bool;

    /// Mode of the last prompt seen, `None` while disconnected.
    fn current_mode(&self) -> Option<Mode>;

    /// Default per-read timeout.
    fn timeout(&self) -> Duration;

    /// Dialect this driver speaks.
    fn dialect(&self) -> &'static Dialect;
}
