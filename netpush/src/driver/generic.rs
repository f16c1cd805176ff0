//! Generic driver that works with any dialect.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use regex::bytes::Regex;

use super::Driver;
use super::interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
use super::response::Response;
use crate::channel::PtyChannel;
use crate::error::{DriverError, Result};
use crate::platform::{Dialect, Mode};
use crate::transport::SshTransport;
use crate::transport::config::SshConfig;

/// Driver over an SSH PTY shell.
///
/// This is the production driver. It handles:
/// - SSH transport and shell channel lifecycle
/// - Command execution with prompt detection
/// - Mode tracking from the trailing prompt
/// - Output normalization and failure detection from the dialect
pub struct GenericDriver {
    /// SSH configuration.
    ssh_config: SshConfig,

    /// Dialect rules.
    dialect: &'static Dialect,

    /// SSH transport (None when disconnected).
    transport: Option<SshTransport>,

    /// Shell channel (None when disconnected).
    channel: Option<PtyChannel>,

    /// Default timeout for reads.
    timeout: Duration,

    /// Prompt search window.
    search_depth: usize,

    /// Mode of the last prompt seen.
    mode: Option<Mode>,
}

impl GenericDriver {
    /// Create a new driver. Does not connect.
    pub fn new(
        ssh_config: SshConfig,
        dialect: &'static Dialect,
        timeout: Duration,
        search_depth: usize,
    ) -> Self {
        Self {
            ssh_config,
            dialect,
            transport: None,
            channel: None,
            timeout,
            search_depth,
            mode: None,
        }
    }

    /// Get the SSH configuration.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    /// Set the default timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn channel(&mut self) -> Result<&mut PtyChannel> {
        Ok(self.channel.as_mut().ok_or(DriverError::NotConnected)?)
    }

    /// Last prompt-looking line of `output`, trimmed.
    fn extract_prompt(&self, output: &str) -> String {
        let prompt = self
            .dialect
            .prompt_pattern
            .find_iter(output.as_bytes())
            .last()
            .map(|m| &output[m.start()..m.end()])
            .unwrap_or_else(|| output.lines().last().unwrap_or_default());
        prompt.trim().to_string()
    }

    /// Record the mode of `prompt`, if it is a mode prompt.
    fn track_mode(&mut self, prompt: &str) -> Option<Mode> {
        let mode = self.dialect.mode_of(prompt);
        if mode.is_some() && mode != self.mode {
            debug!("{}: mode {:?} -> {:?}", self.ssh_config.host, self.mode, mode);
            self.mode = mode;
        }
        mode
    }

    /// Read until `pattern`, returning the output as text.
    async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        let data = self.channel()?.read_until(pattern, timeout).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Run the dialect's session-setup commands.
    ///
    /// A rejected setup command is logged and skipped; some platforms do not
    /// know every paging or width command.
    async fn execute_on_open_commands(&mut self) -> Result<()> {
        let dialect = self.dialect;
        for cmd in &dialect.on_open_commands {
            let response = self.send_command(cmd).await?;
            if let Some(marker) = response.failure_message {
                warn!("{}: setup command '{}' rejected ({})", self.ssh_config.host, cmd, marker);
            }
        }
        Ok(())
    }

    async fn connect(&mut self) -> Result<()> {
        let transport = SshTransport::connect(self.ssh_config.clone()).await?;
        let channel = transport.open_channel().await?;
        self.transport = Some(transport);
        self.channel = Some(PtyChannel::new(channel, self.search_depth));

        // Banner and MOTD end at the first prompt
        let dialect = self.dialect;
        let initial = self
            .read_until(&dialect.prompt_pattern, self.ssh_config.timeout)
            .await?;
        let prompt = self.extract_prompt(&initial);
        if self.track_mode(&prompt).is_none() {
            return Err(DriverError::UnknownMode { prompt }.into());
        }

        self.execute_on_open_commands().await
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.mode = None;
        let channel = self.channel.take();
        let transport = self.transport.take();

        if let Some(channel) = channel {
            if let Err(e) = channel.close().await {
                trace!("channel close: {}", e);
            }
        }
        if let Some(transport) = transport {
            transport.close().await?;
        }
        Ok(())
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let result = self.connect().await;
        if result.is_err() {
            // Half-open sessions are not reusable
            let _ = self.disconnect().await;
        }
        result
    }

    async fn close(&mut self) -> Result<()> {
        self.disconnect().await
    }

    async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let start = Instant::now();
        debug!("{}: sending '{}'", self.ssh_config.host, command);

        let dialect = self.dialect;
        let channel = self.channel()?;
        // Unsolicited output (log messages) must not end up in this response
        channel.clear_buffer();
        channel.send(command).await?;
        let raw_result = self.read_until(&dialect.prompt_pattern, timeout).await?;
        let elapsed = start.elapsed();

        let prompt = self.extract_prompt(&raw_result);
        let mode = self.track_mode(&prompt);
        let result = dialect.normalize_output(&raw_result, command);
        let failure = dialect.detect_failure(&result);

        Ok(Response::new(command, result, raw_result, prompt, elapsed)
            .with_mode(mode)
            .with_failure(failure))
    }

    async fn send_interactive(&mut self, events: &[InteractiveEvent]) -> Result<InteractiveResult> {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(events.len());

        for event in events {
            let step_start = Instant::now();
            debug!("{}: sending '{}'", self.ssh_config.host, event.display_input());

            self.channel()?.send(&event.input).await?;
            let raw = self
                .read_until(&event.pattern, event.timeout.unwrap_or(self.timeout))
                .await?;

            let prompt = self.extract_prompt(&raw);
            self.track_mode(&prompt);

            let output = self.dialect.normalize_output(&raw, &event.input);
            let step = match self.dialect.detect_failure(&output) {
                Some(marker) => InteractiveStep::failed(
                    event.display_input(),
                    output,
                    raw,
                    step_start.elapsed(),
                    marker,
                ),
                None => InteractiveStep::success(event.display_input(), output, raw, step_start.elapsed()),
            };
            steps.push(step);
        }

        Ok(InteractiveResult::new(steps, start.elapsed()))
    }

    fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn current_mode(&self) -> Option<Mode> {
        self.mode
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn dialect(&self) -> &'static Dialect {
        self.dialect
    }
}
