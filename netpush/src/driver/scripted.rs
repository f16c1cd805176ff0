//! In-memory device for session tests.
//!
//! Simulates the prompt and mode behaviour of a dialect: entering and
//! leaving configuration mode, the enable secret prompt, the staged-changes
//! question on exit and the save confirmation. Individual commands can be scripted to fail, hang or leave
//! the mode unchanged. Everything sent is recorded in a shared log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::Driver;
use super::interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
use super::response::Response;
use crate::error::{ChannelError, DriverError, Result, TransportError};
use crate::platform::{Dialect, DialectKind, DialectRegistry, Family, Mode};

/// Scripted reaction to one command.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Succeeds with this output.
    Output(String),
    /// Device prints this error text.
    Reject(String),
    /// No prompt ever comes back.
    Hang,
    /// Succeeds but the mode does not change.
    Ignore,
    /// Drops the connection.
    Disconnect,
    /// Succeeds after this delay.
    Delayed(Duration),
}

/// How `open()` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Connect,
    Timeout,
    AuthFail,
    /// The driver panics.
    Panic,
}

/// Scripted driver.
#[derive(Debug)]
pub struct ScriptedDriver {
    dialect: &'static Dialect,
    start_mode: Mode,
    mode: Option<Mode>,
    open: OpenBehavior,
    replies: HashMap<String, Reply>,
    enable_secret: Option<String>,
    awaiting_secret: bool,
    save_confirms: bool,
    awaiting_confirm: bool,
    staged: bool,
    awaiting_exit: bool,
    timeout: Duration,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl ScriptedDriver {
    pub fn new(kind: DialectKind) -> Self {
        let dialect = DialectRegistry::lookup(kind);
        let start_mode = if dialect.prompt_for(Mode::UserMode).is_some() {
            Mode::UserMode
        } else {
            Mode::PrivilegedMode
        };

        Self {
            dialect,
            start_mode,
            mode: None,
            open: OpenBehavior::Connect,
            replies: HashMap::new(),
            enable_secret: None,
            awaiting_secret: false,
            save_confirms: true,
            awaiting_confirm: false,
            staged: false,
            awaiting_exit: false,
            timeout: Duration::from_millis(200),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn reply(mut self, command: &str, reply: Reply) -> Self {
        self.replies.insert(command.to_string(), reply);
        self
    }

    pub fn start_in(mut self, mode: Mode) -> Self {
        self.start_mode = mode;
        self
    }

    pub fn open_behavior(mut self, open: OpenBehavior) -> Self {
        self.open = open;
        self
    }

    pub fn enable_secret(mut self, secret: &str) -> Self {
        self.enable_secret = Some(secret.to_string());
        self
    }

    pub fn without_save_confirmation(mut self) -> Self {
        self.save_confirms = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record inputs into `log` instead of a private one.
    pub fn sharing_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.sent = log;
        self
    }

    /// Shared log of every input sent.
    pub fn sent(&self) -> Arc<Mutex<Vec<String>>> {
        self.sent.clone()
    }

    /// Shared flag set once `close()` ran.
    pub fn closed(&self) -> Arc<Mutex<bool>> {
        self.closed.clone()
    }

    fn prompt(&self) -> String {
        let mode = self.mode.unwrap_or(self.start_mode);
        match (self.dialect.kind.family(), mode) {
            (Family::Cisco, Mode::UserMode) => "router>".to_string(),
            (Family::Cisco, Mode::ConfigMode) => "router(config)#".to_string(),
            (Family::Cisco, _) => "router#".to_string(),
            (Family::Huawei, Mode::ConfigMode) => "[HUAWEI]".to_string(),
            (Family::Huawei, _) => "<HUAWEI>".to_string(),
        }
    }

    /// Device reaction to `input`: output text, prompt not included.
    fn react(&mut self, input: &str) -> Result<String> {
        self.sent.lock().unwrap().push(input.to_string());

        if self.awaiting_secret {
            self.awaiting_secret = false;
            return Ok(if Some(input) == self.enable_secret.as_deref() {
                self.mode = Some(Mode::PrivilegedMode);
                String::new()
            } else {
                "% Access denied".to_string()
            });
        }

        if self.awaiting_confirm {
            self.awaiting_confirm = false;
            return Ok("Info: Save the configuration successfully.".to_string());
        }

        if self.awaiting_exit {
            self.awaiting_exit = false;
            self.staged = false;
            self.mode = Some(self.dialect.exit_lands_in);
            return Ok(String::new());
        }

        match self.replies.get(input).cloned() {
            Some(Reply::Output(text)) => return Ok(text),
            Some(Reply::Reject(text)) => return Ok(text),
            Some(Reply::Hang) => return Err(ChannelError::PatternTimeout(self.timeout).into()),
            Some(Reply::Ignore | Reply::Delayed(_)) => return Ok(String::new()),
            Some(Reply::Disconnect) => {
                self.mode = None;
                return Err(ChannelError::Closed.into());
            }
            None => {}
        }

        let dialect = self.dialect;
        if dialect.privileged.as_ref().is_some_and(|p| p.command == input) {
            if self.enable_secret.is_some() {
                self.awaiting_secret = true;
                return Ok("Password: ".to_string());
            }
            self.mode = Some(Mode::PrivilegedMode);
        } else if input == dialect.config_enter {
            self.mode = Some(Mode::ConfigMode);
        } else if input == dialect.config_exit {
            if dialect.exit_confirm.is_some() && self.staged {
                self.awaiting_exit = true;
                return Ok("Warning: Uncommitted configurations found. Are you sure to commit them before exiting? [Y(yes)/N(no)/C(cancel)]:".to_string());
            }
            self.mode = Some(dialect.exit_lands_in);
        } else if dialect.save.as_ref().is_some_and(|s| s.command == input) {
            if self.save_confirms {
                self.awaiting_confirm = true;
                return Ok("Are you sure to continue? [Y/N]:".to_string());
            }
            return Ok("Warning: save skipped.".to_string());
        } else if self.mode == Some(Mode::ConfigMode) {
            self.staged = true;
        }
        Ok(String::new())
    }

    /// Full terminal text for `input`: echo, output and prompt unless the
    /// device is waiting for an answer.
    fn transcript(&self, input: &str, output: &str) -> String {
        let waiting = self.awaiting_secret || self.awaiting_confirm || self.awaiting_exit;
        let mut text = format!("{}\r\n", input);
        if !output.is_empty() {
            text.push_str(output);
            if !waiting {
                text.push_str("\r\n");
            }
        }
        if !waiting {
            text.push_str(&self.prompt());
        }
        text
    }

    fn ensure_open(&self) -> Result<()> {
        if self.mode.is_none() {
            return Err(DriverError::NotConnected.into());
        }
        Ok(())
    }
}

impl Driver for ScriptedDriver {
    async fn open(&mut self) -> Result<()> {
        match self.open {
            OpenBehavior::Connect => {
                self.mode = Some(self.start_mode);
                Ok(())
            }
            OpenBehavior::Timeout => Err(TransportError::Timeout(self.timeout).into()),
            OpenBehavior::AuthFail => Err(TransportError::AuthenticationFailed {
                user: "admin".to_string(),
            }
            .into()),
            OpenBehavior::Panic => panic!("scripted driver crashed while opening"),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.mode = None;
        *self.closed.lock().unwrap() = true;
        Ok(())
    }

    async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        self.ensure_open()?;
        if let Some(Reply::Delayed(delay)) = self.replies.get(command) {
            tokio::time::sleep(*delay).await;
        }
        let output = match self.react(command) {
            Err(crate::Error::Channel(ChannelError::PatternTimeout(_))) => {
                tokio::time::sleep(timeout).await;
                return Err(ChannelError::PatternTimeout(timeout).into());
            }
            other => other?,
        };

        let raw = self.transcript(command, &output);
        if !self.dialect.prompt_pattern.is_match(raw.as_bytes()) {
            return Err(ChannelError::PatternTimeout(timeout).into());
        }

        let prompt = self.prompt();
        let failure = self.dialect.detect_failure(&output);
        Ok(Response::new(command, output, raw, prompt, Duration::from_millis(1))
            .with_mode(self.mode)
            .with_failure(failure))
    }

    async fn send_interactive(&mut self, events: &[InteractiveEvent]) -> Result<InteractiveResult> {
        self.ensure_open()?;
        let mut steps = Vec::with_capacity(events.len());

        for event in events {
            let output = self.react(&event.input)?;
            let echo = if event.hidden { "" } else { event.input.as_str() };
            let raw = self.transcript(echo, &output);
            if !event.pattern.is_match(raw.as_bytes()) {
                return Err(ChannelError::PatternTimeout(event.timeout.unwrap_or(self.timeout)).into());
            }

            let step = match self.dialect.detect_failure(&output) {
                Some(marker) => {
                    InteractiveStep::failed(event.display_input(), output, raw, Duration::ZERO, marker)
                }
                None => InteractiveStep::success(event.display_input(), output, raw, Duration::ZERO),
            };
            steps.push(step);
        }

        Ok(InteractiveResult::new(steps, Duration::ZERO))
    }

    fn is_open(&self) -> bool {
        self.mode.is_some()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cisco_transitions() {
        let mut driver = ScriptedDriver::new(DialectKind::CiscoIos);
        driver.open().await.unwrap();
        assert_eq!(driver.current_mode(), Some(Mode::UserMode));

        driver.send_command("enable").await.unwrap();
        assert_eq!(driver.current_mode(), Some(Mode::PrivilegedMode));

        let response = driver.send_command("configure terminal").await.unwrap();
        assert_eq!(response.mode, Some(Mode::ConfigMode));
        assert_eq!(response.prompt, "router(config)#");
    }

    #[tokio::test]
    async fn test_rejected_command() {
        let mut driver = ScriptedDriver::new(DialectKind::Huawei)
            .reply("interface bogus0", Reply::Reject("Error: Wrong parameter found at '^' position.".into()));
        driver.open().await.unwrap();

        let response = driver.send_command("interface bogus0").await.unwrap();
        assert_eq!(response.failure_message.as_deref(), Some("Error:"));
    }

    #[tokio::test]
    async fn test_save_confirmation() {
        let mut driver = ScriptedDriver::new(DialectKind::Huawei);
        driver.open().await.unwrap();
        let save = driver.dialect().save.clone().unwrap();

        let events = [InteractiveEvent::with_pattern("save", save.response_pattern.clone())];
        let result = driver.send_interactive(&events).await.unwrap();
        assert!(save.confirm_prompt.is_match(result.steps[0].raw_output.as_bytes()));
    }

    #[tokio::test]
    async fn test_not_connected() {
        let mut driver = ScriptedDriver::new(DialectKind::CiscoIos);
        assert!(driver.send_command("show version").await.is_err());
    }
}
