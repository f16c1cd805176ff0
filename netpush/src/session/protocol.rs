//! The configuration session protocol.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use super::result::{ResultLog, TaskPayload, aggregate};
use super::{Batch, CommandResult, ErrorKind, SessionFailure, Status, StepKind};
use crate::device::DeviceDescriptor;
use crate::driver::{Driver, InteractiveEvent, InteractiveResult};
use crate::platform::{Dialect, ExitConfirm, Mode};

/// Hook for session lifecycle events.
pub trait SessionObserver: Send + Sync {
    /// The channel is open and the first prompt was recognised.
    fn on_connected(&self) {}
}

impl SessionObserver for () {}

/// One run of the session protocol against one device.
///
/// The session owns its driver for its whole lifetime. Every step it sends
/// is recorded in order; the first failure becomes the session's error and
/// later failures never replace it.
pub struct ConfigurationSession<D: Driver> {
    driver: D,
    dialect: &'static Dialect,
    device: String,
    enable_secret: Option<SecretString>,
    deadline_after: Option<Duration>,
    deadline: Option<Instant>,
    mode: Option<Mode>,
    status: Status,
    log: ResultLog,
    failure: Option<SessionFailure>,
}

impl<D: Driver> ConfigurationSession<D> {
    /// Bind a session to a device and a driver built for it.
    pub fn new(device: &DeviceDescriptor, driver: D) -> Self {
        Self {
            dialect: driver.dialect(),
            driver,
            device: device.name.clone(),
            enable_secret: device.secret.clone(),
            deadline_after: None,
            deadline: None,
            mode: None,
            status: Status::Pending,
            log: ResultLog::new(),
            failure: None,
        }
    }

    /// Bound the whole session, counted from the start of [`run`](Self::run).
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline_after = deadline;
        self
    }

    /// Current protocol mode, `None` while disconnected.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Steps recorded so far.
    pub fn results(&self) -> &[CommandResult] {
        self.log.as_slice()
    }

    /// The driver, e.g. to inspect it after a run.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run `batch` and package the outcome.
    ///
    /// Never fails: every error is classified and carried in the payload.
    /// The channel is closed before returning, whatever happened.
    pub async fn run<O: SessionObserver>(&mut self, batch: &Batch, observer: &O) -> TaskPayload {
        self.deadline = self.deadline_after.map(|after| Instant::now() + after);
        self.status = Status::Running;
        info!(
            "{}: starting {} batch of {} command(s)",
            self.device,
            if batch.is_inspection() { "inspection" } else { "configuration" },
            batch.commands().len()
        );

        if self.connect().await {
            observer.on_connected();
            if self.elevate().await {
                match batch {
                    Batch::Configure(commands) => self.configure(commands).await,
                    Batch::Inspect(commands) => self.inspect(commands).await,
                }
            }
        }
        self.close().await;

        self.status = if self.failure.is_some() {
            Status::Failed
        } else {
            Status::Completed
        };
        match &self.failure {
            Some(failure) => warn!("{}: session failed: {}", self.device, failure),
            None => info!("{}: session completed", self.device),
        }

        aggregate(
            self.status,
            std::mem::take(&mut self.log),
            self.failure.clone(),
        )
    }

    async fn connect(&mut self) -> bool {
        let opened = match self.remaining() {
            Some(remaining) => {
                match tokio::time::timeout(remaining, self.driver.open()).await {
                    Ok(result) => result,
                    Err(_) => {
                        self.fail(SessionFailure::new(
                            ErrorKind::SessionTimeout,
                            "session deadline expired while connecting",
                            None,
                        ));
                        return false;
                    }
                }
            }
            None => self.driver.open().await,
        };

        match opened {
            Ok(()) => {
                self.mode = self.driver.current_mode();
                debug!("{}: connected in {:?}", self.device, self.mode);
                true
            }
            Err(e) => {
                let kind = ErrorKind::classify(&e, ErrorKind::Connection);
                self.fail(SessionFailure::new(kind, e.to_string(), None));
                false
            }
        }
    }

    /// Enter privileged mode when the dialect has such a step and the
    /// device is not already there.
    async fn elevate(&mut self) -> bool {
        let dialect = self.dialect;
        let Some(privileged) = &dialect.privileged else {
            return true;
        };
        if self.driver.current_mode() == Some(Mode::PrivilegedMode) {
            debug!("{}: already privileged", self.device);
            return true;
        }
        if !self.check_deadline(&privileged.command) {
            return false;
        }

        let start = Instant::now();
        let timeout = self.step_timeout();
        let event = InteractiveEvent::with_pattern(
            privileged.command.clone(),
            privileged.response_pattern.clone(),
        )
        .with_timeout(timeout);

        let mut raw = String::new();
        let mut exchange = self.driver.send_interactive(&[event]).await;

        let prompted = match &exchange {
            Ok(first) => {
                raw.push_str(&first.full_raw_output());
                privileged.password_prompt.is_match(raw.as_bytes())
            }
            Err(_) => false,
        };
        if prompted {
            // An empty answer still gets past devices without a secret
            let secret = self
                .enable_secret
                .as_ref()
                .map(|s| s.expose_secret().to_string())
                .unwrap_or_default();
            let answer = InteractiveEvent::hidden(secret, dialect.prompt_pattern.clone())
                .with_timeout(self.step_timeout());
            exchange = self.driver.send_interactive(&[answer]).await;
            if let Ok(second) = &exchange {
                raw.push_str(&second.full_raw_output());
            }
        }

        let output = match &exchange {
            Ok(result) => result.final_output().unwrap_or_default().to_string(),
            Err(_) => String::new(),
        };
        let failure = match exchange {
            Err(e) => Some((self.classify(&e, ErrorKind::ModeTransition), e.to_string())),
            Ok(result) => self.privileged_failure(&result),
        };
        self.mode = self.driver.current_mode();

        let result = match failure {
            None => CommandResult::succeeded(
                StepKind::Privileged,
                privileged.command.as_str(),
                raw,
                output,
                start.elapsed(),
            ),
            Some((kind, message)) => CommandResult::failed(
                StepKind::Privileged,
                privileged.command.as_str(),
                raw,
                output,
                start.elapsed(),
                kind,
                message,
            ),
        };
        self.record(result)
    }

    fn privileged_failure(&self, result: &InteractiveResult) -> Option<(ErrorKind, String)> {
        if let Some(marker) = result.failure_message() {
            return Some((ErrorKind::ModeTransition, marker.to_string()));
        }
        match self.driver.current_mode() {
            Some(Mode::PrivilegedMode) => None,
            mode => Some((
                ErrorKind::ModeTransition,
                format!("expected privileged prompt, device is in {:?}", mode),
            )),
        }
    }

    async fn configure(&mut self, commands: &[String]) {
        let dialect = self.dialect;

        let entered = self
            .step(
                StepKind::EnterConfig,
                &dialect.config_enter,
                ErrorKind::ModeTransition,
                Some(Mode::ConfigMode),
            )
            .await;

        if entered {
            for command in commands {
                if !self.step(StepKind::Command, command, ErrorKind::Command, None).await {
                    break;
                }
            }
        }

        // Exactly one exit, whatever happened above, with the plain timeout
        if self.driver.is_open() {
            self.mode = Some(Mode::ExitingConfig);
            let exit = match &dialect.exit_confirm {
                Some(confirm) => self.exit_confirmed(confirm).await,
                None => {
                    let timeout = self.driver.timeout();
                    self.execute(
                        StepKind::ExitConfig,
                        &dialect.config_exit,
                        ErrorKind::ModeTransition,
                        Some(dialect.exit_lands_in),
                        timeout,
                    )
                    .await
                }
            };
            self.record(exit);
        }

        if self.failure.is_some() {
            return;
        }

        if let Some(commit) = &dialect.commit {
            self.mode = Some(Mode::Committing);
            if !self.step(StepKind::Commit, commit, ErrorKind::CommitFailed, None).await {
                return;
            }
        }

        if dialect.requires_save() {
            self.mode = Some(Mode::Saving);
            self.save().await;
        }
    }

    /// Leave configuration mode, answering the staged-changes question if
    /// the device asks it.
    async fn exit_confirmed(&mut self, confirm: &ExitConfirm) -> CommandResult {
        let dialect = self.dialect;
        let command = dialect.config_exit.as_str();
        let timeout = self.driver.timeout();
        let start = Instant::now();

        let request = InteractiveEvent::with_pattern(command, confirm.response_pattern.clone())
            .with_timeout(timeout);
        let mut raw = String::new();
        let mut exchange = self.driver.send_interactive(&[request]).await;

        let asked = match &exchange {
            Ok(first) => {
                raw.push_str(&first.full_raw_output());
                confirm.prompt.is_match(raw.as_bytes())
            }
            Err(_) => false,
        };
        if asked {
            debug!("{}: answering '{}' to leave configuration", self.device, confirm.answer);
            let answer = InteractiveEvent::with_pattern(confirm.answer.clone(), dialect.prompt_pattern.clone())
                .with_timeout(timeout);
            exchange = self.driver.send_interactive(&[answer]).await;
            if let Ok(second) = &exchange {
                raw.push_str(&second.full_raw_output());
            }
        }

        let failure = match &exchange {
            Err(e) => Some((self.classify(e, ErrorKind::ModeTransition), e.to_string())),
            Ok(result) => match result.failure_message() {
                Some(marker) => Some((ErrorKind::ModeTransition, marker.to_string())),
                None => match self.driver.current_mode() {
                    Some(mode) if mode == dialect.exit_lands_in => None,
                    mode => Some((
                        ErrorKind::ModeTransition,
                        format!("expected {} prompt, device is in {:?}", dialect.exit_lands_in, mode),
                    )),
                },
            },
        };
        self.mode = self.driver.current_mode();

        let output = dialect.normalize_output(&raw, command);
        match failure {
            None => CommandResult::succeeded(StepKind::ExitConfig, command, raw, output, start.elapsed()),
            Some((kind, message)) => CommandResult::failed(
                StepKind::ExitConfig,
                command,
                raw,
                output,
                start.elapsed(),
                kind,
                message,
            ),
        }
    }

    /// Send save, require the confirmation, answer it and require the
    /// prompt back. Never retried.
    async fn save(&mut self) {
        let dialect = self.dialect;
        let Some(save) = &dialect.save else {
            return;
        };
        if !self.check_deadline(&save.command) {
            return;
        }

        let start = Instant::now();
        let request = InteractiveEvent::with_pattern(save.command.clone(), save.response_pattern.clone())
            .with_timeout(self.step_timeout());

        let (raw, failure) = match self.driver.send_interactive(&[request]).await {
            Err(e) => (String::new(), Some((self.classify(&e, ErrorKind::UnsavedConfig), e.to_string()))),
            Ok(prompted) => {
                let mut raw = prompted.full_raw_output();
                if !save.confirm_prompt.is_match(raw.as_bytes()) {
                    let message = "save confirmation prompt not shown".to_string();
                    (raw, Some((ErrorKind::UnsavedConfig, message)))
                } else {
                    let confirm = InteractiveEvent::with_pattern(
                        save.confirm_token.clone(),
                        dialect.prompt_pattern.clone(),
                    )
                    .with_timeout(self.step_timeout());
                    match self.driver.send_interactive(&[confirm]).await {
                        Err(e) => (raw, Some((self.classify(&e, ErrorKind::UnsavedConfig), e.to_string()))),
                        Ok(confirmed) => {
                            raw.push_str(&confirmed.full_raw_output());
                            let failure = confirmed
                                .failure_message()
                                .map(|marker| (ErrorKind::UnsavedConfig, marker.to_string()));
                            (raw, failure)
                        }
                    }
                }
            }
        };
        self.mode = self.driver.current_mode();

        let output = dialect.normalize_output(&raw, &save.command);
        let result = match failure {
            None => CommandResult::succeeded(StepKind::Save, save.command.as_str(), raw, output, start.elapsed()),
            Some((kind, message)) => CommandResult::failed(
                StepKind::Save,
                save.command.as_str(),
                raw,
                output,
                start.elapsed(),
                kind,
                message,
            ),
        };
        self.record(result);
    }

    /// Every command runs; only a lost connection or the deadline stops
    /// the batch.
    async fn inspect(&mut self, commands: &[String]) {
        for command in commands {
            if !self.check_deadline(command) {
                return;
            }
            let timeout = self.step_timeout();
            let result = self
                .execute(StepKind::Inspect, command, ErrorKind::Command, None, timeout)
                .await;

            let fatal = matches!(
                result.error,
                Some(ErrorKind::Connection | ErrorKind::SessionTimeout)
            );
            if fatal {
                self.record(result);
                return;
            }
            if let Some(message) = &result.message {
                debug!("{}: '{}' failed: {}", self.device, command, message);
            }
            self.log.push(result);
        }
    }

    /// Deadline-checked step whose failure fails the session.
    async fn step(
        &mut self,
        step: StepKind,
        command: &str,
        on_error: ErrorKind,
        expect: Option<Mode>,
    ) -> bool {
        if !self.check_deadline(command) {
            return false;
        }
        let timeout = self.step_timeout();
        let result = self.execute(step, command, on_error, expect, timeout).await;
        self.record(result)
    }

    async fn execute(
        &mut self,
        step: StepKind,
        command: &str,
        on_error: ErrorKind,
        expect: Option<Mode>,
        timeout: Duration,
    ) -> CommandResult {
        let start = Instant::now();
        match self.driver.send_command_with_timeout(command, timeout).await {
            Err(e) => {
                let kind = self.classify(&e, on_error);
                CommandResult::failed(step, command, "", "", start.elapsed(), kind, e.to_string())
            }
            Ok(response) => {
                if response.mode.is_some() {
                    self.mode = response.mode;
                }
                if let Some(marker) = &response.failure_message {
                    return CommandResult::failed(
                        step,
                        command,
                        response.raw_result.as_str(),
                        response.result.as_str(),
                        response.elapsed,
                        on_error,
                        marker.as_str(),
                    );
                }
                match expect {
                    Some(expected) if response.mode != Some(expected) => CommandResult::failed(
                        step,
                        command,
                        response.raw_result.as_str(),
                        response.result.as_str(),
                        response.elapsed,
                        ErrorKind::ModeTransition,
                        format!("expected {} prompt, got '{}'", expected, response.prompt),
                    ),
                    _ => CommandResult::succeeded(
                        step,
                        command,
                        response.raw_result,
                        response.result,
                        response.elapsed,
                    ),
                }
            }
        }
    }

    /// Append `result`, failing the session if it failed.
    fn record(&mut self, result: CommandResult) -> bool {
        let success = result.success;
        if let Some(failure) = result.failure() {
            self.fail(failure);
        }
        self.log.push(result);
        success
    }

    /// Set the session error unless one is already set.
    fn fail(&mut self, failure: SessionFailure) {
        match &self.failure {
            Some(first) => debug!("{}: {} (after {})", self.device, failure, first.kind),
            None => self.failure = Some(failure),
        }
    }

    fn classify(&self, err: &crate::Error, step: ErrorKind) -> ErrorKind {
        if self.expired() {
            ErrorKind::SessionTimeout
        } else {
            ErrorKind::classify(err, step)
        }
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn expired(&self) -> bool {
        self.remaining().is_some_and(|remaining| remaining.is_zero())
    }

    /// Fail with `SessionTimeout` before sending `command` if the deadline
    /// has passed.
    fn check_deadline(&mut self, command: &str) -> bool {
        if !self.expired() {
            return true;
        }
        self.fail(SessionFailure::new(
            ErrorKind::SessionTimeout,
            "session deadline expired",
            Some(command),
        ));
        false
    }

    /// Per-read timeout clamped to the time left.
    fn step_timeout(&self) -> Duration {
        let timeout = self.driver.timeout();
        match self.remaining() {
            Some(remaining) => timeout.min(remaining),
            None => timeout,
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.driver.close().await {
            warn!("{}: closing the channel failed: {}", self.device, e);
        }
        self.mode = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::driver::scripted::{OpenBehavior, Reply, ScriptedDriver};
    use crate::platform::DialectKind;
    use crate::session::Outcome;

    fn device(kind: DialectKind) -> DeviceDescriptor {
        DeviceDescriptor::new("sw1", "10.0.0.1", "admin", "pw", kind)
    }

    fn batch(commands: &[&str]) -> Batch {
        Batch::Configure(commands.iter().map(|c| c.to_string()).collect())
    }

    fn inspect(commands: &[&str]) -> Batch {
        Batch::Inspect(commands.iter().map(|c| c.to_string()).collect())
    }

    fn sent(driver: &ScriptedDriver) -> impl Fn() -> Vec<String> + use<> {
        let log = driver.sent();
        move || log.lock().unwrap().clone()
    }

    fn position(sent: &[String], command: &str) -> usize {
        sent.iter().position(|c| c == command).unwrap()
    }

    #[tokio::test]
    async fn test_huawei_configure_success() {
        let driver = ScriptedDriver::new(DialectKind::Huawei);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::Huawei), driver);

        let payload = session.run(&batch(&["vlan 10", "quit"]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(payload.outcome, Outcome::Success);
        assert!(payload.error.is_none());
        let steps: Vec<StepKind> = payload.results.iter().map(|r| r.step).collect();
        assert_eq!(
            steps,
            [
                StepKind::EnterConfig,
                StepKind::Command,
                StepKind::Command,
                StepKind::ExitConfig,
                StepKind::Commit,
                StepKind::Save,
            ]
        );

        let sent = sent();
        assert_eq!(sent, ["system-view", "vlan 10", "quit", "return", "commit", "save", "y"]);
        assert!(position(&sent, "return") < position(&sent, "commit"));
        assert!(position(&sent, "commit") < position(&sent, "save"));
        assert_eq!(session.status(), Status::Completed);
        assert_eq!(session.mode(), None);
    }

    #[tokio::test]
    async fn test_cisco_exits_exactly_once() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoIos), driver);

        let payload = session
            .run(&batch(&["interface Gi0/1", "description uplink"]), &())
            .await;

        assert_eq!(payload.status, Status::Completed);
        let sent = sent();
        assert_eq!(sent.iter().filter(|c| *c == "end").count(), 1);
        assert_eq!(sent, ["enable", "configure terminal", "interface Gi0/1", "description uplink", "end"]);
        assert_eq!(payload.results[0].step, StepKind::Privileged);
        assert!(payload.results.iter().all(|r| r.step != StepKind::Commit && r.step != StepKind::Save));
    }

    #[tokio::test]
    async fn test_fail_fast_skips_commit_and_save() {
        let driver = ScriptedDriver::new(DialectKind::Huawei).reply(
            "interface bogus0",
            Reply::Reject("Error: Wrong parameter found at '^' position.".into()),
        );
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::Huawei), driver);

        let payload = session
            .run(&batch(&["vlan 10", "interface bogus0", "ip address 10.0.0.1 24"]), &())
            .await;

        assert_eq!(payload.status, Status::Failed);
        let error = payload.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Command);
        assert_eq!(error.command.as_deref(), Some("interface bogus0"));

        let sent = sent();
        assert!(!sent.contains(&"ip address 10.0.0.1 24".to_string()));
        assert!(!sent.contains(&"commit".to_string()));
        assert!(!sent.contains(&"save".to_string()));
        assert_eq!(sent.last().map(String::as_str), Some("return"));
        assert_eq!(payload.results.last().unwrap().step, StepKind::ExitConfig);
        assert!(payload.results.last().unwrap().success);
    }

    #[tokio::test]
    async fn test_connection_failure_records_nothing() {
        let driver = ScriptedDriver::new(DialectKind::CiscoXe).open_behavior(OpenBehavior::Timeout);
        let closed = driver.closed();
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoXe), driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        assert!(payload.results.is_empty());
        assert_eq!(payload.error.unwrap().kind, ErrorKind::Connection);
        assert!(*closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let driver = ScriptedDriver::new(DialectKind::Huawei).open_behavior(OpenBehavior::AuthFail);
        let mut session = ConfigurationSession::new(&device(DialectKind::Huawei), driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;
        let error = payload.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Connection);
        assert!(error.message.contains("admin"));
    }

    #[tokio::test]
    async fn test_commit_failure() {
        let driver = ScriptedDriver::new(DialectKind::HuaweiVrpV8)
            .reply("commit", Reply::Reject("Error: The configuration is locked by other user.".into()));
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::HuaweiVrpV8), driver);

        let payload = session.run(&batch(&["vlan 20"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        assert_eq!(payload.error.unwrap().kind, ErrorKind::CommitFailed);
        assert!(!sent().contains(&"save".to_string()));
    }

    #[tokio::test]
    async fn test_vrp_v8_uncommitted_question_answered_on_exit() {
        let driver = ScriptedDriver::new(DialectKind::HuaweiVrpV8);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::HuaweiVrpV8), driver);

        let payload = session.run(&batch(&["vlan 20"]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(
            sent(),
            ["system-view", "vlan 20", "return", "N", "commit", "save", "y"]
        );
        let exit = &payload.results[2];
        assert_eq!(exit.step, StepKind::ExitConfig);
        assert_eq!(exit.command, "return");
        assert!(exit.success);
        assert!(exit.raw_output.contains("Uncommitted configurations found"));
        let steps: Vec<StepKind> = payload.results.iter().map(|r| r.step).collect();
        assert_eq!(
            steps,
            [
                StepKind::EnterConfig,
                StepKind::Command,
                StepKind::ExitConfig,
                StepKind::Commit,
                StepKind::Save
            ]
        );
    }

    #[tokio::test]
    async fn test_vrp_v8_exit_without_staged_changes() {
        let driver = ScriptedDriver::new(DialectKind::HuaweiVrpV8);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::HuaweiVrpV8), driver);

        let payload = session.run(&batch(&[]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(sent(), ["system-view", "return", "commit", "save", "y"]);
    }

    #[tokio::test]
    async fn test_vrp_v8_exit_hang_is_mode_transition() {
        let driver = ScriptedDriver::new(DialectKind::HuaweiVrpV8).reply("return", Reply::Hang);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::HuaweiVrpV8), driver);

        let payload = session.run(&batch(&["vlan 20"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        assert_eq!(payload.error.unwrap().kind, ErrorKind::ModeTransition);
        assert!(!sent().contains(&"commit".to_string()));
    }

    #[tokio::test]
    async fn test_save_without_confirmation() {
        let driver = ScriptedDriver::new(DialectKind::Huawei).without_save_confirmation();
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::Huawei), driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        let error = payload.error.unwrap();
        assert_eq!(error.kind, ErrorKind::UnsavedConfig);
        assert_eq!(error.command.as_deref(), Some("save"));
        // no retry and no confirmation token
        let sent = sent();
        assert_eq!(sent.iter().filter(|c| *c == "save").count(), 1);
        assert!(!sent.contains(&"y".to_string()));
    }

    #[tokio::test]
    async fn test_enable_secret_answered() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos).enable_secret("s3cret");
        let sent = sent(&driver);
        let device = device(DialectKind::CiscoIos).with_secret("s3cret");
        let mut session = ConfigurationSession::new(&device, driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(sent()[..2], ["enable".to_string(), "s3cret".to_string()]);
        let privileged = &payload.results[0];
        assert!(privileged.success);
        assert!(!privileged.raw_output.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_enable_prompt_without_secret() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos).enable_secret("");
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoIos), driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(sent()[1], "");
    }

    #[tokio::test]
    async fn test_wrong_secret_skips_config_exit() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos).enable_secret("right");
        let sent = sent(&driver);
        let closed = driver.closed();
        let device = device(DialectKind::CiscoIos).with_secret("wrong");
        let mut session = ConfigurationSession::new(&device, driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        assert_eq!(payload.error.unwrap().kind, ErrorKind::ModeTransition);
        assert_eq!(payload.results.len(), 1);
        assert!(!sent().contains(&"end".to_string()));
        assert!(*closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_already_privileged() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos).start_in(Mode::PrivilegedMode);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoIos), driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(sent()[0], "configure terminal");
    }

    #[tokio::test]
    async fn test_config_entry_failure_still_exits() {
        let driver = ScriptedDriver::new(DialectKind::CiscoNxos).reply("configure terminal", Reply::Ignore);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoNxos), driver);

        let payload = session.run(&batch(&["vlan 10"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        assert_eq!(payload.error.unwrap().kind, ErrorKind::ModeTransition);
        assert_eq!(sent(), ["configure terminal", "end"]);
    }

    #[tokio::test]
    async fn test_deadline_expiry() {
        let driver = ScriptedDriver::new(DialectKind::Huawei)
            .with_timeout(Duration::from_millis(500))
            .reply("vlan 10", Reply::Hang);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::Huawei), driver)
            .with_deadline(Some(Duration::from_millis(50)));

        let payload = session.run(&batch(&["vlan 10", "quit"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        assert_eq!(payload.error.unwrap().kind, ErrorKind::SessionTimeout);
        let sent = sent();
        assert!(!sent.contains(&"quit".to_string()));
        assert_eq!(sent.last().map(String::as_str), Some("return"));
        assert!(!sent.contains(&"commit".to_string()));
    }

    #[tokio::test]
    async fn test_connection_lost_mid_batch() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos).reply("vlan 10", Reply::Disconnect);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoIos), driver);

        let payload = session.run(&batch(&["vlan 10", "name users"]), &()).await;

        assert_eq!(payload.status, Status::Failed);
        let error = payload.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Connection);
        assert_eq!(error.command.as_deref(), Some("vlan 10"));
        assert!(!sent().contains(&"end".to_string()));
    }

    #[tokio::test]
    async fn test_inspection_partial_success() {
        let driver = ScriptedDriver::new(DialectKind::CiscoIos)
            .reply("show version", Reply::Output("Cisco IOS Software, Version 15.2".into()))
            .reply("show bogus", Reply::Reject("% Invalid input detected at '^' marker.".into()));
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::CiscoIos), driver);

        let payload = session
            .run(&inspect(&["show version", "show bogus", "show vlan brief"]), &())
            .await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(payload.outcome, Outcome::PartialSuccess);
        assert_eq!(payload.results.len(), 4);
        assert!(payload.results[1].output.contains("Version 15.2"));
        assert!(!payload.results[2].success);
        assert!(payload.results[3].success);
        assert!(!sent().contains(&"configure terminal".to_string()));
    }

    #[tokio::test]
    async fn test_observer_notified_on_connect() {
        struct Flag(AtomicBool);
        impl SessionObserver for Flag {
            fn on_connected(&self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let connected = Flag(AtomicBool::new(false));
        let mut session = ConfigurationSession::new(
            &device(DialectKind::Huawei),
            ScriptedDriver::new(DialectKind::Huawei),
        );
        session.run(&inspect(&["display version"]), &connected).await;
        assert!(connected.0.load(Ordering::SeqCst));

        let refused = Flag(AtomicBool::new(false));
        let mut session = ConfigurationSession::new(
            &device(DialectKind::Huawei),
            ScriptedDriver::new(DialectKind::Huawei).open_behavior(OpenBehavior::Timeout),
        );
        session.run(&inspect(&["display version"]), &refused).await;
        assert!(!refused.0.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_batch_still_persists() {
        let driver = ScriptedDriver::new(DialectKind::Huawei);
        let sent = sent(&driver);
        let mut session = ConfigurationSession::new(&device(DialectKind::Huawei), driver);

        let payload = session.run(&batch(&[]), &()).await;

        assert_eq!(payload.status, Status::Completed);
        assert_eq!(sent(), ["system-view", "return", "commit", "save", "y"]);
    }
}
