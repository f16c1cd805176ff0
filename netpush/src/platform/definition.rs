//! Dialect definition: the mode-transition and persistence rules of one
//! vendor/OS family.

use indexmap::IndexMap;
use memchr::memrchr;
use regex::bytes::Regex;

use super::mode::{Mode, ModePrompt};
use super::registry::DialectKind;
use crate::channel::combine_patterns;

/// Privileged-mode entry step (e.g. Cisco `enable`).
#[derive(Debug, Clone)]
pub struct PrivilegedStep {
    /// Command that enters privileged mode.
    pub command: String,

    /// Pattern of the secret prompt the device may show after the command.
    pub password_prompt: Regex,

    /// Secret prompt or any mode prompt.
    pub response_pattern: Regex,
}

/// Configuration persistence step (e.g. Huawei `save`).
#[derive(Debug, Clone)]
pub struct SaveStep {
    /// Command that writes the running configuration to startup.
    pub command: String,

    /// Pattern of the yes/no confirmation the device must show.
    pub confirm_prompt: Regex,

    /// Token sent in answer to the confirmation.
    pub confirm_token: String,

    /// Confirmation or any mode prompt.
    pub response_pattern: Regex,
}

/// Question some devices ask when configuration mode is left with staged
/// changes, and the answer that completes the exit.
#[derive(Debug, Clone)]
pub struct ExitConfirm {
    /// Pattern of the question.
    pub prompt: Regex,

    /// Answer that leaves configuration mode.
    pub answer: String,

    /// Question or any mode prompt.
    pub response_pattern: Regex,
}

/// Immutable rule set for one dialect.
///
/// Built once per [`DialectKind`] by the registry and shared as
/// `&'static Dialect`.
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Which dialect this is.
    pub kind: DialectKind,

    /// Prompt patterns by mode, checked in insertion order.
    pub prompts: IndexMap<Mode, ModePrompt>,

    /// Combined pattern matching any of `prompts`.
    pub prompt_pattern: Regex,

    /// Privileged-mode entry, if the family has one.
    pub privileged: Option<PrivilegedStep>,

    /// Command that enters configuration mode.
    pub config_enter: String,

    /// Command that leaves configuration mode from any sub-mode.
    pub config_exit: String,

    /// Mode the device is in after `config_exit`.
    pub exit_lands_in: Mode,

    /// Question `config_exit` may raise before the device leaves
    /// configuration mode.
    pub exit_confirm: Option<ExitConfirm>,

    /// Commit command, when staged changes need activating.
    pub commit: Option<String>,

    /// Save step, when the running configuration needs persisting.
    pub save: Option<SaveStep>,

    /// Output fragments that mark a command as rejected.
    pub failed_when_contains: Vec<String>,

    /// Commands run right after connecting (paging off etc.).
    pub on_open_commands: Vec<String>,
}

impl Dialect {
    /// Start a dialect definition with its mode prompts.
    pub fn new(kind: DialectKind, prompts: Vec<ModePrompt>) -> Result<Self, regex::Error> {
        let prompt_pattern = combine_patterns(prompts.iter().map(|p| &p.pattern))?;
        let prompts = prompts.into_iter().map(|p| (p.mode, p)).collect();
        Ok(Self {
            kind,
            prompts,
            prompt_pattern,
            privileged: None,
            config_enter: String::new(),
            config_exit: String::new(),
            exit_lands_in: Mode::PrivilegedMode,
            exit_confirm: None,
            commit: None,
            save: None,
            failed_when_contains: vec![],
            on_open_commands: vec![],
        })
    }

    /// Set the privileged-mode entry command and its secret prompt.
    pub fn with_privileged(
        mut self,
        command: impl Into<String>,
        password_prompt: &str,
    ) -> Result<Self, regex::Error> {
        let password_prompt = Regex::new(password_prompt)?;
        let response_pattern = combine_patterns([&password_prompt, &self.prompt_pattern])?;
        self.privileged = Some(PrivilegedStep {
            command: command.into(),
            password_prompt,
            response_pattern,
        });
        Ok(self)
    }

    /// Set configuration entry and exit commands.
    pub fn with_config_mode(
        mut self,
        enter: impl Into<String>,
        exit: impl Into<String>,
        exit_lands_in: Mode,
    ) -> Self {
        self.config_enter = enter.into();
        self.config_exit = exit.into();
        self.exit_lands_in = exit_lands_in;
        self
    }

    /// Answer `answer` when leaving configuration mode raises `prompt`.
    pub fn with_exit_confirm(
        mut self,
        prompt: &str,
        answer: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let prompt = Regex::new(prompt)?;
        let response_pattern = combine_patterns([&prompt, &self.prompt_pattern])?;
        self.exit_confirm = Some(ExitConfirm {
            prompt,
            answer: answer.into(),
            response_pattern,
        });
        Ok(self)
    }

    /// Require a commit step.
    pub fn with_commit(mut self, command: impl Into<String>) -> Self {
        self.commit = Some(command.into());
        self
    }

    /// Require a save step with a confirmation handshake.
    pub fn with_save(
        mut self,
        command: impl Into<String>,
        confirm_prompt: &str,
        confirm_token: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let confirm_prompt = Regex::new(confirm_prompt)?;
        let response_pattern = combine_patterns([&confirm_prompt, &self.prompt_pattern])?;
        self.save = Some(SaveStep {
            command: command.into(),
            confirm_prompt,
            confirm_token: confirm_token.into(),
            response_pattern,
        });
        Ok(self)
    }

    /// Add a failure marker.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add a session-setup command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Whether a commit step is required.
    pub fn requires_commit(&self) -> bool {
        self.commit.is_some()
    }

    /// Whether a save step is required.
    pub fn requires_save(&self) -> bool {
        self.save.is_some()
    }

    /// Prompt pattern for a mode, if the dialect has that mode.
    pub fn prompt_for(&self, mode: Mode) -> Option<&ModePrompt> {
        self.prompts.get(&mode)
    }

    /// Determine the device mode from a prompt string.
    pub fn mode_of(&self, prompt: &str) -> Option<Mode> {
        self.prompts
            .values()
            .find(|p| p.matches(prompt))
            .map(|p| p.mode)
    }

    /// First failure marker found in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .map(String::as_str)
    }

    /// Strip the command echo and the trailing prompt line from raw output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw.trim_start_matches(['\r', '\n']);
        let output = output
            .strip_prefix(command)
            .unwrap_or(output)
            .trim_start_matches(['\r', '\n']);

        let body = match memrchr(b'\n', output.as_bytes()) {
            Some(pos) => &output[..pos],
            None => "",
        };
        body.trim_end_matches(['\r', '\n']).to_string()
    }
}
