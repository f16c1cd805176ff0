//! Device command modes and prompt patterns.

use std::fmt;

use regex::bytes::Regex;
use serde::Serialize;

/// Command-interpretation context of a session.
///
/// The first three variants are observable from the device prompt. The
/// remaining ones are protocol phases the session passes through while the
/// device prompt still reads user or privileged mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    UserMode,
    PrivilegedMode,
    ConfigMode,
    ExitingConfig,
    Committing,
    Saving,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::UserMode => "user",
            Mode::PrivilegedMode => "privileged",
            Mode::ConfigMode => "configuration",
            Mode::ExitingConfig => "exiting-configuration",
            Mode::Committing => "committing",
            Mode::Saving => "saving",
        };
        f.write_str(name)
    }
}

/// Prompt pattern identifying one device mode.
#[derive(Debug, Clone)]
pub struct ModePrompt {
    /// Mode this prompt identifies.
    pub mode: Mode,

    /// Regex pattern to match the prompt.
    pub pattern: Regex,

    /// Strings that must NOT be in the prompt for this mode to match.
    /// Disambiguates e.g. `router#` from `router(config)#`.
    pub not_contains: Vec<String>,
}

impl ModePrompt {
    /// Create a prompt pattern for a mode.
    pub fn new(mode: Mode, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            mode,
            pattern: Regex::new(pattern)?,
            not_contains: vec![],
        })
    }

    /// Add a not_contains string.
    pub fn with_not_contains(mut self, text: impl Into<String>) -> Self {
        self.not_contains.push(text.into());
        self
    }

    /// Check if this prompt pattern matches a prompt string.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc)) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}
