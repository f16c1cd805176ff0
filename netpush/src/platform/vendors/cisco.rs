//! Cisco IOS, IOS-XE and NX-OS dialects.
//!
//! Cisco devices apply configuration commands immediately; there is no
//! commit or save step in the session protocol.
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Prompt Examples
//!
//! ```text
//! router>                    # user EXEC
//! router#                    # privileged EXEC
//! router(config)#            # global configuration
//! router(config-if)#         # interface sub-mode
//! ```
//!
//! # Mode Transitions
//!
//! ```text
//! ┌──────┐  enable   ┌────────────┐  configure terminal  ┌───────────────┐
//! │ user ├───────────► privileged ├──────────────────────► configuration │
//! │  >   │           │     #      ◄──────────────────────┤  (config*)#   │
//! └──────┘           └────────────┘         end          └───────────────┘
//! ```

use crate::platform::{Dialect, DialectKind, Mode, ModePrompt};

const USER_PROMPT: &str = r"(?mi)^[\w.\-@/:]{1,63}>\s?$";
const PRIVILEGED_PROMPT: &str = r"(?mi)^[\w.\-@/:]{1,63}#\s?$";
const CONFIG_PROMPT: &str = r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,63}\)#\s?$";
const PASSWORD_PROMPT: &str = r"(?mi)^password:\s?$";

/// Cisco IOS.
pub fn ios() -> Dialect {
    ios_family(DialectKind::CiscoIos)
}

/// Cisco IOS-XE.
pub fn xe() -> Dialect {
    ios_family(DialectKind::CiscoXe)
}

fn ios_family(kind: DialectKind) -> Dialect {
    let prompts = vec![
        ModePrompt::new(Mode::ConfigMode, CONFIG_PROMPT).unwrap(),
        ModePrompt::new(Mode::PrivilegedMode, PRIVILEGED_PROMPT)
            .unwrap()
            .with_not_contains("(conf"),
        ModePrompt::new(Mode::UserMode, USER_PROMPT).unwrap(),
    ];

    Dialect::new(kind, prompts)
        .unwrap()
        .with_privileged("enable", PASSWORD_PROMPT)
        .unwrap()
        .with_config_mode("configure terminal", "end", Mode::PrivilegedMode)
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Unrecognized command")
        .with_failure_pattern("% Bad mask")
        .with_failure_pattern("% Error")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
}

/// Cisco NX-OS.
///
/// NX-OS logins land directly in privileged EXEC, so there is no enable step.
pub fn nxos() -> Dialect {
    let prompts = vec![
        ModePrompt::new(Mode::ConfigMode, CONFIG_PROMPT).unwrap(),
        ModePrompt::new(
            Mode::PrivilegedMode,
            r"(?mi)^[\w.\-@/:]{1,63}(\(maint-mode\))?#\s?$",
        )
        .unwrap()
        .with_not_contains("(conf"),
    ];

    Dialect::new(DialectKind::CiscoNxos, prompts)
        .unwrap()
        .with_config_mode("configure terminal", "end", Mode::PrivilegedMode)
        .with_failure_pattern("% Invalid command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Invalid parameter")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Permission denied")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
}
