//! Huawei VRP and VRPv8 dialects.
//!
//! Huawei devices stage configuration changes: after leaving system view the
//! session must `commit` them and then `save` the running configuration,
//! answering the save confirmation.
//!
//! # Prompt Examples
//!
//! ```text
//! <HUAWEI>                        # user view
//! [HUAWEI]                        # system view
//! [HUAWEI-vlan10]                 # sub-view
//! [~HUAWEI-GigabitEthernet0/0/1]  # VRPv8, changes pending
//! ```
//!
//! # Save Confirmation
//!
//! ```text
//! <HUAWEI>save
//!   The current configuration will be written to the device.
//!   Are you sure to continue? [Y/N]:y
//!   Now saving the current configuration to the slot 0.
//!   Save the configuration successfully.
//! <HUAWEI>
//! ```
//!
//! # Leaving System View on VRPv8
//!
//! With staged changes, `return` asks whether to commit them first. The
//! session answers `N` so the exit stays a pure mode change and the explicit
//! `commit` that follows is the only one.
//!
//! ```text
//! [*HUAWEI-vlan10]return
//! Warning: Uncommitted configurations found. Are you sure to commit them before exiting? [Y(yes)/N(no)/C(cancel)]:N
//! <HUAWEI>
//! ```

use crate::platform::{Dialect, DialectKind, Mode, ModePrompt};

const USER_PROMPT: &str = r"(?m)^<[\w.\-@/:]{1,63}>\s?$";
const SYSTEM_PROMPT: &str = r"(?m)^\[[\w.\-@/:]{1,127}\]\s?$";
const SYSTEM_PROMPT_V8: &str = r"(?m)^\[[~*]?[\w.\-@/:]{1,127}\]\s?$";
const SAVE_CONFIRM: &str = r"(?i)\[y/n\]:?\s*$";
const UNCOMMITTED_CONFIRM: &str = r"(?i)\[y\(yes\)/n\(no\)/c\(cancel\)\]:?\s*$";

const FAILURE_MARKERS: [&str; 6] = [
    "Error:",
    "Unrecognized command",
    "Wrong parameter",
    "Incomplete command",
    "Too many parameters",
    "Ambiguous command",
];

/// Huawei VRP.
pub fn vrp() -> Dialect {
    build(DialectKind::Huawei, SYSTEM_PROMPT)
}

/// Huawei VRPv8.
///
/// System-view prompts carry a `~` or `*` marker while changes are pending.
pub fn vrp_v8() -> Dialect {
    build(DialectKind::HuaweiVrpV8, SYSTEM_PROMPT_V8)
        .with_exit_confirm(UNCOMMITTED_CONFIRM, "N")
        .unwrap()
        .with_on_open_command("screen-width 512")
}

fn build(kind: DialectKind, system_prompt: &str) -> Dialect {
    let prompts = vec![
        ModePrompt::new(Mode::ConfigMode, system_prompt).unwrap(),
        ModePrompt::new(Mode::UserMode, USER_PROMPT).unwrap(),
    ];

    // `return` reaches user view from any sub-view, `quit` only goes up one
    let dialect = Dialect::new(kind, prompts)
        .unwrap()
        .with_config_mode("system-view", "return", Mode::UserMode)
        .with_commit("commit")
        .with_save("save", SAVE_CONFIRM, "y")
        .unwrap()
        .with_on_open_command("screen-length 0 temporary");

    FAILURE_MARKERS
        .into_iter()
        .fold(dialect, |d, marker| d.with_failure_pattern(marker))
}
