//! Dialect definitions for multi-vendor support.
//!
//! A [`Dialect`] holds everything vendor specific about a device session:
//! mode prompts, the privileged and configuration-mode commands, whether
//! changes need a commit and a save, failure markers and setup commands.
//! Dialects are resolved once from a [`DialectKind`] through the static
//! [`DialectRegistry`].
//!
//! [`vocabulary`] builds the command text for common workloads.

mod definition;
mod mode;
mod registry;
pub mod vendors;
pub mod vocabulary;

pub use definition::{Dialect, ExitConfirm, PrivilegedStep, SaveStep};
pub use mode::{Mode, ModePrompt};
pub use registry::{DialectKind, DialectRegistry, Family};
