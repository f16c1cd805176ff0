//! Channel layer for pattern matching and PTY operations.
//!
//! This module handles the interactive shell stream: ANSI stripping,
//! tail-window prompt detection, and timed reads.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::combine_patterns;
pub use pty::PtyChannel;
