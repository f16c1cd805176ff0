//! Pattern buffer with tail-search optimization.
//!
//! Prompt patterns are only searched in the last N bytes of the buffer,
//! rather than the entire output. For large outputs (full routing tables,
//! running-config backups) this keeps prompt detection cheap.

use std::fmt;

use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Buffer for accumulating output and searching for prompt patterns.
///
/// Incoming bytes are passed through a `vte` parser so that ANSI escape
/// sequences are stripped, even when a sequence is split across two reads.
pub struct PatternBuffer {
    /// The accumulated, cleaned output.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape sequence parser, kept across reads.
    parser: Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = PlainText {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, data);
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Returned offsets are relative to the start of the search region.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(self.tail())
    }

    /// Search the entire buffer for a pattern.
    pub fn search_full(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.buffer)
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Check if the last match of `pattern` in the tail is followed only by
    /// whitespace, i.e. the device is sitting at that prompt.
    pub fn tail_ends_with(&self, pattern: &Regex) -> bool {
        let tail = self.tail();
        pattern
            .find_iter(tail)
            .last()
            .is_some_and(|m| tail[m.end()..].iter().all(u8::is_ascii_whitespace))
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }

    fn tail(&self) -> &[u8] {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        &self.buffer[start..]
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// `vte` performer that keeps printable text and line control characters.
struct PlainText<'a> {
    out: &'a mut BytesMut,
}

impl Perform for PlainText<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out
            .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\r' | b'\t' => self.out.extend_from_slice(&[byte]),
            // Backspace erases what the device just echoed
            0x08 => {
                let len = self.out.len();
                self.out.truncate(len.saturating_sub(1));
            }
            _ => {}
        }
    }
}
