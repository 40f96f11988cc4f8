//! Pattern buffer with tail-search.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns.
//! Show commands such as `show bgp neighbor` or `show running-config` can
//! produce megabytes of output; the prompt is always at the end.

use std::fmt;

use bytes::{Bytes, BytesMut};
use regex::bytes::{Match, Regex};
use vte::{Parser, Perform};

/// Collects printable output, dropping escape and control sequences.
struct Printable<'a>(&'a mut BytesMut);

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.0.extend_from_slice(&[byte]);
        }
    }
}

/// Buffer for accumulating output and searching its tail for patterns.
///
/// The ANSI parser state is kept between calls to [`extend`](Self::extend),
/// so an escape sequence split across two SSH packets is still removed.
pub struct PatternBuffer {
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

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
        self.parser.advance(&mut Printable(&mut self.buffer), data);
    }

    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// Search only the last `search_depth` bytes for the pattern.
    ///
    /// Offsets of the returned match are relative to the start of the
    /// searched region, not the full buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// Search the entire buffer for a pattern.
    pub fn search_full(&self, pattern: &Regex) -> Option<Match<'_>> {
        pattern.find(&self.buffer)
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// If the tail matches `pattern`, split off and return everything up to
    /// the end of the match. Bytes after the match stay buffered.
    pub fn take_through(&mut self, pattern: &Regex) -> Option<Bytes> {
        let start = self.tail_start();
        let end = start + pattern.find(&self.buffer[start..])?.end();
        Some(self.buffer.split_to(end).freeze())
    }

    /// Take the buffer contents and reset.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn search_depth(&self) -> usize {
        self.search_depth
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"show hostname\r\nleaf-1\r\n");
        assert_eq!(buffer.as_slice(), b"show hostname\r\nleaf-1\r\n");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mleaf-1#\x1b[0m");
        assert_eq!(buffer.as_slice(), b"leaf-1#");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Interface xe1\x1b[");
        buffer.extend(b"1mup\x1b[0m\n");
        assert_eq!(buffer.as_slice(), b"Interface xe1up\n");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nleaf-1#");

        let pattern = Regex::new(r"leaf-1#").unwrap();
        assert!(buffer.search_tail(&pattern).is_some());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"leaf-1#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"leaf-1#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
        assert!(buffer.search_full(&pattern).is_some());
    }

    #[test]
    fn test_take_through_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"output\nleaf-1#extra");
        let pattern = Regex::new(r"leaf-1#").unwrap();
        let taken = buffer.take_through(&pattern).unwrap();
        assert_eq!(&taken[..], b"output\nleaf-1#");
        assert_eq!(buffer.as_slice(), b"extra");
        assert!(buffer.take_through(&pattern).is_none());
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(&buffer.take()[..], b"test data");
        assert!(buffer.is_empty());
    }
}
