//! Line scanner over raw command output.
//!
//! Indentation carries scoping meaning in vendor show output (a line that
//! starts with whitespace continues the section of the last header), so every
//! [`Line`] keeps its original text alongside the length of its leading
//! whitespace run.

use memchr::memchr;

/// A single line of command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number within the scanned block.
    pub number: usize,

    /// Line text without the line terminator.
    pub text: &'a str,

    /// Length of the leading whitespace run.
    pub indent: usize,
}

impl<'a> Line<'a> {
    fn new(number: usize, text: &'a str) -> Self {
        let indent = text.len() - text.trim_start_matches([' ', '\t']).len();
        Self {
            number,
            text,
            indent,
        }
    }

    /// True for a zero-length line.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the line starts with whitespace.
    pub fn is_indented(&self) -> bool {
        self.indent > 0
    }

    /// Line text with the leading whitespace removed.
    pub fn content(&self) -> &'a str {
        &self.text[self.indent..]
    }
}

/// Lazy, restartable iterator over the lines of a text block.
///
/// Cloning a scanner yields an independent cursor at the same position, and
/// [`restart`](Self::restart) rewinds to the first line.
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    text: &'a str,
    pos: usize,
    number: usize,
}

impl<'a> LineScanner<'a> {
    /// Create a scanner over `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            number: 0,
        }
    }

    /// Rewind to the first line.
    pub fn restart(&mut self) {
        self.pos = 0;
        self.number = 0;
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.pos..];
        let (raw, advance) = match memchr(b'\n', rest.as_bytes()) {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.pos += advance;
        self.number += 1;

        let text = raw.strip_suffix('\r').unwrap_or(raw);
        Some(Line::new(self.number, text))
    }
}

/// Scan `text` line by line.
pub fn scan(text: &str) -> LineScanner<'_> {
    LineScanner::new(text)
}
