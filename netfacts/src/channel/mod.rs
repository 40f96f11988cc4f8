//! Channel layer for prompt detection over a PTY.
//!
//! Device output is accumulated in a [`PatternBuffer`] with ANSI escape
//! sequences removed, and only the tail of the buffer is searched for the
//! prompt.

mod buffer;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig};
