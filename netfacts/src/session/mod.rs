//! Sources of raw command output.
//!
//! The fact engine never talks to a device directly. It asks a
//! [`CommandSource`] for the output of an ordered batch of commands and gets
//! back one [`RawCommandResult`] per command. [`SshSession`] and
//! [`SharedSession`] run the commands on a live device, [`ReplaySource`]
//! answers from canned output.

mod builder;
pub(crate) mod response;
mod replay;
mod ssh;

pub use builder::SessionBuilder;
pub use replay::ReplaySource;
pub use response::Response;
pub use ssh::{SharedSession, SshSession};

use std::future::Future;

/// Outcome of a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCommandResult {
    /// Output text with the echo and trailing prompt removed.
    Text(String),
    /// The device rejected the command as unknown.
    Unsupported,
    /// The command could not be run or its output reported an error.
    Failed(String),
}

impl RawCommandResult {
    /// Output text, if the command produced any.
    pub fn text(&self) -> Option<&str> {
        match self {
            RawCommandResult::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Something that can run show commands and hand back their output.
pub trait CommandSource: Send {
    /// Run `commands` in order. The returned vector is index-aligned with
    /// `commands`; a command that fails does not stop the ones after it.
    fn fetch(
        &mut self,
        commands: &[String],
    ) -> impl Future<Output = Vec<RawCommandResult>> + Send;
}
