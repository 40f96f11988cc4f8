//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication, host-key checking and opening the
//! shell channel the session runs commands on.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
