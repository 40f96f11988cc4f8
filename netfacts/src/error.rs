//! Error types for netfacts.
//!
//! Only the session side can fail. Fact extraction never returns an error:
//! unsupported commands, transport failures and parse anomalies are reported
//! as warnings on the [`FactReport`](crate::facts::FactReport) instead.

use std::io;
use thiserror::Error;

/// Main error type for netfacts operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Platform definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A fact category name that is not known
    #[error("Unknown fact category '{name}'")]
    UnknownCategory { name: String },
}

/// Transport layer errors (SSH connection, authentication, host keys).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Private key could not be loaded
    #[error("SSH key error: {0}")]
    Key(String),

    /// The server presented a key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// The server is not in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (PTY operations, prompt matching).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Prompt was not seen before the deadline
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(std::time::Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session layer errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not connected
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The device ended up at a privilege level other than the one requested
    #[error("Failed to reach privilege level '{target}' (prompt '{prompt}')")]
    PrivilegeAcquisitionFailed { target: String, prompt: String },
}

/// Platform definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// Platform name not found in the registry
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// Platform name registered twice
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// A prompt pattern failed to compile
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using netfacts' Error.
pub type Result<T> = std::result::Result<T, Error>;
