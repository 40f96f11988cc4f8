//! Builder for SSH sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::ssh::SshSession;
use crate::error::{Result, SessionError};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for [`SshSession`].
///
/// ```rust,no_run
/// use netfacts::SessionBuilder;
///
/// # async fn example() -> Result<(), netfacts::Error> {
/// let mut session = SessionBuilder::new("192.0.2.10")
///     .username("ocnos")
///     .password("ocnos")
///     .build()?;
/// session.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    platform_name: String,
    custom_platform: Option<PlatformDefinition>,
    timeout: Duration,
    command_timeout: Option<Duration>,
    terminal_size: Option<(u32, u32)>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionBuilder {
    /// Start a builder for `host`, port 22, platform `ocnos`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            platform_name: "ocnos".to_string(),
            custom_platform: None,
            timeout: Duration::from_secs(30),
            command_timeout: None,
            terminal_size: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Use password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Use private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Use an encrypted private key.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Name of a platform in the global [`PlatformRegistry`].
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = platform.into();
        self
    }

    /// Use a platform definition that is not registered.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Connection timeout. Also the per-command timeout unless
    /// [`command_timeout`](Self::command_timeout) is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long to wait for the prompt after a command.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Override the platform's terminal size.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_size = Some((width, height));
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the session. Nothing is connected until
    /// [`SshSession::open`] is called.
    pub fn build(self) -> Result<SshSession> {
        let username = self.username.ok_or_else(|| SessionError::InvalidConfig {
            message: "username is required".to_string(),
        })?;
        if self.host.trim().is_empty() {
            return Err(SessionError::InvalidConfig {
                message: "host is required".to_string(),
            }
            .into());
        }

        let platform = match self.custom_platform {
            Some(custom) => custom,
            None => PlatformRegistry::lookup(&self.platform_name)?,
        };
        platform.validate()?;

        let (terminal_width, terminal_height) = self
            .terminal_size
            .unwrap_or((platform.terminal_width, platform.terminal_height));

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_width,
            terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let command_timeout = self.command_timeout.unwrap_or(self.timeout);
        SshSession::new(ssh_config, platform, command_timeout)
    }
}
