//! Interactive SSH session running show commands on a device.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, info, warn};
use memchr::memrchr;
use regex::bytes::Regex;
use tokio::sync::Mutex;

use super::response::Response;
use super::{CommandSource, RawCommandResult};
use crate::channel::{PtyChannel, PtyConfig};
use crate::error::{Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// One SSH connection with one shell channel.
///
/// Commands run one at a time at the platform's default privilege level.
/// Use [`SharedSession`] to hand a session to concurrent collectors.
pub struct SshSession {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    prompt_pattern: Regex,
    command_timeout: Duration,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,
    current_privilege: Option<String>,
}

/// Text of the last line of `data`, which holds the prompt.
fn prompt_of(data: &[u8]) -> String {
    let start = memrchr(b'\n', data).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&data[start..]).trim().to_string()
}

impl SshSession {
    pub(crate) fn new(
        ssh_config: SshConfig,
        platform: PlatformDefinition,
        command_timeout: Duration,
    ) -> Result<Self> {
        let prompt_pattern = platform.prompt_pattern()?;
        Ok(Self {
            ssh_config,
            platform,
            prompt_pattern,
            command_timeout,
            transport: None,
            channel: None,
            current_privilege: None,
        })
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Name of the privilege level of the last prompt seen.
    pub fn current_privilege(&self) -> Option<&str> {
        self.current_privilege.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Whether the connection is open and its background task still runs.
    pub fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(SshTransport::is_alive)
    }

    /// Connect, wait for the first prompt, move to the default privilege
    /// level and run the platform's on-open commands.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(SessionError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        let channel = transport.open_channel().await?;
        let mut pty = PtyChannel::new(
            channel,
            PtyConfig {
                timeout: self.command_timeout,
                ..PtyConfig::default()
            },
        );

        let banner = pty
            .read_until(&self.prompt_pattern, self.ssh_config.timeout)
            .await?;
        self.transport = Some(transport);
        self.channel = Some(pty);
        self.track_privilege(&prompt_of(&banner));
        info!(
            "connected to {} ({})",
            self.ssh_config.socket_addr(),
            self.platform.name
        );

        let target = self.platform.default_privilege.clone();
        self.acquire_privilege(&target).await?;

        for command in self.platform.on_open_commands.clone() {
            let response = self.run_command(&command).await?;
            if !response.is_success() {
                warn!("on-open command '{}' was rejected: {}", command, response.result.trim());
            }
        }
        Ok(())
    }

    fn track_privilege(&mut self, prompt: &str) {
        match self.platform.level_for_prompt(prompt) {
            Some(level) => self.current_privilege = Some(level.name.clone()),
            None => debug!("prompt {:?} matches no privilege level", prompt),
        }
    }

    /// Send one line and read until the next prompt.
    async fn exchange(&mut self, line: &str) -> Result<(Bytes, String, Duration)> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;
        let start = Instant::now();
        channel.send(line).await?;
        let data = channel
            .read_until(&self.prompt_pattern, self.command_timeout)
            .await?;
        let elapsed = start.elapsed();
        let prompt = prompt_of(&data);
        self.track_privilege(&prompt);
        Ok((data, prompt, elapsed))
    }

    /// Move the CLI to privilege level `target`.
    pub async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let Some(current) = self.current_privilege.clone() else {
            return Err(SessionError::PrivilegeAcquisitionFailed {
                target: target.to_string(),
                prompt: String::new(),
            }
            .into());
        };
        if current == target {
            return Ok(());
        }

        let mut prompt = String::new();
        for command in self.platform.transition_commands(&current, target)? {
            debug!("privilege: sending '{}'", command);
            prompt = self.exchange(&command).await?.1;
        }

        if self.current_privilege.as_deref() != Some(target) {
            return Err(SessionError::PrivilegeAcquisitionFailed {
                target: target.to_string(),
                prompt,
            }
            .into());
        }
        Ok(())
    }

    /// Run `command` and wait for the prompt.
    pub async fn run_command(&mut self, command: &str) -> Result<Response> {
        let (data, prompt, elapsed) = self.exchange(command).await?;
        let raw_result = String::from_utf8_lossy(&data).to_string();
        let result = self.platform.normalize_output(&data, command);
        let verdict = self.platform.classify(&result);
        debug!(
            "'{}' finished in {:?}: {} bytes, {:?}",
            command,
            elapsed,
            result.len(),
            verdict
        );
        Ok(Response::new(command, result, raw_result, prompt, elapsed, verdict))
    }

    /// Run the platform's on-close commands and disconnect.
    pub async fn close(&mut self) -> Result<()> {
        if self.channel.is_some() {
            for command in self.platform.on_close_commands.clone() {
                if let Err(e) = self.exchange(&command).await {
                    debug!("on-close command '{}' failed: {}", command, e);
                }
            }
        }
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("closing channel: {}", e);
            }
        }
        self.current_privilege = None;
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    /// Run one command for the fact engine. Errors become `Failed`.
    async fn fetch_one(&mut self, command: &str) -> RawCommandResult {
        match self.run_command(command).await {
            Ok(response) => response.into_raw(),
            Err(e) => {
                warn!("'{}' failed: {}", command, e);
                RawCommandResult::Failed(e.to_string())
            }
        }
    }
}

impl CommandSource for SshSession {
    async fn fetch(&mut self, commands: &[String]) -> Vec<RawCommandResult> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            results.push(self.fetch_one(command).await);
        }
        results
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!(
                "session to {} dropped without close()",
                self.ssh_config.socket_addr()
            );
        }
    }
}

/// An [`SshSession`] shared between concurrent collectors.
///
/// The lock is taken per command, so categories collected at the same time
/// interleave their commands but never have two in flight on the channel.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SshSession>>,
}

impl SharedSession {
    pub fn new(session: SshSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session for direct use.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, SshSession> {
        self.inner.lock().await
    }

    /// Close the underlying session.
    pub async fn close(&self) -> Result<()> {
        self.inner.lock().await.close().await
    }
}

impl CommandSource for SharedSession {
    async fn fetch(&mut self, commands: &[String]) -> Vec<RawCommandResult> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let mut session = self.inner.lock().await;
            results.push(session.fetch_one(command).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_of() {
        assert_eq!(prompt_of(b"show hostname\r\nleaf-1\r\nleaf-1#"), "leaf-1#");
        assert_eq!(prompt_of(b"leaf-1>"), "leaf-1>");
        assert_eq!(prompt_of(b""), "");
    }

    #[test]
    fn test_closed_session_reports_failures() {
        let mut session = crate::session::SessionBuilder::new("192.0.2.10")
            .username("ocnos")
            .build()
            .unwrap();
        let results = tokio_test::block_on(session.fetch(&["show hostname".to_string()]));
        assert_eq!(
            results,
            vec![RawCommandResult::Failed(
                "Session error: Session not connected - call open() first".to_string()
            )]
        );
    }

    #[test]
    fn test_run_command_requires_open() {
        let mut session = crate::session::SessionBuilder::new("192.0.2.10")
            .username("ocnos")
            .build()
            .unwrap();
        assert!(tokio_test::block_on(session.run_command("show version")).is_err());
        assert!(tokio_test::block_on(session.close()).is_ok());
    }
}
