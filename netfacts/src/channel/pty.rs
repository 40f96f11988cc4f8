//! PTY channel for interactive device sessions.

use std::time::Duration;

use bytes::Bytes;
use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::{Instant, timeout_at};

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Default timeout for reads.
    pub timeout: Duration,

    /// Search depth for pattern matching.
    pub search_depth: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
        }
    }
}

/// Shell channel that sends lines and reads until a prompt shows up.
pub struct PtyChannel {
    channel: Channel<Msg>,
    config: PtyConfig,
    buffer: PatternBuffer,
}

impl PtyChannel {
    pub fn new(channel: Channel<Msg>, config: PtyConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            channel,
            config,
        }
    }

    /// Send `line` followed by a newline.
    pub async fn send(&mut self, line: &str) -> Result<()> {
        trace!("pty send: {:?}", line);
        let data = format!("{}\n", line);
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` matches the tail of the output, using the
    /// default timeout.
    pub async fn read_until_prompt(&mut self, pattern: &Regex) -> Result<Bytes> {
        self.read_until(pattern, self.config.timeout).await
    }

    /// Read until `pattern` matches the tail of the output. Returns the
    /// output up to and including the match.
    pub async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<Bytes> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(data) = self.buffer.take_through(pattern) {
                return Ok(data);
            }
            match timeout_at(deadline, self.channel.wait()).await {
                Err(_) => return Err(ChannelError::PromptTimeout(timeout).into()),
                Ok(None) | Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) => {
                    return Err(ChannelError::Closed.into());
                }
                Ok(Some(ChannelMsg::Data { data })) => {
                    trace!("pty read: {} bytes", data.len());
                    self.buffer.extend(&data);
                }
                Ok(Some(ChannelMsg::ExtendedData { data, .. })) => {
                    self.buffer.extend(&data);
                }
                Ok(Some(_)) => {}
            }
        }
    }

    /// Drop anything buffered but not yet returned.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Close the channel.
    pub async fn close(self) -> Result<()> {
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
