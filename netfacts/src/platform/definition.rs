//! Platform definition for vendor-specific configurations.

use indexmap::IndexMap;
use memchr::{memchr, memrchr};
use regex::bytes::Regex;

use super::privilege_level::PrivilegeLevel;
use crate::error::{PlatformError, Result};

/// How the platform judged a command's output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Ok,
    /// Output contained an unsupported-command marker.
    Unsupported(String),
    /// Output contained a failure marker.
    Failed(String),
}

/// Everything the session needs to know about a device family: its
/// prompts and modes, the commands to run after login, and how to tell an
/// error message from real output.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g. "ocnos").
    pub name: String,

    /// Privilege levels, in prompt-matching order.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level commands are run at.
    pub default_privilege: String,

    /// Output markers meaning the command does not exist on this device.
    pub unsupported_markers: Vec<String>,

    /// Output markers meaning the command was rejected.
    pub failure_markers: Vec<String>,

    /// Commands to run when the session is opened.
    pub on_open_commands: Vec<String>,

    /// Commands to run before the session is closed.
    pub on_close_commands: Vec<String>,

    pub terminal_width: u32,
    pub terminal_height: u32,
}

impl PlatformDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            unsupported_markers: vec![],
            failure_markers: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    pub fn with_unsupported_marker(mut self, marker: impl Into<String>) -> Self {
        self.unsupported_markers.push(marker.into());
        self
    }

    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_markers.push(marker.into());
        self
    }

    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// Check that the definition is usable by a session.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> {
            Err(PlatformError::InvalidDefinition { message }.into())
        };
        if self.privilege_levels.is_empty() {
            return invalid(format!("platform '{}' has no privilege levels", self.name));
        }
        if !self.privilege_levels.contains_key(&self.default_privilege) {
            return invalid(format!(
                "default privilege '{}' is not defined",
                self.default_privilege
            ));
        }
        for level in self.privilege_levels.values() {
            if let Some(parent) = &level.previous_priv {
                if !self.privilege_levels.contains_key(parent) {
                    return invalid(format!(
                        "level '{}' has unknown parent '{}'",
                        level.name, parent
                    ));
                }
            }
        }
        Ok(())
    }

    /// One regex matching the prompt of any level.
    pub fn prompt_pattern(&self) -> Result<Regex> {
        let combined = self
            .privilege_levels
            .values()
            .map(|level| format!("(?:{})", level.pattern.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Regex::new(&combined).map_err(PlatformError::InvalidPattern)?)
    }

    /// The first level whose prompt matches `prompt`.
    pub fn level_for_prompt(&self, prompt: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.values().find(|level| level.matches(prompt))
    }

    /// Level names from `name` up to the root, `name` first.
    fn ancestry<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        let mut chain = vec![name];
        let mut current = self.privilege_levels.get(name);
        while let Some(parent) = current.and_then(|l| l.previous_priv.as_deref()) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.privilege_levels.get(parent);
        }
        chain
    }

    /// Commands that move the CLI from level `from` to level `to`.
    pub fn transition_commands(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let no_path = || PlatformError::InvalidDefinition {
            message: format!("no path from privilege '{}' to '{}'", from, to),
        };
        let up = self.ancestry(from);
        let down = self.ancestry(to);
        let common = up
            .iter()
            .position(|name| down.contains(name))
            .ok_or_else(no_path)?;
        let common_name = up[common];

        let mut commands = Vec::new();
        for name in &up[..common] {
            let level = self.privilege_levels.get(*name).ok_or_else(no_path)?;
            commands.push(level.deescalate_command.clone().ok_or_else(no_path)?);
        }
        let descend = down.iter().position(|n| *n == common_name).ok_or_else(no_path)?;
        for name in down[..descend].iter().rev() {
            let level = self.privilege_levels.get(*name).ok_or_else(no_path)?;
            commands.push(level.escalate_command.clone().ok_or_else(no_path)?);
        }
        Ok(commands)
    }

    /// Strip the command echo from the front and the prompt line from the
    /// end of `raw`, and turn CRLF into LF.
    pub fn normalize_output(&self, raw: &[u8], command: &str) -> String {
        let mut body = raw;
        if let Some(eol) = memchr(b'\n', body) {
            let first = String::from_utf8_lossy(&body[..eol]);
            if first.trim_end().ends_with(command.trim()) {
                body = &body[eol + 1..];
            }
        }
        body = match memrchr(b'\n', body) {
            Some(eol) => &body[..=eol],
            None => &[],
        };
        String::from_utf8_lossy(body).replace("\r\n", "\n")
    }

    /// Judge command output by the platform's markers. Unsupported markers
    /// are checked first.
    pub fn classify(&self, output: &str) -> Verdict {
        if let Some(marker) = self.unsupported_markers.iter().find(|m| output.contains(m.as_str())) {
            return Verdict::Unsupported(marker.clone());
        }
        if let Some(marker) = self.failure_markers.iter().find(|m| output.contains(m.as_str())) {
            return Verdict::Failed(marker.clone());
        }
        Verdict::Ok
    }
}
