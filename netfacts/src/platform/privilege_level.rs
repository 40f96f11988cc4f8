//! Privilege level definition.

use regex::bytes::Regex;

/// A CLI mode of a device, recognised by its prompt.
///
/// Levels form a tree: each level but the root names its parent and the
/// commands that move between the two.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this level (e.g. "exec", "privileged", "configuration").
    pub name: String,

    /// Regex matching the prompt of this level.
    pub pattern: Regex,

    /// Name of the parent level.
    pub previous_priv: Option<String>,

    /// Command that reaches this level from the parent.
    pub escalate_command: Option<String>,

    /// Command that returns from this level to the parent.
    pub deescalate_command: Option<String>,

    /// Strings that must NOT be in the prompt for this level to match.
    /// `#` ends both the privileged and the configuration prompt.
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            previous_priv: None,
            escalate_command: None,
            deescalate_command: None,
            not_contains: vec![],
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}
