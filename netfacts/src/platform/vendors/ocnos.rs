//! IP Infusion OcNOS platform definition.
//!
//! OcNOS has an industry-standard CLI: `leaf-1>` in exec mode,
//! `leaf-1#` once enabled, and `leaf-1(config)#` (or a sub-mode such as
//! `(config-if)`) in configuration mode.

use crate::platform::{PlatformDefinition, PrivilegeLevel};

pub const EXEC: &str = "exec";
pub const PRIVILEGED: &str = "privileged";
pub const CONFIGURATION: &str = "configuration";

fn levels() -> Result<Vec<PrivilegeLevel>, regex::Error> {
    let exec = PrivilegeLevel::new(EXEC, r"(?m)^[\w.\-@/:]{1,63}>\s*$")?;

    let privileged = PrivilegeLevel::new(PRIVILEGED, r"(?m)^[\w.\-@/:]{1,63}#\s*$")?
        .with_parent(EXEC)
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_not_contains("(config");

    let configuration =
        PrivilegeLevel::new(CONFIGURATION, r"(?m)^[\w.\-@/:]{1,63}\(config[\w.\-@/:+]*\)#\s*$")?
            .with_parent(PRIVILEGED)
            .with_escalate("configure terminal")
            .with_deescalate("end");

    Ok(vec![exec, privileged, configuration])
}

/// Create the OcNOS platform definition.
pub fn platform() -> PlatformDefinition {
    let levels = levels().expect("built-in OcNOS prompt patterns compile");

    levels
        .into_iter()
        .fold(PlatformDefinition::new("ocnos"), |p, level| p.with_privilege(level))
        .with_default_privilege(PRIVILEGED)
        .with_on_open_command("terminal length 0")
        .with_unsupported_marker("Command not supported")
        .with_unsupported_marker("% Invalid input")
        .with_unsupported_marker("% Unrecognized command")
        .with_failure_marker("% Ambiguous command")
        .with_failure_marker("% Incomplete command")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Verdict;

    #[test]
    fn test_ocnos_platform() {
        let platform = platform();
        assert_eq!(platform.name, "ocnos");
        assert_eq!(platform.privilege_levels.len(), 3);
        assert_eq!(platform.on_open_commands, vec!["terminal length 0"]);
        assert!(platform.validate().is_ok());
    }

    #[test]
    fn test_prompts() {
        let platform = platform();
        let level = |prompt: &str| platform.level_for_prompt(prompt).map(|l| l.name.as_str());
        assert_eq!(level("leaf-1>"), Some(EXEC));
        assert_eq!(level("leaf-1#"), Some(PRIVILEGED));
        assert_eq!(level("OcNOS#"), Some(PRIVILEGED));
        assert_eq!(level("leaf-1(config)#"), Some(CONFIGURATION));
        assert_eq!(level("leaf-1(config-if)#"), Some(CONFIGURATION));
        assert_eq!(level("Password:"), None);
    }

    #[test]
    fn test_prompt_pattern_finds_prompt_after_output() {
        let pattern = platform().prompt_pattern().unwrap();
        assert!(pattern.is_match(b"show hostname\r\nleaf-1\r\nleaf-1#"));
        assert!(!pattern.is_match(b"Interface xe1\r\n  Hardware is ETH"));
    }

    #[test]
    fn test_transitions() {
        let platform = platform();
        assert_eq!(
            platform.transition_commands(EXEC, PRIVILEGED).unwrap(),
            vec!["enable"]
        );
        assert_eq!(
            platform.transition_commands(CONFIGURATION, PRIVILEGED).unwrap(),
            vec!["end"]
        );
    }

    #[test]
    fn test_markers() {
        let platform = platform();
        assert_eq!(
            platform.classify("% Invalid input detected at '^' marker."),
            Verdict::Unsupported("% Invalid input".into())
        );
        assert_eq!(
            platform.classify("% Ambiguous command:  \"show in\""),
            Verdict::Failed("% Ambiguous command".into())
        );
        assert_eq!(platform.classify("Hostname: leaf-1"), Verdict::Ok);
    }
}
