//! Running configuration fact.

use serde::Serialize;

use crate::parse::or_na;

/// Warning recorded when the device returned no configuration text.
pub const NO_CONFIG_WARNING: &str = "No configuration data received";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFacts {
    #[serde(serialize_with = "or_na")]
    pub config: Option<String>,
}

/// Keep the `show running-config` text as is. Blank output is treated as
/// missing.
pub fn parse_config(running: Option<&str>) -> ConfigFacts {
    ConfigFacts {
        config: running
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string),
    }
}
