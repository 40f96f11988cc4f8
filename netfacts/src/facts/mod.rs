//! Fact categories, their parsers and the category driver.
//!
//! Each category issues an ordered set of show commands (see
//! [`CommandRegistry`]) and turns the raw responses into a typed fact
//! record. Extraction never fails: unsupported commands, transport failures
//! and parse anomalies end up as warnings on the [`FactReport`].

pub mod bgp;
pub mod config;
pub mod hardware;
pub mod interfaces;
pub mod isis;
pub mod lag;
pub mod lldp;
pub mod ping;
pub mod system;

mod collector;
mod registry;

pub use collector::{Collection, Collector};
pub use registry::{CommandRegistry, CommandSet, CommandSlot, extract};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::parse::FactTree;
use bgp::BgpNeighbor;
use config::ConfigFacts;
use hardware::HardwareFacts;
use interfaces::InterfaceFacts;
use isis::IsisNeighbor;
use system::DefaultFacts;

/// A named group of device state collected with one command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactCategory {
    Default,
    Hardware,
    Config,
    Interfaces,
    BgpNeighbor,
    IsisNeighbor,
}

impl FactCategory {
    /// Every category, in collection order.
    pub const ALL: [FactCategory; 6] = [
        FactCategory::Default,
        FactCategory::Hardware,
        FactCategory::Config,
        FactCategory::Interfaces,
        FactCategory::BgpNeighbor,
        FactCategory::IsisNeighbor,
    ];

    /// Canonical category name.
    pub fn name(self) -> &'static str {
        match self {
            FactCategory::Default => "default",
            FactCategory::Hardware => "hardware",
            FactCategory::Config => "config",
            FactCategory::Interfaces => "interfaces",
            FactCategory::BgpNeighbor => "bgp-neighbor",
            FactCategory::IsisNeighbor => "isis-neighbor",
        }
    }

    /// Resolve a list of subset selectors into categories.
    ///
    /// `all` selects every category, a `!` prefix excludes one (or all with
    /// `!all`). When nothing is positively selected, every category not
    /// excluded is returned. The result follows [`FactCategory::ALL`] order.
    pub fn select<S: AsRef<str>>(selectors: &[S]) -> Result<Vec<FactCategory>> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for selector in selectors {
            let selector = selector.as_ref().trim();
            let (list, name) = match selector.strip_prefix('!') {
                Some(name) => (&mut exclude, name),
                None => (&mut include, selector),
            };
            if name == "all" {
                list.extend(Self::ALL);
            } else {
                list.push(name.parse()?);
            }
        }
        if include.is_empty() {
            include.extend(Self::ALL);
        }
        Ok(Self::ALL
            .into_iter()
            .filter(|c| include.contains(c) && !exclude.contains(c))
            .collect())
    }
}

impl fmt::Display for FactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FactCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| Error::UnknownCategory {
                name: s.to_string(),
            })
    }
}

/// BGP neighbor facts. The map is absent when the command gave no output.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BgpNeighborFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp_neighbor: Option<FactTree<BgpNeighbor>>,
}

/// IS-IS neighbor facts. The map is absent when the command gave no output.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IsisNeighborFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isis_neighbor: Option<FactTree<IsisNeighbor>>,
}

/// Typed facts of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Facts {
    Default(DefaultFacts),
    Hardware(HardwareFacts),
    Config(ConfigFacts),
    Interfaces(InterfaceFacts),
    BgpNeighbor(BgpNeighborFacts),
    IsisNeighbor(IsisNeighborFacts),
}

impl Facts {
    /// Category these facts belong to.
    pub fn category(&self) -> FactCategory {
        match self {
            Facts::Default(_) => FactCategory::Default,
            Facts::Hardware(_) => FactCategory::Hardware,
            Facts::Config(_) => FactCategory::Config,
            Facts::Interfaces(_) => FactCategory::Interfaces,
            Facts::BgpNeighbor(_) => FactCategory::BgpNeighbor,
            Facts::IsisNeighbor(_) => FactCategory::IsisNeighbor,
        }
    }
}

/// Facts of one category plus the warnings raised while collecting them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactReport {
    pub category: FactCategory,
    pub facts: Facts,
    pub warnings: Vec<String>,
}

impl FactReport {
    /// Top-level fact keys mapped to their JSON values.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(&self.facts) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
