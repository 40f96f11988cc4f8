//! Command registry and the per-category extraction driver.

use indexmap::IndexMap;
use log::{debug, warn};

use super::bgp::parse_bgp_neighbors;
use super::config::{NO_CONFIG_WARNING, parse_config};
use super::hardware::{HardwareSources, parse_hardware};
use super::interfaces::{InterfaceSources, parse_interfaces};
use super::isis::parse_isis_neighbors;
use super::system::parse_default;
use super::{BgpNeighborFacts, FactCategory, FactReport, Facts, IsisNeighborFacts};
use crate::parse::Anomalies;
use crate::session::RawCommandResult;

/// One command of a category, addressed by a stable slot key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSlot {
    pub key: &'static str,
    pub command: String,
}

/// Ordered commands issued for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    category: FactCategory,
    slots: Vec<CommandSlot>,
}

impl CommandSet {
    /// Create an empty command set.
    pub fn new(category: FactCategory) -> Self {
        Self {
            category,
            slots: Vec::new(),
        }
    }

    /// Append a slot.
    pub fn with_slot(mut self, key: &'static str, command: impl Into<String>) -> Self {
        self.set_command(key, command.into());
        self
    }

    /// Replace the command of slot `key`, appending the slot if missing.
    pub fn set_command(&mut self, key: &'static str, command: String) {
        match self.slots.iter_mut().find(|s| s.key == key) {
            Some(slot) => slot.command = command,
            None => self.slots.push(CommandSlot { key, command }),
        }
    }

    pub fn category(&self) -> FactCategory {
        self.category
    }

    pub fn slots(&self) -> &[CommandSlot] {
        &self.slots
    }

    /// Command text of slot `key`.
    pub fn command(&self, key: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.command.as_str())
    }

    /// Command texts in issue order.
    pub fn commands(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.command.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Command sets for every category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegistry {
    sets: IndexMap<FactCategory, CommandSet>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::ocnos()
    }
}

impl CommandRegistry {
    /// A registry with no command sets.
    pub fn empty() -> Self {
        Self {
            sets: IndexMap::new(),
        }
    }

    /// The stock OcNOS show commands.
    pub fn ocnos() -> Self {
        Self::empty()
            .with_set(
                CommandSet::new(FactCategory::Default)
                    .with_slot("version", "show version")
                    .with_slot("hostname", "show hostname"),
            )
            .with_set(
                CommandSet::new(FactCategory::Hardware)
                    .with_slot("memory", "show hardware-information memory")
                    .with_slot("board", "show system-information board-info")
                    .with_slot("cpu", "show system-information cpu")
                    .with_slot("cpu-load", "show system-information cpu-load")
                    .with_slot("sensor", "show system sensor")
                    .with_slot("led", "show hardware-information led"),
            )
            .with_set(CommandSet::new(FactCategory::Config).with_slot("running", "show running-config"))
            .with_set(
                CommandSet::new(FactCategory::Interfaces)
                    .with_slot("interface", "show interface")
                    .with_slot("brief", "show interface brief")
                    .with_slot("lldp", "show lldp neighbors detail")
                    .with_slot("counters", "show interface counters")
                    .with_slot("transceiver", "show interface transceiver")
                    .with_slot("lag", "show etherchannel summary"),
            )
            .with_set(CommandSet::new(FactCategory::BgpNeighbor).with_slot("neighbor", "show bgp neighbor"))
            .with_set(
                CommandSet::new(FactCategory::IsisNeighbor).with_slot("neighbor", "show clns neighbors"),
            )
    }

    /// Add or replace the command set of its category.
    pub fn with_set(mut self, set: CommandSet) -> Self {
        self.sets.insert(set.category(), set);
        self
    }

    /// Override the command text of one slot.
    pub fn with_command(
        mut self,
        category: FactCategory,
        key: &'static str,
        command: impl Into<String>,
    ) -> Self {
        self.sets
            .entry(category)
            .or_insert_with(|| CommandSet::new(category))
            .set_command(key, command.into());
        self
    }

    /// Command set of `category`.
    pub fn get(&self, category: FactCategory) -> Option<&CommandSet> {
        self.sets.get(&category)
    }
}

/// Responses of one command set, looked up by slot key.
struct Responses<'a> {
    raw: IndexMap<&'static str, Option<&'a str>>,
}

impl<'a> Responses<'a> {
    /// Output text, including blank output.
    fn raw(&self, key: &str) -> Option<&'a str> {
        self.raw.get(key).copied().flatten()
    }

    /// Output text with blank output treated as missing.
    fn text(&self, key: &str) -> Option<&'a str> {
        self.raw(key).filter(|t| !t.trim().is_empty())
    }
}

/// Turn the raw results of `set` into a fact report.
///
/// `results` is index-aligned with the slots of `set`. A missing result
/// counts as a failed command. Nothing here can fail: every degraded source
/// becomes a warning and the facts that depend on it keep their defaults.
pub fn extract(category: FactCategory, set: &CommandSet, results: &[RawCommandResult]) -> FactReport {
    let mut warnings = Vec::new();
    let mut raw = IndexMap::new();

    for (i, slot) in set.slots().iter().enumerate() {
        let text = match results.get(i) {
            Some(RawCommandResult::Text(text)) => Some(text.as_str()),
            Some(RawCommandResult::Unsupported) => {
                debug!("{}: command not supported: {}", category, slot.command);
                warnings.push(format!("Command not supported: {}", slot.command));
                None
            }
            Some(RawCommandResult::Failed(reason)) => {
                warn!("{}: command '{}' failed: {}", category, slot.command, reason);
                warnings.push(format!(
                    "Failed to execute command '{}': {}",
                    slot.command, reason
                ));
                None
            }
            None => {
                warn!("{}: no response for '{}'", category, slot.command);
                warnings.push(format!(
                    "Failed to execute command '{}': no response",
                    slot.command
                ));
                None
            }
        };
        raw.insert(slot.key, text);
    }

    let responses = Responses { raw };
    let mut anomalies = Anomalies::default();
    let facts = match category {
        FactCategory::Default => Facts::Default(parse_default(
            responses.text("version"),
            responses.raw("hostname"),
        )),
        FactCategory::Hardware => Facts::Hardware(parse_hardware(
            &HardwareSources {
                memory: responses.text("memory"),
                board: responses.text("board"),
                cpu: responses.text("cpu"),
                cpu_load: responses.text("cpu-load"),
                sensor: responses.text("sensor"),
                led: responses.text("led"),
            },
            &mut anomalies,
        )),
        FactCategory::Config => {
            let running = responses.raw("running");
            if running.is_some_and(|text| text.trim().is_empty()) {
                warnings.push(NO_CONFIG_WARNING.to_string());
            }
            Facts::Config(parse_config(running))
        }
        FactCategory::Interfaces => Facts::Interfaces(parse_interfaces(
            &InterfaceSources {
                interface: responses.text("interface"),
                brief: responses.text("brief"),
                lldp: responses.text("lldp"),
                counters: responses.text("counters"),
                transceiver: responses.text("transceiver"),
                lag: responses.text("lag"),
            },
            &mut anomalies,
        )),
        FactCategory::BgpNeighbor => {
            let bgp_neighbor = responses.text("neighbor").map(|text| {
                let (neighbors, found) = parse_bgp_neighbors(text);
                anomalies.absorb(found);
                neighbors
            });
            Facts::BgpNeighbor(BgpNeighborFacts { bgp_neighbor })
        }
        FactCategory::IsisNeighbor => Facts::IsisNeighbor(IsisNeighborFacts {
            isis_neighbor: responses.text("neighbor").map(parse_isis_neighbors),
        }),
    };

    for message in anomalies.into_messages() {
        debug!("{}: {}", category, message);
        warnings.push(message);
    }

    FactReport {
        category,
        facts,
        warnings,
    }
}
