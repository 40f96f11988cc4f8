//! LLDP neighbor facts from `show lldp neighbors detail`.

use log::trace;
use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

use crate::parse::{FactTree, ParseContext, RuleTable, cap, or_na, scan, set_once};

/// Marker for a neighbor that did not advertise a system name.
pub const NO_SYSTEM_NAME: &str = "NA";

/// The remote end seen on one local interface.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LldpNeighbor {
    #[serde(rename = "Remote Chassis ID", serialize_with = "or_na")]
    pub chassis_id: Option<String>,
    #[serde(rename = "Remote Port", serialize_with = "or_na")]
    pub port: Option<String>,
    #[serde(rename = "Remote System Name", serialize_with = "name_or_marker")]
    pub system_name: Option<String>,
}

fn name_or_marker<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(NO_SYSTEM_NAME))
}

#[derive(Default)]
struct LldpScan {
    ctx: ParseContext<()>,
    neighbors: FactTree<LldpNeighbor>,
}

impl LldpScan {
    fn neighbor(&mut self) -> Option<&mut LldpNeighbor> {
        let key = self.ctx.current_entity()?;
        self.neighbors.get_mut(key)
    }

    fn has_neighbor(&self) -> bool {
        self.ctx.current_entity().is_some()
    }
}

static RULES: Lazy<RuleTable<LldpScan>> = Lazy::new(|| {
    RuleTable::<LldpScan>::builder()
        .open("interface", r"^Interface Name\s+:\s(\S+)", |s, c| {
            let name = cap(c, 1);
            s.ctx.open_entity(name);
            s.neighbors.get_or_create(name);
        })
        .field("chassis-id", r"^\s.*?Chassis id type\s+: (.*)", |s, c| {
            if let Some(n) = s.neighbor() {
                set_once(&mut n.chassis_id, cap(c, 1).to_string());
            }
        })
        .when(LldpScan::has_neighbor)
        .field("port-id", r"^\s.*?Port id type\s+: (.*)", |s, c| {
            if let Some(n) = s.neighbor() {
                set_once(&mut n.port, cap(c, 1).to_string());
            }
        })
        .when(LldpScan::has_neighbor)
        .field("system-name", r"^\s.*?System Name\s+: (.*)", |s, c| {
            if let Some(n) = s.neighbor() {
                set_once(&mut n.system_name, cap(c, 1).to_string());
            }
        })
        .when(LldpScan::has_neighbor)
        .build()
        .expect("built-in LLDP neighbor rules compile")
});

/// Parse neighbors keyed by local interface name.
///
/// A neighbor section starts at an `Interface Name : <name>` line and
/// continues over the indented lines after it.
pub fn parse_lldp_neighbors(text: &str) -> FactTree<LldpNeighbor> {
    let mut state = LldpScan::default();
    for line in scan(text).filter(|l| !l.is_blank()) {
        if RULES.dispatch(&mut state, line.text).is_none() {
            trace!("lldp: line {} unmatched: {:?}", line.number, line.text);
        }
    }
    state.neighbors
}
