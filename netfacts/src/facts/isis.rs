//! IS-IS adjacency facts from `show clns neighbors`.
//!
//! OcNOS prints one table per IS-IS instance, each introduced by a
//! `Tag <name>: VRF : <vrf>` line and a `System Id ...` header row.

use log::trace;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::parse::{FactTree, RuleTable, cap, scan};

/// One row of the CLNS neighbor table.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IsisNeighbor {
    pub interface: String,
    #[serde(rename = "SNPA")]
    pub snpa: String,
    pub state: String,
    pub holdtime: String,
    #[serde(rename = "Type")]
    pub level: String,
    pub protocol: String,
}

#[derive(Default)]
struct IsisScan {
    in_table: bool,
    neighbors: FactTree<IsisNeighbor>,
}

impl IsisScan {
    fn in_table(&self) -> bool {
        self.in_table
    }
}

static RULES: Lazy<RuleTable<IsisScan>> = Lazy::new(|| {
    RuleTable::<IsisScan>::builder()
        .scope("tag", r"^Tag \S+", |s, _| s.in_table = false)
        .scope("header", r"^System Id\s", |s, _| s.in_table = true)
        .field(
            "row",
            r"^\s*(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)",
            |s, c| {
                *s.neighbors.get_or_create(cap(c, 1)) = IsisNeighbor {
                    interface: cap(c, 2).to_string(),
                    snpa: cap(c, 3).to_string(),
                    state: cap(c, 4).to_string(),
                    holdtime: cap(c, 5).to_string(),
                    level: cap(c, 6).to_string(),
                    protocol: cap(c, 7).to_string(),
                };
            },
        )
        .when(IsisScan::in_table)
        .build()
        .expect("built-in IS-IS neighbor rules compile")
});

/// Parse every neighbor table, keyed by system id.
///
/// Rows are only read between a `System Id` header and the next `Tag` line.
/// Rows with fewer than seven columns are ignored; a system id seen in more
/// than one table keeps its last row.
pub fn parse_isis_neighbors(text: &str) -> FactTree<IsisNeighbor> {
    let mut state = IsisScan::default();
    for line in scan(text) {
        if RULES.dispatch(&mut state, line.text).is_none() {
            trace!("isis: line {} skipped: {:?}", line.number, line.text);
        }
    }
    state.neighbors
}
