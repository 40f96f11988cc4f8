//! Link aggregation facts from `show etherchannel summary`.
//!
//! Aggregators are separated by dashed rule lines. Each block carries the
//! aggregator type, its port and id, the admin key and one `Link: X sync: Y`
//! line per member.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::parse::{RuleTable, cap, scan};

/// One aggregator and its member links.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregator {
    #[serde(rename = "AggregatorType", skip_serializing_if = "Option::is_none")]
    pub aggregator_type: Option<String>,
    #[serde(rename = "AggregatorPort", skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(rename = "AggregatorID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "AdminKey", skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
    #[serde(rename = "link")]
    pub links: Vec<LagMember>,
}

impl Aggregator {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A member link and its LACP sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LagMember {
    #[serde(rename = "Link")]
    pub link: String,
    pub sync: String,
}

#[derive(Default)]
struct LagScan {
    current: Aggregator,
    done: Vec<Aggregator>,
}

impl LagScan {
    fn flush(&mut self) {
        let aggregator = std::mem::take(&mut self.current);
        if !aggregator.is_empty() {
            self.done.push(aggregator);
        }
    }
}

static RULES: Lazy<RuleTable<LagScan>> = Lazy::new(|| {
    RuleTable::<LagScan>::builder()
        .scope("separator", r"^-+$", |s, _| s.flush())
        .field("type", r"^\s+Aggregator Type: (\S+)", |s, c| {
            s.current.aggregator_type = Some(cap(c, 1).to_string())
        })
        .field("aggregator", r"^\s*Aggregator\s+(\S+)\s+(\S+)", |s, c| {
            s.current.port = Some(cap(c, 1).to_string());
            s.current.id = Some(cap(c, 2).to_string());
        })
        .field("admin-key", r"^\s+Admin Key: (.+)$", |s, c| {
            s.current.admin_key = Some(cap(c, 1).to_string())
        })
        .field("link", r"^\s+Link: (.+) sync: (.*)$", |s, c| {
            s.current.links.push(LagMember {
                link: cap(c, 1).to_string(),
                sync: cap(c, 2).to_string(),
            })
        })
        .build()
        .expect("built-in LAG rules compile")
});

/// Parse all aggregators in output order.
///
/// Separator lines with nothing collected before them produce no record.
/// A block still open at the end of the input is kept.
pub fn parse_lag(text: &str) -> Vec<Aggregator> {
    let mut state = LagScan::default();
    for line in scan(text) {
        RULES.dispatch(&mut state, line.text);
    }
    state.flush();
    state.done
}
