//! Interface facts.
//!
//! Interface state is spread over several commands. The primary
//! `show interface` block is split into one text blob per interface, then
//! the other commands are overlaid onto those blobs as synthetic marker lines:
//!
//! * `Status up|down` from `show interface brief`,
//! * `COUNTERS <line>` from `show interface counters`,
//! * `TRANSCEIVERS<n> <line>` from `show interface transceiver`, where `n` is
//!   the lane index within the interface.
//!
//! A final pass extracts an [`Interface`] record from each merged blob.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use super::lag::{Aggregator, parse_lag};
use super::lldp::{LldpNeighbor, parse_lldp_neighbors};
use crate::parse::{Anomalies, FactTree, ParseContext, RuleTable, cap, first_capture, or_na, scan, set_once};

const COUNTERS_MARKER: &str = "COUNTERS";
const TRANSCEIVERS_MARKER: &str = "TRANSCEIVERS";

static INTERFACE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Interface (.*)").unwrap());
static BRIEF_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+).*(up|down)").unwrap());
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-+$").unwrap());
static TRANSCEIVER_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+)\s+(.*)$").unwrap());

/// Facts for one interface.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Interface {
    #[serde(serialize_with = "or_na")]
    pub description: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub macaddress: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub mtu: Option<u64>,
    #[serde(serialize_with = "or_na")]
    pub bandwidth: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub mediatype: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub duplex: Option<String>,
    pub ipv4: Vec<IpAddress>,
    pub ipv6: Vec<IpAddress>,
    #[serde(serialize_with = "or_na")]
    pub lineprotocol: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub portmode: Option<String>,
    pub counter: IndexMap<String, String>,
    pub transceiver: Vec<TransceiverLane>,
    #[serde(serialize_with = "or_na")]
    pub vrf: Option<String>,
}

/// An interface address with its prefix length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAddress {
    pub address: String,
    pub masklen: u64,
}

/// Optical metrics of one transceiver lane.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransceiverLane {
    #[serde(rename = "DDM")]
    pub ddm: String,
    pub temp: String,
    pub voltage: String,
    pub lane: String,
    pub current: String,
    pub tx_power: String,
    pub rx_power: String,
}

/// Raw outputs feeding the interfaces category. `None` marks a command
/// that was unsupported or failed.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceSources<'a> {
    pub interface: Option<&'a str>,
    pub brief: Option<&'a str>,
    pub lldp: Option<&'a str>,
    pub counters: Option<&'a str>,
    pub transceiver: Option<&'a str>,
    pub lag: Option<&'a str>,
}

/// Everything the interfaces category produces.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct InterfaceFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<FactTree<Interface>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<FactTree<LldpNeighbor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lagg: Option<Vec<Aggregator>>,
    pub all_ipv4_addresses: IndexSet<String>,
    pub all_ipv6_addresses: IndexSet<String>,
}

/// Per-interface text blobs assembled from several commands.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InterfaceBlobs {
    blobs: IndexMap<String, String>,
}

impl InterfaceBlobs {
    /// Split `show interface` output into one blob per `Interface <name>`
    /// header. Indented lines continue the current interface.
    pub fn from_primary(text: &str) -> Self {
        let mut blobs: IndexMap<String, String> = IndexMap::new();
        let mut current: Option<String> = None;
        for line in scan(text) {
            if line.is_blank() {
                continue;
            }
            if line.is_indented() {
                if let Some(blob) = current.as_ref().and_then(|k| blobs.get_mut(k)) {
                    push_line(blob, line.text);
                }
                continue;
            }
            if let Some(name) = first_capture(&INTERFACE_HEADER, line.text) {
                blobs.insert(name.to_string(), line.text.to_string());
                current = Some(name.to_string());
            }
        }
        Self { blobs }
    }

    /// Overlay the oper status from `show interface brief`.
    pub fn overlay_brief(&mut self, text: &str) {
        for line in scan(text) {
            if let Some(c) = BRIEF_ROW.captures(line.text) {
                self.append(cap(&c, 1), &format!("Status {}", cap(&c, 2)));
            }
        }
    }

    /// Overlay `show interface counters`. The `CPU` pseudo-interface is
    /// skipped and a blank line ends the current interface.
    pub fn overlay_counters(&mut self, text: &str) {
        let mut current: Option<&str> = None;
        for line in scan(text) {
            if line.is_blank() {
                current = None;
                continue;
            }
            match current {
                Some(name) if line.is_indented() => {
                    self.append(name, &format!("{COUNTERS_MARKER} {}", line.text));
                }
                _ => {
                    if let Some(name) = first_capture(&INTERFACE_HEADER, line.text) {
                        current = (name != "CPU").then_some(name);
                    }
                }
            }
        }
    }

    /// Overlay `show interface transceiver`, numbering lanes per interface.
    ///
    /// Rows before the dashed separator are table headings. An unindented
    /// row starts a new interface at lane 0; each indented row that follows
    /// is the next lane of the same interface.
    pub fn overlay_transceivers(&mut self, text: &str) {
        let mut ctx: ParseContext<usize> = ParseContext::new();
        let rows = scan(text).skip_while(|line| !SEPARATOR.is_match(line.text)).skip(1);
        for line in rows {
            if line.is_blank() {
                continue;
            }
            let tagged = if let Some(c) = TRANSCEIVER_ROW.captures(line.text) {
                ctx.open_entity(cap(&c, 1));
                ctx.enter_sub_scope(0);
                cap(&c, 2).to_string()
            } else {
                let Some(lane) = ctx.current_sub_scope().copied() else {
                    continue;
                };
                ctx.enter_sub_scope(lane + 1);
                line.text.to_string()
            };
            if let (Some(name), Some(lane)) = (ctx.current_entity(), ctx.current_sub_scope()) {
                let marked = format!("{TRANSCEIVERS_MARKER}{lane} {tagged}");
                self.append(name, &marked);
            }
        }
    }

    /// Merged blob for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.blobs.get(name).map(String::as_str)
    }

    /// Iterate over `(name, blob)` pairs in the order interfaces appeared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.blobs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of interfaces.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// True if no interface was found.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    // Overlays never create interfaces the primary block did not list.
    fn append(&mut self, name: &str, line: &str) {
        match self.blobs.get_mut(name) {
            Some(blob) => push_line(blob, line),
            None => trace!("interfaces: no primary block for {:?}, dropping overlay", name),
        }
    }
}

fn push_line(blob: &mut String, line: &str) {
    blob.push('\n');
    blob.push_str(line);
}

#[derive(Default)]
struct DetailScan {
    record: Interface,
    status_seen: bool,
    anomalies: Anomalies,
}

impl DetailScan {
    fn no_status(&self) -> bool {
        !self.status_seen
    }

    fn address(&mut self, c: &Captures<'_>) -> Option<IpAddress> {
        let masklen = self.anomalies.int("masklen", cap(c, 2))?;
        Some(IpAddress {
            address: cap(c, 1).to_string(),
            masklen,
        })
    }

    fn push_lane(&mut self, row: &str) {
        let fields: Vec<&str> = row.split_whitespace().collect();
        let lanes = &mut self.record.transceiver;
        match fields[..] {
            [ddm, temp, voltage, lane, current, tx_power, rx_power, ..] => {
                lanes.push(TransceiverLane {
                    ddm: ddm.to_string(),
                    temp: temp.to_string(),
                    voltage: voltage.to_string(),
                    lane: lane.to_string(),
                    current: current.to_string(),
                    tx_power: tx_power.to_string(),
                    rx_power: rx_power.to_string(),
                });
            }
            // Continuation lanes share DDM, temperature and voltage with the
            // entry they continue.
            [lane, current, tx_power, rx_power, ..] => {
                let Some(previous) = lanes.last() else {
                    return;
                };
                let continued = TransceiverLane {
                    lane: lane.to_string(),
                    current: current.to_string(),
                    tx_power: tx_power.to_string(),
                    rx_power: rx_power.to_string(),
                    ..previous.clone()
                };
                lanes.push(continued);
            }
            _ => {}
        }
    }
}

fn first(slot: &mut Option<String>, c: &Captures<'_>) {
    set_once(slot, cap(c, 1).to_string());
}

// Overlay marker lines are consumed whole. Detail rules fall through:
// one line of `show interface` can carry several fields.
static DETAIL_RULES: Lazy<RuleTable<DetailScan>> = Lazy::new(|| {
    RuleTable::<DetailScan>::builder()
        .scope("status", r"^Status (up|down)$", |s, c| {
            s.record.lineprotocol = Some(cap(c, 1).to_string());
            s.status_seen = true;
        })
        .scope("counter", r"^COUNTERS\s+([^:]+): (\S*)", |s, c| {
            s.record
                .counter
                .insert(cap(c, 1).trim().to_string(), cap(c, 2).to_string());
        })
        .scope("transceiver", r"^TRANSCEIVERS[0-9]+\s+(.+)$", |s, c| {
            s.push_lane(cap(c, 1))
        })
        .field("description", r"Description: (.*)", |s, c| {
            first(&mut s.record.description, c)
        })
        .fallthrough()
        .field("macaddress", r"Current HW addr: (.*)", |s, c| {
            first(&mut s.record.macaddress, c)
        })
        .fallthrough()
        .field("mtu", r"mtu (\d+)", |s, c| {
            if s.record.mtu.is_none() {
                s.record.mtu = s.anomalies.int("mtu", cap(c, 1));
            }
        })
        .fallthrough()
        .field("bandwidth", r"link-speed (\S*)", |s, c| {
            first(&mut s.record.bandwidth, c)
        })
        .fallthrough()
        .field("mediatype", r"Hardware is (\S*)", |s, c| {
            first(&mut s.record.mediatype, c)
        })
        .fallthrough()
        .field("duplex", r"duplex-([^\s\(]*)", |s, c| first(&mut s.record.duplex, c))
        .fallthrough()
        .field("ipv4", r"inet (\S+)/(\d+)", |s, c| {
            if let Some(address) = s.address(c) {
                s.record.ipv4.push(address);
            }
        })
        .fallthrough()
        .field("ipv6", r"inet6 (\S+)/(\d+)", |s, c| {
            if let Some(address) = s.address(c) {
                s.record.ipv6.push(address);
            }
        })
        .fallthrough()
        .field("lineprotocol", r"line protocol is (up|down)", |s, c| {
            first(&mut s.record.lineprotocol, c)
        })
        .when(DetailScan::no_status)
        .fallthrough()
        .field("portmode", r"Port Mode is (\S*)", |s, c| {
            first(&mut s.record.portmode, c)
        })
        .fallthrough()
        .field("vrf", r"VRF Binding: Associated with (.*)", |s, c| {
            first(&mut s.record.vrf, c)
        })
        .fallthrough()
        .build()
        .expect("built-in interface detail rules compile")
});

/// Extract the record for one merged blob.
///
/// Each line runs through the detail rules once. The first value seen wins
/// for single-valued fields, except that a `Status` overlay line always
/// decides the line protocol.
pub fn extract_interface(blob: &str, anomalies: &mut Anomalies) -> Interface {
    let mut state = DetailScan::default();
    for line in scan(blob) {
        DETAIL_RULES.dispatch(&mut state, line.text);
    }
    anomalies.absorb(state.anomalies);
    state.record
}

/// Build interface, LLDP neighbor and LAG facts from the raw outputs.
///
/// Each missing source only affects the facts derived from it.
pub fn parse_interfaces(sources: &InterfaceSources<'_>, anomalies: &mut Anomalies) -> InterfaceFacts {
    let mut facts = InterfaceFacts::default();

    if let Some(primary) = sources.interface {
        let mut blobs = InterfaceBlobs::from_primary(primary);
        match sources.brief {
            Some(brief) => blobs.overlay_brief(brief),
            None => debug!("interfaces: no brief output, line protocol falls back to primary block"),
        }
        if let Some(counters) = sources.counters {
            blobs.overlay_counters(counters);
        }
        if let Some(transceiver) = sources.transceiver {
            blobs.overlay_transceivers(transceiver);
        }

        let mut interfaces = FactTree::new();
        for (name, blob) in blobs.iter() {
            let record = extract_interface(blob, anomalies);
            facts
                .all_ipv4_addresses
                .extend(record.ipv4.iter().map(|a| a.address.clone()));
            facts
                .all_ipv6_addresses
                .extend(record.ipv6.iter().map(|a| a.address.clone()));
            *interfaces.get_or_create(name) = record;
        }
        facts.interfaces = Some(interfaces);
    }

    if let Some(lldp) = sources.lldp {
        facts.neighbors = Some(parse_lldp_neighbors(lldp));
    }
    if let Some(lag) = sources.lag {
        facts.lagg = Some(parse_lag(lag));
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERFACE: &str = "\
Interface xe1
  Scope: both
  Hardware is ETH  Current HW addr: 3c2c.99aa.0001
  Physical:3c2c.99aa.0001  Logical:(not set)
  Port Mode is router
  Interface index: 5001
  Metric 1 mtu 1500 duplex-full(auto) link-speed 10g
  Description: uplink to spine
  VRF Binding: Associated with default
  inet 10.0.0.1/31 broadcast 10.0.0.1
  inet6 2001:db8::1/64
  inet6 fe80::3e2c:99ff:feaa:1/64

Interface lo
  Hardware is Loopback  index 1 metric 1 mtu 65536
  inet 127.0.0.1/8
  inet 10.0.0.1/32 secondary
";

    const BRIEF: &str = "\
Ethernet  Type  PVID  Mode    Status  Reason  Speed
xe1       ETH   --    routed  up      none    10g
lo        LB    --    --      down    none    --
xe9       ETH   --    routed  up      none    10g
";

    const COUNTERS: &str = "\
Interface CPU
  Rx Packets: 5

Interface xe1
  Rx Packets: 1000
  Tx Packets: 900

Interface lo
  Rx Packets: 42
";

    const TRANSCEIVER: &str = "\
Port    DDM  Temp   Voltage Lane Current TxPower RxPower
---------------------------------------------------------
xe1     Yes  35.2   3.29    1    6.50    -2.10   -3.40
                            2    6.40    -2.20   -3.50
";

    fn sources() -> InterfaceSources<'static> {
        InterfaceSources {
            interface: Some(INTERFACE),
            brief: Some(BRIEF),
            counters: Some(COUNTERS),
            transceiver: Some(TRANSCEIVER),
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_blobs() {
        let blobs = InterfaceBlobs::from_primary(INTERFACE);
        assert_eq!(blobs.len(), 2);
        let xe1 = blobs.get("xe1").unwrap();
        assert!(xe1.starts_with("Interface xe1\n  Scope: both"));
        assert!(xe1.ends_with("inet6 fe80::3e2c:99ff:feaa:1/64"));
    }

    #[test]
    fn test_overlays_tag_lines() {
        let mut blobs = InterfaceBlobs::from_primary(INTERFACE);
        blobs.overlay_brief(BRIEF);
        blobs.overlay_counters(COUNTERS);
        blobs.overlay_transceivers(TRANSCEIVER);

        let xe1 = blobs.get("xe1").unwrap();
        assert!(xe1.contains("\nStatus up"));
        assert!(xe1.contains("\nCOUNTERS   Rx Packets: 1000"));
        assert!(xe1.contains("\nTRANSCEIVERS0 Yes  35.2"));
        assert!(xe1.contains("\nTRANSCEIVERS1 "));
        // CPU counters and unknown interfaces are not attached anywhere
        assert!(!blobs.iter().any(|(_, b)| b.contains("Rx Packets: 5")));
        assert!(blobs.get("xe9").is_none());
    }

    #[test]
    fn test_extracted_fields() {
        let mut anomalies = Anomalies::default();
        let facts = parse_interfaces(&sources(), &mut anomalies);
        let interfaces = facts.interfaces.unwrap();
        let xe1 = interfaces.get("xe1").unwrap();

        assert_eq!(xe1.description.as_deref(), Some("uplink to spine"));
        assert_eq!(xe1.macaddress.as_deref(), Some("3c2c.99aa.0001"));
        assert_eq!(xe1.mtu, Some(1500));
        assert_eq!(xe1.bandwidth.as_deref(), Some("10g"));
        assert_eq!(xe1.mediatype.as_deref(), Some("ETH"));
        assert_eq!(xe1.duplex.as_deref(), Some("full"));
        assert_eq!(xe1.lineprotocol.as_deref(), Some("up"));
        assert_eq!(xe1.portmode.as_deref(), Some("router"));
        assert_eq!(xe1.vrf.as_deref(), Some("default"));
        assert_eq!(
            xe1.ipv4,
            vec![IpAddress {
                address: "10.0.0.1".into(),
                masklen: 31
            }]
        );
        assert_eq!(xe1.ipv6.len(), 2);
        assert_eq!(xe1.counter.get("Rx Packets").map(String::as_str), Some("1000"));
        assert_eq!(xe1.counter.get("Tx Packets").map(String::as_str), Some("900"));
        assert!(anomalies.is_empty());

        let lo = interfaces.get("lo").unwrap();
        assert_eq!(lo.mtu, Some(65536));
        assert_eq!(lo.lineprotocol.as_deref(), Some("down"));
        assert!(lo.description.is_none());
    }

    #[test]
    fn test_transceiver_lanes_carry_forward() {
        let mut anomalies = Anomalies::default();
        let facts = parse_interfaces(&sources(), &mut anomalies);
        let interfaces = facts.interfaces.unwrap();
        let lanes = &interfaces.get("xe1").unwrap().transceiver;

        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].ddm, "Yes");
        assert_eq!(lanes[0].lane, "1");
        assert_eq!(lanes[1].lane, "2");
        assert_eq!(lanes[1].rx_power, "-3.50");
        // inherited from the first lane
        assert_eq!(lanes[1].temp, "35.2");
        assert_eq!(lanes[1].voltage, "3.29");
    }

    #[test]
    fn test_all_addresses_are_unique() {
        let mut anomalies = Anomalies::default();
        let facts = parse_interfaces(&sources(), &mut anomalies);
        let v4: Vec<_> = facts.all_ipv4_addresses.iter().map(String::as_str).collect();
        assert_eq!(v4, vec!["10.0.0.1", "127.0.0.1"]);
        assert_eq!(facts.all_ipv6_addresses.len(), 2);
    }

    #[test]
    fn test_missing_brief_falls_back() {
        let text = "Interface xe3\n  Hardware is ETH, line protocol is down\n";
        let sources = InterfaceSources {
            interface: Some(text),
            ..Default::default()
        };
        let mut anomalies = Anomalies::default();
        let facts = parse_interfaces(&sources, &mut anomalies);
        let xe3 = facts.interfaces.unwrap().get("xe3").cloned().unwrap();
        assert_eq!(xe3.lineprotocol.as_deref(), Some("down"));
        assert!(xe3.counter.is_empty());
    }

    #[test]
    fn test_missing_fields_serialize_as_na() {
        let record = extract_interface("Interface lo", &mut Anomalies::default());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["description"], "N/A");
        assert_eq!(json["mtu"], "N/A");
        assert_eq!(json["lineprotocol"], "N/A");
        assert_eq!(json["ipv4"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_primary_keeps_other_sources() {
        let sources = InterfaceSources {
            lag: Some("  Aggregator Type: Static\n  Link: eth1 sync: true\n-----\n"),
            ..Default::default()
        };
        let facts = parse_interfaces(&sources, &mut Anomalies::default());
        assert!(facts.interfaces.is_none());
        assert_eq!(facts.lagg.map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_continuation_before_any_lane_is_dropped() {
        let text = "----\n        2    6.40    -2.20   -3.50\n";
        let mut blobs = InterfaceBlobs::from_primary(INTERFACE);
        blobs.overlay_transceivers(text);
        assert!(!blobs.get("xe1").unwrap().contains(TRANSCEIVERS_MARKER));
    }

    #[test]
    fn test_deterministic_output() {
        let run = || {
            let facts = parse_interfaces(&sources(), &mut Anomalies::default());
            serde_json::to_string(&facts).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_lane_index_restarts_per_interface() {
        let primary = "Interface xe1\n  Hardware is ETH\nInterface xe2\n  Hardware is ETH\n";
        let transceiver = "\
Port    DDM  Temp   Voltage Lane Current TxPower RxPower
---------------------------------------------------------
xe1     Yes  35.2   3.29    1    6.50    -2.10   -3.40
                            2    6.40    -2.20   -3.50
                            3    6.30    -2.30   -3.60
xe2     Yes  31.0   3.30    1    7.00    -1.00   -1.50
                            2    7.10    -1.10   -1.60
";
        let mut blobs = InterfaceBlobs::from_primary(primary);
        blobs.overlay_transceivers(transceiver);

        let xe2_blob = blobs.get("xe2").unwrap();
        assert!(xe2_blob.contains("\nTRANSCEIVERS0 Yes  31.0"));
        assert!(xe2_blob.contains("\nTRANSCEIVERS1 "));
        assert!(!xe2_blob.contains("TRANSCEIVERS2"));
        assert!(blobs.get("xe1").unwrap().contains("\nTRANSCEIVERS2 "));

        let xe1 = extract_interface(blobs.get("xe1").unwrap(), &mut Anomalies::default());
        let xe2 = extract_interface(xe2_blob, &mut Anomalies::default());
        let lanes = |i: &Interface| i.transceiver.iter().map(|l| l.lane.clone()).collect::<Vec<_>>();
        assert_eq!(lanes(&xe1), vec!["1", "2", "3"]);
        assert_eq!(lanes(&xe2), vec!["1", "2"]);
        assert_eq!(xe2.transceiver[1].temp, "31.0");
        assert_eq!(xe2.transceiver[1].tx_power, "-1.10");
    }

    #[test]
    fn test_detail_line_with_several_fields() {
        let mut state = DetailScan::default();
        let line = "  Metric 1 mtu 9216 duplex-half(auto) link-speed 25g";
        assert_eq!(DETAIL_RULES.dispatch(&mut state, line), None);
        assert_eq!(state.record.mtu, Some(9216));
        assert_eq!(state.record.duplex.as_deref(), Some("half"));
        assert_eq!(state.record.bandwidth.as_deref(), Some("25g"));
    }

    #[test]
    fn test_overlay_markers_are_consumed() {
        let mut state = DetailScan::default();
        assert_eq!(
            DETAIL_RULES.dispatch(&mut state, "COUNTERS   Description: 5"),
            Some("counter")
        );
        assert!(state.record.description.is_none());
        assert_eq!(state.record.counter.get("Description").map(String::as_str), Some("5"));
        assert_eq!(DETAIL_RULES.dispatch(&mut state, "Status down"), Some("status"));
        assert_eq!(
            DETAIL_RULES.dispatch(&mut state, "TRANSCEIVERS0 Yes 30.0 3.30 1 6.0 -1.0 -2.0"),
            Some("transceiver")
        );
        assert_eq!(state.record.transceiver.len(), 1);
    }

    #[test]
    fn test_status_overlay_beats_line_protocol() {
        let blob = "Interface xe4\nStatus up\n  Hardware is ETH, line protocol is down";
        let record = extract_interface(blob, &mut Anomalies::default());
        assert_eq!(record.lineprotocol.as_deref(), Some("up"));

        let blob = "Interface xe4\n  Hardware is ETH, line protocol is down\nStatus up";
        let record = extract_interface(blob, &mut Anomalies::default());
        assert_eq!(record.lineprotocol.as_deref(), Some("up"));
    }

    #[test]
    fn test_first_description_wins() {
        let blob = "Interface xe5\n  Description: first\n  Description: second";
        let record = extract_interface(blob, &mut Anomalies::default());
        assert_eq!(record.description.as_deref(), Some("first"));
    }
}
