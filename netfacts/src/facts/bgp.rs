//! BGP neighbor facts from `show bgp neighbor`.
//!
//! The output is a sequence of neighbor sections. Each opens with an
//! identity line, followed by session-level fields, an optional
//! `Neighbor capabilities:` block of 4-space indented `label: value` lines and
//! one `For address family: AFI SAFI` block per negotiated family:
//!
//! ```text
//! BGP neighbor is 10.0.0.1, remote AS 65000, local AS 65001, external link
//!   BGP version 4, local router ID 1.1.1.1, remote router ID 2.2.2.2
//!   BGP state = Established, up for 01:02:03
//!   Neighbor capabilities:
//!     Route refresh: advertised and received (old and new)
//!   For address family: IPv4 Unicast
//!   BGP table version 5, neighbor version 5
//!   2 accepted prefixes
//! ```

use indexmap::IndexMap;
use log::trace;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::parse::{
    Anomalies, FactTree, ParseContext, RuleTable, cap, compact_label, scan, set_once,
};

/// Facts for one BGP neighbor.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpNeighbor {
    #[serde(rename = "remoteAS", skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<String>,
    #[serde(rename = "localAS", skip_serializing_if = "Option::is_none")]
    pub local_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "MemberOfPeerGroup", skip_serializing_if = "Option::is_none")]
    pub member_of_peer_group: Option<String>,
    #[serde(rename = "BGPversion", skip_serializing_if = "Option::is_none")]
    pub bgp_version: Option<String>,
    #[serde(rename = "localRouterID", skip_serializing_if = "Option::is_none")]
    pub local_router_id: Option<String>,
    #[serde(rename = "remoteRouterID", skip_serializing_if = "Option::is_none")]
    pub remote_router_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "EstablishedUpFor", skip_serializing_if = "Option::is_none")]
    pub established_up_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured_hold_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured_keep_alive: Option<u64>,
    #[serde(rename = "Received", skip_serializing_if = "Option::is_none")]
    pub received: Option<MessageCounters>,
    #[serde(rename = "Sent", skip_serializing_if = "Option::is_none")]
    pub sent: Option<MessageCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_refresh_request: Option<RouteRefreshCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_time_between_adv: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_source: Option<String>,
    #[serde(rename = "BFD", skip_serializing_if = "Option::is_none")]
    pub bfd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<ConnectionCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<Endpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign: Option<Endpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_restart_remote_restart_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_restart_reestablished_status: Option<String>,
    #[serde(rename = "externalBGPHops", skip_serializing_if = "Option::is_none")]
    pub external_bgp_hops: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nexthop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nexthop_global: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nexthop_linklocal: Option<String>,
    #[serde(rename = "BGPConnection", skip_serializing_if = "Option::is_none")]
    pub bgp_connection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_connect_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset_due_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub address_family: IndexMap<String, AddressFamily>,
}

/// Message counters for one direction of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageCounters {
    pub messages: u64,
    pub notifications: u64,
    #[serde(rename = "InQueue")]
    pub in_queue: u64,
}

/// Route refresh requests received and sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteRefreshCounters {
    pub received: u64,
    pub sent: u64,
}

/// TCP connection counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionCounters {
    pub established: u64,
    pub dropped: u64,
}

/// One end of the BGP TCP session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u64,
}

/// Facts for one address family of a neighbor.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFamily {
    #[serde(rename = "BGPtableVersion", skip_serializing_if = "Option::is_none")]
    pub bgp_table_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbor_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_group_member: Option<String>,
    #[serde(rename = "GracefulRestart", skip_serializing_if = "Option::is_none")]
    pub graceful_restart: Option<String>,
    /// ORF capabilities keyed by ORF type (`64`, `128`).
    #[serde(rename = "ORFType", skip_serializing_if = "IndexMap::is_empty")]
    pub orf_types: IndexMap<String, OrfCapability>,
    #[serde(rename = "ORF", skip_serializing_if = "Option::is_none")]
    pub orf: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub prefix_lists: IndexMap<String, PrefixList>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_prefixes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announced_prefixes: Option<u64>,
    /// Filter lists, route maps, weight and default-originate settings.
    #[serde(flatten)]
    pub policies: IndexMap<String, String>,
}

/// Send and receive modes of one ORF type.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrfCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_mode: Option<String>,
}

/// A prefix list attached to an address family, with its `seq` entries.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixList {
    pub family: String,
    #[serde(rename = "seq")]
    pub entries: Vec<String>,
}

/// Boilerplate phrases recorded verbatim in an address family's `flags`.
const FLAG_PHRASES: &[&str] = &[
    "First update is deferred until ORF or ROUTE-REFRESH is received",
    "Route-Reflector Client",
    "Route-Server Client",
    "Inbound soft reconfiguration allowed",
    "Private AS number removed from updates to this neighbor",
    "NEXT_HOP is always this router",
    "AS_PATH is propagated unchanged to this neighbor",
    "NEXT_HOP is propagated unchanged to this neighbor",
    "MED is propagated unchanged to this neighbor",
];

/// Labels of `label value` policy lines inside an address family.
const POLICY_LABELS: &[&str] = &[
    "Default information originate, ",
    "Weight",
    "Incoming update prefix filter list is ",
    "Outgoing update prefix filter list is ",
    "Incoming update network filter list is ",
    "Outgoing update network filter list is ",
    "Incoming update AS path filter list is ",
    "Outgoing update AS path filter list is ",
    "Route map for incoming advertisements is ",
    "Route map for outgoing advertisements is ",
    "Route map for selective unsuppress is ",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Capabilities,
    AddressFamily(String),
}

#[derive(Debug, Default)]
struct FamilyLocals {
    orf_type: Option<String>,
    prefix_list: Option<String>,
}

#[derive(Default)]
struct BgpScan {
    ctx: ParseContext<Scope, FamilyLocals>,
    neighbors: FactTree<BgpNeighbor>,
    anomalies: Anomalies,
}

impl BgpScan {
    fn neighbor(&mut self) -> Option<&mut BgpNeighbor> {
        let key = self.ctx.current_entity()?;
        self.neighbors.get_mut(key)
    }

    fn family(&mut self) -> Option<&mut AddressFamily> {
        let key = self.ctx.current_entity()?;
        let Some(Scope::AddressFamily(name)) = self.ctx.current_sub_scope() else {
            return None;
        };
        let neighbor = self.neighbors.get_mut(key)?;
        Some(neighbor.address_family.entry(name.clone()).or_default())
    }

    fn has_neighbor(&self) -> bool {
        self.ctx.current_entity().is_some()
    }

    fn in_capabilities(&self) -> bool {
        self.ctx.current_sub_scope() == Some(&Scope::Capabilities)
    }

    fn in_family(&self) -> bool {
        matches!(self.ctx.current_sub_scope(), Some(Scope::AddressFamily(_)))
    }

    fn in_prefix_list(&self) -> bool {
        self.in_family() && self.ctx.locals().prefix_list.is_some()
    }

    fn has_orf_type(&self) -> bool {
        self.in_family() && self.ctx.locals().orf_type.is_some()
    }

    fn orf(&mut self) -> Option<&mut OrfCapability> {
        let orf_type = self.ctx.locals().orf_type.clone()?;
        Some(self.family()?.orf_types.entry(orf_type).or_default())
    }
}

static RULES: Lazy<RuleTable<BgpScan>> =
    Lazy::new(|| rules().expect("built-in BGP neighbor rules compile"));

fn rules() -> Result<RuleTable<BgpScan>, regex::Error> {
    let flags = format!("  ({})", FLAG_PHRASES.join("|"));
    let policies = format!("^  ({})(.+)$", POLICY_LABELS.join("|"));

    let table = RuleTable::<BgpScan>::builder()
        .open(
            "neighbor",
            r"^BGP neighbor is (\S+), (vrf \S+, |)remote AS (\S+), local AS (\S+), (\S+)",
            |s, c| {
                let address = cap(c, 1);
                if !s.ctx.open_entity(address) {
                    return;
                }
                let neighbor = s.neighbors.get_or_create(address);
                set_once(&mut neighbor.remote_as, cap(c, 3).to_string());
                set_once(&mut neighbor.local_as, cap(c, 4).to_string());
                set_once(&mut neighbor.link_type, cap(c, 5).to_string());
                if let Some(vrf) = cap(c, 2).strip_prefix("vrf ") {
                    set_once(&mut neighbor.vrf, vrf.trim_end_matches([',', ' ']).to_string());
                }
            },
        )
        // Any line that is not indented by exactly four spaces ends the
        // capability block and is then parsed normally.
        .scope("capabilities-end", r"^(?: {0,3}[^ ]| {4}\s| {0,4}$)", |s, _| {
            s.ctx.close_sub_scopes()
        })
        .when(BgpScan::in_capabilities)
        .fallthrough()
        .scope("capabilities", r"Neighbor capabilities:", |s, _| {
            s.ctx.enter_sub_scope(Scope::Capabilities);
            if let Some(neighbor) = s.neighbor() {
                neighbor.capabilities.get_or_insert_with(IndexMap::new);
            }
        })
        .when(BgpScan::has_neighbor)
        .scope("address-family", r"For address family: (\S+ \S+)", |s, c| {
            s.ctx
                .enter_sub_scope(Scope::AddressFamily(cap(c, 1).to_string()));
            s.family();
        })
        .when(BgpScan::has_neighbor)
        .scope("family-blank", r"^$", |s, _| s.ctx.locals_mut().prefix_list = None)
        .when(BgpScan::in_family)
        .scope(
            "orf-type",
            r"^    Outbound Route Filter \(ORF\) type \((64|128)\) Prefix-list:",
            |s, c| s.ctx.locals_mut().orf_type = Some(cap(c, 1).to_string()),
        )
        .when(BgpScan::in_family)
        .scope("prefix-list", r"(ip\S*) prefix-list (.+): \S+ entries", |s, c| {
            let name = cap(c, 2).to_string();
            s.ctx.locals_mut().prefix_list = Some(name.clone());
            if let Some(family) = s.family() {
                family.prefix_lists.entry(name).or_insert_with(|| PrefixList {
                    family: cap(c, 1).to_string(),
                    entries: Vec::new(),
                });
            }
        })
        .when(BgpScan::in_family)
        .field("capability", r"^ {4}(\S.*): (.*)$", |s, c| {
            let key = compact_label(cap(c, 1));
            if let Some(caps) = s.neighbor().and_then(|n| n.capabilities.as_mut()) {
                caps.insert(key, cap(c, 2).to_string());
            }
        })
        .when(BgpScan::in_capabilities)
        .field("prefix-seq", r"^   seq (.+)$", |s, c| {
            let Some(name) = s.ctx.locals().prefix_list.clone() else {
                return;
            };
            if let Some(list) = s.family().and_then(|f| f.prefix_lists.get_mut(&name)) {
                list.entries.push(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::in_prefix_list)
        .field(
            "table-version",
            r"BGP table version (\S+), neighbor version (\S+)",
            |s, c| {
                let table = s.anomalies.int("BGPtableVersion", cap(c, 1));
                let neighbor = s.anomalies.int("neighborVersion", cap(c, 2));
                if let Some(family) = s.family() {
                    family.bgp_table_version = table;
                    family.neighbor_version = neighbor;
                }
            },
        )
        .when(BgpScan::in_family)
        .field("index", r"Index (\S+), Offset (\S+), Mask (\S+)", |s, c| {
            let index = s.anomalies.int("index", cap(c, 1));
            let offset = s.anomalies.int("offset", cap(c, 2));
            if let Some(family) = s.family() {
                family.index = index;
                family.offset = offset;
                family.mask = Some(cap(c, 3).to_string());
            }
        })
        .when(BgpScan::in_family)
        .field("peer-group-member", r"(\S+) peer-group member", |s, c| {
            if let Some(family) = s.family() {
                family.peer_group_member = Some(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::in_family)
        .field("graceful-restart", r"Graceful restart: (.+)", |s, c| {
            if let Some(family) = s.family() {
                family.graceful_restart = Some(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::in_family)
        .field("orf-send-mode", r"^      Send-mode: (.+)", |s, c| {
            if let Some(orf) = s.orf() {
                orf.send_mode = Some(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::has_orf_type)
        .field("orf-receive-mode", r"^      Receive-mode: (.+)", |s, c| {
            if let Some(orf) = s.orf() {
                orf.receive_mode = Some(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::has_orf_type)
        .field("orf-status", r"^  Outbound Route Filter \(ORF\): (.+)", |s, c| {
            if let Some(family) = s.family() {
                family.orf = Some(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::in_family)
        .field("flag", &flags, |s, c| {
            if let Some(family) = s.family() {
                family.flags.push(cap(c, 1).to_string());
            }
        })
        .when(BgpScan::in_family)
        .field(
            "community",
            r"Community attribute sent to this neighbor \((\S+)\)",
            |s, c| {
                if let Some(family) = s.family() {
                    family.community_attribute = Some(cap(c, 1).to_string());
                }
            },
        )
        .when(BgpScan::in_family)
        .field("policy", &policies, |s, c| {
            let label = cap(c, 1).trim().trim_end_matches(',').trim_end_matches(" is");
            let key = compact_label(label);
            if let Some(family) = s.family() {
                family.policies.insert(key, cap(c, 2).trim().to_string());
            }
        })
        .when(BgpScan::in_family)
        .field("accepted-prefixes", r"(\S+) accepted prefixes", |s, c| {
            let count = s.anomalies.int("acceptedPrefixes", cap(c, 1));
            if let (Some(count), Some(family)) = (count, s.family()) {
                family.accepted_prefixes = Some(count);
            }
        })
        .when(BgpScan::in_family)
        .field("announced-prefixes", r"(\S+) announced prefixes", |s, c| {
            let count = s.anomalies.int("announcedPrefixes", cap(c, 1));
            if let (Some(count), Some(family)) = (count, s.family()) {
                family.announced_prefixes = Some(count);
            }
        })
        .when(BgpScan::in_family)
        .field("description", r"Description: (.+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.description = Some(cap(c, 1).to_string());
            }
        })
        .field(
            "member-of-peer-group",
            r"Member of peer-group (\S+) for session parameters",
            |s, c| {
                if let Some(n) = s.neighbor() {
                    n.member_of_peer_group = Some(cap(c, 1).to_string());
                }
            },
        )
        .field(
            "version",
            r"BGP version (\S+), local router ID (\S+), remote router ID (\S+)",
            |s, c| {
                if let Some(n) = s.neighbor() {
                    n.bgp_version = Some(cap(c, 1).to_string());
                    n.local_router_id = Some(cap(c, 2).to_string());
                    n.remote_router_id = Some(cap(c, 3).to_string());
                }
            },
        )
        .field("state", r"BGP state = (\S+)\s*(.*)", |s, c| {
            let Some(n) = s.neighbor() else {
                return;
            };
            let state = cap(c, 1);
            if state == "Established," {
                n.state = Some("Established".to_string());
                let rest = cap(c, 2);
                if let Some(at) = rest.find("up for ") {
                    if let Some(duration) = rest[at + "up for ".len()..].split_whitespace().next() {
                        n.established_up_for = Some(duration.to_string());
                    }
                }
            } else {
                n.state = Some(state.to_string());
            }
        })
        .field(
            "last-read",
            r"Last read (\S+), hold time is (\S+), keepalive interval is (\S+) seconds",
            |s, c| {
                let hold = s.anomalies.int("holdTime", cap(c, 2));
                let keepalive = s.anomalies.int("keepAlive", cap(c, 3));
                if let Some(n) = s.neighbor() {
                    n.last_read = Some(cap(c, 1).to_string());
                    n.hold_time = hold;
                    n.keep_alive = keepalive;
                }
            },
        )
        .field(
            "configured-timers",
            r"Configured hold time is (\S+), keepalive interval is (\S+) seconds",
            |s, c| {
                let hold = s.anomalies.int("configuredHoldTime", cap(c, 1));
                let keepalive = s.anomalies.int("configuredKeepAlive", cap(c, 2));
                if let Some(n) = s.neighbor() {
                    n.configured_hold_time = hold;
                    n.configured_keep_alive = keepalive;
                }
            },
        )
        .field(
            "received",
            r"Received (\S+) messages, (\S+) notifications, (\S+) in queue",
            |s, c| {
                let counters = message_counters(&mut s.anomalies, "Received", c);
                if let (Some(counters), Some(n)) = (counters, s.neighbor()) {
                    n.received = Some(counters);
                }
            },
        )
        .field(
            "sent",
            r"Sent (\S+) messages, (\S+) notifications, (\S+) in queue",
            |s, c| {
                let counters = message_counters(&mut s.anomalies, "Sent", c);
                if let (Some(counters), Some(n)) = (counters, s.neighbor()) {
                    n.sent = Some(counters);
                }
            },
        )
        .field(
            "route-refresh",
            r"Route refresh request: received (\S+), sent (\S+)",
            |s, c| {
                let (Some(received), Some(sent)) = (
                    s.anomalies.int("routeRefreshRequest.received", cap(c, 1)),
                    s.anomalies.int("routeRefreshRequest.sent", cap(c, 2)),
                ) else {
                    return;
                };
                if let Some(n) = s.neighbor() {
                    n.route_refresh_request = Some(RouteRefreshCounters { received, sent });
                }
            },
        )
        .field(
            "min-adv-interval",
            r"Minimum time between advertisement runs is (\S+) seconds",
            |s, c| {
                let secs = s.anomalies.int("minTimeBetweenAdv", cap(c, 1));
                if let (Some(secs), Some(n)) = (secs, s.neighbor()) {
                    n.min_time_between_adv = Some(secs);
                }
            },
        )
        .field("update-source", r"Update source is (\S+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.update_source = Some(cap(c, 1).to_string());
            }
        })
        .field("bfd", r"Bidirectional Forwarding Detection is (\S+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.bfd = Some(cap(c, 1).to_string());
            }
        })
        .field(
            "connections",
            r"Connections established (\S+); dropped (\S+)",
            |s, c| {
                let (Some(established), Some(dropped)) = (
                    s.anomalies.int("connections.established", cap(c, 1)),
                    s.anomalies.int("connections.dropped", cap(c, 2)),
                ) else {
                    return;
                };
                if let Some(n) = s.neighbor() {
                    n.connections = Some(ConnectionCounters {
                        established,
                        dropped,
                    });
                }
            },
        )
        .field("local-endpoint", r"Local host: (\S+), Local port: (\S+)", |s, c| {
            let endpoint = endpoint(&mut s.anomalies, "local.port", c);
            if let (Some(endpoint), Some(n)) = (endpoint, s.neighbor()) {
                n.local = Some(endpoint);
            }
        })
        .field(
            "foreign-endpoint",
            r"Foreign host: (\S+), Foreign port: (\S+)",
            |s, c| {
                let endpoint = endpoint(&mut s.anomalies, "foreign.port", c);
                if let (Some(endpoint), Some(n)) = (endpoint, s.neighbor()) {
                    n.foreign = Some(endpoint);
                }
            },
        )
        .field("remote-restart-time", r"^  Remote restart time is (\S+) sec", |s, c| {
            let secs = s
                .anomalies
                .int("gracefulRestartRemoteRestartTime", cap(c, 1));
            if let (Some(secs), Some(n)) = (secs, s.neighbor()) {
                n.graceful_restart_remote_restart_time = Some(secs);
            }
        })
        .field("reestablished", r"^  Re-established, (.+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.graceful_restart_reestablished_status = Some(cap(c, 1).to_string());
            }
        })
        .field(
            "ebgp-hops",
            r"External BGP neighbor may be up to (\S+) hops away",
            |s, c| {
                let hops = s.anomalies.int("externalBGPHops", cap(c, 1));
                if let (Some(hops), Some(n)) = (hops, s.neighbor()) {
                    n.external_bgp_hops = Some(hops);
                }
            },
        )
        .field("nexthop", r"Nexthop: (\S+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.nexthop = Some(cap(c, 1).to_string());
            }
        })
        .field("nexthop-global", r"Nexthop global: (\S+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.nexthop_global = Some(cap(c, 1).to_string());
            }
        })
        .field("nexthop-local", r"Nexthop local: (\S+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.nexthop_linklocal = Some(cap(c, 1).to_string());
            }
        })
        .field("bgp-connection", r"BGP connection: (.+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.bgp_connection = Some(cap(c, 1).to_string());
            }
        })
        .field(
            "next-connect-timer",
            r"Next connect timer due in (\S+) seconds",
            |s, c| {
                let secs = s.anomalies.int("nextConnectTimer", cap(c, 1));
                if let (Some(secs), Some(n)) = (secs, s.neighbor()) {
                    n.next_connect_timer = Some(secs);
                }
            },
        )
        .field("capability-error", r"Capability error: (.+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.capability_error = Some(cap(c, 1).to_string());
            }
        })
        .field("last-reset", r"Last Reset: (\S+), due to (.+)", |s, c| {
            if let Some(n) = s.neighbor() {
                n.last_reset = Some(cap(c, 1).to_string());
                n.last_reset_due_to = Some(cap(c, 2).to_string());
            }
        })
        .field(
            "notification-error",
            r"Notification Error Message: \((.+)\)",
            |s, c| {
                if let Some(n) = s.neighbor() {
                    n.notification_error = Some(cap(c, 1).to_string());
                }
            },
        )
        .build()?;

    Ok(table)
}

fn message_counters(
    anomalies: &mut Anomalies,
    field: &str,
    c: &regex::Captures<'_>,
) -> Option<MessageCounters> {
    let messages = anomalies.int(&format!("{field}.messages"), cap(c, 1));
    let notifications = anomalies.int(&format!("{field}.notifications"), cap(c, 2));
    let in_queue = anomalies.int(&format!("{field}.InQueue"), cap(c, 3));
    Some(MessageCounters {
        messages: messages?,
        notifications: notifications?,
        in_queue: in_queue?,
    })
}

fn endpoint(anomalies: &mut Anomalies, field: &str, c: &regex::Captures<'_>) -> Option<Endpoint> {
    let port = anomalies.int(field, cap(c, 2))?;
    Some(Endpoint {
        host: cap(c, 1).to_string(),
        port,
    })
}

/// Incremental parser for `show bgp neighbor` output.
///
/// Lines can be fed one at a time, which makes it possible to inspect the
/// parse between lines.
#[derive(Default)]
pub struct BgpNeighborParser {
    scan: BgpScan,
}

impl BgpNeighborParser {
    /// Create a parser with no open neighbor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns the name of the rule that consumed it.
    pub fn feed(&mut self, line: &str) -> Option<&'static str> {
        RULES.dispatch(&mut self.scan, line)
    }

    /// Address of the neighbor currently being parsed.
    pub fn current_neighbor(&self) -> Option<&str> {
        self.scan.ctx.current_entity()
    }

    /// Name of the address family currently open, if any.
    pub fn current_family(&self) -> Option<&str> {
        match self.scan.ctx.current_sub_scope() {
            Some(Scope::AddressFamily(name)) => Some(name),
            _ => None,
        }
    }

    /// Neighbors parsed so far.
    pub fn neighbors(&self) -> &FactTree<BgpNeighbor> {
        &self.scan.neighbors
    }

    /// Finish the parse.
    pub fn finish(self) -> (FactTree<BgpNeighbor>, Anomalies) {
        (self.scan.neighbors, self.scan.anomalies)
    }
}

/// Parse a full `show bgp neighbor` block.
pub fn parse_bgp_neighbors(text: &str) -> (FactTree<BgpNeighbor>, Anomalies) {
    let mut parser = BgpNeighborParser::new();
    for line in scan(text) {
        if parser.feed(line.text).is_none() {
            trace!("bgp: line {} unmatched: {:?}", line.number, line.text);
        }
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEIGHBOR: &str = "\
BGP neighbor is 10.0.0.1, remote AS 65000, local AS 65001, external link
  Description: spine-1 uplink
  BGP version 4, local router ID 1.1.1.1, remote router ID 2.2.2.2
  BGP state = Established, up for 01:02:03
  Last read 00:00:12, hold time is 90, keepalive interval is 30 seconds
  Configured hold time is 90, keepalive interval is 30 seconds
  Neighbor capabilities:
    Route refresh: advertised and received (old and new)
    Address family IPv4 Unicast: advertised and received
    4-Octet ASN Capability: advertised and received
  Received 120 messages, 0 notifications, 0 in queue
  Sent 118 messages, 1 notifications, 0 in queue
  Route refresh request: received 0, sent 0
  Minimum time between advertisement runs is 30 seconds
  Update source is lo

 For address family: IPv4 Unicast
  BGP table version 7, neighbor version 7
  Index 1, Offset 0, Mask 0x2
  Inbound soft reconfiguration allowed
  Community attribute sent to this neighbor (both)
  Route map for incoming advertisements is RM-IN
  AF-dependant capabilities:
    Outbound Route Filter (ORF) type (64) Prefix-list:
      Send-mode: advertised
      Receive-mode: received
  Outbound Route Filter (ORF): sent;
  ip prefix-list PL-ORF: 2 entries
   seq 5 permit 10.0.0.0/8
   seq 10 deny any

  3 accepted prefixes
  4 announced prefixes

 Connections established 1; dropped 0
  Last Reset: 00:10:00, due to BGP Notification sent
  Notification Error Message: (Cease/Administratively Reset.)
Local host: 10.0.0.2, Local port: 179
Foreign host: 10.0.0.1, Foreign port: 40001
Nexthop: 10.0.0.2
Nexthop global: fe80::1
Nexthop local: ::
BGP connection: shared network
";

    #[test]
    fn test_identity_and_state() {
        let text = "BGP neighbor is 10.0.0.1, remote AS 65000, local AS 65001, external link\n\
                    BGP state = Established, up for 01:02:03\n";
        let (neighbors, anomalies) = parse_bgp_neighbors(text);
        let n = neighbors.get("10.0.0.1").unwrap();
        assert_eq!(n.remote_as.as_deref(), Some("65000"));
        assert_eq!(n.local_as.as_deref(), Some("65001"));
        assert_eq!(n.state.as_deref(), Some("Established"));
        assert_eq!(n.established_up_for.as_deref(), Some("01:02:03"));
        assert!(anomalies.is_empty());

        let json = serde_json::to_value(n).unwrap();
        assert_eq!(json["remoteAS"], "65000");
        assert_eq!(json["localAS"], "65001");
        assert_eq!(json["state"], "Established");
        assert_eq!(json["EstablishedUpFor"], "01:02:03");
    }

    #[test]
    fn test_non_established_state() {
        let text = "BGP neighbor is 10.0.0.9, remote AS 1, local AS 2, internal link\n\
                    BGP state = Active\n";
        let (neighbors, _) = parse_bgp_neighbors(text);
        let n = neighbors.get("10.0.0.9").unwrap();
        assert_eq!(n.state.as_deref(), Some("Active"));
        assert!(n.established_up_for.is_none());
        assert_eq!(n.link_type.as_deref(), Some("internal"));
    }

    #[test]
    fn test_full_neighbor() {
        let (neighbors, anomalies) = parse_bgp_neighbors(NEIGHBOR);
        assert!(anomalies.is_empty());
        let n = neighbors.get("10.0.0.1").unwrap();

        assert_eq!(n.description.as_deref(), Some("spine-1 uplink"));
        assert_eq!(n.bgp_version.as_deref(), Some("4"));
        assert_eq!(n.remote_router_id.as_deref(), Some("2.2.2.2"));
        assert_eq!(n.hold_time, Some(90));
        assert_eq!(n.keep_alive, Some(30));
        assert_eq!(n.configured_hold_time, Some(90));
        assert_eq!(
            n.sent,
            Some(MessageCounters {
                messages: 118,
                notifications: 1,
                in_queue: 0
            })
        );
        assert_eq!(n.min_time_between_adv, Some(30));
        assert_eq!(n.update_source.as_deref(), Some("lo"));
        assert_eq!(
            n.connections,
            Some(ConnectionCounters {
                established: 1,
                dropped: 0
            })
        );
        assert_eq!(n.last_reset.as_deref(), Some("00:10:00"));
        assert_eq!(n.last_reset_due_to.as_deref(), Some("BGP Notification sent"));
        assert_eq!(
            n.notification_error.as_deref(),
            Some("Cease/Administratively Reset.")
        );
        assert_eq!(
            n.local,
            Some(Endpoint {
                host: "10.0.0.2".into(),
                port: 179
            })
        );
        assert_eq!(n.foreign.as_ref().map(|e| e.port), Some(40001));
        assert_eq!(n.nexthop.as_deref(), Some("10.0.0.2"));
        assert_eq!(n.nexthop_global.as_deref(), Some("fe80::1"));
        assert_eq!(n.nexthop_linklocal.as_deref(), Some("::"));
        assert_eq!(n.bgp_connection.as_deref(), Some("shared network"));
    }

    #[test]
    fn test_capabilities_block() {
        let (neighbors, _) = parse_bgp_neighbors(NEIGHBOR);
        let caps = neighbors
            .get("10.0.0.1")
            .and_then(|n| n.capabilities.as_ref())
            .unwrap();
        assert_eq!(
            caps.get("RouteRefresh").map(String::as_str),
            Some("advertised and received (old and new)")
        );
        assert!(caps.contains_key("AddressFamilyIPv4Unicast"));
        assert!(caps.contains_key("4-OctetASNCapability"));
        // the 2-space line after the block went back to neighbor fields
        assert_eq!(caps.len(), 3);
        assert_eq!(
            neighbors.get("10.0.0.1").unwrap().received.map(|r| r.messages),
            Some(120)
        );
    }

    #[test]
    fn test_address_family() {
        let (neighbors, _) = parse_bgp_neighbors(NEIGHBOR);
        let n = neighbors.get("10.0.0.1").unwrap();
        let af = n.address_family.get("IPv4 Unicast").unwrap();

        assert_eq!(af.bgp_table_version, Some(7));
        assert_eq!(af.neighbor_version, Some(7));
        assert_eq!(af.index, Some(1));
        assert_eq!(af.offset, Some(0));
        assert_eq!(af.mask.as_deref(), Some("0x2"));
        assert_eq!(af.flags, vec!["Inbound soft reconfiguration allowed"]);
        assert_eq!(af.community_attribute.as_deref(), Some("both"));
        assert_eq!(
            af.policies.get("RouteMapForIncomingAdvertisements").map(String::as_str),
            Some("RM-IN")
        );
        let orf = af.orf_types.get("64").unwrap();
        assert_eq!(orf.send_mode.as_deref(), Some("advertised"));
        assert_eq!(orf.receive_mode.as_deref(), Some("received"));
        assert_eq!(af.orf.as_deref(), Some("sent;"));
        assert_eq!(af.accepted_prefixes, Some(3));
        assert_eq!(af.announced_prefixes, Some(4));
    }

    #[test]
    fn test_prefix_list_entries_stop_at_blank_line() {
        let (neighbors, _) = parse_bgp_neighbors(NEIGHBOR);
        let af = &neighbors.get("10.0.0.1").unwrap().address_family["IPv4 Unicast"];
        let list = af.prefix_lists.get("PL-ORF").unwrap();
        assert_eq!(list.family, "ip");
        assert_eq!(list.entries, vec!["5 permit 10.0.0.0/8", "10 deny any"]);
    }

    #[test]
    fn test_blank_line_keeps_family_open() {
        let mut parser = BgpNeighborParser::new();
        parser.feed("BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link");
        parser.feed(" For address family: IPv4 Unicast");
        assert_eq!(parser.feed(""), Some("family-blank"));
        assert_eq!(parser.current_family(), Some("IPv4 Unicast"));
        parser.feed("  5 accepted prefixes");
        let af = &parser.neighbors().get("10.0.0.1").unwrap().address_family["IPv4 Unicast"];
        assert_eq!(af.accepted_prefixes, Some(5));
    }

    #[test]
    fn test_orf_mode_without_type_is_ignored() {
        let mut parser = BgpNeighborParser::new();
        parser.feed("BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link");
        parser.feed(" For address family: IPv4 Unicast");
        assert_eq!(parser.feed("      Send-mode: advertised"), None);
        let af = &parser.neighbors().get("10.0.0.1").unwrap().address_family["IPv4 Unicast"];
        assert!(af.orf_types.is_empty());
    }

    #[test]
    fn test_repeated_identity_line_is_idempotent() {
        let text = "\
BGP neighbor is 10.0.0.1, remote AS 65000, local AS 65001, external link
 For address family: IPv4 Unicast
BGP neighbor is 10.0.0.1, vrf RED, remote AS 65099, local AS 65001, external link
  3 accepted prefixes
";
        let (neighbors, _) = parse_bgp_neighbors(text);
        assert_eq!(neighbors.len(), 1);
        let n = neighbors.get("10.0.0.1").unwrap();
        assert_eq!(n.remote_as.as_deref(), Some("65000"));
        // family scope survived the repeated header
        assert_eq!(n.address_family["IPv4 Unicast"].accepted_prefixes, Some(3));
    }

    #[test]
    fn test_vrf_is_captured() {
        let text = "BGP neighbor is 192.0.2.1, vrf BLUE, remote AS 100, local AS 200, external link\n";
        let (neighbors, _) = parse_bgp_neighbors(text);
        assert_eq!(neighbors.get("192.0.2.1").unwrap().vrf.as_deref(), Some("BLUE"));
    }

    #[test]
    fn test_new_neighbor_closes_family() {
        let text = "\
BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link
 For address family: IPv4 Unicast
BGP neighbor is 10.0.0.2, remote AS 3, local AS 2, external link
  7 accepted prefixes
";
        let (neighbors, _) = parse_bgp_neighbors(text);
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.get("10.0.0.2").unwrap().address_family.is_empty());
    }

    #[test]
    fn test_fields_before_any_neighbor_are_dropped() {
        let text = "  BGP state = Established, up for 00:00:01\n  Neighbor capabilities:\n    Route refresh: yes\n";
        let (neighbors, anomalies) = parse_bgp_neighbors(text);
        assert!(neighbors.is_empty());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_unmatched_line_leaves_record_unchanged() {
        let mut parser = BgpNeighborParser::new();
        parser.feed("BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link");
        let before = parser.neighbors().clone();
        assert_eq!(parser.feed("  Some vendor chatter we do not know"), None);
        assert_eq!(parser.neighbors(), &before);
    }

    #[test]
    fn test_non_numeric_value_becomes_anomaly() {
        let text = "\
BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link
  Last read never, hold time is none, keepalive interval is 30 seconds
";
        let (neighbors, anomalies) = parse_bgp_neighbors(text);
        let n = neighbors.get("10.0.0.1").unwrap();
        assert_eq!(n.last_read.as_deref(), Some("never"));
        assert!(n.hold_time.is_none());
        assert_eq!(n.keep_alive, Some(30));
        assert_eq!(anomalies.into_messages().len(), 1);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = serde_json::to_string(&parse_bgp_neighbors(NEIGHBOR).0).unwrap();
        let second = serde_json::to_string(&parse_bgp_neighbors(NEIGHBOR).0).unwrap();
        assert_eq!(first, second);
    }

    const PEER_GROUP_NEIGHBOR: &str = "\
BGP neighbor is 10.0.0.5, remote AS 65010, local AS 65001, external link
  Member of peer-group SPINES for session parameters
  BGP version 4, local router ID 1.1.1.1, remote router ID 5.5.5.5
  BGP state = Active
  Bidirectional Forwarding Detection is enabled
  Capability error: Unsupported Capability
  Next connect timer due in 12 seconds
  External BGP neighbor may be up to 2 hops away.
  Remote restart time is 120 sec
  Re-established, 3 times

 For address family: IPv4 Unicast
  SPINES peer-group member
  Graceful restart: advertised, received
  Default information originate, default sent
  Weight 100
  AF-dependant capabilities:
    Outbound Route Filter (ORF) type (128) Prefix-list:
      Send-mode: advertised
      Receive-mode: received
  2 accepted prefixes

 For address family: IPv6 Unicast
  BGP table version 3, neighbor version 3
  SPINES6 peer-group member
  1 accepted prefixes
";

    #[test]
    fn test_session_fields() {
        let (neighbors, anomalies) = parse_bgp_neighbors(PEER_GROUP_NEIGHBOR);
        assert!(anomalies.is_empty());
        let n = neighbors.get("10.0.0.5").unwrap();

        assert_eq!(n.member_of_peer_group.as_deref(), Some("SPINES"));
        assert_eq!(n.state.as_deref(), Some("Active"));
        assert_eq!(n.bfd.as_deref(), Some("enabled"));
        assert_eq!(n.capability_error.as_deref(), Some("Unsupported Capability"));
        assert_eq!(n.next_connect_timer, Some(12));
        assert_eq!(n.external_bgp_hops, Some(2));
        assert_eq!(n.graceful_restart_remote_restart_time, Some(120));
        assert_eq!(
            n.graceful_restart_reestablished_status.as_deref(),
            Some("3 times")
        );

        let json = serde_json::to_value(n).unwrap();
        assert_eq!(json["MemberOfPeerGroup"], "SPINES");
        assert_eq!(json["BFD"], "enabled");
        assert_eq!(json["externalBGPHops"], 2);
        assert_eq!(json["nextConnectTimer"], 12);
        assert_eq!(json["gracefulRestartRemoteRestartTime"], 120);
    }

    #[test]
    fn test_two_families_on_one_neighbor() {
        let (neighbors, _) = parse_bgp_neighbors(PEER_GROUP_NEIGHBOR);
        let n = neighbors.get("10.0.0.5").unwrap();
        let families: Vec<&str> = n.address_family.keys().map(String::as_str).collect();
        assert_eq!(families, vec!["IPv4 Unicast", "IPv6 Unicast"]);

        let v4 = &n.address_family["IPv4 Unicast"];
        assert_eq!(v4.peer_group_member.as_deref(), Some("SPINES"));
        assert_eq!(v4.graceful_restart.as_deref(), Some("advertised, received"));
        assert_eq!(v4.accepted_prefixes, Some(2));
        assert!(v4.bgp_table_version.is_none());

        let v6 = &n.address_family["IPv6 Unicast"];
        assert_eq!(v6.peer_group_member.as_deref(), Some("SPINES6"));
        assert_eq!(v6.bgp_table_version, Some(3));
        assert_eq!(v6.accepted_prefixes, Some(1));
        assert!(v6.orf_types.is_empty());
        assert!(v6.graceful_restart.is_none());
    }

    #[test]
    fn test_orf_type_128() {
        let (neighbors, _) = parse_bgp_neighbors(PEER_GROUP_NEIGHBOR);
        let v4 = &neighbors.get("10.0.0.5").unwrap().address_family["IPv4 Unicast"];
        assert_eq!(v4.orf_types.len(), 1);
        let orf = v4.orf_types.get("128").unwrap();
        assert_eq!(orf.send_mode.as_deref(), Some("advertised"));
        assert_eq!(orf.receive_mode.as_deref(), Some("received"));

        let json = serde_json::to_value(v4).unwrap();
        assert_eq!(json["ORFType"]["128"]["sendMode"], "advertised");
        assert_eq!(json["GracefulRestart"], "advertised, received");
        assert_eq!(json["peerGroupMember"], "SPINES");
    }

    #[test]
    fn test_policy_keys() {
        let (neighbors, _) = parse_bgp_neighbors(PEER_GROUP_NEIGHBOR);
        let v4 = &neighbors.get("10.0.0.5").unwrap().address_family["IPv4 Unicast"];
        assert_eq!(
            v4.policies.get("DefaultInformationOriginate").map(String::as_str),
            Some("default sent")
        );
        assert_eq!(v4.policies.get("Weight").map(String::as_str), Some("100"));

        let json = serde_json::to_value(v4).unwrap();
        assert_eq!(json["DefaultInformationOriginate"], "default sent");
        assert_eq!(json["Weight"], "100");
    }

    #[test]
    fn test_filter_list_policy_drops_is() {
        let mut parser = BgpNeighborParser::new();
        parser.feed("BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link");
        parser.feed(" For address family: IPv4 Unicast");
        assert_eq!(
            parser.feed("  Incoming update prefix filter list is *PL-IN"),
            Some("policy")
        );
        let af = &parser.neighbors().get("10.0.0.1").unwrap().address_family["IPv4 Unicast"];
        assert_eq!(
            af.policies.get("IncomingUpdatePrefixFilterList").map(String::as_str),
            Some("*PL-IN")
        );
    }

    #[test]
    fn test_family_rules_outside_family_are_ignored() {
        let mut parser = BgpNeighborParser::new();
        parser.feed("BGP neighbor is 10.0.0.1, remote AS 1, local AS 2, external link");
        assert_eq!(parser.feed("  SPINES peer-group member"), None);
        assert_eq!(parser.feed("  Graceful restart: advertised"), None);
        assert!(parser.neighbors().get("10.0.0.1").unwrap().address_family.is_empty());
    }
}
