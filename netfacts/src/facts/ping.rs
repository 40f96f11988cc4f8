//! Ping result summary.
//!
//! Only the last two lines of the ping output matter: the packet statistics
//! line and the round-trip line.
//!
//! ```text
//! 5 packets transmitted, 5 received, 0% packet loss, time 4114ms
//! rtt min/avg/max/mdev = 0.102/0.139/0.164/0.025 ms
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

static STATS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<tx>\d+)\s+\w+\s+\w+,\s+(?P<rx>\d+)\s+\w+,(.*|[+]?(?P<err>\d+)\s+\w+,)\s+(?P<pct>\d+)%\s+",
    )
    .unwrap()
});
static RTT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+\s+\w+/\w+/\w+/\w+\s+=\s+(?P<min>\d+\.\d+)/(?P<avg>\d+\.\d+)/(?P<max>\d+\.\d+)")
        .unwrap()
});

const UNREACHABLE: &str = "%Network is unreachable";

/// Round-trip times in milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct RoundTrip {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// Parsed outcome of a ping run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PingSummary {
    #[serde(serialize_with = "percent")]
    pub packet_loss: u32,
    pub packets_rx: u64,
    pub packets_tx: u64,
    pub rtt: RoundTrip,
}

fn percent<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value}%"))
}

impl PingSummary {
    fn unreachable() -> Self {
        Self {
            packet_loss: 100,
            packets_rx: 0,
            packets_tx: 0,
            rtt: RoundTrip::default(),
        }
    }

    /// Whether the result matches the expectation: some reply when the
    /// destination should be reachable, none when it should not.
    pub fn meets(&self, expect_reachable: bool) -> bool {
        if expect_reachable {
            self.packet_loss < 100
        } else {
            self.packet_loss == 100
        }
    }
}

fn number<T: std::str::FromStr + Default>(c: &Captures<'_>, name: &str) -> T {
    c.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or_default()
}

/// Summarize ping output. Returns `None` when there are fewer than two
/// lines to look at.
///
/// When the statistics line is not where it is expected, the last line is
/// tried instead and the round-trip times stay at zero. Output with no
/// statistics at all counts as total loss.
pub fn parse_ping_summary(output: &str) -> Option<PingSummary> {
    let lines: Vec<&str> = output.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let [.., stats, rtts] = lines[..] else {
        return None;
    };
    if rtts.starts_with(UNREACHABLE) {
        return Some(PingSummary::unreachable());
    }

    let (rate, rtt) = match STATS.captures(stats) {
        Some(rate) => (Some(rate), RTT.captures(rtts)),
        None => (STATS.captures(rtts), None),
    };
    let Some(rate) = rate else {
        return Some(PingSummary::unreachable());
    };
    let rtt = rtt.map_or_else(RoundTrip::default, |c| RoundTrip {
        min: number(&c, "min"),
        avg: number(&c, "avg"),
        max: number(&c, "max"),
    });

    Some(PingSummary {
        packet_loss: number(&rate, "pct"),
        packets_rx: number(&rate, "rx"),
        packets_tx: number(&rate, "tx"),
        rtt,
    })
}
