//! Hardware facts: memory, board information, CPU cores, sensors and
//! power LEDs.

use indexmap::IndexMap;
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::parse::{Anomalies, RuleTable, cap, first_capture, or_na, scan};

static MEM_TOTAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^Total\s*:(.*) MB").unwrap());
static MEM_FREE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^Free\s*:(.*) MB").unwrap());
static SERIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^Serial Number\s+: (\S+)").unwrap());
static PRODUCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^Product Name\s+: (\S+)").unwrap());
static VENDOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^Vendor Name\s+: (\S+)").unwrap());

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-+$").unwrap());
static SENSOR_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(\S+)\s+\|\s+(\S+)\s+\|\s+([\S\s]+)\s+\|\s+(\S+)\s*\|",
        r"\s+(\S+)\s+\|\s+(\S+)\s+\|\s+(\S+)\s+\|\s+(\S+)\s+\|\s+(\S+)\s+\|\s+(\S+)"
    ))
    .unwrap()
});
static LED_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+)\s+(\S+)\s+(.+)$").unwrap());

/// Hardware facts. Every field the device did not report is `N/A`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct HardwareFacts {
    #[serde(serialize_with = "or_na")]
    pub memtotal_mb: Option<u64>,
    #[serde(serialize_with = "or_na")]
    pub memfree_mb: Option<u64>,
    #[serde(serialize_with = "or_na")]
    pub serialnum: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub vendor: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub product: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub cpu: Option<IndexMap<String, CpuCore>>,
    #[serde(serialize_with = "or_na")]
    pub ocnos_sensor: Option<IndexMap<String, SensorReading>>,
    #[serde(serialize_with = "or_na")]
    pub power_led: Option<IndexMap<String, PowerLed>>,
}

/// A CPU core with its model string and, when reported, its load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CpuCore {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<String>,
}

/// One row of the sensor table with its thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SensorReading {
    pub value: String,
    pub units: String,
    pub state: String,
    pub lnr: String,
    pub lcr: String,
    pub lnc: String,
    pub unc: String,
    pub ucr: String,
    pub unr: String,
}

/// A power LED and its color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerLed {
    pub color: String,
    pub description: String,
}

/// Raw outputs feeding the hardware category.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareSources<'a> {
    pub memory: Option<&'a str>,
    pub board: Option<&'a str>,
    pub cpu: Option<&'a str>,
    pub cpu_load: Option<&'a str>,
    pub sensor: Option<&'a str>,
    pub led: Option<&'a str>,
}

/// Build hardware facts from whichever sources are present.
pub fn parse_hardware(sources: &HardwareSources<'_>, anomalies: &mut Anomalies) -> HardwareFacts {
    let mut facts = HardwareFacts::default();

    if let Some(memory) = sources.memory {
        facts.memtotal_mb = first_capture(&MEM_TOTAL, memory).and_then(|v| anomalies.int("memtotal_mb", v));
        facts.memfree_mb = first_capture(&MEM_FREE, memory).and_then(|v| anomalies.int("memfree_mb", v));
    }
    if let Some(board) = sources.board {
        facts.serialnum = first_capture(&SERIAL, board).map(str::to_string);
        facts.vendor = first_capture(&VENDOR, board).map(str::to_string);
        facts.product = first_capture(&PRODUCT, board).map(str::to_string);
    }
    if let Some(cpu) = sources.cpu {
        facts.cpu = Some(parse_cpu(cpu, sources.cpu_load));
    }
    if let Some(sensor) = sources.sensor {
        facts.ocnos_sensor = Some(parse_sensors(sensor));
    }
    if let Some(led) = sources.led {
        facts.power_led = Some(parse_power_leds(led));
    }
    facts
}

#[derive(Default)]
struct CpuScan {
    cores: IndexMap<String, CpuCore>,
    pending: Option<String>,
    reading_load: bool,
}

impl CpuScan {
    fn reading_models(&self) -> bool {
        !self.reading_load
    }

    fn reading_load(&self) -> bool {
        self.reading_load
    }

    fn has_pending(&self) -> bool {
        !self.reading_load && self.pending.is_some()
    }
}

static CPU_RULES: Lazy<RuleTable<CpuScan>> = Lazy::new(|| {
    RuleTable::<CpuScan>::builder()
        .open("processor", r"^Processor\s+:\s(\S+).*$", |s, c| {
            let core = cap(c, 1).to_string();
            s.cores.insert(
                core.clone(),
                CpuCore {
                    model: cap(c, 0).to_string(),
                    load: None,
                },
            );
            s.pending = Some(core);
        })
        .when(CpuScan::reading_models)
        .field("model", r"^Model\s+:\s(.+)", |s, c| {
            if let Some(core) = s.pending.take().and_then(|k| s.cores.get_mut(&k)) {
                core.model = cap(c, 1).to_string();
            }
        })
        .when(CpuScan::has_pending)
        .field("core-usage", r"^CPU core (\S+) Usage\s+:\s(.+)", |s, c| {
            match s.cores.get_mut(cap(c, 1)) {
                Some(core) => core.load = Some(cap(c, 2).to_string()),
                None => trace!("hardware: load for unknown core {:?} dropped", cap(c, 1)),
            }
        })
        .when(CpuScan::reading_load)
        .build()
        .expect("built-in CPU rules compile")
});

/// Correlate `Processor`/`Model` pairs with per-core load lines.
///
/// A processor with no `Model` line keeps its `Processor` line as model
/// text. Load lines for cores the first command did not list are dropped.
pub fn parse_cpu(cpu: &str, load: Option<&str>) -> IndexMap<String, CpuCore> {
    let mut state = CpuScan::default();
    for line in scan(cpu) {
        CPU_RULES.dispatch(&mut state, line.text);
    }
    state.reading_load = true;
    for line in scan(load.unwrap_or_default()) {
        CPU_RULES.dispatch(&mut state, line.text);
    }
    state.cores
}

/// Parse the pipe separated sensor table that follows the dashed rule.
pub fn parse_sensors(text: &str) -> IndexMap<String, SensorReading> {
    scan(text)
        .skip_while(|line| !SEPARATOR.is_match(line.text))
        .skip(1)
        .filter_map(|line| SENSOR_ROW.captures(line.text))
        .map(|c| {
            let reading = SensorReading {
                value: cap(&c, 2).to_string(),
                units: cap(&c, 3).trim_end().to_string(),
                state: cap(&c, 4).to_string(),
                lnr: cap(&c, 5).to_string(),
                lcr: cap(&c, 6).to_string(),
                lnc: cap(&c, 7).to_string(),
                unc: cap(&c, 8).to_string(),
                ucr: cap(&c, 9).to_string(),
                unr: cap(&c, 10).to_string(),
            };
            (cap(&c, 1).to_string(), reading)
        })
        .collect()
}

/// Parse LED rows, which start after the second dashed rule.
pub fn parse_power_leds(text: &str) -> IndexMap<String, PowerLed> {
    let mut rules_left = 2;
    let mut leds = IndexMap::new();
    for line in scan(text) {
        if rules_left > 0 {
            if SEPARATOR.is_match(line.text) {
                rules_left -= 1;
            }
            continue;
        }
        if let Some(c) = LED_ROW.captures(line.text) {
            leds.insert(
                cap(&c, 1).to_string(),
                PowerLed {
                    color: cap(&c, 2).to_string(),
                    description: cap(&c, 3).to_string(),
                },
            );
        }
    }
    leds
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMORY: &str = "\
Total     : 15921 MB
Used      : 3021 MB
Free      : 12900 MB
";

    const BOARD: &str = "\
Serial Number          : AB1234567
Product Name           : AS7326-56X
Vendor Name            : Edgecore
";

    const CPU: &str = "\
Processor   : 0
Model       : Intel(R) Xeon(R) CPU D-1518 @ 2.20GHz

Processor   : 1
Model       : Intel(R) Xeon(R) CPU D-1518 @ 2.20GHz
Processor   : 2
";

    const CPU_LOAD: &str = "\
CPU core 0 Usage         : 3.5%
CPU core 1 Usage         : 1.0%
CPU core 7 Usage         : 9.9%
";

    const SENSOR: &str = "\
Sensor        | Value  | Units    | State | LNR | LCR | LNC | UNC | UCR | UNR
--------------
CPU_Temp      | 45.000 | degrees C | ok    | na  | na  | na  | 90.000 | 95.000 | na
";

    const LED: &str = "\
LED status
----------
Name   Color  Description
----------
PSU1   green  Power supply OK
PSU2   off    Not present
";

    #[test]
    fn test_memory_and_board() {
        let sources = HardwareSources {
            memory: Some(MEMORY),
            board: Some(BOARD),
            ..Default::default()
        };
        let facts = parse_hardware(&sources, &mut Anomalies::default());
        assert_eq!(facts.memtotal_mb, Some(15921));
        assert_eq!(facts.memfree_mb, Some(12900));
        assert_eq!(facts.serialnum.as_deref(), Some("AB1234567"));
        assert_eq!(facts.product.as_deref(), Some("AS7326-56X"));
        assert_eq!(facts.vendor.as_deref(), Some("Edgecore"));
    }

    #[test]
    fn test_cpu_load_joins_known_cores_only() {
        let cores = parse_cpu(CPU, Some(CPU_LOAD));
        assert_eq!(cores.len(), 3);
        assert_eq!(cores["0"].model, "Intel(R) Xeon(R) CPU D-1518 @ 2.20GHz");
        assert_eq!(cores["0"].load.as_deref(), Some("3.5%"));
        assert_eq!(cores["1"].load.as_deref(), Some("1.0%"));
        assert_eq!(cores["2"].model, "Processor   : 2");
        assert!(cores["2"].load.is_none());
        assert!(!cores.contains_key("7"));
    }

    #[test]
    fn test_cpu_without_load_source() {
        let cores = parse_cpu(CPU, None);
        assert!(cores.values().all(|c| c.load.is_none()));
    }

    #[test]
    fn test_sensor_rows() {
        let sensors = parse_sensors(SENSOR);
        let temp = sensors.get("CPU_Temp").unwrap();
        assert_eq!(temp.value, "45.000");
        assert_eq!(temp.units, "degrees C");
        assert_eq!(temp.state, "ok");
        assert_eq!(temp.unc, "90.000");
        assert_eq!(temp.ucr, "95.000");
        assert_eq!(temp.unr, "na");

        let json = serde_json::to_value(temp).unwrap();
        assert_eq!(json["VALUE"], "45.000");
        assert_eq!(json["LNR"], "na");
    }

    #[test]
    fn test_power_leds_after_second_rule() {
        let leds = parse_power_leds(LED);
        assert_eq!(leds.len(), 2);
        assert_eq!(leds["PSU1"].color, "green");
        assert_eq!(leds["PSU2"].description, "Not present");
        assert!(!leds.contains_key("Name"));
    }

    #[test]
    fn test_absent_sources_are_na() {
        let facts = parse_hardware(&HardwareSources::default(), &mut Anomalies::default());
        let json = serde_json::to_value(&facts).unwrap();
        for key in ["memtotal_mb", "serialnum", "cpu", "ocnos_sensor", "power_led"] {
            assert_eq!(json[key], "N/A", "{key}");
        }
    }

    #[test]
    fn test_non_numeric_memory_is_anomaly() {
        let mut anomalies = Anomalies::default();
        let sources = HardwareSources {
            memory: Some("Total : lots MB\n"),
            ..Default::default()
        };
        let facts = parse_hardware(&sources, &mut anomalies);
        assert!(facts.memtotal_mb.is_none());
        assert!(!anomalies.is_empty());
    }

    #[test]
    fn test_cpu_rules_follow_the_source() {
        let mut state = CpuScan::default();
        assert_eq!(CPU_RULES.dispatch(&mut state, "CPU core 0 Usage : 5%"), None);
        assert_eq!(CPU_RULES.dispatch(&mut state, "Processor   : 0"), Some("processor"));
        assert_eq!(CPU_RULES.dispatch(&mut state, "Model       : ARMv8"), Some("model"));
        // a second Model line has no processor to attach to
        assert_eq!(CPU_RULES.dispatch(&mut state, "Model       : other"), None);

        state.reading_load = true;
        assert_eq!(CPU_RULES.dispatch(&mut state, "Processor   : 4"), None);
        assert_eq!(
            CPU_RULES.dispatch(&mut state, "CPU core 0 Usage : 5%"),
            Some("core-usage")
        );
        assert_eq!(state.cores.len(), 1);
        assert_eq!(state.cores["0"].model, "ARMv8");
        assert_eq!(state.cores["0"].load.as_deref(), Some("5%"));
    }
}
