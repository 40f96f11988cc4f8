//! Default facts: software version, hardware model, image and hostname.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::parse::{first_capture, or_na};

static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^ Software Product: OcNOS, Version: (.*)").unwrap());
static MODEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^ Hardware Model: (.*)").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi) Image Filename: (.*)").unwrap());

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultFacts {
    #[serde(serialize_with = "or_na")]
    pub version: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub model: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub image: Option<String>,
    #[serde(serialize_with = "or_na")]
    pub hostname: Option<String>,
}

/// Build default facts from `show version` and `show hostname` output.
pub fn parse_default(version: Option<&str>, hostname: Option<&str>) -> DefaultFacts {
    let field = |re: &Lazy<Regex>| {
        version
            .and_then(|text| first_capture(re, text))
            .map(|v| v.trim_end().to_string())
    };
    let hostname = hostname
        .map(|h| h.replace(['\r', '\n'], "").trim().to_string())
        .filter(|h| !h.is_empty());

    DefaultFacts {
        version: field(&VERSION),
        model: field(&MODEL),
        image: field(&IMAGE),
        hostname,
    }
}
