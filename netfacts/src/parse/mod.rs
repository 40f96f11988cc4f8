//! Text-to-fact engine primitives.
//!
//! A parser for one fact category is a [`LineScanner`] feeding lines into a
//! [`RuleTable`] whose handlers read and mutate a [`ParseContext`] and write
//! into a [`FactTree`].

mod context;
mod rules;
mod scanner;
mod tree;

pub use context::ParseContext;
pub use rules::{Action, Guard, Phase, Rule, RuleTable, RuleTableBuilder};
pub use scanner::{Line, LineScanner, scan};
pub use tree::{Anomalies, FactTree, NOT_AVAILABLE, or_na, set_once};

use regex::{Captures, Regex};

/// Compact a space separated label into a single key.
///
/// Every space is dropped and the character following it is upper-cased,
/// so `"route refresh"` becomes `"routeRefresh"`.
pub fn compact_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut upper = false;
    for c in label.trim().chars() {
        if c == ' ' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Text of capture group `i`, or `""` when the group did not participate.
pub(crate) fn cap<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

/// First capture group of the first match of `pattern` in `text`.
pub(crate) fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
