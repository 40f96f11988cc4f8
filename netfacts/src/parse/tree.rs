//! Fact tree builder: entity records keyed by entity identifier.

use indexmap::IndexMap;
use indexmap::map::Iter;
use log::debug;
use serde::{Serialize, Serializer};

/// Ordered map of entity key to fact record.
///
/// Records are created lazily on first reference and then only ever updated,
/// never replaced, so facts from several commands can land on the same
/// entity. Iteration follows first-insertion order, which keeps output
/// deterministic for identical input.
#[derive(Debug, Clone, PartialEq)]
pub struct FactTree<R> {
    records: IndexMap<String, R>,
}

impl<R> Default for FactTree<R> {
    fn default() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }
}

impl<R> FactTree<R> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for `key`, creating a default one if needed.
    pub fn get_or_create(&mut self, key: &str) -> &mut R
    where
        R: Default,
    {
        if !self.records.contains_key(key) {
            self.records.insert(key.to_string(), R::default());
        }
        &mut self.records[key]
    }

    /// Get the record for `key` if it exists.
    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.get(key)
    }

    /// Get the record for `key` mutably if it exists.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut R> {
        self.records.get_mut(key)
    }

    /// Whether a record exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record exists.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(key, record)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, String, R> {
        self.records.iter()
    }

    /// Consume the tree into its underlying map.
    pub fn into_inner(self) -> IndexMap<String, R> {
        self.records
    }
}

impl<R: Serialize> Serialize for FactTree<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

/// Write `value` into `slot` only if nothing was written before.
///
/// Used for identity fields where the first sighting is authoritative.
pub fn set_once<T>(slot: &mut Option<T>, value: T) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Collected parse anomalies for one scan.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Anomalies {
    messages: Vec<String>,
}

impl Anomalies {
    /// Parse an integer field, recording an anomaly and returning `None`
    /// when the text is not a number.
    pub fn int(&mut self, field: &str, raw: &str) -> Option<u64> {
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                debug!("{}: expected integer, got {:?}", field, raw);
                self.messages
                    .push(format!("Non-numeric value '{}' for {}", raw.trim(), field));
                None
            }
        }
    }

    /// Record a free-form anomaly.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Append everything recorded in `other`.
    pub fn absorb(&mut self, other: Anomalies) {
        self.messages.extend(other.messages);
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take the recorded messages.
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Sentinel written for facts the device did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Serialize `None` as the [`NOT_AVAILABLE`] sentinel.
pub fn or_na<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}
