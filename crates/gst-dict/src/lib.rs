//! Shared string-to-string data dictionary carrying all inter-component
//! data within a workflow execution.
//!
//! Storage is canonical string form — see the design note this crate is
//! built against: "do not replace with a union/any type; the string
//! normalisation is load-bearing for workflow reproducibility." Typed
//! views are derived on demand by the accessors below.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mutable string→string map shared across a workflow run.
///
/// Backed by a `BTreeMap` rather than a `HashMap` so that serialization
/// and iteration order are deterministic — load-bearing for reproducible
/// logs and snapshot-style tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataDictionary {
    entries: BTreeMap<String, String>,
}

impl DataDictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a dictionary from an initial set of key-value pairs, as the
    /// orchestrator does with a workflow's `initial_parameters`.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Raw string lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set (or overwrite) a key's string value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, returning its prior value if present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge another dictionary's entries into this one, overwriting on
    /// key collision.
    pub fn merge(&mut self, other: &DataDictionary) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    /// Parse the value at `key` as a [`rust_decimal::Decimal`] using the
    /// currency-aware numeric parser.
    #[must_use]
    pub fn get_decimal(&self, key: &str) -> Option<rust_decimal::Decimal> {
        self.get(key).and_then(gst_util::parse_decimal)
    }

    /// Parse the value at `key` as an `i64`.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|s| s.trim().parse().ok())
    }

    /// Parse the value at `key` as a bool. Accepts (case-insensitively)
    /// `"true"`/`"false"`, `"1"`/`"0"`, `"yes"`/`"no"`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }

    /// Resolve `{{key}}` placeholders in `template` from this dictionary.
    #[must_use]
    pub fn resolve(&self, template: &str) -> String {
        gst_util::substitute(template, |key| self.get(key).map(str::to_string))
    }

    /// Borrow the underlying map (e.g. for log redaction at a call site
    /// that needs to filter sensitive keys before formatting).
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl fmt::Display for DataDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut dict = DataDictionary::new();
        dict.set("loan_number", "1000001");
        assert_eq!(dict.get("loan_number"), Some("1000001"));
    }

    #[test]
    fn missing_key_is_none() {
        let dict = DataDictionary::new();
        assert_eq!(dict.get("nope"), None);
    }

    #[test]
    fn get_decimal_parses_currency() {
        let mut dict = DataDictionary::new();
        dict.set("current_balance", "$198,543.21");
        assert_eq!(
            dict.get_decimal("current_balance"),
            gst_util::parse_decimal("198543.21")
        );
    }

    #[test]
    fn get_int_parses_plain_integer() {
        let mut dict = DataDictionary::new();
        dict.set("port", "2323");
        assert_eq!(dict.get_int("port"), Some(2323));
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let mut dict = DataDictionary::new();
        dict.set("flag_true", "true");
        dict.set("flag_yes", "Yes");
        dict.set("flag_false", "0");
        assert_eq!(dict.get_bool("flag_true"), Some(true));
        assert_eq!(dict.get_bool("flag_yes"), Some(true));
        assert_eq!(dict.get_bool("flag_false"), Some(false));
        assert_eq!(dict.get_bool("missing"), None);
    }

    #[test]
    fn resolve_substitutes_from_dictionary() {
        let mut dict = DataDictionary::new();
        dict.set("user_id", "TESTUSER");
        assert_eq!(dict.resolve("user: {{user_id}}"), "user: TESTUSER");
        assert_eq!(dict.resolve("unknown: {{nope}}"), "unknown: {{nope}}");
    }

    #[test]
    fn merge_overwrites_on_collision() {
        let mut a = DataDictionary::new();
        a.set("x", "1");
        let mut b = DataDictionary::new();
        b.set("x", "2");
        b.set("y", "3");
        a.merge(&b);
        assert_eq!(a.get("x"), Some("2"));
        assert_eq!(a.get("y"), Some("3"));
    }

    #[test]
    fn iteration_order_is_deterministic() {
        let mut dict = DataDictionary::new();
        dict.set("zebra", "1");
        dict.set("alpha", "2");
        let keys: Vec<&str> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha", "zebra"]);
    }

    #[test]
    fn serde_round_trip() {
        let mut dict = DataDictionary::new();
        dict.set("a", "1");
        let json = serde_json::to_string(&dict).unwrap();
        let back: DataDictionary = serde_json::from_str(&json).unwrap();
        assert_eq!(dict, back);
    }
}
