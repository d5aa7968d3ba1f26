//! Shared boolean condition algebra evaluated over the data dictionary.
//!
//! Structurally grounded on a recursive `And`/`Or`/`Not` condition tree
//! whose atoms are evaluated with a single `matches` method — the same
//! shape used elsewhere in this workspace for glob-based access rules,
//! generalised here to the field/operator/value algebra this system
//! needs.

#![deny(unsafe_code)]

use gst_dict::DataDictionary;
use serde::{Deserialize, Serialize};

/// Comparison operator for a [`ConditionAtom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Default operator. Numeric equality if both sides parse as numbers,
    /// otherwise case-insensitive string equality (unless
    /// `case_sensitive` is set).
    Equals,
    /// Negation of [`Operator::Equals`].
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

impl Default for Operator {
    fn default() -> Self {
        Self::Equals
    }
}

/// A single leaf condition: a comparison against one dictionary field.
///
/// A missing field is treated as an empty string, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionAtom {
    /// Dictionary key to read.
    pub field: String,
    /// Comparison operator. Defaults to [`Operator::Equals`].
    #[serde(default)]
    pub operator: Operator,
    /// Comparison value for scalar operators. Ignored by `is_empty` /
    /// `is_not_empty` and by the `min`/`max` range form.
    #[serde(default)]
    pub value: Option<String>,
    /// Inclusive numeric range lower bound. Presence of `min` or `max`
    /// switches this atom into numeric-range mode regardless of
    /// `operator`.
    #[serde(default)]
    pub min: Option<String>,
    /// Inclusive numeric range upper bound.
    #[serde(default)]
    pub max: Option<String>,
    /// When `true`, string comparisons are case-sensitive. Defaults to
    /// `false` (case-insensitive), matching `equals`'s default posture.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl ConditionAtom {
    fn eval(&self, dict: &DataDictionary) -> bool {
        let actual = dict.get(&self.field).unwrap_or("");

        if self.min.is_some() || self.max.is_some() {
            return self.eval_range(actual);
        }

        match self.operator {
            Operator::IsEmpty => actual.is_empty(),
            Operator::IsNotEmpty => !actual.is_empty(),
            Operator::Equals => self.string_eq(actual),
            Operator::NotEquals => !self.string_eq(actual),
            Operator::Contains => self.compare_str(actual, |a, v| a.contains(v)),
            Operator::StartsWith => self.compare_str(actual, |a, v| a.starts_with(v)),
            Operator::EndsWith => self.compare_str(actual, |a, v| a.ends_with(v)),
            Operator::GreaterThan => self.numeric_cmp(actual, |a, v| a > v),
            Operator::LessThan => self.numeric_cmp(actual, |a, v| a < v),
            Operator::GreaterThanOrEqual => self.numeric_cmp(actual, |a, v| a >= v),
            Operator::LessThanOrEqual => self.numeric_cmp(actual, |a, v| a <= v),
        }
    }

    fn eval_range(&self, actual: &str) -> bool {
        let Some(actual_num) = gst_util::parse_decimal(actual) else {
            return false;
        };
        if let Some(min) = &self.min {
            let Some(min_num) = gst_util::parse_decimal(min) else {
                return false;
            };
            if actual_num < min_num {
                return false;
            }
        }
        if let Some(max) = &self.max {
            let Some(max_num) = gst_util::parse_decimal(max) else {
                return false;
            };
            if actual_num > max_num {
                return false;
            }
        }
        true
    }

    fn string_eq(&self, actual: &str) -> bool {
        let Some(expected) = &self.value else {
            return false;
        };
        if let (Some(a), Some(b)) = (gst_util::parse_decimal(actual), gst_util::parse_decimal(expected)) {
            return a == b;
        }
        if self.case_sensitive {
            actual == expected
        } else {
            actual.eq_ignore_ascii_case(expected)
        }
    }

    fn compare_str(&self, actual: &str, f: impl Fn(&str, &str) -> bool) -> bool {
        let Some(expected) = &self.value else {
            return false;
        };
        if self.case_sensitive {
            f(actual, expected)
        } else {
            f(&actual.to_ascii_lowercase(), &expected.to_ascii_lowercase())
        }
    }

    fn numeric_cmp(
        &self,
        actual: &str,
        f: impl Fn(rust_decimal::Decimal, rust_decimal::Decimal) -> bool,
    ) -> bool {
        let Some(expected) = &self.value else {
            return false;
        };
        match (gst_util::parse_decimal(actual), gst_util::parse_decimal(expected)) {
            (Some(a), Some(b)) => f(a, b),
            _ => false,
        }
    }
}

/// A condition: either a leaf [`ConditionAtom`] or a recursive compound of
/// `allOf` / `anyOf` / `not`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// All sub-conditions must match. `allOf([])` is vacuously `true`.
    AllOf {
        #[serde(rename = "allOf")]
        all_of: Vec<Condition>,
    },
    /// At least one sub-condition must match. `anyOf([])` is `false`.
    AnyOf {
        #[serde(rename = "anyOf")]
        any_of: Vec<Condition>,
    },
    /// Negates the wrapped condition.
    Not {
        not: Box<Condition>,
    },
    /// A leaf comparison.
    Atom(ConditionAtom),
}

impl Condition {
    /// Evaluate this condition tree against `dict`.
    #[must_use]
    pub fn matches(&self, dict: &DataDictionary) -> bool {
        match self {
            Self::AllOf { all_of } => all_of.iter().all(|c| c.matches(dict)),
            Self::AnyOf { any_of } => any_of.iter().any(|c| c.matches(dict)),
            Self::Not { not } => !not.matches(dict),
            Self::Atom(atom) => atom.eval(dict),
        }
    }

    /// Construct a simple equality atom, a common case in tests and
    /// programmatic rule construction.
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Atom(ConditionAtom {
            field: field.into(),
            operator: Operator::Equals,
            value: Some(value.into()),
            min: None,
            max: None,
            case_sensitive: false,
        })
    }
}
