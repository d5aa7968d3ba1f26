//! Engine configuration: the `connection + screen_catalog_path + steps`
//! JSON shape this component reads from its
//! [`gst_component::ComponentConfiguration::config_blob`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_terminal_type() -> String {
    "IBM-3477-FC".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_terminal_type")]
    pub terminal_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

/// Backoff shape for a step's `retry` setting — exponential or fixed, as
/// spec'd, without the jitter the server-connect retry in this workspace
/// applies: test determinism matters more here than avoiding thundering
/// herds against a mock screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    Fixed { max_attempts: u32, delay_ms: u64 },
    Exponential { max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64 },
}

impl RetryPolicy {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Fixed { max_attempts, .. } | Self::Exponential { max_attempts, .. } => *max_attempts,
        }
    }

    /// Delay before the attempt *after* `attempt` (zero-indexed).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay_ms, .. } => Duration::from_millis(*delay_ms),
            Self::Exponential { base_delay_ms, max_delay_ms, .. } => {
                let exp = 2u64.saturating_pow(attempt);
                let delay = base_delay_ms.saturating_mul(exp).min(*max_delay_ms);
                Duration::from_millis(delay)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    FailFast,
    LogAndContinue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertOperator {
    #[default]
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

impl AssertOperator {
    #[must_use]
    pub fn matches(&self, actual: &str, expected: &str, case_sensitive: bool) -> bool {
        let (actual, expected) = if case_sensitive {
            (actual.to_string(), expected.to_string())
        } else {
            (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
        };
        match self {
            Self::Equals => actual == expected,
            Self::Contains => actual.contains(&expected),
            Self::StartsWith => actual.starts_with(&expected),
            Self::EndsWith => actual.ends_with(&expected),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Navigate {
        #[serde(default)]
        fields: BTreeMap<String, String>,
        aid_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_screen: Option<String>,
    },
    Assert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_screen: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_row: Option<u16>,
        #[serde(default)]
        assert_fields: BTreeMap<String, String>,
        #[serde(default)]
        assert_operator: AssertOperator,
        #[serde(default)]
        case_sensitive: bool,
    },
    Scrape {
        scrape_fields: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(flatten)]
    pub kind: StepKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default)]
    pub on_failure: OnFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub connection: ConnectionConfig,
    pub screen_catalog_path: PathBuf,
    pub steps: Vec<Step>,
}
