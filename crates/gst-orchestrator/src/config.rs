//! Workflow definition shape: `{workflow_id, workflow_version,
//! initial_parameters, steps}`, where a step is either a component
//! invocation or a `foreach` loop over `sub_steps`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    FailFast,
    LogAndContinue,
}

/// Backoff policy for a step's `retry` setting. Same shape as
/// `gst-engine`'s policy of the same name — kept as a separate,
/// independent type since the orchestrator has no dependency on the
/// green-screen engine and retries any registered component, not just
/// the TN5250 connector.
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

    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay_ms, .. } => Duration::from_millis(*delay_ms),
            Self::Exponential { base_delay_ms, max_delay_ms, .. } => {
                let exp = 2u64.saturating_pow(attempt);
                Duration::from_millis(base_delay_ms.saturating_mul(exp).min(*max_delay_ms))
            }
        }
    }
}

/// Where a component's configuration comes from: an inline JSON blob, or
/// a path to a JSON file holding one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentConfigSource {
    Path(String),
    Inline(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStep {
    pub step_name: String,
    pub component_type: String,
    pub component_config: ComponentConfigSource,
    #[serde(default)]
    pub on_failure: OnFailure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForEachMarker {
    Foreach,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForEachStep {
    pub step_name: String,
    #[serde(rename = "type")]
    pub marker: ForEachMarker,
    pub iterate_key: String,
    pub sub_steps: Vec<WorkflowStep>,
}

/// A workflow step: either a single component invocation or a `foreach`
/// loop. `ForEach` must be tried first — its `type: "foreach"` field is
/// the only thing that distinguishes the two shapes under `untagged`
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowStep {
    ForEach(ForEachStep),
    Component(ComponentStep),
}

impl WorkflowStep {
    #[must_use]
    pub fn step_name(&self) -> &str {
        match self {
            Self::ForEach(s) => &s.step_name,
            Self::Component(s) => &s.step_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub workflow_id: String,
    pub workflow_version: String,
    #[serde(default)]
    pub initial_parameters: Vec<String>,
    pub steps: Vec<WorkflowStep>,
}
