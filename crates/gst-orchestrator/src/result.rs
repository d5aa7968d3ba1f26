//! Progress events and the final workflow result shape.

use std::collections::BTreeMap;

use gst_component::ComponentError;
use serde::{Deserialize, Serialize};

/// Per-attempt state of a running step, reported via the orchestrator's
/// progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    Running,
    Retrying,
    Succeeded,
    Failed,
    Skipped,
}

/// One progress update, emitted before each attempt and once more when a
/// step reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepProgress {
    pub step_name: String,
    pub state: StepState,
    pub attempt: u32,
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Terminal outcome of a single step, recorded in the final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_name: String,
    pub status: StepState,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ComponentError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    Success,
    Failure,
}

/// Final output of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub execution_id: String,
    pub final_status: FinalStatus,
    pub steps: Vec<StepOutcome>,
    pub final_data_dictionary: BTreeMap<String, String>,
}
