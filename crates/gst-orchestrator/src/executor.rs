//! Runs a [`WorkflowDefinition`] against a [`ComponentRegistry`] and a
//! shared [`DataDictionary`], step by step.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use gst_component::{CancellationToken, Component, ComponentConfiguration, ComponentError, ComponentResult, ComponentStatus};
use gst_dict::DataDictionary;
use gst_error::{ErrorCode, GstError};
use uuid::Uuid;

use crate::config::{ComponentConfigSource, ComponentStep, ForEachMarker, ForEachStep, OnFailure, RetryPolicy, WorkflowDefinition, WorkflowStep};
use crate::registry::ComponentRegistry;
use crate::result::{FinalStatus, StepOutcome, StepProgress, StepState, WorkflowResult};

/// Callback invoked as steps progress. Must be `Send` since it is
/// captured across the `.await` points of a boxed, recursive future.
pub type ProgressFn<'a> = dyn FnMut(StepProgress) + Send + 'a;

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn unknown_error() -> ComponentError {
    ComponentError { code: "UNKNOWN_ERROR".to_string(), message: "component failed without an error detail".to_string(), detail: None }
}

/// Run a full workflow: checks `initial_parameters`, then executes each
/// top-level step in order.
pub async fn run_workflow(
    definition: &WorkflowDefinition,
    registry: &ComponentRegistry,
    dict: &mut DataDictionary,
    cancel: CancellationToken,
    mut progress: impl FnMut(StepProgress) + Send,
) -> Result<WorkflowResult, GstError> {
    for key in &definition.initial_parameters {
        if dict.get(key).is_none() {
            return Err(GstError::new(ErrorCode::ConfigError, format!("missing required initial parameter '{key}'"))
                .with_context("workflow_id", definition.workflow_id.clone()));
        }
    }

    let execution_id = Uuid::new_v4().to_string();
    let mut outcomes = Vec::new();
    let mut failed = false;

    for step in &definition.steps {
        if cancel.is_cancelled() {
            outcomes.push(StepOutcome { step_name: step.step_name().to_string(), status: StepState::Skipped, duration_ms: 0, error: None });
            continue;
        }
        let halt = run_step(step, registry, dict, &cancel, &mut progress, &mut outcomes).await;
        if halt {
            failed = true;
            break;
        }
    }

    Ok(WorkflowResult {
        workflow_id: definition.workflow_id.clone(),
        execution_id,
        final_status: if failed { FinalStatus::Failure } else { FinalStatus::Success },
        steps: outcomes,
        final_data_dictionary: dict.as_map().clone(),
    })
}

/// Dispatches one step. Returns `true` if the workflow must halt
/// (a `fail_fast` component step failed, or a `foreach` step's
/// `fail_fast` sub-step failed).
///
/// Boxed because `foreach` steps recurse into this same function for
/// their `sub_steps` — an unboxed `async fn` can't call itself.
fn run_step<'a>(
    step: &'a WorkflowStep,
    registry: &'a ComponentRegistry,
    dict: &'a mut DataDictionary,
    cancel: &'a CancellationToken,
    progress: &'a mut ProgressFn<'a>,
    outcomes: &'a mut Vec<StepOutcome>,
) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
    Box::pin(async move {
        match step {
            WorkflowStep::Component(c) => run_component_step(c, registry, dict, cancel, progress, outcomes).await,
            WorkflowStep::ForEach(f) => run_foreach_step(f, registry, dict, cancel, progress, outcomes).await,
        }
    })
}

async fn run_component_step(
    step: &ComponentStep,
    registry: &ComponentRegistry,
    dict: &mut DataDictionary,
    cancel: &CancellationToken,
    progress: &mut ProgressFn<'_>,
    outcomes: &mut Vec<StepOutcome>,
) -> bool {
    let start = Instant::now();
    let max_attempts = step.retry.as_ref().map(RetryPolicy::max_attempts).unwrap_or(1).max(1);
    progress(StepProgress { step_name: step.step_name.clone(), state: StepState::Running, attempt: 1, max_attempts, message: None });

    match run_with_retry(step, registry, dict, cancel, progress).await {
        Ok(output) => {
            dict.merge(&DataDictionary::from_entries(output));
            let duration_ms = elapsed_ms(start);
            progress(StepProgress { step_name: step.step_name.clone(), state: StepState::Succeeded, attempt: max_attempts, max_attempts, message: None });
            outcomes.push(StepOutcome { step_name: step.step_name.clone(), status: StepState::Succeeded, duration_ms, error: None });
            false
        }
        Err(err) => {
            let duration_ms = elapsed_ms(start);
            progress(StepProgress {
                step_name: step.step_name.clone(),
                state: StepState::Failed,
                attempt: max_attempts,
                max_attempts,
                message: Some(err.message.clone()),
            });
            outcomes.push(StepOutcome { step_name: step.step_name.clone(), status: StepState::Failed, duration_ms, error: Some(err) });
            matches!(step.on_failure, OnFailure::FailFast)
        }
    }
}

async fn run_with_retry(
    step: &ComponentStep,
    registry: &ComponentRegistry,
    dict: &mut DataDictionary,
    cancel: &CancellationToken,
    progress: &mut ProgressFn<'_>,
) -> Result<BTreeMap<String, String>, ComponentError> {
    let component = registry.get_arc(&step.component_type).ok_or_else(|| ComponentError {
        code: "CONFIG_ERROR".to_string(),
        message: format!("no component registered for type '{}'", step.component_type),
        detail: None,
    })?;

    let config = resolve_component_config(step, dict)
        .await
        .map_err(|e| ComponentError::from(&e))?;

    let max_attempts = step.retry.as_ref().map(RetryPolicy::max_attempts).unwrap_or(1).max(1);
    let timeout = step.timeout_seconds.map(Duration::from_secs);

    let mut last_error = None;
    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(ComponentError { code: "CANCELLED".to_string(), message: "workflow cancelled".to_string(), detail: None });
        }
        if attempt > 1 {
            progress(StepProgress {
                step_name: step.step_name.clone(),
                state: StepState::Retrying,
                attempt,
                max_attempts,
                message: last_error.as_ref().map(|e: &ComponentError| e.message.clone()),
            });
        }

        let invocation = invoke_with_panic_guard(component.clone(), config.clone(), dict.clone(), cancel.clone());
        let (result, updated_dict) = match timeout {
            Some(t) => tokio::time::timeout(t, invocation).await.unwrap_or_else(|_| {
                (
                    ComponentResult::failure(
                        ComponentError { code: "TIMEOUT".to_string(), message: format!("step '{}' timed out", step.step_name), detail: None },
                        0,
                    ),
                    dict.clone(),
                )
            }),
            None => invocation.await,
        };

        match result.status {
            ComponentStatus::Success | ComponentStatus::Skipped => {
                *dict = updated_dict;
                return Ok(result.output_data);
            }
            ComponentStatus::Failure => {
                last_error = Some(result.error.unwrap_or_else(unknown_error));
                if attempt < max_attempts {
                    if let Some(policy) = &step.retry {
                        tokio::time::sleep(policy.delay_for(attempt - 1)).await;
                    }
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(unknown_error))
}

/// Runs the component inside a spawned task so a panic inside it
/// surfaces as a `STEP_EXCEPTION` failure instead of unwinding the
/// orchestrator itself.
async fn invoke_with_panic_guard(
    component: std::sync::Arc<dyn Component>,
    config: ComponentConfiguration,
    dict: DataDictionary,
    cancel: CancellationToken,
) -> (ComponentResult, DataDictionary) {
    let dict_on_panic = dict.clone();
    let handle = tokio::spawn(async move {
        let mut dict = dict;
        let result = component.execute(&config, &mut dict, cancel).await;
        (result, dict)
    });
    match handle.await {
        Ok(pair) => pair,
        Err(join_err) => (
            ComponentResult::failure(
                ComponentError { code: "STEP_EXCEPTION".to_string(), message: format!("component task failed: {join_err}"), detail: None },
                0,
            ),
            dict_on_panic,
        ),
    }
}

async fn resolve_component_config(step: &ComponentStep, dict: &DataDictionary) -> Result<ComponentConfiguration, GstError> {
    let raw = match &step.component_config {
        ComponentConfigSource::Inline(value) => value.clone(),
        ComponentConfigSource::Path(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| GstError::new(ErrorCode::ConfigError, format!("failed to read component config '{path}'")).with_source(e))?;
            serde_json::from_str(&text)
                .map_err(|e| GstError::new(ErrorCode::ConfigError, format!("invalid JSON in component config '{path}'")).with_source(e))?
        }
    };

    Ok(ComponentConfiguration {
        component_type: step.component_type.clone(),
        version: "1.0".to_string(),
        config_blob: resolve_placeholders(&raw, dict),
    })
}

/// Walk a JSON value, substituting `{{key}}` placeholders in every
/// string leaf against the shared dictionary.
fn resolve_placeholders(value: &serde_json::Value, dict: &DataDictionary) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(gst_util::substitute(s, |key| dict.get(key).map(str::to_string))),
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(|v| resolve_placeholders(v, dict)).collect()),
        serde_json::Value::Object(map) => {
            serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), resolve_placeholders(v, dict))).collect())
        }
        other => other.clone(),
    }
}

/// `foreach`: merge each iterated row's fields into the dictionary before
/// running `sub_steps`. After the loop, the dictionary retains the last
/// row's fields plus a `"<step_name>.iteration_count"` sentinel (see
/// DESIGN.md).
async fn run_foreach_step(
    foreach: &ForEachStep,
    registry: &ComponentRegistry,
    dict: &mut DataDictionary,
    cancel: &CancellationToken,
    progress: &mut ProgressFn<'_>,
    outcomes: &mut Vec<StepOutcome>,
) -> bool {
    let start = Instant::now();
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = dict
        .get(&foreach.iterate_key)
        .and_then(|raw| serde_json::from_str::<Vec<serde_json::Value>>(raw).ok())
        .map(|values| values.into_iter().filter_map(|v| v.as_object().cloned()).collect())
        .unwrap_or_default();

    let mut halt = false;
    'rows: for row in &rows {
        for (key, value) in row {
            let value_str = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            dict.set(key.clone(), value_str);
        }
        for sub in &foreach.sub_steps {
            if cancel.is_cancelled() {
                halt = true;
                break 'rows;
            }
            if run_step(sub, registry, dict, cancel, progress, outcomes).await {
                halt = true;
                break 'rows;
            }
        }
    }

    dict.set(format!("{}.iteration_count", foreach.step_name), rows.len().to_string());

    let duration_ms = elapsed_ms(start);
    outcomes.push(StepOutcome {
        step_name: foreach.step_name.clone(),
        status: if halt { StepState::Failed } else { StepState::Succeeded },
        duration_ms,
        error: None,
    });
    halt
}
