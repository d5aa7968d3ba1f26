//! The common component contract: an immutable configuration envelope in,
//! a typed result out, over a shared, mutable data dictionary.
//!
//! Narrowed from a richer `identity()`/`capabilities()`/`run()` backend
//! trait to this system's simpler `(config, dictionary, cancel) → result`
//! signature — the orchestrator (`gst-orchestrator`) holds a registry of
//! these by `component_type` string and never calls a concrete component
//! type directly.

#![deny(unsafe_code)]

mod cancel;

pub use cancel::CancellationToken;

use async_trait::async_trait;
use gst_dict::DataDictionary;
use gst_error::GstErrorDto;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable input envelope for a single component invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfiguration {
    /// Component type string, matching a key in the orchestrator's
    /// registry.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Configuration schema version.
    pub version: String,
    /// Opaque, component-specific configuration payload.
    pub config_blob: serde_json::Value,
}

/// Outcome status of a component invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentStatus {
    /// The component completed its work.
    Success,
    /// The component ran but did not complete its work.
    Failure,
    /// The component did not run (e.g. `log_and_continue` upstream, or a
    /// conditional step that was bypassed).
    Skipped,
}

/// A single log line attributable to one component invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Log level, e.g. `"info"`, `"warn"`, `"error"`.
    pub level: String,
    /// Component type that emitted this line.
    pub component: String,
    /// Message text. Must never contain the value of a sensitive-denylist
    /// dictionary key; callers are responsible for redaction before
    /// constructing this struct.
    pub message: String,
}

impl LogEntry {
    /// Construct a log entry stamped with the current time.
    #[must_use]
    pub fn new(level: impl Into<String>, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            level: level.into(),
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Machine-readable failure detail for a [`ComponentResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentError {
    /// Machine-readable code from the component's closed code set.
    ///
    /// Kept as a plain `String` rather than `gst_error::ErrorCode`
    /// because this envelope is also the contract boundary for business
    /// components (calculator, HTTP client, ...) whose code sets are not
    /// implemented in this core and so are not declared in `gst-error`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional extra detail (e.g. a server-provided error string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&gst_error::GstError> for ComponentError {
    fn from(err: &gst_error::GstError) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            detail: None,
        }
    }
}

impl From<GstErrorDto> for ComponentError {
    fn from(dto: GstErrorDto) -> Self {
        Self {
            code: dto.code.as_str().to_string(),
            message: dto.message,
            detail: dto.source_message,
        }
    }
}

/// Result of a single component invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResult {
    /// Outcome status.
    pub status: ComponentStatus,
    /// Output fields, also written into the shared dictionary by the
    /// caller.
    #[serde(default)]
    pub output_data: BTreeMap<String, String>,
    /// Failure detail, present iff `status == Failure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ComponentError>,
    /// Log lines emitted during this invocation.
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    /// Wall-clock duration of the invocation, in milliseconds.
    pub duration_ms: u64,
}

impl ComponentResult {
    /// Build a `Success` result from output data and elapsed time.
    #[must_use]
    pub fn success(output_data: BTreeMap<String, String>, duration_ms: u64) -> Self {
        Self {
            status: ComponentStatus::Success,
            output_data,
            error: None,
            logs: Vec::new(),
            duration_ms,
        }
    }

    /// Build a `Failure` result from an error and elapsed time.
    #[must_use]
    pub fn failure(error: ComponentError, duration_ms: u64) -> Self {
        Self {
            status: ComponentStatus::Failure,
            output_data: BTreeMap::new(),
            error: Some(error),
            logs: Vec::new(),
            duration_ms,
        }
    }

    /// Build a `Skipped` result.
    #[must_use]
    pub fn skipped(duration_ms: u64) -> Self {
        Self {
            status: ComponentStatus::Skipped,
            output_data: BTreeMap::new(),
            error: None,
            logs: Vec::new(),
            duration_ms,
        }
    }

    /// Attach log entries, replacing any previously attached.
    #[must_use]
    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = logs;
        self
    }
}

/// Pluggable operation unit: `(config, dictionary, cancel) → result`.
///
/// Every component — the green-screen connector included — implements
/// this trait. The orchestrator never calls a concrete type; it looks up
/// an `Arc<dyn Component>` in its registry by `component_type()`.
#[async_trait]
pub trait Component: Send + Sync {
    /// The registry key this component answers to, e.g.
    /// `"green_screen_connector"`.
    fn component_type(&self) -> &str;

    /// Execute one invocation against the shared dictionary.
    ///
    /// Implementations must catch their own internal errors/panics and
    /// return a `Failure` result rather than propagating, except that a
    /// cancellation signal observed mid-flight should be honoured
    /// promptly (the orchestrator does not retry past a cancelled run).
    async fn execute(
        &self,
        config: &ComponentConfiguration,
        dict: &mut DataDictionary,
        cancel: CancellationToken,
    ) -> ComponentResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_has_no_error() {
        let result = ComponentResult::success(BTreeMap::new(), 12);
        assert_eq!(result.status, ComponentStatus::Success);
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_result_carries_error() {
        let err = ComponentError {
            code: "STEP_FAILED".into(),
            message: "boom".into(),
            detail: None,
        };
        let result = ComponentResult::failure(err, 5);
        assert_eq!(result.status, ComponentStatus::Failure);
        assert_eq!(result.error.unwrap().code, "STEP_FAILED");
    }

    #[test]
    fn gst_error_converts_to_component_error() {
        let gst_err = gst_error::GstError::new(gst_error::ErrorCode::Timeout, "timed out");
        let comp_err: ComponentError = (&gst_err).into();
        assert_eq!(comp_err.code, "TIMEOUT");
        assert_eq!(comp_err.message, "timed out");
    }

    #[test]
    fn component_result_serde_round_trip() {
        let mut output = BTreeMap::new();
        output.insert("borrower_name".to_string(), "SMITH, JOHN A".to_string());
        let result = ComponentResult::success(output, 42);
        let json = serde_json::to_string(&result).unwrap();
        let back: ComponentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_data.get("borrower_name").unwrap(), "SMITH, JOHN A");
    }
}
