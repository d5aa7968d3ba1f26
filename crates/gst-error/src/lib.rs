//! Unified error taxonomy with stable error codes for the green-screen RPA
//! connector.
//!
//! Every [`GstError`] carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use the builder returned by
//! [`GstError::new`] to construct errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration-shape errors, surfaced before any side effect runs.
    Config,
    /// Green-screen connector errors (telnet, wire protocol, screen nav).
    Engine,
    /// Workflow orchestrator errors.
    Orchestrator,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Engine => "engine",
            Self::Orchestrator => "orchestrator",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases. This is the closed set
/// named in the design's error-handling table: the green-screen engine's
/// codes plus the orchestrator's codes. Business components (calculator,
/// decisioning, HTTP, database, email, approval gate) are out of scope for
/// this core and do not contribute codes here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Config (shared by engine and orchestrator) --
    /// Configuration file or value is invalid, or a required parameter is
    /// missing. Surfaces before any side effect runs.
    ConfigError,

    // -- Engine --
    /// Failed to establish the TCP/TLS connection to the host.
    ConnectError,
    /// Telnet option negotiation failed or was refused for a required
    /// option.
    NegotiateError,
    /// A step's wall-clock budget elapsed before completion.
    Timeout,
    /// The identified screen did not match the step's `expect_screen`.
    ScreenMismatch,
    /// A named input or scrape field was not found on the current screen.
    FieldNotFound,
    /// A step's own logic failed (assertion failed, submit rejected, etc).
    StepFailed,
    /// An error that does not fit any other engine code.
    UnexpectedError,

    // -- Orchestrator --
    /// A component raised an exception instead of returning a `Failure`
    /// result; caught and converted rather than propagated.
    StepException,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError => ErrorCategory::Config,

            Self::ConnectError
            | Self::NegotiateError
            | Self::Timeout
            | Self::ScreenMismatch
            | Self::FieldNotFound
            | Self::StepFailed
            | Self::UnexpectedError => ErrorCategory::Engine,

            Self::StepException => ErrorCategory::Orchestrator,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"CONFIG_ERROR"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConnectError => "CONNECT_ERROR",
            Self::NegotiateError => "NEGOTIATE_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ScreenMismatch => "SCREEN_MISMATCH",
            Self::FieldNotFound => "FIELD_NOT_FOUND",
            Self::StepFailed => "STEP_FAILED",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
            Self::StepException => "STEP_EXCEPTION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GstError
// ---------------------------------------------------------------------------

/// Unified connector/orchestrator error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Examples
///
/// ```
/// use gst_error::{GstError, ErrorCode};
///
/// let err = GstError::new(ErrorCode::Timeout, "navigate step timed out after 30 s")
///     .with_context("step", "sign_on")
///     .with_context("timeout_ms", 30_000);
/// ```
pub struct GstError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    ///
    /// Callers MUST NOT insert values whose key matches the sensitive-field
    /// denylist (`password`, `passcode`, `pin`, case-insensitive) — see the
    /// workflow engine's placeholder-redaction rule.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl GstError {
    /// Create a new error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Debug for GstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("GstError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for GstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for GstError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serialisable snapshot of a [`GstError`] (without the opaque source),
/// suitable for `ComponentResult.error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GstErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&GstError> for GstErrorDto {
    fn from(err: &GstError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<GstErrorDto> for GstError {
    fn from(dto: GstErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
