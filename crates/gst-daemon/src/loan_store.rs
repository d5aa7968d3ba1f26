//! Loan data store (C16): the external validation/lookup source behind
//! [`gst_transition::ValidationHook`]'s `loan_exists` check and the
//! session loop's post-transition data hydration step.

use std::collections::BTreeMap;
use std::path::Path;

use gst_error::{ErrorCode, GstError};
use gst_transition::ValidationHook;
use serde::Deserialize;

/// One loan record. Kept as a flexible string map rather than a fixed
/// struct: the set of fields is defined by whatever screens scrape from
/// it, not by this crate.
pub type LoanRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
struct LoanFile {
    loans: Vec<LoanRecord>,
}

/// In-memory loan book, loaded once at startup from a JSON file shaped
/// as `{"loans": [{"loan_number": "...", ...}, ...]}`.
#[derive(Debug, Clone, Default)]
pub struct LoanStore {
    loans: Vec<LoanRecord>,
}

impl LoanStore {
    /// An empty store: every lookup misses. Used when no loan data file
    /// is configured.
    #[must_use]
    pub fn empty() -> Self {
        Self { loans: Vec::new() }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GstError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GstError::new(ErrorCode::ConfigError, format!("failed to read loan store file: {}", path.display()))
                .with_source(e)
        })?;
        let file: LoanFile = serde_json::from_str(&contents).map_err(|e| {
            GstError::new(ErrorCode::ConfigError, format!("failed to parse loan store file: {}", path.display()))
                .with_source(e)
        })?;
        tracing::debug!(path = %path.display(), count = file.loans.len(), "loaded loan store");
        Ok(Self { loans: file.loans })
    }

    /// Find a loan by its `loan_number` field.
    #[must_use]
    pub fn find(&self, loan_number: &str) -> Option<&LoanRecord> {
        self.loans.iter().find(|loan| loan.get("loan_number").map(String::as_str) == Some(loan_number))
    }
}

impl ValidationHook for LoanStore {
    fn loan_exists(&self, loan_number: &str) -> bool {
        self.find(loan_number).is_some()
    }
}
