//! Rule-based transition evaluator (C13): matches the current screen,
//! the AID key the client sent, and the fields it modified against an
//! ordered list of navigation rules, the way [`abp-rule-engine`] matches
//! a resource against a prioritised rule list — except rules here fire
//! in source order, not by priority, since transition order in the
//! navigation config *is* the intended precedence.
//!
//! [`abp-rule-engine`]: https://docs.rs/abp-rule-engine

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use gst_error::{ErrorCode, GstError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fields whose value must never be copied into a transition's data
/// updates or surfaced in diagnostics.
const SENSITIVE_FIELDS: &[&str] = &["password", "passcode", "pin"];

fn is_sensitive(field: &str) -> bool {
    SENSITIVE_FIELDS.iter().any(|s| s.eq_ignore_ascii_case(field))
}

/// One field condition within a transition rule: either a presence
/// check or an exact literal match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionSpec {
    /// The field's current input value must be empty (or absent).
    Empty,
    /// The field's current input value must be non-empty.
    NotEmpty,
    /// The field's current input value must equal this literal exactly.
    Literal(String),
}

impl ConditionSpec {
    fn matches(&self, value: &str) -> bool {
        match self {
            Self::Empty => value.is_empty(),
            Self::NotEmpty => !value.is_empty(),
            Self::Literal(expected) => value == expected,
        }
    }
}

impl<'de> Deserialize<'de> for ConditionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "empty" => Self::Empty,
            "not_empty" => Self::NotEmpty,
            _ => Self::Literal(s),
        })
    }
}

impl Serialize for ConditionSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Empty => serializer.serialize_str("empty"),
            Self::NotEmpty => serializer.serialize_str("not_empty"),
            Self::Literal(s) => serializer.serialize_str(s),
        }
    }
}

/// Validation a matched rule may require before it is allowed to
/// succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// User id (case-insensitive) and password (exact) must appear
    /// together in the navigation config's credential list.
    Credentials,
    /// `loan_number` must exist in the external loan data store.
    LoanExists,
}

/// One `{user_id, password}` pair from the navigation config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// User id, matched case-insensitively.
    pub user_id: String,
    /// Password, matched exactly.
    pub password: String,
}

/// A single navigation rule: which screen/AID it applies to, the
/// conditions that must hold, and what happens when it matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRule {
    /// Screen this rule applies from.
    pub source_screen: String,
    /// Canonical AID key name (e.g. `"Enter"`).
    pub aid_key: String,
    /// All conditions that must hold against the current input for this
    /// rule to match.
    #[serde(default)]
    pub conditions: BTreeMap<String, ConditionSpec>,
    /// Screen to move to on success.
    pub target_screen: String,
    /// Optional validation that must pass for this match to succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationKind>,
    /// When present, this rule always fails with this message
    /// regardless of validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Literal values merged into the data dictionary on success.
    #[serde(default)]
    pub set_data: BTreeMap<String, String>,
}

/// The navigation config: initial screen, credential list, and ordered
/// transition rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// The screen a fresh session starts on.
    pub initial_screen: String,
    /// Valid `{user_id, password}` pairs for the `credentials`
    /// validation kind.
    #[serde(default)]
    pub credentials: Vec<Credential>,
    /// Rules, in source (precedence) order.
    #[serde(default)]
    pub transitions: Vec<TransitionRule>,
}

impl NavigationConfig {
    /// Parse a navigation config from its JSON text representation.
    pub fn from_json(text: &str) -> Result<Self, GstError> {
        serde_json::from_str(text)
            .map_err(|e| GstError::new(ErrorCode::ConfigError, "failed to parse navigation config").with_source(e))
    }
}

/// Outcome of evaluating one transition.
#[derive(Debug, Clone)]
pub struct TransitionResult {
    /// Whether the matched rule succeeded.
    pub success: bool,
    /// The screen to move to, when `success` is true.
    pub target: Option<String>,
    /// Fields to merge into the session's data dictionary, when
    /// `success` is true. Never contains a sensitive field.
    pub data_updates: BTreeMap<String, String>,
    /// Human-readable failure reason, when `success` is false.
    pub error: Option<String>,
}

impl TransitionResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            target: None,
            data_updates: BTreeMap::new(),
            error: Some(message.into()),
        }
    }

    fn success(target: String, data_updates: BTreeMap<String, String>) -> Self {
        Self {
            success: true,
            target: Some(target),
            data_updates,
            error: None,
        }
    }
}

/// Caller-supplied lookup for validations this evaluator cannot resolve
/// on its own (the loan data store lives outside this crate).
pub trait ValidationHook: Send + Sync {
    /// Whether `loan_number` exists in the external data store.
    fn loan_exists(&self, loan_number: &str) -> bool;
}

/// A [`ValidationHook`] that never finds a loan; useful for screens or
/// tests that never reach a `loan_exists` rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoans;

impl ValidationHook for NoLoans {
    fn loan_exists(&self, _loan_number: &str) -> bool {
        false
    }
}

/// Evaluates navigation rules against a session's current screen, AID
/// key, and extracted input fields.
///
/// One instance is owned per session — it is stateless beyond its
/// immutable config and hook, so nothing here needs interior mutability
/// or synchronisation.
#[derive(Clone)]
pub struct TransitionEvaluator {
    config: Arc<NavigationConfig>,
    hook: Arc<dyn ValidationHook>,
}

impl TransitionEvaluator {
    /// Build an evaluator over `config`, using `hook` to resolve
    /// `loan_exists` validations.
    #[must_use]
    pub fn new(config: Arc<NavigationConfig>, hook: Arc<dyn ValidationHook>) -> Self {
        Self { config, hook }
    }

    /// Evaluate the transition for `(source_screen, aid_key)` against
    /// `input` — the fields the client just modified, never session
    /// state.
    #[must_use]
    pub fn evaluate(&self, source_screen: &str, aid_key: &str, input: &BTreeMap<String, String>) -> TransitionResult {
        let Some(rule) = self.config.transitions.iter().find(|r| {
            r.source_screen == source_screen
                && r.aid_key == aid_key
                && r.conditions.iter().all(|(field, spec)| {
                    let value = input.get(field).map(String::as_str).unwrap_or("");
                    spec.matches(value)
                })
        }) else {
            return TransitionResult::failure(format!("Invalid key: {aid_key}"));
        };

        if let Some(message) = &rule.error_message {
            return TransitionResult::failure(message.clone());
        }

        if let Some(validation) = rule.validation {
            if !self.validate(validation, input) {
                return TransitionResult::failure(match validation {
                    ValidationKind::Credentials => "Invalid credentials",
                    ValidationKind::LoanExists => "Loan not found",
                });
            }
        }

        let mut data_updates = rule.set_data.clone();
        for (field, value) in input {
            if !is_sensitive(field) {
                data_updates.insert(field.clone(), value.clone());
            }
        }

        TransitionResult::success(rule.target_screen.clone(), data_updates)
    }

    fn validate(&self, kind: ValidationKind, input: &BTreeMap<String, String>) -> bool {
        match kind {
            ValidationKind::Credentials => {
                let user_id = input.get("user_id").map(String::as_str).unwrap_or("");
                let password = input.get("password").map(String::as_str).unwrap_or("");
                self.config
                    .credentials
                    .iter()
                    .any(|c| c.user_id.eq_ignore_ascii_case(user_id) && c.password == password)
            }
            ValidationKind::LoanExists => {
                let loan_number = input.get("loan_number").map(String::as_str).unwrap_or("");
                self.hook.loan_exists(loan_number)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NavigationConfig {
        NavigationConfig {
            initial_screen: "SIGN_ON".into(),
            credentials: vec![Credential { user_id: "jsmith".into(), password: "secret".into() }],
            transitions: vec![
                TransitionRule {
                    source_screen: "SIGN_ON".into(),
                    aid_key: "Enter".into(),
                    conditions: BTreeMap::from([("user_id".to_string(), ConditionSpec::NotEmpty)]),
                    target_screen: "MAIN_MENU".into(),
                    validation: Some(ValidationKind::Credentials),
                    error_message: None,
                    set_data: BTreeMap::new(),
                },
                TransitionRule {
                    source_screen: "SIGN_ON".into(),
                    aid_key: "Enter".into(),
                    conditions: BTreeMap::new(),
                    target_screen: "SIGN_ON".into(),
                    validation: None,
                    error_message: Some("User id is required".into()),
                    set_data: BTreeMap::new(),
                },
                TransitionRule {
                    source_screen: "MAIN_MENU".into(),
                    aid_key: "F3".into(),
                    conditions: BTreeMap::new(),
                    target_screen: "SIGN_ON".into(),
                    validation: None,
                    error_message: None,
                    set_data: BTreeMap::from([("visited_menu".to_string(), "true".to_string())]),
                },
            ],
        }
    }

    fn evaluator() -> TransitionEvaluator {
        TransitionEvaluator::new(Arc::new(config()), Arc::new(NoLoans))
    }

    #[test]
    fn successful_sign_on_returns_target_and_merged_data() {
        let input = BTreeMap::from([
            ("user_id".to_string(), "jsmith".to_string()),
            ("password".to_string(), "secret".to_string()),
        ]);
        let result = evaluator().evaluate("SIGN_ON", "Enter", &input);
        assert!(result.success);
        assert_eq!(result.target.as_deref(), Some("MAIN_MENU"));
        assert_eq!(result.data_updates.get("user_id"), Some(&"jsmith".to_string()));
        assert!(!result.data_updates.contains_key("password"));
    }

    #[test]
    fn invalid_credentials_halt_without_falling_through() {
        let input = BTreeMap::from([
            ("user_id".to_string(), "jsmith".to_string()),
            ("password".to_string(), "wrong".to_string()),
        ]);
        let result = evaluator().evaluate("SIGN_ON", "Enter", &input);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn empty_user_id_matches_second_rule_with_static_error() {
        let input = BTreeMap::new();
        let result = evaluator().evaluate("SIGN_ON", "Enter", &input);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("User id is required"));
    }

    #[test]
    fn unknown_screen_aid_pair_reports_invalid_key() {
        let input = BTreeMap::new();
        let result = evaluator().evaluate("SIGN_ON", "F12", &input);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid key: F12"));
    }

    #[test]
    fn not_empty_condition_never_falls_back_to_session_state() {
        // Conditions are evaluated only against the current input map;
        // there is no session-state parameter to fall back to, so a
        // field absent from input is always treated as "".
        let input = BTreeMap::new();
        let result = evaluator().evaluate("SIGN_ON", "Enter", &input);
        // Falls through to the static-error rule, not the credentials rule.
        assert_eq!(result.error.as_deref(), Some("User id is required"));
    }

    #[test]
    fn set_data_merges_with_input_minus_sensitive_fields() {
        let input = BTreeMap::from([("pin".to_string(), "1234".to_string())]);
        let result = evaluator().evaluate("MAIN_MENU", "F3", &input);
        assert!(result.success);
        assert_eq!(result.data_updates.get("visited_menu"), Some(&"true".to_string()));
        assert!(!result.data_updates.contains_key("pin"));
    }

    #[test]
    fn loan_exists_validation_uses_hook() {
        struct AlwaysFound;
        impl ValidationHook for AlwaysFound {
            fn loan_exists(&self, _loan_number: &str) -> bool {
                true
            }
        }
        let mut cfg = config();
        cfg.transitions.push(TransitionRule {
            source_screen: "LOAN_LOOKUP".into(),
            aid_key: "Enter".into(),
            conditions: BTreeMap::new(),
            target_screen: "LOAN_DETAIL".into(),
            validation: Some(ValidationKind::LoanExists),
            error_message: None,
            set_data: BTreeMap::new(),
        });
        let evaluator = TransitionEvaluator::new(Arc::new(cfg), Arc::new(AlwaysFound));
        let input = BTreeMap::from([("loan_number".to_string(), "L-1".to_string())]);
        let result = evaluator.evaluate("LOAN_LOOKUP", "Enter", &input);
        assert!(result.success);
        assert_eq!(result.target.as_deref(), Some("LOAN_DETAIL"));
    }

    #[test]
    fn condition_spec_serde_round_trip() {
        let specs = [
            (ConditionSpec::Empty, "\"empty\""),
            (ConditionSpec::NotEmpty, "\"not_empty\""),
            (ConditionSpec::Literal("MAIN_MENU".into()), "\"MAIN_MENU\""),
        ];
        for (spec, expected_json) in specs {
            let json = serde_json::to_string(&spec).unwrap();
            assert_eq!(json, expected_json);
            let back: ConditionSpec = serde_json::from_str(&json).unwrap();
            assert_eq!(back, spec);
        }
    }
}
