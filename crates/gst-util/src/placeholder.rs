//! `{{key}}` placeholder substitution.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `{{<word chars>}}`, e.g. `{{loan_number}}`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

/// Replace every `{{key}}` occurrence in `template` with the value returned
/// by `lookup(key)`. Placeholders whose key has no lookup result are left
/// verbatim (braces and all).
///
/// Idempotent as long as no substituted value itself introduces a new
/// `{{...}}` placeholder.
pub fn substitute(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            lookup(key).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Collect the set of placeholder keys referenced in `template`, in order
/// of first appearance, without duplicates.
#[must_use]
pub fn referenced_keys(template: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(map: &HashMap<&str, &str>) -> impl Fn(&str) -> Option<String> + '_ {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn resolves_known_key() {
        let mut map = HashMap::new();
        map.insert("loan_number", "1000001");
        let out = substitute("loan {{loan_number}}", lookup_from(&map));
        assert_eq!(out, "loan 1000001");
    }

    #[test]
    fn unresolved_placeholder_survives_verbatim() {
        let map = HashMap::new();
        let out = substitute("hello {{missing}}", lookup_from(&map));
        assert_eq!(out, "hello {{missing}}");
    }

    #[test]
    fn multiple_occurrences_all_replaced() {
        let mut map = HashMap::new();
        map.insert("x", "1");
        let out = substitute("{{x}}-{{x}}-{{x}}", lookup_from(&map));
        assert_eq!(out, "1-1-1");
    }

    #[test]
    fn idempotent_when_no_new_placeholders_introduced() {
        let mut map = HashMap::new();
        map.insert("name", "SMITH");
        let once = substitute("{{name}}", lookup_from(&map));
        let twice = substitute(&once, lookup_from(&map));
        assert_eq!(once, twice);
    }

    #[test]
    fn no_placeholders_returns_input_unchanged() {
        let map = HashMap::new();
        assert_eq!(substitute("plain text", lookup_from(&map)), "plain text");
    }

    #[test]
    fn referenced_keys_deduplicates_and_preserves_order() {
        let keys = referenced_keys("{{b}} {{a}} {{b}}");
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }
}
