//! `{{variable}}` interpolation
//!
//! Replacement is one scan over the input text. Inserted values are never
//! scanned again, so the result does not depend on the order of the keys.
//! Placeholders with no matching key are left in the text untouched.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::pairs::KeyValueList;

/// A source of variable values
pub trait Variables {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl Variables for KeyValueList {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

impl Variables for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Replace every `{{key}}` in `text` with the value of `key`.
///
/// Keys are matched exactly, with no case or whitespace normalization.
pub fn substitute<V: Variables + ?Sized>(text: &str, variables: &V) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures| match variables.lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"))
}

/// Names of the `{{...}}` placeholders present in `text`, in order of appearance
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(text) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> KeyValueList {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_variables_is_identity() {
        let text = "https://{{host}}/path?q={{q}}";
        assert_eq!(substitute(text, &KeyValueList::new()), text);
    }

    #[test]
    fn test_replaces_all_occurrences() {
        let out = substitute("{{id}}-{{id}}/{{id}}", &vars(&[("id", "7")]));
        assert_eq!(out, "7-7/7");
    }

    #[test]
    fn test_bearer_token() {
        let out = substitute("Bearer {{token}}", &vars(&[("token", "abc123")]));
        assert_eq!(out, "Bearer abc123");
    }

    #[test]
    fn test_unknown_placeholder_passes_through() {
        let out = substitute("https://api.example.com/{{missing}}", &vars(&[("token", "x")]));
        assert_eq!(out, "https://api.example.com/{{missing}}");
    }

    #[test]
    fn test_keys_are_not_normalized() {
        let out = substitute("{{Token}} {{ token }} {{token}}", &vars(&[("token", "t")]));
        assert_eq!(out, "{{Token}} {{ token }} t");
    }

    #[test]
    fn test_values_are_not_re_expanded_for_same_key() {
        let out = substitute("{{a}}", &vars(&[("a", "{{a}}!")]));
        assert_eq!(out, "{{a}}!");
    }

    #[test]
    fn test_values_are_not_re_expanded_across_keys() {
        let forward = substitute("{{a}}", &vars(&[("a", "{{b}}"), ("b", "x")]));
        let reverse = substitute("{{a}}", &vars(&[("b", "x"), ("a", "{{b}}")]));
        assert_eq!(forward, "{{b}}");
        assert_eq!(reverse, "{{b}}");
    }

    #[test]
    fn test_hash_map_result_is_deterministic() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), "{{b}}".to_string());
        map.insert("b".to_string(), "{{a}}".to_string());
        for _ in 0..8 {
            assert_eq!(substitute("{{a}}|{{b}}", &map), "{{b}}|{{a}}");
        }
    }

    #[test]
    fn test_adjacent_braces() {
        let out = substitute("{{{a}}}", &vars(&[("a", "1")]));
        assert_eq!(out, "{1}");
    }

    #[test]
    fn test_placeholder_pattern_compiles() {
        let re = placeholder_regex();
        assert!(re.is_match("{{x}}"));
        assert!(!re.is_match("{x}"));
    }

    #[test]
    fn test_works_with_hash_map() {
        let mut map = HashMap::new();
        map.insert("host".to_string(), "localhost".to_string());
        assert_eq!(substitute("http://{{host}}", &map), "http://localhost");
    }

    #[test]
    fn test_placeholders_lists_unique_names() {
        let names = placeholders("{{a}}/{{b}}?x={{a}}&y={{}}");
        assert_eq!(names, vec!["a", "b", ""]);
    }
}
