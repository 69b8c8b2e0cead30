//! Placeholder detection and substitution for prompt text.
//!
//! Placeholders are `{prefix}name{suffix}` runs with optional whitespace
//! just inside the delimiters, e.g. `{{ user_name }}` == `{{user_name}}`.
//! Delimiters are caller-supplied literals; they are escaped before any
//! pattern is built so regex metacharacters in them carry no meaning.

use std::collections::HashMap;

use regex::{NoExpand, Regex};

/// Scans `texts` for placeholders and returns the distinct trimmed variable
/// names in first-seen order. Empty `prefix` or `suffix` disables scanning.
/// A delimiter pair that cannot form a valid pattern yields no variables;
/// it never propagates as an error.
pub fn extract_variables<I, S>(texts: I, prefix: &str, suffix: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if prefix.is_empty() || suffix.is_empty() {
        return Vec::new();
    }

    let re = match placeholder_pattern(prefix, suffix, r"(.+?)") {
        Some(re) => re,
        None => return Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();
    for text in texts {
        for caps in re.captures_iter(text.as_ref()) {
            if let Some(name) = caps.get(1) {
                let name = name.as_str().trim();
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

/// Replaces every occurrence of each known variable's placeholder with its
/// bound value, or the empty string when no binding exists. One pass per
/// variable; replacement text is never re-scanned, and placeholders whose
/// name is not in `variables` are left untouched.
pub fn substitute(
    text: &str,
    prefix: &str,
    suffix: &str,
    variables: &[String],
    bindings: &HashMap<String, String>,
) -> String {
    if prefix.is_empty() || suffix.is_empty() {
        return text.to_string();
    }

    let mut out = text.to_string();
    for name in variables {
        let re = match placeholder_pattern(prefix, suffix, &regex::escape(name)) {
            Some(re) => re,
            None => continue,
        };
        let value = bindings.get(name).map(String::as_str).unwrap_or("");
        out = re.replace_all(&out, NoExpand(value)).into_owned();
    }
    out
}

/// Drops bindings whose variable no longer appears in the extracted set.
/// Called when the source text or the delimiter pair changes, so stale
/// values never leak into a later substitution.
pub fn prune_bindings(variables: &[String], bindings: &mut HashMap<String, String>) {
    bindings.retain(|name, _| variables.iter().any(|v| v == name));
}

fn placeholder_pattern(prefix: &str, suffix: &str, name_pattern: &str) -> Option<Regex> {
    let pattern = format!(
        "{}\\s*{}\\s*{}",
        regex::escape(prefix),
        name_pattern,
        regex::escape(suffix)
    );
    Regex::new(&pattern).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extracts_deduplicated_names_in_first_seen_order() {
        let vars = extract_variables(
            ["Hello {{name}}, your {{name}} is ready, {{topic}} too"],
            "{{",
            "}}",
        );
        assert_eq!(vars, vec!["name".to_string(), "topic".to_string()]);
    }

    #[test]
    fn interior_whitespace_is_stripped() {
        let vars = extract_variables(["{{ user_name }}"], "{{", "}}");
        assert_eq!(vars, vec!["user_name".to_string()]);
    }

    #[test]
    fn no_placeholders_means_empty_set() {
        assert!(extract_variables(["no placeholders here"], "{{", "}}").is_empty());
    }

    #[test]
    fn empty_delimiter_disables_scanning() {
        assert!(extract_variables(["{{name}}"], "", "}}").is_empty());
        assert!(extract_variables(["{{name}}"], "{{", "").is_empty());
    }

    #[test]
    fn regex_metacharacters_in_delimiters_are_literal() {
        let vars = extract_variables(["pick $[x]$ and $[y]$"], "$[", "]$");
        assert_eq!(vars, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn collects_across_multiple_texts() {
        let vars = extract_variables(["a {{x}}", "b {{y}} and {{x}}"], "{{", "}}");
        assert_eq!(vars, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn substitutes_bound_value() {
        let vars = vec!["name".to_string()];
        let result = substitute(
            "Hi {{name}}!",
            "{{",
            "}}",
            &vars,
            &bindings(&[("name", "Ada")]),
        );
        assert_eq!(result, "Hi Ada!");
    }

    #[test]
    fn missing_binding_becomes_empty_string() {
        let vars = vec!["name".to_string()];
        let result = substitute("Hi {{name}}!", "{{", "}}", &vars, &HashMap::new());
        assert_eq!(result, "Hi !");
    }

    #[test]
    fn whitespace_variants_of_the_placeholder_match() {
        let vars = vec!["name".to_string()];
        let result = substitute(
            "{{name}} and {{ name }}",
            "{{",
            "}}",
            &vars,
            &bindings(&[("name", "Ada")]),
        );
        assert_eq!(result, "Ada and Ada");
    }

    #[test]
    fn unknown_placeholders_are_left_untouched() {
        let vars = vec!["name".to_string()];
        let result = substitute(
            "{{name}} vs {{other}}",
            "{{",
            "}}",
            &vars,
            &bindings(&[("name", "Ada")]),
        );
        assert_eq!(result, "Ada vs {{other}}");
    }

    #[test]
    fn replacement_text_is_not_expanded() {
        let vars = vec!["name".to_string()];
        let result = substitute(
            "Hi {{name}}!",
            "{{",
            "}}",
            &vars,
            &bindings(&[("name", "$1 ${name}")]),
        );
        assert_eq!(result, "Hi $1 ${name}!");
    }

    #[test]
    fn prune_drops_stale_bindings_and_keeps_live_ones() {
        let vars = vec!["kept".to_string()];
        let mut map = bindings(&[("kept", "v1"), ("stale", "v2")]);
        prune_bindings(&vars, &mut map);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("kept").map(String::as_str), Some("v1"));
    }
}
