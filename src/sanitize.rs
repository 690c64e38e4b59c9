//! Sanitization of form data before export
//!
//! Every string leaf is HTML-entity-escaped so untrusted text is neutral in
//! an HTML-embedding context. Nested objects are sanitized recursively;
//! list elements are passed through as-is (known gap: a string inside a
//! list is exported unescaped).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A value in the exported record tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Text(String),
    Number(f64),
    Integer(u64),
    Date(NaiveDate),
    Bool(bool),
    Null,
    Object(BTreeMap<String, RecordValue>),
    List(Vec<RecordValue>),
}

impl RecordValue {
    pub fn object() -> BTreeMap<String, RecordValue> {
        BTreeMap::new()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SanitizeError {
    #[error("sanitization input must be an object")]
    NotAnObject,
}

/// Escape the six HTML-significant characters in a string leaf.
///
/// Ampersand is replaced first so entities produced by the later
/// replacements are not double-escaped within a single pass. Running the
/// function twice over its own output DOES double-escape (the `&` of each
/// produced entity is escaped again); callers must sanitize exactly once.
///
/// Any non-string input yields the empty string.
pub fn sanitize_string(value: &RecordValue) -> String {
    match value {
        RecordValue::Text(s) => escape_html(s),
        _ => String::new(),
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('/', "&#x2F;")
}

/// Produce a sanitized deep copy of an export record.
///
/// The top level must be an object. Strings are escaped, objects recurse,
/// dates/numbers/integers/bools/null pass through unchanged. Lists pass
/// through without recursing into their elements.
pub fn sanitize(value: &RecordValue) -> Result<RecordValue, SanitizeError> {
    match value {
        RecordValue::Object(_) => Ok(sanitize_node(value)),
        _ => Err(SanitizeError::NotAnObject),
    }
}

fn sanitize_node(value: &RecordValue) -> RecordValue {
    match value {
        RecordValue::Text(s) => RecordValue::Text(escape_html(s)),
        RecordValue::Object(map) => {
            let sanitized = map
                .iter()
                .map(|(k, v)| (k.clone(), sanitize_node(v)))
                .collect();
            RecordValue::Object(sanitized)
        }
        // Lists are not recursed into.
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> RecordValue {
        RecordValue::Text(s.to_string())
    }

    mod sanitize_string_fn {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_escapes_all_six_characters() {
            let input = text(r#"&<>"'/"#);
            assert_eq!(
                sanitize_string(&input),
                "&amp;&lt;&gt;&quot;&#x27;&#x2F;"
            );
        }

        #[test]
        fn test_plain_text_unchanged() {
            assert_eq!(sanitize_string(&text("Acme Corp")), "Acme Corp");
        }

        #[test]
        fn test_ampersand_escaped_before_others() {
            // A literal "&lt;" in the input must come out with its own
            // ampersand escaped, not be mistaken for an entity.
            assert_eq!(sanitize_string(&text("&lt;")), "&amp;lt;");
        }

        #[test]
        fn test_double_application_double_escapes() {
            let once = sanitize_string(&text("<"));
            assert_eq!(once, "&lt;");
            let twice = sanitize_string(&text(&once));
            assert_eq!(twice, "&amp;lt;");
        }

        #[test]
        fn test_non_string_inputs_yield_empty_string() {
            assert_eq!(sanitize_string(&RecordValue::Number(42.0)), "");
            assert_eq!(sanitize_string(&RecordValue::Bool(true)), "");
            assert_eq!(sanitize_string(&RecordValue::Null), "");
            assert_eq!(
                sanitize_string(&RecordValue::Date(
                    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                )),
                ""
            );
            assert_eq!(sanitize_string(&RecordValue::List(vec![])), "");
            assert_eq!(
                sanitize_string(&RecordValue::Object(RecordValue::object())),
                ""
            );
        }
    }

    mod sanitize_fn {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_top_level_must_be_object() {
            assert_eq!(sanitize(&text("hi")), Err(SanitizeError::NotAnObject));
            assert_eq!(
                sanitize(&RecordValue::Number(1.0)),
                Err(SanitizeError::NotAnObject)
            );
            assert_eq!(
                sanitize(&RecordValue::List(vec![])),
                Err(SanitizeError::NotAnObject)
            );
        }

        #[test]
        fn test_string_leaves_escaped() {
            let mut map = RecordValue::object();
            map.insert("employerName".into(), text("Benson & Hedges <ltd>"));
            let out = sanitize(&RecordValue::Object(map)).unwrap();
            let RecordValue::Object(out) = out else {
                panic!("expected object")
            };
            assert_eq!(
                out["employerName"],
                text("Benson &amp; Hedges &lt;ltd&gt;")
            );
        }

        #[test]
        fn test_non_string_leaves_pass_through() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
            let mut map = RecordValue::object();
            map.insert("income".into(), RecordValue::Integer(50000));
            map.insert("ratio".into(), RecordValue::Number(0.5));
            map.insert("start".into(), RecordValue::Date(date));
            map.insert("flag".into(), RecordValue::Bool(false));
            map.insert("nothing".into(), RecordValue::Null);
            let out = sanitize(&RecordValue::Object(map.clone())).unwrap();
            assert_eq!(out, RecordValue::Object(map));
        }

        #[test]
        fn test_nested_objects_are_recursed() {
            let mut inner = RecordValue::object();
            inner.insert("note".into(), text("a/b"));
            let mut map = RecordValue::object();
            map.insert("meta".into(), RecordValue::Object(inner));
            let out = sanitize(&RecordValue::Object(map)).unwrap();
            let RecordValue::Object(out) = out else {
                panic!("expected object")
            };
            let RecordValue::Object(meta) = &out["meta"] else {
                panic!("expected nested object")
            };
            assert_eq!(meta["note"], text("a&#x2F;b"));
        }

        #[test]
        fn test_list_elements_are_not_recursed() {
            // Known gap: strings inside lists are exported unescaped.
            let mut map = RecordValue::object();
            map.insert("tags".into(), RecordValue::List(vec![text("<raw>")]));
            let out = sanitize(&RecordValue::Object(map)).unwrap();
            let RecordValue::Object(out) = out else {
                panic!("expected object")
            };
            assert_eq!(out["tags"], RecordValue::List(vec![text("<raw>")]));
        }
    }
}
