use serde_json::{Map, Value};

use crate::domain::document::WorkflowDocument;

// Nesting limit for JSON text wrapped in JSON strings.
const MAX_UNWRAP_DEPTH: usize = 8;

/// Parses free text that contains a workflow document somewhere.
///
/// Strategies, first success wins:
/// 1. the whole text as JSON;
/// 2. the slice from the first `{` to the last `}`.
///
/// Objects become the document as-is, other JSON values are wrapped as
/// `{"data": value}`. A JSON string is unwrapped while its content is JSON
/// again, so a document quoted one or more extra times resolves to itself;
/// plain string content is wrapped. Returns `None` for blank or unparseable text.
pub fn parse_raw_metadata(text: &str) -> Option<WorkflowDocument> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(inner)) => return Some(unwrap_string(inner, 1)),
        Ok(value) => return Some(into_document(value)),
        Err(_) => {}
    }

    parse_braced_slice(text)
}

fn parse_braced_slice(text: &str) -> Option<WorkflowDocument> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) => Some(into_document(value)),
        Err(_) => None,
    }
}

fn unwrap_string(inner: String, depth: usize) -> WorkflowDocument {
    if depth > MAX_UNWRAP_DEPTH {
        log::warn!("Raw metadata is nested more than {} string levels deep, giving up.", MAX_UNWRAP_DEPTH);
        return into_document(Value::String(inner));
    }

    match serde_json::from_str::<Value>(inner.trim()) {
        Ok(Value::String(next)) => unwrap_string(next, depth + 1),
        Ok(value) => into_document(value),
        Err(_) => into_document(Value::String(inner)),
    }
}

fn into_document(value: Value) -> WorkflowDocument {
    match value {
        Value::Object(map) => WorkflowDocument::from_map(map),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            WorkflowDocument::from_map(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(text: &str) -> Value {
        parse_raw_metadata(text).expect("parses").into_value()
    }

    #[test]
    fn test_direct_object() {
        assert_eq!(parsed(r#" {"prompt": {"1": {"class_type": "A"}}} "#), json!({"prompt": {"1": {"class_type": "A"}}}));
    }

    #[test]
    fn test_direct_non_object_is_wrapped() {
        assert_eq!(parsed("[1, 2]"), json!({"data": [1, 2]}));
        assert_eq!(parsed("42"), json!({"data": 42}));
        assert_eq!(parsed("null"), json!({"data": null}));
    }

    #[test]
    fn test_embedded_in_free_text() {
        let text = "Generated with settings: {\"3\": {\"inputs\": {\"seed\": 9}}} -- end";
        assert_eq!(parsed(text), json!({"3": {"inputs": {"seed": 9}}}));
    }

    #[test]
    fn test_double_encoded_document() {
        let inner = r#"{"3": {"class_type": "KSampler", "inputs": {"seed": 42}}}"#;
        let once = serde_json::to_string(inner).unwrap();
        let twice = serde_json::to_string(&once).unwrap();

        assert_eq!(parsed(&once), parsed(inner));
        assert_eq!(parsed(&twice), parsed(inner));
    }

    #[test]
    fn test_quoted_plain_text_is_wrapped() {
        assert_eq!(parsed(r#""hello""#), json!({"data": "hello"}));
    }

    #[test]
    fn test_quoted_text_with_braces_is_not_sliced() {
        assert_eq!(parsed(r#""note {} end""#), json!({"data": "note {} end"}));
        assert_eq!(parsed(r#""  ""#), json!({"data": "  "}));
    }

    #[test]
    fn test_unwrap_depth_is_bounded() {
        let mut text = r#"{"a": 1}"#.to_string();
        for _ in 0..(MAX_UNWRAP_DEPTH + 3) {
            text = serde_json::to_string(&text).unwrap();
        }
        // Too deep to reach the object, so the deepest decoded string is wrapped instead.
        let value = parsed(&text);
        assert!(value["data"].is_string());
    }

    #[test]
    fn test_blank_and_garbage() {
        assert!(parse_raw_metadata("").is_none());
        assert!(parse_raw_metadata("   \n\t").is_none());
        assert!(parse_raw_metadata("no json here").is_none());
        assert!(parse_raw_metadata("} backwards {").is_none());
        assert!(parse_raw_metadata("{ broken").is_none());
    }

    #[test]
    fn test_empty_object_parses_to_empty_document() {
        assert!(parse_raw_metadata("{}").expect("parses").is_empty());
    }
}
