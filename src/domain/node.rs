use serde_json::{Map, Value};

/// Borrowed view of one pipeline step inside a node graph.
#[derive(Debug, Clone, Copy)]
pub struct NodeRecord<'a> {
    id: &'a str,
    value: &'a Value,
    fields: &'a Map<String, Value>,
}

impl<'a> NodeRecord<'a> {
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// The record as it appears in the document.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn fields(&self) -> &'a Map<String, Value> {
        self.fields
    }

    pub fn class_type(&self) -> Option<&'a str> {
        self.fields.get("class_type").and_then(Value::as_str)
    }

    /// Display title from `_meta.title`. Non-text titles use the host's
    /// spelling: `None`, `True`/`False`, numbers as written.
    pub fn title(&self) -> Option<String> {
        let title = self.fields.get("_meta")?.as_object()?.get("title")?;
        let text = match title {
            Value::String(text) => text.clone(),
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            other => other.to_string(),
        };
        Some(text)
    }
}

/// Total classification of a graph entry: mappings become records, anything
/// else is skipped.
pub fn classify_node<'a>(id: &'a str, value: &'a Value) -> Option<NodeRecord<'a>> {
    let fields = value.as_object()?;
    Some(NodeRecord { id, value, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_skips_non_mappings() {
        for value in [json!(null), json!(1), json!("KSampler"), json!([{"class_type": "KSampler"}])] {
            assert!(classify_node("1", &value).is_none(), "{} should be skipped", value);
        }
    }

    #[test]
    fn test_record_accessors() {
        let value = json!({"class_type": "KSampler", "_meta": {"title": "Sampler A"}, "inputs": {}});
        let node = classify_node("3", &value).expect("mapping is a record");

        assert_eq!(node.id(), "3");
        assert_eq!(node.class_type(), Some("KSampler"));
        assert_eq!(node.title().as_deref(), Some("Sampler A"));
        assert_eq!(node.value(), &value);
    }

    #[test]
    fn test_title_tolerates_odd_meta() {
        let no_meta = json!({"class_type": "A"});
        assert_eq!(classify_node("1", &no_meta).and_then(|n| n.title()), None);

        let bad_meta = json!({"_meta": "oops"});
        assert_eq!(classify_node("1", &bad_meta).and_then(|n| n.title()), None);

        let numeric = json!({"_meta": {"title": 12}});
        assert_eq!(classify_node("1", &numeric).and_then(|n| n.title()).as_deref(), Some("12"));

        let flag = json!({"_meta": {"title": true}});
        assert_eq!(classify_node("1", &flag).and_then(|n| n.title()).as_deref(), Some("True"));

        let null_title = json!({"_meta": {"title": null}});
        assert_eq!(classify_node("1", &null_title).and_then(|n| n.title()).as_deref(), Some("None"));

        let non_string_type = json!({"class_type": 4});
        assert_eq!(classify_node("1", &non_string_type).and_then(|n| n.class_type()), None);
    }
}
