use std::fmt;

use serde_json::{Map, Value};

use crate::domain::node::{NodeRecord, classify_node};

/// The two conventional top-level sections of an embedded workflow.
///
/// `prompt` holds the execution graph (node id -> `class_type` + inputs),
/// `workflow` the UI graph the editor saved alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Prompt,
    Workflow,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Workflow, Section::Prompt];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Prompt => "prompt",
            Section::Workflow => "workflow",
        }
    }

    pub fn from_key(key: &str) -> Option<Section> {
        match key {
            "prompt" => Some(Section::Prompt),
            "workflow" => Some(Section::Workflow),
            _ => None,
        }
    }

    pub fn other(self) -> Section {
        match self {
            Section::Prompt => Section::Workflow,
            Section::Workflow => Section::Prompt,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of a document a query ends up searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Section(Section),
    WholeDocument,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Section(section) => write!(f, "section '{}'", section),
            ScopeKind::WholeDocument => f.write_str("whole document"),
        }
    }
}

/// A normalized workflow description, built fresh for every query.
///
/// Usually holds `prompt` and/or `workflow`, but a document parsed from raw
/// text may carry arbitrary top-level keys; such documents are searched as a
/// whole. Key order is the order the source had.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDocument {
    root: Map<String, Value>,
}

impl WorkflowDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: Map<String, Value>) -> Self {
        WorkflowDocument { root }
    }

    pub fn insert_section(&mut self, section: Section, graph: Value) {
        self.root.insert(section.as_str().to_string(), graph);
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.root.insert(key.into(), value);
    }

    pub fn section(&self, section: Section) -> Option<&Value> {
        self.root.get(section.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Top-level keys, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Picks the preferred section, falls back to the other one, and finally
    /// to the whole document when neither section has content.
    pub fn select_scope(&self, prefer_workflow: bool) -> Scope<'_> {
        let preferred = if prefer_workflow { Section::Workflow } else { Section::Prompt };

        for section in [preferred, preferred.other()] {
            if let Some(value) = self.section(section).filter(|value| has_content(value)) {
                return Scope { kind: ScopeKind::Section(section), graph: NodeGraph::from_value(value) };
            }
        }

        Scope { kind: ScopeKind::WholeDocument, graph: NodeGraph::from_map(&self.root) }
    }
}

/// A section counts as present only if it carries something.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub kind: ScopeKind,
    pub graph: NodeGraph<'a>,
}

/// One section (or the whole document) viewed as node id -> node record.
///
/// A scope that is not a mapping at all has no nodes.
#[derive(Debug, Clone, Copy)]
pub struct NodeGraph<'a> {
    entries: Option<&'a Map<String, Value>>,
}

impl<'a> NodeGraph<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        NodeGraph { entries: value.as_object() }
    }

    pub fn from_map(map: &'a Map<String, Value>) -> Self {
        NodeGraph { entries: Some(map) }
    }

    /// Well-formed node records in document order. Malformed entries are skipped.
    pub fn records(self) -> impl Iterator<Item = NodeRecord<'a>> {
        self.entries.into_iter().flat_map(|map| map.iter()).filter_map(|(id, value)| classify_node(id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> WorkflowDocument {
        match value {
            Value::Object(map) => WorkflowDocument::from_map(map),
            other => panic!("expected an object, got {}", other),
        }
    }

    #[test]
    fn test_prefers_prompt_by_default() {
        let doc = document(json!({
            "workflow": {"1": {"class_type": "A"}},
            "prompt": {"2": {"class_type": "B"}}
        }));

        let scope = doc.select_scope(false);
        assert_eq!(scope.kind, ScopeKind::Section(Section::Prompt));
        let ids: Vec<&str> = scope.graph.records().map(|node| node.id()).collect();
        assert_eq!(ids, vec!["2"]);

        let scope = doc.select_scope(true);
        assert_eq!(scope.kind, ScopeKind::Section(Section::Workflow));
    }

    #[test]
    fn test_falls_back_to_other_section_when_empty() {
        let doc = document(json!({"workflow": {}, "prompt": {"2": {"class_type": "B"}}}));
        assert_eq!(doc.select_scope(true).kind, ScopeKind::Section(Section::Prompt));

        let doc = document(json!({"prompt": {"2": {"class_type": "B"}}}));
        assert_eq!(doc.select_scope(true).kind, ScopeKind::Section(Section::Prompt));
    }

    #[test]
    fn test_falls_back_to_whole_document() {
        let doc = document(json!({"3": {"class_type": "KSampler", "inputs": {"seed": 7}}}));
        let scope = doc.select_scope(false);
        assert_eq!(scope.kind, ScopeKind::WholeDocument);
        assert_eq!(scope.graph.records().count(), 1);
    }

    #[test]
    fn test_non_mapping_entries_are_skipped() {
        let doc = document(json!({"prompt": {"1": 5, "2": [1, 2], "3": {"class_type": "X"}, "4": null}}));
        let ids: Vec<&str> = doc.select_scope(false).graph.records().map(|node| node.id()).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn test_non_mapping_scope_has_no_nodes() {
        let doc = document(json!({"prompt": [1, 2, 3]}));
        let scope = doc.select_scope(false);
        assert_eq!(scope.kind, ScopeKind::Section(Section::Prompt));
        assert_eq!(scope.graph.records().count(), 0);
    }
}
