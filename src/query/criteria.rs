use crate::domain::node::NodeRecord;
use crate::error::{Error, Result};

/// What a query looks for. Blank inputs are normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    key: Option<String>,
    node_title: Option<String>,
    node_type: Option<String>,
    search_workflow: bool,
}

impl SearchCriteria {
    /// The key is trimmed; title and type are matched exactly as given.
    pub fn new(key: &str, node_title: &str, node_type: &str, search_workflow: bool) -> Self {
        let non_empty = |text: &str| (!text.is_empty()).then(|| text.to_string());

        SearchCriteria {
            key: non_empty(key.trim()),
            node_title: non_empty(node_title),
            node_type: non_empty(node_type),
            search_workflow,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn node_title(&self) -> Option<&str> {
        self.node_title.as_deref()
    }

    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }

    pub fn search_workflow(&self) -> bool {
        self.search_workflow
    }

    pub fn filter(&self) -> NodeFilter<'_> {
        NodeFilter { title: self.node_title(), node_type: self.node_type() }
    }

    /// Fails with a usage error when nothing at all was asked for.
    pub fn mode(&self) -> Result<SearchMode> {
        let mode = match (self.key.is_some(), self.node_title.is_some(), self.node_type.is_some()) {
            (false, true, true) => SearchMode::NodesByTitleAndType,
            (false, true, false) => SearchMode::NodesByTitle,
            (false, false, true) => SearchMode::NodesByType,
            (false, false, false) => return Err(Error::MissingSearchCriteria),
            (true, false, false) => SearchMode::KeyInFirstNode,
            (true, _, _) => SearchMode::KeyInFilteredNodes,
        };
        Ok(mode)
    }
}

/// The five ways a query can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Whole node records matching both title and type.
    NodesByTitleAndType,
    /// Whole node records matching the title.
    NodesByTitle,
    /// Whole node records matching the type.
    NodesByType,
    /// The key's value in every node passing the title/type filter.
    KeyInFilteredNodes,
    /// The key's value in the first node that has it.
    KeyInFirstNode,
}

/// Exact-match title/type filter. An empty filter accepts every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFilter<'a> {
    pub title: Option<&'a str>,
    pub node_type: Option<&'a str>,
}

impl NodeFilter<'_> {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.node_type.is_none()
    }

    pub fn is_title_only(&self) -> bool {
        self.title.is_some() && self.node_type.is_none()
    }

    pub fn matches(&self, node: &NodeRecord<'_>) -> bool {
        if let Some(node_type) = self.node_type {
            if node.class_type() != Some(node_type) {
                return false;
            }
        }
        if let Some(title) = self.title {
            if node.title().as_deref() != Some(title) {
                return false;
            }
        }
        true
    }

    /// Message for a filter no node passed. `None` for an empty filter.
    pub fn miss_message(&self) -> Option<String> {
        match (self.title, self.node_type) {
            (Some(title), Some(node_type)) => {
                Some(format!("No nodes found matching title '{}' and type '{}'", title, node_type))
            }
            (Some(title), None) => Some(format!("No node found with title '{}'", title)),
            (None, Some(node_type)) => Some(format!("No nodes found of type '{}'", node_type)),
            (None, None) => None,
        }
    }
}
