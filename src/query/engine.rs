use serde_json::Value;

use crate::domain::document::NodeGraph;
use crate::error::Result;
use crate::query::criteria::{SearchCriteria, SearchMode};
use crate::query::format::stringify;
use crate::query::lookup::find_key;

/// Raw result of a search, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<'a> {
    pub mode: SearchMode,
    /// Nodes that passed the title/type filter (every node for an unfiltered search).
    pub matched_nodes: usize,
    /// Whole node records or found values, depending on `mode`.
    pub results: Vec<&'a Value>,
}

pub fn search<'a>(graph: NodeGraph<'a>, criteria: &SearchCriteria) -> Result<SearchOutcome<'a>> {
    let mode = criteria.mode()?;
    let filter = criteria.filter();
    let mut matched_nodes = 0;
    let mut results = Vec::new();

    for node in graph.records().filter(|node| filter.matches(node)) {
        matched_nodes += 1;

        let Some(key) = criteria.key() else {
            results.push(node.value());
            continue;
        };

        if let Some(found) = find_key(node.value(), key) {
            results.push(found);
            if mode == SearchMode::KeyInFirstNode {
                break;
            }
        }
    }

    if mode == SearchMode::KeyInFilteredNodes && filter.is_title_only() {
        collapse_identical(&mut results);
    }

    Ok(SearchOutcome { mode, matched_nodes, results })
}

/// Several nodes sharing a title often carry the same value; report it once.
fn collapse_identical(results: &mut Vec<&Value>) {
    let Some((first, rest)) = results.split_first() else {
        return;
    };
    let first_text = stringify(first);
    if rest.iter().all(|value| stringify(value) == first_text) {
        results.truncate(1);
    }
}
