use serde_json::Value;

use crate::error::Result;
use crate::query::criteria::{SearchCriteria, SearchMode};
use crate::query::engine::SearchOutcome;

/// Plain text form of a found value: strings unquoted, everything else as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Turns a search outcome into the single text output of a query.
pub fn render(outcome: &SearchOutcome<'_>, criteria: &SearchCriteria) -> Result<String> {
    let results = &outcome.results;

    if results.is_empty() {
        return Ok(not_found_message(outcome, criteria));
    }

    let text = match outcome.mode {
        SearchMode::NodesByTitle if results.len() == 1 => serde_json::to_string_pretty(results[0])?,
        SearchMode::NodesByTitle | SearchMode::NodesByType | SearchMode::NodesByTitleAndType => {
            serde_json::to_string_pretty(results)?
        }
        SearchMode::KeyInFilteredNodes | SearchMode::KeyInFirstNode if results.len() == 1 => stringify(results[0]),
        SearchMode::KeyInFilteredNodes | SearchMode::KeyInFirstNode => serde_json::to_string_pretty(results)?,
    };

    Ok(text)
}

fn not_found_message(outcome: &SearchOutcome<'_>, criteria: &SearchCriteria) -> String {
    let filter = criteria.filter();

    match criteria.key() {
        Some(key) if outcome.matched_nodes > 0 || filter.is_empty() => format!("Key '{}' not found", key),
        _ => filter.miss_message().unwrap_or_else(|| "No matching nodes found".to_string()),
    }
}
