pub mod criteria;
pub mod engine;
pub mod format;
pub mod lookup;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::domain::document::WorkflowDocument;
use crate::error::Result;
use crate::query::criteria::SearchCriteria;

/// Runs one query against a resolved document and formats the answer.
///
/// Only a usage error (no key, title or type) comes back as `Err`; empty
/// results are reported as text.
pub fn query(document: &WorkflowDocument, criteria: &SearchCriteria, sink: &dyn DiagnosticSink) -> Result<String> {
    criteria.mode()?;

    let scope = document.select_scope(criteria.search_workflow());
    sink.record(DiagnosticEvent::ScopeSelected(scope.kind));

    let outcome = engine::search(scope.graph, criteria)?;
    log::debug!("Search matched {} node(s), {} result(s).", outcome.matched_nodes, outcome.results.len());

    format::render(&outcome, criteria)
}
