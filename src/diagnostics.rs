use std::fmt;
use std::sync::{Mutex, PoisonError};

use log::Level;

use crate::domain::document::ScopeKind;
use crate::resolver::carrier::CarrierKind;

/// Structured events emitted while resolving and querying a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    DocumentResolved { carrier: CarrierKind, keys: Vec<String> },
    SoftMiss { carrier: CarrierKind, reason: String },
    HardFailure { carrier: CarrierKind, reason: String },
    MetadataKeys { carrier: CarrierKind, keys: Vec<String> },
    NoDocument,
    ScopeSelected(ScopeKind),
}

impl DiagnosticEvent {
    pub fn level(&self) -> Level {
        match self {
            DiagnosticEvent::DocumentResolved { .. } => Level::Info,
            DiagnosticEvent::SoftMiss { .. } | DiagnosticEvent::NoDocument => Level::Warn,
            DiagnosticEvent::HardFailure { .. } => Level::Error,
            DiagnosticEvent::MetadataKeys { .. } | DiagnosticEvent::ScopeSelected(_) => Level::Debug,
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::DocumentResolved { carrier, keys } => {
                write!(f, "Resolved workflow document from {} (keys: {})", carrier, keys.join(", "))
            }
            DiagnosticEvent::SoftMiss { carrier, reason } => {
                write!(f, "No workflow document from {}: {}; continuing to other sources", carrier, reason)
            }
            DiagnosticEvent::HardFailure { carrier, reason } => write!(f, "{} failed: {}", carrier, reason),
            DiagnosticEvent::MetadataKeys { carrier, keys } => {
                write!(f, "Metadata keys available on {}: [{}]", carrier, keys.join(", "))
            }
            DiagnosticEvent::NoDocument => f.write_str("No carrier produced a workflow document"),
            DiagnosticEvent::ScopeSelected(scope) => write!(f, "Searching {}", scope),
        }
    }
}

/// Where the resolver and query engine report what they are doing.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, event: DiagnosticEvent) {
        log::log!(target: "meta_comb::diagnostics", event.level(), "{}", event);
    }
}

/// Keeps events in memory, for tests and hosts that surface them elsewhere.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: DiagnosticEvent) {}
}
