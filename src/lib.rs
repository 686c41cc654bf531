use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::loader::png_text::{ImageDecoder, PngMetadataDecoder};
use crate::resolver::CarrierResolver;

pub mod api;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod query;
pub mod resolver;

pub use crate::domain::document::WorkflowDocument;
pub use crate::domain::image::{DecodedImage, ImageInput, PixelBuffer};
pub use crate::domain::request::QueryRequest;
pub use crate::loader::fingerprint::fingerprint_file;

/// Status text when no carrier produced a document.
pub const NO_WORKFLOW_DATA: &str = "No workflow data found";

/// Answers one metadata query with a single line (or block) of text.
///
/// Errors never escape: they come back as `"Error: ..."` text, the same
/// channel successful results use.
pub fn comb_metadata(request: &QueryRequest, sink: &dyn DiagnosticSink) -> String {
    match try_comb_metadata(request, sink) {
        Ok(text) => text,
        Err(e) => e.to_output_text(),
    }
}

pub fn try_comb_metadata(request: &QueryRequest, sink: &dyn DiagnosticSink) -> Result<String> {
    try_comb_metadata_with(request, &PngMetadataDecoder, sink)
}

/// Same as [`try_comb_metadata`] with a caller-supplied image decoder for the file carrier.
pub fn try_comb_metadata_with<D: ImageDecoder>(request: &QueryRequest, decoder: &D, sink: &dyn DiagnosticSink) -> Result<String> {
    let resolver = CarrierResolver::from_request(request, decoder);
    log::debug!("Resolving workflow document from {} carrier(s).", resolver.len());

    match resolver.resolve(sink)? {
        Some(document) => query::query(&document, &request.criteria(), sink),
        None => Ok(NO_WORKFLOW_DATA.to_string()),
    }
}
