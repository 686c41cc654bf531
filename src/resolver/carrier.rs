use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::domain::document::{Section, WorkflowDocument};
use crate::domain::image::{DecodedImage, ImageInput, extract_document};
use crate::error::Error;
use crate::loader::png_text::ImageDecoder;
use crate::loader::raw_text::parse_raw_metadata;

/// The input forms a workflow document can be derived from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarrierKind {
    FilePath,
    Image,
    RawText,
    ExecutionContext,
}

impl fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CarrierKind::FilePath => "file path",
            CarrierKind::Image => "image input",
            CarrierKind::RawText => "raw metadata text",
            CarrierKind::ExecutionContext => "execution context",
        };
        f.write_str(name)
    }
}

/// Outcome of asking one carrier for a document.
#[derive(Debug)]
pub enum Resolution {
    Found(WorkflowDocument),
    /// Nothing here, later carriers may still succeed.
    Miss(String),
    /// Stops the whole query.
    Failed(Error),
}

pub trait CarrierStrategy {
    fn kind(&self) -> CarrierKind;
    fn resolve(&self, sink: &dyn DiagnosticSink) -> Resolution;
}

/// An explicitly named image file. Anything short of a document is fatal.
pub struct FileCarrier<'a, D: ImageDecoder> {
    path: &'a Path,
    decoder: &'a D,
}

impl<'a, D: ImageDecoder> FileCarrier<'a, D> {
    pub fn new(path: &'a Path, decoder: &'a D) -> Self {
        FileCarrier { path, decoder }
    }

    fn fail(&self, sink: &dyn DiagnosticSink, reason: String) -> Resolution {
        sink.record(DiagnosticEvent::HardFailure { carrier: self.kind(), reason });
        Resolution::Failed(Error::NoMetadataInFile { path: self.path.to_path_buf() })
    }
}

impl<D: ImageDecoder> CarrierStrategy for FileCarrier<'_, D> {
    fn kind(&self) -> CarrierKind {
        CarrierKind::FilePath
    }

    fn resolve(&self, sink: &dyn DiagnosticSink) -> Resolution {
        let image = match self.decoder.decode(self.path) {
            Ok(image) => image,
            Err(e) => return self.fail(sink, format!("error reading '{}': {}", self.path.display(), e)),
        };

        match extract_document(&image.metadata) {
            Some(document) => Resolution::Found(document),
            None => {
                report_metadata_keys(sink, self.kind(), &image);
                self.fail(sink, format!("no metadata found in '{}'", self.path.display()))
            }
        }
    }
}

/// An image handed over in memory, decoded or as a pixel buffer. Missing
/// metadata is expected here (loaders usually strip it), so misses are soft.
pub struct ImageCarrier<'a> {
    image: &'a ImageInput,
}

impl<'a> ImageCarrier<'a> {
    pub fn new(image: &'a ImageInput) -> Self {
        ImageCarrier { image }
    }
}

impl CarrierStrategy for ImageCarrier<'_> {
    fn kind(&self) -> CarrierKind {
        CarrierKind::Image
    }

    fn resolve(&self, sink: &dyn DiagnosticSink) -> Resolution {
        let image: Cow<'_, DecodedImage> = match self.image {
            ImageInput::Decoded(image) => Cow::Borrowed(image),
            ImageInput::Pixels(buffer) => Cow::Owned(buffer.first_frame()),
        };

        match extract_document(&image.metadata) {
            Some(document) => Resolution::Found(document),
            None => {
                report_metadata_keys(sink, self.kind(), &image);
                let reason = match self.image {
                    ImageInput::Decoded(_) => "no metadata found in image",
                    ImageInput::Pixels(_) => "pixel buffers carry no metadata",
                };
                Resolution::Miss(reason.to_string())
            }
        }
    }
}

pub struct RawTextCarrier<'a> {
    text: &'a str,
}

impl<'a> RawTextCarrier<'a> {
    pub fn new(text: &'a str) -> Self {
        RawTextCarrier { text }
    }
}

impl CarrierStrategy for RawTextCarrier<'_> {
    fn kind(&self) -> CarrierKind {
        CarrierKind::RawText
    }

    fn resolve(&self, sink: &dyn DiagnosticSink) -> Resolution {
        match parse_raw_metadata(self.text).filter(|document| !document.is_empty()) {
            Some(document) => Resolution::Found(document),
            None => {
                sink.record(DiagnosticEvent::HardFailure {
                    carrier: self.kind(),
                    reason: format!("could not parse {} bytes of text", self.text.len()),
                });
                Resolution::Failed(Error::UnparsableRawMetadata)
            }
        }
    }
}

/// The prompt the host is currently executing, plus the editor workflow
/// from its extra info when available. Never fails.
pub struct ExecutionContextCarrier<'a> {
    prompt: &'a Value,
    extra_info: Option<&'a Value>,
}

impl<'a> ExecutionContextCarrier<'a> {
    pub fn new(prompt: &'a Value, extra_info: Option<&'a Value>) -> Self {
        ExecutionContextCarrier { prompt, extra_info }
    }
}

impl CarrierStrategy for ExecutionContextCarrier<'_> {
    fn kind(&self) -> CarrierKind {
        CarrierKind::ExecutionContext
    }

    fn resolve(&self, _sink: &dyn DiagnosticSink) -> Resolution {
        let mut document = WorkflowDocument::new();
        document.insert_section(Section::Prompt, self.prompt.clone());

        if let Some(workflow) = self.extra_info.and_then(|extra| extra.get(Section::Workflow.as_str())) {
            document.insert_section(Section::Workflow, workflow.clone());
        }

        Resolution::Found(document)
    }
}

fn report_metadata_keys(sink: &dyn DiagnosticSink, carrier: CarrierKind, image: &DecodedImage) {
    sink.record(DiagnosticEvent::MetadataKeys { carrier, keys: image.metadata.keys().cloned().collect() });
}
