pub mod carrier;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::domain::document::WorkflowDocument;
use crate::domain::request::QueryRequest;
use crate::error::Result;
use crate::loader::png_text::ImageDecoder;
use crate::resolver::carrier::{
    CarrierStrategy, ExecutionContextCarrier, FileCarrier, ImageCarrier, RawTextCarrier, Resolution,
};

/// Ordered chain of carriers, asked one after another until one yields a
/// document or fails hard.
#[derive(Default)]
pub struct CarrierResolver<'a> {
    chain: Vec<Box<dyn CarrierStrategy + 'a>>,
}

impl<'a> CarrierResolver<'a> {
    pub fn new() -> Self {
        CarrierResolver { chain: Vec::new() }
    }

    /// Builds the chain for a request: file path, image, raw text, execution
    /// context. Inputs that are absent or blank do not join the chain.
    pub fn from_request<D: ImageDecoder>(request: &'a QueryRequest, decoder: &'a D) -> Self {
        let mut resolver = CarrierResolver::new();

        if let Some(path) = request.file_path.as_deref().filter(|path| !path.as_os_str().is_empty()) {
            resolver.push(FileCarrier::new(path, decoder));
        }
        if let Some(image) = &request.image {
            resolver.push(ImageCarrier::new(image));
        }
        if !request.raw_metadata.trim().is_empty() {
            resolver.push(RawTextCarrier::new(&request.raw_metadata));
        }
        if let Some(prompt) = request.prompt.as_ref().filter(|prompt| !prompt.is_null()) {
            resolver.push(ExecutionContextCarrier::new(prompt, request.extra_pnginfo.as_ref()));
        }

        resolver
    }

    pub fn push(&mut self, carrier: impl CarrierStrategy + 'a) {
        self.chain.push(Box::new(carrier));
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// `Ok(None)` when every carrier missed or none was supplied.
    pub fn resolve(&self, sink: &dyn DiagnosticSink) -> Result<Option<WorkflowDocument>> {
        for carrier in &self.chain {
            match carrier.resolve(sink) {
                Resolution::Found(document) => {
                    sink.record(DiagnosticEvent::DocumentResolved {
                        carrier: carrier.kind(),
                        keys: document.keys().map(str::to_string).collect(),
                    });
                    return Ok(Some(document));
                }
                Resolution::Miss(reason) => {
                    sink.record(DiagnosticEvent::SoftMiss { carrier: carrier.kind(), reason });
                }
                Resolution::Failed(e) => return Err(e),
            }
        }

        sink.record(DiagnosticEvent::NoDocument);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::domain::document::Section;
    use crate::domain::image::{DecodedImage, ImageInput};
    use crate::error::Error;
    use crate::resolver::carrier::CarrierKind;
    use serde_json::json;
    use std::cell::Cell;
    use std::path::{Path, PathBuf};

    /// Counts decode calls and always returns an image without metadata.
    #[derive(Default)]
    struct CountingDecoder {
        calls: Cell<usize>,
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedImage> {
            self.calls.set(self.calls.get() + 1);
            Ok(DecodedImage::default())
        }
    }

    #[test]
    fn test_blank_inputs_do_not_join_chain() {
        let request = QueryRequest {
            file_path: Some(PathBuf::new()),
            raw_metadata: "  \n ".to_string(),
            prompt: Some(serde_json::Value::Null),
            ..Default::default()
        };
        let decoder = CountingDecoder::default();

        let resolver = CarrierResolver::from_request(&request, &decoder);
        assert!(resolver.is_empty());

        let sink = MemorySink::new();
        assert!(resolver.resolve(&sink).unwrap().is_none());
        assert_eq!(sink.events(), vec![DiagnosticEvent::NoDocument]);
    }

    #[test]
    fn test_image_miss_falls_through_to_raw_text() {
        let request = QueryRequest {
            image: Some(ImageInput::Decoded(DecodedImage::default())),
            raw_metadata: r#"{"prompt": {"1": {"class_type": "KSampler"}}}"#.to_string(),
            ..Default::default()
        };
        let decoder = CountingDecoder::default();
        let sink = MemorySink::new();

        let document = CarrierResolver::from_request(&request, &decoder).resolve(&sink).unwrap().expect("document");
        assert!(document.section(Section::Prompt).is_some());
        assert!(sink.events().contains(&DiagnosticEvent::SoftMiss {
            carrier: CarrierKind::Image,
            reason: "no metadata found in image".to_string(),
        }));
        assert!(matches!(
            sink.events().last(),
            Some(DiagnosticEvent::DocumentResolved { carrier: CarrierKind::RawText, .. })
        ));
    }

    #[test]
    fn test_file_failure_stops_chain() {
        let request = QueryRequest {
            file_path: Some(PathBuf::from("empty.png")),
            raw_metadata: r#"{"1": {}}"#.to_string(),
            prompt: Some(json!({"1": {}})),
            ..Default::default()
        };
        let decoder = CountingDecoder::default();

        let result = CarrierResolver::from_request(&request, &decoder).resolve(&MemorySink::new());
        assert!(matches!(result, Err(Error::NoMetadataInFile { .. })));
        assert_eq!(decoder.calls.get(), 1);
    }

    #[test]
    fn test_raw_text_failure_skips_execution_context() {
        let request = QueryRequest {
            raw_metadata: "definitely not json".to_string(),
            prompt: Some(json!({"1": {}})),
            ..Default::default()
        };
        let decoder = CountingDecoder::default();

        let result = CarrierResolver::from_request(&request, &decoder).resolve(&MemorySink::new());
        assert!(matches!(result, Err(Error::UnparsableRawMetadata)));
    }

    #[test]
    fn test_execution_context_is_last_resort() {
        let request = QueryRequest {
            image: Some(ImageInput::Decoded(DecodedImage::default())),
            prompt: Some(json!({"4": {"class_type": "CLIPTextEncode"}})),
            extra_pnginfo: Some(json!({"workflow": {"nodes": []}})),
            ..Default::default()
        };
        let decoder = CountingDecoder::default();

        let document = CarrierResolver::from_request(&request, &decoder)
            .resolve(&MemorySink::new())
            .unwrap()
            .expect("document");
        let keys: Vec<&str> = document.keys().collect();
        assert_eq!(keys, vec!["prompt", "workflow"]);
    }
}
