use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::document::{Section, WorkflowDocument};
use crate::error::{Error, Result};

/// String-keyed metadata attached to an image.
///
/// Values coming from a file are `Value::String` holding JSON text; hosts
/// that already parsed them may store structured values directly.
pub type ImageMetadata = IndexMap<String, Value>;

/// An image after decoding: dimensions, 8-bit samples and its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Row-major samples. Empty when only the container was read.
    pub pixels: Vec<u8>,
    pub metadata: ImageMetadata,
}

impl DecodedImage {
    pub fn with_metadata(metadata: ImageMetadata) -> Self {
        DecodedImage { metadata, ..Default::default() }
    }
}

/// A batch of frames as produced by the image loader: `[batch, height, width, channels]`
/// with samples normalized to `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl PixelBuffer {
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Result<Self> {
        let [batch, height, width, channels] = shape;

        if batch == 0 {
            return Err(Error::InvalidPixelBuffer("batch is empty".to_string()));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::InvalidPixelBuffer(format!("unsupported channel count {}", channels)));
        }
        if u32::try_from(height).is_err() || u32::try_from(width).is_err() {
            return Err(Error::InvalidPixelBuffer(format!("frame size {}x{} is too large", width, height)));
        }

        let expected = batch
            .checked_mul(height)
            .and_then(|n| n.checked_mul(width))
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| Error::InvalidPixelBuffer("shape overflows".to_string()))?;

        if data.len() != expected {
            return Err(Error::InvalidPixelBuffer(format!(
                "shape {:?} needs {} samples, got {}",
                shape,
                expected,
                data.len()
            )));
        }

        Ok(PixelBuffer { shape, data })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Rebuilds the first frame as an 8-bit image. Pixel data carries no
    /// metadata, so the result never has any.
    pub fn first_frame(&self) -> DecodedImage {
        let [_, height, width, channels] = self.shape;
        let frame_len = height * width * channels;

        let pixels = self.data[..frame_len].iter().map(|sample| denormalize(*sample)).collect();

        DecodedImage {
            width: width as u32,
            height: height as u32,
            channels: channels as u8,
            pixels,
            metadata: ImageMetadata::new(),
        }
    }
}

fn denormalize(sample: f32) -> u8 {
    if sample.is_nan() {
        return 0;
    }
    (sample * 255.0).clamp(0.0, 255.0) as u8
}

/// The image carrier accepts either form.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    Decoded(DecodedImage),
    Pixels(PixelBuffer),
}

/// Builds a workflow document from image metadata.
///
/// `workflow` / `prompt` entries win outright. Without them, any entry whose
/// text looks like a JSON object mentioning `class_type` is kept under its
/// own key. Entries that fail to decode are ignored.
pub fn extract_document(metadata: &ImageMetadata) -> Option<WorkflowDocument> {
    let mut document = WorkflowDocument::new();

    for section in Section::ALL {
        let Some(raw) = metadata.get(section.as_str()) else {
            continue;
        };
        match decode_entry(raw) {
            Some(value) => document.insert_section(section, value),
            None => log::debug!("Metadata entry '{}' is not valid JSON, skipping.", section),
        }
    }

    if !document.is_empty() {
        return Some(document);
    }

    for (key, raw) in metadata {
        let Some(text) = raw.as_str().filter(|text| text.trim_start().starts_with('{')) else {
            continue;
        };
        let Ok(parsed) = serde_json::from_str::<Value>(text) else {
            continue;
        };

        if Section::from_key(key).is_some() || parsed.to_string().contains("class_type") {
            log::debug!("Salvaged node graph from metadata entry '{}'.", key);
            document.insert(key.clone(), parsed);
        }
    }

    if document.is_empty() { None } else { Some(document) }
}

fn decode_entry(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(text) => serde_json::from_str(text).ok(),
        structured => Some(structured.clone()),
    }
}
