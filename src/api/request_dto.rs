use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::image::{ImageInput, PixelBuffer};
use crate::domain::request::QueryRequest;
use crate::error::Error;

/// JSON form of a query request, field names as the host sends them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QueryRequestDto {
    pub key: String,
    pub image: Option<PixelBufferDto>,
    pub filepath: Option<PathBuf>,
    pub metadata_raw: String,
    pub node_title: String,
    pub node_type: String,
    pub search_workflow: bool,

    pub prompt: Option<Value>,
    pub extra_pnginfo: Option<Value>,
}

/// `[batch, height, width, channels]` samples in `0.0..=1.0`, flattened row-major.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PixelBufferDto {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

impl TryFrom<QueryRequestDto> for QueryRequest {
    type Error = Error;

    fn try_from(dto: QueryRequestDto) -> Result<Self, Self::Error> {
        let image = match dto.image {
            Some(buffer) => Some(ImageInput::Pixels(PixelBuffer::new(buffer.shape, buffer.data)?)),
            None => None,
        };

        Ok(QueryRequest {
            key: dto.key,
            image,
            file_path: dto.filepath,
            raw_metadata: dto.metadata_raw,
            node_title: dto.node_title,
            node_type: dto.node_type,
            search_workflow: dto.search_workflow,
            prompt: dto.prompt,
            extra_pnginfo: dto.extra_pnginfo,
        })
    }
}
