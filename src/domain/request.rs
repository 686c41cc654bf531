use std::path::PathBuf;

use serde_json::Value;

use crate::domain::image::ImageInput;
use crate::query::criteria::SearchCriteria;

/// Everything a host can hand to one query call. All inputs are optional;
/// empty strings count as "not supplied".
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub key: String,
    pub image: Option<ImageInput>,
    pub file_path: Option<PathBuf>,
    pub raw_metadata: String,
    pub node_title: String,
    pub node_type: String,
    pub search_workflow: bool,

    /// Prompt of the execution currently running in the host.
    pub prompt: Option<Value>,
    /// Host extra info; its `workflow` entry is used alongside `prompt`.
    pub extra_pnginfo: Option<Value>,
}

impl QueryRequest {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria::new(&self.key, &self.node_title, &self.node_type, self.search_workflow)
    }
}
