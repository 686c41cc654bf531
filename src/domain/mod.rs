pub mod document;
pub mod image;
pub mod node;
pub mod request;
