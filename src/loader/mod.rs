pub mod fingerprint;
pub mod parser;
pub mod png_text;
pub mod raw_text;
