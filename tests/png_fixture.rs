use std::io::Write;

use flate2::Compression;
use flate2::Crc;
use flate2::write::ZlibEncoder;
use tempfile::NamedTempFile;

pub const PROMPT_JSON: &str = include_str!("fixtures/desk_scene_prompt.json");
pub const WORKFLOW_JSON: &str = include_str!("fixtures/desk_scene_workflow.json");

/// How a text entry is stored in the PNG.
pub enum TextChunk<'a> {
    Plain(&'a str, &'a str),
    Compressed(&'a str, &'a str),
    International(&'a str, &'a str),
}

fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);

    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    out
}

fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn join(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// A 1x1 RGBA PNG carrying the given text chunks.
pub fn png_bytes(texts: &[TextChunk<'_>]) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    out.extend(chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]));

    for text in texts {
        let encoded = match text {
            TextChunk::Plain(key, value) => chunk(b"tEXt", &join(&[key.as_bytes(), b"\0", value.as_bytes()])),
            TextChunk::Compressed(key, value) => {
                chunk(b"zTXt", &join(&[key.as_bytes(), b"\0\0", &zlib(value.as_bytes())]))
            }
            TextChunk::International(key, value) => {
                chunk(b"iTXt", &join(&[key.as_bytes(), b"\0\0\0\0\0", value.as_bytes()]))
            }
        };
        out.extend(encoded);
    }

    out.extend(chunk(b"IDAT", &zlib(&[0, 0, 0, 0, 0])));
    out.extend(chunk(b"IEND", &[]));
    out
}

pub fn write_png(texts: &[TextChunk<'_>]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), png_bytes(texts)).unwrap();
    file
}

/// The image a sampler pipeline saves: prompt as tEXt, workflow as zTXt.
pub fn desk_scene_png() -> NamedTempFile {
    write_png(&[TextChunk::Plain("prompt", PROMPT_JSON), TextChunk::Compressed("workflow", WORKFLOW_JSON)])
}
