use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::Crc;
use flate2::read::ZlibDecoder;
use serde_json::Value;

use crate::domain::image::DecodedImage;
use crate::error::{Error, Result};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// Upper bound for one inflated text chunk.
const TEXT_CHUNK_LIMIT: u64 = 64 * 1024 * 1024;

/// Turns an image file into a [`DecodedImage`] exposing its metadata.
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage>;
}

/// Reads the PNG container: header dimensions and text chunks. Pixel data is
/// left undecoded, the metadata is all the resolver needs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngMetadataDecoder;

impl ImageDecoder for PngMetadataDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage> {
        let bytes = fs::read(path)?;
        decode_png_metadata(&bytes)
    }
}

pub fn decode_png_metadata(bytes: &[u8]) -> Result<DecodedImage> {
    let body = bytes
        .strip_prefix(&PNG_SIGNATURE[..])
        .ok_or_else(|| Error::InvalidImage("not a PNG file (bad signature)".to_string()))?;

    let mut image = DecodedImage::default();
    let mut seen_header = false;

    for chunk in ChunkReader::new(body) {
        let chunk = chunk?;

        if !seen_header {
            if &chunk.kind != b"IHDR" {
                return Err(Error::InvalidImage("first chunk is not IHDR".to_string()));
            }
            read_header(chunk.data, &mut image)?;
            seen_header = true;
            continue;
        }

        let entry = match &chunk.kind {
            b"tEXt" => read_text(chunk.data),
            b"zTXt" => read_compressed_text(chunk.data),
            b"iTXt" => read_international_text(chunk.data),
            b"IEND" => break,
            _ => continue,
        };

        match entry {
            Ok((keyword, text)) => {
                image.metadata.insert(keyword, Value::String(text));
            }
            Err(reason) => {
                log::debug!("Skipping malformed {} chunk: {}", String::from_utf8_lossy(&chunk.kind), reason);
            }
        }
    }

    if !seen_header {
        return Err(Error::InvalidImage("missing IHDR chunk".to_string()));
    }

    Ok(image)
}

struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
}

struct ChunkReader<'a> {
    rest: &'a [u8],
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    fn new(body: &'a [u8]) -> Self {
        ChunkReader { rest: body, failed: false }
    }

    fn next_chunk(&mut self) -> Result<Chunk<'a>> {
        let truncated = || Error::InvalidImage("truncated chunk".to_string());

        let (length, rest) = self.rest.split_first_chunk::<4>().ok_or_else(truncated)?;
        let length = u32::from_be_bytes(*length) as usize;
        let (kind, rest) = rest.split_first_chunk::<4>().ok_or_else(truncated)?;

        if rest.len() < length {
            return Err(truncated());
        }
        let (data, rest) = rest.split_at(length);
        let (stored_crc, rest) = rest.split_first_chunk::<4>().ok_or_else(truncated)?;

        let mut crc = Crc::new();
        crc.update(kind);
        crc.update(data);
        if crc.sum() != u32::from_be_bytes(*stored_crc) {
            return Err(Error::InvalidImage(format!("CRC mismatch in {} chunk", String::from_utf8_lossy(kind))));
        }

        self.rest = rest;
        Ok(Chunk { kind: *kind, data })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }
        let chunk = self.next_chunk();
        self.failed = chunk.is_err();
        Some(chunk)
    }
}

fn read_header(data: &[u8], image: &mut DecodedImage) -> Result<()> {
    if data.len() != 13 {
        return Err(Error::InvalidImage(format!("IHDR has {} bytes, expected 13", data.len())));
    }

    image.width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    image.height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    image.channels = match data[9] {
        0 | 3 => 1,
        2 => 3,
        4 => 2,
        6 => 4,
        other => return Err(Error::InvalidImage(format!("unknown color type {}", other))),
    };

    Ok(())
}

fn split_keyword(data: &[u8]) -> std::result::Result<(String, &[u8]), String> {
    let nul = data.iter().position(|b| *b == 0).ok_or("keyword is not terminated")?;
    if nul == 0 || nul > 79 {
        return Err(format!("keyword length {} out of range", nul));
    }
    Ok((latin1(&data[..nul]), &data[nul + 1..]))
}

fn read_text(data: &[u8]) -> std::result::Result<(String, String), String> {
    let (keyword, text) = split_keyword(data)?;
    Ok((keyword, latin1(text)))
}

fn read_compressed_text(data: &[u8]) -> std::result::Result<(String, String), String> {
    let (keyword, rest) = split_keyword(data)?;
    let (method, compressed) = rest.split_first().ok_or("missing compression method")?;
    if *method != 0 {
        return Err(format!("unknown compression method {}", method));
    }
    Ok((keyword, latin1(&inflate(compressed)?)))
}

fn read_international_text(data: &[u8]) -> std::result::Result<(String, String), String> {
    let (keyword, rest) = split_keyword(data)?;
    let [flag, method, rest @ ..] = rest else {
        return Err("missing compression fields".to_string());
    };

    // Language tag and translated keyword are not needed.
    let mut fields = rest.splitn(3, |b| *b == 0);
    let (Some(_language), Some(_translated), Some(text)) = (fields.next(), fields.next(), fields.next()) else {
        return Err("unterminated language or translated keyword".to_string());
    };

    let text = match (flag, method) {
        (0, _) => text.to_vec(),
        (1, 0) => inflate(text)?,
        (_, method) => return Err(format!("unknown compression method {}", method)),
    };

    let text = String::from_utf8(text).map_err(|e| format!("text is not UTF-8: {}", e))?;
    Ok((keyword, text))
}

fn inflate(compressed: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .take(TEXT_CHUNK_LIMIT + 1)
        .read_to_end(&mut out)
        .map_err(|e| format!("inflate failed: {}", e))?;

    if out.len() as u64 > TEXT_CHUNK_LIMIT {
        return Err("inflated text exceeds limit".to_string());
    }
    Ok(out)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}
