use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::PdfSearchError;

/// zlibで圧縮 (FlateDecode)
pub fn encode_samples(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfSearchError::encode(format!("Flate encode error: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PdfSearchError::encode(format!("Flate encode error: {}", e)))
}

/// zlib展開
pub fn decode_samples(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| PdfSearchError::encode(format!("Flate decode error: {}", e)))?;
    Ok(out)
}
