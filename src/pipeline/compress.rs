//! Payload compression applied before encryption.
//!
//! Sits in front of the core pipeline as the concrete text compressor; the
//! core itself only ever sees the resulting bytes.

use crate::error::{Result, StegoError};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Compression algorithm options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zstd,
    Lz4,
    Brotli,
}

impl std::str::FromStr for Compression {
    type Err = StegoError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "brotli" => Ok(Self::Brotli),
            "none" => Ok(Self::None),
            _ => Err(StegoError::UnsupportedAlgorithm(format!(
                "compression: {}",
                s
            ))),
        }
    }
}

/// Compress data using the specified algorithm
pub fn compress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::Zstd => compress_zstd(data),
        Compression::Lz4 => compress_lz4(data),
        Compression::Brotli => compress_brotli(data),
        Compression::None => Ok(data.to_vec()),
    }
}

/// Decompress data using the specified algorithm
pub fn decompress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::Zstd => decompress_zstd(data),
        Compression::Lz4 => decompress_lz4(data),
        Compression::Brotli => decompress_brotli(data),
        Compression::None => Ok(data.to_vec()),
    }
}

fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 19)
        .map_err(|e| StegoError::CompressionError(format!("zstd: {}", e)))
}

fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data)
        .map_err(|e| StegoError::DecompressionError(format!("zstd: {}", e)))
}

fn compress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| StegoError::DecompressionError(format!("lz4: {}", e)))
}

fn compress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut output, 4096, 11, 22);
        writer
            .write_all(data)
            .map_err(|e| StegoError::CompressionError(format!("brotli: {}", e)))?;
    }
    Ok(output)
}

fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut reader = brotli::Decompressor::new(data, 4096);
    reader
        .read_to_end(&mut output)
        .map_err(|e| StegoError::DecompressionError(format!("brotli: {}", e)))?;
    Ok(output)
}
