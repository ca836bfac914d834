// CloudJukebox - Music archive and playback over object storage
// Copyright (C) 2025 CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Zlib compression implementation
//!
//! Archived songs are compressed at level 9. Decompression is strict: the input
//! must be one complete zlib stream with a valid header and checksum.

use crate::error::{CompressionError, CompressionResult};
use crate::{CompressionLevel, Compressor};
use flate2::read::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::fmt;
use std::io::Read;
use tracing::trace;

/// Zlib compressor implementation
#[derive(Clone)]
pub struct ZlibCompressor {
    level: CompressionLevel,
}

impl ZlibCompressor {
    /// Create a new Zlib compressor with the given compression level
    pub fn new(level: CompressionLevel) -> Self {
        ZlibCompressor { level }
    }

    /// Create a Zlib compressor with fast compression
    pub fn fast() -> Self {
        ZlibCompressor::new(CompressionLevel::Fast)
    }

    /// Create a Zlib compressor with best compression (the archive default)
    pub fn best() -> Self {
        ZlibCompressor::new(CompressionLevel::Best)
    }

    /// Get the configured level
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    fn get_compression(&self) -> Compression {
        Compression::new(self.level.to_zlib_level())
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        ZlibCompressor::best()
    }
}

impl fmt::Debug for ZlibCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZlibCompressor")
            .field("level", &self.level)
            .finish()
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(data, self.get_compression());
        let mut compressed = Vec::new();

        encoder.read_to_end(&mut compressed).map_err(|e| {
            CompressionError::compression_failed(format!("zlib compression failed: {}", e))
        })?;

        trace!(
            original = data.len(),
            compressed = compressed.len(),
            "zlib compressed"
        );
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        // CMF (0x78 for deflate/32K window) + FLG where (CMF * 256 + FLG) % 31 == 0
        let has_header = data.len() >= 2 && data[0] & 0x0f == 8 && {
            let cmf = data[0] as u16;
            let flg = data[1] as u16;
            (cmf * 256 + flg).is_multiple_of(31)
        };
        if !has_header {
            return Err(CompressionError::invalid_input(
                "data does not start with a zlib header",
            ));
        }

        let mut decoder = Decompress::new(true);
        let mut decompressed = Vec::with_capacity(data.len().saturating_mul(2).max(64));

        loop {
            if decompressed.len() == decompressed.capacity() {
                decompressed.reserve(decompressed.capacity().max(64 * 1024));
            }

            let consumed = decoder.total_in() as usize;
            let produced = decompressed.len();
            let status = decoder
                .decompress_vec(&data[consumed..], &mut decompressed, FlushDecompress::None)
                .map_err(|e| {
                    CompressionError::decompression_failed(format!(
                        "zlib decompression failed: {}",
                        e
                    ))
                })?;

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let stalled = decoder.total_in() as usize == consumed
                        && decompressed.len() == produced
                        && decompressed.len() < decompressed.capacity();
                    if stalled {
                        return Err(CompressionError::decompression_failed(
                            "zlib stream is truncated",
                        ));
                    }
                }
            }
        }

        if decoder.total_in() != data.len() as u64 {
            return Err(CompressionError::decompression_failed(format!(
                "{} trailing bytes after zlib stream",
                data.len() as u64 - decoder.total_in()
            )));
        }

        Ok(decompressed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zlib_compress_decompress() {
        let compressor = ZlibCompressor::best();
        let original = b"Hello, World! This is a test of zlib compression.";

        let compressed = compressor.compress(original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, &decompressed[..]);
    }

    #[test]
    fn test_default_is_level_nine() {
        let compressor = ZlibCompressor::default();
        assert_eq!(compressor.level(), CompressionLevel::Best);

        // Level 9 header is 0x78 0xDA
        let compressed = compressor.compress(b"abc").unwrap();
        assert_eq!(&compressed[..2], &[0x78, 0xda]);
    }

    #[test]
    fn test_empty_input_roundtrips() {
        let compressor = ZlibCompressor::best();
        let compressed = compressor.compress(b"").unwrap();
        assert!(!compressed.is_empty());
        assert!(compressor.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_uncompressed_data_is_rejected() {
        let compressor = ZlibCompressor::best();
        let err = compressor.decompress(b"This is not compressed").unwrap_err();
        assert!(err.is_invalid_input());

        assert!(compressor.decompress(b"").is_err());
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let compressor = ZlibCompressor::best();
        let data = b"This is test data that should compress. ".repeat(100);
        let compressed = compressor.compress(&data).unwrap();

        let truncated = &compressed[..compressed.len() / 2];
        assert!(compressor.decompress(truncated).is_err());
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let compressor = ZlibCompressor::best();
        let mut compressed = compressor.compress(b"song bytes").unwrap();
        compressed.extend_from_slice(b"    ");

        let err = compressor.decompress(&compressed).unwrap_err();
        assert!(err.is_decompression_failed());
    }

    #[test]
    fn test_zlib_compression_levels() {
        let data = b"This is test data that should compress. ".repeat(100);

        let fast = ZlibCompressor::fast().compress(&data).unwrap();
        let best = ZlibCompressor::best().compress(&data).unwrap();

        assert!(best.len() <= fast.len());

        let decompressor = ZlibCompressor::best();
        assert_eq!(decompressor.decompress(&fast).unwrap(), data);
        assert_eq!(decompressor.decompress(&best).unwrap(), data);
    }

    #[test]
    fn test_zlib_large_data() {
        let compressor = ZlibCompressor::best();
        let original = vec![0x42u8; 1024 * 1024];

        let compressed = compressor.compress(&original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, decompressed);
        assert!(compressed.len() < original.len() / 100);
    }

    #[test]
    fn test_debug_impl() {
        let debug_str = format!("{:?}", ZlibCompressor::fast());
        assert!(debug_str.contains("ZlibCompressor"));
        assert!(debug_str.contains("Fast"));
    }
}
