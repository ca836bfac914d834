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

//! Compression for CloudJukebox song objects
//!
//! Songs stored in `-z` and `-ez` containers are zlib streams. The stream is
//! self-framing, so no length or algorithm prefix is added.
//!
//! # Quick Start
//!
//! ```rust
//! use jukebox_compression::{Compressor, ZlibCompressor};
//!
//! fn main() -> jukebox_compression::CompressionResult<()> {
//!     let compressor = ZlibCompressor::best();
//!
//!     let original = b"ID3 tag followed by frames";
//!     let compressed = compressor.compress(original)?;
//!     let decompressed = compressor.decompress(&compressed)?;
//!
//!     assert_eq!(original, &decompressed[..]);
//!     Ok(())
//! }
//! ```
//!
//! Unlike a best-effort decoder, [`ZlibCompressor::decompress`] never passes
//! unrecognized input through: anything that is not a complete zlib stream is a
//! [`CompressionError`].

pub mod error;
pub mod zlib;

use std::fmt::Debug;

pub use error::{CompressionError, CompressionResult};
pub use zlib::ZlibCompressor;

/// Compression level configuration
///
/// Balances compression speed vs compression ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Fast compression, larger output (level 1)
    Fast,
    /// Default balance (level 6)
    Default,
    /// Best compression, slower (level 9); what the archive format uses
    Best,
}

impl CompressionLevel {
    /// Convert to zlib compression level (0-9)
    pub fn to_zlib_level(self) -> u32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 6,
            CompressionLevel::Best => 9,
        }
    }
}

/// Compressor trait for pluggable compression implementations
pub trait Compressor: Send + Sync + Debug {
    /// Compress data
    ///
    /// # Errors
    ///
    /// Returns `CompressionError` if compression fails
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>>;

    /// Decompress data
    ///
    /// # Errors
    ///
    /// Returns `CompressionError` if the input is not a valid stream
    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_level_conversions() {
        assert_eq!(CompressionLevel::Fast.to_zlib_level(), 1);
        assert_eq!(CompressionLevel::Default.to_zlib_level(), 6);
        assert_eq!(CompressionLevel::Best.to_zlib_level(), 9);
    }

    #[test]
    fn trait_is_object_safe() {
        fn _check_object_safe(_: &dyn Compressor) {}
    }
}
