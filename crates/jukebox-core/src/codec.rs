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

//! Content transform pipeline
//!
//! Upload order is compress, then encrypt. Download reverses it: decrypt,
//! strip the recorded pad count, then decompress. The pad count is stored out
//! of band in the song record.

use crate::error::{JukeboxError, JukeboxResult};
use jukebox_compression::{Compressor, ZlibCompressor};
use jukebox_config::JukeboxOptions;
use jukebox_security::LegacyCipher;
use tracing::debug;

/// Transformed bytes and the padding added for block alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Bytes to store
    pub data: Vec<u8>,
    /// Spaces appended before encryption
    pub pad_char_count: usize,
}

/// Symmetric compress/encrypt codec
#[derive(Debug)]
pub struct ContentCodec {
    compressor: ZlibCompressor,
    cipher: Option<LegacyCipher>,
}

impl ContentCodec {
    /// Codec without a key; it can only handle unencrypted content
    pub fn new() -> Self {
        ContentCodec {
            compressor: ZlibCompressor::best(),
            cipher: None,
        }
    }

    /// Codec with an encryption key and IV
    pub fn with_key(key: &str, iv: &str) -> JukeboxResult<Self> {
        Ok(ContentCodec {
            compressor: ZlibCompressor::best(),
            cipher: Some(LegacyCipher::new(key, iv)?),
        })
    }

    /// Build from jukebox options; a missing or empty key leaves encryption off
    pub fn from_options(options: &JukeboxOptions) -> JukeboxResult<Self> {
        match options.encryption_key.as_deref() {
            Some(key) if !key.is_empty() => {
                Self::with_key(key, options.encryption_iv.as_deref().unwrap_or(""))
            }
            _ => Ok(Self::new()),
        }
    }

    /// Whether encrypted content can be decoded
    pub fn can_decrypt(&self) -> bool {
        self.cipher.is_some()
    }

    fn cipher(&self) -> JukeboxResult<&LegacyCipher> {
        self.cipher
            .as_ref()
            .ok_or_else(|| JukeboxError::transform("no encryption key configured"))
    }

    /// Apply the requested transforms
    pub fn encode(&self, data: &[u8], compress: bool, encrypt: bool) -> JukeboxResult<Encoded> {
        let mut bytes = if compress {
            self.compressor.compress(data)?
        } else {
            data.to_vec()
        };

        let mut pad_char_count = 0;
        if encrypt {
            let encrypted = self.cipher()?.encrypt(&bytes)?;
            bytes = encrypted.ciphertext;
            pad_char_count = encrypted.pad_char_count;
        }

        debug!(
            original = data.len(),
            stored = bytes.len(),
            compress,
            encrypt,
            pad_char_count,
            "Encoded content"
        );
        Ok(Encoded {
            data: bytes,
            pad_char_count,
        })
    }

    /// Reverse [`encode`](Self::encode)
    pub fn decode(
        &self,
        data: &[u8],
        compressed: bool,
        encrypted: bool,
        pad_char_count: usize,
    ) -> JukeboxResult<Vec<u8>> {
        let mut bytes = if encrypted {
            self.cipher()?.decrypt(data, pad_char_count)?
        } else {
            data.to_vec()
        };

        if compressed {
            bytes = self.compressor.decompress(&bytes)?;
        }
        Ok(bytes)
    }
}

impl Default for ContentCodec {
    fn default() -> Self {
        Self::new()
    }
}
