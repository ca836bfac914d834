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

//! Checksum verification of downloaded songs
//!
//! The stored checksum is computed over the original bytes, so a successful
//! check covers transfer, decryption and decompression in one step.

use crate::error::{JukeboxError, JukeboxResult};
use crate::record::SongRecord;
use std::path::Path;
use tracing::{debug, warn};

/// Hex md5 of a byte buffer
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(md5::compute(data).0)
}

/// Hex md5 of a file's contents
pub async fn md5_file(path: &Path) -> JukeboxResult<String> {
    let data = tokio::fs::read(path).await?;
    Ok(md5_hex(&data))
}

/// Size and checksum checks, active only when data integrity checking is on
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityVerifier {
    enabled: bool,
}

impl IntegrityVerifier {
    /// Create a verifier; a disabled one accepts everything
    pub fn new(enabled: bool) -> Self {
        IntegrityVerifier { enabled }
    }

    /// Whether downloads are checked
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Compare the downloaded byte count with the stored size
    pub fn check_stored_size(&self, song: &SongRecord, downloaded: u64) -> JukeboxResult<()> {
        if !self.enabled || downloaded == song.file.stored_file_size {
            return Ok(());
        }
        warn!(
            uid = %song.uid(),
            expected = song.file.stored_file_size,
            actual = downloaded,
            "Downloaded size mismatch"
        );
        Err(JukeboxError::integrity_mismatch(
            song.uid(),
            format!(
                "downloaded {} bytes, expected {}",
                downloaded, song.file.stored_file_size
            ),
        ))
    }

    /// Compare decoded bytes against the stored md5
    pub fn check_content(&self, song: &SongRecord, decoded: &[u8]) -> JukeboxResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let actual = md5_hex(decoded);
        if actual.eq_ignore_ascii_case(&song.file.md5_hash) {
            debug!(uid = %song.uid(), "Checksum verified");
            return Ok(());
        }

        warn!(
            uid = %song.uid(),
            expected = %song.file.md5_hash,
            actual = %actual,
            "Checksum mismatch"
        );
        Err(JukeboxError::integrity_mismatch(
            song.uid(),
            format!("md5 {} does not match stored {}", actual, song.file.md5_hash),
        ))
    }
}
