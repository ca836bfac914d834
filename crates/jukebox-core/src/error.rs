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

//! Error types for the jukebox engine

use jukebox_compression::CompressionError;
use jukebox_config::ConfigError;
use jukebox_security::EncryptionError;
use jukebox_storage::StorageError;
use thiserror::Error;

/// Result type alias for jukebox operations
pub type JukeboxResult<T> = Result<T, JukeboxError>;

/// Errors raised by the import, cache, prefetch and playback components
#[derive(Error, Debug)]
pub enum JukeboxError {
    /// Storage backend failure (including `Unavailable`)
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Compression or encryption could not be applied or reversed
    #[error("transform failed: {0}")]
    Transform(String),

    /// Downloaded content does not match its stored checksum or size
    #[error("integrity check failed for {uid}: {reason}")]
    IntegrityMismatch { uid: String, reason: String },

    /// Object was uploaded but its metadata could not be committed
    #[error("metadata commit failed for {uid} after upload: {reason}")]
    PartialCommit { uid: String, reason: String },

    /// SQLite failure in the metadata cache
    #[error("metadata cache error: {0}")]
    Cache(#[from] sqlx::Error),

    /// The metadata cache has no open connection
    #[error("metadata cache is closed")]
    CacheClosed,

    /// A song, playlist, album or object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller supplied an unusable value
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Local file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Playlist or album descriptor is not valid JSON
    #[error("invalid descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
}

impl JukeboxError {
    /// Create a transform error
    pub fn transform<S: Into<String>>(msg: S) -> Self {
        JukeboxError::Transform(msg.into())
    }

    /// Create an integrity mismatch error
    pub fn integrity_mismatch<U: Into<String>, R: Into<String>>(uid: U, reason: R) -> Self {
        JukeboxError::IntegrityMismatch {
            uid: uid.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        JukeboxError::NotFound(what.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        JukeboxError::InvalidInput(msg.into())
    }

    /// Check if the storage backend could not be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(self, JukeboxError::Storage(e) if e.is_unavailable())
    }

    /// Check if this is a transform error
    pub fn is_transform(&self) -> bool {
        matches!(self, JukeboxError::Transform(_))
    }

    /// Check if this is an integrity mismatch
    pub fn is_integrity_mismatch(&self) -> bool {
        matches!(self, JukeboxError::IntegrityMismatch { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, JukeboxError::NotFound(_))
    }
}

impl From<CompressionError> for JukeboxError {
    fn from(err: CompressionError) -> Self {
        JukeboxError::Transform(err.to_string())
    }
}

impl From<EncryptionError> for JukeboxError {
    fn from(err: EncryptionError) -> Self {
        JukeboxError::Transform(err.to_string())
    }
}
