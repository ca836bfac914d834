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

//! Storage error types and utilities

use std::io;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
///
/// Missing containers and objects are not errors; see [`crate::StorageBackend`].
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend could not be reached or the service rejected the request
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// Permission denied for the requested operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid container or object name
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Storage backend misconfigured
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Transparent error delegation for wrapped error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorageError {
    /// Create an Unavailable error with context
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        StorageError::Unavailable(msg.into())
    }

    /// Create a PermissionDenied error with context
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        StorageError::PermissionDenied(msg.into())
    }

    /// Create an InvalidName error with context
    pub fn invalid_name<S: Into<String>>(msg: S) -> Self {
        StorageError::InvalidName(msg.into())
    }

    /// Create a Backend error with context
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        StorageError::Backend(msg.into())
    }

    /// Check if this is an Unavailable error
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }

    /// Check if this is a PermissionDenied error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StorageError::PermissionDenied(_))
    }

    /// Check if this is an InvalidName error
    pub fn is_invalid_name(&self) -> bool {
        matches!(self, StorageError::InvalidName(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_error() {
        let err = StorageError::unavailable("connection refused");
        assert!(err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "storage backend unavailable: connection refused"
        );
    }

    #[test]
    fn test_permission_denied_error() {
        let err = StorageError::permission_denied("bucket locked");
        assert!(err.is_permission_denied());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_invalid_name_error() {
        let err = StorageError::invalid_name("empty key");
        assert!(err.is_invalid_name());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::other("read failed");
        let storage_err = StorageError::from(io_err);
        assert!(matches!(storage_err, StorageError::Io(_)));
    }
}
