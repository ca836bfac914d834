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

//! Storage abstraction layer for CloudJukebox
//!
//! This crate provides a container/object storage interface that every vendor
//! driver implements:
//! - In-memory (tests and dry runs)
//! - Local filesystem (a container is a directory)
//! - S3 / MinIO / S3-compatible
//!
//! # Architecture
//!
//! The `StorageBackend` trait models a flat two-level namespace:
//!
//! - **Containers**: named buckets (`c-artist-songs-ez`, `music-metadata`, ...)
//! - **Objects**: binary blobs addressed by key inside a container, optionally
//!   carrying a small map of string headers
//!
//! # Expected Conditions vs. Failures
//!
//! A missing container or object is an expected condition and is reported through
//! the return value (`false`, `None`, `0`), never through `Err`. Errors are reserved
//! for invalid input and for transport failures, which are reported as
//! [`StorageError::Unavailable`] so callers can tell "it isn't there" apart from
//! "the backend could not be reached".
//!
//! # Examples
//!
//! ```no_run
//! use jukebox_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> jukebox_storage::StorageResult<()> {
//!     let storage = MemoryBackend::new();
//!
//!     storage.create_container("c-artist-songs").await?;
//!     storage
//!         .put_object("c-artist-songs", "Cream--Badge.mp3", b"ID3...", None)
//!         .await?;
//!
//!     let keys = storage.list_objects("c-artist-songs").await?;
//!     assert_eq!(keys, Some(vec!["Cream--Badge.mp3".to_string()]));
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod filesystem;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;

pub use error::{StorageError, StorageResult};
pub use filesystem::FsBackend;
pub use memory::MemoryBackend;
pub use s3::{S3Backend, S3Config};

/// String headers stored alongside an object
///
/// Header names are lowercase. Backends that cannot store arbitrary headers
/// persist them in a sidecar (see [`FsBackend`]).
pub type ObjectHeaders = BTreeMap<String, String>;

/// Metadata returned by [`StorageBackend::stat_object`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMetadata {
    /// Size of the stored object in bytes
    pub size: u64,
    /// Headers supplied when the object was written
    pub headers: ObjectHeaders,
}

/// Storage backend trait for container/object operations
///
/// # Safety Requirements
///
/// All implementations must:
/// - Be `Send` to cross thread boundaries
/// - Be `Sync` for safe concurrent access
/// - Implement `Debug` for observability
///
/// # Error Handling
///
/// Operations return `Ok` with a negative value (`false`, `None`, `0`) when the
/// container or object does not exist. `Err` is returned for:
/// - Empty container or object names ([`StorageError::InvalidName`])
/// - Transport or service failures ([`StorageError::Unavailable`])
/// - Local I/O errors
///
/// # Examples
///
/// ```rust,no_run
/// # use jukebox_storage::{MemoryBackend, StorageBackend};
/// #[tokio::main]
/// async fn example() -> jukebox_storage::StorageResult<()> {
///     let backend: Box<dyn StorageBackend> = Box::new(MemoryBackend::new());
///
///     backend.create_container("music-metadata").await?;
///     assert!(backend.has_container("music-metadata").await?);
///
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// List all container names, sorted
    async fn list_containers(&self) -> StorageResult<Vec<String>>;

    /// Create a container
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The container now exists (created or already present)
    /// * `Ok(false)` - The backend refused to create it
    /// * `Err` - Invalid name or transport failure
    async fn create_container(&self, container: &str) -> StorageResult<bool>;

    /// Delete a container and everything in it
    ///
    /// Returns `Ok(false)` when the container does not exist.
    async fn delete_container(&self, container: &str) -> StorageResult<bool>;

    /// List object keys in a container, sorted
    ///
    /// Returns `Ok(None)` when the container does not exist.
    async fn list_objects(&self, container: &str) -> StorageResult<Option<Vec<String>>>;

    /// Retrieve size and headers of an object without transferring its content
    ///
    /// Returns `Ok(None)` when the container or object does not exist.
    async fn stat_object(
        &self,
        container: &str,
        object: &str,
    ) -> StorageResult<Option<ObjectMetadata>>;

    /// Store an object
    ///
    /// Overwrites any existing object with the same key.
    ///
    /// # Arguments
    ///
    /// * `container` - Target container
    /// * `object` - Object key (non-empty)
    /// * `data` - Object content (must not be empty)
    /// * `headers` - Optional string headers stored with the object
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The object was stored
    /// * `Ok(false)` - The container does not exist or the content is empty
    /// * `Err` - Invalid name or transport failure
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use jukebox_storage::{MemoryBackend, ObjectHeaders, StorageBackend};
    /// # #[tokio::main]
    /// # async fn main() -> jukebox_storage::StorageResult<()> {
    /// let storage = MemoryBackend::new();
    /// let mut headers = ObjectHeaders::new();
    /// headers.insert("md5".to_string(), "0f343b0931126a20f133d67c2b018a3b".to_string());
    ///
    /// storage.create_container("t-artist-songs").await?;
    /// let stored = storage
    ///     .put_object("t-artist-songs", "Tool--Sober.mp3", b"data", Some(&headers))
    ///     .await?;
    /// assert!(stored);
    /// # Ok(())
    /// # }
    /// ```
    async fn put_object(
        &self,
        container: &str,
        object: &str,
        data: &[u8],
        headers: Option<&ObjectHeaders>,
    ) -> StorageResult<bool>;

    /// Delete an object
    ///
    /// Returns `Ok(false)` when the container or object does not exist.
    async fn delete_object(&self, container: &str, object: &str) -> StorageResult<bool>;

    /// Download an object into a local file
    ///
    /// The destination file is created or truncated. Nothing is written when the
    /// object does not exist.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - Number of bytes written to `dest` (`0` when the object is missing)
    /// * `Err` - Invalid name, local I/O error or transport failure
    async fn get_object(&self, container: &str, object: &str, dest: &Path) -> StorageResult<u64>;

    /// Check whether a container exists
    async fn has_container(&self, container: &str) -> StorageResult<bool> {
        Ok(self
            .list_containers()
            .await?
            .iter()
            .any(|name| name == container))
    }
}

/// Reject empty container or object names
pub(crate) fn validate_name(kind: &str, name: &str) -> StorageResult<()> {
    if name.is_empty() {
        Err(StorageError::invalid_name(format!(
            "{} name cannot be empty",
            kind
        )))
    } else {
        Ok(())
    }
}
