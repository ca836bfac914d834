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

//! Local filesystem storage backend
//!
//! Implements the `StorageBackend` trait on a plain directory tree:
//! - Each container is a directory directly under the root
//! - Each object is a file inside its container directory
//! - Object headers live in a JSON sidecar named `<object>.meta`
//! - Writes are atomic (temp file + rename)
//!
//! # Directory Structure
//!
//! ```text
//! root/
//!   c-artist-songs-ez/
//!     Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses.mp3.egz
//!     Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses.mp3.egz.meta
//!   music-metadata/
//!     jukebox_db.sqlite3
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use jukebox_storage::{FsBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> jukebox_storage::StorageResult<()> {
//!     let storage = FsBackend::new("/var/lib/jukebox/storage").await?;
//!
//!     storage.create_container("music-metadata").await?;
//!     let containers = storage.list_containers().await?;
//!     println!("Found {} containers", containers.len());
//!
//!     Ok(())
//! }
//! ```

use crate::{validate_name, ObjectHeaders, ObjectMetadata, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Suffix of the JSON sidecar holding object headers
const META_SUFFIX: &str = ".meta";

/// Suffix of in-flight writes
const TEMP_SUFFIX: &str = ".tmp";

/// Local filesystem storage backend
///
/// # Thread Safety
///
/// This implementation is `Send + Sync` and can be safely shared across threads
/// and async tasks. The filesystem provides natural synchronization for concurrent access.
#[derive(Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Create a new filesystem backend at the given root path
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Returns
    ///
    /// * `Ok(FsBackend)` - Successfully created backend
    /// * `Err` - If the root path exists but is not a directory
    pub async fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root).await?;
        } else if !root.is_dir() {
            return Err(StorageError::backend(format!(
                "path exists but is not a directory: {}",
                root.display()
            )));
        }

        Ok(FsBackend { root })
    }

    /// Get the root path for this backend
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_path(&self, container: &str) -> StorageResult<PathBuf> {
        validate_name("container", container)?;
        reject_path_separators("container", container)?;
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, object: &str) -> StorageResult<PathBuf> {
        validate_name("object", object)?;
        reject_path_separators("object", object)?;
        Ok(self.container_path(container)?.join(object))
    }

    async fn read_headers(path: &Path) -> StorageResult<ObjectHeaders> {
        let meta_path = with_suffix(path, META_SUFFIX);
        match fs::read(&meta_path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(headers) => Ok(headers),
                Err(e) => {
                    warn!(path = %meta_path.display(), error = %e, "Ignoring unreadable header sidecar");
                    Ok(ObjectHeaders::new())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ObjectHeaders::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
        let temp_path = with_suffix(path, TEMP_SUFFIX);

        // Remove any stale temp file
        let _ = fs::remove_file(&temp_path).await;

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, path).await?;
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn reject_path_separators(kind: &str, name: &str) -> StorageResult<()> {
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        Err(StorageError::invalid_name(format!(
            "{} name must be a single path component: {}",
            kind, name
        )))
    } else {
        Ok(())
    }
}

fn is_internal_file(name: &str) -> bool {
    name.ends_with(META_SUFFIX) || name.ends_with(TEMP_SUFFIX)
}

impl fmt::Debug for FsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsBackend").field("root", &self.root).finish()
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn list_containers(&self) -> StorageResult<Vec<String>> {
        let mut containers = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    containers.push(name.to_string());
                }
            }
        }

        containers.sort();
        Ok(containers)
    }

    async fn create_container(&self, container: &str) -> StorageResult<bool> {
        let path = self.container_path(container)?;
        fs::create_dir_all(&path).await?;
        debug!(container = %container, "Created container directory");
        Ok(true)
    }

    async fn delete_container(&self, container: &str) -> StorageResult<bool> {
        let path = self.container_path(container)?;
        match fs::remove_dir_all(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_objects(&self, container: &str) -> StorageResult<Option<Vec<String>>> {
        let path = self.container_path(container)?;
        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !is_internal_file(name) {
                    objects.push(name.to_string());
                }
            }
        }

        objects.sort();
        Ok(Some(objects))
    }

    async fn stat_object(
        &self,
        container: &str,
        object: &str,
    ) -> StorageResult<Option<ObjectMetadata>> {
        let path = self.object_path(container, object)?;
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(ObjectMetadata {
            size: metadata.len(),
            headers: Self::read_headers(&path).await?,
        }))
    }

    async fn put_object(
        &self,
        container: &str,
        object: &str,
        data: &[u8],
        headers: Option<&ObjectHeaders>,
    ) -> StorageResult<bool> {
        let path = self.object_path(container, object)?;

        if data.is_empty() {
            debug!(container = %container, object = %object, "Refusing to store empty object");
            return Ok(false);
        }
        if !fs::try_exists(self.container_path(container)?).await? {
            debug!(container = %container, "Container does not exist");
            return Ok(false);
        }

        Self::write_atomic(&path, data).await?;

        let meta_path = with_suffix(&path, META_SUFFIX);
        match headers {
            Some(headers) if !headers.is_empty() => {
                let encoded = serde_json::to_vec_pretty(headers)
                    .map_err(|e| StorageError::backend(format!("cannot encode headers: {}", e)))?;
                Self::write_atomic(&meta_path, &encoded).await?;
            }
            _ => {
                // Drop headers left over from a previous version of the object
                let _ = fs::remove_file(&meta_path).await;
            }
        }

        Ok(true)
    }

    async fn delete_object(&self, container: &str, object: &str) -> StorageResult<bool> {
        let path = self.object_path(container, object)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                let _ = fs::remove_file(with_suffix(&path, META_SUFFIX)).await;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_object(&self, container: &str, object: &str, dest: &Path) -> StorageResult<u64> {
        let path = self.object_path(container, object)?;

        if !fs::try_exists(&path).await? {
            return Ok(0);
        }

        Ok(fs::copy(&path, dest).await?)
    }
}
