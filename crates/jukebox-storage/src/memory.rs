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

//! In-memory storage backend
//!
//! Provides a thread-safe, in-memory implementation of [`StorageBackend`](crate::StorageBackend)
//! using `Arc<RwLock<BTreeMap>>` for concurrent access. Used by tests and by the
//! `memory` backend setting for dry runs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jukebox_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> jukebox_storage::StorageResult<()> {
//!     let storage = MemoryBackend::new();
//!
//!     storage.create_container("music-metadata").await?;
//!     storage
//!         .put_object("music-metadata", "jukebox_db.sqlite3", b"SQLite", None)
//!         .await?;
//!
//!     let meta = storage.stat_object("music-metadata", "jukebox_db.sqlite3").await?;
//!     assert_eq!(meta.map(|m| m.size), Some(6));
//!
//!     Ok(())
//! }
//! ```

use crate::{validate_name, ObjectHeaders, ObjectMetadata, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    headers: ObjectHeaders,
}

type Containers = BTreeMap<String, BTreeMap<String, StoredObject>>;

/// In-memory storage backend
///
/// Clones share the same underlying store, so a test can keep a handle while the
/// code under test owns another.
///
/// # Thread Safety
///
/// This implementation is `Send + Sync` and can be safely shared across threads
/// and async tasks.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    containers: Arc<RwLock<Containers>>,
    offline: Arc<AtomicBool>,
}

impl MemoryBackend {
    /// Create a new empty memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a transport outage
    ///
    /// While offline every operation fails with [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total number of objects across all containers
    pub async fn object_count(&self) -> usize {
        self.containers.read().await.values().map(BTreeMap::len).sum()
    }

    /// Raw content of an object, if present
    pub async fn object_bytes(&self, container: &str, object: &str) -> Option<Vec<u8>> {
        self.containers
            .read()
            .await
            .get(container)
            .and_then(|objects| objects.get(object))
            .map(|stored| stored.data.clone())
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("memory backend is offline"))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn list_containers(&self) -> StorageResult<Vec<String>> {
        self.check_online()?;
        Ok(self.containers.read().await.keys().cloned().collect())
    }

    async fn create_container(&self, container: &str) -> StorageResult<bool> {
        self.check_online()?;
        validate_name("container", container)?;

        self.containers
            .write()
            .await
            .entry(container.to_string())
            .or_default();
        Ok(true)
    }

    async fn delete_container(&self, container: &str) -> StorageResult<bool> {
        self.check_online()?;
        validate_name("container", container)?;

        Ok(self.containers.write().await.remove(container).is_some())
    }

    async fn list_objects(&self, container: &str) -> StorageResult<Option<Vec<String>>> {
        self.check_online()?;
        validate_name("container", container)?;

        Ok(self
            .containers
            .read()
            .await
            .get(container)
            .map(|objects| objects.keys().cloned().collect()))
    }

    async fn stat_object(
        &self,
        container: &str,
        object: &str,
    ) -> StorageResult<Option<ObjectMetadata>> {
        self.check_online()?;
        validate_name("container", container)?;
        validate_name("object", object)?;

        Ok(self
            .containers
            .read()
            .await
            .get(container)
            .and_then(|objects| objects.get(object))
            .map(|stored| ObjectMetadata {
                size: stored.data.len() as u64,
                headers: stored.headers.clone(),
            }))
    }

    async fn put_object(
        &self,
        container: &str,
        object: &str,
        data: &[u8],
        headers: Option<&ObjectHeaders>,
    ) -> StorageResult<bool> {
        self.check_online()?;
        validate_name("container", container)?;
        validate_name("object", object)?;

        if data.is_empty() {
            return Ok(false);
        }

        let mut containers = self.containers.write().await;
        let Some(objects) = containers.get_mut(container) else {
            return Ok(false);
        };

        objects.insert(
            object.to_string(),
            StoredObject {
                data: data.to_vec(),
                headers: headers.cloned().unwrap_or_default(),
            },
        );
        Ok(true)
    }

    async fn delete_object(&self, container: &str, object: &str) -> StorageResult<bool> {
        self.check_online()?;
        validate_name("container", container)?;
        validate_name("object", object)?;

        Ok(self
            .containers
            .write()
            .await
            .get_mut(container)
            .and_then(|objects| objects.remove(object))
            .is_some())
    }

    async fn get_object(&self, container: &str, object: &str, dest: &Path) -> StorageResult<u64> {
        self.check_online()?;
        validate_name("container", container)?;
        validate_name("object", object)?;

        let Some(data) = self.object_bytes(container, object).await else {
            return Ok(0);
        };

        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }
}
