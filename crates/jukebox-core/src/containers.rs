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

//! Lazy container creation
//!
//! Backends refuse puts into missing containers, so every write path goes
//! through [`put_object_lazily`].

use crate::error::{JukeboxError, JukeboxResult};
use crate::naming::{
    all_shard_containers, ContainerVariant, ALBUM_ART_CONTAINER, ALBUM_CONTAINER,
    METADATA_CONTAINER, PLAYLIST_CONTAINER,
};
use jukebox_storage::{ObjectHeaders, StorageBackend, StorageError};
use tracing::{debug, info};

/// Create `container` unless it already exists
pub async fn ensure_container(storage: &dyn StorageBackend, container: &str) -> JukeboxResult<()> {
    if storage.has_container(container).await? {
        return Ok(());
    }

    if storage.create_container(container).await? {
        info!(container = %container, "Created container");
        Ok(())
    } else {
        Err(JukeboxError::Storage(StorageError::backend(format!(
            "unable to create container {}",
            container
        ))))
    }
}

/// Put an object, creating its container first when needed
///
/// Returns `Ok(false)` when the backend declined the write.
pub async fn put_object_lazily(
    storage: &dyn StorageBackend,
    container: &str,
    object: &str,
    data: &[u8],
    headers: Option<&ObjectHeaders>,
) -> JukeboxResult<bool> {
    if storage.put_object(container, object, data, headers).await? {
        return Ok(true);
    }

    debug!(container = %container, object = %object, "Put declined, ensuring container");
    ensure_container(storage, container).await?;
    Ok(storage.put_object(container, object, data, headers).await?)
}

/// Create the metadata, playlist, album and album-art containers plus every
/// shard container for `variant`
///
/// Returns the number of containers that did not exist before.
pub async fn init_storage(
    storage: &dyn StorageBackend,
    variant: ContainerVariant,
) -> JukeboxResult<usize> {
    let existing = storage.list_containers().await?;
    let mut wanted: Vec<String> = [
        METADATA_CONTAINER,
        PLAYLIST_CONTAINER,
        ALBUM_CONTAINER,
        ALBUM_ART_CONTAINER,
    ]
    .iter()
    .map(|name| name.to_string())
    .collect();
    wanted.extend(all_shard_containers(variant));

    let mut created = 0;
    for container in wanted.iter().filter(|c| !existing.contains(c)) {
        ensure_container(storage, container).await?;
        created += 1;
    }

    info!(created, total = wanted.len(), "Storage initialized");
    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jukebox_storage::MemoryBackend;

    #[tokio::test]
    async fn test_put_creates_missing_container() {
        let storage = MemoryBackend::new();
        assert!(put_object_lazily(&storage, "c-artist-songs", "Cream--Badge.mp3", b"x", None)
            .await
            .unwrap());
        assert!(storage.has_container("c-artist-songs").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_content_is_declined() {
        let storage = MemoryBackend::new();
        assert!(!put_object_lazily(&storage, "c-artist-songs", "Cream--Badge.mp3", b"", None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_init_storage_is_idempotent() {
        let storage = MemoryBackend::new();
        let created = init_storage(&storage, ContainerVariant::EncryptedCompressed)
            .await
            .unwrap();
        assert_eq!(created, 4 + 36);
        assert!(storage.has_container("w-artist-songs-ez").await.unwrap());

        let created = init_storage(&storage, ContainerVariant::EncryptedCompressed)
            .await
            .unwrap();
        assert_eq!(created, 0);
    }

    #[tokio::test]
    async fn test_offline_backend_is_unavailable() {
        let storage = MemoryBackend::new();
        storage.set_offline(true);
        let err = ensure_container(&storage, "music-metadata").await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
