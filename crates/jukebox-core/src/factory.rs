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

//! Storage backend selection

use crate::error::{JukeboxError, JukeboxResult};
use jukebox_config::{FileSystemStorage, S3Storage, StorageConfig};
use jukebox_storage::{FsBackend, MemoryBackend, S3Backend, S3Config, StorageBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Backend names accepted by [`create_backend`]
pub const BACKEND_NAMES: &[&str] = &["memory", "fs", "s3"];

/// Build the configured backend
///
/// A relative filesystem root resolves against `jukebox_dir`.
pub async fn create_backend(
    config: &StorageConfig,
    jukebox_dir: &Path,
) -> JukeboxResult<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config {
        StorageConfig::Memory => Arc::new(MemoryBackend::new()),
        StorageConfig::FileSystem(fs) => {
            let root = if fs.root_dir.is_absolute() {
                fs.root_dir.clone()
            } else {
                jukebox_dir.join(&fs.root_dir)
            };
            Arc::new(FsBackend::new(root).await?)
        }
        StorageConfig::S3(s3) => Arc::new(S3Backend::new(s3_config(s3)?)?),
    };

    info!(backend = config.backend_name(), "Storage backend ready");
    Ok(backend)
}

fn s3_config(s3: &S3Storage) -> JukeboxResult<S3Config> {
    let access_key = s3
        .access_key
        .clone()
        .ok_or_else(|| JukeboxError::invalid_input("s3 access key is not configured"))?;
    let secret_key = s3
        .secret_key
        .clone()
        .ok_or_else(|| JukeboxError::invalid_input("s3 secret key is not configured"))?;

    Ok(S3Config {
        endpoint: s3.endpoint.clone(),
        region: s3.region.clone(),
        access_key,
        secret_key,
        container_prefix: s3.container_prefix.clone(),
        path_style: s3.path_style,
        ..S3Config::default()
    })
}

/// Default storage configuration for a backend name
pub fn storage_for_name(name: &str) -> JukeboxResult<StorageConfig> {
    match name {
        "memory" => Ok(StorageConfig::Memory),
        "fs" => Ok(StorageConfig::FileSystem(FileSystemStorage::default())),
        "s3" => Ok(StorageConfig::S3(S3Storage::default())),
        other => Err(JukeboxError::invalid_input(format!(
            "unsupported storage system '{}' (expected one of: {})",
            other,
            BACKEND_NAMES.join(", ")
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_for_name() {
        assert_eq!(storage_for_name("memory").unwrap(), StorageConfig::Memory);
        assert_eq!(storage_for_name("fs").unwrap().backend_name(), "fs");
        assert_eq!(storage_for_name("s3").unwrap().backend_name(), "s3");
        assert!(storage_for_name("swift").is_err());
    }

    #[tokio::test]
    async fn test_fs_root_resolves_against_jukebox_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::FileSystem(FileSystemStorage::default());
        let backend = create_backend(&config, dir.path()).await.unwrap();
        backend.create_container("music-metadata").await.unwrap();
        assert!(dir.path().join("jukebox-storage").join("music-metadata").is_dir());
    }

    #[tokio::test]
    async fn test_s3_requires_credentials() {
        let config = StorageConfig::S3(S3Storage::default());
        let err = create_backend(&config, Path::new(".")).await.unwrap_err();
        assert!(matches!(err, JukeboxError::InvalidInput(_)));
    }
}
