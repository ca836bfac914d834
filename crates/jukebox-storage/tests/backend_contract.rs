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

//! Behavioral contract shared by every local backend
//!
//! The same scenarios run against `MemoryBackend` and `FsBackend` so both report
//! missing containers and objects the same way.

#![allow(clippy::unwrap_used)]

use jukebox_storage::{FsBackend, MemoryBackend, ObjectHeaders, StorageBackend};
use tempfile::TempDir;

async fn backends() -> (TempDir, Vec<Box<dyn StorageBackend>>) {
    let temp_dir = TempDir::new().unwrap();
    let fs = FsBackend::new(temp_dir.path().join("fs")).await.unwrap();
    (
        temp_dir,
        vec![Box::new(MemoryBackend::new()), Box::new(fs)],
    )
}

#[tokio::test]
async fn missing_container_is_reported_by_value() {
    let (_temp, backends) = backends().await;

    for backend in backends {
        assert_eq!(backend.list_objects("nope").await.unwrap(), None, "{:?}", backend);
        assert!(!backend.has_container("nope").await.unwrap());
        assert!(!backend
            .put_object("nope", "k", b"data", None)
            .await
            .unwrap());
        assert!(!backend.delete_container("nope").await.unwrap());
    }
}

#[tokio::test]
async fn object_lifecycle() {
    let (temp, backends) = backends().await;

    for (i, backend) in backends.into_iter().enumerate() {
        let container = "t-artist-songs-z";
        assert!(backend.create_container(container).await.unwrap());

        let mut headers = ObjectHeaders::new();
        headers.insert("origin_file_size".to_string(), "5".to_string());
        assert!(backend
            .put_object(container, "Tool--Sober.mp3.gz", b"abcde", Some(&headers))
            .await
            .unwrap());
        assert!(backend
            .put_object(container, "Tool--Aenema.mp3.gz", b"xyz", None)
            .await
            .unwrap());

        assert_eq!(
            backend.list_objects(container).await.unwrap().unwrap(),
            vec!["Tool--Aenema.mp3.gz", "Tool--Sober.mp3.gz"]
        );

        let meta = backend
            .stat_object(container, "Tool--Sober.mp3.gz")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.headers, headers);

        let dest = temp.path().join(format!("download-{}", i));
        assert_eq!(
            backend
                .get_object(container, "Tool--Sober.mp3.gz", &dest)
                .await
                .unwrap(),
            5
        );
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcde");

        assert!(backend
            .delete_object(container, "Tool--Sober.mp3.gz")
            .await
            .unwrap());
        assert!(backend
            .stat_object(container, "Tool--Sober.mp3.gz")
            .await
            .unwrap()
            .is_none());

        assert!(backend.delete_container(container).await.unwrap());
        assert!(backend.list_containers().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn empty_content_is_not_stored() {
    let (_temp, backends) = backends().await;

    for backend in backends {
        backend.create_container("c-artist-songs").await.unwrap();
        assert!(!backend
            .put_object("c-artist-songs", "empty.mp3", b"", None)
            .await
            .unwrap());
        assert_eq!(
            backend.list_objects("c-artist-songs").await.unwrap(),
            Some(vec![])
        );
    }
}
