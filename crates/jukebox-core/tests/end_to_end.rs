// Copyright (C) 2026  CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
#![allow(clippy::unwrap_used)]
//! End-to-end import and playback scenarios over the in-memory backend

use jukebox_config::{Config, PathsConfig, StorageConfig};
use jukebox_core::{
    command_channel, md5_hex, ContainerVariant, ContentCodec, ImportPipeline, IntegrityVerifier,
    Jukebox, JukeboxError, MetadataCache, NoopObserver, PlaybackPrefetcher, SimulatedPlayer,
    SongFilter,
};
use jukebox_storage::{MemoryBackend, StorageBackend};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CREAM: &str = "Cream--Disraeli-Gears--Tales-Of-Brave-Ulysses.mp3";

fn song_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

fn config(dir: &TempDir) -> Config {
    let mut config = Config {
        storage: StorageConfig::Memory,
        paths: PathsConfig::rooted_at(dir.path()),
        ..Config::default()
    };
    config.jukebox.check_data_integrity = true;
    config.jukebox.pause_poll_ms = 10;
    config
}

async fn stage(dir: &TempDir, name: &str, data: &[u8]) {
    let import = dir.path().join("song-import");
    tokio::fs::create_dir_all(&import).await.unwrap();
    tokio::fs::write(import.join(name), data).await.unwrap();
}

#[tokio::test]
async fn test_compressed_encrypted_import_and_download() {
    let dir = tempfile::tempdir().unwrap();
    let original = song_bytes(100);
    stage(&dir, CREAM, &original).await;

    let mut cfg = config(&dir);
    cfg.jukebox.use_compression = true;
    cfg.jukebox.use_encryption = true;
    cfg.jukebox.encryption_key = Some("sunshine-of-your-love".to_string());
    cfg.jukebox.encryption_iv = Some("strange-brew".to_string());

    let storage = Arc::new(MemoryBackend::new());
    let mut jukebox = Jukebox::open(cfg, Arc::clone(&storage) as Arc<dyn StorageBackend>)
        .await
        .unwrap();
    let report = jukebox.import_songs(&NoopObserver).await.unwrap();
    assert_eq!(report.imported, 1);
    assert!(report.snapshot_uploaded);

    let key = format!("{}.egz", CREAM);
    assert!(storage
        .object_bytes("c-artist-songs-ez", &key)
        .await
        .is_some());
    assert!(storage
        .object_bytes("music-metadata", "jukebox_db.sqlite3")
        .await
        .is_some());

    let song = jukebox.cache().retrieve_song(&key).await.unwrap().unwrap();
    assert!(song.file.compressed);
    assert!(song.file.encrypted);
    assert_eq!(song.file.container_name, "c-artist-songs-ez");
    assert_eq!(song.file.origin_file_size, 100);
    assert_ne!(song.file.stored_file_size, song.file.origin_file_size);
    assert!(song.file.pad_char_count < 16);
    assert_eq!(song.file.md5_hash, md5_hex(&original));
    assert_eq!(song.artist_name, "Cream");
    assert_eq!(song.song_name, "Tales Of Brave Ulysses");
    assert_eq!(song.album_uid.as_deref(), Some("Cream--Disraeli-Gears"));

    let prefetcher = jukebox.prefetcher(vec![song.clone()]);
    prefetcher.prepare_play_dir().await.unwrap();
    let path = prefetcher.download_song(&song).await.unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), original);
}

#[tokio::test]
async fn test_commit_failure_deletes_uploaded_object() {
    let dir = tempfile::tempdir().unwrap();
    stage(&dir, CREAM, &song_bytes(100)).await;

    let storage = Arc::new(MemoryBackend::new());
    let mut cache = MetadataCache::open(dir.path().join("jukebox_db.sqlite3"))
        .await
        .unwrap();
    cache.close().await;

    let pipeline = ImportPipeline::new(
        Arc::clone(&storage) as Arc<dyn StorageBackend>,
        Arc::new(ContentCodec::new()),
        ContainerVariant::Compressed,
    )
    .unwrap();
    let report = pipeline
        .import_songs(&dir.path().join("song-import"), &mut cache, &NoopObserver)
        .await
        .unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.failed, 1);
    assert!(!report.snapshot_uploaded);
    assert!(matches!(
        report.failures[0].1,
        JukeboxError::PartialCommit { .. }
    ));
    assert_eq!(storage.object_count().await, 0);
}

#[tokio::test]
async fn test_reimport_of_identical_file_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    stage(&dir, CREAM, &song_bytes(100)).await;

    let storage = Arc::new(MemoryBackend::new());
    let mut cache = MetadataCache::open(dir.path().join("jukebox_db.sqlite3"))
        .await
        .unwrap();
    let pipeline = ImportPipeline::new(
        Arc::clone(&storage) as Arc<dyn StorageBackend>,
        Arc::new(ContentCodec::with_key("key", "iv").unwrap()),
        ContainerVariant::EncryptedCompressed,
    )
    .unwrap();

    let import_dir = dir.path().join("song-import");
    pipeline
        .import_songs(&import_dir, &mut cache, &NoopObserver)
        .await
        .unwrap();
    let writes = cache.write_count();
    assert_eq!(writes, 1);

    let report = pipeline
        .import_songs(&import_dir, &mut cache, &NoopObserver)
        .await
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(cache.write_count(), writes);
}

#[tokio::test]
async fn test_prefetch_window_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        stage(&dir, &format!("Tool--Lateralus--Track-{:02}.mp3", i), &song_bytes(64 + i)).await;
    }

    let mut cfg = config(&dir);
    cfg.jukebox.file_cache_count = 3;
    cfg.jukebox.use_compression = true;
    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let mut jukebox = Jukebox::open(cfg, storage).await.unwrap();
    jukebox.import_songs(&NoopObserver).await.unwrap();

    let songs = jukebox
        .songs_for_play(&SongFilter::artist("Tool"), false)
        .await
        .unwrap();
    assert_eq!(songs.len(), 10);

    let prefetcher: PlaybackPrefetcher = jukebox.prefetcher(songs);
    prefetcher.prepare_play_dir().await.unwrap();
    let first = prefetcher.songs()[0].clone();
    prefetcher.download_song(&first).await.unwrap();

    for cursor in 0..10 {
        let handles: Vec<_> = (0..3).map(|_| prefetcher.trigger(cursor)).collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(prefetcher.resident_count().await.unwrap() <= 3);

        let current = prefetcher.song_path(&prefetcher.songs()[cursor]);
        let _ = tokio::fs::remove_file(current).await;
    }
}

#[tokio::test]
async fn test_verifier_rejects_tampered_object() {
    let dir = tempfile::tempdir().unwrap();
    stage(&dir, "Cream--Badge.mp3", &song_bytes(100)).await;

    let storage = Arc::new(MemoryBackend::new());
    let mut jukebox = Jukebox::open(config(&dir), Arc::clone(&storage) as Arc<dyn StorageBackend>)
        .await
        .unwrap();
    jukebox.import_songs(&NoopObserver).await.unwrap();

    storage
        .put_object("c-artist-songs", "Cream--Badge.mp3", &song_bytes(99), None)
        .await
        .unwrap();
    let song = jukebox
        .cache()
        .retrieve_song("Cream--Badge.mp3")
        .await
        .unwrap()
        .unwrap();

    let prefetcher = PlaybackPrefetcher::new(
        Arc::clone(&storage) as Arc<dyn StorageBackend>,
        Arc::new(ContentCodec::new()),
        IntegrityVerifier::new(true),
        vec![song.clone()],
        dir.path().join("song-play"),
        1,
    );
    prefetcher.prepare_play_dir().await.unwrap();
    let err = prefetcher.download_song(&song).await.unwrap_err();
    assert!(err.is_integrity_mismatch());
    assert_eq!(prefetcher.resident_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_shuffle_play_with_limit() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["Cream--Badge.mp3", "Cream--White-Room.mp3", "Cream--Crossroads.mp3"] {
        stage(&dir, name, &song_bytes(50)).await;
    }
    let mut cfg = config(&dir);
    cfg.jukebox.number_songs = 5;
    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let mut jukebox = Jukebox::open(cfg, storage).await.unwrap();
    jukebox.import_songs(&NoopObserver).await.unwrap();

    let songs = jukebox
        .songs_for_play(&SongFilter::default(), true)
        .await
        .unwrap();
    let player = SimulatedPlayer::new(Duration::from_millis(2));
    let (_handle, commands) = command_channel();
    let summary = jukebox
        .play(songs, Arc::new(player.clone()), commands)
        .await
        .unwrap();

    assert_eq!(summary.songs_played, 5);
    assert_eq!(summary.songs_skipped, 0);
    let mut entries = tokio::fs::read_dir(dir.path().join("song-play")).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        assert!(!entry.file_name().to_string_lossy().ends_with(".download"));
    }
}
