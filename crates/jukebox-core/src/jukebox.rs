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

//! High-level jukebox operations
//!
//! [`Jukebox`] ties the configured backend, codec and metadata cache together
//! and exposes what the command line needs: imports, listings, deletes and
//! play sessions.

use crate::cache::{MetadataCache, SongFilter};
use crate::codec::ContentCodec;
use crate::containers::init_storage;
use crate::descriptors::{
    album_object_name, fetch_descriptor, AlbumDescriptor, PlaylistDescriptor, Resolved,
};
use crate::error::{JukeboxError, JukeboxResult};
use crate::import::{ImportObserver, ImportPipeline, ImportReport};
use crate::integrity::IntegrityVerifier;
use crate::naming::{album_uid, encode, ContainerVariant, ALBUM_CONTAINER, PLAYLIST_CONTAINER};
use crate::playback::{
    default_player_command, AudioPlayer, CommandPlayer, PlaybackLoop, PlaybackOptions,
    PlaybackSummary, PlayerCommand, SimulatedPlayer,
};
use crate::prefetch::PlaybackPrefetcher;
use crate::record::{AlbumRecord, GenreRecord, PlaylistRecord, SongRecord};
use jukebox_config::Config;
use jukebox_storage::StorageBackend;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// An opened jukebox: configuration, backend, codec and metadata cache
#[derive(Debug)]
pub struct Jukebox {
    config: Config,
    storage: Arc<dyn StorageBackend>,
    codec: Arc<ContentCodec>,
    cache: MetadataCache,
}

impl Jukebox {
    /// Open the metadata cache, syncing it from the remote snapshot unless
    /// `suppress_metadata_download` is set
    pub async fn open(config: Config, storage: Arc<dyn StorageBackend>) -> JukeboxResult<Self> {
        let codec = Arc::new(ContentCodec::from_options(&config.jukebox)?);
        let cache = MetadataCache::open_synced(
            config.paths.metadata_db_path(),
            storage.as_ref(),
            config.jukebox.suppress_metadata_download,
        )
        .await?;

        Ok(Jukebox {
            config,
            storage,
            codec,
            cache,
        })
    }

    /// Loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Object storage backend
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Local metadata cache
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Transform variant used for new imports
    pub fn variant(&self) -> ContainerVariant {
        ContainerVariant::from_flags(
            self.config.jukebox.use_encryption,
            self.config.jukebox.use_compression,
        )
    }

    fn pipeline(&self) -> JukeboxResult<ImportPipeline> {
        ImportPipeline::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.codec),
            self.variant(),
        )
    }

    /// Import staged song files
    pub async fn import_songs(&mut self, observer: &dyn ImportObserver) -> JukeboxResult<ImportReport> {
        let dir = self.config.paths.song_import_path();
        self.pipeline()?
            .import_songs(&dir, &mut self.cache, observer)
            .await
    }

    /// Import staged playlist descriptors
    pub async fn import_playlists(
        &mut self,
        observer: &dyn ImportObserver,
    ) -> JukeboxResult<ImportReport> {
        let dir = self.config.paths.playlist_import_path();
        self.pipeline()?
            .import_playlists(&dir, &mut self.cache, observer)
            .await
    }

    /// Import staged album art
    pub async fn import_album_art(&self, observer: &dyn ImportObserver) -> JukeboxResult<ImportReport> {
        let dir = self.config.paths.album_art_import_path();
        self.pipeline()?.import_album_art(&dir, observer).await
    }

    /// Songs matching `filter` that this jukebox can decode
    pub async fn songs_for_play(
        &self,
        filter: &SongFilter,
        shuffle: bool,
    ) -> JukeboxResult<Vec<SongRecord>> {
        let mut songs = self.cache.retrieve_songs(filter).await?;
        let total = songs.len();
        if !self.codec.can_decrypt() {
            songs.retain(|song| !song.file.encrypted);
            if songs.len() < total {
                warn!(
                    excluded = total - songs.len(),
                    "Encrypted songs excluded, no encryption key configured"
                );
            }
        }
        if shuffle {
            songs.shuffle(&mut rand::thread_rng());
        }
        Ok(songs)
    }

    /// Prefetcher over `songs` using the configured play directory
    pub fn prefetcher(&self, songs: Vec<SongRecord>) -> PlaybackPrefetcher {
        PlaybackPrefetcher::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.codec),
            IntegrityVerifier::new(self.config.jukebox.check_data_integrity),
            songs,
            self.config.paths.song_play_path(),
            self.config.jukebox.file_cache_count,
        )
    }

    /// Configured player, the platform default, or a simulated one
    pub fn player(&self) -> JukeboxResult<Arc<dyn AudioPlayer>> {
        let secs = self.config.jukebox.song_play_length_seconds;
        let fallback = Duration::from_secs(secs);
        let argv = self
            .config
            .jukebox
            .audio_player
            .clone()
            .or_else(|| default_player_command(secs));

        Ok(match argv {
            Some(argv) => Arc::new(CommandPlayer::new(argv, fallback)?),
            None => Arc::new(SimulatedPlayer::new(fallback)),
        })
    }

    /// Run a play session over `songs`
    pub async fn play(
        &self,
        songs: Vec<SongRecord>,
        player: Arc<dyn AudioPlayer>,
        commands: mpsc::UnboundedReceiver<PlayerCommand>,
    ) -> JukeboxResult<PlaybackSummary> {
        if songs.is_empty() {
            return Err(JukeboxError::not_found("no songs match"));
        }
        info!(songs = songs.len(), "Starting playback");

        let options = PlaybackOptions {
            number_songs: self.config.jukebox.number_songs,
            pause_poll: Duration::from_millis(self.config.jukebox.pause_poll_ms),
        };
        PlaybackLoop::new(self.prefetcher(songs), player, commands, options)
            .run()
            .await
    }

    /// Resolve a playlist by name
    pub async fn playlist_songs(&self, name: &str) -> JukeboxResult<(PlaylistDescriptor, Resolved)> {
        let record = self
            .cache
            .playlist_by_name(name)
            .await?
            .ok_or_else(|| JukeboxError::not_found(format!("playlist '{}'", name)))?;

        let descriptor: PlaylistDescriptor = fetch_descriptor(
            self.storage.as_ref(),
            PLAYLIST_CONTAINER,
            &record.uid,
            &self.config.paths.jukebox_dir,
        )
        .await?
        .ok_or_else(|| JukeboxError::not_found(format!("playlist object {}", record.uid)))?;

        let resolved = descriptor.resolve(&self.cache).await?;
        Ok((descriptor, resolved))
    }

    /// Resolve an album from its descriptor, or from the key prefix when it
    /// has none
    pub async fn album_songs(&self, artist: &str, album: &str) -> JukeboxResult<Resolved> {
        let descriptor: Option<AlbumDescriptor> = fetch_descriptor(
            self.storage.as_ref(),
            ALBUM_CONTAINER,
            &album_object_name(artist, album),
            &self.config.paths.jukebox_dir,
        )
        .await?;

        match descriptor {
            Some(descriptor) => descriptor.resolve(&self.cache).await,
            None => Ok(Resolved {
                songs: self
                    .cache
                    .retrieve_songs(&SongFilter::album(artist, album))
                    .await?,
                missing: Vec::new(),
            }),
        }
    }

    /// Songs matching `filter`
    pub async fn list_songs(&self, filter: &SongFilter) -> JukeboxResult<Vec<SongRecord>> {
        self.cache.retrieve_songs(filter).await
    }

    /// Distinct artist names
    pub async fn list_artists(&self) -> JukeboxResult<Vec<String>> {
        self.cache.artist_names().await
    }

    /// All cached albums
    pub async fn list_albums(&self) -> JukeboxResult<Vec<AlbumRecord>> {
        self.cache.albums().await
    }

    /// All cached genres
    pub async fn list_genres(&self) -> JukeboxResult<Vec<GenreRecord>> {
        self.cache.genres().await
    }

    /// All cached playlists
    pub async fn list_playlists(&self) -> JukeboxResult<Vec<PlaylistRecord>> {
        self.cache.playlists().await
    }

    /// Container names in the store
    pub async fn list_containers(&self) -> JukeboxResult<Vec<String>> {
        Ok(self.storage.list_containers().await?)
    }

    /// Delete the object, then the row
    async fn remove_song(&self, song: &SongRecord) -> JukeboxResult<()> {
        let f = &song.file;
        if !self
            .storage
            .delete_object(&f.container_name, &f.object_name)
            .await?
        {
            warn!(container = %f.container_name, object = %f.object_name, "Song object already missing");
        }
        self.cache.delete_song(song.uid()).await?;
        info!(uid = %song.uid(), "Deleted song");
        Ok(())
    }

    /// Delete one song; `false` when it is not in the cache
    pub async fn delete_song(&mut self, uid: &str) -> JukeboxResult<bool> {
        let Some(song) = self.cache.retrieve_song(uid).await? else {
            return Ok(false);
        };
        self.remove_song(&song).await?;
        self.cache.upload_snapshot(self.storage.as_ref()).await?;
        Ok(true)
    }

    /// Delete every song of an artist; returns the number deleted
    pub async fn delete_artist(&mut self, artist: &str) -> JukeboxResult<usize> {
        let songs = self.cache.retrieve_songs(&SongFilter::artist(artist)).await?;
        for song in &songs {
            self.remove_song(song).await?;
        }
        let removed_artist = self.cache.delete_artist(&encode(artist)).await?;

        if !songs.is_empty() || removed_artist {
            self.cache.upload_snapshot(self.storage.as_ref()).await?;
        }
        Ok(songs.len())
    }

    /// Delete every song of an album plus its descriptor; returns the number
    /// of songs deleted
    pub async fn delete_album(&mut self, artist: &str, album: &str) -> JukeboxResult<usize> {
        let songs = self
            .cache
            .retrieve_songs(&SongFilter::album(artist, album))
            .await?;
        for song in &songs {
            self.remove_song(song).await?;
        }

        let removed_album = self.cache.delete_album(&album_uid(artist, album)).await?;
        let removed_descriptor = self
            .storage
            .delete_object(ALBUM_CONTAINER, &album_object_name(artist, album))
            .await?;

        if !songs.is_empty() || removed_album || removed_descriptor {
            self.cache.upload_snapshot(self.storage.as_ref()).await?;
        }
        Ok(songs.len())
    }

    /// Delete a playlist object and its row; `false` when it does not exist
    pub async fn delete_playlist(&mut self, name: &str) -> JukeboxResult<bool> {
        let Some(record) = self.cache.playlist_by_name(name).await? else {
            return Ok(false);
        };
        self.storage
            .delete_object(PLAYLIST_CONTAINER, &record.uid)
            .await?;
        self.cache.delete_playlist(&record.uid).await?;
        self.cache.upload_snapshot(self.storage.as_ref()).await?;
        info!(playlist = %name, "Deleted playlist");
        Ok(true)
    }

    /// Create every container this jukebox uses
    pub async fn init_storage(&self) -> JukeboxResult<usize> {
        init_storage(self.storage.as_ref(), self.variant()).await
    }

    /// Upload the local metadata store as the remote snapshot
    pub async fn upload_metadata_db(&mut self) -> JukeboxResult<()> {
        self.cache.upload_snapshot(self.storage.as_ref()).await
    }

    /// Close the metadata cache
    pub async fn close(mut self) {
        self.cache.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::import::NoopObserver;
    use crate::playback::command_channel;
    use jukebox_config::{PathsConfig, StorageConfig};
    use jukebox_storage::MemoryBackend;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        let mut config = Config {
            storage: StorageConfig::Memory,
            paths: PathsConfig::rooted_at(dir.path()),
            ..Config::default()
        };
        config.jukebox.file_cache_count = 2;
        config.jukebox.check_data_integrity = true;
        config.jukebox.pause_poll_ms = 10;
        config
    }

    async fn stage(dir: &TempDir, names: &[&str]) {
        let import = dir.path().join("song-import");
        tokio::fs::create_dir_all(&import).await.unwrap();
        for name in names {
            tokio::fs::write(import.join(name), format!("audio for {}", name))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_import_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        stage(
            &dir,
            &[
                "Cream--Disraeli-Gears--Strange-Brew.mp3",
                "Cream--Disraeli-Gears--SWLABR.mp3",
                "The-Who--Baba-ORiley.flac",
            ],
        )
        .await;
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let mut jukebox = Jukebox::open(config(&dir), Arc::clone(&storage))
            .await
            .unwrap();

        let report = jukebox.import_songs(&NoopObserver).await.unwrap();
        assert_eq!(report.imported, 3);
        assert_eq!(jukebox.list_artists().await.unwrap(), vec!["Cream", "The Who"]);
        assert_eq!(jukebox.list_albums().await.unwrap().len(), 1);

        let resolved = jukebox.album_songs("Cream", "Disraeli Gears").await.unwrap();
        assert_eq!(resolved.songs.len(), 2);

        assert_eq!(jukebox.delete_album("Cream", "Disraeli Gears").await.unwrap(), 2);
        assert!(jukebox.list_albums().await.unwrap().is_empty());
        assert!(storage
            .list_objects("c-artist-songs")
            .await
            .unwrap()
            .unwrap()
            .is_empty());

        assert!(jukebox.delete_song("The-Who--Baba-ORiley.flac").await.unwrap());
        assert!(!jukebox.delete_song("The-Who--Baba-ORiley.flac").await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        stage(&dir, &["Cream--Badge.mp3"]).await;
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let mut jukebox = Jukebox::open(config(&dir), Arc::clone(&storage))
            .await
            .unwrap();
        jukebox.import_songs(&NoopObserver).await.unwrap();
        jukebox.close().await;

        let other = tempfile::tempdir().unwrap();
        let reopened = Jukebox::open(config(&other), storage).await.unwrap();
        assert_eq!(
            reopened.list_songs(&SongFilter::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_encrypted_songs_need_a_key() {
        let dir = tempfile::tempdir().unwrap();
        stage(&dir, &["Cream--Badge.mp3"]).await;
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());

        let mut keyed = config(&dir);
        keyed.jukebox.use_encryption = true;
        keyed.jukebox.encryption_key = Some("k".to_string());
        let mut jukebox = Jukebox::open(keyed, Arc::clone(&storage)).await.unwrap();
        jukebox.import_songs(&NoopObserver).await.unwrap();
        assert_eq!(
            jukebox
                .songs_for_play(&SongFilter::default(), false)
                .await
                .unwrap()
                .len(),
            1
        );
        jukebox.close().await;

        let other = tempfile::tempdir().unwrap();
        let keyless = Jukebox::open(config(&other), storage).await.unwrap();
        assert!(keyless
            .songs_for_play(&SongFilter::default(), true)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_play_session() {
        let dir = tempfile::tempdir().unwrap();
        stage(&dir, &["Cream--Badge.mp3", "Cream--White-Room.mp3"]).await;
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let mut cfg = config(&dir);
        cfg.jukebox.number_songs = 3;
        cfg.jukebox.use_compression = true;
        let mut jukebox = Jukebox::open(cfg, storage).await.unwrap();
        jukebox.import_songs(&NoopObserver).await.unwrap();

        let songs = jukebox
            .songs_for_play(&SongFilter::default(), false)
            .await
            .unwrap();
        let player = SimulatedPlayer::new(Duration::from_millis(5));
        let (_handle, commands) = command_channel();
        let summary = jukebox
            .play(songs, Arc::new(player.clone()), commands)
            .await
            .unwrap();
        assert_eq!(summary.songs_played, 3);
        assert_eq!(player.played().await.len(), 3);
    }

    #[tokio::test]
    async fn test_playlists_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        stage(&dir, &["Cream--Badge.mp3"]).await;
        let playlists = dir.path().join("playlist-import");
        tokio::fs::create_dir_all(&playlists).await.unwrap();
        tokio::fs::write(
            playlists.join("mix.json"),
            br#"{"name": "Mix", "songs": [{"artist": "Cream", "song": "Badge"}, {"artist": "Cream", "song": "Crossroads"}]}"#,
        )
        .await
        .unwrap();

        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let mut jukebox = Jukebox::open(config(&dir), storage).await.unwrap();
        jukebox.import_songs(&NoopObserver).await.unwrap();
        jukebox.import_playlists(&NoopObserver).await.unwrap();

        let (descriptor, resolved) = jukebox.playlist_songs("Mix").await.unwrap();
        assert_eq!(descriptor.songs.len(), 2);
        assert_eq!(resolved.songs.len(), 1);
        assert_eq!(resolved.missing, vec!["Cream--Crossroads".to_string()]);

        assert!(jukebox.delete_playlist("Mix").await.unwrap());
        assert!(jukebox.playlist_songs("Mix").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_init_storage_uses_variant() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let mut cfg = config(&dir);
        cfg.jukebox.use_compression = true;
        let jukebox = Jukebox::open(cfg, Arc::clone(&storage)).await.unwrap();
        jukebox.init_storage().await.unwrap();
        assert!(storage.has_container("a-artist-songs-z").await.unwrap());
        assert!(storage.has_container("playlists").await.unwrap());
    }
}
