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

//! Import, metadata cache, prefetch and playback engine for CloudJukebox
//!
//! This crate implements everything between the storage backends and the
//! command line:
//! - Deterministic object and shard container naming
//! - A compress-then-encrypt content codec with out-of-band pad tracking
//! - A SQLite metadata cache mirrored to the `music-metadata` container
//! - An import pipeline that deletes uploaded objects whose metadata could not
//!   be committed
//! - A bounded background prefetcher and the sequential playback loop
//!
//! # Data flow
//!
//! Import: staged file → [`ContentCodec::encode`] → `put_object` →
//! [`MetadataCache::store_song_metadata`] → snapshot upload.
//!
//! Playback: [`MetadataCache::retrieve_songs`] → [`PlaybackPrefetcher`]
//! downloads ahead of the cursor → decode → [`IntegrityVerifier`] →
//! [`PlaybackLoop`] hands the file to the player, then deletes it.
//!
//! # Examples
//!
//! ```no_run
//! use jukebox_config::{Config, PathsConfig, StorageConfig};
//! use jukebox_core::{Jukebox, NoopObserver, SongFilter};
//! use jukebox_storage::{MemoryBackend, StorageBackend};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> jukebox_core::JukeboxResult<()> {
//!     let config = Config {
//!         storage: StorageConfig::Memory,
//!         paths: PathsConfig::rooted_at("/tmp/jukebox"),
//!         ..Config::default()
//!     };
//!     let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
//!     let mut jukebox = Jukebox::open(config, storage).await?;
//!
//!     let report = jukebox.import_songs(&NoopObserver).await?;
//!     println!("{} song files imported", report.imported);
//!
//!     for song in jukebox.list_songs(&SongFilter::artist("Cream")).await? {
//!         println!("{}, {}", song.artist_name, song.song_name);
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod codec;
mod containers;
mod descriptors;
mod error;
mod factory;
mod import;
mod integrity;
mod jukebox;
mod metrics;
pub mod naming;
mod playback;
mod prefetch;
mod record;

pub use cache::{MetadataCache, SongFilter, StoreOutcome};
pub use codec::{ContentCodec, Encoded};
pub use containers::{ensure_container, init_storage, put_object_lazily};
pub use descriptors::{
    album_object_name, fetch_descriptor, playlist_object_name, AlbumDescriptor, DescriptorEntry,
    PlaylistDescriptor, Resolved,
};
pub use error::{JukeboxError, JukeboxResult};
pub use factory::{create_backend, storage_for_name, BACKEND_NAMES};
pub use import::{
    staged_files, FileOutcome, ImportObserver, ImportPipeline, ImportReport, NoopObserver,
    SkipReason,
};
pub use integrity::{md5_file, md5_hex, IntegrityVerifier};
pub use jukebox::Jukebox;
pub use metrics::{BatchGuard, ThroughputCounter, TransferMetrics};
pub use naming::{ContainerVariant, ParsedName};
pub use playback::{
    command_channel, default_player_command, AudioPlayer, CommandPlayer, PlaybackHandle,
    PlaybackLoop, PlaybackOptions, PlaybackSummary, PlayerCommand, SimulatedPlayer,
};
pub use prefetch::{PassReport, PlaybackPrefetcher, DOWNLOAD_EXTENSION};
pub use record::{
    whole_seconds, AlbumRecord, ArtistRecord, FileRecord, GenreRecord, PlaylistRecord, SongRecord,
};
