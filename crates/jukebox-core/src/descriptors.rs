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

//! Playlist and album descriptors
//!
//! Descriptors are small JSON objects stored in the `playlists` and `albums`
//! containers. Their entries are resolved against the metadata cache when a
//! playlist or album is shown or played.
//!
//! ```json
//! {
//!   "name": "Road Trip",
//!   "songs": [
//!     {"artist": "Cream", "album": "Disraeli Gears", "song": "Strange Brew"},
//!     {"object": "The-Who--Baba-ORiley.mp3"}
//!   ]
//! }
//! ```

use crate::cache::MetadataCache;
use crate::error::JukeboxResult;
use crate::naming::{album_uid, encode, object_key};
use crate::record::SongRecord;
use jukebox_storage::StorageBackend;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// One entry of a playlist or album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorEntry {
    /// Stored object name, with or without transform suffix
    Object { object: String },
    /// Song by artist, optional album and title
    Song {
        artist: String,
        #[serde(default)]
        album: Option<String>,
        song: String,
    },
    /// Bare title; only meaningful inside an album
    Title(String),
}

/// Playlist file as staged and stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistDescriptor {
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "tracks")]
    pub songs: Vec<DescriptorEntry>,
}

/// Album file as staged and stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDescriptor {
    /// Artist name as written in song file names
    pub artist: String,
    #[serde(alias = "album")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "songs")]
    pub tracks: Vec<DescriptorEntry>,
}

/// Songs found for a descriptor plus the entries that matched nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Matched songs in descriptor order
    pub songs: Vec<SongRecord>,
    /// Entries with no matching song
    pub missing: Vec<String>,
}

/// Object name of a playlist descriptor
pub fn playlist_object_name(name: &str) -> String {
    format!("{}.json", encode(name))
}

/// Object name of an album descriptor
pub fn album_object_name(artist: &str, album: &str) -> String {
    format!("{}.json", album_uid(artist, album))
}

/// First stored song whose uid is `stem` followed by an extension
async fn song_by_stem(cache: &MetadataCache, stem: &str) -> JukeboxResult<Option<SongRecord>> {
    let prefix = format!("{}.", stem);
    Ok(cache
        .retrieve_songs_with_prefix(&prefix)
        .await?
        .into_iter()
        .next())
}

async fn song_by_object(cache: &MetadataCache, object: &str) -> JukeboxResult<Option<SongRecord>> {
    if let Some(song) = cache.retrieve_song(object).await? {
        return Ok(Some(song));
    }
    Ok(cache
        .retrieve_songs_with_prefix(object)
        .await?
        .into_iter()
        .next())
}

async fn resolve_entries(
    cache: &MetadataCache,
    entries: &[DescriptorEntry],
    album: Option<(&str, &str)>,
) -> JukeboxResult<Resolved> {
    let mut resolved = Resolved::default();

    for entry in entries {
        let (found, label) = match entry {
            DescriptorEntry::Object { object } => {
                (song_by_object(cache, object).await?, object.clone())
            }
            DescriptorEntry::Song {
                artist,
                album,
                song,
            } => {
                let stem = object_key(artist, album.as_deref(), song);
                (song_by_stem(cache, &stem).await?, stem)
            }
            DescriptorEntry::Title(title) => match album {
                Some((artist, album)) => {
                    let stem = object_key(artist, Some(album), title);
                    (song_by_stem(cache, &stem).await?, stem)
                }
                None => (song_by_object(cache, title).await?, title.clone()),
            },
        };

        match found {
            Some(song) => resolved.songs.push(song),
            None => {
                debug!(entry = %label, "Descriptor entry not in cache");
                resolved.missing.push(label);
            }
        }
    }

    if !resolved.missing.is_empty() {
        warn!(missing = resolved.missing.len(), "Some descriptor entries were not found");
    }
    Ok(resolved)
}

impl PlaylistDescriptor {
    /// Object key of this descriptor
    pub fn object_name(&self) -> String {
        playlist_object_name(&self.name)
    }

    /// Match the entries against cached songs
    pub async fn resolve(&self, cache: &MetadataCache) -> JukeboxResult<Resolved> {
        resolve_entries(cache, &self.songs, None).await
    }
}

impl AlbumDescriptor {
    /// Object key of this descriptor
    pub fn object_name(&self) -> String {
        album_object_name(&self.artist, &self.name)
    }

    /// Match the tracks against this album's cached songs
    pub async fn resolve(&self, cache: &MetadataCache) -> JukeboxResult<Resolved> {
        resolve_entries(cache, &self.tracks, Some((&self.artist, &self.name))).await
    }
}

/// Download and parse a descriptor; `None` when the object does not exist
///
/// The object is staged in `scratch_dir` and removed afterwards.
pub async fn fetch_descriptor<T: DeserializeOwned>(
    storage: &dyn StorageBackend,
    container: &str,
    object: &str,
    scratch_dir: &Path,
) -> JukeboxResult<Option<T>> {
    tokio::fs::create_dir_all(scratch_dir).await?;
    let path = scratch_dir.join(object);
    let bytes = storage.get_object(container, object, &path).await?;
    if bytes == 0 {
        return Ok(None);
    }

    let data = tokio::fs::read(&path).await;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(Some(serde_json::from_slice(&data?)?))
}
