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

//! Records stored in the metadata cache
//!
//! A [`SongRecord`] is a [`FileRecord`] plus the artist, album and song it
//! belongs to. The same fields travel as object headers on upload so a bucket
//! listing can be reconciled without the cache.

use crate::naming::ContainerVariant;
use chrono::{DateTime, Utc};
use jukebox_storage::ObjectHeaders;
use serde::{Deserialize, Serialize};

/// One stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique id; equal to the object name
    pub file_uid: String,
    /// Size of the original file
    pub origin_file_size: u64,
    /// Size after compression and encryption
    pub stored_file_size: u64,
    /// Spaces appended for cipher block alignment
    pub pad_char_count: usize,
    /// Source file modification time, whole seconds
    pub modified_time: DateTime<Utc>,
    /// Hex md5 of the original bytes
    pub md5_hash: String,
    /// Stored gzip compressed
    pub compressed: bool,
    /// Stored AES encrypted
    pub encrypted: bool,
    /// Container holding the object
    pub container_name: String,
    /// Object key within the container
    pub object_name: String,
}

impl FileRecord {
    /// Transform variant this object was stored with
    pub fn variant(&self) -> ContainerVariant {
        ContainerVariant::from_flags(self.encrypted, self.compressed)
    }
}

/// Song stored in a shard container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    #[serde(flatten)]
    pub file: FileRecord,
    /// Decoded artist name
    pub artist_name: String,
    /// Legacy rows carry only the artist name
    pub artist_uid: Option<String>,
    /// Decoded song name
    pub song_name: String,
    /// Album reference, when the file name has one
    pub album_uid: Option<String>,
}

impl SongRecord {
    /// Unique id of the song
    pub fn uid(&self) -> &str {
        &self.file.file_uid
    }

    /// Object headers mirroring this record
    pub fn to_headers(&self) -> ObjectHeaders {
        let f = &self.file;
        let mut headers = ObjectHeaders::new();
        headers.insert("file_uid".into(), f.file_uid.clone());
        headers.insert("origin_file_size".into(), f.origin_file_size.to_string());
        headers.insert("stored_file_size".into(), f.stored_file_size.to_string());
        headers.insert("pad_char_count".into(), f.pad_char_count.to_string());
        headers.insert("file_time".into(), f.modified_time.to_rfc3339());
        headers.insert("md5_hash".into(), f.md5_hash.clone());
        headers.insert("compressed".into(), flag(f.compressed).into());
        headers.insert("encrypted".into(), flag(f.encrypted).into());
        headers.insert("artist_name".into(), self.artist_name.clone());
        headers.insert("song_name".into(), self.song_name.clone());
        if let Some(uid) = &self.artist_uid {
            headers.insert("artist_uid".into(), uid.clone());
        }
        if let Some(uid) = &self.album_uid {
            headers.insert("album_uid".into(), uid.clone());
        }
        headers
    }

    /// Rebuild a record from object headers
    ///
    /// Returns `None` when a required header is missing or malformed.
    pub fn from_headers(container: &str, object: &str, headers: &ObjectHeaders) -> Option<Self> {
        let get = |key: &str| headers.get(key).map(String::as_str);
        let modified_time = DateTime::parse_from_rfc3339(get("file_time")?)
            .ok()?
            .with_timezone(&Utc);

        Some(SongRecord {
            file: FileRecord {
                file_uid: get("file_uid").unwrap_or(object).to_string(),
                origin_file_size: get("origin_file_size")?.parse().ok()?,
                stored_file_size: get("stored_file_size")?.parse().ok()?,
                pad_char_count: get("pad_char_count")?.parse().ok()?,
                modified_time,
                md5_hash: get("md5_hash")?.to_string(),
                compressed: get("compressed") == Some("1"),
                encrypted: get("encrypted") == Some("1"),
                container_name: container.to_string(),
                object_name: object.to_string(),
            },
            artist_name: get("artist_name")?.to_string(),
            artist_uid: get("artist_uid").map(str::to_string),
            song_name: get("song_name")?.to_string(),
            album_uid: get("album_uid").map(str::to_string),
        })
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Truncate a timestamp to whole seconds
pub fn whole_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or(time)
}

/// Artist reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    /// Unique id
    pub uid: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
}

/// Album reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    /// Unique id
    pub uid: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Owning artist
    pub artist_uid: Option<String>,
    /// Genre reference
    pub genre_uid: Option<String>,
}

/// Genre reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRecord {
    /// Unique id
    pub uid: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
}

/// Playlist record; contents live in the remote descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    /// Object name of the descriptor
    pub uid: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
}
