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

//! Local metadata cache
//!
//! An embedded SQLite store mirroring the remote metadata snapshot. The store
//! is opened over a single connection in rollback-journal mode so the database
//! is always one self-contained file that can be uploaded whole.
//!
//! Relations between songs, artists and albums are plain string uids; nothing
//! is enforced by the database.

use crate::containers::put_object_lazily;
use crate::error::{JukeboxError, JukeboxResult};
use crate::naming::{
    album_prefix, artist_prefix, encode, song_format, FIELD_SEPARATOR, METADATA_CONTAINER,
    METADATA_DB_OBJECT,
};
use crate::record::{
    AlbumRecord, ArtistRecord, FileRecord, GenreRecord, PlaylistRecord, SongRecord,
};
use chrono::{DateTime, Utc};
use jukebox_storage::StorageBackend;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// An identical row was already stored; nothing was written
    Unchanged,
    /// No row existed
    Inserted,
    /// An existing row was changed
    Updated,
}

impl StoreOutcome {
    /// True when a row was inserted or changed
    pub fn wrote(self) -> bool {
        self != StoreOutcome::Unchanged
    }
}

/// Song query filter
///
/// Artist and album match on the encoded object-key prefix. `format` matches
/// the audio extension (`mp3`, `flac`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    /// Encoded artist name
    pub artist: Option<String>,
    /// Encoded album name; needs `artist`
    pub album: Option<String>,
    /// Audio file extension
    pub format: Option<String>,
}

impl SongFilter {
    /// Filter on one artist
    pub fn artist(artist: impl Into<String>) -> Self {
        SongFilter {
            artist: Some(artist.into()),
            ..Self::default()
        }
    }

    /// Filter on one album of an artist
    pub fn album(artist: impl Into<String>, album: impl Into<String>) -> Self {
        SongFilter {
            artist: Some(artist.into()),
            album: Some(album.into()),
            format: None,
        }
    }

    /// Key prefix the query can push down to SQL
    fn key_prefix(&self) -> String {
        match (&self.artist, &self.album) {
            (Some(artist), Some(album)) => album_prefix(artist, album),
            (Some(artist), None) => artist_prefix(artist),
            _ => String::new(),
        }
    }

    /// Checks that cannot be expressed as a key prefix
    fn matches(&self, uid: &str) -> bool {
        if self.artist.is_none() {
            if let Some(album) = &self.album {
                let encoded = encode(album);
                let fields: Vec<&str> = uid.split(FIELD_SEPARATOR).collect();
                if fields.len() != 3 || fields[1] != encoded {
                    return false;
                }
            }
        }
        match &self.format {
            Some(format) => song_format(uid).as_deref() == Some(format.to_lowercase().as_str()),
            None => true,
        }
    }
}

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS genre (
        genre_uid TEXT UNIQUE NOT NULL,
        genre_name TEXT UNIQUE NOT NULL,
        genre_description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS artist (
        artist_uid TEXT UNIQUE NOT NULL,
        artist_name TEXT UNIQUE NOT NULL,
        artist_description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS album (
        album_uid TEXT UNIQUE NOT NULL,
        album_name TEXT NOT NULL,
        album_description TEXT,
        artist_uid TEXT,
        genre_uid TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS song (
        song_uid TEXT UNIQUE NOT NULL,
        file_time TEXT,
        origin_file_size INTEGER,
        stored_file_size INTEGER,
        pad_char_count INTEGER,
        artist_name TEXT,
        artist_uid TEXT,
        song_name TEXT NOT NULL,
        md5_hash TEXT NOT NULL,
        compressed INTEGER,
        encrypted INTEGER,
        container_name TEXT NOT NULL,
        object_name TEXT NOT NULL,
        album_uid TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playlist (
        playlist_uid TEXT UNIQUE NOT NULL,
        playlist_name TEXT UNIQUE NOT NULL,
        playlist_description TEXT
    )
    "#,
];

fn to_i64(value: u64, column: &str) -> JukeboxResult<i64> {
    i64::try_from(value)
        .map_err(|_| JukeboxError::invalid_input(format!("{} {} out of range", column, value)))
}

fn column_decode(column: &str, err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

fn song_from_row(row: &SqliteRow) -> Result<SongRecord, sqlx::Error> {
    let file_time: String = row.try_get("file_time")?;
    let modified_time = DateTime::parse_from_rfc3339(&file_time)
        .map_err(|e| column_decode("file_time", e))?
        .with_timezone(&Utc);
    let origin: i64 = row.try_get("origin_file_size")?;
    let stored: i64 = row.try_get("stored_file_size")?;
    let pad: i64 = row.try_get("pad_char_count")?;

    Ok(SongRecord {
        file: FileRecord {
            file_uid: row.try_get("song_uid")?,
            origin_file_size: u64::try_from(origin)
                .map_err(|e| column_decode("origin_file_size", e))?,
            stored_file_size: u64::try_from(stored)
                .map_err(|e| column_decode("stored_file_size", e))?,
            pad_char_count: usize::try_from(pad).map_err(|e| column_decode("pad_char_count", e))?,
            modified_time,
            md5_hash: row.try_get("md5_hash")?,
            compressed: row.try_get("compressed")?,
            encrypted: row.try_get("encrypted")?,
            container_name: row.try_get("container_name")?,
            object_name: row.try_get("object_name")?,
        },
        artist_name: row.try_get("artist_name")?,
        artist_uid: row.try_get("artist_uid")?,
        song_name: row.try_get("song_name")?,
        album_uid: row.try_get("album_uid")?,
    })
}

/// Local metadata store
#[derive(Debug)]
pub struct MetadataCache {
    db_path: PathBuf,
    pool: Option<SqlitePool>,
    writes: AtomicU64,
}

impl MetadataCache {
    /// Open (creating if needed) the store at `db_path`
    pub async fn open(db_path: impl Into<PathBuf>) -> JukeboxResult<Self> {
        let mut cache = MetadataCache {
            db_path: db_path.into(),
            pool: None,
            writes: AtomicU64::new(0),
        };
        cache.connect().await?;
        Ok(cache)
    }

    /// Replace the local store with the remote snapshot, then open it
    ///
    /// With `suppress_download` set, or when no snapshot exists remotely, the
    /// existing local store (possibly none) is used.
    pub async fn open_synced(
        db_path: impl Into<PathBuf>,
        storage: &dyn StorageBackend,
        suppress_download: bool,
    ) -> JukeboxResult<Self> {
        let db_path = db_path.into();
        if suppress_download {
            debug!("Metadata download suppressed");
        } else {
            Self::download_snapshot(&db_path, storage).await?;
        }
        Self::open(db_path).await
    }

    async fn download_snapshot(db_path: &Path, storage: &dyn StorageBackend) -> JukeboxResult<bool> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let download_path = db_path.with_extension("download");
        let bytes = storage
            .get_object(METADATA_CONTAINER, METADATA_DB_OBJECT, &download_path)
            .await?;
        if bytes == 0 {
            let _ = tokio::fs::remove_file(&download_path).await;
            info!("No remote metadata snapshot, using local store");
            return Ok(false);
        }

        tokio::fs::rename(&download_path, db_path).await?;
        info!(bytes, "Downloaded metadata snapshot");
        Ok(true)
    }

    async fn connect(&mut self) -> JukeboxResult<()> {
        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        self.pool = Some(pool);

        if !self.have_tables().await? {
            self.create_tables().await?;
        }
        debug!(path = %self.db_path.display(), "Metadata cache open");
        Ok(())
    }

    fn pool(&self) -> JukeboxResult<&SqlitePool> {
        self.pool.as_ref().ok_or(JukeboxError::CacheClosed)
    }

    /// Path of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Whether the connection pool is open
    pub fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    /// Close the connection; later calls fail with `CacheClosed`
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            debug!("Metadata cache closed");
        }
    }

    /// Reopen after [`close`](Self::close)
    pub async fn reopen(&mut self) -> JukeboxResult<()> {
        if self.pool.is_none() {
            self.connect().await?;
        }
        Ok(())
    }

    /// Number of song rows written since open
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Check whether the schema exists
    pub async fn have_tables(&self) -> JukeboxResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = 'song'")
            .fetch_one(self.pool()?)
            .await?;
        let count: i64 = row.try_get("n")?;
        Ok(count > 0)
    }

    /// Create the schema; existing tables are left alone
    pub async fn create_tables(&self) -> JukeboxResult<()> {
        let pool = self.pool()?;
        for statement in CREATE_TABLES {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Created metadata tables");
        Ok(())
    }

    /// Look up a song by uid
    pub async fn retrieve_song(&self, uid: &str) -> JukeboxResult<Option<SongRecord>> {
        let row = sqlx::query("SELECT * FROM song WHERE song_uid = ?")
            .bind(uid)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row.as_ref().map(song_from_row).transpose()?)
    }

    /// Insert a new song row
    pub async fn insert_song(&self, song: &SongRecord) -> JukeboxResult<()> {
        let f = &song.file;
        sqlx::query(
            r#"
            INSERT INTO song (
                song_uid, file_time, origin_file_size, stored_file_size, pad_char_count,
                artist_name, artist_uid, song_name, md5_hash, compressed, encrypted,
                container_name, object_name, album_uid
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&f.file_uid)
        .bind(f.modified_time.to_rfc3339())
        .bind(to_i64(f.origin_file_size, "origin_file_size")?)
        .bind(to_i64(f.stored_file_size, "stored_file_size")?)
        .bind(to_i64(f.pad_char_count as u64, "pad_char_count")?)
        .bind(&song.artist_name)
        .bind(&song.artist_uid)
        .bind(&song.song_name)
        .bind(&f.md5_hash)
        .bind(f.compressed)
        .bind(f.encrypted)
        .bind(&f.container_name)
        .bind(&f.object_name)
        .bind(&song.album_uid)
        .execute(self.pool()?)
        .await?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Overwrite an existing song row
    pub async fn update_song(&self, song: &SongRecord) -> JukeboxResult<()> {
        let f = &song.file;
        let result = sqlx::query(
            r#"
            UPDATE song SET
                file_time = ?, origin_file_size = ?, stored_file_size = ?, pad_char_count = ?,
                artist_name = ?, artist_uid = ?, song_name = ?, md5_hash = ?, compressed = ?,
                encrypted = ?, container_name = ?, object_name = ?, album_uid = ?
            WHERE song_uid = ?
            "#,
        )
        .bind(f.modified_time.to_rfc3339())
        .bind(to_i64(f.origin_file_size, "origin_file_size")?)
        .bind(to_i64(f.stored_file_size, "stored_file_size")?)
        .bind(to_i64(f.pad_char_count as u64, "pad_char_count")?)
        .bind(&song.artist_name)
        .bind(&song.artist_uid)
        .bind(&song.song_name)
        .bind(&f.md5_hash)
        .bind(f.compressed)
        .bind(f.encrypted)
        .bind(&f.container_name)
        .bind(&f.object_name)
        .bind(&song.album_uid)
        .bind(&f.file_uid)
        .execute(self.pool()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(JukeboxError::not_found(format!("song {}", f.file_uid)));
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Insert, update or skip depending on what is already stored
    pub async fn store_song_metadata(&self, song: &SongRecord) -> JukeboxResult<StoreOutcome> {
        match self.retrieve_song(song.uid()).await? {
            Some(existing) if existing == *song => {
                debug!(uid = %song.uid(), "Song metadata unchanged");
                Ok(StoreOutcome::Unchanged)
            }
            Some(_) => {
                self.update_song(song).await?;
                Ok(StoreOutcome::Updated)
            }
            None => {
                self.insert_song(song).await?;
                Ok(StoreOutcome::Inserted)
            }
        }
    }

    /// Remove a song row; `false` when it did not exist
    pub async fn delete_song(&self, uid: &str) -> JukeboxResult<bool> {
        let result = sqlx::query("DELETE FROM song WHERE song_uid = ?")
            .bind(uid)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Songs matching `filter`, ordered by uid
    pub async fn retrieve_songs(&self, filter: &SongFilter) -> JukeboxResult<Vec<SongRecord>> {
        let mut songs = self.retrieve_songs_with_prefix(&filter.key_prefix()).await?;
        songs.retain(|song| filter.matches(song.uid()));
        Ok(songs)
    }

    /// Songs whose uid starts with `prefix`, ordered by uid
    pub async fn retrieve_songs_with_prefix(&self, prefix: &str) -> JukeboxResult<Vec<SongRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM song WHERE substr(song_uid, 1, length(?)) = ? ORDER BY song_uid",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows
            .iter()
            .map(song_from_row)
            .collect::<Result<_, _>>()?)
    }

    /// `(artist, song)` pairs for every stored song
    pub async fn listings(&self) -> JukeboxResult<Vec<(String, String)>> {
        let rows = sqlx::query(
            "SELECT artist_name, song_name FROM song ORDER BY artist_name, song_name",
        )
        .fetch_all(self.pool()?)
        .await?;
        rows.iter()
            .map(|row| -> JukeboxResult<(String, String)> {
                Ok((row.try_get("artist_name")?, row.try_get("song_name")?))
            })
            .collect()
    }

    /// Distinct artist names of stored songs
    pub async fn artist_names(&self) -> JukeboxResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT artist_name FROM song ORDER BY artist_name")
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows
            .iter()
            .map(|row| row.try_get::<String, _>("artist_name"))
            .collect::<Result<_, _>>()?)
    }

    /// Look up an artist by uid
    pub async fn retrieve_artist(&self, uid: &str) -> JukeboxResult<Option<ArtistRecord>> {
        let row = sqlx::query("SELECT * FROM artist WHERE artist_uid = ?")
            .bind(uid)
            .fetch_optional(self.pool()?)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(ArtistRecord {
            uid: row.try_get("artist_uid")?,
            name: row.try_get("artist_name")?,
            description: row.try_get("artist_description")?,
        }))
    }

    /// Insert or update an artist row
    pub async fn upsert_artist(&self, artist: &ArtistRecord) -> JukeboxResult<StoreOutcome> {
        let outcome = match self.retrieve_artist(&artist.uid).await? {
            Some(existing) if existing == *artist => return Ok(StoreOutcome::Unchanged),
            Some(_) => StoreOutcome::Updated,
            None => StoreOutcome::Inserted,
        };
        sqlx::query(
            r#"
            INSERT INTO artist (artist_uid, artist_name, artist_description) VALUES (?, ?, ?)
            ON CONFLICT(artist_uid) DO UPDATE SET
                artist_name = excluded.artist_name,
                artist_description = excluded.artist_description
            "#,
        )
        .bind(&artist.uid)
        .bind(&artist.name)
        .bind(&artist.description)
        .execute(self.pool()?)
        .await?;
        Ok(outcome)
    }

    /// Delete an artist; false when no row matched
    pub async fn delete_artist(&self, uid: &str) -> JukeboxResult<bool> {
        let result = sqlx::query("DELETE FROM artist WHERE artist_uid = ?")
            .bind(uid)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn album_from_row(row: &SqliteRow) -> Result<AlbumRecord, sqlx::Error> {
        Ok(AlbumRecord {
            uid: row.try_get("album_uid")?,
            name: row.try_get("album_name")?,
            description: row.try_get("album_description")?,
            artist_uid: row.try_get("artist_uid")?,
            genre_uid: row.try_get("genre_uid")?,
        })
    }

    /// Look up an album by uid
    pub async fn retrieve_album(&self, uid: &str) -> JukeboxResult<Option<AlbumRecord>> {
        let row = sqlx::query("SELECT * FROM album WHERE album_uid = ?")
            .bind(uid)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row.as_ref().map(Self::album_from_row).transpose()?)
    }

    /// Insert or update an album row
    pub async fn upsert_album(&self, album: &AlbumRecord) -> JukeboxResult<StoreOutcome> {
        let outcome = match self.retrieve_album(&album.uid).await? {
            Some(existing) if existing == *album => return Ok(StoreOutcome::Unchanged),
            Some(_) => StoreOutcome::Updated,
            None => StoreOutcome::Inserted,
        };
        sqlx::query(
            r#"
            INSERT INTO album (album_uid, album_name, album_description, artist_uid, genre_uid)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(album_uid) DO UPDATE SET
                album_name = excluded.album_name,
                album_description = excluded.album_description,
                artist_uid = excluded.artist_uid,
                genre_uid = excluded.genre_uid
            "#,
        )
        .bind(&album.uid)
        .bind(&album.name)
        .bind(&album.description)
        .bind(&album.artist_uid)
        .bind(&album.genre_uid)
        .execute(self.pool()?)
        .await?;
        Ok(outcome)
    }

    /// All albums ordered by uid
    pub async fn albums(&self) -> JukeboxResult<Vec<AlbumRecord>> {
        let rows = sqlx::query("SELECT * FROM album ORDER BY album_uid")
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows
            .iter()
            .map(Self::album_from_row)
            .collect::<Result<_, _>>()?)
    }

    /// Delete an album; false when no row matched
    pub async fn delete_album(&self, uid: &str) -> JukeboxResult<bool> {
        let result = sqlx::query("DELETE FROM album WHERE album_uid = ?")
            .bind(uid)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All genres ordered by name
    pub async fn genres(&self) -> JukeboxResult<Vec<GenreRecord>> {
        let rows = sqlx::query("SELECT * FROM genre ORDER BY genre_name")
            .fetch_all(self.pool()?)
            .await?;
        rows.iter()
            .map(|row| -> JukeboxResult<GenreRecord> {
                Ok(GenreRecord {
                    uid: row.try_get("genre_uid")?,
                    name: row.try_get("genre_name")?,
                    description: row.try_get("genre_description")?,
                })
            })
            .collect()
    }

    fn playlist_from_row(row: &SqliteRow) -> Result<PlaylistRecord, sqlx::Error> {
        Ok(PlaylistRecord {
            uid: row.try_get("playlist_uid")?,
            name: row.try_get("playlist_name")?,
            description: row.try_get("playlist_description")?,
        })
    }

    /// Insert or update a playlist row
    pub async fn upsert_playlist(&self, playlist: &PlaylistRecord) -> JukeboxResult<()> {
        sqlx::query(
            r#"
            INSERT INTO playlist (playlist_uid, playlist_name, playlist_description)
            VALUES (?, ?, ?)
            ON CONFLICT(playlist_uid) DO UPDATE SET
                playlist_name = excluded.playlist_name,
                playlist_description = excluded.playlist_description
            "#,
        )
        .bind(&playlist.uid)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .execute(self.pool()?)
        .await?;
        Ok(())
    }

    /// All playlists ordered by name
    pub async fn playlists(&self) -> JukeboxResult<Vec<PlaylistRecord>> {
        let rows = sqlx::query("SELECT * FROM playlist ORDER BY playlist_name")
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows
            .iter()
            .map(Self::playlist_from_row)
            .collect::<Result<_, _>>()?)
    }

    /// Look up a playlist by display name
    pub async fn playlist_by_name(&self, name: &str) -> JukeboxResult<Option<PlaylistRecord>> {
        let row = sqlx::query("SELECT * FROM playlist WHERE playlist_name = ?")
            .bind(name)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row.as_ref().map(Self::playlist_from_row).transpose()?)
    }

    /// Delete a playlist; false when no row matched
    pub async fn delete_playlist(&self, uid: &str) -> JukeboxResult<bool> {
        let result = sqlx::query("DELETE FROM playlist WHERE playlist_uid = ?")
            .bind(uid)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Upload the whole store as the remote snapshot
    ///
    /// The connection is closed while the file is read and reopened afterwards,
    /// also when the upload fails.
    pub async fn upload_snapshot(&mut self, storage: &dyn StorageBackend) -> JukeboxResult<()> {
        self.close().await;
        let result = self.put_snapshot(storage).await;
        self.reopen().await?;
        result
    }

    async fn put_snapshot(&self, storage: &dyn StorageBackend) -> JukeboxResult<()> {
        let data = tokio::fs::read(&self.db_path).await?;
        let stored = put_object_lazily(
            storage,
            METADATA_CONTAINER,
            METADATA_DB_OBJECT,
            &data,
            None,
        )
        .await?;

        if !stored {
            warn!("Metadata snapshot upload was declined");
            return Err(JukeboxError::Storage(jukebox_storage::StorageError::backend(
                "metadata snapshot upload declined",
            )));
        }
        info!(bytes = data.len(), "Uploaded metadata snapshot");
        Ok(())
    }
}
