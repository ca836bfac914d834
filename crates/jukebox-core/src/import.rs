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

//! Import of staged song, playlist and album-art files
//!
//! Each song file moves through parse, transform, upload and metadata commit.
//! A file whose metadata cannot be committed after its object was uploaded has
//! the object deleted again, so the cache never lacks a row for a stored song
//! written by this pipeline. Failures never abort the batch.

use crate::cache::MetadataCache;
use crate::codec::ContentCodec;
use crate::containers::put_object_lazily;
use crate::descriptors::PlaylistDescriptor;
use crate::error::{JukeboxError, JukeboxResult};
use crate::integrity::md5_hex;
use crate::metrics::TransferMetrics;
use crate::naming::{
    album_uid, encode, parse_file_name, shard_container, ContainerVariant, ParsedName,
    ALBUM_ART_CONTAINER, PLAYLIST_CONTAINER,
};
use crate::record::{whole_seconds, AlbumRecord, ArtistRecord, FileRecord, PlaylistRecord, SongRecord};
use chrono::{DateTime, Utc};
use jukebox_storage::StorageBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Why a staged file was passed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name has no `.` after the last separator
    NoExtension,
    /// Zero bytes
    Empty,
    /// Artist and song could not be recovered from the name
    UnparsableName,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::NoExtension => "no file extension",
            SkipReason::Empty => "empty file",
            SkipReason::UnparsableName => "unable to parse artist and song from name",
        };
        f.write_str(text)
    }
}

/// Per-file result reported to an [`ImportObserver`]
#[derive(Debug)]
pub enum FileOutcome<'a> {
    /// Stored and recorded; `bytes` were uploaded
    Imported { bytes: u64 },
    /// Passed over without touching storage
    Skipped(SkipReason),
    /// Upload or record failed
    Failed(&'a JukeboxError),
}

/// Progress callbacks; all methods default to no-ops
pub trait ImportObserver: Send + Sync {
    /// Called once with the number of staged files
    fn on_start(&self, _total: usize) {}
    /// Called after each file
    fn on_file(&self, _file: &str, _outcome: FileOutcome<'_>) {}
    /// Called once with the batch totals
    fn on_finish(&self, _report: &ImportReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ImportObserver for NoopObserver {}

/// Totals for one import batch
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Files stored and recorded
    pub imported: usize,
    /// Files ignored: bad names or already current
    pub skipped: usize,
    /// Files that failed to upload or record
    pub failed: usize,
    /// Upload totals for the imported files
    pub transfer: TransferMetrics,
    /// The metadata snapshot was uploaded after the batch
    pub snapshot_uploaded: bool,
    /// Why the snapshot upload failed; the imported objects and rows remain
    pub snapshot_error: Option<JukeboxError>,
    /// File name and error of every failed file
    pub failures: Vec<(String, JukeboxError)>,
}

impl ImportReport {
    /// Upload throughput for the batch
    pub fn kb_per_sec(&self) -> f64 {
        self.transfer.kb_per_sec()
    }
}

/// Regular files directly inside `dir`, sorted by name
///
/// A missing directory yields no files.
pub fn staged_files(dir: &Path) -> JukeboxResult<Vec<PathBuf>> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "Import directory does not exist");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            JukeboxError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Uploads staged files and commits their metadata
#[derive(Debug, Clone)]
pub struct ImportPipeline {
    storage: Arc<dyn StorageBackend>,
    codec: Arc<ContentCodec>,
    variant: ContainerVariant,
}

impl ImportPipeline {
    /// Pipeline applying the transforms of `variant`
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        codec: Arc<ContentCodec>,
        variant: ContainerVariant,
    ) -> JukeboxResult<Self> {
        if variant.is_encrypted() && !codec.can_decrypt() {
            return Err(JukeboxError::invalid_input(
                "encryption requested but no encryption key is configured",
            ));
        }
        Ok(ImportPipeline {
            storage,
            codec,
            variant,
        })
    }

    /// Transform variant new objects are stored with
    pub fn variant(&self) -> ContainerVariant {
        self.variant
    }

    /// Import every song file staged in `dir`
    ///
    /// The metadata snapshot is uploaded once at the end when at least one
    /// file was imported.
    pub async fn import_songs(
        &self,
        dir: &Path,
        cache: &mut MetadataCache,
        observer: &dyn ImportObserver,
    ) -> JukeboxResult<ImportReport> {
        let files = staged_files(dir)?;
        observer.on_start(files.len());
        info!(dir = %dir.display(), files = files.len(), "Importing songs");

        let mut report = ImportReport::default();
        for path in &files {
            let file_name = file_name_of(path);
            match self.import_song(path, &file_name, cache).await {
                Ok(metrics) => {
                    report.imported += 1;
                    report.transfer.record(metrics.bytes, metrics.elapsed);
                    observer.on_file(&file_name, FileOutcome::Imported { bytes: metrics.bytes });
                }
                Err(ImportStep::Skipped(reason)) => {
                    debug!(file = %file_name, %reason, "Skipping staged file");
                    report.skipped += 1;
                    observer.on_file(&file_name, FileOutcome::Skipped(reason));
                }
                Err(ImportStep::Failed(err)) => {
                    warn!(file = %file_name, error = %err, "Song import failed");
                    report.failed += 1;
                    observer.on_file(&file_name, FileOutcome::Failed(&err));
                    report.failures.push((file_name, err));
                }
            }
        }

        self.upload_snapshot(cache, &mut report).await;

        info!(
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed,
            "average upload throughput = {:.1} KB/sec",
            report.kb_per_sec()
        );
        observer.on_finish(&report);
        Ok(report)
    }

    async fn import_song(
        &self,
        path: &Path,
        file_name: &str,
        cache: &MetadataCache,
    ) -> Result<TransferMetrics, ImportStep> {
        let metadata = tokio::fs::metadata(path).await.map_err(ImportStep::failed)?;
        if metadata.len() == 0 {
            return Err(ImportStep::Skipped(SkipReason::Empty));
        }
        let parsed = parse_file_name(file_name)
            .ok_or(ImportStep::Skipped(SkipReason::UnparsableName))?;
        if parsed.extension.is_none() {
            return Err(ImportStep::Skipped(SkipReason::NoExtension));
        }

        let data = tokio::fs::read(path).await.map_err(ImportStep::failed)?;
        let modified_time = metadata
            .modified()
            .map(|t| whole_seconds(DateTime::<Utc>::from(t)))
            .unwrap_or_else(|_| whole_seconds(Utc::now()));

        let encoded = self
            .codec
            .encode(&data, self.variant.is_compressed(), self.variant.is_encrypted())
            .map_err(ImportStep::Failed)?;

        let container = shard_container(&parsed.artist, self.variant);
        let object = format!("{}{}", file_name, self.variant.object_suffix());
        let song = build_song_record(
            &parsed,
            FileRecord {
                file_uid: object.clone(),
                origin_file_size: data.len() as u64,
                stored_file_size: encoded.data.len() as u64,
                pad_char_count: encoded.pad_char_count,
                modified_time,
                md5_hash: md5_hex(&data),
                compressed: self.variant.is_compressed(),
                encrypted: self.variant.is_encrypted(),
                container_name: container.clone(),
                object_name: object.clone(),
            },
        );

        let started = Instant::now();
        let stored = put_object_lazily(
            self.storage.as_ref(),
            &container,
            &object,
            &encoded.data,
            Some(&song.to_headers()),
        )
        .await
        .map_err(ImportStep::Failed)?;
        let elapsed = started.elapsed();
        if !stored {
            return Err(ImportStep::Failed(JukeboxError::invalid_input(format!(
                "backend declined object {}/{}",
                container, object
            ))));
        }
        debug!(container = %container, object = %object, bytes = encoded.data.len(), "Uploaded song");

        if let Err(err) = cache.store_song_metadata(&song).await {
            self.compensate(&container, &object).await;
            return Err(ImportStep::Failed(JukeboxError::PartialCommit {
                uid: object,
                reason: err.to_string(),
            }));
        }

        self.upsert_references(&parsed, cache).await;
        let mut metrics = TransferMetrics::new();
        metrics.record(encoded.data.len() as u64, elapsed);
        Ok(metrics)
    }

    /// Delete an uploaded object whose metadata was not committed
    async fn compensate(&self, container: &str, object: &str) {
        match self.storage.delete_object(container, object).await {
            Ok(true) => info!(container = %container, object = %object, "Removed uncommitted object"),
            Ok(false) => warn!(container = %container, object = %object, "Uncommitted object already gone"),
            Err(err) => warn!(
                container = %container,
                object = %object,
                error = %err,
                "Unable to remove uncommitted object"
            ),
        }
    }

    async fn upsert_references(&self, parsed: &ParsedName, cache: &MetadataCache) {
        let artist = ArtistRecord {
            uid: encode(&parsed.artist),
            name: parsed.artist.clone(),
            description: None,
        };
        if let Err(err) = cache.upsert_artist(&artist).await {
            warn!(artist = %parsed.artist, error = %err, "Unable to store artist");
        }

        if let Some(album) = &parsed.album {
            let record = AlbumRecord {
                uid: album_uid(&parsed.artist, album),
                name: album.clone(),
                description: None,
                artist_uid: Some(artist.uid.clone()),
                genre_uid: None,
            };
            if let Err(err) = cache.upsert_album(&record).await {
                warn!(album = %album, error = %err, "Unable to store album");
            }
        }
    }

    /// Upload every playlist descriptor staged in `dir`
    pub async fn import_playlists(
        &self,
        dir: &Path,
        cache: &mut MetadataCache,
        observer: &dyn ImportObserver,
    ) -> JukeboxResult<ImportReport> {
        let files = staged_files(dir)?;
        observer.on_start(files.len());

        let mut report = ImportReport::default();
        for path in &files {
            let file_name = file_name_of(path);
            if !file_name.ends_with(".json") {
                report.skipped += 1;
                observer.on_file(&file_name, FileOutcome::Skipped(SkipReason::NoExtension));
                continue;
            }

            match self.import_playlist(path, cache).await {
                Ok(metrics) => {
                    report.imported += 1;
                    report.transfer.record(metrics.bytes, metrics.elapsed);
                    observer.on_file(&file_name, FileOutcome::Imported { bytes: metrics.bytes });
                }
                Err(err) => {
                    warn!(file = %file_name, error = %err, "Playlist import failed");
                    report.failed += 1;
                    observer.on_file(&file_name, FileOutcome::Failed(&err));
                    report.failures.push((file_name, err));
                }
            }
        }

        self.upload_snapshot(cache, &mut report).await;
        info!(imported = report.imported, "Playlists imported");
        observer.on_finish(&report);
        Ok(report)
    }

    /// Upload the snapshot when the batch imported anything
    async fn upload_snapshot(&self, cache: &mut MetadataCache, report: &mut ImportReport) {
        if report.imported == 0 {
            return;
        }
        match cache.upload_snapshot(self.storage.as_ref()).await {
            Ok(()) => report.snapshot_uploaded = true,
            Err(err) => {
                error!(error = %err, "Unable to upload metadata snapshot");
                report.snapshot_error = Some(err);
            }
        }
    }

    async fn import_playlist(
        &self,
        path: &Path,
        cache: &MetadataCache,
    ) -> JukeboxResult<TransferMetrics> {
        let data = tokio::fs::read(path).await?;
        let descriptor: PlaylistDescriptor = serde_json::from_slice(&data)?;
        let object = descriptor.object_name();

        let started = Instant::now();
        if !put_object_lazily(self.storage.as_ref(), PLAYLIST_CONTAINER, &object, &data, None)
            .await?
        {
            return Err(JukeboxError::invalid_input(format!(
                "backend declined playlist {}",
                object
            )));
        }
        let elapsed = started.elapsed();

        let record = PlaylistRecord {
            uid: object.clone(),
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
        };
        if let Err(err) = cache.upsert_playlist(&record).await {
            self.compensate(PLAYLIST_CONTAINER, &object).await;
            return Err(JukeboxError::PartialCommit {
                uid: object,
                reason: err.to_string(),
            });
        }

        let mut metrics = TransferMetrics::new();
        metrics.record(data.len() as u64, elapsed);
        Ok(metrics)
    }

    /// Upload album art staged in `dir` unchanged
    pub async fn import_album_art(
        &self,
        dir: &Path,
        observer: &dyn ImportObserver,
    ) -> JukeboxResult<ImportReport> {
        let files = staged_files(dir)?;
        observer.on_start(files.len());

        let mut report = ImportReport::default();
        for path in &files {
            let file_name = file_name_of(path);
            let data = match tokio::fs::read(path).await {
                Ok(data) if data.is_empty() => {
                    report.skipped += 1;
                    observer.on_file(&file_name, FileOutcome::Skipped(SkipReason::Empty));
                    continue;
                }
                Ok(data) => data,
                Err(err) => {
                    let err = JukeboxError::from(err);
                    report.failed += 1;
                    observer.on_file(&file_name, FileOutcome::Failed(&err));
                    report.failures.push((file_name, err));
                    continue;
                }
            };

            let started = Instant::now();
            let result = put_object_lazily(
                self.storage.as_ref(),
                ALBUM_ART_CONTAINER,
                &file_name,
                &data,
                None,
            )
            .await;
            match result {
                Ok(true) => {
                    report.imported += 1;
                    report.transfer.record(data.len() as u64, started.elapsed());
                    observer.on_file(&file_name, FileOutcome::Imported {
                        bytes: data.len() as u64,
                    });
                }
                Ok(false) => {
                    let err = JukeboxError::invalid_input(format!(
                        "backend declined album art {}",
                        file_name
                    ));
                    report.failed += 1;
                    observer.on_file(&file_name, FileOutcome::Failed(&err));
                    report.failures.push((file_name, err));
                }
                Err(err) => {
                    warn!(file = %file_name, error = %err, "Album art upload failed");
                    report.failed += 1;
                    observer.on_file(&file_name, FileOutcome::Failed(&err));
                    report.failures.push((file_name, err));
                }
            }
        }

        info!(imported = report.imported, "Album art imported");
        observer.on_finish(&report);
        Ok(report)
    }
}

fn build_song_record(parsed: &ParsedName, file: FileRecord) -> SongRecord {
    SongRecord {
        file,
        artist_name: parsed.artist.clone(),
        artist_uid: Some(encode(&parsed.artist)),
        song_name: parsed.song.clone(),
        album_uid: parsed
            .album
            .as_deref()
            .map(|album| album_uid(&parsed.artist, album)),
    }
}

/// Early exit of a single song import
enum ImportStep {
    Skipped(SkipReason),
    Failed(JukeboxError),
}

impl ImportStep {
    fn failed(err: std::io::Error) -> Self {
        ImportStep::Failed(err.into())
    }
}
