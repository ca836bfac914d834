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

//! Background prefetch of decoded songs
//!
//! The prefetcher keeps at most `file_cache_count` verified song files in the
//! play directory, the one currently playing included. A pass scans forward
//! from the song after the cursor, collecting songs without a local file until
//! the window is full, and downloads them one after another.
//!
//! Downloads land in `<uid>.download` and are renamed once decoded and
//! verified, so an in-progress file is never mistaken for a playable one and
//! never counts toward the window.
//!
//! Every download into the play directory happens under the in-flight flag,
//! whether it comes from a pass or from [`PlaybackPrefetcher::ensure_resident`].
//! The resident count a writer sees therefore only shrinks while it works.

use crate::codec::ContentCodec;
use crate::error::{JukeboxError, JukeboxResult};
use crate::integrity::IntegrityVerifier;
use crate::metrics::ThroughputCounter;
use crate::record::SongRecord;
use jukebox_storage::StorageBackend;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Extension of files still being downloaded
pub const DOWNLOAD_EXTENSION: &str = "download";

/// How often a waiting writer checks whether a pass has finished
const BUSY_POLL: Duration = Duration::from_millis(20);

/// Outcome of one prefetch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Songs now resident because of this pass
    pub downloaded: usize,
    /// Songs that failed to download, decode or verify
    pub failed: usize,
    /// Stored bytes downloaded by this pass alone
    pub bytes: u64,
    /// Another pass was already running
    pub skipped: bool,
}

struct Inner {
    storage: Arc<dyn StorageBackend>,
    codec: Arc<ContentCodec>,
    verifier: IntegrityVerifier,
    songs: Vec<SongRecord>,
    play_dir: PathBuf,
    file_cache_count: usize,
    in_flight: AtomicBool,
    throughput: ThroughputCounter,
}

/// Clears the in-flight flag when a pass ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the next songs of a play list downloaded and decoded
#[derive(Clone)]
pub struct PlaybackPrefetcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PlaybackPrefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackPrefetcher")
            .field("songs", &self.inner.songs.len())
            .field("play_dir", &self.inner.play_dir)
            .field("file_cache_count", &self.inner.file_cache_count)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl PlaybackPrefetcher {
    /// `file_cache_count` is clamped to at least 1
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        codec: Arc<ContentCodec>,
        verifier: IntegrityVerifier,
        songs: Vec<SongRecord>,
        play_dir: impl Into<PathBuf>,
        file_cache_count: usize,
    ) -> Self {
        PlaybackPrefetcher {
            inner: Arc::new(Inner {
                storage,
                codec,
                verifier,
                songs,
                play_dir: play_dir.into(),
                file_cache_count: file_cache_count.max(1),
                in_flight: AtomicBool::new(false),
                throughput: ThroughputCounter::new(),
            }),
        }
    }

    /// Songs in play order
    pub fn songs(&self) -> &[SongRecord] {
        &self.inner.songs
    }

    /// Directory holding the window
    pub fn play_dir(&self) -> &Path {
        &self.inner.play_dir
    }

    /// Maximum number of resident songs
    pub fn file_cache_count(&self) -> usize {
        self.inner.file_cache_count
    }

    /// Whether a pass or an inline download is running
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait until no other writer is active, then hold the flag
    async fn acquire(&self) -> InFlight<'_> {
        while self.inner.in_flight.swap(true, Ordering::AcqRel) {
            tokio::time::sleep(BUSY_POLL).await;
        }
        InFlight(&self.inner.in_flight)
    }

    /// Local path of a song's decoded file
    pub fn song_path(&self, song: &SongRecord) -> PathBuf {
        self.inner.play_dir.join(song.uid())
    }

    fn download_path(&self, song: &SongRecord) -> PathBuf {
        self.inner
            .play_dir
            .join(format!("{}.{}", song.uid(), DOWNLOAD_EXTENSION))
    }

    /// Create the play directory, or empty it when it exists
    pub async fn prepare_play_dir(&self) -> JukeboxResult<()> {
        let dir = &self.inner.play_dir;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
            return Ok(());
        }

        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        debug!(dir = %dir.display(), removed, "Cleared play directory");
        Ok(())
    }

    /// Number of complete files in the play directory
    pub async fn resident_count(&self) -> JukeboxResult<usize> {
        let mut entries = match tokio::fs::read_dir(&self.inner.play_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let in_progress = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == DOWNLOAD_EXTENSION);
            if !in_progress && entry.file_type().await?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Indexes of songs to fetch, scanning forward from after `cursor`
    fn candidates(&self, cursor: usize, wanted: usize) -> Vec<usize> {
        let n = self.inner.songs.len();
        if n == 0 || wanted == 0 {
            return Vec::new();
        }

        (1..n)
            .map(|offset| (cursor + offset) % n)
            .filter(|&index| !self.song_path(&self.inner.songs[index]).exists())
            .take(wanted)
            .collect()
    }

    /// Fill the window ahead of `cursor`
    ///
    /// Returns immediately with `skipped` set when another pass or an inline
    /// download is running.
    pub async fn run_pass(&self, cursor: usize) -> JukeboxResult<PassReport> {
        if self.inner.in_flight.swap(true, Ordering::AcqRel) {
            debug!(cursor, "Prefetch pass already running");
            return Ok(PassReport {
                skipped: true,
                ..PassReport::default()
            });
        }
        let _in_flight = InFlight(&self.inner.in_flight);

        let resident = self.resident_count().await?;
        let deficit = self.inner.file_cache_count.saturating_sub(resident);
        let mut report = PassReport::default();
        if deficit == 0 {
            return Ok(report);
        }

        let batch = self.inner.throughput.batch();
        for index in self.candidates(cursor, deficit) {
            let song = &self.inner.songs[index];
            match self.fetch_recorded(song).await {
                Ok(_) => report.downloaded += 1,
                Err(err) => {
                    warn!(uid = %song.uid(), error = %err, "Prefetch failed");
                    report.failed += 1;
                }
            }
        }
        report.bytes = batch.finish().bytes;

        debug!(
            cursor,
            resident,
            downloaded = report.downloaded,
            failed = report.failed,
            "Prefetch pass complete"
        );
        Ok(report)
    }

    /// Start a pass in the background
    ///
    /// The handle may be dropped; the pass keeps running.
    pub fn trigger(&self, cursor: usize) -> JoinHandle<JukeboxResult<PassReport>> {
        let prefetcher = self.clone();
        tokio::spawn(async move { prefetcher.run_pass(cursor).await })
    }

    /// Make sure the song at the playback cursor has a local file
    ///
    /// Waits for a running pass, then downloads the song when it is missing
    /// and the window has room. `Ok(false)` means the window is full without
    /// it.
    pub async fn ensure_resident(&self, song: &SongRecord) -> JukeboxResult<bool> {
        let _in_flight = self.acquire().await;
        if self.song_path(song).exists() {
            return Ok(true);
        }

        let resident = self.resident_count().await?;
        if resident >= self.inner.file_cache_count {
            debug!(uid = %song.uid(), resident, "Window full, song not resident");
            return Ok(false);
        }
        self.download_batch(song).await?;
        Ok(true)
    }

    /// Download, decode and verify one song into the play directory
    ///
    /// Runs as its own batch once no pass is active. The window size is not
    /// checked. Nothing is left behind on failure.
    pub async fn download_song(&self, song: &SongRecord) -> JukeboxResult<PathBuf> {
        let _in_flight = self.acquire().await;
        self.download_batch(song).await
    }

    async fn download_batch(&self, song: &SongRecord) -> JukeboxResult<PathBuf> {
        let batch = self.inner.throughput.batch();
        let path = self.fetch_recorded(song).await?;
        batch.finish();
        Ok(path)
    }

    /// Fetch one song and add it to the current batch's throughput
    async fn fetch_recorded(&self, song: &SongRecord) -> JukeboxResult<PathBuf> {
        let download_path = self.download_path(song);
        let final_path = self.song_path(song);

        let started = Instant::now();
        match self.fetch_into(song, &download_path, &final_path).await {
            Ok(bytes) => {
                self.inner.throughput.record(bytes, started.elapsed());
                info!(uid = %song.uid(), bytes, "Downloaded song");
                Ok(final_path)
            }
            Err(err) => {
                let _ = tokio::fs::remove_file(&download_path).await;
                Err(err)
            }
        }
    }

    async fn fetch_into(
        &self,
        song: &SongRecord,
        download_path: &Path,
        final_path: &Path,
    ) -> JukeboxResult<u64> {
        let f = &song.file;
        let bytes = self
            .inner
            .storage
            .get_object(&f.container_name, &f.object_name, download_path)
            .await?;
        if bytes == 0 {
            return Err(JukeboxError::not_found(format!(
                "{}/{}",
                f.container_name, f.object_name
            )));
        }
        self.inner.verifier.check_stored_size(song, bytes)?;

        if f.compressed || f.encrypted || self.inner.verifier.is_enabled() {
            let stored = tokio::fs::read(download_path).await?;
            let decoded = self
                .inner
                .codec
                .decode(&stored, f.compressed, f.encrypted, f.pad_char_count)?;
            self.inner.verifier.check_content(song, &decoded)?;
            if f.compressed || f.encrypted {
                tokio::fs::write(download_path, &decoded).await?;
            }
        }

        tokio::fs::rename(download_path, final_path).await?;
        Ok(bytes)
    }
}
