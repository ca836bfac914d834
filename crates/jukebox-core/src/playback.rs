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

//! Sequential playback loop
//!
//! The loop plays songs in list order. Before each song it makes sure the
//! song's file is resident, then triggers a prefetch pass for the songs after
//! it, and it deletes each file once it has been played. Pause, skip and stop
//! arrive as [`PlayerCommand`]s on a channel; the loop looks at them between
//! steps and while a song is playing.

use crate::error::{JukeboxError, JukeboxResult};
use crate::prefetch::PlaybackPrefetcher;
use crate::record::SongRecord;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Commands accepted by a running [`PlaybackLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Pause or resume between songs
    TogglePause,
    /// End the current song early
    Skip,
    /// End the session
    Stop,
}

/// Sending side of the command channel
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    command_tx: mpsc::UnboundedSender<PlayerCommand>,
}

impl PlaybackHandle {
    /// Pause or resume the loop
    pub fn toggle_pause(&self) {
        let _ = self.command_tx.send(PlayerCommand::TogglePause);
    }

    /// End the current song early
    pub fn skip(&self) {
        let _ = self.command_tx.send(PlayerCommand::Skip);
    }

    /// Stop the session
    pub fn stop(&self) {
        let _ = self.command_tx.send(PlayerCommand::Stop);
    }

    /// Send any command
    pub fn send(&self, command: PlayerCommand) {
        let _ = self.command_tx.send(command);
    }
}

/// Create a command channel for a playback loop
pub fn command_channel() -> (PlaybackHandle, mpsc::UnboundedReceiver<PlayerCommand>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    (PlaybackHandle { command_tx }, command_rx)
}

/// Something that plays a local audio file to completion
///
/// Dropping the returned future must stop playback.
#[async_trait]
pub trait AudioPlayer: Send + Sync + Debug {
    /// Play one file to the end
    async fn play(&self, path: &Path) -> JukeboxResult<()>;
}

/// Platform player command for plays of `secs` seconds
///
/// `afplay` on macOS, `mplayer` on other Unix systems, none elsewhere.
pub fn default_player_command(secs: u64) -> Option<Vec<String>> {
    let secs = secs.to_string();
    if cfg!(target_os = "macos") {
        Some(vec!["afplay".into(), "-t".into(), secs])
    } else if cfg!(unix) {
        Some(vec![
            "mplayer".into(),
            "-nolirc".into(),
            "-really-quiet".into(),
            "-endpos".into(),
            secs,
        ])
    } else {
        None
    }
}

/// Runs an external player with the song path appended
///
/// When the player cannot be started or exits unsuccessfully the song is
/// "played" by sleeping for the fallback duration instead.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    argv: Vec<String>,
    fallback: Duration,
}

impl CommandPlayer {
    /// Player running `argv` with the song path appended
    pub fn new(argv: Vec<String>, fallback: Duration) -> JukeboxResult<Self> {
        if argv.first().is_none_or(|program| program.is_empty()) {
            return Err(JukeboxError::invalid_input("audio player command is empty"));
        }
        Ok(CommandPlayer { argv, fallback })
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, path: &Path) -> JukeboxResult<()> {
        let (program, args) = match self.argv.split_first() {
            Some(split) => split,
            None => return Err(JukeboxError::invalid_input("audio player command is empty")),
        };

        let child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let status = match child {
            Ok(mut child) => child.wait().await,
            Err(err) => Err(err),
        };

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                warn!(player = %program, %status, "Audio player failed, simulating playback");
                tokio::time::sleep(self.fallback).await;
                Ok(())
            }
            Err(err) => {
                warn!(player = %program, error = %err, "Unable to run audio player, simulating playback");
                tokio::time::sleep(self.fallback).await;
                Ok(())
            }
        }
    }
}

/// Sleeps instead of playing; remembers what it was asked to play
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    duration: Duration,
    played: Arc<Mutex<Vec<PathBuf>>>,
}

impl SimulatedPlayer {
    /// Player that sleeps `duration` per song
    pub fn new(duration: Duration) -> Self {
        SimulatedPlayer {
            duration,
            played: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Paths handed to [`play`](AudioPlayer::play), in order
    pub async fn played(&self) -> Vec<PathBuf> {
        self.played.lock().await.clone()
    }
}

#[async_trait]
impl AudioPlayer for SimulatedPlayer {
    async fn play(&self, path: &Path) -> JukeboxResult<()> {
        self.played.lock().await.push(path.to_path_buf());
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

/// Loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Stop after this many songs; 0 plays until stopped
    pub number_songs: usize,
    /// How often the pause flag is checked
    pub pause_poll: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        PlaybackOptions {
            number_songs: 0,
            pause_poll: Duration::from_millis(500),
        }
    }
}

/// What a finished session did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Songs handed to the player
    pub songs_played: usize,
    /// Songs passed over because they could not be made resident
    pub songs_skipped: usize,
    /// Ended by a stop command rather than the song limit
    pub stopped: bool,
}

/// Sequential consumer of the prefetch window
#[derive(Debug)]
pub struct PlaybackLoop {
    prefetcher: PlaybackPrefetcher,
    player: Arc<dyn AudioPlayer>,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    options: PlaybackOptions,
    paused: bool,
}

impl PlaybackLoop {
    /// Loop over the prefetcher's songs, driven by `commands`
    pub fn new(
        prefetcher: PlaybackPrefetcher,
        player: Arc<dyn AudioPlayer>,
        commands: mpsc::UnboundedReceiver<PlayerCommand>,
        options: PlaybackOptions,
    ) -> Self {
        PlaybackLoop {
            prefetcher,
            player,
            commands,
            options,
            paused: false,
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!(paused = self.paused, "Pause toggled");
    }

    /// Handle a command outside of song playback; `true` means stop
    fn apply_idle_command(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::Stop => true,
            PlayerCommand::TogglePause => {
                self.toggle_pause();
                false
            }
            PlayerCommand::Skip => {
                if self.paused {
                    self.paused = false;
                    info!("Resumed by skip");
                }
                false
            }
        }
    }

    /// Block while paused, keeping the prefetcher running; `true` means stop
    async fn wait_while_paused(&mut self, cursor: usize) -> bool {
        loop {
            while let Ok(command) = self.commands.try_recv() {
                if self.apply_idle_command(command) {
                    return true;
                }
            }
            if !self.paused {
                return false;
            }

            let _ = self.prefetcher.trigger(cursor);
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.apply_idle_command(command) {
                            return true;
                        }
                    }
                    None => {
                        debug!("Command channel closed while paused, resuming");
                        self.paused = false;
                    }
                },
                _ = tokio::time::sleep(self.options.pause_poll) => {}
            }
        }
    }

    /// Make sure the cursor song's file is present; `false` means skip it
    async fn ensure_resident(&self, song: &SongRecord) -> bool {
        match self.prefetcher.ensure_resident(song).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(uid = %song.uid(), "song file doesn't exist");
                false
            }
            Err(err) => {
                warn!(uid = %song.uid(), error = %err, "Unable to download song");
                false
            }
        }
    }

    /// Play until the song limit is reached or a stop command arrives
    ///
    /// Fails when the first song cannot be downloaded or when a full cycle
    /// through the list finds nothing playable.
    pub async fn run(mut self) -> JukeboxResult<PlaybackSummary> {
        let songs: Vec<SongRecord> = self.prefetcher.songs().to_vec();
        let total = songs.len();
        if total == 0 {
            return Err(JukeboxError::not_found("no songs to play"));
        }

        self.prefetcher.prepare_play_dir().await?;
        if let Err(err) = self.prefetcher.download_song(&songs[0]).await {
            error!(uid = %songs[0].uid(), error = %err, "unable to download songs");
            return Err(err);
        }

        let mut summary = PlaybackSummary::default();
        let mut cursor = 0;
        let mut consecutive_skips = 0;

        loop {
            if self.wait_while_paused(cursor).await {
                summary.stopped = true;
                break;
            }
            if self.options.number_songs > 0 && summary.songs_played >= self.options.number_songs {
                break;
            }

            let song = &songs[cursor];
            let resident = self.ensure_resident(song).await;
            let _ = self.prefetcher.trigger(cursor);

            if !resident {
                summary.songs_skipped += 1;
                consecutive_skips += 1;
                if consecutive_skips >= total {
                    return Err(JukeboxError::not_found("no playable songs"));
                }
                cursor = (cursor + 1) % total;
                continue;
            }
            consecutive_skips = 0;

            let path = self.prefetcher.song_path(song);
            info!(artist = %song.artist_name, song = %song.song_name, "Playing");
            if self.play_one(&path).await {
                summary.stopped = true;
                break;
            }
            summary.songs_played += 1;

            if self.wait_while_paused(cursor).await {
                summary.stopped = true;
                break;
            }

            if let Err(err) = tokio::fs::remove_file(&path).await {
                debug!(path = %path.display(), error = %err, "Unable to remove played file");
            }
            cursor = (cursor + 1) % total;
        }

        info!(
            played = summary.songs_played,
            skipped = summary.songs_skipped,
            stopped = summary.stopped,
            "Playback finished"
        );
        Ok(summary)
    }

    /// Play one file, reacting to commands meanwhile; `true` means stop
    async fn play_one(&mut self, path: &Path) -> bool {
        let player = Arc::clone(&self.player);
        let play = player.play(path);
        tokio::pin!(play);

        loop {
            tokio::select! {
                result = &mut play => {
                    if let Err(err) = result {
                        warn!(path = %path.display(), error = %err, "Playback error");
                    }
                    return false;
                }
                Some(command) = self.commands.recv() => match command {
                    PlayerCommand::TogglePause => self.toggle_pause(),
                    PlayerCommand::Skip => {
                        info!("Skipping to next song");
                        return false;
                    }
                    PlayerCommand::Stop => return true,
                },
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::ContentCodec;
    use crate::integrity::{md5_hex, IntegrityVerifier};
    use crate::record::tests::sample_song;
    use jukebox_storage::{MemoryBackend, StorageBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    async fn setup(count: usize, cap: usize) -> (TempDir, Arc<MemoryBackend>, PlaybackPrefetcher) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(MemoryBackend::new());
        storage.create_container("t-artist-songs").await.unwrap();

        let mut songs = Vec::new();
        for i in 0..count {
            let uid = format!("Tool--Track-{}.mp3", i);
            let data = format!("track {}", i).into_bytes();
            storage
                .put_object("t-artist-songs", &uid, &data, None)
                .await
                .unwrap();
            let mut song = sample_song(&uid);
            song.file.container_name = "t-artist-songs".to_string();
            song.file.encrypted = false;
            song.file.pad_char_count = 0;
            song.file.stored_file_size = data.len() as u64;
            song.file.md5_hash = md5_hex(&data);
            songs.push(song);
        }

        let prefetcher = PlaybackPrefetcher::new(
            Arc::clone(&storage) as Arc<dyn StorageBackend>,
            Arc::new(ContentCodec::new()),
            IntegrityVerifier::new(true),
            songs,
            dir.path().join("song-play"),
            cap,
        );
        (dir, storage, prefetcher)
    }

    /// Plays for 60ms, sampling how many complete files are in the play
    /// directory meanwhile
    #[derive(Debug)]
    struct WindowWatcher {
        play_dir: PathBuf,
        max_resident: AtomicUsize,
    }

    impl WindowWatcher {
        fn new(play_dir: &Path) -> Self {
            WindowWatcher {
                play_dir: play_dir.to_path_buf(),
                max_resident: AtomicUsize::new(0),
            }
        }

        fn max_resident(&self) -> usize {
            self.max_resident.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioPlayer for WindowWatcher {
        async fn play(&self, _path: &Path) -> JukeboxResult<()> {
            for _ in 0..6 {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let resident = std::fs::read_dir(&self.play_dir)
                    .unwrap()
                    .filter_map(Result::ok)
                    .filter(|entry| {
                        entry
                            .path()
                            .extension()
                            .is_none_or(|ext| ext != crate::prefetch::DOWNLOAD_EXTENSION)
                    })
                    .count();
                self.max_resident.fetch_max(resident, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn options(number_songs: usize) -> PlaybackOptions {
        PlaybackOptions {
            number_songs,
            pause_poll: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_default_player_command() {
        let argv = default_player_command(20);
        if cfg!(unix) {
            let argv = argv.unwrap();
            assert!(argv.contains(&"20".to_string()));
        }
    }

    #[test]
    fn test_empty_player_command_rejected() {
        assert!(CommandPlayer::new(vec![], Duration::ZERO).is_err());
        assert!(CommandPlayer::new(vec![String::new()], Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_missing_player_falls_back_to_sleep() {
        let player = CommandPlayer::new(
            vec!["definitely-not-a-real-player-binary".to_string()],
            Duration::from_millis(5),
        )
        .unwrap();
        assert!(player.play(Path::new("song.mp3")).await.is_ok());
    }

    #[tokio::test]
    async fn test_plays_in_order_and_deletes_files() {
        let (_dir, _storage, prefetcher) = setup(3, 2).await;
        let play_dir = prefetcher.play_dir().to_path_buf();
        let player = SimulatedPlayer::new(Duration::from_millis(5));
        let (_handle, commands) = command_channel();

        let summary = PlaybackLoop::new(
            prefetcher,
            Arc::new(player.clone()),
            commands,
            options(4),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(summary.songs_played, 4);
        assert!(!summary.stopped);
        let names: Vec<String> = player
            .played()
            .await
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Tool--Track-0.mp3",
                "Tool--Track-1.mp3",
                "Tool--Track-2.mp3",
                "Tool--Track-0.mp3"
            ]
        );
        assert!(!play_dir.join("Tool--Track-0.mp3").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_window_stays_bounded_while_playing() {
        for cap in [1, 2, 3] {
            let (_dir, _storage, prefetcher) = setup(6, cap).await;
            let watcher = Arc::new(WindowWatcher::new(prefetcher.play_dir()));
            let (_handle, commands) = command_channel();

            let summary = PlaybackLoop::new(
                prefetcher,
                Arc::clone(&watcher) as Arc<dyn AudioPlayer>,
                commands,
                options(8),
            )
            .run()
            .await
            .unwrap();

            assert_eq!(summary.songs_played, 8);
            assert_eq!(summary.songs_skipped, 0, "cap {}", cap);
            assert!(watcher.max_resident() >= 1);
            assert!(
                watcher.max_resident() <= cap,
                "cap {} but {} files resident",
                cap,
                watcher.max_resident()
            );
        }
    }

    #[tokio::test]
    async fn test_first_song_failure_is_an_error() {
        let (_dir, storage, prefetcher) = setup(2, 2).await;
        storage.set_offline(true);
        let (_handle, commands) = command_channel();

        let err = PlaybackLoop::new(
            prefetcher,
            Arc::new(SimulatedPlayer::new(Duration::ZERO)),
            commands,
            options(1),
        )
        .run()
        .await
        .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_missing_song_is_skipped() {
        let (_dir, storage, prefetcher) = setup(3, 3).await;
        storage
            .delete_object("t-artist-songs", "Tool--Track-1.mp3")
            .await
            .unwrap();
        let player = SimulatedPlayer::new(Duration::from_millis(5));
        let (_handle, commands) = command_channel();

        let summary = PlaybackLoop::new(prefetcher, Arc::new(player.clone()), commands, options(2))
            .run()
            .await
            .unwrap();
        assert_eq!(summary.songs_played, 2);
        assert_eq!(summary.songs_skipped, 1);
    }

    #[tokio::test]
    async fn test_skip_and_stop_commands() {
        let (_dir, _storage, prefetcher) = setup(3, 2).await;
        let player = SimulatedPlayer::new(Duration::from_secs(30));
        let (handle, commands) = command_channel();

        let driver = tokio::spawn(async move {
            for _ in 0..2 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                handle.skip();
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.stop();
        });

        let summary = tokio::time::timeout(
            Duration::from_secs(10),
            PlaybackLoop::new(prefetcher, Arc::new(player.clone()), commands, options(0)).run(),
        )
        .await
        .unwrap()
        .unwrap();
        driver.await.unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.songs_played, 2);
        assert_eq!(player.played().await.len(), 3);
    }

    #[tokio::test]
    async fn test_pause_then_stop() {
        let (_dir, _storage, prefetcher) = setup(2, 2).await;
        let (handle, commands) = command_channel();
        handle.toggle_pause();

        let stopper = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stopper.stop();
        });

        let player = SimulatedPlayer::new(Duration::ZERO);
        let summary = tokio::time::timeout(
            Duration::from_secs(10),
            PlaybackLoop::new(prefetcher, Arc::new(player.clone()), commands, options(0)).run(),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.songs_played, 0);
        assert!(player.played().await.is_empty());
    }
}
