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


//! `play`, `shuffle-play`, `play-playlist` and `play-album`.

use super::FilterArgs;
use crate::context::JukeboxArgs;
use crate::output;
use crate::signals::{spawn_signal_bridge, PidFile};
use anyhow::Result;
use clap::Parser;
use jukebox_core::{command_channel, Jukebox, SongRecord};

/// Play songs from the archive
#[derive(Parser, Debug)]
pub struct PlayCmd {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Play in random order
    #[arg(long)]
    pub shuffle: bool,
}

impl PlayCmd {
    pub async fn execute(&self, args: &JukeboxArgs, quiet: bool) -> Result<()> {
        let jukebox = args.open().await?;
        let songs = jukebox
            .songs_for_play(&self.filter.to_filter(), self.shuffle)
            .await?;
        run_session(jukebox, songs, quiet).await
    }
}

/// Play the songs of a playlist in order
#[derive(Parser, Debug)]
pub struct PlayPlaylistCmd {
    /// Playlist name
    #[arg(value_name = "NAME")]
    pub name: String,
}

impl PlayPlaylistCmd {
    pub async fn execute(&self, args: &JukeboxArgs, quiet: bool) -> Result<()> {
        let jukebox = args.open().await?;
        let (_, resolved) = jukebox.playlist_songs(&self.name).await?;
        for missing in &resolved.missing {
            output::warning(&format!("playlist song not found: {}", missing));
        }
        run_session(jukebox, resolved.songs, quiet).await
    }
}

/// Play the tracks of an album in order
#[derive(Parser, Debug)]
pub struct PlayAlbumCmd {
    /// Album artist
    #[arg(value_name = "ARTIST")]
    pub artist: String,

    /// Album name
    #[arg(value_name = "ALBUM")]
    pub album: String,
}

impl PlayAlbumCmd {
    pub async fn execute(&self, args: &JukeboxArgs, quiet: bool) -> Result<()> {
        let jukebox = args.open().await?;
        let resolved = jukebox.album_songs(&self.artist, &self.album).await?;
        for missing in &resolved.missing {
            output::warning(&format!("album track not found: {}", missing));
        }
        run_session(jukebox, resolved.songs, quiet).await
    }
}

/// Run one play session with the pid file and signal bridge in place
async fn run_session(jukebox: Jukebox, songs: Vec<SongRecord>, quiet: bool) -> Result<()> {
    if songs.is_empty() {
        anyhow::bail!("No songs to play");
    }

    let pid_file = PidFile::create(jukebox.config().paths.pid_file_path()).await?;
    let (handle, commands) = command_channel();
    let bridge = spawn_signal_bridge(handle);

    if !quiet {
        output::header(&format!("Playing {} songs", songs.len()));
    }
    let player = jukebox.player()?;
    let result = jukebox.play(songs, player, commands).await;

    bridge.abort();
    drop(pid_file);
    jukebox.close().await;

    let summary = result?;
    if !quiet {
        output::success(&format!("{} songs played", summary.songs_played));
        if summary.songs_skipped > 0 {
            output::detail("Unavailable", &summary.songs_skipped.to_string());
        }
        if summary.stopped {
            output::info("Playback stopped");
        }
    }
    Ok(())
}
