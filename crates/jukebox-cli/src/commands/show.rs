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


//! `show-playlist` and `show-album`.

use super::song_line;
use crate::context::JukeboxArgs;
use crate::output;
use anyhow::Result;
use clap::Parser;

/// Print the songs of a playlist
#[derive(Parser, Debug)]
pub struct ShowPlaylistCmd {
    /// Playlist name
    #[arg(value_name = "NAME")]
    pub name: String,
}

impl ShowPlaylistCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let (descriptor, resolved) = jukebox.playlist_songs(&self.name).await?;
        jukebox.close().await;

        output::header(&descriptor.name);
        if let Some(description) = &descriptor.description {
            output::detail("Description", description);
        }
        for song in &resolved.songs {
            output::line(&song_line(song));
        }
        for missing in &resolved.missing {
            output::warning(&format!("not found: {}", missing));
        }
        Ok(())
    }
}

/// Print the tracks of an album
#[derive(Parser, Debug)]
pub struct ShowAlbumCmd {
    /// Album artist
    #[arg(value_name = "ARTIST")]
    pub artist: String,

    /// Album name
    #[arg(value_name = "ALBUM")]
    pub album: String,
}

impl ShowAlbumCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let resolved = jukebox.album_songs(&self.artist, &self.album).await?;
        jukebox.close().await;

        if resolved.songs.is_empty() && resolved.missing.is_empty() {
            anyhow::bail!("Album '{}' by '{}' not found", self.album, self.artist);
        }
        output::header(&format!("{} ({})", self.album, self.artist));
        for song in &resolved.songs {
            output::line(&song.song_name);
        }
        for missing in &resolved.missing {
            output::warning(&format!("not found: {}", missing));
        }
        Ok(())
    }
}
