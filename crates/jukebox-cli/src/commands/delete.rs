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


//! Deletion commands. Each removes objects first, then metadata, then
//! re-uploads the metadata snapshot.

use crate::context::JukeboxArgs;
use crate::output;
use anyhow::Result;
use clap::Parser;

/// Delete one song by uid (its object name)
#[derive(Parser, Debug)]
pub struct DeleteSongCmd {
    /// Song uid, e.g. `Cream--Badge.mp3`
    #[arg(value_name = "UID")]
    pub uid: String,
}

impl DeleteSongCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let mut jukebox = args.open().await?;
        let deleted = jukebox.delete_song(&self.uid).await?;
        jukebox.close().await;

        if !deleted {
            anyhow::bail!("Song '{}' not found", self.uid);
        }
        output::success(&format!("Deleted song {}", self.uid));
        Ok(())
    }
}

/// Delete every song of an artist
#[derive(Parser, Debug)]
pub struct DeleteArtistCmd {
    #[arg(value_name = "ARTIST")]
    pub artist: String,
}

impl DeleteArtistCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let mut jukebox = args.open().await?;
        let count = jukebox.delete_artist(&self.artist).await?;
        jukebox.close().await;

        output::success(&format!("Deleted {} songs by {}", count, self.artist));
        Ok(())
    }
}

/// Delete every song of an album and its descriptor
#[derive(Parser, Debug)]
pub struct DeleteAlbumCmd {
    #[arg(value_name = "ARTIST")]
    pub artist: String,

    #[arg(value_name = "ALBUM")]
    pub album: String,
}

impl DeleteAlbumCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let mut jukebox = args.open().await?;
        let count = jukebox.delete_album(&self.artist, &self.album).await?;
        jukebox.close().await;

        output::success(&format!(
            "Deleted {} songs from {} ({})",
            count, self.album, self.artist
        ));
        Ok(())
    }
}

/// Delete a playlist
#[derive(Parser, Debug)]
pub struct DeletePlaylistCmd {
    #[arg(value_name = "NAME")]
    pub name: String,
}

impl DeletePlaylistCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let mut jukebox = args.open().await?;
        let deleted = jukebox.delete_playlist(&self.name).await?;
        jukebox.close().await;

        if !deleted {
            anyhow::bail!("Playlist '{}' not found", self.name);
        }
        output::success(&format!("Deleted playlist {}", self.name));
        Ok(())
    }
}
