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


//! Catalog listings. Each prints one plain line per entry on stdout.

use super::{song_line, FilterArgs};
use crate::context::JukeboxArgs;
use crate::output;
use anyhow::Result;
use clap::Parser;

/// List songs as `artist, song`
#[derive(Parser, Debug)]
pub struct ListSongsCmd {
    #[command(flatten)]
    pub filter: FilterArgs,
}

impl ListSongsCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let songs = jukebox.list_songs(&self.filter.to_filter()).await?;
        jukebox.close().await;

        for song in &songs {
            output::line(&song_line(song));
        }
        Ok(())
    }
}

/// List artists with songs in the archive
#[derive(Parser, Debug)]
pub struct ListArtistsCmd {}

impl ListArtistsCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let artists = jukebox.list_artists().await?;
        jukebox.close().await;

        for artist in &artists {
            output::line(artist);
        }
        Ok(())
    }
}

/// List albums as `album (artist)`
#[derive(Parser, Debug)]
pub struct ListAlbumsCmd {}

impl ListAlbumsCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let albums = jukebox.list_albums().await?;
        let mut lines = Vec::with_capacity(albums.len());
        for album in &albums {
            let artist = match &album.artist_uid {
                Some(uid) => jukebox
                    .cache()
                    .retrieve_artist(uid)
                    .await?
                    .map(|artist| artist.name)
                    .unwrap_or_else(|| uid.clone()),
                None => String::from("unknown artist"),
            };
            lines.push(format!("{} ({})", album.name, artist));
        }
        jukebox.close().await;

        for line in &lines {
            output::line(line);
        }
        Ok(())
    }
}

/// List genres
#[derive(Parser, Debug)]
pub struct ListGenresCmd {}

impl ListGenresCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let genres = jukebox.list_genres().await?;
        jukebox.close().await;

        for genre in &genres {
            output::line(&genre.name);
        }
        Ok(())
    }
}

/// List playlists
#[derive(Parser, Debug)]
pub struct ListPlaylistsCmd {}

impl ListPlaylistsCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let playlists = jukebox.list_playlists().await?;
        jukebox.close().await;

        for playlist in &playlists {
            output::line(&playlist.name);
        }
        Ok(())
    }
}

/// List the storage containers
#[derive(Parser, Debug)]
pub struct ListContainersCmd {}

impl ListContainersCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let containers = jukebox.list_containers().await?;
        jukebox.close().await;

        for container in &containers {
            output::line(container);
        }
        Ok(())
    }
}
