// Copyright (C) 2026  CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
// Command modules for the jukebox CLI
pub mod admin;
pub mod control;
pub mod delete;
pub mod import;
pub mod list;
pub mod play;
pub mod show;

pub use admin::{InitStorageCmd, UploadMetadataDbCmd};
pub use control::{AdvanceCmd, TogglePauseCmd};
pub use delete::{DeleteAlbumCmd, DeleteArtistCmd, DeletePlaylistCmd, DeleteSongCmd};
pub use import::{ImportAlbumArtCmd, ImportPlaylistsCmd, ImportSongsCmd};
pub use list::{
    ListAlbumsCmd, ListArtistsCmd, ListContainersCmd, ListGenresCmd, ListPlaylistsCmd,
    ListSongsCmd,
};
pub use play::{PlayAlbumCmd, PlayCmd, PlayPlaylistCmd};
pub use show::{ShowAlbumCmd, ShowPlaylistCmd};

use clap::Args;
use jukebox_core::{SongFilter, SongRecord};

/// Song selection flags shared by `play` and `list-songs`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only songs by this artist
    #[arg(short = 'a', long, value_name = "ARTIST")]
    pub artist: Option<String>,

    /// Only songs from this album
    #[arg(long, value_name = "ALBUM")]
    pub album: Option<String>,

    /// Only songs in this audio format (mp3, flac, ...)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> SongFilter {
        SongFilter {
            artist: self.artist.clone(),
            album: self.album.clone(),
            format: self.format.clone(),
        }
    }
}

/// One listing line per song
pub(crate) fn song_line(song: &SongRecord) -> String {
    format!("{}, {}", song.artist_name, song.song_name)
}
