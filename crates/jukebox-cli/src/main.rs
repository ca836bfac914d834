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


mod commands;
mod context;
mod output;
mod progress;
mod signals;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use commands::*;
use context::JukeboxArgs;
use jukebox_observability::{init_tracing_with_config, LogConfig, LogFormat};
use std::io;

#[derive(Parser)]
#[command(name = "jukebox")]
#[command(version, about = "Music archive and playback over object storage")]
#[command(
    long_about = "CloudJukebox stores a music collection in object storage, optionally compressed
and encrypted, keeps a SQLite catalog of it, and plays it back with a small local cache."
)]
#[command(propagate_version = true)]
#[command(author = "CloudJukebox Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress progress and status output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format (pretty, compact, json); overrides observability.log_format
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<String>,

    /// Colored output (always|auto|never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    #[command(flatten)]
    jukebox: JukeboxArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Import all staged songs
    #[command(name = "import-songs")]
    ImportSongs(ImportSongsCmd),

    /// Import all staged playlist descriptors
    #[command(name = "import-playlists")]
    ImportPlaylists(ImportPlaylistsCmd),

    /// Import all staged album art images
    #[command(name = "import-album-art")]
    ImportAlbumArt(ImportAlbumArtCmd),

    /// Play songs, optionally filtered
    Play(PlayCmd),

    /// Play songs in random order
    #[command(name = "shuffle-play")]
    ShufflePlay(PlayCmd),

    /// Play a playlist
    #[command(name = "play-playlist")]
    PlayPlaylist(PlayPlaylistCmd),

    /// Play an album
    #[command(name = "play-album")]
    PlayAlbum(PlayAlbumCmd),

    /// Show the songs of a playlist
    #[command(name = "show-playlist")]
    ShowPlaylist(ShowPlaylistCmd),

    /// Show the tracks of an album
    #[command(name = "show-album")]
    ShowAlbum(ShowAlbumCmd),

    /// List songs
    #[command(name = "list-songs")]
    ListSongs(ListSongsCmd),

    /// List artists
    #[command(name = "list-artists")]
    ListArtists(ListArtistsCmd),

    /// List albums
    #[command(name = "list-albums")]
    ListAlbums(ListAlbumsCmd),

    /// List genres
    #[command(name = "list-genres")]
    ListGenres(ListGenresCmd),

    /// List playlists
    #[command(name = "list-playlists")]
    ListPlaylists(ListPlaylistsCmd),

    /// List storage containers
    #[command(name = "list-containers")]
    ListContainers(ListContainersCmd),

    /// Delete a song
    #[command(name = "delete-song")]
    DeleteSong(DeleteSongCmd),

    /// Delete all songs of an artist
    #[command(name = "delete-artist")]
    DeleteArtist(DeleteArtistCmd),

    /// Delete an album
    #[command(name = "delete-album")]
    DeleteAlbum(DeleteAlbumCmd),

    /// Delete a playlist
    #[command(name = "delete-playlist")]
    DeletePlaylist(DeletePlaylistCmd),

    /// Upload the local metadata DB to storage
    #[command(name = "upload-metadata-db")]
    UploadMetadataDb(UploadMetadataDbCmd),

    /// Create every storage container the jukebox uses
    #[command(name = "init-storage")]
    InitStorage(InitStorageCmd),

    /// Pause or resume a running player
    #[command(name = "toggle-pause")]
    TogglePause(TogglePauseCmd),

    /// Skip to the next song in a running player
    Advance(AdvanceCmd),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config errors surface again when the command loads it
    let observability = cli
        .jukebox
        .load_config()
        .await
        .map(|config| config.observability)
        .unwrap_or_default();
    let format_name = cli
        .log_format
        .clone()
        .unwrap_or_else(|| observability.log_format.clone());
    let format = match format_name.parse::<LogFormat>() {
        Ok(format) => format,
        Err(e) => {
            output::error(&format!("Error: {}", e));
            std::process::exit(2);
        }
    };
    let use_color = match cli.color.as_str() {
        "never" => false,
        "always" => true,
        "auto" => console::colors_enabled_stderr(),
        _ => {
            output::error(&format!("Invalid color option: {}", cli.color));
            std::process::exit(2);
        }
    };
    console::set_colors_enabled(use_color);
    console::set_colors_enabled_stderr(use_color);

    let log_config = if cli.verbose > 0 || cli.quiet {
        LogConfig::from_verbosity(cli.verbose, cli.quiet)
    } else {
        LogConfig::new().with_level(observability.log_level)
    };
    let log_config = log_config.with_format(format).with_color(use_color);
    init_tracing_with_config(log_config).ok();

    let args = &cli.jukebox;
    let quiet = cli.quiet;
    let result = match cli.command {
        Commands::ImportSongs(cmd) => cmd.execute(args, quiet).await,
        Commands::ImportPlaylists(cmd) => cmd.execute(args, quiet).await,
        Commands::ImportAlbumArt(cmd) => cmd.execute(args, quiet).await,
        Commands::Play(cmd) => cmd.execute(args, quiet).await,
        Commands::ShufflePlay(mut cmd) => {
            cmd.shuffle = true;
            cmd.execute(args, quiet).await
        }
        Commands::PlayPlaylist(cmd) => cmd.execute(args, quiet).await,
        Commands::PlayAlbum(cmd) => cmd.execute(args, quiet).await,
        Commands::ShowPlaylist(cmd) => cmd.execute(args).await,
        Commands::ShowAlbum(cmd) => cmd.execute(args).await,
        Commands::ListSongs(cmd) => cmd.execute(args).await,
        Commands::ListArtists(cmd) => cmd.execute(args).await,
        Commands::ListAlbums(cmd) => cmd.execute(args).await,
        Commands::ListGenres(cmd) => cmd.execute(args).await,
        Commands::ListPlaylists(cmd) => cmd.execute(args).await,
        Commands::ListContainers(cmd) => cmd.execute(args).await,
        Commands::DeleteSong(cmd) => cmd.execute(args).await,
        Commands::DeleteArtist(cmd) => cmd.execute(args).await,
        Commands::DeleteAlbum(cmd) => cmd.execute(args).await,
        Commands::DeletePlaylist(cmd) => cmd.execute(args).await,
        Commands::UploadMetadataDb(cmd) => cmd.execute(args).await,
        Commands::InitStorage(cmd) => cmd.execute(args).await,
        Commands::TogglePause(cmd) => cmd.execute(args).await,
        Commands::Advance(cmd) => cmd.execute(args).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "jukebox", &mut io::stdout());
}
