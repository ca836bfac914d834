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


//! `import-songs`, `import-playlists` and `import-album-art`.

use crate::context::JukeboxArgs;
use crate::output;
use crate::progress::ImportProgress;
use anyhow::Result;
use clap::Parser;
use jukebox_core::ImportReport;

/// Upload every staged song file and record its metadata
#[derive(Parser, Debug)]
pub struct ImportSongsCmd {}

impl ImportSongsCmd {
    pub async fn execute(&self, args: &JukeboxArgs, quiet: bool) -> Result<()> {
        let mut jukebox = args.open().await?;
        let progress = ImportProgress::new("Importing songs", quiet);
        let report = jukebox.import_songs(&progress).await?;
        jukebox.close().await;

        print_report(&report, "song files imported", quiet)
    }
}

/// Upload staged playlist descriptors (`*.json`)
#[derive(Parser, Debug)]
pub struct ImportPlaylistsCmd {}

impl ImportPlaylistsCmd {
    pub async fn execute(&self, args: &JukeboxArgs, quiet: bool) -> Result<()> {
        let mut jukebox = args.open().await?;
        let progress = ImportProgress::new("Importing playlists", quiet);
        let report = jukebox.import_playlists(&progress).await?;
        jukebox.close().await;

        print_report(&report, "playlists imported", quiet)
    }
}

/// Upload staged album art images unchanged
#[derive(Parser, Debug)]
pub struct ImportAlbumArtCmd {}

impl ImportAlbumArtCmd {
    pub async fn execute(&self, args: &JukeboxArgs, quiet: bool) -> Result<()> {
        let jukebox = args.open().await?;
        let progress = ImportProgress::new("Importing album art", quiet);
        let report = jukebox.import_album_art(&progress).await?;
        jukebox.close().await;

        print_report(&report, "album art files imported", quiet)
    }
}

/// Summarize a batch; any failed file or a failed snapshot upload makes the
/// command fail
fn print_report(report: &ImportReport, what: &str, quiet: bool) -> Result<()> {
    if !quiet {
        output::success(&format!("{} {}", report.imported, what));
        if report.imported > 0 {
            output::detail("Uploaded", &ImportProgress::bytes(report.transfer.bytes));
            output::info(&output::throughput("upload", report.kb_per_sec()));
        }
        if report.skipped > 0 {
            output::detail("Skipped", &report.skipped.to_string());
        }
    }

    for (file, err) in &report.failures {
        output::warning(&format!("{}: {}", file, err));
    }
    if report.failed > 0 {
        anyhow::bail!("{} file(s) failed to import", report.failed);
    }
    if let Some(err) = &report.snapshot_error {
        anyhow::bail!("Unable to upload metadata snapshot: {}", err);
    }
    Ok(())
}
