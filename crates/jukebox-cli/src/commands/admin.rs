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


//! Storage administration.

use crate::context::JukeboxArgs;
use crate::output;
use anyhow::Result;
use clap::Parser;

/// Create the metadata, playlist, album and shard containers
#[derive(Parser, Debug)]
pub struct InitStorageCmd {}

impl InitStorageCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        let jukebox = args.open().await?;
        let created = jukebox.init_storage().await?;
        let backend = jukebox.config().storage.backend_name();
        jukebox.close().await;

        output::success(&format!("{} containers created", created));
        output::detail("Storage backend", backend);
        Ok(())
    }
}

/// Upload the local metadata store as the remote snapshot
#[derive(Parser, Debug)]
pub struct UploadMetadataDbCmd {}

impl UploadMetadataDbCmd {
    pub async fn execute(&self, args: &JukeboxArgs) -> Result<()> {
        // The local store is the source here; syncing first would overwrite it
        let args = JukeboxArgs {
            suppress_metadata_sync: true,
            ..args.clone()
        };
        let mut jukebox = args.open().await?;
        jukebox.upload_metadata_db().await?;
        jukebox.close().await;

        output::success("Metadata DB uploaded");
        Ok(())
    }
}
